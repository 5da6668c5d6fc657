//! # Protocol — Inter-Peer Wire Messages
//!
//! Defines the message envelope that crosses the bus between coordinator,
//! workers, and indexer. Tag values are pinned to the reference wire
//! contract (`Task = 0, Links = 1, Doc = 2, Status = 99, Error = 999`) so
//! that a future transport swap (e.g. a real network bus) stays compatible
//! with anything built against this contract.

use serde::{Deserialize, Serialize};

/// The logical identity of a peer on the bus: rank 0 is the coordinator,
/// the last rank is the indexer, everything in between is a worker.
pub type PeerId = usize;

/// Message tag. `999` does not fit in a `u8`, so the wire contract forces
/// this to be `u16` despite every other tag fitting comfortably in a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum Tag {
    Task = 0,
    Links = 1,
    Doc = 2,
    Status = 99,
    Error = 999,
}

/// A fetched document forwarded from a worker to the indexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocPayload {
    pub url: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// The payload carried by an [`Envelope`]. One variant per [`Tag`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    /// A URL to crawl, or `None` — the shutdown sentinel.
    Task(Option<String>),
    /// Links extracted from a page, reported back to the coordinator.
    Links(Vec<String>),
    /// A fetched document, reported to the indexer.
    Doc(DocPayload),
    /// A human-readable status string; doubles as a heartbeat.
    Status(String),
    /// A human-readable error string.
    Error(String),
}

impl Message {
    pub fn tag(&self) -> Tag {
        match self {
            Message::Task(_) => Tag::Task,
            Message::Links(_) => Tag::Links,
            Message::Doc(_) => Tag::Doc,
            Message::Status(_) => Tag::Status,
            Message::Error(_) => Tag::Error,
        }
    }
}

/// An addressed message crossing the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub from: PeerId,
    pub to: PeerId,
    pub payload: Message,
}

impl Envelope {
    pub fn new(from: PeerId, to: PeerId, payload: Message) -> Self {
        Envelope { from, to, payload }
    }

    pub fn tag(&self) -> Tag {
        self.payload.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matches_wire_contract_values() {
        assert_eq!(Tag::Task as u16, 0);
        assert_eq!(Tag::Links as u16, 1);
        assert_eq!(Tag::Doc as u16, 2);
        assert_eq!(Tag::Status as u16, 99);
        assert_eq!(Tag::Error as u16, 999);
    }

    #[test]
    fn message_tag_matches_variant() {
        assert_eq!(Message::Task(None).tag(), Tag::Task);
        assert_eq!(Message::Links(vec![]).tag(), Tag::Links);
        assert_eq!(
            Message::Doc(DocPayload {
                url: "http://x/".into(),
                content: String::new(),
                title: None,
            })
            .tag(),
            Tag::Doc
        );
        assert_eq!(Message::Status("ok".into()).tag(), Tag::Status);
        assert_eq!(Message::Error("bad".into()).tag(), Tag::Error);
    }

    #[test]
    fn task_sentinel_round_trips_through_json() {
        let env = Envelope::new(0, 1, Message::Task(None));
        let json = serde_json::to_string(&env).unwrap();
        let back: Envelope = serde_json::from_str(&json).unwrap();
        assert!(matches!(back.payload, Message::Task(None)));
    }
}
