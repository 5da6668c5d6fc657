//! # Bus — In-Process Rank-Addressed Message Bus
//!
//! Replaces the reference implementation's MPI `comm.send`/`comm.recv`
//! rank addressing with `tokio::sync::mpsc` channels, one receiver per
//! peer. The tag semantics and rank topology (coordinator = 0, indexer =
//! last rank, workers in between) are preserved; only the transport
//! changes: swapping the transport while keeping rank semantics fixed
//! is the same trade a fleet client makes moving from HTTP registration
//! to a direct database connection.

use std::collections::HashMap;

use tokio::sync::mpsc;

use crate::protocol::{Envelope, Message, PeerId};

const CHANNEL_CAPACITY: usize = 256;

/// A handle to the bus, scoped to a single peer. Cloneable so a peer's
/// heartbeat task and main loop can share a sender without sharing the
/// receiver.
#[derive(Clone)]
pub struct PeerHandle {
    pub id: PeerId,
    senders: HashMap<PeerId, mpsc::Sender<Envelope>>,
}

impl PeerHandle {
    pub async fn send(&self, to: PeerId, payload: Message) -> Result<(), BusError> {
        let envelope = Envelope::new(self.id, to, payload);
        self.senders
            .get(&to)
            .ok_or(BusError::UnknownPeer(to))?
            .send(envelope)
            .await
            .map_err(|_| BusError::PeerGone(to))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("no such peer: {0}")]
    UnknownPeer(PeerId),
    #[error("peer {0} has already shut down")]
    PeerGone(PeerId),
}

/// Owns every peer's inbound channel. Built once at startup, then split
/// into per-peer `(PeerHandle, Receiver)` pairs via [`Bus::take_receiver`].
pub struct Bus {
    senders: HashMap<PeerId, mpsc::Sender<Envelope>>,
    receivers: HashMap<PeerId, mpsc::Receiver<Envelope>>,
}

impl Bus {
    /// Build a bus with one channel per peer id in `0..peer_count`.
    pub fn new(peer_count: usize) -> Self {
        let mut senders = HashMap::with_capacity(peer_count);
        let mut receivers = HashMap::with_capacity(peer_count);
        for id in 0..peer_count {
            let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
            senders.insert(id, tx);
            receivers.insert(id, rx);
        }
        Bus { senders, receivers }
    }

    /// A handle a peer can use to send to any other peer (including itself).
    pub fn handle_for(&self, id: PeerId) -> PeerHandle {
        PeerHandle {
            id,
            senders: self.senders.clone(),
        }
    }

    /// Take ownership of one peer's inbound receiver. Panics if called
    /// twice for the same id — each peer task takes its receiver exactly
    /// once at spawn time.
    pub fn take_receiver(&mut self, id: PeerId) -> mpsc::Receiver<Envelope> {
        self.receivers
            .remove(&id)
            .unwrap_or_else(|| panic!("receiver for peer {} already taken", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_and_receive_round_trips() {
        let mut bus = Bus::new(3);
        let handle0 = bus.handle_for(0);
        let mut rx1 = bus.take_receiver(1);

        handle0
            .send(1, Message::Task(Some("http://a/".into())))
            .await
            .unwrap();

        let env = rx1.recv().await.unwrap();
        assert_eq!(env.from, 0);
        assert_eq!(env.to, 1);
        assert!(matches!(env.payload, Message::Task(Some(_))));
    }

    #[tokio::test]
    async fn send_to_unknown_peer_errors() {
        let bus = Bus::new(2);
        let handle0 = bus.handle_for(0);
        let err = handle0.send(99, Message::Status("x".into())).await;
        assert!(matches!(err, Err(BusError::UnknownPeer(99))));
    }

    #[test]
    #[should_panic(expected = "already taken")]
    fn taking_receiver_twice_panics() {
        let mut bus = Bus::new(2);
        let _ = bus.take_receiver(0);
        let _ = bus.take_receiver(0);
    }
}
