//! # Logging — Per-Peer Structured Logs
//!
//! Each peer runs on its own dedicated OS thread (see `crawl.rs`) with a
//! single-threaded Tokio runtime, so a thread-scoped default subscriber
//! stays attached for that peer's entire lifetime without migrating —
//! this is what lets every peer write to its own file (`logs/master.log`,
//! `logs/crawler_<rank>.log`, `logs/indexer.log`) in addition to a shared
//! stderr layer, mirroring the reference implementation's
//! `logging.FileHandler` + `logging.StreamHandler` pair per node.

use std::path::Path;

use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Which role a peer plays, for log-file naming.
pub enum PeerRole {
    Coordinator,
    Worker(usize),
    Indexer,
}

impl PeerRole {
    fn log_file_name(&self) -> String {
        match self {
            PeerRole::Coordinator => "master.log".to_string(),
            PeerRole::Worker(rank) => format!("crawler_{}.log", rank),
            PeerRole::Indexer => "indexer.log".to_string(),
        }
    }
}

/// Guards that must be held for the peer thread's entire lifetime: the
/// non-blocking appender's background-writer guard, and the thread-local
/// default-subscriber guard. Dropping either tears down this peer's
/// logging.
pub struct LoggingGuards {
    _appender: tracing_appender::non_blocking::WorkerGuard,
    _default: tracing::subscriber::DefaultGuard,
}

/// Initialize tracing for one peer: a non-blocking file appender under
/// `log_dir` plus a stderr layer, installed as this *thread's* default
/// subscriber (not the process-global one, since each peer has its own).
pub fn init_peer_logging(log_dir: &Path, role: PeerRole) -> anyhow::Result<LoggingGuards> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::never(log_dir, role.log_file_name());
    let (non_blocking, appender_guard) = tracing_appender::non_blocking(file_appender);

    let writer = non_blocking.and(std::io::stderr);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(false)
        .finish();

    let default_guard = tracing::subscriber::set_default(subscriber);

    Ok(LoggingGuards {
        _appender: appender_guard,
        _default: default_guard,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_names_match_wire_contract_paths() {
        assert_eq!(PeerRole::Coordinator.log_file_name(), "master.log");
        assert_eq!(PeerRole::Worker(3).log_file_name(), "crawler_3.log");
        assert_eq!(PeerRole::Indexer.log_file_name(), "indexer.log");
    }
}
