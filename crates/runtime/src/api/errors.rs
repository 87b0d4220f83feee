//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories and the combat
//! engine so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use combat_core::{CombatError, ErrorSeverity, GameError};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The engine refused the request. The world is unchanged.
    #[error(transparent)]
    Combat(#[from] CombatError),

    #[error("simulation worker command channel closed")]
    CommandChannelClosed,

    #[error("simulation worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("simulation worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("runtime has no snapshot repository configured")]
    NoRepository,

    #[error("snapshot '{0}' not found")]
    SnapshotNotFound(String),

    #[error("unknown item template '{0}'")]
    UnknownItemTemplate(String),

    #[error("failed to load combat content: {0}")]
    Content(String),
}

impl RuntimeError {
    /// True when the error came from the engine's own validation and the
    /// caller may simply report it to the player.
    pub fn is_player_facing(&self) -> bool {
        matches!(self, Self::Combat(_))
    }
}

impl GameError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Combat(error) => error.severity(),
            Self::SnapshotNotFound(_) | Self::UnknownItemTemplate(_) => ErrorSeverity::Validation,
            Self::Repository(_) | Self::NoRepository | Self::Content(_) => ErrorSeverity::Internal,
            Self::CommandChannelClosed | Self::ReplyChannelClosed(_) | Self::WorkerJoin(_) => {
                ErrorSeverity::Fatal
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Combat(error) => error.error_code(),
            Self::CommandChannelClosed => "RUNTIME_COMMAND_CHANNEL_CLOSED",
            Self::ReplyChannelClosed(_) => "RUNTIME_REPLY_CHANNEL_CLOSED",
            Self::WorkerJoin(_) => "RUNTIME_WORKER_JOIN",
            Self::Repository(_) => "RUNTIME_REPOSITORY",
            Self::NoRepository => "RUNTIME_NO_REPOSITORY",
            Self::SnapshotNotFound(_) => "RUNTIME_SNAPSHOT_NOT_FOUND",
            Self::UnknownItemTemplate(_) => "RUNTIME_UNKNOWN_ITEM_TEMPLATE",
            Self::Content(_) => "RUNTIME_CONTENT",
        }
    }
}
