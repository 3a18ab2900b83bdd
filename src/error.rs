//! Error taxonomy for an exerciser run
//!
//! Every failure maps to one variant and one process exit code so that
//! scripts driving the exerciser can tell a bad configuration from an
//! offline gateway.

use thiserror::Error;

/// Why the gateway object could not be pinned down
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("no child of the Objects folder has a display name containing \"{marker}\" (plugin offline?)")]
    NoGateway { marker: String },

    #[error("{count} children match \"{marker}\": {candidates}")]
    AmbiguousGateway {
        marker: String,
        count: usize,
        candidates: String,
    },

    #[error("browse of {node} failed: {message}")]
    Browse { node: String, message: String },
}

#[derive(Debug, Error)]
pub enum ExerciserError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("gateway resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("remote call {method} failed: {message}")]
    RemoteCall { method: String, message: String },

    #[error("{failed} of {total} gateway calls failed")]
    CallsFailed { failed: usize, total: usize },

    #[error("run cancelled before {next}")]
    Cancelled { next: String },
}

impl ExerciserError {
    /// Process exit code for this failure class
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Connection(_) => 3,
            Self::Resolution(_) => 4,
            Self::RemoteCall { .. } | Self::CallsFailed { .. } => 5,
            Self::Cancelled { .. } => 130,
        }
    }
}
