use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum CalldeckError {
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid dataset kind: {0}")]
    InvalidDatasetKind(String),

    #[error("invalid entries: {0}")]
    InvalidEntries(String),

    #[error("no identifier set; load an identifier before saving")]
    MissingIdentifier,

    #[error("missing config file calldeck.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("remote store request failed: {0}")]
    RemoteHttp(String),

    #[error("remote store returned status {status}: {message}")]
    RemoteStatus { status: u16, message: String },

    #[error("failed to decode remote store response: {0}")]
    RemoteDecode(String),
}

impl CalldeckError {
    /// Transport failures are retryable by reissuing the same request;
    /// validation failures are user-correctable and never persisted.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            CalldeckError::RemoteHttp(_)
                | CalldeckError::RemoteStatus { .. }
                | CalldeckError::RemoteDecode(_)
        )
    }
}
