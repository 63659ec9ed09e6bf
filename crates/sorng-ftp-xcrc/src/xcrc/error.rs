//! Error type shared by the checksum invoker, registry and control channel.

use crate::xcrc::types::{FtpResponse, OperationHandle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised FTP error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FtpError {
    pub kind: FtpErrorKind,
    pub message: String,
    /// FTP reply code that triggered the error, if any.
    pub code: Option<u16>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FtpErrorKind {
    /// Server answered the command with a failure reply. Includes servers
    /// that do not understand the command at all.
    CommandRejected,
    /// `end` was called with a handle that is not in the registry, either
    /// because it was never issued or because it was already consumed.
    UnknownOperation,
    /// Control channel closed by the peer.
    Disconnected,
    /// Server sent an un-parseable reply.
    ProtocolError,
    /// I/O error on the local side.
    IoError,
    /// Reply did not arrive within the configured window.
    Timeout,
    /// Parameter validation error.
    InvalidConfig,
    /// Catch-all.
    Unknown,
}

pub type FtpResult<T> = Result<T, FtpError>;

// ── Construction helpers ─────────────────────────────────────────────

impl FtpError {
    pub fn new(kind: FtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    /// Failure reply from the server. Carries the reply code and the full
    /// reply text; the reply is never reclassified by code.
    pub fn command_rejected(reply: &FtpResponse) -> Self {
        Self::new(FtpErrorKind::CommandRejected, reply.text()).with_code(reply.code)
    }

    pub fn unknown_operation(handle: &OperationHandle) -> Self {
        Self::new(
            FtpErrorKind::UnknownOperation,
            format!("Operation handle {} was not found in the registry", handle),
        )
    }

    pub fn disconnected(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Disconnected, msg)
    }

    pub fn protocol_error(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::ProtocolError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::IoError, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Timeout, msg)
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::InvalidConfig, msg)
    }

    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Unknown, msg)
    }

    pub fn is_command_rejected(&self) -> bool {
        self.kind == FtpErrorKind::CommandRejected
    }

    pub fn is_unknown_operation(&self) -> bool {
        self.kind == FtpErrorKind::UnknownOperation
    }
}

impl fmt::Display for FtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[FTP {:?} {}] {}", self.kind, code, self.message)
        } else {
            write!(f, "[FTP {:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for FtpError {}

impl From<std::io::Error> for FtpError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::TimedOut {
            Self::timeout(format!("I/O timeout: {}", e))
        } else {
            Self::io_error(e.to_string())
        }
    }
}

impl From<FtpError> for String {
    fn from(e: FtpError) -> String {
        e.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_reply_keeps_code_and_text() {
        let reply = FtpResponse::new(500, "500 command not understood");
        let err = FtpError::command_rejected(&reply);
        assert!(err.is_command_rejected());
        assert_eq!(err.code, Some(500));
        assert_eq!(err.message, "500 command not understood");
        assert_eq!(
            err.to_string(),
            "[FTP CommandRejected 500] 500 command not understood"
        );
    }

    #[test]
    fn permission_reply_is_not_reclassified() {
        let reply = FtpResponse::new(550, "550 Permission denied");
        let err = FtpError::command_rejected(&reply);
        assert_eq!(err.kind, FtpErrorKind::CommandRejected);
    }

    #[test]
    fn io_timeout_maps_to_timeout_kind() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "slow");
        let err: FtpError = io.into();
        assert_eq!(err.kind, FtpErrorKind::Timeout);

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: FtpError = io.into();
        assert_eq!(err.kind, FtpErrorKind::IoError);
    }

    #[test]
    fn serializes_kind_and_code() {
        let err = FtpError::new(FtpErrorKind::UnknownOperation, "nope");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "UnknownOperation");
        assert!(json["code"].is_null());
    }
}
