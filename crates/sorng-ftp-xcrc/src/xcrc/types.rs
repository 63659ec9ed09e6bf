//! Shared types for the XCRC crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ─── Control channel ─────────────────────────────────────────────────

/// Configuration for a [`ControlChannel`](crate::xcrc::channel::ControlChannel).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ControlChannelConfig {
    /// Upper bound for one command round trip. 0 waits indefinitely.
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_sec: u64,
    /// Optional label used in log lines.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_reply_timeout() -> u64 {
    60
}

impl Default for ControlChannelConfig {
    fn default() -> Self {
        Self {
            reply_timeout_sec: default_reply_timeout(),
            label: None,
        }
    }
}

// ─── Commands ────────────────────────────────────────────────────────

/// Non-standard hash commands. None of them are part of RFC 959; servers
/// may reject any of them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ChecksumCommand {
    Xcrc,
    Xmd5,
    Xsha1,
    Xsha256,
    Xsha512,
}

impl ChecksumCommand {
    /// Wire verb sent on the control channel.
    pub fn verb(self) -> &'static str {
        match self {
            Self::Xcrc => "XCRC",
            Self::Xmd5 => "XMD5",
            Self::Xsha1 => "XSHA1",
            Self::Xsha256 => "XSHA256",
            Self::Xsha512 => "XSHA512",
        }
    }

    /// Build the command line for `path`.
    pub fn command_for(self, path: &str) -> String {
        format!("{} {}", self.verb(), path)
    }
}

impl Default for ChecksumCommand {
    fn default() -> Self {
        Self::Xcrc
    }
}

impl fmt::Display for ChecksumCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

// ─── Raw reply ───────────────────────────────────────────────────────

/// A raw FTP reply (code + text lines).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FtpResponse {
    pub code: u16,
    pub lines: Vec<String>,
}

impl FtpResponse {
    /// Single-line reply. `line` is the full wire line including the code.
    pub fn new(code: u16, line: impl Into<String>) -> Self {
        Self {
            code,
            lines: vec![line.into()],
        }
    }

    /// Full response text (all lines joined).
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Payload of the final line with the reply code and separator removed.
    /// Only meaningful when [`is_success`](Self::is_success) holds.
    pub fn message(&self) -> String {
        let last = match self.lines.last() {
            Some(l) => l.as_str(),
            None => return String::new(),
        };
        let code = self.code.to_string();
        match last.strip_prefix(code.as_str()) {
            Some(rest) => rest
                .strip_prefix(|c: char| c == ' ' || c == '-')
                .unwrap_or(rest)
                .to_string(),
            None => last.to_string(),
        }
    }

    /// Whether the response code indicates success (1xx–3xx).
    pub fn is_success(&self) -> bool {
        self.code < 400
    }
}

// ─── Async operations ────────────────────────────────────────────────

/// Opaque token correlating a `begin` call with its `end` call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct OperationHandle(Uuid);

impl OperationHandle {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of one live registry entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationInfo {
    pub handle: OperationHandle,
    /// Command line (or caller label) the operation was started for.
    pub command: String,
    pub started_at: DateTime<Utc>,
    /// True once the worker has stored its result; the entry stays until `end`.
    pub completed: bool,
}

/// Counters over the live registry entries.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub pending: usize,
    pub completed_unconsumed: usize,
}
