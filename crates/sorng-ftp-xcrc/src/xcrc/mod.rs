//! # sorng-ftp-xcrc: non-standard FTP checksum commands
//!
//! `XCRC <path>` (and the `XMD5` / `XSHA1` / `XSHA256` / `XSHA512` family)
//! asks the server for a file checksum over the control channel. None of
//! these are in RFC 959 and a server is free to reject them; a rejection is
//! reported like any other failed command.
//!
//! Architecture:
//! - `types`: reply, command, handle, config and diagnostics types
//! - `error`: FTP-specific error type
//! - `executor`: the `CommandExecutor` seam (one command in, one reply out)
//! - `protocol`: low-level command/response codec
//! - `channel`: blocking `CommandExecutor` over an open control stream
//! - `invoker`: synchronous `get_xcrc` / `get_checksum`
//! - `registry`: begin/end registry running invocations on workers
//! - `deferred`: future wrapper over begin/end
//! - `client`: `XcrcClient`, the three calling conventions in one place

pub mod types;
pub mod error;
pub mod executor;
pub mod protocol;
pub mod channel;
pub mod invoker;
pub mod registry;
pub mod deferred;
pub mod client;

// Re-exports for lib.rs consumers
pub use types::*;
pub use error::{FtpError, FtpErrorKind, FtpResult};
pub use executor::CommandExecutor;
pub use protocol::FtpCodec;
pub use channel::ControlChannel;
pub use invoker::{get_checksum, get_xcrc};
pub use registry::OperationRegistry;
pub use client::XcrcClient;

use lazy_static::lazy_static;

lazy_static! {
    /// Process-wide operation registry, shared by every client created
    /// with [`XcrcClient::new`].
    pub static ref XCRC_OPERATIONS: OperationRegistry = OperationRegistry::new();
}
