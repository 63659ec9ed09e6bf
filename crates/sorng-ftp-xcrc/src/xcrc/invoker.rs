//! Synchronous checksum commands.
//!
//! One command, one reply, no retries. The reply payload is server-defined
//! (conventionally a hex digest) and is returned untouched.

use crate::xcrc::error::{FtpError, FtpResult};
use crate::xcrc::executor::CommandExecutor;
use crate::xcrc::types::ChecksumCommand;

/// Ask the server for the CRC of `path` with the non-standard `XCRC` command.
///
/// Fails with a `CommandRejected` error when the server answers with a
/// failure reply, including when it does not implement `XCRC` at all.
pub fn get_xcrc<E>(executor: &E, path: &str) -> FtpResult<String>
where
    E: CommandExecutor + ?Sized,
{
    get_checksum(executor, ChecksumCommand::Xcrc, path)
}

/// Send `command` for `path` and return the reply message verbatim.
pub fn get_checksum<E>(executor: &E, command: ChecksumCommand, path: &str) -> FtpResult<String>
where
    E: CommandExecutor + ?Sized,
{
    if path.is_empty() {
        return Err(FtpError::invalid_config(format!(
            "{} requires a non-empty path",
            command
        )));
    }

    let reply = executor.execute(&command.command_for(path))?;
    if !reply.is_success() {
        log::warn!("{} {} rejected: {}", command, path, reply.text());
        return Err(FtpError::command_rejected(&reply));
    }

    Ok(reply.message())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xcrc::error::FtpErrorKind;
    use crate::xcrc::executor::mock::ScriptedExecutor;

    #[test]
    fn returns_message_verbatim() {
        let exec = ScriptedExecutor::new().reply("XCRC /pub/file.bin", 250, "A1B2C3D4");
        assert_eq!(get_xcrc(&exec, "/pub/file.bin").unwrap(), "A1B2C3D4");
        assert_eq!(exec.sent(), vec!["XCRC /pub/file.bin"]);
    }

    #[test]
    fn payload_is_not_validated() {
        let exec = ScriptedExecutor::new().reply("XCRC odd.txt", 250, "  not a checksum at all ");
        assert_eq!(get_xcrc(&exec, "odd.txt").unwrap(), "  not a checksum at all ");
    }

    #[test]
    fn unsupported_command_is_command_rejected() {
        let exec = ScriptedExecutor::new();
        let err = get_xcrc(&exec, "/pub/file.bin").unwrap_err();
        assert_eq!(err.kind, FtpErrorKind::CommandRejected);
        assert_eq!(err.code, Some(500));
        assert_eq!(err.message, "500 command not understood");
    }

    #[test]
    fn other_failures_look_the_same() {
        let exec = ScriptedExecutor::new().reply("XCRC /missing", 550, "No such file");
        let err = get_xcrc(&exec, "/missing").unwrap_err();
        assert_eq!(err.kind, FtpErrorKind::CommandRejected);
        assert_eq!(err.code, Some(550));
    }

    #[test]
    fn transport_errors_pass_through() {
        let exec = ScriptedExecutor::new()
            .fail("XCRC /a", FtpError::disconnected("Server closed connection"));
        let err = get_xcrc(&exec, "/a").unwrap_err();
        assert_eq!(err.kind, FtpErrorKind::Disconnected);
        assert_eq!(exec.sent().len(), 1);
    }

    #[test]
    fn empty_path_sends_nothing() {
        let exec = ScriptedExecutor::new();
        let err = get_xcrc(&exec, "").unwrap_err();
        assert_eq!(err.kind, FtpErrorKind::InvalidConfig);
        assert!(exec.sent().is_empty());
    }

    #[test]
    fn sibling_hash_commands() {
        let exec = ScriptedExecutor::new()
            .reply("XMD5 /f", 250, "d41d8cd98f00b204e9800998ecf8427e")
            .reply("XSHA1 /f", 250, "da39a3ee5e6b4b0d3255bfef95601890afd80709");
        assert_eq!(
            get_checksum(&exec, ChecksumCommand::Xmd5, "/f").unwrap(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            get_checksum(&exec, ChecksumCommand::Xsha1, "/f").unwrap(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert!(get_checksum(&exec, ChecksumCommand::Xsha512, "/f")
            .unwrap_err()
            .is_command_rejected());
    }
}
