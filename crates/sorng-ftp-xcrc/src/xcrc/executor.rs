//! The command-executor seam.
//!
//! Everything above this trait (invoker, registry, deferred adapter) only
//! ever needs "send one command line, get one reply back". Connection setup,
//! login and data channels live behind it.

use crate::xcrc::error::FtpResult;
use crate::xcrc::types::FtpResponse;
use std::sync::Arc;

/// Sends a textual command on an open control channel and returns the reply.
///
/// Implementations must be `Send + Sync`: the registry calls `execute` from
/// a worker thread, not from the thread that created the executor.
pub trait CommandExecutor: Send + Sync {
    /// Send `command` (without CRLF) and wait for the complete reply.
    fn execute(&self, command: &str) -> FtpResult<FtpResponse>;
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for Arc<E> {
    fn execute(&self, command: &str) -> FtpResult<FtpResponse> {
        (**self).execute(command)
    }
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &E {
    fn execute(&self, command: &str) -> FtpResult<FtpResponse> {
        (**self).execute(command)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted executor shared by the unit tests.

    use super::*;
    use crate::xcrc::error::FtpError;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replies keyed by the exact command line. Unknown commands get
    /// `500 command not understood`.
    #[derive(Default)]
    pub struct ScriptedExecutor {
        replies: HashMap<String, FtpResult<FtpResponse>>,
        delays: HashMap<String, Duration>,
        sent: Mutex<Vec<String>>,
    }

    impl ScriptedExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(mut self, command: &str, code: u16, message: &str) -> Self {
            self.replies.insert(
                command.to_string(),
                Ok(FtpResponse::new(code, format!("{} {}", code, message))),
            );
            self
        }

        pub fn fail(mut self, command: &str, err: FtpError) -> Self {
            self.replies.insert(command.to_string(), Err(err));
            self
        }

        pub fn delay(mut self, command: &str, delay: Duration) -> Self {
            self.delays.insert(command.to_string(), delay);
            self
        }

        pub fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl CommandExecutor for ScriptedExecutor {
        fn execute(&self, command: &str) -> FtpResult<FtpResponse> {
            self.sent.lock().unwrap().push(command.to_string());
            if let Some(d) = self.delays.get(command) {
                std::thread::sleep(*d);
            }
            self.replies
                .get(command)
                .cloned()
                .unwrap_or_else(|| Ok(FtpResponse::new(500, "500 command not understood")))
        }
    }
}
