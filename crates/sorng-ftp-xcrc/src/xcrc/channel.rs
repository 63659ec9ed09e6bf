//! Synchronous [`CommandExecutor`] over an open control connection.
//!
//! The codec is async; `ControlChannel` drives it with the runtime handle it
//! was built with, which lets the blocking invoker and the registry workers
//! use a tokio-backed connection. Calls are serialised on the codec mutex,
//! so concurrent `begin`s against one channel queue up rather than
//! interleave on the wire.
//!
//! `execute` blocks the calling thread. From a worker of a multi-thread
//! runtime it goes through `block_in_place`; on a current-thread runtime it
//! refuses with `InvalidConfig` since blocking there would stall the driver
//! the reply depends on.
//!
//! A round trip that fails at the transport level (timeout, EOF, I/O or a
//! malformed reply) closes the channel. The reply to an abandoned command
//! may still arrive later, and reading it as the answer to the next one
//! would hand a result to the wrong caller.

use crate::xcrc::error::{FtpError, FtpResult};
use crate::xcrc::executor::CommandExecutor;
use crate::xcrc::protocol::FtpCodec;
use crate::xcrc::types::{ControlChannelConfig, FtpResponse};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Mutex;
use tokio::time::timeout;

/// An already-established control connection.
pub struct ControlChannel<S> {
    /// `None` once a round trip has failed and the stream is out of step.
    codec: Mutex<Option<FtpCodec<S>>>,
    runtime: Handle,
    config: ControlChannelConfig,
}

impl<S> ControlChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream. Any banner or login exchange must already
    /// have been consumed.
    pub fn new(stream: S, runtime: Handle, config: ControlChannelConfig) -> Self {
        Self::from_codec(FtpCodec::new(stream), runtime, config)
    }

    pub fn from_codec(codec: FtpCodec<S>, runtime: Handle, config: ControlChannelConfig) -> Self {
        Self {
            codec: Mutex::new(Some(codec)),
            runtime,
            config,
        }
    }

    pub fn config(&self) -> &ControlChannelConfig {
        &self.config
    }

    /// False once a transport failure has closed the channel.
    pub async fn is_open(&self) -> bool {
        self.codec.lock().await.is_some()
    }

    /// One command round trip, bounded by `reply_timeout_sec`.
    pub async fn execute_async(&self, command: &str) -> FtpResult<FtpResponse> {
        let label = self.config.label.as_deref().unwrap_or("ftp");
        let mut slot = self.codec.lock().await;
        // Taken out for the round trip; a cancelled call leaves the channel closed.
        let mut codec = slot.take().ok_or_else(|| {
            FtpError::disconnected(format!(
                "[{}] control channel closed by an earlier failure",
                label
            ))
        })?;
        log::trace!("[{}] {}", label, command);

        let outcome = if self.config.reply_timeout_sec == 0 {
            codec.execute(command).await
        } else {
            let window = Duration::from_secs(self.config.reply_timeout_sec);
            match timeout(window, codec.execute(command)).await {
                Ok(result) => result,
                Err(_) => Err(FtpError::timeout(format!(
                    "[{}] no reply to '{}' within {}s",
                    label, command, self.config.reply_timeout_sec
                ))),
            }
        };

        match outcome {
            Ok(resp) => {
                *slot = Some(codec);
                Ok(resp)
            }
            Err(e) => {
                log::warn!("[{}] closing control channel: {}", label, e);
                Err(e)
            }
        }
    }
}

impl<S> CommandExecutor for ControlChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn execute(&self, command: &str) -> FtpResult<FtpResponse> {
        match Handle::try_current().map(|current| current.runtime_flavor()) {
            Err(_) => self.runtime.block_on(self.execute_async(command)),
            Ok(RuntimeFlavor::CurrentThread) => Err(FtpError::invalid_config(format!(
                "cannot block on '{}' from a current-thread runtime; use begin/end or the async call",
                command
            ))),
            Ok(_) => tokio::task::block_in_place(|| self.runtime.block_on(self.execute_async(command))),
        }
    }
}
