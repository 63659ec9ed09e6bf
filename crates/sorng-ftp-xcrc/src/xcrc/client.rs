//! `XcrcClient`: the three calling conventions over one executor.
//!
//! - direct: [`get_xcrc`](XcrcClient::get_xcrc) blocks until the reply.
//! - begin/end: [`begin_get_xcrc`](XcrcClient::begin_get_xcrc) (optionally
//!   with a completion callback) and [`end_get_xcrc`](XcrcClient::end_get_xcrc).
//! - deferred: [`get_xcrc_async`](XcrcClient::get_xcrc_async) returns a future.
//!
//! Every `*_xcrc` method has a `*_checksum` twin taking a [`ChecksumCommand`].

use crate::xcrc::error::FtpResult;
use crate::xcrc::executor::CommandExecutor;
use crate::xcrc::invoker;
use crate::xcrc::registry::OperationRegistry;
use crate::xcrc::types::{ChecksumCommand, OperationHandle};
use std::future::Future;
use std::sync::Arc;

pub struct XcrcClient<E: ?Sized> {
    executor: Arc<E>,
    registry: OperationRegistry,
}

impl<E: ?Sized> Clone for XcrcClient<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            registry: self.registry.clone(),
        }
    }
}

impl<E> XcrcClient<E>
where
    E: CommandExecutor + ?Sized + 'static,
{
    /// Client backed by the process-wide registry.
    pub fn new(executor: Arc<E>) -> Self {
        Self::with_registry(executor, OperationRegistry::global().clone())
    }

    /// Client backed by its own registry. Handles from one registry are
    /// unknown to every other.
    pub fn with_registry(executor: Arc<E>, registry: OperationRegistry) -> Self {
        Self { executor, registry }
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    // ─── Direct ──────────────────────────────────────────────────

    pub fn get_xcrc(&self, path: &str) -> FtpResult<String> {
        self.get_checksum(ChecksumCommand::Xcrc, path)
    }

    pub fn get_checksum(&self, command: ChecksumCommand, path: &str) -> FtpResult<String> {
        invoker::get_checksum(&*self.executor, command, path)
    }

    // ─── Begin / end ─────────────────────────────────────────────

    pub fn begin_get_xcrc(&self, path: &str) -> FtpResult<OperationHandle> {
        self.begin_get_checksum(ChecksumCommand::Xcrc, path)
    }

    pub fn begin_get_xcrc_with_callback<C>(
        &self,
        path: &str,
        callback: C,
    ) -> FtpResult<OperationHandle>
    where
        C: FnOnce(OperationHandle) + Send + 'static,
    {
        self.begin_get_checksum_with_callback(ChecksumCommand::Xcrc, path, callback)
    }

    /// Collect the result of [`begin_get_xcrc`](Self::begin_get_xcrc).
    pub fn end_get_xcrc(&self, handle: &OperationHandle) -> FtpResult<String> {
        self.end_get_checksum(handle)
    }

    pub fn begin_get_checksum(
        &self,
        command: ChecksumCommand,
        path: &str,
    ) -> FtpResult<OperationHandle> {
        let (line, job) = self.job(command, path);
        self.registry.begin(line, job)
    }

    pub fn begin_get_checksum_with_callback<C>(
        &self,
        command: ChecksumCommand,
        path: &str,
        callback: C,
    ) -> FtpResult<OperationHandle>
    where
        C: FnOnce(OperationHandle) + Send + 'static,
    {
        let (line, job) = self.job(command, path);
        self.registry.begin_with_callback(line, job, callback)
    }

    pub fn end_get_checksum(&self, handle: &OperationHandle) -> FtpResult<String> {
        self.registry.end(handle)
    }

    // ─── Deferred ────────────────────────────────────────────────

    /// The command is sent from a worker as soon as this is called; the
    /// returned future only collects the result.
    pub fn get_xcrc_async(
        &self,
        path: &str,
    ) -> impl Future<Output = FtpResult<String>> + Send + 'static {
        self.get_checksum_async(ChecksumCommand::Xcrc, path)
    }

    pub fn get_checksum_async(
        &self,
        command: ChecksumCommand,
        path: &str,
    ) -> impl Future<Output = FtpResult<String>> + Send + 'static {
        let (line, job) = self.job(command, path);
        self.registry.invoke_async(line, job)
    }

    fn job(
        &self,
        command: ChecksumCommand,
        path: &str,
    ) -> (String, impl FnOnce() -> FtpResult<String> + Send + 'static) {
        let executor = Arc::clone(&self.executor);
        let path = path.to_string();
        let line = command.command_for(&path);
        (line, move || invoker::get_checksum(&*executor, command, &path))
    }
}
