//! Begin/end registry for off-thread command invocations.
//!
//! `begin` hands a blocking job to a worker and returns an
//! [`OperationHandle`] straight away; `end` trades the handle back for the
//! job's result exactly once.
//!
//! Per-operation lifecycle:
//!
//! ```text
//! Created ──(worker stores result)──▶ Completed-Unconsumed
//!    │                                      │
//!    └────────────────(end)─────────────────┴──▶ Consumed
//! ```
//!
//! `end` removes the entry under the map lock and then waits on that
//! entry's own condvar, so a slow operation never blocks other callers.

use crate::xcrc::error::{FtpError, FtpResult};
use crate::xcrc::types::{OperationHandle, OperationInfo, RegistryStats};
use crate::xcrc::XCRC_OPERATIONS;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::runtime::RuntimeFlavor;

/// Name given to workers spawned outside a tokio runtime.
const WORKER_THREAD_NAME: &str = "xcrc-worker";

/// One in-flight or completed operation.
struct PendingOperation {
    command: String,
    started_at: DateTime<Utc>,
    result: StdMutex<Option<FtpResult<String>>>,
    done: Condvar,
}

impl PendingOperation {
    fn new(command: String) -> Self {
        Self {
            command,
            started_at: Utc::now(),
            result: StdMutex::new(None),
            done: Condvar::new(),
        }
    }

    fn complete(&self, result: FtpResult<String>) {
        *lock(&self.result) = Some(result);
        self.done.notify_all();
    }

    fn is_completed(&self) -> bool {
        lock(&self.result).is_some()
    }

    /// Block until the worker has stored a result, then take it.
    fn wait(&self) -> FtpResult<String> {
        let mut slot = lock(&self.result);
        loop {
            if let Some(result) = slot.take() {
                return result;
            }
            slot = self
                .done
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

/// Shared handle → operation map. Clones share the same map.
#[derive(Clone, Default)]
pub struct OperationRegistry {
    operations: Arc<StdMutex<HashMap<OperationHandle, Arc<PendingOperation>>>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by clients that were not given one.
    pub fn global() -> &'static OperationRegistry {
        &XCRC_OPERATIONS
    }

    /// Start `job` on a worker and return its handle without waiting.
    ///
    /// `command` is only used for logging and [`list`](Self::list).
    pub fn begin<F>(&self, command: impl Into<String>, job: F) -> FtpResult<OperationHandle>
    where
        F: FnOnce() -> FtpResult<String> + Send + 'static,
    {
        self.begin_with_callback(command, job, |_| {})
    }

    /// Like [`begin`](Self::begin), and run `callback` on the worker once the
    /// result is ready. Calling [`end`](Self::end) from the callback does
    /// not block.
    pub fn begin_with_callback<F, C>(
        &self,
        command: impl Into<String>,
        job: F,
        callback: C,
    ) -> FtpResult<OperationHandle>
    where
        F: FnOnce() -> FtpResult<String> + Send + 'static,
        C: FnOnce(OperationHandle) + Send + 'static,
    {
        let op = Arc::new(PendingOperation::new(command.into()));
        let handle = self.insert(Arc::clone(&op));
        log::debug!("XCRC op {} begin: {}", handle, op.command);

        let task = move || {
            let result = panic::catch_unwind(AssertUnwindSafe(job)).unwrap_or_else(|_| {
                Err(FtpError::unknown(format!(
                    "Worker for operation {} panicked",
                    handle
                )))
            });
            op.complete(result);
            callback(handle);
        };

        if let Err(e) = spawn_worker(task) {
            self.remove(&handle);
            return Err(e);
        }
        Ok(handle)
    }

    /// Consume `handle` and return its result, waiting for the worker if it
    /// has not finished yet. Never-issued and already-consumed handles both
    /// yield an `UnknownOperation` error.
    pub fn end(&self, handle: &OperationHandle) -> FtpResult<String> {
        let op = self
            .remove(handle)
            .ok_or_else(|| FtpError::unknown_operation(handle))?;
        let result = op.wait();
        log::debug!(
            "XCRC op {} end: {}",
            handle,
            if result.is_ok() { "ok" } else { "error" }
        );
        result
    }

    // ─── Diagnostics ─────────────────────────────────────────────

    /// Whether `handle` is live (issued and not yet consumed).
    pub fn contains(&self, handle: &OperationHandle) -> bool {
        lock(&self.operations).contains_key(handle)
    }

    /// `Some(true)` once the worker finished, `None` if the handle is not live.
    pub fn is_completed(&self, handle: &OperationHandle) -> Option<bool> {
        lock(&self.operations).get(handle).map(|op| op.is_completed())
    }

    pub fn len(&self) -> usize {
        lock(&self.operations).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all live entries, oldest first.
    pub fn list(&self) -> Vec<OperationInfo> {
        let mut infos: Vec<OperationInfo> = lock(&self.operations)
            .iter()
            .map(|(handle, op)| OperationInfo {
                handle: *handle,
                command: op.command.clone(),
                started_at: op.started_at,
                completed: op.is_completed(),
            })
            .collect();
        infos.sort_by_key(|i| i.started_at);
        infos
    }

    pub fn stats(&self) -> RegistryStats {
        let ops = lock(&self.operations);
        let completed = ops.values().filter(|op| op.is_completed()).count();
        RegistryStats {
            pending: ops.len() - completed,
            completed_unconsumed: completed,
        }
    }

    // ─── Internals ───────────────────────────────────────────────

    fn insert(&self, op: Arc<PendingOperation>) -> OperationHandle {
        let mut ops = lock(&self.operations);
        let mut handle = OperationHandle::generate();
        while ops.contains_key(&handle) {
            handle = OperationHandle::generate();
        }
        ops.insert(handle, op);
        handle
    }

    fn remove(&self, handle: &OperationHandle) -> Option<Arc<PendingOperation>> {
        lock(&self.operations).remove(handle)
    }
}

/// Run `task` on tokio's blocking pool when a runtime is current, otherwise
/// on a dedicated OS thread.
fn spawn_worker<F>(task: F) -> FtpResult<()>
where
    F: FnOnce() + Send + 'static,
{
    // Blocking threads of a current-thread runtime cannot block on it, so
    // only a multi-thread runtime gets the blocking pool.
    match tokio::runtime::Handle::try_current() {
        Ok(rt) if rt.runtime_flavor() != RuntimeFlavor::CurrentThread => {
            rt.spawn_blocking(task);
            Ok(())
        }
        _ => std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(task)
            .map(|_| ())
            .map_err(|e| FtpError::io_error(format!("Cannot spawn {}: {}", WORKER_THREAD_NAME, e))),
    }
}

/// Lock a std mutex, recovering the data if a previous holder panicked.
fn lock<T>(m: &StdMutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
