//! Future-based wrapper over the begin/end pair.

use crate::xcrc::error::{FtpError, FtpResult};
use crate::xcrc::registry::OperationRegistry;
use crate::xcrc::types::OperationHandle;
use std::future::Future;
use tokio::sync::oneshot;

impl OperationRegistry {
    /// Start `job` now and return a future that resolves to its result.
    ///
    /// The job is scheduled before this function returns, whether or not
    /// the future is ever polled. There is no cancellation: dropping the
    /// future only discards the result once the job finishes.
    pub fn invoke_async<F>(
        &self,
        command: impl Into<String>,
        job: F,
    ) -> impl Future<Output = FtpResult<String>> + Send + 'static
    where
        F: FnOnce() -> FtpResult<String> + Send + 'static,
    {
        let (done_tx, done_rx) = oneshot::channel::<()>();
        let reaper = self.clone();
        let begun = self.begin_with_callback(command, job, move |handle| {
            if done_tx.send(()).is_err() {
                // Nobody is left to call `end`.
                let _ = reaper.end(&handle);
            }
        });
        let collect = begun.map(|handle| Collect {
            registry: self.clone(),
            handle,
            done_rx: Some(done_rx),
        });

        async move {
            let mut collect = collect?;
            let handle = collect.handle;
            if let Some(rx) = collect.done_rx.as_mut() {
                rx.await.map_err(|_| {
                    FtpError::unknown(format!(
                        "Worker for operation {} exited without completing",
                        handle
                    ))
                })?;
            }
            collect.done_rx = None;
            collect.registry.end(&handle)
        }
    }
}

/// Consumes a finished-but-unobserved entry when the future is dropped
/// after the worker signalled completion but before the final `end`.
struct Collect {
    registry: OperationRegistry,
    handle: OperationHandle,
    done_rx: Option<oneshot::Receiver<()>>,
}

impl Drop for Collect {
    fn drop(&mut self) {
        if let Some(rx) = self.done_rx.take() {
            // Once the receiver is gone the callback reaps on its own;
            // anything that completed before that is ours to reap.
            drop(rx);
            if self.registry.is_completed(&self.handle) == Some(true) {
                let _ = self.registry.end(&self.handle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xcrc::error::FtpErrorKind;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    #[tokio::test]
    async fn resolves_to_job_result() {
        let reg = OperationRegistry::new();
        let out = reg.invoke_async("XCRC /a", || Ok("A1B2C3D4".to_string())).await;
        assert_eq!(out.unwrap(), "A1B2C3D4");
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn propagates_job_error() {
        let reg = OperationRegistry::new();
        let err = reg
            .invoke_async("XCRC /a", || {
                Err(FtpError::new(FtpErrorKind::CommandRejected, "500 x").with_code(500))
            })
            .await
            .unwrap_err();
        assert!(err.is_command_rejected());
        assert!(reg.is_empty());
    }

    #[tokio::test]
    async fn job_starts_before_first_poll() {
        let reg = OperationRegistry::new();
        let started = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&started);
        let (tx, rx) = mpsc::channel();

        let fut = reg.invoke_async("XCRC /a", move || {
            flag.store(true, Ordering::SeqCst);
            tx.send(()).ok();
            Ok("x".to_string())
        });
        assert_eq!(reg.len(), 1);

        tokio::task::spawn_blocking(move || rx.recv_timeout(Duration::from_secs(5)))
            .await
            .unwrap()
            .unwrap();
        assert!(started.load(Ordering::SeqCst));
        assert_eq!(fut.await.unwrap(), "x");
    }

    #[tokio::test]
    async fn dropped_future_does_not_leak_entry() {
        let reg = OperationRegistry::new();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let fut = reg.invoke_async("XCRC /slow", move || {
            release_rx.recv().ok();
            Ok("late".to_string())
        });
        drop(fut);
        assert_eq!(reg.len(), 1);
        release_tx.send(()).unwrap();

        for _ in 0..200 {
            if reg.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(reg.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_futures_do_not_cross_talk() {
        let reg = OperationRegistry::new();
        let futs: Vec<_> = (0..16)
            .map(|i| {
                reg.invoke_async(format!("XCRC /f{}", i), move || {
                    std::thread::sleep(Duration::from_millis((16 - i) as u64));
                    Ok(format!("crc-{}", i))
                })
            })
            .collect();
        for (i, fut) in futs.into_iter().enumerate() {
            assert_eq!(fut.await.unwrap(), format!("crc-{}", i));
        }
        assert!(reg.is_empty());
    }
}
