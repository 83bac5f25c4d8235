use crate::error::{GatewayError, Result};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Bounds the number of simultaneously in-flight provider invocations.
///
/// Backed by a fair semaphore: callers that find no free slot queue FIFO,
/// while a caller arriving at a free slot starts immediately. The slot is
/// released when the task completes, fails, or panics, since the permit
/// lives on the stack of the running task and is dropped on every exit
/// path.
///
/// Construct one gate at process start and pass it by reference into every
/// invocation site.
pub struct ConcurrencyGate {
    semaphore: Semaphore,
    limit: usize,
    running: AtomicUsize,
}

impl ConcurrencyGate {
    /// Create a gate admitting at most `limit` concurrent tasks.
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(GatewayError::InvalidConcurrencyLimit);
        }
        Ok(Self {
            semaphore: Semaphore::new(limit),
            limit,
            running: AtomicUsize::new(0),
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of tasks currently holding a slot
    pub fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Run `task` once a slot is free.
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let permit = match self.semaphore.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                log::debug!("Waiting for concurrency slot, {} running", self.running());
                // The semaphore is never closed, so acquire cannot fail.
                self.semaphore
                    .acquire()
                    .await
                    .expect("concurrency gate semaphore closed")
            }
        };

        self.running.fetch_add(1, Ordering::SeqCst);
        let _running = RunningGuard(&self.running);
        let result = task.await;
        drop(_running);
        drop(permit);
        result
    }
}

/// Decrements on drop so the count stays accurate across panics.
struct RunningGuard<'a>(&'a AtomicUsize);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn zero_limit_is_rejected() {
        assert!(matches!(
            ConcurrencyGate::new(0),
            Err(GatewayError::InvalidConcurrencyLimit)
        ));
    }

    #[tokio::test]
    async fn never_exceeds_the_limit() {
        for limit in 1..=5usize {
            let gate = Arc::new(ConcurrencyGate::new(limit).unwrap());
            let live = Arc::new(AtomicUsize::new(0));
            let peak = Arc::new(AtomicUsize::new(0));

            let mut handles = Vec::new();
            for _ in 0..20 {
                let gate = Arc::clone(&gate);
                let live = Arc::clone(&live);
                let peak = Arc::clone(&peak);
                handles.push(tokio::spawn(async move {
                    gate.run(async {
                        let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        live.fetch_sub(1, Ordering::SeqCst);
                    })
                    .await;
                }));
            }
            for handle in handles {
                handle.await.unwrap();
            }

            assert!(
                peak.load(Ordering::SeqCst) <= limit,
                "peak {} exceeded limit {limit}",
                peak.load(Ordering::SeqCst)
            );
            assert_eq!(gate.running(), 0);
        }
    }

    #[tokio::test]
    async fn queued_tasks_run_in_enqueue_order() {
        let gate = Arc::new(ConcurrencyGate::new(1).unwrap());
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        // Occupy the only slot so that subsequent tasks must queue.
        let blocker = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                gate.run(tokio::time::sleep(Duration::from_millis(50))).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let mut handles = Vec::new();
        for index in 0..4 {
            let gate = Arc::clone(&gate);
            let order = Arc::clone(&order);
            handles.push(tokio::spawn(async move {
                gate.run(async {
                    order.lock().unwrap().push(index);
                })
                .await;
            }));
            // Give each task time to reach the queue before the next.
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        blocker.await.unwrap();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn failed_tasks_release_their_slot() {
        let gate = ConcurrencyGate::new(1).unwrap();

        let failed: std::result::Result<(), &str> = gate.run(async { Err("boom") }).await;
        assert!(failed.is_err());

        // The slot must be free again.
        let ok = gate.run(async { 42 }).await;
        assert_eq!(ok, 42);
        assert_eq!(gate.running(), 0);
    }
}
