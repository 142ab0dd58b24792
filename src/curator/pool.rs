// Bounded task pool used by the fetch orchestrator
//
// A pool of size 1 runs jobs inline, one after another, in input order.
// Larger pools spawn one tokio task per item gated by a semaphore and yield
// results in completion order. A job that panics is reported as an `Err`
// for its own item only.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPool {
    limit: usize,
}

impl TaskPool {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn serial() -> Self {
        Self::new(1)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn is_serial(&self) -> bool {
        self.limit == 1
    }

    /// Run `job` for every item. `Err` carries a panic or join failure message.
    pub async fn run<T, O, F, Fut>(&self, items: Vec<T>, job: F) -> Vec<(T, Result<O, String>)>
    where
        T: Clone + Send + 'static,
        O: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        if self.is_serial() {
            let mut results = Vec::with_capacity(items.len());
            for item in items {
                let outcome = AssertUnwindSafe(job(item.clone()))
                    .catch_unwind()
                    .await
                    .map_err(panic_message);
                results.push((item, outcome));
            }
            return results;
        }

        let semaphore = Arc::new(Semaphore::new(self.limit));
        let job = Arc::new(job);
        let mut running = FuturesUnordered::new();

        for item in items {
            let semaphore = Arc::clone(&semaphore);
            let job = Arc::clone(&job);
            let task_item = item.clone();
            let handle = tokio::spawn(async move {
                // The semaphore is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                (*job)(task_item).await
            });
            running.push(async move { (item, handle.await) });
        }

        let mut results = Vec::new();
        while let Some((item, joined)) = running.next().await {
            let outcome = joined.map_err(|e| {
                if e.is_panic() {
                    panic_message(e.into_panic())
                } else {
                    e.to_string()
                }
            });
            results.push((item, outcome));
        }
        results
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("task panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("task panicked: {s}")
    } else {
        "task panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn serial_pool_keeps_input_order() {
        let results = TaskPool::serial()
            .run(vec![3u64, 1, 2], |n| async move {
                tokio::time::sleep(Duration::from_millis(n * 5)).await;
                n * 10
            })
            .await;

        let order: Vec<_> = results.iter().map(|(n, _)| *n).collect();
        assert_eq!(order, vec![3, 1, 2]);
        assert_eq!(results[0].1, Ok(30));
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_limit() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));

        let results = TaskPool::new(3)
            .run((0..12).collect::<Vec<u32>>(), move |n| {
                let active = Arc::clone(&a);
                let peak = Arc::clone(&p);
                async move {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                    n
                }
            })
            .await;

        assert_eq!(results.len(), 12);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak > 1, "jobs never overlapped");
        assert!(peak <= 3);
        let mut seen: Vec<_> = results.into_iter().map(|(n, r)| (n, r.unwrap())).collect();
        seen.sort();
        assert!(seen.iter().all(|(n, r)| n == r));
    }

    #[tokio::test]
    async fn panicking_job_fails_only_its_item() {
        for pool in [TaskPool::serial(), TaskPool::new(4)] {
            let results = pool
                .run(vec!["ok", "boom", "fine"], |s| async move {
                    if s == "boom" {
                        panic!("exploded");
                    }
                    s.len()
                })
                .await;

            assert_eq!(results.len(), 3);
            for (item, outcome) in results {
                match item {
                    "boom" => assert!(outcome.unwrap_err().contains("exploded")),
                    other => assert_eq!(outcome, Ok(other.len())),
                }
            }
        }
    }
}
