use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// A bounded pool of concurrently-running jobs, matching the
/// `AddJob`/`CloseGoWorker`/`WaitGoWorkerClose` collaborator contract the
/// heartbeater is built against.
///
/// `concurrency` caps how many submitted jobs run at once; `queue` caps
/// how many jobs may be admitted (submitted but not yet finished) before
/// [`add_job`](GoWorkerPool::add_job) starts blocking the caller, the way
/// a bounded channel would.
pub struct GoWorkerPool {
    admission: Arc<Semaphore>,
    concurrency: Arc<Semaphore>,
    tasks: JoinSet<()>,
}

impl GoWorkerPool {
    pub fn new(concurrency: usize, queue: usize) -> Self {
        Self {
            admission: Arc::new(Semaphore::new(queue)),
            concurrency: Arc::new(Semaphore::new(concurrency)),
            tasks: JoinSet::new(),
        }
    }

    /// Submits a job. Blocks until there's room in the admission queue;
    /// the job itself doesn't start running until a concurrency slot
    /// frees up.
    pub async fn add_job<F>(&mut self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let admission = Arc::clone(&self.admission);
        let concurrency = Arc::clone(&self.concurrency);

        let admission_permit = admission.acquire_owned().await.expect("admission semaphore is never closed");

        self.tasks.spawn(async move {
            let _admission_permit = admission_permit;
            let _concurrency_permit = concurrency.acquire_owned().await.expect("concurrency semaphore is never closed");
            job.await;
        });
    }

    /// Waits for every submitted job to finish.
    pub async fn wait_closed(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn runs_all_jobs_and_waits_for_completion() {
        let mut pool = GoWorkerPool::new(2, 10);
        let completed = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let completed = Arc::clone(&completed);
            pool.add_job(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                completed.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        }

        pool.wait_closed().await;
        assert_eq!(completed.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn never_exceeds_the_concurrency_limit() {
        let mut pool = GoWorkerPool::new(3, 20);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_observed = Arc::new(AtomicUsize::new(0));

        for _ in 0..12 {
            let in_flight = Arc::clone(&in_flight);
            let max_observed = Arc::clone(&max_observed);
            pool.add_job(async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_observed.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            })
            .await;
        }

        pool.wait_closed().await;
        assert!(max_observed.load(Ordering::SeqCst) <= 3);
    }
}
