//! Job queue
//!
//! Bounded FIFO hand-off between the intake handler (many producers) and the
//! single worker (one consumer). Enqueueing waits while the queue is full, so
//! a slow worker throttles intake instead of dropping accepted jobs. Nothing
//! is persisted: queued jobs are lost when the process exits.

use runhook_core::domain::job::Job;
use thiserror::Error;
use tokio::sync::mpsc;

/// Default number of jobs that may wait for the worker
pub const DEFAULT_QUEUE_CAPACITY: usize = 200;

/// Returned when the worker side of the queue is gone
#[derive(Debug, Error)]
#[error("job queue is closed")]
pub struct QueueClosed;

/// Producer handle, cheap to clone into every request handler
#[derive(Debug, Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<Job>,
}

/// Consumer handle, owned by the worker
#[derive(Debug)]
pub struct JobReceiver {
    receiver: mpsc::Receiver<Job>,
}

impl JobQueue {
    /// Creates a queue holding at most `capacity` jobs (at least one)
    pub fn bounded(capacity: usize) -> (JobQueue, JobReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (JobQueue { sender }, JobReceiver { receiver })
    }

    /// Appends a job, waiting for a free slot when the queue is full
    pub async fn enqueue(&self, job: Job) -> Result<(), QueueClosed> {
        self.sender.send(job).await.map_err(|_| QueueClosed)
    }

    /// Number of jobs currently waiting
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }
}

impl JobReceiver {
    /// Waits for the next job; `None` once every producer is dropped and the
    /// queue is drained
    pub async fn next(&mut self) -> Option<Job> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use runhook_core::domain::job::JobDescription;
    use std::path::PathBuf;
    use std::time::Duration;

    fn job(run_id: &str) -> Job {
        let description = JobDescription {
            run_id: run_id.to_string(),
            ..Default::default()
        };
        Job::new(description, PathBuf::from("scripts/check.sh"))
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (queue, mut receiver) = JobQueue::bounded(10);

        queue.enqueue(job("run-1")).await.unwrap();
        queue.enqueue(job("run-2")).await.unwrap();
        queue.enqueue(job("run-3")).await.unwrap();
        assert_eq!(queue.len(), 3);

        for expected in ["run-1", "run-2", "run-3"] {
            let next = receiver.next().await.unwrap();
            assert_eq!(next.description.run_id, expected);
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_waits_when_full() {
        let (queue, mut receiver) = JobQueue::bounded(1);
        assert_eq!(queue.capacity(), 1);

        queue.enqueue(job("run-1")).await.unwrap();

        let blocked = tokio::time::timeout(Duration::from_millis(50), queue.enqueue(job("run-2")));
        assert!(blocked.await.is_err(), "enqueue should wait for a free slot");
        assert_eq!(queue.len(), 1);

        let producer = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.enqueue(job("run-2")).await })
        };

        assert_eq!(receiver.next().await.unwrap().description.run_id, "run-1");
        producer.await.unwrap().unwrap();
        assert_eq!(receiver.next().await.unwrap().description.run_id, "run-2");
    }

    #[tokio::test]
    async fn test_closed_queue() {
        let (queue, receiver) = JobQueue::bounded(1);
        drop(receiver);

        assert!(queue.enqueue(job("run-1")).await.is_err());
    }

    #[tokio::test]
    async fn test_receiver_ends_when_producers_dropped() {
        let (queue, mut receiver) = JobQueue::bounded(2);
        queue.enqueue(job("run-1")).await.unwrap();
        drop(queue);

        assert!(receiver.next().await.is_some());
        assert!(receiver.next().await.is_none());
    }
}
