//! Intake Handler
//!
//! Turns a validated webhook into a queued job.

use runhook_core::domain::job::{Job, JobDescription};
use runhook_runner::queue::{JobQueue, QueueClosed};
use thiserror::Error;
use uuid::Uuid;

use crate::service::checksum::{ChecksumValidator, ValidationError};

/// Intake error type
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Job could not be queued: {0}")]
    QueueClosed(#[from] QueueClosed),
}

/// What intake did with an accepted webhook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOutcome {
    Enqueued(Uuid),
    /// Validated only; test-stage webhooks are never run
    TestStage,
}

/// Validate the referenced script and enqueue the job
///
/// Waits while the queue is full.
pub async fn handle_payload(
    validator: &ChecksumValidator,
    queue: &JobQueue,
    path: &str,
    shasum: &str,
    description: JobDescription,
) -> Result<IntakeOutcome, IntakeError> {
    let script_path = validator.validate(path, shasum).await?;

    if description.is_test_stage() {
        tracing::info!("Test stage webhook for run {}, not enqueued", description.run_id);
        return Ok(IntakeOutcome::TestStage);
    }

    let job = Job::new(description, script_path);
    let id = job.id;

    tracing::info!(
        "Job {} accepted for run {} (stage {}), {}/{} queue slots in use",
        id,
        job.description.run_id,
        job.description.stage,
        queue.len(),
        queue.capacity()
    );
    queue.enqueue(job).await?;

    Ok(IntakeOutcome::Enqueued(id))
}
