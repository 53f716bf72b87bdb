//! Job deadline
//!
//! A single point in time shared by every blocking step of a job. Futures run
//! through [`Deadline::run`] are dropped (and child processes killed) once it
//! passes.

use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, error::Elapsed};

/// Used when `now + timeout` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        let now = Instant::now();
        let at = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { at }
    }

    /// Time left before expiry, zero once expired
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Runs `future` to completion or until the deadline passes
    pub async fn run<F: Future>(&self, future: F) -> Result<F::Output, Elapsed> {
        tokio::time::timeout_at(self.at, future).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_before_expiry() {
        let deadline = Deadline::after(Duration::from_secs(5));
        assert!(!deadline.is_expired());
        assert_eq!(deadline.run(async { 7 }).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_run_past_expiry() {
        let deadline = Deadline::after(Duration::from_millis(10));
        let result = deadline
            .run(tokio::time::sleep(Duration::from_secs(5)))
            .await;
        assert!(result.is_err());
        assert!(deadline.is_expired());
    }

    #[test]
    fn test_huge_timeout_does_not_overflow() {
        let deadline = Deadline::after(Duration::MAX);
        assert!(deadline.remaining() > Duration::from_secs(86400));
    }
}
