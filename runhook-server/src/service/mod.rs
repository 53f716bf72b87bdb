//! Service Module
//!
//! Intake logic for the webhook server: script validation and the hand-off
//! of accepted jobs to the worker queue.

pub mod checksum;
pub mod intake;

pub use checksum::{ChecksumValidator, ValidationError};
pub use intake::{IntakeError, IntakeOutcome};
