//! Scheduler layer for the runner
//!
//! A single worker drains the job queue and runs each job's pipeline to
//! completion before taking the next one.

pub mod worker;

pub use worker::{CallbackError, JobReport, Worker};
