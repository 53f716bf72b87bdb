//! Runhook Core
//!
//! Core types for the Runhook run-task service.
//!
//! This crate contains:
//! - Domain types: the job description received from the orchestrator, the
//!   queued job, per-command outcomes and the aggregated verdict
//! - DTOs: the task-result document sent back to the orchestrator

pub mod domain;
pub mod dto;
