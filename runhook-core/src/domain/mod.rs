//! Core domain types
//!
//! These types flow through the whole pipeline: the intake handler builds a
//! [`job::Job`], the worker turns it into [`outcome::CommandOutcome`]s and
//! finally a [`verdict::Verdict`].

pub mod job;
pub mod outcome;
pub mod verdict;
