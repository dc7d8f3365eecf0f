//! Shared test utilities for jobflow integration tests.
//!
//! This module provides:
//! - `TestHarness` with an isolated database, a controllable clock and
//!   shortcuts for seeding users and jobs
//! - Builders for the workflow input types

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::{t0, Crew, TestHarness};
