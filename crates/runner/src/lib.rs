#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`context`]: Run context with armed cleanup (`RunContext`)
//! - [`runner`]: Single-scenario lifecycle (`ScenarioRunner`)
//! - [`suite`]: Concurrent scenario execution and selection (`Suite`)
//! - [`report`]: Serialisable outcomes (`ScenarioReport`, `SuiteReport`)

pub mod context;
pub mod report;
pub mod runner;
pub mod suite;

pub use context::RunContext;
pub use report::{CleanupStatus, Outcome, ScenarioReport, StepReport, SuiteReport};
pub use runner::ScenarioRunner;
pub use suite::Suite;
