#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`TerraformError`)
//! - [`command`]: Subcommands and their arguments (`TerraformCommand`, `CommandOutput`)
//! - [`client`]: Process abstraction (`TerraformClient` trait, `CliTerraform`)
//! - [`retry`]: Transient error matching (`RetryPolicy`)
//! - [`executor`]: Per-scenario step execution with retries (`TerraformExecutor`)
//! - [`output`]: Summary line parsing
//!
//! # Architecture
//!
//! ```text
//! Scenario --> TerraformExecutor::{init, validate, apply, destroy}
//!                    |
//!              RetryPolicy.matching(output)?  --yes--> sleep, retry
//!                    |
//!              TerraformClient.execute()
//!                    |
//!              terraform <command> (cwd = scenario directory)
//! ```

pub mod client;
pub mod command;
pub mod error;
pub mod executor;
pub mod output;
pub mod retry;

// --- Public API Re-exports ---

pub use client::{CliTerraform, TerraformClient};
pub use command::{CommandOutput, TerraformCommand};
pub use error::TerraformError;
pub use executor::{Executed, TerraformExecutor};
pub use output::{parse_apply_changes, parse_destroyed_count};
pub use retry::RetryPolicy;
