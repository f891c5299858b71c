//! # k303-cli: K.303 Validator Command-Line Interface
//!
//! Wraps the engine with file handling: CSV and XLSX ingestion of the reports and
//! the fund registry, YAML configuration, run logging, and JSON / console
//! reporting.
//!
//! ## Subcommands
//!
//! - `validate`: run every registered check over one report month
//! - `checks`: list the check registry
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from handlers; handlers return an exit
//!   code and leave the process exit to `main`.
//! - No check logic here. Everything rule-related lives in `k303-engine`.
//! - `anyhow` with `.context(...)` at this boundary only.

pub mod checks;
pub mod config;
pub mod logging;
pub mod report;
pub mod source;
pub mod validate;
