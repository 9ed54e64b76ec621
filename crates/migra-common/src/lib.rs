//! Migra Common Library
//!
//! Shared infrastructure for the migration-job workspace members:
//!
//! - **Logging**: centralized tracing setup used by every binary
//!
//! # Example
//!
//! ```no_run
//! use migra_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env();
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod logging;
