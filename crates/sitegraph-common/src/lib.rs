//! Sitegraph Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the sitegraph workspace:
//!
//! - **Logging**: centralized `tracing` configuration and initialization
//! - **Digests**: content digests used for node change detection
//!
//! # Example
//!
//! ```no_run
//! use sitegraph_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = LogConfig::from_env()?;
//!     init_logging(&config)?;
//!     Ok(())
//! }
//! ```

pub mod digest;
pub mod logging;
