//! Quiver Telemetry - logging for the quiver tool package manager.
//!
//! Wraps `tracing-subscriber` behind a small [`LogConfig`] so that the CLI
//! and tests configure output the same way.
//!
//! # Example
//!
//! ```rust,no_run
//! use quiver_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), quiver_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("reqwest=warn");
//!
//! setup_logging(&config)?;
//! tracing::info!("ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, setup_logging};
