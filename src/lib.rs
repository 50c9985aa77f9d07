//! # tinyutil: HTTP helpers and a compile-and-run test harness
//!
//! A small HTTP client for programs built for restricted targets, together
//! with the harness that proves it works: source text goes in, a compiled
//! module is run in an external sandboxed runtime, and its output comes back
//! for assertion.
//!
//! ## Architecture
//!
//! - **Harness**: workspace, compile stage, execute stage and classifier
//! - **HTTP utilities**: GET, POST, form POST and HEAD over a pluggable transport
//! - **Config**: optional TOML file for both, searched in XDG locations
//! - **Logging**: `tracing` subscriber setup for binaries and tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tinyutil::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), HarnessError> {
//!     let harness = Harness::new(HarnessConfig::default());
//!     let output = harness.run(r#"
//! package main
//!
//! func main() { println("T") }
//! "#).await?;
//!     assert_eq!(output.text(), "T");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod harness;
pub mod httputil;
pub mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ConfigError, TinyutilConfig};
    pub use crate::harness::{
        ClassificationPolicy, Harness, HarnessConfig, HarnessError, ProgramOutput, StageFailure,
        ToolCommand,
    };
    pub use crate::httputil::{Client, ClientConfig, FormValues, HttpError, Response};
    pub use crate::logging::{init_logging, LogLevel, LoggingConfig};
}
