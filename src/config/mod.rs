//! Configuration management for tinyutil.
//!
//! Configuration is stored in TOML format. The search order is:
//! 1. `./tinyutil.toml` (project-local)
//! 2. `~/.config/tinyutil/config.toml` (XDG config)
//!
//! No file at all is fine: every setting has a default.
//!
//! # Example Configuration
//!
//! ```toml
//! [harness]
//! build_timeout_secs = 30
//! run_timeout_ms = 1000
//! policy = "exit-status-only"
//! target = "wasip1"
//!
//! [harness.compiler]
//! program = "tinygo"
//!
//! [harness.runtime]
//! program = "wasmtime"
//! args = ["run"]
//!
//! [http]
//! timeout_secs = 10
//!
//! [logging]
//! enabled = true
//! level = "warn"
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tinyutil::config;
//! use tinyutil::harness::Harness;
//!
//! let config = config::load()?;
//! let harness = Harness::new(config.harness.to_harness_config()?);
//! ```

mod error;
mod file;
mod types;

pub use error::ConfigError;
pub use file::{from_path, from_str, load, search_paths, xdg_config_dir, APP_NAME};
pub use types::{HarnessFileConfig, HttpFileConfig, TinyutilConfig};
