//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: Core config struct definitions and TOML loading
//! - [`listen`]: Network listener configuration (ListenConfig)
//! - [`defaults`]: Default values shared by serde and `Default` impls
//! - [`validation`]: Startup checks
//!
//! Precedence, lowest first: built-in defaults, the TOML file, command-line
//! [`Overrides`].

mod defaults;
mod listen;
mod types;
mod validation;

pub use listen::ListenConfig;
pub use types::{ClockConfig, Config, ConfigError, Overrides, SyncConfig};
pub use validation::{ValidationError, validate};
