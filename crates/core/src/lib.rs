//! Shared domain logic for the lutspace client stack.
//!
//! This crate holds everything that is pure or process-local:
//!
//! - [`prompt`] — instruction-template formatting for the inference service.
//! - [`cleaner`] — heuristic cleanup of raw model completions.
//! - [`naming`] — `lut_name` derivation and license-token generation.
//! - [`config`] — environment-driven configuration.
//! - [`types`] — shared id/timestamp aliases.

pub mod cleaner;
pub mod config;
pub mod naming;
pub mod prompt;
pub mod types;

pub use config::{AppConfig, ConfigError};
