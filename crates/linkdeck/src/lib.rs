//! `linkdeck` - link management console client for Insteon modems and devices.
//!
//! Wraps the I/O-free `linkdeck-core` pipeline with an HTTP boundary, a
//! single-threaded console event loop and an HTML renderer for the rows.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

/// HTTP boundary of the console.
pub mod api;
/// Client configuration (`linkdeck.toml`).
pub mod config;
/// Console event loop and request dispatch.
pub mod console;
/// HTML rendering of link rows.
pub mod html;

pub use api::{ApiError, ApiResponse, HttpApi, LinkApi};
pub use config::{ClientConfig, ConfigError, ServerConfig};
pub use console::{Console, ConsoleCommand, ConsoleEvent};
