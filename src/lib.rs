//! xray-offline library
//!
//! This crate provides the core functionality for the `xray-offline` binary.
//! Keep the crate root minimal: implementation and tests live in their modules.
//!
//! ## Overview
//!
//! - [`offline`] - Fetches the update list, downloads each category and zips it
//! - [`profile`] - Saves and loads the server connection profile
//! - [`config`] - Offline-update settings from flags or a TOML file
//! - [`cli`] - Command-line interface wiring the above together
//! - [`models`] - Update manifest and category types
//! - [`errors`] - Error types used throughout the application
//!
//! ## Example Usage
//!
//! ```no_run
//! use xray_offline::{config::OfflineUpdateConfig, errors::AppResult, offline};
//!
//! # async fn example() -> AppResult<()> {
//! let config = OfflineUpdateConfig::default();
//! let client = config.http_client()?;
//! let report = offline::run_offline_update(
//!     &client,
//!     "license-token",
//!     "https://updates.example.com/api/v1/updates",
//!     &config,
//! )
//! .await?;
//! println!("{} bundle(s) written", report.archives.len());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod offline;
pub mod profile;
pub mod ui;
pub mod utils;
