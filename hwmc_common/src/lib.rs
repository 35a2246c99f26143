//! Common library for the antenna monitor & control fabric.
//!
//! This crate provides shared constants, types and configuration loading
//! utilities for all workspace crates.
//!
//! # Module Structure
//!
//! - [`antenna`] - Antenna identifiers
//! - [`command`] - Operator command lines and target selectors
//! - [`config`] - Configuration loading traits and types
//! - [`hal`] - Antenna driver contract and hardware frame types
//! - [`monitor`] - Monitor-point records and MJD timestamps
//! - [`shutdown`] - Cancellation token
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use hwmc_common::prelude::*;
//! ```

pub mod antenna;
pub mod command;
pub mod config;
pub mod consts;
pub mod hal;
pub mod monitor;
pub mod prelude;
pub mod shutdown;
