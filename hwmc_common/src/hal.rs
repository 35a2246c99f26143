//! Hardware abstraction layer types and driver contract.
//!
//! This module contains the antenna driver trait, the raw frame and
//! digital-line types it exchanges, and the channel layout constants.

pub mod consts;
pub mod driver;
pub mod types;
