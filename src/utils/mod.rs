//! Utility functions shared across polyframe
//!
//! Currently only the logging helpers used by discovery and materialization.

pub mod logging;
