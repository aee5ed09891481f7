//! Utility modules
//!
//! This module contains common utilities used throughout the application,
//! including error handling, logging setup, date helpers and input validation.

pub mod errors;
pub mod logging;
pub mod helpers;
pub mod validation;

pub use errors::{EventHubError, Result};
