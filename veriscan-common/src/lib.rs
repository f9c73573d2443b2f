//! Shared foundation for VeriScan services
//!
//! Holds the common error type, configuration resolution, and credential
//! hashing helpers used by the API service.

pub mod config;
pub mod credentials;
pub mod error;

pub use error::{Error, Result};
