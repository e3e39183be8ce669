//! # Phyto Common Library
//!
//! Shared code for Phyto services:
//! - Error type
//! - Root folder resolution
//! - TOML bootstrap configuration
//! - HTTP user-agent string

pub mod config;
pub mod error;

pub use error::{Error, Result};
