//! # QDA Common Library
//!
//! Shared code for the QDA report tools including:
//! - Project database models and read-only queries
//! - Code tree reconstruction from the flat category/code tables
//! - Code frequency aggregation and inter-coder agreement statistics
//! - Plain-text report rendering
//! - Configuration loading

pub mod analysis;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod model;
pub mod report;

pub use error::{Error, Result};
