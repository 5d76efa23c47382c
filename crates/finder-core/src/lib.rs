//! Core types and trait definitions for the Creator Finder pipeline.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod error;
pub mod extract;
pub mod model;
pub mod platform;
pub mod resolve;
pub mod store;
pub mod token;

pub use error::{Error, Result};
