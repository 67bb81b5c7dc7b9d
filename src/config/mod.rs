//! # HybridRow Configuration Module
//!
//! This module centralizes the format constants used by the layout compiler and
//! the row buffer engine. Constants are grouped by functional area and the
//! relationships between them are enforced through compile-time assertions.
//!
//! ## Why Centralization?
//!
//! The byte widths of the row header, the schema id and the typed collection
//! count prefix are used by both the writer and the reader paths. Keeping them in
//! one place prevents the two paths from drifting apart.
//!
//! ## Module Organization
//!
//! - [`constants`]: All numeric configuration values with dependency documentation

pub mod constants;
pub use constants::*;
