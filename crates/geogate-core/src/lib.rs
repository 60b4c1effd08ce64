//! geogate Core - Domain models, configuration, readers and tabular checks
//!
//! This crate contains the CRS descriptor, the vector layer model handed over by
//! the format readers, the layered configuration, and the non-spatial dataset
//! checks (class stratification and CRS consistency).

pub mod checks;
pub mod config;
pub mod error;
pub mod formats;
pub mod models;

pub use error::{GeogateError, Result};
