//! Error types for geogate

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeogateError {
    // CRS errors
    #[error("Missing CRS for {subject}")]
    MissingCrs { subject: String },

    #[error("CRS mismatch: reference has {reference_crs}, query has {query_crs}")]
    CrsMismatch {
        reference_crs: String,
        query_crs: String,
    },

    #[error("Invalid CRS '{value}': {reason}")]
    InvalidCrs { value: String, reason: String },

    // Geometry errors
    #[error("Invalid geometry at feature {feature_id}: {reason}")]
    InvalidGeometry { feature_id: String, reason: String },

    // Index and classification errors
    #[error("Cannot build a spatial index from an empty reference set")]
    EmptyReferenceSet,

    #[error("Invalid threshold {value}: must be a finite, non-negative distance")]
    InvalidThreshold { value: f64 },

    // Stratification errors
    #[error("Label column '{column}' not found in {split} split")]
    LabelColumnMissing { column: String, split: String },

    // Format errors
    #[error("Unsupported format for {path}")]
    UnsupportedFormat { path: String },

    #[error("{format} error: {message}")]
    FormatError { format: String, message: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, GeogateError>;
