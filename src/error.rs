// Error types shared across the search service

use thiserror::Error;

// Rejections raised before a search (or a write) reaches the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Guest count must be at least 1, got {0}")]
    InvalidGuestCount(i64),

    #[error("End date {end} must be after start date {start}")]
    InvalidDateRange { start: String, end: String },

    #[error("Price must not be negative: {0}")]
    NegativePrice(f64),

    #[error("Max price {max} is lower than min price {min}")]
    InvalidPriceRange { min: f64, max: f64 },

    #[error("Invalid guest capacity: min {min}, max {max}")]
    InvalidCapacity { min: i64, max: i64 },

    #[error("Invalid pricing type: {0}")]
    InvalidPricingMode(String),

    #[error("Invalid accommodation id: {0}")]
    InvalidId(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Accommodation not found: {0}")]
    NotFound(String),

    #[error("Accommodation already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

// Failures of the external booking authority
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Availability service unavailable: {0}")]
    Unavailable(String),

    #[error("Availability request timeout after {0}ms")]
    Timeout(u64),

    #[error("Availability service error: {status_code} - {message}")]
    Rejected { status_code: u16, message: String },

    #[error("Availability response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Availability oracle failed: {0}")]
    OracleUnavailable(#[from] OracleError),

    #[error("Availability oracle returned malformed response: {0}")]
    OracleMalformedResponse(String),

    #[error("Availability oracle did not answer within {0}ms")]
    OracleTimeout(u64),
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        SearchError::StorageUnavailable(err.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

// Rating feed failures; the feed consumer logs these and moves on
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RatingError {
    #[error("Malformed rating payload: {0}")]
    Malformed(String),

    #[error(transparent)]
    InvalidId(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// Errors from the host-facing write side
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccommodationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
