use thiserror::Error;

/// Validation failures raised while constructing domain values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("symbol is {len} characters long, maximum is {max}")]
    SymbolTooLong { len: usize, max: usize },

    #[error("symbol must start with a letter, found '{ch}'")]
    SymbolInvalidStart { ch: char },

    #[error("symbol contains invalid character '{ch}' at position {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("'{value}' is not a valid calendar date (expected YYYY-MM-DD)")]
    InvalidDate { value: String },

    #[error("{field} must be a finite positive number, got {value}")]
    InvalidPrice { field: &'static str, value: f64 },

    #[error("shares outstanding must be a finite positive number, got {value}")]
    InvalidShares { value: f64 },

    #[error("date range is reversed: {start} is after {end}")]
    ReversedDateRange { start: String, end: String },
}
