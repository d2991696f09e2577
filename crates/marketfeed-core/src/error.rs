use thiserror::Error;

/// Validation errors exposed by `marketfeed-core` domain types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter or digit: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("country code must be a 2-letter ASCII code: '{value}'")]
    InvalidCountry { value: String },
    #[error("headline cannot be empty")]
    EmptyHeadline,
}

/// Errors raised while reading feed configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {name} must be a whole number of {unit}: '{value}'")]
    InvalidNumber {
        name: &'static str,
        unit: &'static str,
        value: String,
    },
    #[error("environment variable {name} must be a boolean (true/false/1/0): '{value}'")]
    InvalidFlag { name: &'static str, value: String },
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
    #[error("{field} must not exceed {max_secs} seconds")]
    DurationTooLarge { field: &'static str, max_secs: u64 },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
