use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] marketfeed_core::ValidationError),

    #[error(transparent)]
    Config(#[from] marketfeed_core::ConfigError),

    #[error(transparent)]
    Core(#[from] marketfeed_core::CoreError),

    #[error("strict mode failed: {generated_count} synthetic value(s) served")]
    StrictModeViolation { generated_count: usize },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Config(_) => 3,
            Self::Core(_) => 3,
            Self::Serialization(_) => 4,
            Self::StrictModeViolation { .. } => 5,
            Self::Io(_) => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketfeed_core::{ConfigError, ValidationError};

    #[test]
    fn exit_codes_follow_error_category() {
        assert_eq!(CliError::from(ValidationError::EmptySymbol).exit_code(), 2);
        assert_eq!(
            CliError::from(ConfigError::ZeroDuration {
                field: "provider_timeout"
            })
            .exit_code(),
            3
        );
        assert_eq!(
            CliError::StrictModeViolation { generated_count: 1 }.exit_code(),
            5
        );
    }
}
