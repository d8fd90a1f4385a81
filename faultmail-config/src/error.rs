//! Error types for configuration loading, validation and credential lookup

use std::path::PathBuf;
use thiserror::Error;
use validator::ValidationErrors;

/// Unified configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File not found error.
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// A required parameter key is absent from the provider.
    #[error("Missing parameter: {0}")]
    MissingKey(String),

    /// The provider could not hand out the requested parameters.
    #[error("Parameter provider error: {0}")]
    Provider(String),

    /// Configuration validation error.
    #[error("Invalid configuration:\n{}", format_validation_errors(.0))]
    Validation(#[source] ValidationErrors),

    /// Figment parsing error.
    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] figment::Error),

    /// Parameters present but not shaped like a mailer configuration.
    #[error("Malformed mailer parameters: {0}")]
    Malformed(#[from] serde_yaml::Error),

    /// I/O error.
    #[error("Configuration I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_validation_errors(errors: &ValidationErrors) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    for (field, errors) in errors.field_errors() {
        let _ = writeln!(output, "Field '{}':", field);
        for error in errors {
            let message = match &error.message {
                Some(msg) => msg.to_string(),
                None => error.code.to_string(),
            };
            let _ = writeln!(output, "  - {}", message);
        }
    }
    for (field, kind) in errors.errors() {
        if let validator::ValidationErrorsKind::Struct(nested) = kind {
            let _ = write!(output, "In '{}':\n{}", field, format_validation_errors(nested));
        }
    }
    output
}

impl From<ValidationErrors> for ConfigError {
    fn from(errors: ValidationErrors) -> Self {
        ConfigError::Validation(errors)
    }
}

/// Mail transport credentials could not be assembled.
#[derive(Debug, Error)]
pub enum CredentialsError {
    /// One or more required variables are unset or empty.
    #[error("Missing mail credentials: {}", .variables.join(", "))]
    Missing { variables: Vec<&'static str> },

    /// The env file exists but could not be parsed.
    #[error("Failed to read env file {path}: {message}")]
    EnvFile { path: PathBuf, message: String },
}
