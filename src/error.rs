//! Unified error handling for the trajectory-simplifier library.
//!
//! The simplification core resolves numeric edge cases by policy, so the
//! only errors it raises are precondition failures. The I/O boundary
//! (GeoJSON files, config files) adds parse and file errors.

use std::fmt;

/// Unified error type for trajectory-simplifier operations.
#[derive(Debug, Clone)]
pub enum SimplifyError {
    /// Input is structurally malformed (e.g. a non-Point feature)
    InvalidInput { message: String },
    /// A point has non-finite or out-of-range coordinates
    InvalidCoordinates { position: usize, message: String },
    /// Configuration error (negative or non-finite thresholds)
    Config { message: String },
    /// JSON / GeoJSON / CSV (de)serialization failed
    Parse { message: String },
    /// Reading or writing a file failed
    Io { message: String },
}

impl fmt::Display for SimplifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimplifyError::InvalidInput { message } => {
                write!(f, "Invalid input: {}", message)
            }
            SimplifyError::InvalidCoordinates { position, message } => {
                write!(
                    f,
                    "Point at position {} has invalid coordinates: {}",
                    position, message
                )
            }
            SimplifyError::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            SimplifyError::Parse { message } => {
                write!(f, "Parse error: {}", message)
            }
            SimplifyError::Io { message } => {
                write!(f, "I/O error: {}", message)
            }
        }
    }
}

impl std::error::Error for SimplifyError {}

impl From<serde_json::Error> for SimplifyError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            SimplifyError::Io {
                message: err.to_string(),
            }
        } else {
            SimplifyError::Parse {
                message: err.to_string(),
            }
        }
    }
}

impl From<std::io::Error> for SimplifyError {
    fn from(err: std::io::Error) -> Self {
        SimplifyError::Io {
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for SimplifyError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            SimplifyError::Io {
                message: err.to_string(),
            }
        } else {
            SimplifyError::Parse {
                message: err.to_string(),
            }
        }
    }
}

/// Result type alias for trajectory-simplifier operations.
pub type Result<T> = std::result::Result<T, SimplifyError>;

/// Extension trait for converting Option to SimplifyError.
pub trait OptionExt<T> {
    /// Convert Option to Result with an invalid input error.
    fn ok_or_invalid_input(self, message: &str) -> Result<T>;

    /// Convert Option to Result with a configuration error.
    fn ok_or_config(self, message: &str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_invalid_input(self, message: &str) -> Result<T> {
        self.ok_or_else(|| SimplifyError::InvalidInput {
            message: message.to_string(),
        })
    }

    fn ok_or_config(self, message: &str) -> Result<T> {
        self.ok_or_else(|| SimplifyError::Config {
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimplifyError::InvalidCoordinates {
            position: 7,
            message: "latitude 91 out of range".to_string(),
        };
        assert!(err.to_string().contains("position 7"));
        assert!(err.to_string().contains("latitude 91"));
    }

    #[test]
    fn test_option_ext() {
        let none: Option<i32> = None;
        let result = none.ok_or_invalid_input("missing geometry");
        assert!(matches!(result, Err(SimplifyError::InvalidInput { .. })));

        let none: Option<i32> = None;
        assert!(matches!(
            none.ok_or_config("bad"),
            Err(SimplifyError::Config { .. })
        ));
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
        let err: SimplifyError = err.into();
        assert!(matches!(err, SimplifyError::Parse { .. }));
    }

    #[test]
    fn test_from_csv_error() {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader("a,b\nc".as_bytes());
        let err = reader.records().find_map(|r| r.err()).unwrap();
        let err: SimplifyError = err.into();
        assert!(matches!(err, SimplifyError::Parse { .. }));
    }
}
