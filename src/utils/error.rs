use thiserror::Error;

#[derive(Error, Debug)]
pub enum OscError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Catalog entry error: {message}")]
    EntryError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Archive error: {message}")]
    ArchiveError { message: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

pub type Result<T> = std::result::Result<T, OscError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Io,
    Data,
    Config,
    Archive,
}

impl OscError {
    pub fn entry<S: Into<String>>(message: S) -> Self {
        OscError::EntryError {
            message: message.into(),
        }
    }

    pub fn archive<S: Into<String>>(message: S) -> Self {
        OscError::ArchiveError {
            message: message.into(),
        }
    }

    pub fn processing<S: Into<String>>(message: S) -> Self {
        OscError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            OscError::HttpError(_) => ErrorCategory::Network,
            OscError::IoError(_) => ErrorCategory::Io,
            OscError::SerializationError(_)
            | OscError::CsvError(_)
            | OscError::EntryError { .. }
            | OscError::ValidationError { .. }
            | OscError::ProcessingError { .. } => ErrorCategory::Data,
            OscError::ConfigError { .. }
            | OscError::MissingConfigError { .. }
            | OscError::InvalidConfigValueError { .. } => ErrorCategory::Config,
            OscError::ArchiveError { .. } => ErrorCategory::Archive,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // Network failures are usually transient
            OscError::HttpError(_) => ErrorSeverity::Medium,
            OscError::SerializationError(_)
            | OscError::CsvError(_)
            | OscError::EntryError { .. }
            | OscError::ValidationError { .. }
            | OscError::ArchiveError { .. }
            | OscError::ProcessingError { .. } => ErrorSeverity::High,
            OscError::IoError(_)
            | OscError::ConfigError { .. }
            | OscError::MissingConfigError { .. }
            | OscError::InvalidConfigValueError { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            OscError::HttpError(_) => {
                "Check network connectivity and that the target URL is reachable, then retry"
                    .to_string()
            }
            OscError::IoError(_) => {
                "Check that the path exists and the process has permission to access it"
                    .to_string()
            }
            OscError::SerializationError(_) => {
                "Check that the file contains well-formed JSON".to_string()
            }
            OscError::CsvError(_) => "Check the report output path is writable".to_string(),
            OscError::ConfigError { .. } => {
                "Review the configuration file against the documented format".to_string()
            }
            OscError::MissingConfigError { field } => {
                format!("Provide a value for '{}'", field)
            }
            OscError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value supplied for '{}'", field)
            }
            OscError::EntryError { .. } => {
                "Check the catalog entry fields and the target catalog layout".to_string()
            }
            OscError::ValidationError { .. } => {
                "Fix the reported issues in the catalog files and re-run".to_string()
            }
            OscError::ArchiveError { .. } => {
                "Check that the target is an uncompressed zip archive and the server supports range requests"
                    .to_string()
            }
            OscError::ProcessingError { .. } => {
                "Re-run with --verbose to see which step failed".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            OscError::HttpError(e) => format!("A network request failed: {}", e),
            OscError::IoError(e) => format!("A file operation failed: {}", e),
            OscError::SerializationError(e) => format!("Could not parse JSON: {}", e),
            OscError::CsvError(e) => format!("Could not write the CSV report: {}", e),
            OscError::ConfigError { message } => format!("Configuration problem: {}", message),
            OscError::MissingConfigError { field } => {
                format!("The configuration field '{}' is required", field)
            }
            OscError::InvalidConfigValueError {
                field,
                value,
                reason,
            } => format!("'{}' is not valid for {}: {}", value, field, reason),
            OscError::EntryError { message } => format!("Catalog entry problem: {}", message),
            OscError::ValidationError { message } => format!("Validation failed: {}", message),
            OscError::ArchiveError { message } => format!("Archive problem: {}", message),
            OscError::ProcessingError { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_critical() {
        let err = OscError::MissingConfigError {
            field: "catalog_root".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(err.recovery_suggestion().contains("catalog_root"));
    }

    #[test]
    fn test_archive_error_helper() {
        let err = OscError::archive("end of central directory not found");
        assert_eq!(err.category(), ErrorCategory::Archive);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.to_string().contains("central directory"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: OscError = io.into();
        assert_eq!(err.category(), ErrorCategory::Io);
    }
}
