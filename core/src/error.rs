//! Error types for schemasheets operations

use thiserror::Error;

/// Broad class of a failure, used by callers to decide how to report it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Header or table configuration problems, raised before any row is read
    Configuration,
    /// A data row could not be mapped onto schema elements
    RowInterpretation,
    /// A cell value could not be applied
    Value,
    /// Reading or writing files failed
    Io,
}

/// Main error type for schemasheets operations
#[derive(Error, Debug)]
pub enum SchemaSheetsError {
    /// Ambiguous or unrecognized column mapping
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
        /// Column the problem was found in
        column: Option<String>,
    },

    /// Field name unknown to the metamodel
    #[error("Unknown metamodel field '{field}'")]
    UnknownField {
        /// Field that was looked up
        field: String,
    },

    /// A row matched no focal element, or an invalid combination of them
    #[error("{message}")]
    RowInterpretation {
        /// Error message
        message: String,
    },

    /// Attempt to overwrite a write-once field
    #[error("Cannot reset value for {field}, was {old}, now {new}")]
    ConflictingValue {
        /// Field being written
        field: String,
        /// Value already held
        old: String,
        /// Value that was rejected
        new: String,
    },

    /// Cardinality token that could not be interpreted
    #[error("Cannot interpret cardinality '{token}': {reason}")]
    Cardinality {
        /// Token from the sheet
        token: String,
        /// Why it was rejected
        reason: String,
    },

    /// Cell value that cannot be applied to its target
    #[error("Invalid value: {message}")]
    Value {
        /// Error message
        message: String,
    },

    /// Failure inside a data row, with the row for diagnosis
    #[error("Error in line {line}, row={row}\n{source}")]
    Row {
        /// 1-based physical line number
        line: usize,
        /// Raw row content
        row: String,
        /// Underlying cause
        #[source]
        source: Box<SchemaSheetsError>,
    },

    /// Input that is not well formed
    #[error("Failed to parse: {message}")]
    Parse {
        /// Error message
        message: String,
        /// Location if available
        location: Option<String>,
    },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for schemasheets operations
pub type Result<T> = std::result::Result<T, SchemaSheetsError>;

impl SchemaSheetsError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            column: None,
        }
    }

    /// Create a configuration error for a column
    #[must_use]
    pub fn config_at(message: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            column: Some(column.into()),
        }
    }

    /// Create an unknown field error
    #[must_use]
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Create a row interpretation error
    #[must_use]
    pub fn row_interpretation(message: impl Into<String>) -> Self {
        Self::RowInterpretation {
            message: message.into(),
        }
    }

    /// Create a conflicting value error
    #[must_use]
    pub fn conflict(
        field: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self::ConflictingValue {
            field: field.into(),
            old: old.into(),
            new: new.into(),
        }
    }

    /// Create a cardinality error
    #[must_use]
    pub fn cardinality(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Cardinality {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Create a value error
    #[must_use]
    pub fn value(message: impl Into<String>) -> Self {
        Self::Value {
            message: message.into(),
        }
    }

    /// Wrap an error raised while processing a data row
    #[must_use]
    pub fn in_row(line: usize, row: impl Into<String>, source: Self) -> Self {
        Self::Row {
            line,
            row: row.into(),
            source: Box::new(source),
        }
    }

    /// Create a parse error
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            location: None,
        }
    }

    /// Create a parse error with location
    #[must_use]
    pub fn parse_at(message: impl Into<String>, location: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            location: Some(location.into()),
        }
    }

    /// Create an IO error from a message
    #[must_use]
    pub fn io_error(message: impl Into<String>) -> Self {
        Self::Io(std::io::Error::other(message.into()))
    }

    /// Create a serialization error
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Category of this error; a row wrapper reports the category of its cause
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } | Self::UnknownField { .. } => ErrorCategory::Configuration,
            Self::RowInterpretation { .. } => ErrorCategory::RowInterpretation,
            Self::ConflictingValue { .. } | Self::Cardinality { .. } | Self::Value { .. } => {
                ErrorCategory::Value
            }
            Self::Row { source, .. } => source.category(),
            Self::Parse { .. } | Self::Io(_) | Self::Serialization(_) => ErrorCategory::Io,
        }
    }

    /// The innermost error, looking through row wrappers
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Row { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for SchemaSheetsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for SchemaSheetsError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<regex::Error> for SchemaSheetsError {
    fn from(err: regex::Error) -> Self {
        Self::Config {
            message: format!("invalid regular expression: {err}"),
            column: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_display() {
        let err = SchemaSheetsError::conflict("range", "string", "decimal");
        assert_eq!(
            err.to_string(),
            "Cannot reset value for range, was string, now decimal"
        );
    }

    #[test]
    fn test_row_wrapper_keeps_cause() {
        let cause = SchemaSheetsError::row_interpretation("Could not find a focal element");
        let err = SchemaSheetsError::in_row(4, "{class: Person}", cause);
        let display = err.to_string();
        assert!(display.contains("line 4"));
        assert!(display.contains("{class: Person}"));
        assert!(display.contains("Could not find a focal element"));
        assert_eq!(err.category(), ErrorCategory::RowInterpretation);
        assert!(matches!(
            err.root_cause(),
            SchemaSheetsError::RowInterpretation { .. }
        ));
    }

    #[test]
    fn test_error_conversions() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        let err: SchemaSheetsError = yaml_err.into();
        assert!(matches!(err, SchemaSheetsError::Serialization(_)));

        let re_err = regex::Regex::new("(").unwrap_err();
        let err: SchemaSheetsError = re_err.into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
