//! Error types for the CSV reader pipeline.

use std::path::PathBuf;

/// Result type alias for CSV reader operations.
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Errors raised by the CSV reader pipeline.
///
/// Every variant is terminal for the action that triggered it. Dismissing the
/// file picker is not an error and never shows up here.
#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    /// The chosen file could not be opened, read, or decoded as text.
    #[error("cannot read {path:?}: {message}")]
    FileAccess {
        /// The file that failed, if one was chosen.
        path: Option<PathBuf>,
        /// What went wrong.
        message: String,
    },

    /// The content is not valid delimited text.
    #[error("cannot parse csv: {message}")]
    Parse {
        /// Description reported by the parser.
        message: String,
    },

    /// A column toggle named a field that is not in the catalog.
    #[error("column '{name}' not found")]
    UnknownField {
        /// The requested field name.
        name: String,
    },

    /// A load was finished without being started.
    #[error("no file load in progress")]
    NoLoadInProgress,

    /// The settings file could not be read or written.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

impl ViewerError {
    pub(crate) fn file_access(path: Option<PathBuf>, err: impl ToString) -> Self {
        ViewerError::FileAccess {
            path,
            message: err.to_string(),
        }
    }

    pub(crate) fn parse(err: impl ToString) -> Self {
        ViewerError::Parse {
            message: err.to_string(),
        }
    }

    /// The single line shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            ViewerError::FileAccess { .. } => "Cant read the file.".to_string(),
            ViewerError::Parse { .. } => {
                "There was a problem processing the csv file.".to_string()
            }
            ViewerError::UnknownField { name } => format!("Unknown column: {name}"),
            ViewerError::NoLoadInProgress => "No file is being loaded.".to_string(),
            ViewerError::Config { .. } => "The settings file could not be used.".to_string(),
        }
    }
}

impl From<csv::Error> for ViewerError {
    fn from(err: csv::Error) -> Self {
        ViewerError::parse(err)
    }
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ViewerError;

    #[test]
    fn access_and_parse_errors_have_distinct_messages() {
        let access = ViewerError::file_access(None, "denied");
        let parse = ViewerError::parse("bad quote");
        assert_eq!(access.user_message(), "Cant read the file.");
        assert_eq!(
            parse.user_message(),
            "There was a problem processing the csv file."
        );
        assert_ne!(access.user_message(), parse.user_message());
    }
}
