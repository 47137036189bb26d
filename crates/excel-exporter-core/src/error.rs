//! Error types for excel-exporter-core

use std::path::PathBuf;

use thiserror::Error;

/// Problems found while resolving command-line arguments.
///
/// These are collected rather than returned early, so a single pass can
/// report every problem at once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    /// A flag was given without the value that must follow it
    #[error("Error: Missing value after {flag}.")]
    MissingArgumentValue { flag: String },

    /// A value is not one of the accepted choices
    #[error("Error: Invalid {option} '{value}'. Allowed values: {allowed}.")]
    InvalidOptionValue {
        option: &'static str,
        value: String,
        allowed: String,
    },

    /// Nothing at all was passed on the command line
    #[error("Error: No valid arguments provided. Use --help to see usage.")]
    NoArgumentsProvided,

    /// No input workbook path was given
    #[error("Error: No input file specified. Use --help to see usage.")]
    MissingRequiredInput,
}

/// Errors from building a command registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Command key already registered: {0}")]
    DuplicateKey(String),

    #[error("Alias '{alias}' of command '{key}' is already bound to '{existing}'")]
    DuplicateAlias {
        alias: String,
        key: String,
        existing: String,
    },
}

/// Result type for automation calls
pub type AutomationResult<T> = std::result::Result<T, AutomationError>;

/// Failures reported by an [`ExcelAutomation`](crate::automation::ExcelAutomation) host
#[derive(Debug, Error)]
pub enum AutomationError {
    /// The automation host reported a failure
    #[error("Automation error: {0}")]
    Host(String),

    /// Local IO while writing exported artifacts
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AutomationError {
    pub fn host<S: Into<String>>(msg: S) -> Self {
        AutomationError::Host(msg.into())
    }
}

/// Result type for export operations
pub type ExportResult<T> = std::result::Result<T, ExportError>;

/// Errors that abort an export run
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Automation(#[from] AutomationError),

    /// The configuration handed to the exporter was not fully resolved
    #[error("Configuration is incomplete: missing {0}")]
    IncompleteConfiguration(&'static str),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
