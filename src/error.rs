//! Error types for docshift.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docshift operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Hint shown to users when the converter cannot be found.
pub const INSTALL_HINT: &str =
    "Install LibreOffice from https://www.libreoffice.org/download/ or point DOCSHIFT_SOFFICE at the soffice binary";

/// Error types that can occur while converting and publishing documents.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested output format is not legal for the input extension.
    #[error("Cannot convert {extension} to {specifier}")]
    UnsupportedFormat {
        /// Extension of the input file (may be empty)
        extension: String,
        /// Requested output specifier
        specifier: String,
    },

    /// The specifier text could not be parsed.
    #[error("Invalid format specifier: {0}")]
    InvalidSpecifier(String),

    /// The external converter could not be started.
    #[error("Converter unavailable: {0}")]
    ConverterUnavailable(String),

    /// The converter ran but reported failure or produced nothing.
    #[error("Conversion failed: {0}")]
    ConverterError(String),

    /// Reading the input or writing an output failed.
    #[error("File error on {}: {source}", path.display())]
    Filesystem {
        /// Path being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The clipboard did not accept the file references.
    #[error("Clipboard error: {0}")]
    Clipboard(String),

    /// The file manager could not be opened.
    #[error("Reveal error: {0}")]
    Reveal(String),

    /// The session is already converting the given input.
    #[error("A conversion is already in progress for {}", .0.display())]
    Busy(PathBuf),

    /// The availability probe reported the converter as missing.
    #[error("LibreOffice is not installed")]
    Blocked,
}

impl Error {
    /// Build a filesystem error for `path`.
    pub fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Whether the error is a rejected input/format combination.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedFormat { .. } | Error::InvalidSpecifier(_)
        )
    }

    /// Whether the error means the converter is missing.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::ConverterUnavailable(_) | Error::Blocked)
    }

    /// A remediation hint for the user, if one applies.
    pub fn remediation(&self) -> Option<&'static str> {
        if self.is_unavailable() {
            Some(INSTALL_HINT)
        } else {
            None
        }
    }
}
