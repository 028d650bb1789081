//! # docshift
//!
//! Office document conversion pipeline for Rust.
//!
//! This library converts one office document into one or more target
//! formats with LibreOffice, then hands the results to the desktop:
//! every output goes on the clipboard as a file reference and the first
//! one is revealed in the file manager.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docshift::{Docshift, FormatSpecifier};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Docshift::new().build();
//!
//!     // Produce a PDF and a legacy .doc from a .docx, in that order
//!     let spec: FormatSpecifier = ".pdf+.doc".parse()?;
//!     let result = session.convert("/home/me/report.docx", spec)?;
//!
//!     for path in result.output_paths() {
//!         println!("{}", path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Format catalog**: legal outputs per input extension, default first
//! - **Composite outputs**: several formats from one request, in order
//! - **Partial results**: a failed batch reports what was already written
//! - **Availability probe**: LibreOffice is looked up before any file is touched
//! - **Desktop hand-off**: clipboard and file-manager reveal, independently failable
//! - **Async**: `async` feature runs a session on tokio's blocking pool

pub mod catalog;
pub mod convert;
pub mod error;
pub mod orchestrator;
pub mod probe;
pub mod publish;
pub mod selection;
pub mod session;

// Re-export commonly used types
pub use catalog::{Extension, FormatCatalog, FormatSpecifier};
pub use convert::{
    derive_output_path, ConverterGateway, DocumentConverter, SofficeConverter, SofficeOptions,
};
pub use error::{Error, Result, INSTALL_HINT};
pub use orchestrator::{ConversionFailure, ConversionJob, ConversionResult, Orchestrator};
pub use probe::{AvailabilityProbe, ProbeOptions, SofficeProbe};
pub use publish::{hand_off, HandOff, ResultPublisher, ScriptRunner, SystemPublisher};
pub use selection::{resolve_input, FilePicker};
pub use session::{Phase, Reservation, Session};

use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Convert a file with default settings.
///
/// # Example
///
/// ```no_run
/// let result = docshift::convert_file("/home/me/budget.xlsx", ".pdf".parse().unwrap()).unwrap();
/// assert_eq!(result.primary().extension().unwrap(), "pdf");
/// ```
pub fn convert_file<P: AsRef<Path>>(
    path: P,
    specifier: FormatSpecifier,
) -> std::result::Result<ConversionResult, ConversionFailure> {
    Docshift::new().build().convert(path.as_ref(), specifier)
}

/// Check whether LibreOffice can be found with default settings.
pub fn is_converter_available() -> bool {
    SofficeProbe::new().is_available()
}

/// Builder for a conversion [`Session`].
///
/// # Example
///
/// ```no_run
/// use docshift::Docshift;
///
/// let session = Docshift::new()
///     .with_binary("/opt/libreoffice/program/soffice")
///     .with_profile_dir("/tmp/docshift-profile")
///     .build();
/// let result = session.convert("/home/me/slides.pptx", ".pdf".parse()?)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Docshift {
    probe_options: ProbeOptions,
    soffice_options: SofficeOptions,
    catalog: FormatCatalog,
}

impl Docshift {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            probe_options: ProbeOptions::default(),
            soffice_options: SofficeOptions::default(),
            catalog: FormatCatalog::default(),
        }
    }

    /// Use this LibreOffice binary instead of searching for one.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.probe_options = self.probe_options.with_binary(binary);
        self
    }

    /// Set probe options.
    pub fn with_probe_options(mut self, options: ProbeOptions) -> Self {
        self.probe_options = options;
        self
    }

    /// Use a dedicated LibreOffice user profile.
    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.soffice_options = self.soffice_options.with_profile_dir(dir);
        self
    }

    /// Set LibreOffice run options.
    pub fn with_soffice_options(mut self, options: SofficeOptions) -> Self {
        self.soffice_options = options;
        self
    }

    /// Use a custom catalog.
    pub fn with_catalog(mut self, catalog: FormatCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// The probe this builder's sessions gate on.
    pub fn probe(&self) -> SofficeProbe {
        SofficeProbe::with_options(self.probe_options.clone())
    }

    /// Build an idle session.
    pub fn build(self) -> Session {
        let probe = self.probe();
        let converter = SofficeConverter::with_probe(probe.clone())
            .with_options(self.soffice_options);
        let orchestrator = Orchestrator::with_catalog(
            self.catalog,
            ConverterGateway::new(Arc::new(converter)),
        );
        Session::new(Arc::new(probe), orchestrator)
    }
}

impl Default for Docshift {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_binary_override() {
        let builder = Docshift::new().with_binary("/opt/lo/soffice");
        assert_eq!(
            builder.probe().options().binary,
            Some(PathBuf::from("/opt/lo/soffice"))
        );
    }

    #[test]
    fn test_builder_profile_dir() {
        let builder = Docshift::new().with_profile_dir("/tmp/profile");
        assert_eq!(
            builder.soffice_options.profile_dir,
            Some(PathBuf::from("/tmp/profile"))
        );
    }

    #[test]
    fn test_build_starts_idle() {
        let session = Docshift::default().build();
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_missing_binary_blocks_session() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.doc");
        std::fs::write(&input, b"doc").unwrap();

        let session = Docshift::new()
            .with_binary(dir.path().join("no-soffice"))
            .build();
        let failure = session
            .convert(&input, ".pdf".parse().unwrap())
            .unwrap_err();

        assert!(matches!(failure.error, Error::Blocked));
        assert!(!failure.is_partial());
        assert!(!dir.path().join("report.pdf").exists());
        assert_eq!(session.phase(), Phase::Blocked);
    }
}
