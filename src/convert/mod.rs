//! Converter gateway: one external conversion per call.
//!
//! The external tool sits behind the narrow [`DocumentConverter`] trait
//! (bytes in, bytes out). [`ConverterGateway`] adds the filesystem side:
//! it reads the whole input, hands it to the converter and writes the
//! whole result next to the input, overwriting whatever is there.
//!
//! # Example
//!
//! ```no_run
//! use docshift::catalog::Extension;
//! use docshift::convert::{ConverterGateway, SofficeConverter};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! fn main() -> docshift::Result<()> {
//!     let gateway = ConverterGateway::new(Arc::new(SofficeConverter::new()));
//!     let pdf = Extension::new("pdf").unwrap();
//!     let output = gateway.convert_one(Path::new("/home/me/report.docx"), &pdf)?;
//!     println!("{}", output.display());
//!     Ok(())
//! }
//! ```

mod soffice;

pub use soffice::{SofficeConverter, SofficeOptions};

use crate::catalog::Extension;
use crate::error::{Error, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Trait for whole-document converters.
///
/// Implementations receive the complete input and return the complete
/// output. An empty output is treated as a failure by the gateway.
pub trait DocumentConverter: Send + Sync {
    /// Get the name of this converter.
    fn name(&self) -> &str;

    /// Convert `input`, a `source` document, into `target`.
    fn convert_bytes(&self, input: &[u8], source: &Extension, target: &Extension)
        -> Result<Vec<u8>>;
}

/// Output path for `input` converted to `target`.
///
/// The single trailing extension is replaced; a path without one gets
/// `target` appended.
pub fn derive_output_path(input: &Path, target: &Extension) -> PathBuf {
    input.with_extension(target.bare())
}

/// File-level wrapper around a [`DocumentConverter`].
#[derive(Clone)]
pub struct ConverterGateway {
    converter: Arc<dyn DocumentConverter>,
}

impl ConverterGateway {
    /// Create a gateway over `converter`.
    pub fn new(converter: Arc<dyn DocumentConverter>) -> Self {
        Self { converter }
    }

    /// The wrapped converter.
    pub fn converter(&self) -> &dyn DocumentConverter {
        self.converter.as_ref()
    }

    /// Convert the file at `input` to `target` and return the written path.
    pub fn convert_one(&self, input: &Path, target: &Extension) -> Result<PathBuf> {
        let source = Extension::from_path(input).ok_or_else(|| Error::UnsupportedFormat {
            extension: String::new(),
            specifier: target.to_string(),
        })?;

        let data = fs::read(input).map_err(|e| Error::filesystem(input, e))?;
        let converted = self.converter.convert_bytes(&data, &source, target)?;
        if converted.is_empty() {
            return Err(Error::ConverterError(format!(
                "{} returned no output for {}",
                self.converter.name(),
                target
            )));
        }

        let output = derive_output_path(input, target);
        fs::write(&output, &converted).map_err(|e| Error::filesystem(&output, e))?;
        info!(
            "{} -> {} ({} bytes)",
            input.display(),
            output.display(),
            converted.len()
        );
        Ok(output)
    }
}

impl std::fmt::Debug for ConverterGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterGateway")
            .field("converter", &self.converter.name())
            .finish()
    }
}
