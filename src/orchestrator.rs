//! Conversion orchestration.
//!
//! A [`ConversionJob`] names one input file and one [`FormatSpecifier`].
//! The [`Orchestrator`] checks the pair against the catalog and then runs
//! one gateway call per target, strictly in order. The first failure stops
//! the batch; outputs written before it are kept on disk and reported in
//! the [`ConversionFailure`].

use crate::catalog::{Extension, FormatCatalog, FormatSpecifier};
use crate::convert::{ConverterGateway, DocumentConverter};
use crate::error::Error;
use log::{debug, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error as ThisError;

/// One user-triggered conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    input_path: PathBuf,
    specifier: FormatSpecifier,
}

impl ConversionJob {
    /// Create a job converting `input_path` to `specifier`.
    pub fn new(input_path: impl Into<PathBuf>, specifier: FormatSpecifier) -> Self {
        Self {
            input_path: input_path.into(),
            specifier,
        }
    }

    /// The file to convert.
    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    /// The requested output.
    pub fn specifier(&self) -> &FormatSpecifier {
        &self.specifier
    }
}

/// Files produced by a successful conversion, in production order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    output_paths: Vec<PathBuf>,
}

impl ConversionResult {
    /// Output paths in the order they were written.
    pub fn output_paths(&self) -> &[PathBuf] {
        &self.output_paths
    }

    /// The primary output (first target of the specifier).
    pub fn primary(&self) -> &Path {
        &self.output_paths[0]
    }

    /// Number of files produced.
    pub fn len(&self) -> usize {
        self.output_paths.len()
    }

    /// Always false; a result holds at least one path.
    pub fn is_empty(&self) -> bool {
        self.output_paths.is_empty()
    }

    /// Take ownership of the output paths.
    pub fn into_paths(self) -> Vec<PathBuf> {
        self.output_paths
    }
}

/// A failed conversion, with whatever was written before the failure.
#[derive(Debug, ThisError)]
#[error("{error}")]
pub struct ConversionFailure {
    /// What went wrong
    #[source]
    pub error: Error,

    /// Outputs already written by earlier targets of a composite batch
    pub produced: Vec<PathBuf>,
}

impl ConversionFailure {
    /// Whether some outputs were written before the failure.
    pub fn is_partial(&self) -> bool {
        !self.produced.is_empty()
    }
}

impl From<Error> for ConversionFailure {
    fn from(error: Error) -> Self {
        Self {
            error,
            produced: Vec::new(),
        }
    }
}

/// Runs conversion jobs through the gateway.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    catalog: FormatCatalog,
    gateway: ConverterGateway,
}

impl Orchestrator {
    /// Create an orchestrator with the standard catalog.
    pub fn new(gateway: ConverterGateway) -> Self {
        Self::with_catalog(FormatCatalog::new(), gateway)
    }

    /// Create an orchestrator over a converter.
    pub fn from_converter(converter: Arc<dyn DocumentConverter>) -> Self {
        Self::new(ConverterGateway::new(converter))
    }

    /// Create an orchestrator with a custom catalog.
    pub fn with_catalog(catalog: FormatCatalog, gateway: ConverterGateway) -> Self {
        Self { catalog, gateway }
    }

    /// The catalog jobs are validated against.
    pub fn catalog(&self) -> &FormatCatalog {
        &self.catalog
    }

    /// Check that the job's specifier is legal for its input extension.
    ///
    /// Touches neither the filesystem nor the converter.
    pub fn validate(&self, job: &ConversionJob) -> Result<Extension, Error> {
        let unsupported = || Error::UnsupportedFormat {
            extension: job
                .input_path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default(),
            specifier: job.specifier.to_string(),
        };

        let source = Extension::from_path(&job.input_path).ok_or_else(unsupported)?;
        if !self.catalog.is_legal(&source, &job.specifier) {
            return Err(unsupported());
        }
        Ok(source)
    }

    /// Convert the job's input into every target of its specifier.
    pub fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConversionFailure> {
        self.validate(&job)?;

        let targets = job.specifier.targets();
        let mut produced = Vec::with_capacity(targets.len());
        for (i, target) in targets.iter().enumerate() {
            debug!(
                "converting {} to {} ({}/{})",
                job.input_path.display(),
                target,
                i + 1,
                targets.len()
            );
            match self.gateway.convert_one(&job.input_path, target) {
                Ok(path) => produced.push(path),
                Err(error) => {
                    if !produced.is_empty() {
                        warn!(
                            "{} stopped at {} after writing {} file(s)",
                            job.specifier,
                            target,
                            produced.len()
                        );
                    }
                    return Err(ConversionFailure { error, produced });
                }
            }
        }

        Ok(ConversionResult {
            output_paths: produced,
        })
    }
}
