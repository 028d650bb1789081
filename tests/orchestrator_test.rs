//! Integration tests for the conversion orchestrator.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use docshift::catalog::{Extension, FormatSpecifier};
use docshift::convert::DocumentConverter;
use docshift::error::{Error, Result};
use docshift::orchestrator::{ConversionJob, Orchestrator};

/// Mock converter for testing.
///
/// Records every call and fails on the configured target.
#[derive(Default)]
struct MockConverter {
    calls: Mutex<Vec<(String, String)>>,
    fail_on: Option<&'static str>,
}

impl MockConverter {
    fn failing_on(target: &'static str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(target),
        }
    }

    fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl DocumentConverter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    fn convert_bytes(&self, input: &[u8], source: &Extension, target: &Extension) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((source.to_string(), target.to_string()));
        if self.fail_on == Some(target.as_str()) {
            return Err(Error::ConverterError(format!("cannot write {}", target)));
        }
        let mut out = input.to_vec();
        out.extend_from_slice(format!(" as {}", target).as_bytes());
        Ok(out)
    }
}

fn write_input(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"document body").unwrap();
    path
}

fn spec(text: &str) -> FormatSpecifier {
    text.parse().unwrap()
}

#[test]
fn test_simple_doc_to_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "report.doc");
    let converter = Arc::new(MockConverter::default());
    let orchestrator = Orchestrator::from_converter(converter.clone());

    let result = orchestrator
        .convert(ConversionJob::new(&input, spec(".pdf")))
        .unwrap();

    assert_eq!(result.output_paths(), &[dir.path().join("report.pdf")]);
    assert_eq!(
        fs::read(dir.path().join("report.pdf")).unwrap(),
        b"document body as .pdf"
    );
    assert_eq!(converter.calls(), vec![(".doc".into(), ".pdf".into())]);
}

#[test]
fn test_simple_output_keeps_stem_for_every_catalog_pair() {
    let dir = tempfile::tempdir().unwrap();
    let converter = Arc::new(MockConverter::default());
    let orchestrator = Orchestrator::from_converter(converter);
    let catalog = orchestrator.catalog().clone();

    for input_ext in catalog.supported_extensions() {
        let input = write_input(dir.path(), &format!("sample{}", input_ext));
        for specifier in catalog.legal_outputs(input_ext) {
            if specifier.is_composite() {
                continue;
            }
            let result = orchestrator
                .convert(ConversionJob::new(&input, specifier.clone()))
                .unwrap();
            assert_eq!(result.len(), 1);
            let output = result.primary();
            assert_eq!(output.file_stem(), input.file_stem());
            assert_eq!(
                Extension::from_path(output).as_ref(),
                Some(specifier.primary())
            );
        }
    }
}

#[test]
fn test_composite_runs_in_declared_order() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "report.docx");
    let converter = Arc::new(MockConverter::default());
    let orchestrator = Orchestrator::from_converter(converter.clone());

    let result = orchestrator
        .convert(ConversionJob::new(&input, spec(".pdf+.doc")))
        .unwrap();

    assert_eq!(
        result.output_paths(),
        &[dir.path().join("report.pdf"), dir.path().join("report.doc")]
    );
    assert_eq!(
        converter.calls(),
        vec![
            (".docx".into(), ".pdf".into()),
            (".docx".into(), ".doc".into())
        ]
    );
}

#[test]
fn test_composite_failure_reports_produced() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "report.docx");
    let converter = Arc::new(MockConverter::failing_on(".doc"));
    let orchestrator = Orchestrator::from_converter(converter);

    let failure = orchestrator
        .convert(ConversionJob::new(&input, spec(".pdf+.doc")))
        .unwrap_err();

    assert!(matches!(failure.error, Error::ConverterError(_)));
    assert!(failure.is_partial());
    assert_eq!(failure.produced, vec![dir.path().join("report.pdf")]);
    // No rollback: the first output stays on disk.
    assert!(dir.path().join("report.pdf").exists());
    assert!(!dir.path().join("report.doc").exists());
}

#[test]
fn test_composite_stops_at_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "notes.odt");
    let converter = Arc::new(MockConverter::failing_on(".pdf"));
    let orchestrator = Orchestrator::from_converter(converter.clone());

    let failure = orchestrator
        .convert(ConversionJob::new(&input, spec(".pdf+.docx")))
        .unwrap_err();

    assert!(!failure.is_partial());
    assert_eq!(converter.calls().len(), 1);
}

#[test]
fn test_unsupported_extension_has_no_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "photo.png");
    let converter = Arc::new(MockConverter::default());
    let orchestrator = Orchestrator::from_converter(converter.clone());

    let failure = orchestrator
        .convert(ConversionJob::new(&input, spec(".pdf")))
        .unwrap_err();

    assert!(matches!(failure.error, Error::UnsupportedFormat { .. }));
    assert!(converter.calls().is_empty());
    assert!(!dir.path().join("photo.pdf").exists());
}

#[test]
fn test_illegal_specifier_has_no_side_effects() {
    let converter = Arc::new(MockConverter::default());
    let orchestrator = Orchestrator::from_converter(converter.clone());

    // The input does not even exist: rejection must come before any read.
    for bad in [".xlsx", ".docx", ".pdf+.pptx"] {
        let failure = orchestrator
            .convert(ConversionJob::new("/nonexistent/report.docx", spec(bad)))
            .unwrap_err();
        assert!(failure.error.is_unsupported(), "{} accepted", bad);
    }
    assert!(converter.calls().is_empty());
}

#[test]
fn test_rerun_overwrites_and_returns_same_paths() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path(), "budget.xlsx");
    let orchestrator = Orchestrator::from_converter(Arc::new(MockConverter::default()));

    let first = orchestrator
        .convert(ConversionJob::new(&input, spec(".pdf+.xls")))
        .unwrap();
    fs::write(&input, b"edited").unwrap();
    let second = orchestrator
        .convert(ConversionJob::new(&input, spec(".pdf+.xls")))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(
        fs::read(dir.path().join("budget.pdf")).unwrap(),
        b"edited as .pdf"
    );
}

#[test]
fn test_missing_input_is_filesystem_error() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::from_converter(Arc::new(MockConverter::default()));

    let failure = orchestrator
        .convert(ConversionJob::new(dir.path().join("gone.pptx"), spec(".pdf")))
        .unwrap_err();
    assert!(matches!(failure.error, Error::Filesystem { .. }));
}
