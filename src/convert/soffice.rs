//! LibreOffice (`soffice`) converter implementation.

use crate::catalog::Extension;
use crate::error::{Error, Result};
use crate::probe::SofficeProbe;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::DocumentConverter;

/// Stem of the staged input inside the scratch directory.
const STAGED_STEM: &str = "source";

/// Options for running LibreOffice.
#[derive(Debug, Clone, Default)]
pub struct SofficeOptions {
    /// Dedicated user profile directory, so a headless run does not
    /// contend with a desktop instance for the profile lock
    pub profile_dir: Option<PathBuf>,

    /// Extra arguments placed before `--convert-to`
    pub extra_args: Vec<String>,
}

impl SofficeOptions {
    /// Create new options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a dedicated user profile directory.
    pub fn with_profile_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.profile_dir = Some(dir.into());
        self
    }

    /// Append an extra argument.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

/// Converter that shells out to `soffice --headless --convert-to`.
///
/// The input bytes are staged in a private scratch directory, converted
/// there and read back, so the caller's directory only ever sees the
/// final write done by the gateway.
#[derive(Debug, Clone, Default)]
pub struct SofficeConverter {
    probe: SofficeProbe,
    options: SofficeOptions,
}

impl SofficeConverter {
    /// Create a converter with default lookup and options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a converter that locates LibreOffice with `probe`.
    pub fn with_probe(probe: SofficeProbe) -> Self {
        Self {
            probe,
            options: SofficeOptions::default(),
        }
    }

    /// Set run options.
    pub fn with_options(mut self, options: SofficeOptions) -> Self {
        self.options = options;
        self
    }

    fn build_command(
        &self,
        binary: &Path,
        staged: &Path,
        out_dir: &Path,
        target: &Extension,
    ) -> Result<Command> {
        let mut cmd = Command::new(binary);
        cmd.arg("--headless").arg("--norestore");

        if let Some(dir) = &self.options.profile_dir {
            let profile = url::Url::from_directory_path(dir).map_err(|_| {
                Error::ConverterError(format!(
                    "profile directory must be absolute: {}",
                    dir.display()
                ))
            })?;
            cmd.arg(format!("-env:UserInstallation={}", profile));
        }

        cmd.args(&self.options.extra_args)
            .arg("--convert-to")
            .arg(target.converter_token())
            .arg("--outdir")
            .arg(out_dir)
            .arg(staged);
        Ok(cmd)
    }
}

impl DocumentConverter for SofficeConverter {
    fn name(&self) -> &str {
        "soffice"
    }

    fn convert_bytes(
        &self,
        input: &[u8],
        source: &Extension,
        target: &Extension,
    ) -> Result<Vec<u8>> {
        let binary = self.probe.locate().ok_or_else(|| {
            Error::ConverterUnavailable("soffice was not found on PATH or in the usual install locations".into())
        })?;

        let scratch = tempfile::Builder::new()
            .prefix("docshift-")
            .tempdir()
            .map_err(|e| Error::filesystem(std::env::temp_dir(), e))?;
        let staged = scratch.path().join(format!("{}{}", STAGED_STEM, source));
        fs::write(&staged, input).map_err(|e| Error::filesystem(&staged, e))?;
        let out_dir = scratch.path().join("out");
        fs::create_dir(&out_dir).map_err(|e| Error::filesystem(&out_dir, e))?;

        let mut cmd = self.build_command(&binary, &staged, &out_dir, target)?;
        debug!("running {:?}", cmd);
        let output = cmd.output().map_err(|e| match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                Error::ConverterUnavailable(format!("{}: {}", binary.display(), e))
            }
            _ => Error::ConverterError(format!("failed to run {}: {}", binary.display(), e)),
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(Error::ConverterError(format!(
                "soffice exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        // soffice exits 0 when it cannot load the document, so the
        // output file is the only reliable success signal.
        let produced = out_dir.join(format!("{}.{}", STAGED_STEM, target.bare()));
        if !produced.is_file() {
            let detail = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(Error::ConverterError(format!(
                "no {} produced: {}",
                target, detail
            )));
        }

        fs::read(&produced).map_err(|e| Error::filesystem(&produced, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::ProbeOptions;

    fn ext(s: &str) -> Extension {
        Extension::new(s).unwrap()
    }

    #[test]
    fn test_options_builder() {
        let options = SofficeOptions::new()
            .with_profile_dir("/tmp/docshift-profile")
            .with_arg("--nologo");
        assert_eq!(
            options.profile_dir,
            Some(PathBuf::from("/tmp/docshift-profile"))
        );
        assert_eq!(options.extra_args, vec!["--nologo"]);
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let probe = SofficeProbe::with_options(
            ProbeOptions::new().with_binary(dir.path().join("no-soffice")),
        );
        let converter = SofficeConverter::with_probe(probe);

        let err = converter
            .convert_bytes(b"doc", &ext("docx"), &ext("pdf"))
            .unwrap_err();
        assert!(matches!(err, Error::ConverterUnavailable(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_line() {
        let converter = SofficeConverter::new().with_options(
            SofficeOptions::new()
                .with_profile_dir("/tmp/profile")
                .with_arg("--nologo"),
        );
        let cmd = converter
            .build_command(
                Path::new("/usr/bin/soffice"),
                Path::new("/tmp/x/source.docx"),
                Path::new("/tmp/x/out"),
                &ext("txt"),
            )
            .unwrap();
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec![
                "--headless",
                "--norestore",
                "-env:UserInstallation=file:///tmp/profile/",
                "--nologo",
                "--convert-to",
                "txt:Text",
                "--outdir",
                "/tmp/x/out",
                "/tmp/x/source.docx",
            ]
        );
    }

    #[test]
    fn test_relative_profile_dir_rejected() {
        let converter = SofficeConverter::new()
            .with_options(SofficeOptions::new().with_profile_dir("relative/profile"));
        let result = converter.build_command(
            Path::new("soffice"),
            Path::new("source.doc"),
            Path::new("out"),
            &ext("pdf"),
        );
        assert!(matches!(result, Err(Error::ConverterError(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_fake_soffice_round_trip() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-soffice");
        fs::write(
            &script,
            r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    --convert-to) fmt="$2"; shift 2 ;;
    --outdir) out="$2"; shift 2 ;;
    -*) shift ;;
    *) src="$1"; shift ;;
  esac
done
ext="${fmt%%:*}"
name=$(basename "$src")
cat "$src" > "$out/${name%.*}.$ext"
printf '%s' "-$ext" >> "$out/${name%.*}.$ext"
"#,
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let probe = SofficeProbe::with_options(ProbeOptions::new().with_binary(&script));
        let converter = SofficeConverter::with_probe(probe);
        let out = converter
            .convert_bytes(b"body", &ext("docx"), &ext("txt"))
            .unwrap();
        assert_eq!(out, b"body-txt");
    }

    #[cfg(unix)]
    #[test]
    fn test_fake_soffice_without_output() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("broken-soffice");
        fs::write(&script, "#!/bin/sh\necho 'Error: source file could not be loaded' >&2\n")
            .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let probe = SofficeProbe::with_options(ProbeOptions::new().with_binary(&script));
        let err = SofficeConverter::with_probe(probe)
            .convert_bytes(b"body", &ext("docx"), &ext("pdf"))
            .unwrap_err();
        match err {
            Error::ConverterError(msg) => assert!(msg.contains("could not be loaded")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
