//! Converter availability probing.
//!
//! A probe answers one question: can LibreOffice be found on this host
//! right now? It never fails; every lookup error collapses to "not
//! available". A positive answer is a hint, not a guarantee, so callers
//! still handle [`Error::ConverterUnavailable`](crate::Error) at
//! conversion time.

use log::debug;
use std::path::PathBuf;

/// Binary names searched on `PATH`, in order.
pub const DEFAULT_BINARY_NAMES: &[&str] = &["soffice", "libreoffice"];

/// Something that can tell whether the external converter is installed.
pub trait AvailabilityProbe: Send + Sync {
    /// Best-effort check. Must not panic.
    fn is_available(&self) -> bool;
}

impl<F> AvailabilityProbe for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn is_available(&self) -> bool {
        self()
    }
}

/// Where to look for the converter.
#[derive(Debug, Clone)]
pub struct ProbeOptions {
    /// Explicit binary; when set, nothing else is searched
    pub binary: Option<PathBuf>,

    /// Names looked up on `PATH`
    pub names: Vec<String>,

    /// Install locations checked after `PATH`
    pub locations: Vec<PathBuf>,
}

impl ProbeOptions {
    /// Create probe options with platform defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this binary (path or name) and nothing else.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = Some(binary.into());
        self
    }

    /// Replace the names searched on `PATH`.
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the install locations.
    pub fn with_locations<I, P>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            binary: None,
            names: DEFAULT_BINARY_NAMES.iter().map(|s| s.to_string()).collect(),
            locations: well_known_locations(),
        }
    }
}

/// Probe that searches `PATH` and the usual LibreOffice install paths.
#[derive(Debug, Clone, Default)]
pub struct SofficeProbe {
    options: ProbeOptions,
}

impl SofficeProbe {
    /// Create a probe with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a probe with custom options.
    pub fn with_options(options: ProbeOptions) -> Self {
        Self { options }
    }

    /// Options this probe searches with.
    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    /// Path of the converter executable, if one can be found.
    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(binary) = &self.options.binary {
            return match which::which(binary) {
                Ok(path) => Some(path),
                Err(e) => {
                    debug!("configured converter {} not usable: {}", binary.display(), e);
                    None
                }
            };
        }

        for name in &self.options.names {
            match which::which(name) {
                Ok(path) => {
                    debug!("found converter on PATH: {}", path.display());
                    return Some(path);
                }
                Err(e) => debug!("{} not on PATH: {}", name, e),
            }
        }

        let found = self
            .options
            .locations
            .iter()
            .filter(|candidate| candidate.is_file())
            .find_map(|candidate| match which::which(candidate) {
                Ok(path) => Some(path),
                Err(e) => {
                    debug!("{} not usable: {}", candidate.display(), e);
                    None
                }
            });
        match &found {
            Some(path) => debug!("found converter at {}", path.display()),
            None => debug!("no converter in {} known locations", self.options.locations.len()),
        }
        found
    }
}

impl AvailabilityProbe for SofficeProbe {
    fn is_available(&self) -> bool {
        self.locate().is_some()
    }
}

/// Default install locations for the current platform.
pub fn well_known_locations() -> Vec<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        vec![PathBuf::from(
            "/Applications/LibreOffice.app/Contents/MacOS/soffice",
        )]
    }

    #[cfg(target_os = "windows")]
    {
        vec![
            PathBuf::from(r"C:\Program Files\LibreOffice\program\soffice.exe"),
            PathBuf::from(r"C:\Program Files (x86)\LibreOffice\program\soffice.exe"),
        ]
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![
            PathBuf::from("/usr/lib/libreoffice/program/soffice"),
            PathBuf::from("/opt/libreoffice/program/soffice"),
            PathBuf::from("/snap/bin/libreoffice"),
        ]
    }
}
