//! Choosing the input file.
//!
//! The host hands over whatever is selected (possibly nothing, possibly
//! unrelated files). The first path with a catalogued extension wins;
//! if there is none, a manual picker is asked once and its answer is
//! checked against the catalog as well.

use crate::catalog::FormatCatalog;
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Asks the user for a single file.
pub trait FilePicker {
    /// The chosen path, or `None` if the user cancelled.
    fn pick(&self) -> Option<PathBuf>;
}

impl<F> FilePicker for F
where
    F: Fn() -> Option<PathBuf>,
{
    fn pick(&self) -> Option<PathBuf> {
        self()
    }
}

/// First selected path the catalog can convert.
pub fn first_supported<'a>(selection: &'a [PathBuf], catalog: &FormatCatalog) -> Option<&'a Path> {
    selection
        .iter()
        .find(|p| catalog.is_supported_path(p))
        .map(PathBuf::as_path)
}

/// Resolve the input from the selection, falling back to `picker`.
pub fn resolve_input(
    selection: &[PathBuf],
    picker: &dyn FilePicker,
    catalog: &FormatCatalog,
) -> Option<PathBuf> {
    if let Some(path) = first_supported(selection, catalog) {
        return Some(path.to_path_buf());
    }
    debug!(
        "no supported file among {} selected, asking picker",
        selection.len()
    );

    let picked = picker.pick()?;
    if catalog.is_supported_path(&picked) {
        Some(picked)
    } else {
        warn!("picked file is not a supported document: {}", picked.display());
        None
    }
}
