//! Format catalog: which output formats are legal for each input extension.
//!
//! The catalog is a static table. For every supported input extension it
//! lists the legal output specifiers in a fixed order; the first entry is
//! the default pre-selected format.
//!
//! # Example
//!
//! ```
//! use docshift::catalog::{Extension, FormatCatalog, FormatSpecifier};
//!
//! let catalog = FormatCatalog::new();
//! let docx = Extension::new("DOCX").unwrap();
//!
//! let default = catalog.default_output(&docx).unwrap();
//! assert_eq!(default.to_string(), ".pdf");
//!
//! let both: FormatSpecifier = ".pdf+.doc".parse().unwrap();
//! assert!(catalog.is_legal(&docx, &both));
//! assert_eq!(catalog.label(&both), "PDF + Word 97-2003 Document (.doc)");
//! ```

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Separator between the elements of a composite specifier.
pub const SEPARATOR: char = '+';

/// Legal outputs per input extension. Inner slices with more than one
/// element are composite specifiers.
const ENTRIES: &[(&str, &[&[&str]])] = &[
    (
        ".doc",
        &[
            &[".pdf"],
            &[".docx"],
            &[".pdf", ".docx"],
            &[".odt"],
            &[".rtf"],
            &[".txt"],
            &[".html"],
        ],
    ),
    (
        ".docx",
        &[
            &[".pdf"],
            &[".doc"],
            &[".pdf", ".doc"],
            &[".odt"],
            &[".rtf"],
            &[".txt"],
            &[".html"],
        ],
    ),
    (
        ".odt",
        &[
            &[".pdf"],
            &[".docx"],
            &[".pdf", ".docx"],
            &[".doc"],
            &[".rtf"],
            &[".txt"],
        ],
    ),
    (
        ".rtf",
        &[&[".pdf"], &[".docx"], &[".doc"], &[".odt"], &[".txt"]],
    ),
    (
        ".xls",
        &[
            &[".pdf"],
            &[".xlsx"],
            &[".pdf", ".xlsx"],
            &[".ods"],
            &[".csv"],
        ],
    ),
    (
        ".xlsx",
        &[&[".pdf"], &[".xls"], &[".pdf", ".xls"], &[".ods"], &[".csv"]],
    ),
    (
        ".ods",
        &[
            &[".pdf"],
            &[".xlsx"],
            &[".pdf", ".xlsx"],
            &[".xls"],
            &[".csv"],
        ],
    ),
    (
        ".ppt",
        &[&[".pdf"], &[".pptx"], &[".pdf", ".pptx"], &[".odp"]],
    ),
    (
        ".pptx",
        &[&[".pdf"], &[".ppt"], &[".pdf", ".ppt"], &[".odp"]],
    ),
    (
        ".odp",
        &[&[".pdf"], &[".pptx"], &[".pdf", ".pptx"], &[".ppt"]],
    ),
];

const LABELS: &[(&str, &str)] = &[
    (".pdf", "PDF"),
    (".doc", "Word 97-2003 Document (.doc)"),
    (".docx", "Word Document (.docx)"),
    (".odt", "OpenDocument Text (.odt)"),
    (".rtf", "Rich Text Format (.rtf)"),
    (".txt", "Plain Text (.txt)"),
    (".html", "HTML Document (.html)"),
    (".xls", "Excel 97-2003 Workbook (.xls)"),
    (".xlsx", "Excel Workbook (.xlsx)"),
    (".ods", "OpenDocument Spreadsheet (.ods)"),
    (".csv", "CSV (.csv)"),
    (".ppt", "PowerPoint 97-2003 Presentation (.ppt)"),
    (".pptx", "PowerPoint Presentation (.pptx)"),
    (".odp", "OpenDocument Presentation (.odp)"),
];

/// Targets whose `--convert-to` token is not the bare extension.
const CONVERTER_TOKENS: &[(&str, &str)] = &[(".txt", "txt:Text")];

/// A normalized, lower-cased file extension including the leading dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Extension(String);

impl Extension {
    /// Normalize user text into an extension.
    ///
    /// Accepts `pdf`, `.pdf` or `PDF`. Returns `None` for empty input or
    /// text containing separators, dots past the first, or whitespace.
    pub fn new(text: &str) -> Option<Self> {
        let bare = text.trim();
        let bare = bare.strip_prefix('.').unwrap_or(bare);
        if bare.is_empty()
            || !bare
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return None;
        }
        Some(Self(format!(".{}", bare.to_ascii_lowercase())))
    }

    /// Extension of the final path component, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension().and_then(|e| e.to_str()).and_then(Self::new)
    }

    fn from_static(text: &str) -> Self {
        Self(text.to_string())
    }

    /// The extension with its leading dot (`.pdf`).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The extension without its leading dot (`pdf`).
    pub fn bare(&self) -> &str {
        &self.0[1..]
    }

    /// Token passed to the converter's `--convert-to` option.
    pub fn converter_token(&self) -> &str {
        CONVERTER_TOKENS
            .iter()
            .find(|(ext, _)| *ext == self.0)
            .map(|(_, token)| *token)
            .unwrap_or_else(|| self.bare())
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Extension {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// A requested output: one target, or several produced in order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FormatSpecifier {
    /// A single target extension
    Simple(Extension),
    /// Two or more distinct targets, converted in this order
    Composite(Vec<Extension>),
}

impl FormatSpecifier {
    /// Build a specifier from an ordered list of targets.
    ///
    /// A single target collapses to [`FormatSpecifier::Simple`]. Empty
    /// lists and repeated targets are rejected.
    pub fn from_targets(mut targets: Vec<Extension>) -> Result<Self> {
        match targets.len() {
            0 => Err(Error::InvalidSpecifier("no target format".into())),
            1 => Ok(FormatSpecifier::Simple(targets.remove(0))),
            _ => {
                for (i, ext) in targets.iter().enumerate() {
                    if targets[..i].contains(ext) {
                        return Err(Error::InvalidSpecifier(format!(
                            "{} listed more than once",
                            ext
                        )));
                    }
                }
                Ok(FormatSpecifier::Composite(targets))
            }
        }
    }

    /// Targets in conversion order.
    pub fn targets(&self) -> &[Extension] {
        match self {
            FormatSpecifier::Simple(ext) => std::slice::from_ref(ext),
            FormatSpecifier::Composite(exts) => exts,
        }
    }

    /// The first target; for composites this is the primary format.
    pub fn primary(&self) -> &Extension {
        &self.targets()[0]
    }

    /// Whether this specifier produces more than one file.
    pub fn is_composite(&self) -> bool {
        matches!(self, FormatSpecifier::Composite(_))
    }

    fn from_static(parts: &[&str]) -> Self {
        let mut exts: Vec<Extension> = parts.iter().map(|p| Extension::from_static(p)).collect();
        if exts.len() == 1 {
            FormatSpecifier::Simple(exts.remove(0))
        } else {
            FormatSpecifier::Composite(exts)
        }
    }
}

impl From<Extension> for FormatSpecifier {
    fn from(ext: Extension) -> Self {
        FormatSpecifier::Simple(ext)
    }
}

impl FromStr for FormatSpecifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let targets = s
            .split(SEPARATOR)
            .map(|part| {
                Extension::new(part)
                    .ok_or_else(|| Error::InvalidSpecifier(format!("{:?} in {:?}", part, s)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_targets(targets)
    }
}

impl fmt::Display for FormatSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ext) in self.targets().iter().enumerate() {
            if i > 0 {
                write!(f, "{}", SEPARATOR)?;
            }
            f.write_str(ext.as_str())?;
        }
        Ok(())
    }
}

impl Serialize for FormatSpecifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Static mapping from input extension to legal output specifiers.
#[derive(Debug, Clone)]
pub struct FormatCatalog {
    entries: Vec<(Extension, Vec<FormatSpecifier>)>,
}

impl FormatCatalog {
    /// Build the catalog of office formats LibreOffice handles.
    pub fn new() -> Self {
        let entries = ENTRIES
            .iter()
            .map(|(input, outputs)| {
                (
                    Extension::from_static(input),
                    outputs.iter().map(|o| FormatSpecifier::from_static(o)).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    /// Legal outputs for `extension`, default first. Empty if unsupported.
    pub fn legal_outputs(&self, extension: &Extension) -> &[FormatSpecifier] {
        self.entries
            .iter()
            .find(|(input, _)| input == extension)
            .map(|(_, outputs)| outputs.as_slice())
            .unwrap_or(&[])
    }

    /// The pre-selected output for `extension`.
    pub fn default_output(&self, extension: &Extension) -> Option<&FormatSpecifier> {
        self.legal_outputs(extension).first()
    }

    /// Whether `extension` can be converted at all.
    pub fn is_supported(&self, extension: &Extension) -> bool {
        !self.legal_outputs(extension).is_empty()
    }

    /// Whether the file at `path` has a supported extension.
    pub fn is_supported_path(&self, path: &Path) -> bool {
        Extension::from_path(path).is_some_and(|ext| self.is_supported(&ext))
    }

    /// Whether `specifier` may be produced from `extension`.
    ///
    /// Listed specifiers are legal. A composite that is not listed is still
    /// legal when every one of its targets is a listed simple output.
    pub fn is_legal(&self, extension: &Extension, specifier: &FormatSpecifier) -> bool {
        let outputs = self.legal_outputs(extension);
        if outputs.contains(specifier) {
            return true;
        }
        specifier.is_composite()
            && specifier.targets().iter().all(|target| {
                outputs
                    .iter()
                    .any(|o| matches!(o, FormatSpecifier::Simple(ext) if ext == target))
            })
    }

    /// Supported input extensions in catalog order.
    pub fn supported_extensions(&self) -> impl Iterator<Item = &Extension> {
        self.entries.iter().map(|(input, _)| input)
    }

    /// Human-readable label for `specifier`.
    pub fn label(&self, specifier: &FormatSpecifier) -> String {
        specifier
            .targets()
            .iter()
            .map(extension_label)
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

impl Default for FormatCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn extension_label(ext: &Extension) -> String {
    LABELS
        .iter()
        .find(|(e, _)| *e == ext.as_str())
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| ext.bare().to_ascii_uppercase())
}
