//! Output directory skeleton for one export

use std::path::{Path, PathBuf};

use crate::config::{FileType, ParsedConfiguration};
use crate::error::{ExportError, ExportResult};

/// Suffix appended to the output name for the export root
pub const INTERNALS_SUFFIX: &str = "_internals";

/// Subfolders of `VBA/`, one per component family
pub const VBA_SUBDIRS: [&str; 5] = [
    "Microsoft Excel Objects",
    "Modules",
    "Classes",
    "Forms",
    "ThisWorkbook",
];

/// Where everything for one workbook is written:
///
/// ```text
/// {output_dir}/{output_name}_internals/
///     Sheets/
///     VBA/{Microsoft Excel Objects,Modules,Classes,Forms,ThisWorkbook}/
///     RibbonX/Icons/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
    file_type: FileType,
}

impl OutputLayout {
    /// Derive the layout from a resolved configuration
    pub fn new(config: &ParsedConfiguration) -> ExportResult<Self> {
        let output_dir = config
            .output_dir
            .as_deref()
            .ok_or(ExportError::IncompleteConfiguration("output directory"))?;
        let output_name = config
            .output_name
            .as_deref()
            .ok_or(ExportError::IncompleteConfiguration("output name"))?;
        let file_type = config
            .file_type
            .ok_or(ExportError::IncompleteConfiguration("file type"))?;

        Ok(Self::from_parts(output_dir, output_name, file_type))
    }

    pub fn from_parts(output_dir: &Path, output_name: &str, file_type: FileType) -> Self {
        Self {
            root: output_dir.join(format!("{output_name}{INTERNALS_SUFFIX}")),
            file_type,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sheets_dir(&self) -> PathBuf {
        self.root.join("Sheets")
    }

    pub fn vba_dir(&self) -> PathBuf {
        self.root.join("VBA")
    }

    pub fn ribbon_dir(&self) -> PathBuf {
        self.root.join("RibbonX")
    }

    /// Whether the VBA tree belongs in this layout
    pub fn has_vba(&self) -> bool {
        self.file_type.is_macro_enabled()
    }

    /// Every directory [`create`](Self::create) makes, parents first
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.root.clone(), self.sheets_dir()];

        if self.has_vba() {
            let vba = self.vba_dir();
            dirs.push(vba.clone());
            dirs.extend(VBA_SUBDIRS.iter().map(|sub| vba.join(sub)));
        }

        let ribbon = self.ribbon_dir();
        let icons = ribbon.join("Icons");
        dirs.push(ribbon);
        dirs.push(icons);
        dirs
    }

    /// Create the skeleton. Existing directories are left as they are.
    pub fn create(&self) -> ExportResult<()> {
        for dir in self.directories() {
            std::fs::create_dir_all(&dir)
                .map_err(|source| ExportError::CreateDir { path: dir.clone(), source })?;
        }
        tracing::debug!(root = %self.root.display(), "output directories ready");
        Ok(())
    }
}
