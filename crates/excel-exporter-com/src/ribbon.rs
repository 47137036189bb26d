//! Copying custom ribbon parts out of a workbook package.
//!
//! Ribbon XML never goes through Excel: the parts are read straight from the
//! OOXML zip and written byte for byte.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

/// Subdirectory of the ribbon directory that receives ribbon images
pub const ICONS_DIR: &str = "Icons";

/// Errors while copying ribbon parts
#[derive(Debug, thiserror::Error)]
pub enum RibbonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

pub type RibbonResult<T> = std::result::Result<T, RibbonError>;

/// Where a package entry goes, relative to the ribbon directory
fn ribbon_target(entry: &str) -> Option<PathBuf> {
    let mut parts = entry.split('/');
    let folder = parts.next()?;
    if !folder.to_ascii_lowercase().starts_with("customui") {
        return None;
    }

    match (parts.next(), parts.next(), parts.next()) {
        (Some(file), None, None) if file.to_ascii_lowercase().ends_with(".xml") => {
            Some(PathBuf::from(file))
        }
        (Some("images"), Some(image), None) if !image.is_empty() => {
            Some(Path::new(ICONS_DIR).join(image))
        }
        _ => None,
    }
}

/// Copy ribbon parts of the workbook at `workbook_path` into `dir`.
pub fn extract_ribbon_parts(workbook_path: &Path, dir: &Path) -> RibbonResult<Vec<PathBuf>> {
    let file = File::open(workbook_path)?;
    extract_from(file, dir)
}

/// Copy ribbon parts from any zip reader into `dir`.
pub fn extract_from<R: Read + Seek>(reader: R, dir: &Path) -> RibbonResult<Vec<PathBuf>> {
    let mut archive = zip::ZipArchive::new(reader)?;
    let mut written = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let Some(relative) = ribbon_target(entry.name()) else {
            continue;
        };

        let target = dir.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
        tracing::debug!(part = entry.name(), "copied ribbon part");
        written.push(target);
    }

    Ok(written)
}
