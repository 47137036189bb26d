//! Writing VBA project components to the `VBA/` tree

use std::path::{Path, PathBuf};

use crate::automation::{VbaComponent, VbaComponentKind};

/// Default extension for exported source files
pub const DEFAULT_VBA_EXTENSION: &str = "vba";

const THIS_WORKBOOK: &str = "ThisWorkbook";

/// Target path of a component's source file below `vba_dir`
pub fn component_path(vba_dir: &Path, component: &VbaComponent, extension: &str) -> PathBuf {
    let file = |name: &str| format!("{name}.{extension}");
    match component.kind {
        VbaComponentKind::StandardModule => vba_dir.join("Modules").join(file(&component.name)),
        VbaComponentKind::ClassModule => vba_dir.join("Classes").join(file(&component.name)),
        VbaComponentKind::Form => vba_dir
            .join("Forms")
            .join(&component.name)
            .join(file(&component.name)),
        VbaComponentKind::Document if component.name == THIS_WORKBOOK => {
            vba_dir.join(THIS_WORKBOOK).join(file(THIS_WORKBOOK))
        }
        VbaComponentKind::Document => {
            let label = match &component.sheet_name {
                Some(sheet) => format!("{} ({sheet})", component.name),
                None => component.name.clone(),
            };
            vba_dir.join("Microsoft Excel Objects").join(file(&label))
        }
    }
}

/// Write every component with code; returns the files written.
///
/// Forms always get their own directory, even without code.
pub fn write_vba_components(
    vba_dir: &Path,
    components: &[VbaComponent],
    extension: &str,
) -> std::io::Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    for component in components {
        let path = component_path(vba_dir, component, extension);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if component.code.trim().is_empty() {
            tracing::debug!(component = %component.name, "skipping empty VBA component");
            continue;
        }
        std::fs::write(&path, &component.code)?;
        tracing::info!("Exported VBA component: {}", path.display());
        written.push(path);
    }

    Ok(written)
}
