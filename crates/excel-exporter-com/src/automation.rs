//! [`ExcelAutomation`] over the COM bridge.

use std::path::{Path, PathBuf};

use excel_com_protocol::{
    CellValue as WireCell, RangeContent, SheetInfo, SheetRef, VbaComponentData, VbaComponentType,
};
use excel_exporter_core::vba::{write_vba_components, DEFAULT_VBA_EXTENSION};
use excel_exporter_core::{
    AutomationError, AutomationResult, CellValue, ExcelAutomation, Grid, SheetHandle,
    VbaComponent, VbaComponentKind, WorkbookHandle,
};

use crate::bridge::{BridgeError, ExcelBridge};
use crate::ribbon::{extract_ribbon_parts, RibbonError};

impl From<BridgeError> for AutomationError {
    fn from(err: BridgeError) -> Self {
        AutomationError::host(err.to_string())
    }
}

impl From<RibbonError> for AutomationError {
    fn from(err: RibbonError) -> Self {
        match err {
            RibbonError::Io(e) => AutomationError::Io(e),
            RibbonError::Zip(e) => AutomationError::host(format!("Cannot read workbook package: {e}")),
        }
    }
}

fn cell(value: WireCell) -> CellValue {
    match value {
        WireCell::Null => CellValue::Empty,
        WireCell::Bool(b) => CellValue::Bool(b),
        WireCell::Number(n) => CellValue::Number(n),
        WireCell::String(s) => CellValue::Text(s),
        WireCell::Error(e) => CellValue::Error(e.code),
    }
}

fn sheet(info: SheetInfo) -> SheetHandle {
    SheetHandle {
        index: info.index,
        name: info.name,
        code_name: info.code_name,
    }
}

/// Designers have no exportable source; everything else maps one to one.
fn component(data: VbaComponentData) -> Option<VbaComponent> {
    let kind = match data.kind {
        VbaComponentType::StdModule => VbaComponentKind::StandardModule,
        VbaComponentType::ClassModule => VbaComponentKind::ClassModule,
        VbaComponentType::MsForm => VbaComponentKind::Form,
        VbaComponentType::Document => VbaComponentKind::Document,
        VbaComponentType::ActiveXDesigner => return None,
    };
    Some(VbaComponent {
        name: data.name,
        kind,
        code: data.code,
        sheet_name: data.sheet_name,
    })
}

impl ExcelBridge {
    fn read_grid(
        &self,
        workbook: &WorkbookHandle,
        sheet: &SheetHandle,
        content: RangeContent,
    ) -> AutomationResult<Grid> {
        let (first_row, first_col, rows) =
            self.read_used_range(workbook.id, SheetRef::Index(sheet.index), content)?;
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(cell).collect())
            .collect();
        Ok(Grid::new(first_row, first_col, rows))
    }
}

impl ExcelAutomation for ExcelBridge {
    fn open_workbook(&self, path: &Path) -> AutomationResult<WorkbookHandle> {
        let id = ExcelBridge::open_workbook(self, path)?;
        tracing::debug!(id, path = %path.display(), "workbook opened");
        Ok(WorkbookHandle {
            id,
            path: path.to_path_buf(),
        })
    }

    fn sheets(&self, workbook: &WorkbookHandle) -> AutomationResult<Vec<SheetHandle>> {
        Ok(self.list_sheets(workbook.id)?.into_iter().map(sheet).collect())
    }

    fn read_values(&self, workbook: &WorkbookHandle, sheet: &SheetHandle) -> AutomationResult<Grid> {
        self.read_grid(workbook, sheet, RangeContent::Values)
    }

    fn read_formulas(
        &self,
        workbook: &WorkbookHandle,
        sheet: &SheetHandle,
    ) -> AutomationResult<Grid> {
        self.read_grid(workbook, sheet, RangeContent::Formulas)
    }

    fn export_vba_modules(
        &self,
        workbook: &WorkbookHandle,
        dir: &Path,
    ) -> AutomationResult<Vec<PathBuf>> {
        let components: Vec<VbaComponent> = self
            .list_vba_components(workbook.id)?
            .into_iter()
            .filter_map(component)
            .collect();
        tracing::debug!(count = components.len(), "VBA components listed");
        Ok(write_vba_components(dir, &components, DEFAULT_VBA_EXTENSION)?)
    }

    fn export_ribbon_xml(
        &self,
        workbook: &WorkbookHandle,
        dir: &Path,
    ) -> AutomationResult<Vec<PathBuf>> {
        Ok(extract_ribbon_parts(&workbook.path, dir)?)
    }

    fn close_workbook(&self, workbook: WorkbookHandle) -> AutomationResult<()> {
        Ok(ExcelBridge::close_workbook(self, workbook.id)?)
    }
}
