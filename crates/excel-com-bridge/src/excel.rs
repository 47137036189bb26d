//! The Excel object model calls behind each bridge command.

#![cfg(windows)]

use std::collections::HashMap;

use windows::Win32::System::Variant::VARIANT;

use excel_com_protocol::{
    CellError, CellValue, RangeContent, SheetInfo, SheetRef, VbaComponentData, VbaComponentType,
};

use crate::dispatch::{
    variant_bool, variant_get_bool, variant_get_error, variant_get_f64, variant_get_string,
    variant_i32, variant_is_empty, variant_str, DispatchObject,
};

/// `msoAutomationSecurityForceDisable`: open workbooks without running macros
const FORCE_DISABLE_MACROS: i32 = 3;

/// Owns the Excel.Application instance and the workbooks opened through it.
pub struct ExcelApp {
    app: DispatchObject,
    workbooks_collection: DispatchObject,
    workbooks: HashMap<u64, DispatchObject>,
    next_handle: u64,
}

impl ExcelApp {
    pub fn new() -> Result<Self, String> {
        let app = DispatchObject::create_from_progid("Excel.Application")?;

        app.set("Visible", variant_bool(false))?;
        app.set("DisplayAlerts", variant_bool(false))?;
        app.set("ScreenUpdating", variant_bool(false))?;
        app.set("EnableEvents", variant_bool(false))?;
        app.set("AutomationSecurity", variant_i32(FORCE_DISABLE_MACROS))?;

        let workbooks_collection = app.child("Workbooks")?;

        Ok(Self {
            app,
            workbooks_collection,
            workbooks: HashMap::new(),
            next_handle: 1,
        })
    }

    /// Open read-only without updating links. Returns the handle ID.
    pub fn open_workbook(&mut self, path: &str) -> Result<u64, String> {
        let wb = self.workbooks_collection.call_child(
            "Open",
            &[variant_str(path), variant_i32(0), variant_bool(true)],
        )?;
        let handle = self.next_handle;
        self.next_handle += 1;
        self.workbooks.insert(handle, wb);
        Ok(handle)
    }

    fn workbook(&self, handle: u64) -> Result<&DispatchObject, String> {
        self.workbooks
            .get(&handle)
            .ok_or_else(|| format!("Unknown workbook handle: {handle}"))
    }

    fn sheet(&self, handle: u64, sheet: &SheetRef) -> Result<DispatchObject, String> {
        let sheets = self.workbook(handle)?.child("Worksheets")?;
        let index = match sheet {
            // Excel collections are 1-based
            SheetRef::Index(idx) => variant_i32(*idx as i32 + 1),
            SheetRef::Name(name) => variant_str(name),
        };
        sheets.child_with("Item", &[index])
    }

    pub fn list_sheets(&self, handle: u64) -> Result<Vec<SheetInfo>, String> {
        let sheets = self.workbook(handle)?.child("Worksheets")?;
        let count = sheets.get_i32("Count")?;

        (1..=count)
            .map(|i| {
                let ws = sheets.child_with("Item", &[variant_i32(i)])?;
                Ok(SheetInfo {
                    index: (i - 1) as u32,
                    name: ws.get_string("Name")?,
                    code_name: ws.get_string("CodeName").unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Cells of the sheet's used range, row-major, with its 1-based origin.
    pub fn read_used_range(
        &self,
        handle: u64,
        sheet: &SheetRef,
        content: RangeContent,
    ) -> Result<(u32, u32, Vec<Vec<CellValue>>), String> {
        let used = self.sheet(handle, sheet)?.child("UsedRange")?;
        let first_row = used.get_i32("Row")?;
        let first_col = used.get_i32("Column")?;
        let row_count = used.child("Rows")?.get_i32("Count")?;
        let col_count = used.child("Columns")?.get_i32("Count")?;
        let cells = used.child("Cells")?;

        let property = match content {
            RangeContent::Values => "Value2",
            RangeContent::Formulas => "Formula",
        };

        let mut rows = Vec::with_capacity(row_count as usize);
        for r in 1..=row_count {
            let mut row = Vec::with_capacity(col_count as usize);
            for c in 1..=col_count {
                let cell = cells.child_with("Item", &[variant_i32(r), variant_i32(c)])?;
                row.push(to_cell_value(&cell.get(property)?));
            }
            rows.push(row);
        }

        Ok((first_row as u32, first_col as u32, rows))
    }

    /// Source of every VBA component. Fails when access to the VBA project
    /// object model is not trusted.
    pub fn list_vba_components(&self, handle: u64) -> Result<Vec<VbaComponentData>, String> {
        let wb = self.workbook(handle)?;
        let sheet_names: HashMap<String, String> = self
            .list_sheets(handle)?
            .into_iter()
            .map(|s| (s.code_name, s.name))
            .collect();

        let components = wb
            .child("VBProject")
            .map_err(|e| format!("Cannot access the VBA project (is it trusted?): {e}"))?
            .child("VBComponents")?;
        let count = components.get_i32("Count")?;

        let mut out = Vec::new();
        for i in 1..=count {
            let component = components.child_with("Item", &[variant_i32(i)])?;
            let name = component.get_string("Name")?;
            let type_code = component.get_i32("Type")?;
            let Some(kind) = VbaComponentType::from_vbext(type_code) else {
                eprintln!("[excel-com-bridge] skipping component {name} of type {type_code}");
                continue;
            };

            let module = component.child("CodeModule")?;
            let lines = module.get_i32("CountOfLines")?;
            let code = if lines > 0 {
                let text = module.get_with("Lines", &[variant_i32(1), variant_i32(lines)])?;
                variant_get_string(&text).unwrap_or_default()
            } else {
                String::new()
            };

            out.push(VbaComponentData {
                sheet_name: sheet_names.get(&name).cloned(),
                name,
                kind,
                code,
            });
        }
        Ok(out)
    }

    /// Close without saving.
    pub fn close_workbook(&mut self, handle: u64) -> Result<(), String> {
        let wb = self
            .workbooks
            .remove(&handle)
            .ok_or_else(|| format!("Unknown workbook handle: {handle}"))?;
        wb.call("Close", &[variant_bool(false)])?;
        Ok(())
    }

    /// Close every workbook and quit Excel.
    pub fn shutdown(mut self) -> Result<(), String> {
        let handles: Vec<u64> = self.workbooks.keys().copied().collect();
        for handle in handles {
            let _ = self.close_workbook(handle);
        }
        self.app.call("Quit", &[])?;
        Ok(())
    }
}

/// Text of an Excel `CVErr` SCODE.
fn error_text(scode: i32) -> String {
    match scode {
        -2146826288 => "#NULL!".into(),
        -2146826281 => "#DIV/0!".into(),
        -2146826273 => "#VALUE!".into(),
        -2146826265 => "#REF!".into(),
        -2146826259 => "#NAME?".into(),
        -2146826252 => "#NUM!".into(),
        -2146826246 => "#N/A".into(),
        other => format!("#ERR({other})"),
    }
}

fn to_cell_value(variant: &VARIANT) -> CellValue {
    if variant_is_empty(variant) {
        CellValue::Null
    } else if let Some(b) = variant_get_bool(variant) {
        CellValue::Bool(b)
    } else if let Some(n) = variant_get_f64(variant) {
        CellValue::Number(n)
    } else if let Some(s) = variant_get_string(variant) {
        CellValue::String(s)
    } else if let Some(scode) = variant_get_error(variant) {
        CellValue::Error(CellError {
            code: error_text(scode),
        })
    } else {
        CellValue::Null
    }
}
