//! The boundary to the host that actually opens workbooks.
//!
//! Everything that needs Excel itself sits behind [`ExcelAutomation`]. The
//! rest of this crate only hands it resolved paths and writes what it returns.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AutomationResult;

/// An open workbook on the automation host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookHandle {
    /// Host-assigned identifier
    pub id: u64,
    /// Local path the workbook was opened from
    pub path: PathBuf,
}

/// A worksheet within an open workbook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetHandle {
    /// 0-based position in the workbook
    pub index: u32,
    /// Tab name
    pub name: String,
    /// VBA code name (e.g. `Sheet1`)
    pub code_name: String,
}

/// A single cell as read from the host
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    Error(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            CellValue::Text(s) => f.write_str(s),
            CellValue::Error(code) => f.write_str(code),
        }
    }
}

/// The used range of a worksheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    /// 1-based row of the top-left cell
    pub first_row: u32,
    /// 1-based column of the top-left cell
    pub first_col: u32,
    /// Row-major cells
    pub rows: Vec<Vec<CellValue>>,
}

impl Grid {
    pub fn new(first_row: u32, first_col: u32, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            first_row,
            first_col,
            rows,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|row| row.iter().all(CellValue::is_empty))
    }

    /// 1-based last row, or `None` for an empty grid
    pub fn last_row(&self) -> Option<u32> {
        (self.row_count() > 0).then(|| self.first_row + self.row_count() as u32 - 1)
    }

    /// 1-based last column, or `None` for an empty grid
    pub fn last_col(&self) -> Option<u32> {
        (self.col_count() > 0).then(|| self.first_col + self.col_count() as u32 - 1)
    }

    /// Cell at a 0-based offset from the origin
    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

/// Kinds of component in a VBA project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VbaComponentKind {
    StandardModule,
    ClassModule,
    Form,
    /// Code behind a worksheet or `ThisWorkbook`
    Document,
}

/// One component of a workbook's VBA project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VbaComponent {
    pub name: String,
    pub kind: VbaComponentKind,
    /// Full source text; empty when the module has no lines
    pub code: String,
    /// Tab name of the worksheet a document module belongs to
    pub sheet_name: Option<String>,
}

/// Host operations the exporter relies on.
///
/// Every method fails with [`AutomationError`](crate::AutomationError) when
/// the host does.
pub trait ExcelAutomation {
    /// Open the workbook at `path`
    fn open_workbook(&self, path: &Path) -> AutomationResult<WorkbookHandle>;

    /// Worksheets in workbook order
    fn sheets(&self, workbook: &WorkbookHandle) -> AutomationResult<Vec<SheetHandle>>;

    /// Displayed values of the sheet's used range
    fn read_values(&self, workbook: &WorkbookHandle, sheet: &SheetHandle)
        -> AutomationResult<Grid>;

    /// Formulas of the sheet's used range (constants for non-formula cells)
    fn read_formulas(
        &self,
        workbook: &WorkbookHandle,
        sheet: &SheetHandle,
    ) -> AutomationResult<Grid>;

    /// Write the VBA project's source under `dir`, returning files written
    fn export_vba_modules(
        &self,
        workbook: &WorkbookHandle,
        dir: &Path,
    ) -> AutomationResult<Vec<PathBuf>>;

    /// Write custom ribbon XML parts under `dir`, returning files written
    fn export_ribbon_xml(
        &self,
        workbook: &WorkbookHandle,
        dir: &Path,
    ) -> AutomationResult<Vec<PathBuf>>;

    /// Close without saving
    fn close_workbook(&self, workbook: WorkbookHandle) -> AutomationResult<()>;
}
