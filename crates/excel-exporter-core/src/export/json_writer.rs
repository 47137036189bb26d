//! JSON document for a whole workbook.
//!
//! Shape:
//!
//! ```text
//! {
//!   "name": "report",
//!   "fileType": "xlsm",
//!   "sheets": {
//!     "Summary": {
//!       "firstRow": 1, "firstCol": 1, "lastRow": 10, "lastCol": 3,
//!       "values": {
//!         "A": { "1": { "displayedVal": 42, "formulaVal": "=6*7" } }
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! Columns are A1 letters, rows are 1-based numbers, and cells that are empty
//! in both grids are left out.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde_json::{json, Map, Value};

use crate::automation::{CellValue, Grid, SheetHandle};
use crate::config::FileType;
use crate::error::ExportResult;

/// Convert a 1-based column number to letters (1 = A, 27 = AA)
pub fn column_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Accumulates sheets and serializes them as one document
#[derive(Debug, Clone)]
pub struct WorkbookDocument {
    name: String,
    file_type: FileType,
    sheets: Map<String, Value>,
}

impl WorkbookDocument {
    pub fn new(name: impl Into<String>, file_type: FileType) -> Self {
        Self {
            name: name.into(),
            file_type,
            sheets: Map::new(),
        }
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Add a sheet from its value and formula grids
    pub fn add_sheet(&mut self, sheet: &SheetHandle, values: &Grid, formulas: &Grid) {
        self.sheets
            .insert(sheet.name.clone(), sheet_value(values, formulas));
    }

    pub fn to_value(&self) -> Value {
        json!({
            "name": self.name,
            "fileType": self.file_type.as_str(),
            "sheets": Value::Object(self.sheets.clone()),
        })
    }

    /// Write the document, pretty-printed
    pub fn write_file<P: AsRef<Path>>(&self, path: P) -> ExportResult<()> {
        let file = File::create(path)?;
        self.write(BufWriter::new(file))
    }

    pub fn write<W: Write>(&self, mut writer: W) -> ExportResult<()> {
        serde_json::to_writer_pretty(&mut writer, &self.to_value())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

fn sheet_value(values: &Grid, formulas: &Grid) -> Value {
    let bounds = [values, formulas]
        .into_iter()
        .filter(|g| g.row_count() > 0)
        .map(|g| {
            (
                g.first_row,
                g.first_col,
                g.last_row().unwrap_or(g.first_row),
                g.last_col().unwrap_or(g.first_col),
            )
        })
        .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)));

    let Some((first_row, first_col, last_row, last_col)) = bounds else {
        return json!({ "values": {} });
    };

    let mut columns = Map::new();
    for col in first_col..=last_col {
        let mut cells = Map::new();
        for row in first_row..=last_row {
            let value = cell_at(values, row, col);
            let formula = cell_at(formulas, row, col);
            if value.map_or(true, CellValue::is_empty) && formula.map_or(true, CellValue::is_empty)
            {
                continue;
            }
            cells.insert(
                row.to_string(),
                json!({
                    "displayedVal": value.unwrap_or(&CellValue::Empty),
                    "formulaVal": formula.map(ToString::to_string).unwrap_or_default(),
                }),
            );
        }
        if !cells.is_empty() {
            columns.insert(column_letters(col), Value::Object(cells));
        }
    }

    json!({
        "firstRow": first_row,
        "firstCol": first_col,
        "lastRow": last_row,
        "lastCol": last_col,
        "values": Value::Object(columns),
    })
}

/// Cell at absolute 1-based coordinates
fn cell_at(grid: &Grid, row: u32, col: u32) -> Option<&CellValue> {
    let r = row.checked_sub(grid.first_row)?;
    let c = col.checked_sub(grid.first_col)?;
    grid.get(r as usize, c as usize)
}
