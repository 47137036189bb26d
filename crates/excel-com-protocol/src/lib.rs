//! Shared protocol types for communication between the exporter and the
//! Windows COM bridge process (run natively or under WINE).
//!
//! The protocol is JSON-over-stdio: one JSON object per line in each direction.

use serde::{Deserialize, Serialize};

/// A command sent from the exporter to the bridge process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Monotonically increasing request ID for correlating responses.
    pub id: u64,
    /// The command to execute.
    #[serde(flatten)]
    pub command: Command,
}

/// Commands the exporter can send to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "params")]
pub enum Command {
    /// Initialize COM and create a hidden Excel.Application instance.
    Init,

    /// Open an existing workbook from a file path (Windows path).
    OpenWorkbook { path: String },

    /// List the worksheets of a workbook, in tab order.
    ListSheets { workbook: u64 },

    /// Read the used range of a sheet.
    ReadUsedRange {
        workbook: u64,
        sheet: SheetRef,
        content: RangeContent,
    },

    /// Read every component of the workbook's VBA project.
    ListVbaComponents { workbook: u64 },

    /// Close a workbook without saving.
    CloseWorkbook { workbook: u64 },

    /// Shut down the bridge: close all workbooks, quit Excel, uninitialize COM.
    Shutdown,
}

/// A worksheet by 0-based index or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetRef {
    Index(u32),
    Name(String),
}

/// Which property of a range to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeContent {
    /// `Range.Value2`: what the cell evaluates to
    Values,
    /// `Range.Formula`: the formula text, or the constant for plain cells
    Formulas,
}

/// A cell value as read from Excel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Error(CellError),
}

/// Excel error values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellError {
    pub code: String,
}

/// A worksheet as listed by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInfo {
    /// 0-based tab position
    pub index: u32,
    pub name: String,
    /// VBA code name, e.g. `Sheet1`
    pub code_name: String,
}

/// Type of a VBA project component (`VBComponent.Type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VbaComponentType {
    StdModule,
    ClassModule,
    MsForm,
    Document,
    ActiveXDesigner,
}

impl VbaComponentType {
    /// Map a `vbext_ComponentType` value.
    pub fn from_vbext(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::StdModule),
            2 => Some(Self::ClassModule),
            3 => Some(Self::MsForm),
            11 => Some(Self::ActiveXDesigner),
            100 => Some(Self::Document),
            _ => None,
        }
    }
}

/// A VBA component and its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VbaComponentData {
    pub name: String,
    pub kind: VbaComponentType,
    /// Source text; empty when the module has no lines.
    pub code: String,
    /// Worksheet tab name, for document modules that belong to a sheet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
}

/// A response sent from the bridge back to the exporter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The request ID this response corresponds to.
    pub id: u64,
    /// The result of the command.
    #[serde(flatten)]
    pub result: ResponseResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ResponseResult {
    #[serde(rename = "ok")]
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<ResponseData>,
    },
    #[serde(rename = "error")]
    Error { message: String },
}

/// Data returned in successful responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseData {
    /// Handle to a newly opened workbook.
    WorkbookHandle { workbook: u64 },
    /// Worksheets of a workbook.
    Sheets { sheets: Vec<SheetInfo> },
    /// A used range: 1-based origin plus row-major cells.
    Range {
        first_row: u32,
        first_col: u32,
        rows: Vec<Vec<CellValue>>,
    },
    /// VBA project components.
    VbaComponents { components: Vec<VbaComponentData> },
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => write!(f, "<empty>"),
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Error(e) => write!(f, "{}", e.code),
        }
    }
}
