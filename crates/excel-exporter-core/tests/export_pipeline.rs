//! Export pipeline tests against an in-memory automation host

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use excel_exporter_core::args::{resolve, CommandRegistry};
use excel_exporter_core::vba::{write_vba_components, DEFAULT_VBA_EXTENSION};
use excel_exporter_core::{
    AutomationError, AutomationResult, CellValue, ExcelAutomation, ExportOptions, Exporter, Grid,
    OutputLayout, ParsedConfiguration, SheetHandle, VbaComponent, VbaComponentKind,
    WorkbookHandle,
};
use pretty_assertions::assert_eq;

/// Records calls and serves canned sheets
#[derive(Default)]
struct FakeExcel {
    sheets: Vec<(SheetHandle, Grid, Grid)>,
    vba: Vec<VbaComponent>,
    fail_vba: bool,
    fail_sheets: bool,
    calls: RefCell<Vec<String>>,
}

impl FakeExcel {
    fn with_budget_sheet() -> Self {
        let values = Grid::new(
            1,
            1,
            vec![
                vec![CellValue::Text("Item".into()), CellValue::Text("Cost".into())],
                vec![CellValue::Text("Rent".into()), CellValue::Number(1200.0)],
                vec![CellValue::Text("Total".into()), CellValue::Number(1200.0)],
            ],
        );
        let formulas = Grid::new(
            1,
            1,
            vec![
                vec![CellValue::Text("Item".into()), CellValue::Text("Cost".into())],
                vec![CellValue::Text("Rent".into()), CellValue::Text("1200".into())],
                vec![CellValue::Text("Total".into()), CellValue::Text("=SUM(B2:B2)".into())],
            ],
        );
        Self {
            sheets: vec![(
                SheetHandle {
                    index: 0,
                    name: "Budget".into(),
                    code_name: "Sheet1".into(),
                },
                values,
                formulas,
            )],
            vba: vec![VbaComponent {
                name: "Macros".into(),
                kind: VbaComponentKind::StandardModule,
                code: "Sub Recalc()\nEnd Sub\n".into(),
                sheet_name: None,
            }],
            ..Default::default()
        }
    }

    fn log(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn sheet(&self, sheet: &SheetHandle) -> AutomationResult<&(SheetHandle, Grid, Grid)> {
        self.sheets
            .iter()
            .find(|(s, _, _)| s.name == sheet.name)
            .ok_or_else(|| AutomationError::host(format!("no sheet {}", sheet.name)))
    }
}

impl ExcelAutomation for FakeExcel {
    fn open_workbook(&self, path: &Path) -> AutomationResult<WorkbookHandle> {
        self.log(format!("open {}", path.display()));
        Ok(WorkbookHandle {
            id: 7,
            path: path.to_path_buf(),
        })
    }

    fn sheets(&self, _workbook: &WorkbookHandle) -> AutomationResult<Vec<SheetHandle>> {
        self.log("sheets");
        if self.fail_sheets {
            return Err(AutomationError::host("Excel crashed"));
        }
        Ok(self.sheets.iter().map(|(s, _, _)| s.clone()).collect())
    }

    fn read_values(&self, _wb: &WorkbookHandle, sheet: &SheetHandle) -> AutomationResult<Grid> {
        self.log(format!("values {}", sheet.name));
        Ok(self.sheet(sheet)?.1.clone())
    }

    fn read_formulas(&self, _wb: &WorkbookHandle, sheet: &SheetHandle) -> AutomationResult<Grid> {
        self.log(format!("formulas {}", sheet.name));
        Ok(self.sheet(sheet)?.2.clone())
    }

    fn export_vba_modules(
        &self,
        _workbook: &WorkbookHandle,
        dir: &Path,
    ) -> AutomationResult<Vec<PathBuf>> {
        self.log("vba");
        if self.fail_vba {
            return Err(AutomationError::host("Programmatic access to VBA project is not trusted"));
        }
        Ok(write_vba_components(dir, &self.vba, DEFAULT_VBA_EXTENSION)?)
    }

    fn export_ribbon_xml(
        &self,
        _workbook: &WorkbookHandle,
        _dir: &Path,
    ) -> AutomationResult<Vec<PathBuf>> {
        self.log("ribbon");
        Ok(Vec::new())
    }

    fn close_workbook(&self, workbook: WorkbookHandle) -> AutomationResult<()> {
        self.log(format!("close {}", workbook.id));
        Ok(())
    }
}

fn resolved(args: &[&str]) -> ParsedConfiguration {
    let resolution = resolve(args, &CommandRegistry::standard());
    assert!(resolution.is_success(), "{}", resolution.message_log());
    resolution.config
}

fn prepare(config: &ParsedConfiguration) -> OutputLayout {
    let layout = OutputLayout::new(config).unwrap();
    layout.create().unwrap();
    layout
}

#[test]
fn test_csv_export() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().to_str().unwrap();
    let config = resolved(&["budget.xlsm", "-od", out, "-st", "csv"]);
    let layout = prepare(&config);
    let excel = FakeExcel::with_budget_sheet();

    let summary = Exporter::new(&excel, ExportOptions::default())
        .run(&config, &layout)
        .unwrap();

    assert_eq!(summary.sheets_exported, 1);
    assert!(summary.warnings.is_empty());

    let sheets = tmp.path().join("budget_internals").join("Sheets");
    assert_eq!(
        std::fs::read_to_string(sheets.join("Budget_display.csv")).unwrap(),
        "Item,Cost\r\nRent,1200\r\nTotal,1200\r\n"
    );
    assert_eq!(
        std::fs::read_to_string(sheets.join("Budget_formula.csv")).unwrap(),
        "Item,Cost\r\nRent,1200\r\nTotal,=SUM(B2:B2)\r\n"
    );
    assert!(tmp
        .path()
        .join("budget_internals/VBA/Modules/Macros.vba")
        .is_file());

    assert_eq!(
        *excel.calls.borrow(),
        vec![
            "open budget.xlsm",
            "sheets",
            "values Budget",
            "formulas Budget",
            "vba",
            "ribbon",
            "close 7",
        ]
    );
}

#[test]
fn test_json_export() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().to_str().unwrap();
    let config = resolved(&["budget.xlsm", "--outputDir", out, "--outputName", "q1"]);
    let layout = prepare(&config);
    let excel = FakeExcel::with_budget_sheet();

    let summary = Exporter::new(&excel, ExportOptions::default())
        .run(&config, &layout)
        .unwrap();

    let json_path = tmp.path().join("q1_internals/Sheets/q1.json");
    assert!(summary.files_written.contains(&json_path));

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(doc["name"], "q1");
    assert_eq!(doc["fileType"], "xlsm");
    assert_eq!(doc["sheets"]["Budget"]["lastRow"], 3);
    assert_eq!(
        doc["sheets"]["Budget"]["values"]["B"]["3"]["formulaVal"],
        "=SUM(B2:B2)"
    );
    assert_eq!(
        doc["sheets"]["Budget"]["values"]["B"]["3"]["displayedVal"],
        1200.0
    );
}

#[test]
fn test_plain_workbook_skips_vba() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().to_str().unwrap();
    let config = resolved(&["plain.xlsx", "-od", out]);
    let layout = prepare(&config);
    let excel = FakeExcel::with_budget_sheet();

    Exporter::new(&excel, ExportOptions::default())
        .run(&config, &layout)
        .unwrap();

    assert!(!excel.calls.borrow().iter().any(|c| c == "vba"));
    assert!(!tmp.path().join("plain_internals/VBA").exists());
}

#[test]
fn test_vba_failure_is_a_warning() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().to_str().unwrap();
    let config = resolved(&["budget.xlsm", "-od", out]);
    let layout = prepare(&config);
    let excel = FakeExcel {
        fail_vba: true,
        ..FakeExcel::with_budget_sheet()
    };

    let summary = Exporter::new(&excel, ExportOptions::default())
        .run(&config, &layout)
        .unwrap();

    assert_eq!(summary.warnings.len(), 1);
    assert!(summary.warnings[0].contains("not trusted"));
}

#[test]
fn test_workbook_closed_after_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().to_str().unwrap();
    let config = resolved(&["budget.xlsm", "-od", out]);
    let layout = prepare(&config);
    let excel = FakeExcel {
        fail_sheets: true,
        ..FakeExcel::with_budget_sheet()
    };

    let err = Exporter::new(&excel, ExportOptions::default())
        .run(&config, &layout)
        .unwrap_err();

    assert!(err.to_string().contains("Excel crashed"));
    assert_eq!(excel.calls.borrow().last().map(String::as_str), Some("close 7"));
}

#[test]
fn test_layout_create_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().to_str().unwrap();
    let config = resolved(&["budget.xlsm", "-od", out]);
    let layout = prepare(&config);

    let marker = layout.sheets_dir().join("keep.txt");
    std::fs::write(&marker, "kept").unwrap();
    layout.create().unwrap();

    assert_eq!(std::fs::read_to_string(marker).unwrap(), "kept");
    for dir in layout.directories() {
        assert!(dir.is_dir(), "{} missing", dir.display());
    }
}
