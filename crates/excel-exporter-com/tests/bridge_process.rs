//! Drives the client against a scripted stand-in for the bridge executable.
//!
//! The stand-in is a shell script launched through `sh` in place of WINE, so
//! these tests only run on Unix hosts.
#![cfg(unix)]

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use excel_exporter_com::{ExcelBridge, ExcelBridgeConfig};
use excel_exporter_core::args::{resolve, CommandRegistry};
use excel_exporter_core::{ExcelAutomation, ExportOptions, Exporter, OutputLayout};
use pretty_assertions::assert_eq;

const FAKE_BRIDGE: &str = r#"
while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed 's/^{"id":\([0-9]*\).*/\1/')
  case "$line" in
    *'"cmd":"Init"'*)
      printf '{"id":%s,"status":"ok"}\n' "$id" ;;
    *'"cmd":"OpenWorkbook"'*)
      printf '{"id":%s,"status":"ok","data":{"workbook":1}}\n' "$id" ;;
    *'"cmd":"ListSheets"'*)
      printf '{"id":%s,"status":"ok","data":{"sheets":[{"index":0,"name":"Budget","code_name":"Sheet1"}]}}\n' "$id" ;;
    *'"content":"values"'*)
      printf '{"id":%s,"status":"ok","data":{"first_row":1,"first_col":1,"rows":[["Item","Cost"],["Rent",1200.0]]}}\n' "$id" ;;
    *'"content":"formulas"'*)
      printf '{"id":%s,"status":"ok","data":{"first_row":1,"first_col":1,"rows":[["Item","Cost"],["Rent","=600*2"]]}}\n' "$id" ;;
    *'"cmd":"ListVbaComponents"'*)
      printf '{"id":%s,"status":"ok","data":{"components":[{"name":"Macros","kind":"std_module","code":"Sub Go()\\nEnd Sub"},{"name":"Sheet1","kind":"document","code":"","sheet_name":"Budget"}]}}\n' "$id" ;;
    *'"cmd":"CloseWorkbook"'*)
      printf '{"id":%s,"status":"ok"}\n' "$id" ;;
    *'"cmd":"Shutdown"'*)
      printf '{"id":%s,"status":"ok"}\n' "$id"
      exit 0 ;;
    *)
      printf '{"id":%s,"status":"error","message":"unknown command"}\n' "$id" ;;
  esac
done
"#;

fn fake_bridge(dir: &Path) -> ExcelBridgeConfig {
    let script = dir.join("fake-bridge.sh");
    std::fs::write(&script, FAKE_BRIDGE).unwrap();
    ExcelBridgeConfig {
        bridge_exe_path: Some(script),
        wine_path: Some(PathBuf::from("sh")),
        wine_prefix: None,
    }
}

/// A minimal workbook package carrying one ribbon part
fn write_workbook(path: &Path) {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(b"<workbook/>").unwrap();
        zip.start_file("customUI/customUI14.xml", options).unwrap();
        zip.write_all(b"<customUI/>").unwrap();
        zip.finish().unwrap();
    }
    std::fs::write(path, buf).unwrap();
}

#[test]
fn test_sheets_over_the_pipe() {
    let tmp = tempfile::tempdir().unwrap();
    let bridge = ExcelBridge::start(fake_bridge(tmp.path())).unwrap();

    let workbook = ExcelAutomation::open_workbook(&bridge, &tmp.path().join("book.xlsx")).unwrap();
    assert_eq!(workbook.id, 1);

    let sheets = bridge.sheets(&workbook).unwrap();
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].name, "Budget");

    let formulas = bridge.read_formulas(&workbook, &sheets[0]).unwrap();
    assert_eq!(formulas.last_row(), Some(2));
    assert_eq!(formulas.get(1, 1).map(ToString::to_string), Some("=600*2".into()));

    ExcelAutomation::close_workbook(&bridge, workbook).unwrap();
    bridge.shutdown().unwrap();
}

#[test]
fn test_full_export_through_bridge() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("budget.xlsm");
    write_workbook(&input);
    let out = tmp.path().join("out");

    let args = [
        input.to_string_lossy().into_owned(),
        "-od".into(),
        out.to_string_lossy().into_owned(),
        "-st".into(),
        "csv".into(),
    ];
    let resolution = resolve(&args, &CommandRegistry::standard());
    assert!(resolution.is_success(), "{}", resolution.message_log());

    let layout = OutputLayout::new(&resolution.config).unwrap();
    layout.create().unwrap();

    let bridge = ExcelBridge::start(fake_bridge(tmp.path())).unwrap();
    let summary = Exporter::new(&bridge, ExportOptions::default())
        .run(&resolution.config, &layout)
        .unwrap();
    bridge.shutdown().unwrap();

    assert!(summary.warnings.is_empty(), "{:?}", summary.warnings);
    let root = out.join("budget_internals");
    assert_eq!(
        std::fs::read_to_string(root.join("Sheets/Budget_formula.csv")).unwrap(),
        "Item,Cost\r\nRent,=600*2\r\n"
    );
    assert_eq!(
        std::fs::read_to_string(root.join("VBA/Modules/Macros.vba")).unwrap(),
        "Sub Go()\nEnd Sub"
    );
    assert_eq!(
        std::fs::read_to_string(root.join("RibbonX/customUI14.xml")).unwrap(),
        "<customUI/>"
    );
}

#[test]
fn test_bridge_error_is_reported() {
    let tmp = tempfile::tempdir().unwrap();
    let script = tmp.path().join("failing-bridge.sh");
    std::fs::write(
        &script,
        r#"read -r line; printf '{"id":1,"status":"error","message":"Excel is not installed"}\n'"#,
    )
    .unwrap();

    let config = ExcelBridgeConfig {
        bridge_exe_path: Some(script),
        wine_path: Some(PathBuf::from("sh")),
        wine_prefix: None,
    };
    let err = ExcelBridge::start(config).err().unwrap();
    assert!(err.to_string().contains("Excel is not installed"));
}

/// A bridge that fails `Init` and then lingers is killed and reaped
#[cfg(target_os = "linux")]
#[test]
fn test_failed_init_stops_bridge() {
    let tmp = tempfile::tempdir().unwrap();
    let pid_file = tmp.path().join("bridge.pid");
    let script = tmp.path().join("lingering-bridge.sh");
    std::fs::write(
        &script,
        format!(
            r#"echo $$ > '{}'; read -r line; printf '{{"id":1,"status":"error","message":"no Excel"}}\n'; exec sleep 30"#,
            pid_file.display()
        ),
    )
    .unwrap();

    let config = ExcelBridgeConfig {
        bridge_exe_path: Some(script),
        wine_path: Some(PathBuf::from("sh")),
        wine_prefix: None,
    };
    let err = ExcelBridge::start(config).err().unwrap();
    assert!(err.to_string().contains("no Excel"));

    let pid = std::fs::read_to_string(&pid_file).unwrap();
    let proc_entry = format!("/proc/{}", pid.trim());
    assert!(!Path::new(&proc_entry).exists(), "bridge {} still running", pid.trim());
}
