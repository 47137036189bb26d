//! Bridge process for excel-exporter: reads workbooks through Excel's COM
//! automation interface, driven by JSON commands over stdin/stdout.
//!
//! Cross-compiled for Windows; on Linux it runs under WINE.
//!
//! One JSON object per line in each direction. Requests arrive on stdin,
//! responses leave on stdout, and diagnostics go to stderr only.

#[cfg(windows)]
mod dispatch;
#[cfg(windows)]
mod excel;

#[cfg(not(windows))]
fn main() {
    eprintln!("excel-com-bridge must be compiled for Windows (--target x86_64-pc-windows-gnu)");
    eprintln!("and run under WINE on Linux.");
    std::process::exit(1);
}

#[cfg(windows)]
fn main() {
    use std::io::{self, BufRead};

    use excel_com_protocol::{Command, Request, Response, ResponseResult};

    eprintln!("[excel-com-bridge] Starting up...");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut excel: Option<excel::ExcelApp> = None;

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("[excel-com-bridge] stdin read error: {e}");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("[excel-com-bridge] JSON parse error: {e} in {line}");
                // The id is unknown, so the reply carries 0
                let reply = Response {
                    id: 0,
                    result: ResponseResult::Error {
                        message: format!("JSON parse error: {e}"),
                    },
                };
                if !send(&mut out, &reply) {
                    break;
                }
                continue;
            }
        };

        let response = handle_command(&mut excel, &request);
        if !send(&mut out, &response) {
            break;
        }

        if matches!(request.command, Command::Shutdown)
            && matches!(response.result, ResponseResult::Ok { .. })
        {
            eprintln!("[excel-com-bridge] Shutdown complete, exiting.");
            break;
        }
    }

    // stdin closed without a Shutdown
    if let Some(app) = excel {
        eprintln!("[excel-com-bridge] stdin closed, shutting down Excel...");
        let _ = app.shutdown();
    }

    eprintln!("[excel-com-bridge] Process exiting.");
}

/// Write one response line. `false` once the client has gone away.
#[cfg(windows)]
fn send(out: &mut impl std::io::Write, response: &excel_com_protocol::Response) -> bool {
    let json = match serde_json::to_string(response) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("[excel-com-bridge] cannot serialize response: {e}");
            return true;
        }
    };
    writeln!(out, "{json}").and_then(|()| out.flush()).is_ok()
}

#[cfg(windows)]
fn handle_command(
    excel: &mut Option<excel::ExcelApp>,
    request: &excel_com_protocol::Request,
) -> excel_com_protocol::Response {
    use excel_com_protocol::*;

    let id = request.id;

    let result = match &request.command {
        Command::Init => init_com_and_excel(excel),
        Command::OpenWorkbook { path } => with_excel(excel, |app| {
            let handle = app.open_workbook(path)?;
            Ok(Some(ResponseData::WorkbookHandle { workbook: handle }))
        }),
        Command::ListSheets { workbook } => with_excel(excel, |app| {
            let sheets = app.list_sheets(*workbook)?;
            Ok(Some(ResponseData::Sheets { sheets }))
        }),
        Command::ReadUsedRange {
            workbook,
            sheet,
            content,
        } => with_excel(excel, |app| {
            let (first_row, first_col, rows) = app.read_used_range(*workbook, sheet, *content)?;
            Ok(Some(ResponseData::Range {
                first_row,
                first_col,
                rows,
            }))
        }),
        Command::ListVbaComponents { workbook } => with_excel(excel, |app| {
            let components = app.list_vba_components(*workbook)?;
            Ok(Some(ResponseData::VbaComponents { components }))
        }),
        Command::CloseWorkbook { workbook } => with_excel(excel, |app| {
            app.close_workbook(*workbook)?;
            Ok(None)
        }),
        Command::Shutdown => match excel.take() {
            Some(app) => match app.shutdown() {
                Ok(()) => {
                    uninit_com();
                    ResponseResult::Ok { data: None }
                }
                Err(e) => ResponseResult::Error {
                    message: format!("Shutdown failed: {e}"),
                },
            },
            None => ResponseResult::Ok { data: None },
        },
    };

    Response { id, result }
}

#[cfg(windows)]
fn init_com_and_excel(excel: &mut Option<excel::ExcelApp>) -> excel_com_protocol::ResponseResult {
    use excel_com_protocol::ResponseResult;
    use windows::Win32::System::Com::{CoInitializeEx, COINIT_APARTMENTTHREADED};

    if excel.is_some() {
        return ResponseResult::Ok { data: None }; // Already initialized
    }

    // Initialize COM in Single-Threaded Apartment mode (required by Excel)
    unsafe {
        let hr = CoInitializeEx(None, COINIT_APARTMENTTHREADED);
        if let Err(e) = hr.ok() {
            return ResponseResult::Error {
                message: format!("CoInitializeEx failed: {e}"),
            };
        }
    }

    eprintln!("[excel-com-bridge] COM initialized (STA)");

    match excel::ExcelApp::new() {
        Ok(app) => {
            eprintln!("[excel-com-bridge] Excel.Application created successfully");
            *excel = Some(app);
            ResponseResult::Ok { data: None }
        }
        Err(e) => ResponseResult::Error {
            message: format!("Failed to create Excel.Application: {e}"),
        },
    }
}

#[cfg(windows)]
fn uninit_com() {
    unsafe {
        windows::Win32::System::Com::CoUninitialize();
    }
    eprintln!("[excel-com-bridge] COM uninitialized");
}

#[cfg(windows)]
fn with_excel(
    excel: &mut Option<excel::ExcelApp>,
    f: impl FnOnce(&mut excel::ExcelApp) -> Result<Option<excel_com_protocol::ResponseData>, String>,
) -> excel_com_protocol::ResponseResult {
    match excel.as_mut() {
        Some(app) => match f(app) {
            Ok(data) => excel_com_protocol::ResponseResult::Ok { data },
            Err(e) => excel_com_protocol::ResponseResult::Error { message: e },
        },
        None => excel_com_protocol::ResponseResult::Error {
            message: "Excel not initialized. Send 'Init' command first.".to_string(),
        },
    }
}
