//! Subprocess management and JSON IPC for the bridge process.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use excel_com_protocol::{
    Command as BridgeCommand, RangeContent, Request, Response, ResponseData, ResponseResult,
    SheetInfo, SheetRef, VbaComponentData,
};

/// Errors from the Excel COM bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Failed to spawn bridge process: {0}")]
    SpawnFailed(#[from] std::io::Error),

    #[error("Bridge process not running")]
    NotRunning,

    #[error("Failed to send command to bridge: {0}")]
    SendFailed(String),

    #[error("Failed to read response from bridge: {0}")]
    ReadFailed(String),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Bridge returned error: {0}")]
    BridgeError(String),

    #[error("Unexpected response data")]
    UnexpectedResponse,

    #[error("Response id {got} does not match request id {expected}")]
    IdMismatch { expected: u64, got: u64 },

    #[error("WINE not found. Install WINE and ensure 'wine' is in PATH.")]
    WineNotFound,

    #[error("Bridge executable not found at: {0}")]
    BridgeExeNotFound(String),
}

/// Environment variable overriding the bridge executable path.
pub const BRIDGE_ENV: &str = "EXCEL_EXPORTER_BRIDGE";
/// Environment variable overriding the WINE launcher.
pub const WINE_ENV: &str = "EXCEL_EXPORTER_WINE";

const BRIDGE_EXE: &str = "excel-com-bridge.exe";

/// Configuration for the Excel COM bridge.
#[derive(Debug, Clone)]
pub struct ExcelBridgeConfig {
    /// Path to the `excel-com-bridge.exe` Windows executable.
    /// If None, will search in common locations relative to the current binary.
    pub bridge_exe_path: Option<PathBuf>,

    /// Launcher for the bridge. `None` runs the executable directly, which is
    /// what a Windows host wants; elsewhere this is `wine`.
    pub wine_path: Option<PathBuf>,

    /// Optional WINEPREFIX to use (for isolating the WINE environment).
    pub wine_prefix: Option<PathBuf>,
}

impl Default for ExcelBridgeConfig {
    fn default() -> Self {
        Self {
            bridge_exe_path: None,
            wine_path: (!cfg!(windows)).then(|| PathBuf::from("wine")),
            wine_prefix: None,
        }
    }
}

impl ExcelBridgeConfig {
    /// Defaults, overridden by `EXCEL_EXPORTER_BRIDGE`, `EXCEL_EXPORTER_WINE`
    /// and `WINEPREFIX` when set.
    pub fn from_env() -> Self {
        let var = |name: &str| {
            std::env::var_os(name)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };

        let mut config = Self::default();
        if let Some(exe) = var(BRIDGE_ENV) {
            config.bridge_exe_path = Some(exe);
        }
        if let Some(wine) = var(WINE_ENV) {
            config.wine_path = Some(wine);
        }
        config.wine_prefix = var("WINEPREFIX");
        config
    }
}

/// The main handle for communicating with the Excel COM bridge.
///
/// This manages the bridge subprocess lifecycle and provides one method per
/// protocol command.
pub struct ExcelBridge {
    child: Mutex<Child>,
    stdin: Mutex<std::process::ChildStdin>,
    stdout: Mutex<BufReader<std::process::ChildStdout>>,
    next_id: AtomicU64,
    via_wine: bool,
}

impl ExcelBridge {
    /// Start the bridge process and initialize Excel.
    pub fn start(config: ExcelBridgeConfig) -> Result<Self, BridgeError> {
        let exe_path = config.bridge_exe_path.unwrap_or_else(find_bridge_exe);

        if !exe_path.exists() {
            return Err(BridgeError::BridgeExeNotFound(
                exe_path.display().to_string(),
            ));
        }

        let via_wine = config.wine_path.is_some();
        let mut cmd = match &config.wine_path {
            Some(wine) => {
                let mut cmd = std::process::Command::new(wine);
                cmd.arg(&exe_path);
                cmd
            }
            None => std::process::Command::new(&exe_path),
        };

        if let Some(prefix) = &config.wine_prefix {
            cmd.env("WINEPREFIX", prefix);
        }

        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::inherit()); // Bridge diagnostics go to our stderr

        tracing::debug!(exe = %exe_path.display(), via_wine, "spawning bridge");
        let mut child = cmd.spawn().map_err(|e| {
            if via_wine && e.kind() == std::io::ErrorKind::NotFound {
                BridgeError::WineNotFound
            } else {
                BridgeError::SpawnFailed(e)
            }
        })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(BridgeError::NotRunning);
        };

        let bridge = Self {
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            next_id: AtomicU64::new(1),
            via_wine,
        };

        // Initialize COM and Excel; a bridge that cannot is not left running
        if let Err(e) = bridge.send_command(BridgeCommand::Init) {
            tracing::warn!("Excel bridge failed to initialize: {e}");
            if let Ok(mut child) = bridge.child.lock() {
                let _ = child.kill();
                let _ = child.wait();
            }
            return Err(e);
        }

        Ok(bridge)
    }

    /// Send a command to the bridge and wait for the response.
    fn send_command(&self, command: BridgeCommand) -> Result<Option<ResponseData>, BridgeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let request = Request { id, command };
        let json = serde_json::to_string(&request)?;
        tracing::trace!("bridge <- {json}");

        // Send the request
        {
            let mut stdin = self.stdin.lock().map_err(|_| BridgeError::NotRunning)?;
            writeln!(stdin, "{json}").map_err(|e| BridgeError::SendFailed(e.to_string()))?;
            stdin
                .flush()
                .map_err(|e| BridgeError::SendFailed(e.to_string()))?;
        }

        // Read the response
        let response: Response = {
            let mut stdout = self.stdout.lock().map_err(|_| BridgeError::NotRunning)?;
            let mut line = String::new();
            stdout
                .read_line(&mut line)
                .map_err(|e| BridgeError::ReadFailed(e.to_string()))?;

            if line.is_empty() {
                return Err(BridgeError::NotRunning);
            }
            tracing::trace!("bridge -> {}", line.trim_end());

            serde_json::from_str(&line)?
        };

        if response.id != id {
            return Err(BridgeError::IdMismatch {
                expected: id,
                got: response.id,
            });
        }

        match response.result {
            ResponseResult::Ok { data } => Ok(data),
            ResponseResult::Error { message } => Err(BridgeError::BridgeError(message)),
        }
    }

    /// Path of a local file as the bridge process sees it.
    pub fn host_path(&self, path: &Path) -> String {
        if self.via_wine {
            linux_to_wine_path(path)
        } else {
            absolute(path).display().to_string()
        }
    }

    /// Open an existing workbook. Returns the bridge's handle for it.
    pub fn open_workbook(&self, path: &Path) -> Result<u64, BridgeError> {
        let data = self.send_command(BridgeCommand::OpenWorkbook {
            path: self.host_path(path),
        })?;
        match data {
            Some(ResponseData::WorkbookHandle { workbook }) => Ok(workbook),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Worksheets of an open workbook, in tab order.
    pub fn list_sheets(&self, workbook: u64) -> Result<Vec<SheetInfo>, BridgeError> {
        match self.send_command(BridgeCommand::ListSheets { workbook })? {
            Some(ResponseData::Sheets { sheets }) => Ok(sheets),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Used range of a sheet as `(first_row, first_col, rows)`.
    pub fn read_used_range(
        &self,
        workbook: u64,
        sheet: SheetRef,
        content: RangeContent,
    ) -> Result<(u32, u32, Vec<Vec<excel_com_protocol::CellValue>>), BridgeError> {
        let data = self.send_command(BridgeCommand::ReadUsedRange {
            workbook,
            sheet,
            content,
        })?;
        match data {
            Some(ResponseData::Range {
                first_row,
                first_col,
                rows,
            }) => Ok((first_row, first_col, rows)),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Every component of the workbook's VBA project.
    pub fn list_vba_components(&self, workbook: u64) -> Result<Vec<VbaComponentData>, BridgeError> {
        match self.send_command(BridgeCommand::ListVbaComponents { workbook })? {
            Some(ResponseData::VbaComponents { components }) => Ok(components),
            _ => Err(BridgeError::UnexpectedResponse),
        }
    }

    /// Close a workbook without saving.
    pub fn close_workbook(&self, workbook: u64) -> Result<(), BridgeError> {
        self.send_command(BridgeCommand::CloseWorkbook { workbook })?;
        Ok(())
    }

    /// Shut down the bridge: close all workbooks, quit Excel, and terminate the process.
    pub fn shutdown(self) -> Result<(), BridgeError> {
        let _ = self.send_command(BridgeCommand::Shutdown);

        // Wait for the child process to exit
        let mut child = self.child.lock().map_err(|_| BridgeError::NotRunning)?;
        let _ = child.wait();

        Ok(())
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_default().join(path)
    }
}

/// Convert a Linux filesystem path to a WINE (Windows) path.
///
/// WINE maps `/` to `Z:\`, so `/home/user/file.xlsx` becomes `Z:\home\user\file.xlsx`.
pub fn linux_to_wine_path(linux_path: &Path) -> String {
    format!("Z:{}", absolute(linux_path).display()).replace('/', "\\")
}

/// Attempt to locate the bridge exe relative to the current executable or in common paths.
fn find_bridge_exe() -> PathBuf {
    // Check next to the current executable
    if let Ok(mut exe) = std::env::current_exe() {
        exe.pop();
        let candidate = exe.join(BRIDGE_EXE);
        if candidate.exists() {
            return candidate;
        }
    }

    // Check in the target directory (for development)
    for profile in ["release", "debug"] {
        let target_path = PathBuf::from(format!("target/x86_64-pc-windows-gnu/{profile}/{BRIDGE_EXE}"));
        if target_path.exists() {
            return target_path;
        }
    }

    // Default: assume it's in the current directory
    PathBuf::from(BRIDGE_EXE)
}
