//! Excel automation for excel-exporter through a Windows COM bridge process.
//!
//! This crate spawns `excel-com-bridge.exe` (under WINE on Linux, directly on
//! Windows) and talks to it over JSON-over-stdio. [`ExcelBridge`] implements
//! [`ExcelAutomation`](excel_exporter_core::ExcelAutomation), so the export
//! pipeline can drive a real Excel instance.
//!
//! # Architecture
//!
//! ```text
//! excel-exporter (native)
//!     └── ExcelBridge (this crate)
//!           └── spawns: [wine] excel-com-bridge.exe
//!                 └── COM: Excel.Application
//! ```
//!
//! Ribbon XML does not need Excel and is copied from the workbook package
//! directly (see [`ribbon`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use excel_exporter_com::{ExcelBridge, ExcelBridgeConfig};
//! use excel_exporter_core::ExcelAutomation;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bridge = ExcelBridge::start(ExcelBridgeConfig::from_env())?;
//!     let wb = ExcelAutomation::open_workbook(&bridge, "report.xlsm".as_ref())?;
//!     for sheet in bridge.sheets(&wb)? {
//!         let grid = bridge.read_values(&wb, &sheet)?;
//!         println!("{}: {} rows", sheet.name, grid.row_count());
//!     }
//!     ExcelAutomation::close_workbook(&bridge, wb)?;
//!     bridge.shutdown()?;
//!     Ok(())
//! }
//! ```

mod automation;
mod bridge;
pub mod ribbon;

pub use bridge::{linux_to_wine_path, BridgeError, ExcelBridge, ExcelBridgeConfig, BRIDGE_ENV, WINE_ENV};
pub use ribbon::{extract_ribbon_parts, RibbonError};
