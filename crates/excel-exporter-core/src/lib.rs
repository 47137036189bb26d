//! # excel-exporter-core
//!
//! Everything in excel-exporter that does not need Excel itself:
//!
//! - [`args`]: resolving command-line tokens into a [`ParsedConfiguration`]
//! - [`layout`]: the output directory skeleton
//! - [`export`]: the pipeline that writes sheets, VBA and ribbon XML
//! - [`automation`]: the [`ExcelAutomation`] trait a host implements
//!
//! ```no_run
//! use excel_exporter_core::args::{resolve, CommandRegistry};
//! use excel_exporter_core::OutputLayout;
//!
//! let args: Vec<String> = std::env::args().skip(1).collect();
//! let resolution = resolve(&args, &CommandRegistry::standard());
//! if !resolution.is_success() {
//!     println!("{}", resolution.message_log());
//!     return;
//! }
//! let layout = OutputLayout::new(&resolution.config).unwrap();
//! layout.create().unwrap();
//! ```

pub mod args;
pub mod automation;
pub mod config;
pub mod error;
pub mod export;
pub mod layout;
pub mod vba;

pub use automation::{
    CellValue, ExcelAutomation, Grid, SheetHandle, VbaComponent, VbaComponentKind, WorkbookHandle,
};
pub use config::{FileType, ParsedConfiguration, SaveType};
pub use error::{
    ArgumentError, AutomationError, AutomationResult, ExportError, ExportResult, RegistryError,
};
pub use export::{ExportOptions, ExportSummary, Exporter};
pub use layout::OutputLayout;

/// Version reported by `--version`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
