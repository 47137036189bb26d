//! Export pipeline: drives an [`ExcelAutomation`] host and writes its output
//! into an [`OutputLayout`].

mod csv_writer;
mod json_writer;

pub use csv_writer::{write_grid, write_grid_file, CsvWriteOptions, LineTerminator};
pub use json_writer::{column_letters, WorkbookDocument};

use std::path::PathBuf;

use crate::automation::{ExcelAutomation, SheetHandle, WorkbookHandle};
use crate::config::{ParsedConfiguration, SaveType};
use crate::error::{ExportError, ExportResult};
use crate::layout::OutputLayout;

/// Tunables for an export run
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// CSV formatting, used when saving as CSV
    pub csv: CsvWriteOptions,
    /// Export the VBA project of macro-enabled workbooks
    pub export_vba: bool,
    /// Export custom ribbon XML parts
    pub export_ribbon: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            csv: CsvWriteOptions::default(),
            export_vba: true,
            export_ribbon: true,
        }
    }
}

/// What an export run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub sheets_exported: usize,
    pub files_written: Vec<PathBuf>,
    /// Non-fatal problems (VBA or ribbon export failing, for instance)
    pub warnings: Vec<String>,
}

/// Runs one export against an automation host
pub struct Exporter<'a, A: ExcelAutomation + ?Sized> {
    automation: &'a A,
    options: ExportOptions,
}

impl<'a, A: ExcelAutomation + ?Sized> Exporter<'a, A> {
    pub fn new(automation: &'a A, options: ExportOptions) -> Self {
        Self {
            automation,
            options,
        }
    }

    /// Export the configured workbook into `layout`.
    ///
    /// The layout's directories must already exist. The workbook is closed
    /// afterwards whether or not the export succeeded.
    pub fn run(
        &self,
        config: &ParsedConfiguration,
        layout: &OutputLayout,
    ) -> ExportResult<ExportSummary> {
        let input = config
            .input_path()
            .ok_or(ExportError::IncompleteConfiguration("input file"))?;

        tracing::info!("Opening workbook {}", input.display());
        let workbook = self.automation.open_workbook(input)?;

        let result = self.export_workbook(&workbook, config, layout);

        if let Err(e) = self.automation.close_workbook(workbook) {
            tracing::warn!("Failed to close workbook: {e}");
        }

        result
    }

    fn export_workbook(
        &self,
        workbook: &WorkbookHandle,
        config: &ParsedConfiguration,
        layout: &OutputLayout,
    ) -> ExportResult<ExportSummary> {
        let mut summary = ExportSummary::default();
        let sheets = self.automation.sheets(workbook)?;

        match config.save_type_or_default() {
            SaveType::Csv => {
                for sheet in &sheets {
                    self.export_sheet_csv(workbook, sheet, layout, &mut summary)?;
                }
            }
            SaveType::Json => {
                self.export_json(workbook, &sheets, config, layout, &mut summary)?;
            }
        }

        if self.options.export_vba && layout.has_vba() {
            match self
                .automation
                .export_vba_modules(workbook, &layout.vba_dir())
            {
                Ok(files) => summary.files_written.extend(files),
                Err(e) => summary.warn(format!("Could not export VBA code: {e}")),
            }
        }

        if self.options.export_ribbon {
            match self
                .automation
                .export_ribbon_xml(workbook, &layout.ribbon_dir())
            {
                Ok(files) if files.is_empty() => tracing::info!("No ribbon XML parts found."),
                Ok(files) => summary.files_written.extend(files),
                Err(e) => summary.warn(format!("Could not export ribbon XML: {e}")),
            }
        }

        Ok(summary)
    }

    fn export_sheet_csv(
        &self,
        workbook: &WorkbookHandle,
        sheet: &SheetHandle,
        layout: &OutputLayout,
        summary: &mut ExportSummary,
    ) -> ExportResult<()> {
        tracing::info!("Exporting worksheet '{}'...", sheet.name);
        let sheets_dir = layout.sheets_dir();

        let values = self.automation.read_values(workbook, sheet)?;
        let display_path = sheets_dir.join(format!("{}_display.csv", sheet.name));
        write_grid_file(&values, &display_path, &self.options.csv)?;
        summary.files_written.push(display_path);

        let formulas = self.automation.read_formulas(workbook, sheet)?;
        let formula_path = sheets_dir.join(format!("{}_formula.csv", sheet.name));
        write_grid_file(&formulas, &formula_path, &self.options.csv)?;
        summary.files_written.push(formula_path);

        summary.sheets_exported += 1;
        Ok(())
    }

    fn export_json(
        &self,
        workbook: &WorkbookHandle,
        sheets: &[SheetHandle],
        config: &ParsedConfiguration,
        layout: &OutputLayout,
        summary: &mut ExportSummary,
    ) -> ExportResult<()> {
        let name = config
            .output_name
            .as_deref()
            .ok_or(ExportError::IncompleteConfiguration("output name"))?;
        let file_type = config
            .file_type
            .ok_or(ExportError::IncompleteConfiguration("file type"))?;

        let mut document = WorkbookDocument::new(name, file_type);
        for sheet in sheets {
            tracing::info!("Exporting worksheet '{}'...", sheet.name);
            let values = self.automation.read_values(workbook, sheet)?;
            let formulas = self.automation.read_formulas(workbook, sheet)?;
            document.add_sheet(sheet, &values, &formulas);
            summary.sheets_exported += 1;
        }

        let path = layout.sheets_dir().join(format!("{name}.json"));
        document.write_file(&path)?;
        summary.files_written.push(path);
        Ok(())
    }
}

impl ExportSummary {
    fn warn(&mut self, message: String) {
        tracing::warn!("{message}");
        self.warnings.push(message);
    }
}
