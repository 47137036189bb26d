//! CSV output for worksheet grids

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::automation::Grid;
use crate::error::ExportResult;

/// Options for writing CSV files
#[derive(Debug, Clone)]
pub struct CsvWriteOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Line terminator
    pub line_terminator: LineTerminator,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            line_terminator: LineTerminator::CRLF,
        }
    }
}

/// Line terminator type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    /// Unix-style (LF)
    LF,
    /// Windows-style (CRLF)
    CRLF,
}

/// Write a grid to a CSV file
pub fn write_grid_file<P: AsRef<Path>>(
    grid: &Grid,
    path: P,
    options: &CsvWriteOptions,
) -> ExportResult<()> {
    let file = File::create(path)?;
    write_grid(grid, file, options)
}

/// Write a grid to a writer.
///
/// Short rows are padded so every record has the grid's full width.
pub fn write_grid<W: Write>(grid: &Grid, writer: W, options: &CsvWriteOptions) -> ExportResult<()> {
    let terminator = match options.line_terminator {
        LineTerminator::LF => csv::Terminator::Any(b'\n'),
        LineTerminator::CRLF => csv::Terminator::CRLF,
    };

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .quote(options.quote)
        .terminator(terminator)
        .from_writer(writer);

    let width = grid.col_count();
    for row in &grid.rows {
        let mut record: Vec<String> = row.iter().map(ToString::to_string).collect();
        record.resize(width, String::new());
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}
