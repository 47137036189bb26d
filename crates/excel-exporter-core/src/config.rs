//! Resolved configuration and the fixed value sets it draws from

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Workbook formats the exporter accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    /// Workbook (`.xlsx`)
    Xlsx,
    /// Template (`.xltx`)
    Xltx,
    /// Macro-enabled workbook (`.xlsm`)
    Xlsm,
    /// Macro-enabled template (`.xltm`)
    Xltm,
    /// Add-in (`.xlam`)
    Xlam,
}

impl FileType {
    /// Every accepted file type, in display order
    pub const ALL: [FileType; 5] = [
        FileType::Xlsx,
        FileType::Xltx,
        FileType::Xlsm,
        FileType::Xltm,
        FileType::Xlam,
    ];

    /// Lowercase extension without the dot
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Xlsx => "xlsx",
            FileType::Xltx => "xltx",
            FileType::Xlsm => "xlsm",
            FileType::Xltm => "xltm",
            FileType::Xlam => "xlam",
        }
    }

    /// Whether workbooks of this type can carry a VBA project
    pub fn is_macro_enabled(&self) -> bool {
        matches!(self, FileType::Xlsm | FileType::Xltm | FileType::Xlam)
    }

    /// Comma-separated list of accepted values, for messages
    pub fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(FileType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Derive the file type from a path's extension.
    ///
    /// The extension is the text after the final `.`, with surrounding quote
    /// characters trimmed, compared case-insensitively.
    pub fn detect(path: &str) -> Result<Self, String> {
        let extension = extension_of(path);
        extension.parse().map_err(|_| extension)
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| s.to_string())
    }
}

/// Output format for worksheet data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SaveType {
    /// One CSV file per sheet for displayed values and one for formulas
    Csv,
    /// A single JSON document for the whole workbook
    #[default]
    Json,
}

impl SaveType {
    /// Every accepted save type
    pub const ALL: [SaveType; 2] = [SaveType::Csv, SaveType::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            SaveType::Csv => "csv",
            SaveType::Json => "json",
        }
    }

    pub fn allowed_values() -> String {
        Self::ALL
            .iter()
            .map(SaveType::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SaveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| s.to_string())
    }
}

/// The accumulating result of one resolution pass.
///
/// Fields start unset and are filled in by command handlers. After a
/// successful pass every field is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConfiguration {
    pub input_file_path: Option<String>,
    pub file_type: Option<FileType>,
    pub output_dir: Option<PathBuf>,
    pub output_name: Option<String>,
    pub save_type: Option<SaveType>,
}

impl ParsedConfiguration {
    /// Input path with surrounding quotes removed
    pub fn input_path(&self) -> Option<&Path> {
        self.input_file_path.as_deref().map(|p| Path::new(trim_quotes(p)))
    }

    /// Save type, falling back to the default when unset
    pub fn save_type_or_default(&self) -> SaveType {
        self.save_type.unwrap_or_default()
    }

    /// True once the input, file type, output dir and name are all present
    pub fn is_complete(&self) -> bool {
        self.input_file_path.as_deref().is_some_and(|s| !s.is_empty())
            && self.file_type.is_some()
            && self
                .output_dir
                .as_deref()
                .is_some_and(|p| !p.as_os_str().is_empty())
            && self.output_name.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Strip matching or stray quote characters from both ends
pub(crate) fn trim_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'')
}

/// Text after the final `.` of `path`, quotes trimmed, lowercased
pub(crate) fn extension_of(path: &str) -> String {
    let tail = match path.rfind('.') {
        Some(idx) => &path[idx + 1..],
        None => path,
    };
    trim_quotes(tail).to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_parse_is_case_insensitive() {
        assert_eq!("XLSM".parse::<FileType>(), Ok(FileType::Xlsm));
        assert_eq!("xlTx".parse::<FileType>(), Ok(FileType::Xltx));
        assert_eq!("xls".parse::<FileType>(), Err("xls".to_string()));
    }

    #[test]
    fn test_detect_from_path() {
        assert_eq!(FileType::detect("report.xlsm"), Ok(FileType::Xlsm));
        assert_eq!(FileType::detect("dir.v2/Book.XLAM"), Ok(FileType::Xlam));
        assert_eq!(FileType::detect("\"C:\\a b\\book.xlsx\""), Ok(FileType::Xlsx));
        assert_eq!(FileType::detect("notes.txt"), Err("txt".to_string()));
    }

    #[test]
    fn test_extension_without_dot_is_whole_name() {
        assert_eq!(extension_of("README"), "readme");
    }

    #[test]
    fn test_macro_enabled() {
        assert!(FileType::Xlsm.is_macro_enabled());
        assert!(FileType::Xlam.is_macro_enabled());
        assert!(!FileType::Xlsx.is_macro_enabled());
        assert!(!FileType::Xltx.is_macro_enabled());
    }

    #[test]
    fn test_save_type_default_is_json() {
        assert_eq!(SaveType::default(), SaveType::Json);
        assert_eq!(ParsedConfiguration::default().save_type_or_default(), SaveType::Json);
    }
}
