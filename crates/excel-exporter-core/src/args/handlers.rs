//! Per-command handler logic.
//!
//! Each handler is stateless and runs at most once per resolution pass,
//! either because one of its aliases was present ([`run`]) or, for commands
//! that have one, to fill in a default when it was absent ([`apply_default`]).

use std::path::PathBuf;

use crate::args::registry::{Command, CommandKind, CommandRegistry};
use crate::config::{trim_quotes, FileType, ParsedConfiguration, SaveType};
use crate::error::ArgumentError;
use crate::VERSION;

/// What a single handler invocation produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// The configuration was updated; any notices are informational
    Applied(Vec<String>),
    /// Print the message and exit without exporting (help, version)
    Stop(String),
    /// The handler could not produce a valid value
    Failed {
        notices: Vec<String>,
        error: ArgumentError,
    },
}

impl HandlerOutcome {
    fn applied() -> Self {
        HandlerOutcome::Applied(Vec::new())
    }

    fn failed(error: ArgumentError) -> Self {
        HandlerOutcome::Failed {
            notices: Vec::new(),
            error,
        }
    }

    /// The success flag a caller sees: false for both stops and failures
    pub fn succeeded(&self) -> bool {
        matches!(self, HandlerOutcome::Applied(_))
    }
}

/// Run the handler for a command whose alias appeared in `args`
pub fn run(
    command: &Command,
    args: &[&str],
    registry: &CommandRegistry,
    config: &mut ParsedConfiguration,
) -> HandlerOutcome {
    match command.kind {
        CommandKind::Help => HandlerOutcome::Stop(help_text(registry)),
        CommandKind::Version => HandlerOutcome::Stop(version_text()),
        CommandKind::OutputDir => match flag_value(command, args, registry) {
            Ok(dir) => {
                config.output_dir = Some(PathBuf::from(dir));
                HandlerOutcome::applied()
            }
            Err(e) => HandlerOutcome::failed(e),
        },
        CommandKind::OutputName => match flag_value(command, args, registry) {
            Ok(name) => {
                config.output_name = Some(name.to_string());
                HandlerOutcome::applied()
            }
            Err(e) => HandlerOutcome::failed(e),
        },
        CommandKind::FileType => match flag_value(command, args, registry) {
            Ok(value) => match value.parse::<FileType>() {
                Ok(file_type) => {
                    config.file_type = Some(file_type);
                    HandlerOutcome::applied()
                }
                Err(_) => file_type_fallback(command, value, config),
            },
            Err(e) => HandlerOutcome::failed(e),
        },
        CommandKind::SaveType => match flag_value(command, args, registry) {
            Ok(value) => match value.parse::<SaveType>() {
                Ok(save_type) => {
                    config.save_type = Some(save_type);
                    HandlerOutcome::applied()
                }
                Err(_) => HandlerOutcome::failed(ArgumentError::InvalidOptionValue {
                    option: "save type",
                    value: value.to_string(),
                    allowed: SaveType::allowed_values(),
                }),
            },
            Err(e) => HandlerOutcome::failed(e),
        },
    }
}

/// Fill in the value for a command that was not given on the command line.
///
/// Defaults derived from the input path are skipped when there is no input;
/// the resolver reports that separately.
pub fn apply_default(command: &Command, config: &mut ParsedConfiguration) -> HandlerOutcome {
    let input = config.input_file_path.clone();
    match (command.kind, input.as_deref()) {
        (CommandKind::Help | CommandKind::Version, _) => HandlerOutcome::applied(),
        (CommandKind::SaveType, _) => {
            config.save_type = Some(SaveType::default());
            HandlerOutcome::applied()
        }
        (_, None) => HandlerOutcome::applied(),
        (CommandKind::OutputDir, Some(input)) => {
            let dir = parent_dir(input);
            let notice = format!(
                "Auto-detected output directory from input file: {}",
                dir.display()
            );
            config.output_dir = Some(dir);
            HandlerOutcome::Applied(vec![notice])
        }
        (CommandKind::OutputName, Some(input)) => {
            let name = base_name(input);
            if name.is_empty() {
                // `data/` names a directory, not a workbook
                return HandlerOutcome::failed(ArgumentError::InvalidOptionValue {
                    option: "output name derived from input file",
                    value: input.to_string(),
                    allowed: "a path ending in a file name".into(),
                });
            }
            let notice = format!("Auto-detected output name from input file: {name}");
            config.output_name = Some(name);
            HandlerOutcome::Applied(vec![notice])
        }
        (CommandKind::FileType, Some(input)) => match detect_file_type(input) {
            Ok((file_type, notice)) => {
                config.file_type = Some(file_type);
                HandlerOutcome::Applied(vec![notice])
            }
            Err(e) => HandlerOutcome::failed(e),
        },
    }
}

/// An explicit `--fileType` value was not recognized: retry from the extension
fn file_type_fallback(
    command: &Command,
    value: &str,
    config: &mut ParsedConfiguration,
) -> HandlerOutcome {
    let mut notices = vec![format!(
        "Invalid file type '{value}' given to {}; falling back to the input file's extension.",
        command.alias_list(" or ")
    )];

    let Some(input) = config.input_file_path.as_deref() else {
        return HandlerOutcome::Failed {
            notices,
            error: ArgumentError::InvalidOptionValue {
                option: "file type",
                value: value.to_string(),
                allowed: FileType::allowed_values(),
            },
        };
    };

    match detect_file_type(input) {
        Ok((file_type, notice)) => {
            config.file_type = Some(file_type);
            notices.push(notice);
            HandlerOutcome::Applied(notices)
        }
        Err(error) => HandlerOutcome::Failed { notices, error },
    }
}

fn detect_file_type(input: &str) -> Result<(FileType, String), ArgumentError> {
    match FileType::detect(input) {
        Ok(file_type) => Ok((
            file_type,
            format!("Auto-detected file type from input file: {file_type}"),
        )),
        Err(extension) => Err(ArgumentError::InvalidOptionValue {
            option: "file type auto-detected from input file",
            value: extension,
            allowed: FileType::allowed_values(),
        }),
    }
}

/// The token following the first alias of `command` found in `args`, with
/// surrounding quotes trimmed.
///
/// A following token that is itself a registered alias, or that is empty
/// once its quotes are gone, counts as missing.
fn flag_value<'a>(
    command: &Command,
    args: &[&'a str],
    registry: &CommandRegistry,
) -> Result<&'a str, ArgumentError> {
    let missing = || ArgumentError::MissingArgumentValue {
        flag: command.alias_list(" or "),
    };

    let position = command
        .aliases
        .iter()
        .find_map(|alias| args.iter().position(|arg| arg == alias))
        .ok_or_else(missing)?;

    match args.get(position + 1) {
        Some(value) if registry.is_alias(value) => Err(missing()),
        Some(value) if !trim_quotes(value).is_empty() => Ok(trim_quotes(value)),
        _ => Err(missing()),
    }
}

/// Split the input at its last `/` or `\`.
///
/// Both separators count on every host, since paths may be written for the
/// Windows side of the bridge.
fn split_input(input: &str) -> (Option<&str>, &str) {
    let path = trim_quotes(input);
    match path.rfind(['/', '\\']) {
        Some(idx) => (Some(&path[..idx]), &path[idx + 1..]),
        None => (None, path),
    }
}

/// Containing directory of the input; `.` for a bare file name
fn parent_dir(input: &str) -> PathBuf {
    let path = trim_quotes(input);
    match split_input(input).0 {
        None => PathBuf::from("."),
        // `/book.xlsx` or `C:\book.xlsx`: keep the root separator
        Some(dir) if dir.is_empty() || dir.ends_with(':') => {
            PathBuf::from(&path[..=dir.len()])
        }
        Some(dir) => PathBuf::from(dir),
    }
}

/// File name of the input without its extension
fn base_name(input: &str) -> String {
    let file = split_input(input).1;
    match file.rfind('.') {
        Some(idx) if idx > 0 => file[..idx].to_string(),
        _ => file.to_string(),
    }
}

fn help_text(registry: &CommandRegistry) -> String {
    let mut text = String::from(
        "Usage: excel-exporter <input_file> <arguments>\n\
         Example: excel-exporter input.xlsx --outputDir ./output\n\
         <input_file> should be an Excel file (xlsx, xltx, xlsm, xltm, xlam)\n\
         Macro-enabled workbooks (xlsm, xltm, xlam) will have their VBA code extracted\n\
         \n\
         Available arguments:\n",
    );

    for command in registry.commands() {
        text.push_str(&format!("{}: {}\n", command.key, command.description));
        text.push_str(&format!("  Aliases: {}\n\n", command.alias_list("; ")));
    }

    text
}

fn version_text() -> String {
    format!(
        "Excel Exporter - Command Line Interface\n\
         ====================================\n\
         Version {VERSION}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn command(kind: CommandKind) -> Command {
        CommandRegistry::standard()
            .commands()
            .iter()
            .find(|c| c.kind == kind)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_flag_value_prefers_first_matching_alias() {
        let registry = CommandRegistry::standard();
        let cmd = command(CommandKind::OutputDir);
        let args = ["book.xlsx", "-od", "short", "--outputDir", "long"];
        assert_eq!(flag_value(&cmd, &args, &registry), Ok("long"));
    }

    #[test]
    fn test_flag_value_followed_by_alias_is_missing() {
        let registry = CommandRegistry::standard();
        let cmd = command(CommandKind::OutputName);
        let args = ["book.xlsx", "--outputName", "-st", "csv"];
        assert_eq!(
            flag_value(&cmd, &args, &registry),
            Err(ArgumentError::MissingArgumentValue {
                flag: "--outputName or -on".into()
            })
        );
    }

    #[test]
    fn test_parent_dir_and_base_name() {
        assert_eq!(parent_dir("report.xlsm"), PathBuf::from("."));
        assert_eq!(parent_dir("data/q1/report.xlsm"), PathBuf::from("data/q1"));
        assert_eq!(base_name("data/q1/report.xlsm"), "report");
        assert_eq!(base_name("\"my book.v2.xlsx\""), "my book.v2");
        assert_eq!(parent_dir("/book.xlsx"), PathBuf::from("/"));
    }

    #[test]
    fn test_windows_style_input_paths() {
        assert_eq!(parent_dir("C:\\data\\report.xlsm"), PathBuf::from("C:\\data"));
        assert_eq!(base_name("C:\\data\\report.xlsm"), "report");
        assert_eq!(parent_dir("C:\\report.xlsm"), PathBuf::from("C:\\"));
        assert_eq!(base_name("'Z:\\home\\me\\q1.v2.xlsx'"), "q1.v2");
    }

    #[test]
    fn test_flag_value_of_only_quotes_is_missing() {
        let registry = CommandRegistry::standard();
        let cmd = command(CommandKind::OutputDir);
        for quoted in ["\"\"", "''", ""] {
            let args = ["book.xlsx", "-od", quoted];
            assert_eq!(
                flag_value(&cmd, &args, &registry),
                Err(ArgumentError::MissingArgumentValue {
                    flag: "--outputDir or -od".into()
                })
            );
        }
    }

    #[test]
    fn test_directory_input_has_no_output_name() {
        let mut config = ParsedConfiguration {
            input_file_path: Some("exports/".into()),
            ..Default::default()
        };
        let outcome = apply_default(&command(CommandKind::OutputName), &mut config);
        assert!(!outcome.succeeded());
        assert_eq!(config.output_name, None);
    }

    #[test]
    fn test_flag_value_trims_quotes() {
        let registry = CommandRegistry::standard();
        let cmd = command(CommandKind::OutputName);
        let args = ["book.xlsx", "-on", "\"Q1 report\""];
        assert_eq!(flag_value(&cmd, &args, &registry), Ok("Q1 report"));
    }

    #[test]
    fn test_save_type_rejects_unknown() {
        let registry = CommandRegistry::standard();
        let mut config = ParsedConfiguration::default();
        let outcome = run(
            &command(CommandKind::SaveType),
            &["book.xlsx", "-st", "xml"],
            &registry,
            &mut config,
        );
        assert!(!outcome.succeeded());
        assert_eq!(config.save_type, None);
    }

    #[test]
    fn test_save_type_accepts_any_case() {
        let registry = CommandRegistry::standard();
        let mut config = ParsedConfiguration::default();
        let outcome = run(
            &command(CommandKind::SaveType),
            &["book.xlsx", "--saveType", "CSV"],
            &registry,
            &mut config,
        );
        assert!(outcome.succeeded());
        assert_eq!(config.save_type, Some(SaveType::Csv));
    }

    #[test]
    fn test_version_mentions_crate_version() {
        let registry = CommandRegistry::standard();
        let mut config = ParsedConfiguration::default();
        match run(&command(CommandKind::Version), &["-v"], &registry, &mut config) {
            HandlerOutcome::Stop(text) => assert!(text.contains(VERSION)),
            other => panic!("expected stop, got {other:?}"),
        }
    }
}
