//! The fixed table of commands the resolver dispatches over

use crate::error::RegistryError;

/// Which handler a command runs.
///
/// One variant per command; the handler bodies live in
/// [`handlers`](super::handlers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Help,
    Version,
    OutputDir,
    OutputName,
    FileType,
    SaveType,
}

/// A named command-line capability
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Unique identifier
    pub key: &'static str,
    /// Surface tokens, long form first
    pub aliases: &'static [&'static str],
    /// Help text
    pub description: &'static str,
    pub kind: CommandKind,
}

impl Command {
    pub const fn new(
        key: &'static str,
        aliases: &'static [&'static str],
        description: &'static str,
        kind: CommandKind,
    ) -> Self {
        Self {
            key,
            aliases,
            description,
            kind,
        }
    }

    /// Aliases joined for messages, e.g. `--outputDir or -od`
    pub fn alias_list(&self, separator: &str) -> String {
        self.aliases.join(separator)
    }

    /// Whether `token` is one of this command's aliases
    pub fn matches(&self, token: &str) -> bool {
        self.aliases.iter().any(|alias| *alias == token)
    }
}

/// Ordered, immutable-once-built table of commands.
///
/// Keys and aliases are unique; [`register`](Self::register) rejects
/// duplicates. Handlers run in registration order.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: Vec<Command>,
}

impl CommandRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard command set, in dispatch order
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for command in STANDARD_COMMANDS {
            if let Err(e) = registry.register(command) {
                tracing::error!("standard command table is inconsistent: {e}");
            }
        }
        registry
    }

    /// Add a command, keeping key and alias uniqueness
    pub fn register(&mut self, command: Command) -> Result<(), RegistryError> {
        if self.get(command.key).is_some() {
            return Err(RegistryError::DuplicateKey(command.key.to_string()));
        }
        for alias in command.aliases {
            if let Some(existing) = self.find_by_alias(alias) {
                return Err(RegistryError::DuplicateAlias {
                    alias: alias.to_string(),
                    key: command.key.to_string(),
                    existing: existing.key.to_string(),
                });
            }
        }
        self.commands.push(command);
        Ok(())
    }

    /// All commands in registration order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Look up a command by key
    pub fn get(&self, key: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.key == key)
    }

    /// The command bound to `token`, if any
    pub fn find_by_alias(&self, token: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.matches(token))
    }

    /// Whether `token` is any registered alias
    pub fn is_alias(&self, token: &str) -> bool {
        self.find_by_alias(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

const STANDARD_COMMANDS: [Command; 6] = [
    Command::new(
        "help",
        &["--help", "-h"],
        "Display this help message",
        CommandKind::Help,
    ),
    Command::new(
        "version",
        &["--version", "-v"],
        "Display the version of the program",
        CommandKind::Version,
    ),
    Command::new(
        "outputDir",
        &["--outputDir", "-od"],
        "The directory to extract the workbook to (default: the input file's directory)\n\
         Usage: excel-exporter <input_file> --outputDir <output_dir>\n\
         Example: excel-exporter input.xlsx --outputDir ./output",
        CommandKind::OutputDir,
    ),
    Command::new(
        "outputName",
        &["--outputName", "-on"],
        "Base name of the generated export folder (default: the input file's name)\n\
         Usage: excel-exporter <input_file> --outputName <name>\n\
         Example: excel-exporter input.xlsx --outputName budget",
        CommandKind::OutputName,
    ),
    Command::new(
        "fileType",
        &["--fileType", "-ft"],
        "The type of the input workbook: xlsx, xltx, xlsm, xltm or xlam (default: from the extension)\n\
         Usage: excel-exporter <input_file> --fileType <file_type>\n\
         Example: excel-exporter input.xlsx --fileType xlsm",
        CommandKind::FileType,
    ),
    Command::new(
        "saveType",
        &["--saveType", "-st"],
        "Format for worksheet data: csv or json (default: json)\n\
         Usage: excel-exporter <input_file> --saveType <save_type>\n\
         Example: excel-exporter input.xlsx --saveType csv",
        CommandKind::SaveType,
    ),
];
