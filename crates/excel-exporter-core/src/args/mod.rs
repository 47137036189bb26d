//! Command-line argument resolution.
//!
//! [`resolve`] turns raw tokens into a [`ParsedConfiguration`] plus a message
//! log. Every applicable handler runs even after an earlier one fails, so a
//! user sees all problems from one invocation.
//!
//! ```
//! use excel_exporter_core::args::{resolve, CommandRegistry};
//! use excel_exporter_core::{FileType, SaveType};
//!
//! let registry = CommandRegistry::standard();
//! let resolution = resolve(&["report.xlsm"], &registry);
//! assert!(resolution.is_success());
//! assert_eq!(resolution.config.file_type, Some(FileType::Xlsm));
//! assert_eq!(resolution.config.save_type, Some(SaveType::Json));
//! ```

pub mod handlers;
pub mod registry;

pub use handlers::HandlerOutcome;
pub use registry::{Command, CommandKind, CommandRegistry};

use crate::config::{trim_quotes, ParsedConfiguration};
use crate::error::ArgumentError;

/// The outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Final configuration; empty when a stop command ran
    pub config: ParsedConfiguration,
    /// Notices and error texts, in the order they were produced
    pub messages: Vec<String>,
    /// Errors only, for programmatic inspection
    pub errors: Vec<ArgumentError>,
    /// Set when help or version was requested
    pub stop: bool,
    /// Keys of the commands whose aliases appeared, in dispatch order
    pub invoked: Vec<&'static str>,
}

impl Resolution {
    /// True when the export may proceed
    pub fn is_success(&self) -> bool {
        !self.stop && self.errors.is_empty()
    }

    /// True when help or version asked the caller to print and exit
    pub fn is_stop(&self) -> bool {
        self.stop
    }

    /// All messages joined with newlines
    pub fn message_log(&self) -> String {
        self.messages.join("\n")
    }

    fn record(&mut self, outcome: HandlerOutcome) {
        match outcome {
            HandlerOutcome::Applied(notices) => self.messages.extend(notices),
            HandlerOutcome::Stop(message) => {
                self.stop = true;
                self.messages.push(message);
            }
            HandlerOutcome::Failed { notices, error } => {
                self.messages.extend(notices);
                self.fail(error);
            }
        }
    }

    fn fail(&mut self, error: ArgumentError) {
        self.messages.push(error.to_string());
        self.errors.push(error);
    }
}

/// Resolve `args` (without the program name) against `registry`.
pub fn resolve<S: AsRef<str>>(args: &[S], registry: &CommandRegistry) -> Resolution {
    let args: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
    let mut resolution = Resolution::default();

    if args.is_empty() {
        resolution.fail(ArgumentError::NoArgumentsProvided);
        return resolution;
    }

    let mut config = ParsedConfiguration::default();
    // A first token that is only quotes is no input at all
    if let Some(first) = args
        .first()
        .filter(|first| !registry.is_alias(first) && !trim_quotes(first).is_empty())
    {
        config.input_file_path = Some(first.to_string());
    }

    for command in registry.commands() {
        for alias in command.aliases {
            if !args.contains(alias) || resolution.invoked.contains(&command.key) {
                continue;
            }
            resolution.invoked.push(command.key);
            tracing::debug!(command = command.key, alias, "running handler");
            let outcome = handlers::run(command, &args, registry, &mut config);
            resolution.record(outcome);
        }
    }

    if resolution.stop {
        return resolution;
    }

    for command in registry.commands() {
        if resolution.invoked.contains(&command.key) {
            continue;
        }
        let outcome = handlers::apply_default(command, &mut config);
        resolution.record(outcome);
    }

    if config.input_file_path.is_none() {
        resolution.fail(ArgumentError::MissingRequiredInput);
    }

    tracing::debug!(
        success = resolution.errors.is_empty(),
        invoked = ?resolution.invoked,
        "argument resolution finished"
    );

    debug_assert!(!resolution.errors.is_empty() || config.is_complete());
    resolution.config = config;
    resolution
}
