//! Command registry for REPL commands
//!
//! Lines that match a registered prefix are handled here; everything else is
//! run as Lox source.

pub mod general;

use lox_core::{Interpreter, InterpreterConfig, Session};

/// Result of executing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Command executed successfully, continue REPL
    Success,
    /// Command executed, show this message
    Message(String),
    /// Exit the REPL
    Exit,
    /// Not a command, run as Lox source
    NotACommand,
    /// Error occurred
    Error(String),
    /// Watch a file for changes
    Watch(String),
    /// Stop watching a file
    Unwatch(String),
    /// List watched files
    ListWatched,
}

/// Context passed to command handlers
pub struct CommandContext {
    pub session: Session,
}

impl CommandContext {
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            session: Self::fresh_session(config),
        }
    }

    /// Context around an existing session (tests, embedding)
    pub fn with_session(session: Session) -> Self {
        Self { session }
    }

    fn fresh_session(config: InterpreterConfig) -> Session {
        Session::with_interpreter(Interpreter::new().with_config(config))
    }

    /// Replace the session, dropping every global binding; limits carry over
    pub fn reset(&mut self) {
        let config = self.session.interpreter().config();
        self.session = Self::fresh_session(config);
    }
}

/// A command handler function
pub type CommandHandler = fn(&str, &mut CommandContext) -> CommandResult;

/// Registry of available commands
pub struct CommandRegistry {
    /// Sorted by prefix length descending for longest-match-first lookup
    commands: Vec<(String, CommandHandler)>,
}

impl CommandRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register a command with its prefix
    pub fn register(&mut self, prefix: &str, handler: CommandHandler) {
        self.commands.push((prefix.to_string(), handler));
        self.commands.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    /// Execute a command, returning NotACommand if no match found
    pub fn execute(&self, input: &str, ctx: &mut CommandContext) -> CommandResult {
        for (prefix, handler) in &self.commands {
            if input == prefix || input.starts_with(&format!("{} ", prefix)) {
                let args = input[prefix.len()..].trim();
                return handler(args, ctx);
            }
        }
        CommandResult::NotACommand
    }

    /// Get all registered command prefixes
    pub fn list_commands(&self) -> Vec<&str> {
        self.commands.iter().map(|(p, _)| p.as_str()).collect()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a fully populated command registry with all built-in commands
pub fn create_registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();

    registry.register("help", general::cmd_help);
    registry.register("quit", general::cmd_quit);
    registry.register("exit", general::cmd_quit);
    registry.register("env", general::cmd_env);
    registry.register("reset", general::cmd_reset);
    registry.register("load", general::cmd_load);
    registry.register("watch", general::cmd_watch);
    registry.register("unwatch", general::cmd_unwatch);

    registry
}
