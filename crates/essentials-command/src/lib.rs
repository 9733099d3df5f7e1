//! Command line parsing, permission checks, and the command registry.

pub mod permission;
pub mod selector;

use std::collections::HashMap;

pub use essentials_plugin_api::CommandResult;
use essentials_plugin_api::ServerApi;
use tracing::debug;

pub use permission::{has_permission, Permission};

/// Context passed to a command handler.
pub struct CommandContext<'a> {
    /// Name of the player executing the command.
    pub sender: &'a str,
    /// Arguments after the command name.
    pub args: &'a [String],
    pub api: &'a mut dyn ServerApi,
}

impl CommandContext<'_> {
    /// Argument at `index`, if given.
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }
}

/// What a handler returns. `Err` carries the failure shown to the sender,
/// so handlers can bail out with `?`.
pub type HandlerResult = Result<CommandResult, CommandResult>;

/// Handler for a command, given the owning plugin's state.
pub type CommandFn<S> = fn(&S, &mut CommandContext<'_>) -> HandlerResult;

/// A registered command.
pub struct CommandEntry<S> {
    pub name: String,
    pub description: String,
    pub usage: String,
    pub permission: Permission,
    pub handler: CommandFn<S>,
}

/// Commands by name.
pub struct CommandRegistry<S> {
    commands: HashMap<String, CommandEntry<S>>,
}

impl<S> CommandRegistry<S> {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a command, replacing any command with the same name.
    pub fn register(
        &mut self,
        name: &str,
        description: &str,
        usage: &str,
        permission: Permission,
        handler: CommandFn<S>,
    ) {
        self.commands.insert(
            name.to_string(),
            CommandEntry {
                name: name.to_string(),
                description: description.to_string(),
                usage: usage.to_string(),
                permission,
                handler,
            },
        );
    }

    /// Execute a command by name after checking the sender's permission.
    pub fn execute(&self, state: &S, name: &str, ctx: &mut CommandContext<'_>) -> CommandResult {
        let Some(entry) = self.commands.get(name) else {
            return CommandResult::err(format!("Unknown command: {name}."));
        };
        if !has_permission(&*ctx.api, ctx.sender, entry.permission) {
            debug!("{} denied /{name}", ctx.sender);
            return CommandResult::err("You do not have permission to use this command");
        }
        (entry.handler)(state, ctx).unwrap_or_else(|failure| failure)
    }

    /// Get a reference to all registered commands.
    pub fn get_commands(&self) -> &HashMap<String, CommandEntry<S>> {
        &self.commands
    }
}

impl<S> Default for CommandRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Split a chat command into its name and arguments.
///
/// The leading `/` is optional. Returns `None` for a blank line.
pub fn parse_command_line(line: &str) -> Option<(String, Vec<String>)> {
    let line = line.trim();
    let line = line.strip_prefix('/').unwrap_or(line);
    let mut tokens = tokenize(line).into_iter();
    let name = tokens.next()?;
    Some((name, tokens.collect()))
}

/// Whitespace-separated tokens. Double quotes group words; inside quotes
/// `\"` and `\\` are escapes.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}

// ===========================================================================
// Tests
// ===========================================================================
