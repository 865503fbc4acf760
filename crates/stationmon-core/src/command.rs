//! Command vocabulary for framed serial lines.
//!
//! The vocabulary is deliberately small: one keyword requests a restart,
//! everything else is accepted and ignored. Unknown text is not an error.

use crate::{config::DEFAULT_RESTART_KEYWORD, restart::RestartSignal};

/// Interpretation of one framed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Restart the device after the grace delay.
    Restart,
    /// Accepted, no defined side effect.
    Unrecognized,
}

/// Maps lines to [`Command`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInterpreter {
    restart_keyword: String,
}

impl Default for CommandInterpreter {
    fn default() -> Self {
        Self::new(DEFAULT_RESTART_KEYWORD)
    }
}

impl CommandInterpreter {
    /// Create an interpreter recognising `restart_keyword` anywhere in a line.
    pub fn new(restart_keyword: impl Into<String>) -> Self {
        Self { restart_keyword: restart_keyword.into() }
    }

    /// Interpret a single trimmed line. Matching is a case-sensitive
    /// substring search.
    pub fn interpret(&self, line: &str) -> Command {
        if !self.restart_keyword.is_empty() && line.contains(self.restart_keyword.as_str()) {
            Command::Restart
        } else {
            Command::Unrecognized
        }
    }

    /// Keyword that triggers a restart.
    pub fn restart_keyword(&self) -> &str {
        &self.restart_keyword
    }
}

/// Routes interpreted lines to their side effects.
///
/// The only side effect is raising the shared [`RestartSignal`]; performing
/// the restart is left to the run loop.
#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    interpreter: CommandInterpreter,
    restart: RestartSignal,
}

impl CommandDispatcher {
    /// Create a dispatcher raising `restart` on restart commands.
    pub fn new(interpreter: CommandInterpreter, restart: RestartSignal) -> Self {
        Self { interpreter, restart }
    }

    /// Interpret `line` and apply its side effect.
    pub fn dispatch(&self, line: &str) -> Command {
        let command = self.interpreter.interpret(line);
        if command == Command::Restart {
            self.restart.request();
        }
        command
    }

    /// Signal raised by restart commands.
    pub fn restart_signal(&self) -> &RestartSignal {
        &self.restart
    }
}
