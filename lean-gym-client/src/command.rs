//! Wire commands understood by the lean-gym REPL.
//!
//! Every command travels as a single line holding a JSON array of the form
//! `["command_name", ["arg1", "arg2", ...]]`. Arguments are always strings,
//! numeric ids included.

use crate::error::Result;

/// A lean-gym REPL command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start a proof search for a declaration.
    InitSearch {
        /// Fully qualified declaration name.
        name: String,
    },

    /// Run a tactic against a tactic state of a search.
    RunTac {
        search_id: u64,
        tactic_state_id: u64,
        /// Tactic text, may span several lines.
        tactic: String,
    },

    /// Drop a search and its tactic states.
    ClearSearch { search_id: u64 },
}

impl Command {
    /// Create an `init_search` command.
    pub fn init_search(name: impl Into<String>) -> Self {
        Self::InitSearch { name: name.into() }
    }

    /// Create a `run_tac` command.
    pub fn run_tac(search_id: u64, tactic_state_id: u64, tactic: impl Into<String>) -> Self {
        Self::RunTac {
            search_id,
            tactic_state_id,
            tactic: tactic.into(),
        }
    }

    /// Create a `clear_search` command.
    pub fn clear_search(search_id: u64) -> Self {
        Self::ClearSearch { search_id }
    }

    /// The command name as the REPL expects it.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitSearch { .. } => "init_search",
            Self::RunTac { .. } => "run_tac",
            Self::ClearSearch { .. } => "clear_search",
        }
    }

    /// The ordered argument list.
    ///
    /// `init_search` always carries an empty second argument where the REPL
    /// expects open namespaces.
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::InitSearch { name } => vec![name.clone(), String::new()],
            Self::RunTac {
                search_id,
                tactic_state_id,
                tactic,
            } => vec![
                search_id.to_string(),
                tactic_state_id.to_string(),
                escape_newlines(tactic),
            ],
            Self::ClearSearch { search_id } => vec![search_id.to_string()],
        }
    }

    /// Encode the command as one wire line, without the trailing newline.
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(&(self.name(), self.args()))?)
    }
}

/// Replace newline characters with the two-character sequence `\n`.
pub fn escape_newlines(text: &str) -> String {
    text.replace('\n', "\\n")
}

/// Replace the two-character sequence `\n` with a newline character.
pub fn unescape_newlines(text: &str) -> String {
    text.replace("\\n", "\n")
}
