use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const COMMAND_SHOW: &str = "show";
pub const COMMAND_HIDE: &str = "hide";
pub const COMMAND_KILL: &str = "kill";

/// One discoverable program. `name` is the base filename used as the
/// matchable key; `full_path` is where it was found on the search path.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramEntry {
    pub name: String,
    pub full_path: PathBuf,
}

impl ProgramEntry {
    pub fn new(name: impl Into<String>, full_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            full_path: full_path.into(),
        }
    }
}

/// The one-object-per-connection control payload. Anything other than the
/// reserved commands is a display-only passthrough.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ControlMessage {
    // Older clients send this field capitalized; accept both spellings.
    #[serde(alias = "Command")]
    pub command: String,
}

impl ControlMessage {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}
