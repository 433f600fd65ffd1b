use std::path::PathBuf;
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecuteProgramError {
    #[error("no program selected")]
    EmptyName,

    #[error("program not found on the search path: {0}")]
    NotFound(String),

    #[error("failed to spawn {path}: {source}")]
    Spawn {
        path: String,
        source: std::io::Error,
    },
}

/// Host executable lookup: first file named `name` in a `PATH` directory
/// wins. Mirrors the shell's resolution order without shelling out.
pub fn resolve_program(name: &str) -> Option<PathBuf> {
    let raw = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&raw) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Resolves and spawns `name` with no arguments. The child is never
/// waited on; the session loop must not block on launched programs.
/// Callers log the error and carry on.
pub fn execute_program(name: &str) -> Result<(), ExecuteProgramError> {
    if name.is_empty() {
        return Err(ExecuteProgramError::EmptyName);
    }
    let path =
        resolve_program(name).ok_or_else(|| ExecuteProgramError::NotFound(name.to_string()))?;
    Command::new(&path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| ExecuteProgramError::Spawn {
            path: path.display().to_string(),
            source,
        })?;
    Ok(())
}
