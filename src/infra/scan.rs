use crate::domain::{ProgramEntry, ProgramIndex};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How far into each search-path directory the index build looks.
/// `Recursive` (the default) descends into subdirectories;
/// `DirectChildren` stops at the directory's own entries.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WalkPolicy {
    #[default]
    Recursive,
    DirectChildren,
}

impl WalkPolicy {
    fn max_depth(self) -> usize {
        match self {
            Self::Recursive => usize::MAX,
            Self::DirectChildren => 1,
        }
    }
}

/// Directories to index: `TAPD_SEARCH_PATH` when set, otherwise `PATH`.
pub fn resolve_search_path() -> Vec<PathBuf> {
    let raw = std::env::var_os("TAPD_SEARCH_PATH")
        .or_else(|| std::env::var_os("PATH"))
        .unwrap_or_default();
    std::env::split_paths(&raw).collect()
}

/// Builds the program index from scratch. Directories that cannot be read
/// are skipped; nothing here is fatal. Only files are recorded (directory
/// entries are not programs); duplicate names across search-path entries
/// are kept as-is.
pub fn build_program_index(search_path: &[PathBuf], policy: WalkPolicy) -> ProgramIndex {
    let mut entries: Vec<ProgramEntry> = Vec::new();
    for dir in search_path {
        collect_dir(dir, policy, &mut entries);
    }
    ProgramIndex::from_entries(entries)
}

fn collect_dir(dir: &Path, policy: WalkPolicy, entries: &mut Vec<ProgramEntry>) {
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .max_depth(policy.max_depth())
        .into_iter();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(_error) => continue,
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        entries.push(ProgramEntry::new(name, entry.path()));
    }
}
