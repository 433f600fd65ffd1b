use crate::domain::ProgramEntry;

/// Catalog of discoverable programs, sorted bytewise by name. Built once at
/// startup and read-only afterwards; a rebuild replaces the whole index.
#[derive(Clone, Debug, Default)]
pub struct ProgramIndex {
    entries: Vec<ProgramEntry>,
}

impl ProgramIndex {
    /// Sorts by name. The sort is stable, so duplicate names keep their
    /// discovery order; duplicates themselves are not filtered.
    pub fn from_entries(mut entries: Vec<ProgramEntry>) -> Self {
        entries.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        Self { entries }
    }

    pub fn entries(&self) -> &[ProgramEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best-effort completion for `query`: the lexicographically smallest
    /// entry name that has `query` as a prefix, which is `query` itself
    /// whenever an entry with that exact name exists. `None` when `query`
    /// is empty or nothing matches.
    pub fn find_best_prefix_match(&self, query: &str) -> Option<&str> {
        if query.is_empty() {
            return None;
        }
        // Lower bound: first entry whose name sorts >= query. Every name
        // starting with query sorts at or after this point, so one
        // prefix check decides the outcome.
        let at = self
            .entries
            .partition_point(|entry| entry.name.as_bytes() < query.as_bytes());
        let entry = self.entries.get(at)?;
        entry
            .name
            .starts_with(query)
            .then_some(entry.name.as_str())
    }
}
