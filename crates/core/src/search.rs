use std::collections::HashSet;

use crate::model::{Flamegraph, FrameId};

/// Nodes matching the active search. Frames outside the set are dimmed,
/// not hidden, so the shape of the graph stays visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    matches: HashSet<FrameId>,
}

impl SearchResults {
    pub fn from_ids(ids: impl IntoIterator<Item = FrameId>) -> Self {
        Self {
            matches: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.matches.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Case-insensitive substring search over node names.
///
/// Returns `None` for a blank query, meaning "no search active" (nothing
/// dimmed), which is different from a query that matches nothing.
pub fn search(flamegraph: &Flamegraph, query: &str) -> Option<SearchResults> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let ids = flamegraph
        .frames()
        .iter()
        .filter(|f| f.name().to_lowercase().contains(&needle))
        .map(|f| f.id);
    Some(SearchResults::from_ids(ids))
}
