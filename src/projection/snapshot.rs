use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::Entry;

/// Directory path to its ordered children.
pub type Tree = HashMap<String, Vec<Arc<Entry>>>;
/// Every path to its entry.
pub type Index = HashMap<String, Arc<Entry>>;

/// A feed left out of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFailure {
    pub url: String,
    pub reason: String,
}

/// One immutable generation of the projected tree.
///
/// Tree and index are built together and share their entries, so a path
/// found in one always names the same entry as in the other.
#[derive(Debug, Clone)]
pub struct Snapshot {
    generation: u64,
    tree: Tree,
    index: Index,
    failures: Vec<FeedFailure>,
    fallback_timestamps: usize,
}

/// `join_path("/", "a") == "/a"`, `join_path("/a", "b") == "/a/b"`
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Absolute form of `path` without empty or trailing segments.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

impl Snapshot {
    /// Just the root, as published before the first build.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self::from_tree(Tree::from([("/".to_string(), Vec::new())]), now, Vec::new(), 0)
    }

    pub(crate) fn from_tree(
        tree: Tree,
        built_at: DateTime<Utc>,
        failures: Vec<FeedFailure>,
        fallback_timestamps: usize,
    ) -> Self {
        let mut index = Index::with_capacity(tree.values().map(Vec::len).sum::<usize>() + 1);
        index.insert("/".to_string(), Arc::new(Entry::root(built_at)));

        for (parent, children) in &tree {
            for child in children {
                index.insert(join_path(parent, &child.name), child.clone());
            }
        }

        Self {
            generation: 0,
            tree,
            index,
            failures,
            fallback_timestamps,
        }
    }

    pub(crate) fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Feeds that failed to fetch or parse during this build.
    pub fn failures(&self) -> &[FeedFailure] {
        &self.failures
    }

    /// How many entries carry the build time for lack of a feed date.
    pub fn fallback_timestamps(&self) -> usize {
        self.fallback_timestamps
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.get("/").is_none_or(Vec::is_empty)
    }

    pub fn lookup(&self, path: &str) -> Option<&Arc<Entry>> {
        self.index.get(&normalize_path(path))
    }

    /// Children of a directory, `None` unless `path` is one.
    pub fn list_children(&self, path: &str) -> Option<&[Arc<Entry>]> {
        self.tree.get(&normalize_path(path)).map(Vec::as_slice)
    }

    /// Up to `length` bytes of a file starting at `offset`.
    ///
    /// Never reads past the content; an offset at or past the end yields an
    /// empty slice.
    pub fn read_range(&self, path: &str, offset: u64, length: usize) -> Option<&[u8]> {
        let entry = self.lookup(path)?;
        let content = entry.content.as_slice();

        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(content.len());
        let end = start.saturating_add(length).min(content.len());

        Some(&content[start..end])
    }
}
