use std::collections::{HashMap, HashSet};

/// Stand-in for titles that are missing or clean down to nothing usable.
pub const UNTITLED: &str = "Untitled";

/// Replaces `/`, `\` and `:` with `-` and trims surrounding whitespace.
pub fn clean(title: &str) -> String {
    title
        .replace(|c: char| matches!(c, '/' | '\\' | ':'), "-")
        .trim()
        .to_string()
}

/// [`clean`], with [`UNTITLED`] for names no filesystem accepts.
pub fn file_stem(title: &str) -> String {
    let cleaned = clean(title);
    match cleaned.as_str() {
        "" | "." | ".." => UNTITLED.to_string(),
        _ => cleaned,
    }
}

/// Names the files of one directory.
///
/// Stems must arrive in ascending order so equal stems are adjacent: the
/// first keeps `<stem>.<ext>`, the Nth repeat becomes `<stem> [N].<ext>`.
#[derive(Debug, Default)]
pub struct FilenameAllocator {
    previous: Option<String>,
    collisions: usize,
    taken: HashSet<String>,
}

impl FilenameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, stem: &str, extension: &str) -> String {
        if self.previous.as_deref() == Some(stem) {
            self.collisions += 1;
        } else {
            self.collisions = 0;
            self.previous = Some(stem.to_string());
        }

        loop {
            let name = if self.collisions > 0 {
                format!("{} [{}].{}", stem, self.collisions, extension)
            } else {
                format!("{}.{}", stem, extension)
            };
            if self.taken.insert(name.clone()) {
                return name;
            }
            // A literal "A [1]" title can meet a numbered "A".
            self.collisions += 1;
        }
    }
}

/// Sorts `titles` by stem and allocates a filename for each.
///
/// Returns `(original index, filename)` in allocation order.
pub fn allocate_sorted<S: AsRef<str>>(titles: &[S], extension: &str) -> Vec<(usize, String)> {
    let mut stems: Vec<(usize, String)> = titles
        .iter()
        .enumerate()
        .map(|(i, t)| (i, file_stem(t.as_ref())))
        .collect();
    stems.sort_by(|a, b| a.1.cmp(&b.1));

    let mut allocator = FilenameAllocator::new();
    stems
        .into_iter()
        .map(|(i, stem)| (i, allocator.allocate(&stem, extension)))
        .collect()
}

/// Names the sub-directories of one directory, in configuration order.
#[derive(Debug, Default)]
pub struct DirectoryNames {
    counters: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl DirectoryNames {
    pub fn claim(&mut self, stem: &str) -> String {
        loop {
            let counter = self.counters.entry(stem.to_string()).or_insert(0);
            let name = if *counter == 0 {
                stem.to_string()
            } else {
                format!("{} [{}]", stem, counter)
            };
            *counter += 1;
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}
