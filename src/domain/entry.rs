use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::FeedSource;

/// Inode of `/`. It exists before any feed has been fetched.
pub const ROOT_INODE: u64 = 1001;

/// `S_IFDIR | 0755`
pub const DIRECTORY_MODE: u32 = 0o040_755;
/// `S_IFREG | 0644`
pub const FILE_MODE: u32 = 0o100_644;

/// One node of the projected tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub is_directory: bool,
    pub timestamp: DateTime<Utc>,
    pub inode: u64,
    /// Rendered item, empty for directories.
    pub content: Vec<u8>,
    /// The feed a feed-root directory was projected from.
    pub source_feed: Option<Arc<FeedSource>>,
}

/// What a filesystem adapter reports for `getattr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    pub inode: u64,
    pub size: u64,
    pub mode: u32,
    pub timestamp: DateTime<Utc>,
    pub is_directory: bool,
}

impl Entry {
    pub fn root(timestamp: DateTime<Utc>) -> Self {
        Self::directory("", ROOT_INODE, timestamp)
    }

    pub fn directory(name: impl Into<String>, inode: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            timestamp,
            inode,
            content: Vec::new(),
            source_feed: None,
        }
    }

    pub fn file(
        name: impl Into<String>,
        inode: u64,
        timestamp: DateTime<Utc>,
        content: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
            timestamp,
            inode,
            content,
            source_feed: None,
        }
    }

    pub fn with_source_feed(mut self, source: Arc<FeedSource>) -> Self {
        self.source_feed = Some(source);
        self
    }

    /// 0 for directories, the content length otherwise.
    pub fn size(&self) -> u64 {
        if self.is_directory {
            0
        } else {
            self.content.len() as u64
        }
    }

    pub fn mode(&self) -> u32 {
        if self.is_directory {
            DIRECTORY_MODE
        } else {
            FILE_MODE
        }
    }

    pub fn attributes(&self) -> Attributes {
        Attributes {
            inode: self.inode,
            size: self.size(),
            mode: self.mode(),
            timestamp: self.timestamp,
            is_directory: self.is_directory,
        }
    }
}
