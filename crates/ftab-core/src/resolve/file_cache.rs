use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

use rand::Rng;

/// Read-through cache of text files split into lines, keyed by path.
///
/// Concurrent first reads of the same path may both hit the disk; the first
/// insert wins and readers only ever see a complete line list.
#[derive(Debug, Default)]
pub struct FileLineCache {
    entries: RwLock<HashMap<PathBuf, Arc<Vec<String>>>>,
}

impl FileLineCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide cache used by `$randomFromFile`.
    pub fn global() -> &'static FileLineCache {
        static GLOBAL: OnceLock<FileLineCache> = OnceLock::new();
        GLOBAL.get_or_init(FileLineCache::new)
    }

    /// Lines of `path`, loading them on first use. `None` if the file cannot
    /// be read.
    pub fn lines(&self, path: &Path) -> Option<Arc<Vec<String>>> {
        if let Ok(entries) = self.entries.read() {
            if let Some(lines) = entries.get(path) {
                return Some(Arc::clone(lines));
            }
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "random line source unreadable");
                return None;
            }
        };
        let loaded = Arc::new(content.lines().map(str::to_string).collect::<Vec<_>>());

        match self.entries.write() {
            Ok(mut entries) => Some(Arc::clone(
                entries.entry(path.to_path_buf()).or_insert(loaded),
            )),
            // A poisoned lock only means another writer panicked; serve what
            // was just read without caching it.
            Err(_) => Some(loaded),
        }
    }

    /// A uniformly chosen line of `path`, or `""` when the file is unreadable
    /// or empty.
    pub fn random_line(&self, path: &Path) -> String {
        match self.lines(path) {
            Some(lines) if !lines.is_empty() => {
                let idx = rand::thread_rng().gen_range(0..lines.len());
                lines[idx].clone()
            }
            _ => String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
