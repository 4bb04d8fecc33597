//! Image corpus discovery.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::InputConfig;

/// Finds benchmark images in the corpus directory.
pub struct FileDiscovery {
    config: InputConfig,
}

/// An image found in the corpus.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Bare file name, used for cache keys and ground-truth lookup
    pub file_name: String,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    pub fn new(config: InputConfig) -> Self {
        Self { config }
    }

    /// List supported images directly inside `dir`, in directory-listing order.
    ///
    /// Subdirectories are not descended into. Unreadable entries and names
    /// that are not valid UTF-8 are skipped with a warning.
    pub fn discover(&self, dir: &Path) -> Vec<DiscoveredFile> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable corpus entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.is_supported(entry.path()) {
                continue;
            }
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!("Skipping non UTF-8 file name {:?}", entry.path());
                continue;
            };
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            files.push(DiscoveredFile {
                path: entry.path().to_path_buf(),
                file_name,
                size,
            });
        }

        files
    }

    /// Extension check, case-sensitive.
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.config.extensions.iter().any(|known| known == ext))
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
