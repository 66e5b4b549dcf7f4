use serde::{Deserialize, Serialize};

/// Configuration for reading mzDB files
///
/// Values are applied as SQLite pragmas on the read-only connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Page cache size in KiB (`PRAGMA cache_size = -N`)
    pub cache_size_kib: u32,
    /// Memory-mapped I/O window in bytes, `0` disables mmap (`PRAGMA mmap_size`)
    pub mmap_size: u64,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            cache_size_kib: 16 * 1024,
            mmap_size: 0,
        }
    }
}

impl ReaderConfig {
    /// SQL batch setting every pragma of this configuration
    pub(super) fn pragmas(&self) -> String {
        format!(
            "PRAGMA query_only = ON; PRAGMA cache_size = -{}; PRAGMA mmap_size = {};",
            self.cache_size_kib, self.mmap_size
        )
    }
}
