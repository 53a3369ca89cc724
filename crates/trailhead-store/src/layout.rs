//! Paths derived from the configured data-file location

use std::path::{Path, PathBuf};

const HISTORY_DIR: &str = "history";
const SCHEMA_FILE: &str = "schema.trails.json";
const LOCK_FILE: &str = ".trailhead.lock";

/// Filesystem layout of one pipeline instance
///
/// Passed explicitly to every component so several instances (tests,
/// staging copies) can run side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    data_file: PathBuf,
    data_dir: PathBuf,
}

impl DataLayout {
    pub fn new(data_file: impl Into<PathBuf>) -> Self {
        let data_file = data_file.into();
        let data_dir = match data_file.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            data_file,
            data_dir,
        }
    }

    /// The canonical dataset file
    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Directory holding the snapshot history
    pub fn history_dir(&self) -> PathBuf {
        self.data_dir.join(HISTORY_DIR)
    }

    /// Schema consulted by the Validation Gate
    pub fn schema_file(&self) -> PathBuf {
        self.data_dir.join(SCHEMA_FILE)
    }

    /// Advisory lock shared by every process publishing into this layout
    pub fn lock_file(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILE)
    }

    /// Whether a canonical dataset has ever been published
    pub fn canonical_exists(&self) -> bool {
        self.data_file.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_derive_from_data_file() {
        let layout = DataLayout::new("/srv/public/data/trails.json");
        assert_eq!(layout.data_dir(), Path::new("/srv/public/data"));
        assert_eq!(layout.history_dir(), PathBuf::from("/srv/public/data/history"));
        assert_eq!(
            layout.schema_file(),
            PathBuf::from("/srv/public/data/schema.trails.json")
        );
        assert_eq!(
            layout.lock_file(),
            PathBuf::from("/srv/public/data/.trailhead.lock")
        );
    }

    #[test]
    fn test_bare_file_name_uses_current_dir() {
        let layout = DataLayout::new("trails.json");
        assert_eq!(layout.data_dir(), Path::new("."));
        assert_eq!(layout.history_dir(), PathBuf::from("./history"));
    }
}
