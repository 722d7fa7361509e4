// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEntry {
    File { content: Vec<u8>, mode: u32 },
    Dir,
}

/// In-memory filesystem for tests. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir);

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.files.lock().unwrap();
        if let Some(parent) = path.parent() {
            Self::ensure_dir_entry(&mut files, parent);
        }
        files.insert(
            path,
            MockEntry::File {
                content: content.into(),
                mode: 0o644,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.files.lock().unwrap();
        Self::ensure_dir_entry(&mut files, path.as_ref());
    }

    /// Permission bits of a file, if it exists.
    pub fn mode_of(&self, path: impl AsRef<Path>) -> Option<u32> {
        let files = self.files.lock().unwrap();
        match files.get(path.as_ref()) {
            Some(MockEntry::File { mode, .. }) => Some(*mode),
            _ => None,
        }
    }

    /// All file paths currently present, sorted.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        let files = self.files.lock().unwrap();
        let mut paths: Vec<PathBuf> = files
            .iter()
            .filter(|(_, e)| matches!(e, MockEntry::File { .. }))
            .map(|(p, _)| p.clone())
            .collect();
        paths.sort();
        paths
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let path = if path.as_os_str().is_empty() {
            Path::new(".")
        } else {
            path
        };
        if files.contains_key(path) {
            return;
        }
        files.insert(path.to_path_buf(), MockEntry::Dir);
        if let Some(parent) = path.parent() {
            if parent != path {
                Self::ensure_dir_entry(files, parent);
            }
        }
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::File { .. }))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::Dir))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File { .. }) => {
                files.remove(path);
                Ok(())
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        if !matches!(files.get(path), Some(MockEntry::Dir)) {
            return Err(anyhow!("Not a directory or not found: {:?}", path));
        }
        files.retain(|p, _| !p.starts_with(path));
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        if !files.contains_key(from) {
            return Err(anyhow!("File not found: {:?}", from));
        }
        let moved: Vec<(PathBuf, MockEntry)> = files
            .iter()
            .filter(|(p, _)| p.starts_with(from))
            .map(|(p, e)| (p.clone(), e.clone()))
            .collect();
        for (old, entry) in moved {
            files.remove(&old);
            let suffix = old.strip_prefix(from).unwrap_or(Path::new(""));
            let new = if suffix.as_os_str().is_empty() {
                to.to_path_buf()
            } else {
                to.join(suffix)
            };
            files.insert(new, entry);
        }
        Ok(())
    }

    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(path) {
            Some(MockEntry::File { mode: m, .. }) => {
                *m = mode;
                Ok(())
            }
            Some(MockEntry::Dir) => Ok(()),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_file_creates_parent_dirs() {
        let fs = MockFileSystem::new();
        fs.add_file("work/miner/bin", b"x".to_vec());

        assert!(fs.is_dir(Path::new("work")));
        assert!(fs.is_dir(Path::new("work/miner")));
        assert!(fs.is_file(Path::new("work/miner/bin")));
        assert_eq!(fs.mode_of("work/miner/bin"), Some(0o644));
    }

    #[test]
    fn rename_moves_whole_subtree() {
        let fs = MockFileSystem::new();
        fs.add_file("staging/miner/bin", b"x".to_vec());
        fs.add_file("staging/miner/config.json", b"{}".to_vec());

        fs.rename(Path::new("staging/miner"), Path::new("miner")).unwrap();

        assert!(fs.is_file(Path::new("miner/bin")));
        assert!(fs.is_file(Path::new("miner/config.json")));
        assert!(!fs.exists(Path::new("staging/miner")));
    }

    #[test]
    fn remove_dir_all_removes_descendants_only() {
        let fs = MockFileSystem::new();
        fs.add_file("a/one", b"1".to_vec());
        fs.add_file("ab/two", b"2".to_vec());

        fs.remove_dir_all(Path::new("a")).unwrap();

        assert!(!fs.exists(Path::new("a/one")));
        assert!(fs.is_file(Path::new("ab/two")));
    }
}
