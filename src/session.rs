//! Index session (C6): the one open index file a shell run operates on.
use crate::errors::Error;
use crate::storage::block::BlockDevice;
use crate::storage::{btree::BTree, header};
use std::fs::{File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Holds at most one open index at a time. `None` means no index is open —
/// every operation other than `create`/`open` then fails with `NoIndexOpen`.
pub struct Session {
    current: Option<(PathBuf, BTree)>,
}

impl Session {
    pub fn new() -> Self {
        Session { current: None }
    }

    /// Create a fresh index file at `path`. Fails with `FileExists` unless
    /// `overwrite` is set — the shell is responsible for asking the user
    /// before passing `overwrite = true`.
    pub fn create(&mut self, path: impl Into<PathBuf>, overwrite: bool) -> Result<(), Error> {
        let path = path.into();
        if path.exists() && !overwrite {
            return Err(Error::FileExists);
        }
        info!(path = %path.display(), "creating index file");
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        let mut device = BlockDevice::new(file);
        device.append_block()?; // block 0: the header
        header::write_fresh_header(&mut device)?;
        let tree = BTree::new(device, 0);
        self.current = Some((path, tree));
        Ok(())
    }

    /// Open an existing index file at `path`. Fails with `FileNotFound` if it
    /// doesn't exist, or `InvalidIndexFile` if the magic doesn't match.
    pub fn open(&mut self, path: impl Into<PathBuf>) -> Result<(), Error> {
        let path = path.into();
        if !path.exists() {
            return Err(Error::FileNotFound);
        }
        info!(path = %path.display(), "opening index file");
        let file: File = OpenOptions::new().read(true).write(true).open(&path)?;
        let mut device = BlockDevice::new(file);
        let header = header::read_header(&mut device)?;
        let tree = BTree::new(device, header.root_offset);
        self.current = Some((path, tree));
        Ok(())
    }

    fn tree_mut(&mut self) -> Result<&mut BTree, Error> {
        self.current
            .as_mut()
            .map(|(_, tree)| tree)
            .ok_or(Error::NoIndexOpen)
    }

    pub fn insert(&mut self, key: u32, value: u32) -> Result<(), Error> {
        let tree = self.tree_mut()?;
        debug!(key, value, "inserting key");
        tree.insert(key, value)
    }

    pub fn search(&mut self, key: u32) -> Result<Option<u32>, Error> {
        let tree = self.tree_mut()?;
        debug!(key, "searching for key");
        tree.search(key)
    }

    /// Bulk-load `key,value` lines from `path`. Malformed lines are reported
    /// by the caller (the loader parses, this just inserts); see
    /// `shell::loader` for the line-parsing policy.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<crate::shell::loader::LoadReport, Error> {
        info!(path = %path.as_ref().display(), "bulk-loading index");
        crate::shell::loader::load_into(self, path.as_ref())
    }

    pub fn print_all(&mut self, mut visit: impl FnMut(u32, u32)) -> Result<(), Error> {
        let tree = self.tree_mut()?;
        tree.traverse(&mut visit)
    }

    /// Write every key/value pair, ascending, as `"key,value\n"` lines to
    /// `path`.
    pub fn extract(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
        info!(path = %path.as_ref().display(), "extracting index to file");
        let tree = self.tree_mut()?;
        let mut out = File::create(path.as_ref())?;
        tree.extract_to(&mut out)?;
        out.flush()?;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn temp_path() -> PathBuf {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        // Drop the guard so the path doesn't exist yet — `create` wants a
        // fresh path unless `overwrite` is set.
        drop(file);
        path
    }

    #[test]
    fn no_index_open_rejects_operations() {
        let mut session = Session::new();
        assert!(matches!(session.insert(1, 1), Err(Error::NoIndexOpen)));
        assert!(matches!(session.search(1), Err(Error::NoIndexOpen)));
    }

    #[test]
    fn create_then_insert_then_search() {
        let path = temp_path();
        let mut session = Session::new();
        session.create(&path, false).unwrap();
        session.insert(7, 70).unwrap();
        assert_eq!(session.search(7).unwrap(), Some(70));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn create_without_overwrite_on_existing_path_fails() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        let mut session = Session::new();
        assert!(matches!(session.create(&path, false), Err(Error::FileExists)));
    }

    #[test]
    fn open_nonexistent_path_fails() {
        let path = temp_path();
        let mut session = Session::new();
        assert!(matches!(session.open(&path), Err(Error::FileNotFound)));
    }

    #[test]
    fn open_file_with_bad_magic_fails() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), [0u8; 512]).unwrap();
        let mut session = Session::new();
        assert!(matches!(
            session.open(file.path()),
            Err(Error::InvalidIndexFile)
        ));
    }

    #[test]
    fn extract_writes_ascending_lines() {
        let path = temp_path();
        let mut session = Session::new();
        session.create(&path, false).unwrap();
        session.insert(2, 20).unwrap();
        session.insert(1, 10).unwrap();
        let out_path = temp_path();
        session.extract(&out_path).unwrap();
        let contents = std::fs::read_to_string(&out_path).unwrap();
        assert_eq!(contents, "1,10\n2,20\n");
        std::fs::remove_file(&path).ok();
        std::fs::remove_file(&out_path).ok();
    }
}
