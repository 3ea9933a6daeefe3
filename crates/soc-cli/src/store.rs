//! On-disk stream storage: the one concrete [`soc_core::present::Store`]
//! implementation, performing atomic replace via temp-file rename.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use soc_core::{ArenaBacking, ArenaError, FileArena};
use soc_core::present::Store;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        FileStore { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn arena_open_err(e: ArenaError) -> io::Error {
    match e {
        ArenaError::Io(err) => err,
        other => io::Error::new(io::ErrorKind::Other, other.to_string()),
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."));
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("stream.md");
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    dir.join(format!(".{name}.tmp_{}_{nonce}", std::process::id()))
}

impl Store for FileStore {
    /// A missing file is not an error: it is the "store does not exist"
    /// case, represented as a zero-sized empty arena.
    fn open(&self) -> io::Result<Arc<dyn ArenaBacking>> {
        match File::open(&self.path) {
            Ok(f) => FileArena::open(f).map(|a| a as Arc<dyn ArenaBacking>).map_err(arena_open_err),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(FileArena::empty() as Arc<dyn ArenaBacking>),
            Err(e) => Err(e),
        }
    }

    /// Creation uses `O_EXCL`-equivalent semantics so two racing first-runs
    /// cannot silently clobber each other; once the file exists, every
    /// subsequent commit goes through write-temp-then-rename.
    fn commit(&self, bytes: &[u8]) -> io::Result<()> {
        if !self.path.exists() {
            match OpenOptions::new().write(true).create_new(true).open(&self.path) {
                Ok(mut f) => {
                    f.write_all(bytes)?;
                    f.sync_all()?;
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    // Lost the creation race; fall through to the atomic
                    // replace path below as if the file had always existed.
                }
                Err(e) => return Err(e),
            }
        }

        let tmp_path = temp_sibling(&self.path);
        let write_result = (|| -> io::Result<()> {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(bytes)?;
            tmp.sync_all()?;
            Ok(())
        })();

        if let Err(e) = write_result {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soc_core::present::{PresentEngine, default_items};
    use tempfile::TempDir;

    #[test]
    fn missing_file_opens_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("stream.md"));
        let arena = store.open().unwrap();
        assert_eq!(arena.size(), 0);
    }

    #[test]
    fn commit_creates_then_replaces_atomically() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stream.md");
        let store = FileStore::new(path.clone());

        store.commit(b"first\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");

        store.commit(b"second\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");

        let leftover: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp_"))
            .collect();
        assert!(leftover.is_empty(), "no temp file should survive a successful commit");
    }

    #[test]
    fn failed_rename_leaves_store_untouched_and_cleans_up_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stream.md");
        // Pre-create the destination as a directory: the temp file write
        // still succeeds, but `fs::rename` of a regular file onto an
        // existing directory fails, exercising the abort path.
        fs::create_dir(&path).unwrap();
        let store = FileStore::new(path.clone());

        let err = store.commit(b"new content\n").unwrap_err();
        assert_ne!(err.kind(), io::ErrorKind::NotFound);

        assert!(path.is_dir(), "a failed commit must not touch the original store");

        let leftover: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp_"))
            .collect();
        assert!(leftover.is_empty(), "a failed commit must remove its temp file");
    }

    #[test]
    fn engine_round_trips_through_a_real_file() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path().join("stream.md"));
        let mut engine = PresentEngine::new(default_items()).unwrap();
        engine.load(&store).unwrap();
        engine.collect(&store).unwrap();

        let mut engine2 = PresentEngine::new(default_items()).unwrap();
        engine2.load(&store).unwrap();
        assert!(engine2.today().is_set());
    }
}
