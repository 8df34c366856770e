//! Atomic I/O operations with file locking

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// Read text content from a file.
///
/// A missing file is reported as [`Error::NotFound`].
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Write content atomically to a file.
///
/// Uses write-to-temp-then-rename so a reader never observes a partial write.
/// The temp file lives in the target's directory so the rename stays on one
/// filesystem. When the target already exists its permissions are carried
/// over to the replacement.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    ensure_parent(path)?;

    let temp_path = temp_path_for(path);

    let result = write_temp(&temp_path, path, content)
        .and_then(|()| fs::rename(&temp_path, path).map_err(|e| Error::io(path, e)));

    if result.is_err() {
        // Never leave a stray temp file next to the live config.
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_temp(temp_path: &Path, target: &Path, content: &[u8]) -> Result<()> {
    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))?;

    if let Ok(meta) = fs::metadata(target) {
        fs::set_permissions(temp_path, meta.permissions()).map_err(|e| Error::io(temp_path, e))?;
    }

    Ok(())
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let temp_name = format!(
        ".{}.{}.tmp",
        path.file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    path.with_file_name(temp_name)
}

/// Write text content to a file atomically.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Exclusive advisory lock guarding mutations of one file.
///
/// The lock is taken on a sibling `<file>.lock` rather than the file itself
/// because the file is replaced by rename on every write. Released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the exclusive lock for `target` is held.
    ///
    /// Missing parent directories are created, so a lock can be taken before
    /// the first write of a new file.
    pub fn acquire(target: &Path) -> Result<Self> {
        let path = lock_path_for(target);
        ensure_parent(&path)?;
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;

        file.lock_exclusive()
            .map_err(|_| Error::LockFailed {
                path: target.to_path_buf(),
            })?;

        Ok(Self { file, path })
    }

    /// Path of the lock file on disk.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// Path of the sibling lock file used for `target`.
pub fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_atomic_creates_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pjsip.conf");

        write_text(&path, "[global]\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[global]\n");
    }

    #[test]
    fn test_write_atomic_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pjsip.conf");

        write_text(&path, "one").unwrap();
        write_text(&path, "two").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["pjsip.conf".to_string()]);
    }

    #[test]
    fn test_read_missing_file_is_not_found() {
        let dir = tempdir().unwrap();
        let err = read_text(&dir.path().join("missing.conf")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_lock_path_is_sibling() {
        let path = Path::new("/etc/asterisk/pjsip.conf");
        assert_eq!(
            lock_path_for(path),
            PathBuf::from("/etc/asterisk/pjsip.conf.lock")
        );
    }

    #[test]
    fn test_lock_creates_missing_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("extensions.toml");

        let lock = FileLock::acquire(&path).unwrap();

        assert!(lock.path().exists());
        assert!(!path.exists());
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pjsip.conf");

        {
            let _lock = FileLock::acquire(&path).unwrap();
        }
        // Would block forever if the first guard had leaked its lock.
        let lock = FileLock::acquire(&path).unwrap();
        assert!(lock.path().exists());
    }
}
