//! Timestamped backups of a file taken before it is mutated.
//!
//! A backup of `pjsip.conf` is written next to it as
//! `pjsip.conf.20261018T101500123456Z.bak`. The timestamp is fixed-width UTC
//! so lexical order of backup names is chronological order.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};

use crate::{Error, Result};

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%6fZ";
const TIMESTAMP_LEN: usize = 22;
const BACKUP_EXTENSION: &str = "bak";

/// Path a backup of `path` taken at `at` would be written to.
pub fn backup_path(path: &Path, at: DateTime<Utc>) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.{}", at.format(TIMESTAMP_FORMAT), BACKUP_EXTENSION));
    path.with_file_name(name)
}

/// Copy `path` to a new timestamped backup next to it.
///
/// Never overwrites an earlier backup: if the timestamp is already taken
/// the next free microsecond is used.
pub fn create_backup(path: &Path) -> Result<PathBuf> {
    if !path.exists() {
        return Err(Error::NotFound {
            path: path.to_path_buf(),
        });
    }

    let mut at = Utc::now();
    let mut dest = backup_path(path, at);
    while dest.exists() {
        at += Duration::microseconds(1);
        dest = backup_path(path, at);
    }

    fs::copy(path, &dest).map_err(|source| Error::Backup {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(file = %path.display(), backup = %dest.display(), "Created backup");
    Ok(dest)
}

/// All backups of `path`, oldest first.
pub fn list_backups(path: &Path) -> Result<Vec<PathBuf>> {
    let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
        return Ok(Vec::new());
    };
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(&dir, e)),
    };

    let prefix = format!("{}.", file_name);
    let suffix = format!(".{}", BACKUP_EXTENSION);

    let mut backups: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            name.strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(&suffix))
                .is_some_and(is_backup_timestamp)
        })
        .map(|entry| entry.path())
        .collect();

    backups.sort();
    Ok(backups)
}

/// Delete the oldest backups of `path` so at most `keep` remain.
///
/// Returns the removed paths.
pub fn prune_backups(path: &Path, keep: usize) -> Result<Vec<PathBuf>> {
    let backups = list_backups(path)?;
    if backups.len() <= keep {
        return Ok(Vec::new());
    }

    let excess = backups.len() - keep;
    let mut removed = Vec::with_capacity(excess);
    for old in backups.into_iter().take(excess) {
        fs::remove_file(&old).map_err(|e| Error::io(&old, e))?;
        removed.push(old);
    }

    tracing::debug!(file = %path.display(), removed = removed.len(), "Pruned backups");
    Ok(removed)
}

fn is_backup_timestamp(ts: &str) -> bool {
    ts.len() == TIMESTAMP_LEN
        && ts.ends_with('Z')
        && ts.char_indices().all(|(i, c)| match i {
            8 => c == 'T',
            21 => c == 'Z',
            _ => c.is_ascii_digit(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_backup_path_format() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 10, 15, 0).unwrap();
        let path = backup_path(Path::new("/etc/asterisk/pjsip.conf"), at);
        assert_eq!(
            path,
            PathBuf::from("/etc/asterisk/pjsip.conf.20261018T101500000000Z.bak")
        );
    }

    #[test]
    fn test_backup_names_sort_chronologically() {
        let early = Utc.with_ymd_and_hms(2026, 1, 9, 23, 59, 59).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap();
        let p = Path::new("pjsip.conf");
        assert!(backup_path(p, early) < backup_path(p, late));
    }

    #[test]
    fn test_is_backup_timestamp() {
        assert!(is_backup_timestamp("20261018T101500123456Z"));
        assert!(!is_backup_timestamp("20261018T101500Z"));
        assert!(!is_backup_timestamp("20261018X101500123456Z"));
        assert!(!is_backup_timestamp("manual"));
    }

    #[test]
    fn test_create_backup_copies_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pjsip.conf");
        fs::write(&path, "original").unwrap();

        let backup = create_backup(&path).unwrap();

        assert_eq!(fs::read_to_string(&backup).unwrap(), "original");
        assert_eq!(list_backups(&path).unwrap(), vec![backup]);
    }

    #[test]
    fn test_create_backup_missing_source() {
        let dir = tempdir().unwrap();
        let err = create_backup(&dir.path().join("nope.conf")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_consecutive_backups_do_not_collide() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pjsip.conf");
        fs::write(&path, "x").unwrap();

        let a = create_backup(&path).unwrap();
        let b = create_backup(&path).unwrap();

        assert_ne!(a, b);
        assert_eq!(list_backups(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_list_ignores_unrelated_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pjsip.conf");
        fs::write(&path, "x").unwrap();
        fs::write(dir.path().join("pjsip.conf.old.bak"), "x").unwrap();
        fs::write(dir.path().join("extensions.conf.20261018T101500000000Z.bak"), "x").unwrap();

        assert!(list_backups(&path).unwrap().is_empty());
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pjsip.conf");
        for (i, day) in [1, 2, 3, 4].iter().enumerate() {
            let at = Utc.with_ymd_and_hms(2026, 10, *day, 0, 0, 0).unwrap();
            fs::write(backup_path(&path, at), i.to_string()).unwrap();
        }

        let removed = prune_backups(&path, 2).unwrap();

        assert_eq!(removed.len(), 2);
        let left = list_backups(&path).unwrap();
        assert_eq!(left.len(), 2);
        assert_eq!(fs::read_to_string(&left[0]).unwrap(), "2");
        assert_eq!(fs::read_to_string(&left[1]).unwrap(), "3");
    }
}
