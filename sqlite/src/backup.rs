//! Numbered backups of the database file.
//!
//! A backup of `collectionsSQLite` is written next to it as
//! `collectionsSQLite_backup`, then `collectionsSQLite_backup1`,
//! `collectionsSQLite_backup2`, ... using the first name that is free. The
//! backup file is created with `create_new`, so an existing backup is never
//! overwritten even if another process races for the same name. A backup
//! that fails partway is removed again.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use rusqlite::params;
use tracing::{info, warn};

use crate::error::Result;
use crate::store::Database;

/// Returns the `n`th backup name for `original` (`n == 0` is unnumbered).
pub fn backup_path(original: &Path, n: u32) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = original
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let number = if n == 0 { String::new() } else { n.to_string() };
    original.with_file_name(format!("{stem}_backup{number}{suffix}"))
}

/// Copies `original` to the first unused backup name and returns that path.
///
/// This is a plain byte copy of the main file. Pages still held in a `-wal`
/// journal are not included, so use [`snapshot_database`] while a
/// connection to `original` is open.
pub fn backup_database(original: &Path) -> Result<PathBuf> {
    let mut source = File::open(original)?;
    let (candidate, mut target) = reserve_backup(original)?;
    let copied = io::copy(&mut source, &mut target).and_then(|_| target.sync_all());
    drop(target);
    if let Err(err) = copied {
        discard(&candidate);
        return Err(err.into());
    }
    info!(backup = %candidate.display(), "backed up collections database");
    Ok(candidate)
}

/// Writes a consistent snapshot of `db` to the first unused backup name of
/// `original` and returns that path.
///
/// The snapshot is taken with `VACUUM INTO`, so committed pages that are
/// still in the write-ahead log are included. Must not be called inside a
/// transaction.
pub fn snapshot_database(db: &Database, original: &Path) -> Result<PathBuf> {
    let (candidate, target) = reserve_backup(original)?;
    drop(target);
    let target_name = candidate.to_string_lossy().into_owned();
    if let Err(err) = db.execute("VACUUM INTO ?1", params![target_name]) {
        discard(&candidate);
        return Err(err);
    }
    info!(backup = %candidate.display(), "snapshotted collections database");
    Ok(candidate)
}

/// Creates the first free backup file for `original`, empty.
fn reserve_backup(original: &Path) -> Result<(PathBuf, File)> {
    let mut n = 0;
    loop {
        let candidate = backup_path(original, n);
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(err) => return Err(err.into()),
        }
    }
}

fn discard(candidate: &Path) {
    if let Err(err) = fs::remove_file(candidate) {
        warn!(backup = %candidate.display(), %err, "failed to remove incomplete backup");
    }
}
