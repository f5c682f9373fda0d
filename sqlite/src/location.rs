//! Locating the Collections database file on disk.
//!
//! Edge keeps one `collectionsSQLite` file per browser profile:
//!
//! | Platform | Location |
//! |----------|----------|
//! | Windows  | `%LOCALAPPDATA%\Microsoft\Edge\User Data\<profile>\Collections\collectionsSQLite` |
//! | macOS    | `~/Library/Application Support/Microsoft Edge/<profile>/Collections/collectionsSQLite` |
//! | Linux    | `~/.config/microsoft-edge/<profile>/Collections/collectionsSQLite` |

use std::path::{Path, PathBuf};
use std::process::Command;

use directories::BaseDirs;
use tracing::{info, warn};

use crate::error::{Result, SqliteError};

/// Profile used when none is configured.
pub const DEFAULT_PROFILE: &str = "Default";

/// File name of the Collections database inside a profile.
pub const DATABASE_FILE_NAME: &str = "collectionsSQLite";

/// Returns the platform's default database location for `profile`.
///
/// Returns `None` if the user's home directory cannot be determined.
pub fn default_database_path(profile: &str) -> Option<PathBuf> {
    let dirs = BaseDirs::new()?;
    let user_data = if cfg!(target_os = "windows") {
        dirs.data_local_dir().join("Microsoft").join("Edge").join("User Data")
    } else if cfg!(target_os = "macos") {
        dirs.data_dir().join("Microsoft Edge")
    } else {
        dirs.config_dir().join("microsoft-edge")
    };
    Some(user_data.join(profile).join("Collections").join(DATABASE_FILE_NAME))
}

/// Picks the database file to open.
///
/// The supplied path wins when it exists; otherwise the default location is
/// tried.
///
/// # Errors
///
/// - [`SqliteError::NotFound`] if neither candidate exists
/// - [`SqliteError::InvalidPath`] if the chosen path is not a regular file
pub fn resolve_database_path(supplied: Option<&Path>, default: Option<PathBuf>) -> Result<PathBuf> {
    let chosen = match supplied {
        Some(path) if path.exists() => Some(path.to_path_buf()),
        Some(path) => {
            warn!(path = %path.display(), "database path does not exist, trying default location");
            default.clone().filter(|d| d.exists())
        }
        None => default.clone().filter(|d| d.exists()),
    };

    let Some(path) = chosen else {
        let reported = supplied
            .map(Path::to_path_buf)
            .or(default)
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME));
        return Err(SqliteError::NotFound(reported));
    };

    if !path.is_file() {
        return Err(SqliteError::InvalidPath(path));
    }
    Ok(path)
}

/// Shows `path` in the platform file manager.
pub fn reveal(path: &Path) -> Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = Command::new("explorer");
        c.arg(format!("/select,{}", path.display()));
        c
    } else if cfg!(target_os = "macos") {
        let mut c = Command::new("open");
        c.arg("-R").arg(path);
        c
    } else {
        let mut c = Command::new("xdg-open");
        c.arg(path.parent().unwrap_or(path));
        c
    };
    info!(path = %path.display(), "revealing database location");
    command.spawn()?;
    Ok(())
}
