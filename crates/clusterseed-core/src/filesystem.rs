use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ResultExt, SeedError, SeedResult};

/// Environment variable that relocates the clusterseed home directory
pub const HOME_ENV: &str = "CLUSTERSEED_HOME";

/// Get the clusterseed directory (~/.clusterseed, or $CLUSTERSEED_HOME)
pub fn base_dir() -> SeedResult<PathBuf> {
    if let Ok(dir) = std::env::var(HOME_ENV) {
        if !dir.is_empty() {
            return Ok(expand_path(&dir));
        }
    }

    let home_dir = dirs::home_dir()
        .ok_or_else(|| SeedError::Configuration("Unable to determine home directory".to_string()))?;

    Ok(home_dir.join(".clusterseed"))
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).into_owned()),
    }
}

/// Ensures a directory exists, creating it if necessary
pub fn ensure_dir_exists(path: &Path) -> SeedResult<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(SeedError::Filesystem {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::AlreadyExists, "Path exists but is not a directory"),
        });
    }
    Ok(())
}

/// Ensures a parent directory exists for a file path
pub fn ensure_parent_dir_exists(file_path: &Path) -> SeedResult<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir_exists(parent)?;
        }
    }
    Ok(())
}

/// Checks if a file exists
pub fn file_exists(path: &Path) -> bool {
    path.exists() && path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_nested_parent_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a").join("b").join("topology.toml");

        ensure_parent_dir_exists(&file).unwrap();

        assert!(tmp.path().join("a").join("b").is_dir());
        assert!(!file_exists(&file));
    }

    #[test]
    fn rejects_file_in_place_of_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("taken");
        fs::write(&file, "x").unwrap();

        let err = ensure_dir_exists(&file).unwrap_err();
        assert!(matches!(err, SeedError::Filesystem { .. }));
    }

    #[test]
    fn plain_paths_are_left_alone() {
        assert_eq!(expand_path("/tmp/topology.toml"), PathBuf::from("/tmp/topology.toml"));
    }
}
