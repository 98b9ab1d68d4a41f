//! Platform-specific directory paths.
//!
//! XDG on Linux, standard locations on macOS/Windows.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use directories::ProjectDirs;

const QUALIFIER: &str = "app";
const ORGANIZATION: &str = "wellspace";
const APPLICATION: &str = "wellspace";

const LATEST_LOG: &str = "latest.log";

/// Maximum number of old log files to keep.
const MAX_OLD_LOGS: usize = 25;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
}

/// Directory for the database.
///
/// - Linux: `$XDG_DATA_HOME/wellspace` or `~/.local/share/wellspace`
/// - macOS: `~/Library/Application Support/app.wellspace.wellspace`
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Directory for logs.
pub fn cache_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Default database location.
pub fn database_file() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("wellspace.db"))
}

/// Path of the log file written by the running server.
pub fn log_file() -> Option<PathBuf> {
    cache_dir().map(|dir| dir.join(LATEST_LOG))
}

/// Archives `latest.log` under a timestamped name and prunes old logs.
///
/// Call at startup before creating the new log file.
pub fn rotate_logs() {
    if let Some(cache) = cache_dir() {
        rotate_logs_in(&cache);
    }
}

fn rotate_logs_in(dir: &Path) {
    let latest = dir.join(LATEST_LOG);
    if latest.exists() {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let _ = fs::rename(&latest, dir.join(format!("{timestamp}.log")));
    }
    prune_old_logs(dir, MAX_OLD_LOGS);
}

/// Removes the oldest archived logs beyond `keep`.
fn prune_old_logs(dir: &Path, keep: usize) {
    let Ok(entries) = fs::read_dir(dir) else { return };

    let mut logs: Vec<_> = entries
        .filter_map(Result::ok)
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.ends_with(".log") && name != LATEST_LOG
        })
        .collect();
    if logs.len() <= keep {
        return;
    }

    // Oldest first
    logs.sort_by_key(|entry| entry.metadata().and_then(|m| m.modified()).ok());
    for entry in logs.iter().take(logs.len() - keep) {
        let _ = fs::remove_file(entry.path());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wellspace-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_rotate_archives_latest() {
        let dir = scratch_dir("rotate");
        fs::write(dir.join(LATEST_LOG), "old run").unwrap();

        rotate_logs_in(&dir);

        assert!(!dir.join(LATEST_LOG).exists());
        let archived: Vec<_> = fs::read_dir(&dir).unwrap().filter_map(Result::ok).collect();
        assert_eq!(archived.len(), 1);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir = scratch_dir("prune");
        for i in 0..5 {
            fs::write(dir.join(format!("2024010{i}_000000.log")), "x").unwrap();
        }
        fs::write(dir.join(LATEST_LOG), "current").unwrap();
        fs::write(dir.join("notes.txt"), "keep").unwrap();

        prune_old_logs(&dir, 2);

        let logs = fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".log"))
            .count();
        assert_eq!(logs, 3);
        assert!(dir.join(LATEST_LOG).exists());
        assert!(dir.join("notes.txt").exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
