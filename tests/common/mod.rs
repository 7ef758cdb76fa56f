#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Create a temporary directory holding `files`, creating parent directories
/// for nested names
pub fn write_templates(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, source) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, source).unwrap();
    }
    dir
}

/// Rewrite `path` and move its modification time `secs` seconds forward so
/// the change is visible on filesystems with coarse timestamps
pub fn rewrite_with_new_mtime(path: &Path, source: &str, secs: u64) {
    let before = fs::metadata(path).unwrap().modified().unwrap();
    fs::write(path, source).unwrap();
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(before + Duration::from_secs(secs)).unwrap();
}

/// Poll `check` until it returns true or `timeout` elapses
pub fn wait_for<F>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = SystemTime::now();
    loop {
        if check() {
            return true;
        }
        if start.elapsed().unwrap_or_default() > timeout {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
