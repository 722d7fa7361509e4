#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use minerlaunch_test_utils::builders::{
    ConfigFileBuilder, TEST_ARCHIVE_URL, TEST_EXECUTABLE, TEST_EXTRACT_DIR,
};
pub use minerlaunch_test_utils::{init_tracing, with_timeout};

/// Write a `/bin/sh` script at `dir/name` with the given mode.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str, mode: u32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
    path
}

#[cfg(unix)]
pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).unwrap().permissions().mode() & 0o777
}

/// Poll until `path` exists; panics after `timeout`.
pub async fn wait_for_file(path: &Path, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !path.exists() {
        if tokio::time::Instant::now() >= deadline {
            panic!("{} did not appear within {:?}", path.display(), timeout);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Blocking variant of [`wait_for_file`], for driving the binary.
pub fn wait_for_file_blocking(path: &Path, timeout: Duration) {
    let deadline = std::time::Instant::now() + timeout;
    while !path.exists() {
        if std::time::Instant::now() >= deadline {
            panic!("{} did not appear within {:?}", path.display(), timeout);
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}
