use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{PROBE_FILE_PREFIX, TEST_FILE_PREFIX};

static PROBE_COUNTER: AtomicU64 = AtomicU64::new(0);
static TEST_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Test file wrapper with automatic cleanup
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    cleanup_on_drop: bool,
}

impl TempFile {
    /// Reserve the benchmark test file path inside `target_dir`
    pub fn for_volume(target_dir: &Path) -> Self {
        let name = format!(
            "{}{}_{}.dat",
            TEST_FILE_PREFIX,
            process::id(),
            TEST_FILE_COUNTER.fetch_add(1, Ordering::Relaxed)
        );
        Self {
            path: target_dir.join(name),
            cleanup_on_drop: true,
        }
    }

    /// Disable automatic cleanup (for debugging)
    pub fn keep_on_drop(&mut self) {
        self.cleanup_on_drop = false;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open (and truncate) the file for the write pass
    pub fn open_write(&self) -> io::Result<File> {
        platform::open_write(&self.path)
    }

    /// Open the file for the read pass
    pub fn open_read(&self) -> io::Result<File> {
        platform::open_read(&self.path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if self.cleanup_on_drop {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Check that a marker file can be created and removed in `dir`
///
/// Every failure (missing directory, permissions, read-only filesystem, I/O
/// error) counts as not writable.
pub fn probe_writable(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }

    let marker = dir.join(format!(
        "{}{}_{}",
        PROBE_FILE_PREFIX,
        process::id(),
        PROBE_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let created = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&marker)
        .and_then(|mut file| {
            use std::io::Write;
            file.write_all(b"diskio")?;
            file.sync_all()
        });

    match created {
        Ok(()) => std::fs::remove_file(&marker).is_ok(),
        Err(_) => {
            let _ = std::fs::remove_file(&marker);
            false
        }
    }
}

/// Ask the OS to drop cached pages of `file` so the read pass hits the device
pub fn drop_cached_pages(file: &File) {
    platform::drop_cached_pages(file);
}

#[cfg(unix)]
mod platform {
    use super::*;

    pub fn open_write(path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
    }

    pub fn open_read(path: &Path) -> io::Result<File> {
        OpenOptions::new().read(true).open(path)
    }

    #[cfg(target_os = "linux")]
    pub fn drop_cached_pages(file: &File) {
        use std::os::unix::io::AsRawFd;
        // SAFETY: the descriptor is owned by `file` and stays open for the call.
        let rc = unsafe { libc::posix_fadvise(file.as_raw_fd(), 0, 0, libc::POSIX_FADV_DONTNEED) };
        if rc != 0 {
            tracing::debug!(rc, "posix_fadvise(DONTNEED) failed");
        }
    }

    #[cfg(not(target_os = "linux"))]
    pub fn drop_cached_pages(_file: &File) {}
}

#[cfg(windows)]
mod platform {
    use super::*;
    use std::os::windows::fs::OpenOptionsExt;

    const FILE_FLAG_WRITE_THROUGH: u32 = 0x80000000;

    pub fn open_write(path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .custom_flags(FILE_FLAG_WRITE_THROUGH)
            .open(path)
    }

    pub fn open_read(path: &Path) -> io::Result<File> {
        OpenOptions::new().read(true).open(path)
    }

    pub fn drop_cached_pages(_file: &File) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_temp_file_cleanup() {
        let temp_dir = tempdir().unwrap();
        let temp_file = TempFile::for_volume(temp_dir.path());
        temp_file.open_write().unwrap();
        assert!(temp_file.path().exists());

        let path = temp_file.path().to_owned();
        drop(temp_file);
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_file_keep_on_drop() {
        let temp_dir = tempdir().unwrap();
        let mut temp_file = TempFile::for_volume(temp_dir.path());
        temp_file.open_write().unwrap();
        temp_file.keep_on_drop();

        let path = temp_file.path().to_owned();
        drop(temp_file);
        assert!(path.exists());
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_temp_files_in_same_volume_are_distinct() {
        let temp_dir = tempdir().unwrap();
        let first = TempFile::for_volume(temp_dir.path());
        let second = TempFile::for_volume(temp_dir.path());
        assert_ne!(first.path(), second.path());

        let name = first.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(TEST_FILE_PREFIX));
        assert!(name.ends_with(".dat"));
    }

    #[test]
    fn test_probe_writable_directory() {
        let temp_dir = tempdir().unwrap();
        assert!(probe_writable(temp_dir.path()));

        // the marker must not be left behind
        let leftovers = std::fs::read_dir(temp_dir.path()).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_probe_missing_directory() {
        let temp_dir = tempdir().unwrap();
        assert!(!probe_writable(&temp_dir.path().join("does-not-exist")));
    }

    #[test]
    fn test_probe_regular_file() {
        let temp_dir = tempdir().unwrap();
        let file_path = temp_dir.path().join("plain.txt");
        std::fs::write(&file_path, b"x").unwrap();
        assert!(!probe_writable(&file_path));
    }
}
