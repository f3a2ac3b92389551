//! Single-writer advisory lock over the index directory (§5: "at most one
//! open `IndexWriter` per index directory at a time"). Takes an exclusive
//! `flock` on a sentinel file for the lifetime of the writer; released
//! automatically on drop.

use crate::core::error::{Error, ErrorKind, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

pub struct FileLock {
    _file: File,
    path: PathBuf,
}

impl FileLock {
    pub fn acquire(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join("write.lock");
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&path)?;
        lock_exclusive(&file).map_err(|_| {
            Error::new(
                ErrorKind::InvalidState,
                format!("index at {} is already open for writing", dir.display()),
            )
        })?;
        Ok(FileLock { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(unix)]
fn lock_exclusive(file: &File) -> std::io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let fd = file.as_raw_fd();
    let rc = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
    if rc != 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(())
    }
}

#[cfg(not(unix))]
fn lock_exclusive(_file: &File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
impl Drop for FileLock {
    fn drop(&mut self) {
        use std::os::unix::io::AsRawFd;
        let fd = self._file.as_raw_fd();
        unsafe {
            libc::flock(fd, libc::LOCK_UN);
        }
    }
}
