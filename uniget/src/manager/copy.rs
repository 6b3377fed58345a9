//! Freshness-gated copying with bounded retry on transient contention.
//!
//! Destination files in a live project are frequently held open by the
//! editor or a virus scanner. Copies that fail with a transient error are
//! retried after a fixed delay, up to [`RetryPolicy::max_attempts`] times.

use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use filetime::FileTime;

use super::error::{ManagerError, ManagerResult};

/// Default number of attempts before giving up on a contended copy.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 100;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Bounded retry policy for transient filesystem errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `op`, retrying while it fails with a transient error.
    ///
    /// `path` names the contended resource in logs and errors.
    pub fn run<T, F>(&self, path: &Path, mut op: F) -> Result<T, RetryError>
    where
        F: FnMut() -> io::Result<T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if is_transient(&e) && attempt < max_attempts => {
                    tracing::warn!(
                        path = %path.display(),
                        attempt,
                        max_attempts,
                        error = %e,
                        "Transient copy failure, retrying"
                    );
                    thread::sleep(self.delay);
                    attempt += 1;
                }
                Err(e) if is_transient(&e) => {
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        source: e,
                    })
                }
                Err(e) => return Err(RetryError::Failed(e)),
            }
        }
    }
}

/// Outcome of a failed [`RetryPolicy::run`].
#[derive(Debug)]
pub enum RetryError {
    /// Every attempt failed transiently.
    Exhausted { attempts: u32, source: io::Error },
    /// A non-transient error; not retried.
    Failed(io::Error),
}

/// Whether an I/O error indicates temporary contention on the target.
pub fn is_transient(error: &io::Error) -> bool {
    if matches!(
        error.kind(),
        io::ErrorKind::PermissionDenied | io::ErrorKind::WouldBlock
    ) {
        return true;
    }
    #[cfg(unix)]
    {
        if let Some(code) = error.raw_os_error() {
            return code == libc::EBUSY || code == libc::ETXTBSY;
        }
    }
    false
}

/// Whether `src` should replace `dest`: `dest` is absent, or `src` was
/// modified strictly later.
pub fn is_newer(src: &Path, dest: &Path) -> io::Result<bool> {
    let dest_meta = match fs::metadata(dest) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e),
    };
    let src_modified = fs::metadata(src)?.modified()?;
    Ok(src_modified > dest_meta.modified()?)
}

/// Copy `src` over `dest`, giving `dest` the modification time of `src`.
///
/// Later freshness checks then compare package content against package
/// content rather than against the time of the previous install.
pub fn copy_preserving_mtime(src: &Path, dest: &Path) -> io::Result<()> {
    let modified = FileTime::from_last_modification_time(&fs::metadata(src)?);
    fs::copy(src, dest)?;
    filetime::set_file_mtime(dest, modified)
}

/// Copy `src` over `dest` if it is newer. Returns whether a copy happened.
pub fn copy_if_newer(src: &Path, dest: &Path) -> io::Result<bool> {
    if !is_newer(src, dest)? {
        return Ok(false);
    }
    copy_preserving_mtime(src, dest)?;
    Ok(true)
}

/// [`copy_if_newer`] under a retry policy, mapping failures to [`ManagerError`].
pub fn copy_if_newer_with_retry(
    src: &Path,
    dest: &Path,
    policy: &RetryPolicy,
) -> ManagerResult<bool> {
    policy
        .run(dest, || copy_if_newer(src, dest))
        .map_err(|e| into_manager_error(e, src, dest))
}

/// Unconditional copy under a retry policy.
pub fn copy_with_retry(src: &Path, dest: &Path, policy: &RetryPolicy) -> ManagerResult<()> {
    policy
        .run(dest, || copy_preserving_mtime(src, dest))
        .map_err(|e| into_manager_error(e, src, dest))
}

fn into_manager_error(error: RetryError, src: &Path, dest: &Path) -> ManagerError {
    match error {
        RetryError::Exhausted { attempts, source } => ManagerError::CopyContention {
            path: dest.to_path_buf(),
            attempts,
            source,
        },
        RetryError::Failed(source) => ManagerError::CopyFailed {
            from: src.to_path_buf(),
            to: dest.to_path_buf(),
            source,
        },
    }
}
