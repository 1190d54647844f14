//! IO failures with errno and operation context.

use thiserror::Error;

/// A non-recoverable system call failure. EINTR never surfaces here; it is
/// retried at the call site until the retry budget runs out, at which point
/// the EINTR itself is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed (errno {errno})")]
pub struct IoError {
    pub errno: i32,
    pub operation: &'static str,
}

impl IoError {
    pub fn new(errno: i32, operation: &'static str) -> IoError {
        IoError { errno, operation }
    }

    /// Capture the calling thread's current errno.
    pub fn last(operation: &'static str) -> IoError {
        let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(0);
        IoError { errno, operation }
    }

    /// EAGAIN/EWOULDBLOCK: not a failure, the caller treats it as "no data".
    pub fn is_would_block(&self) -> bool {
        self.errno == libc::EAGAIN || self.errno == libc::EWOULDBLOCK
    }
}

impl From<IoError> for std::io::Error {
    fn from(err: IoError) -> std::io::Error {
        std::io::Error::from_raw_os_error(err.errno)
    }
}

pub type Result<T> = std::result::Result<T, IoError>;
