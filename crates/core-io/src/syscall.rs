//! EINTR-retrying wrappers around raw system calls.

use crate::error::{IoError, Result};

/// Upper bound on transparent EINTR retries before the interruption is
/// reported as a failure.
pub const MAX_EINTR_RETRIES: u32 = 100;

/// Run a syscall returning `-1` on failure, retrying EINTR up to
/// [`MAX_EINTR_RETRIES`] times. Every other failure (including EAGAIN, which
/// callers inspect via [`IoError::is_would_block`]) maps to an `IoError`
/// carrying `operation`.
pub fn retry<F>(operation: &'static str, mut call: F) -> Result<libc::c_int>
where
    F: FnMut() -> libc::c_int,
{
    let mut attempts = 0u32;
    loop {
        let ret = call();
        if ret >= 0 {
            return Ok(ret);
        }
        let err = IoError::last(operation);
        if err.errno != libc::EINTR {
            return Err(err);
        }
        attempts += 1;
        if attempts >= MAX_EINTR_RETRIES {
            return Err(err);
        }
    }
}

/// `retry` for calls returning a byte count (`read`).
pub fn retry_ssize<F>(operation: &'static str, mut call: F) -> Result<isize>
where
    F: FnMut() -> libc::ssize_t,
{
    let mut attempts = 0u32;
    loop {
        let ret = call();
        if ret >= 0 {
            return Ok(ret);
        }
        let err = IoError::last(operation);
        if err.errno != libc::EINTR {
            return Err(err);
        }
        attempts += 1;
        if attempts >= MAX_EINTR_RETRIES {
            return Err(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn set_errno(errno: i32) {
        // std reads errno through io::Error::last_os_error.
        unsafe {
            #[cfg(any(target_os = "linux", target_os = "android"))]
            {
                *libc::__errno_location() = errno;
            }
            #[cfg(any(target_os = "macos", target_os = "freebsd", target_os = "dragonfly"))]
            {
                *libc::__error() = errno;
            }
            #[cfg(any(target_os = "openbsd", target_os = "netbsd"))]
            {
                *libc::__errno() = errno;
            }
        }
    }

    #[test]
    fn success_passes_through() {
        assert_eq!(retry("noop", || 7).unwrap(), 7);
    }

    #[test]
    fn eintr_is_retried() {
        let remaining = Cell::new(3u32);
        let result = retry("flaky", || {
            if remaining.get() > 0 {
                remaining.set(remaining.get() - 1);
                set_errno(libc::EINTR);
                -1
            } else {
                0
            }
        });
        assert_eq!(result.unwrap(), 0);
        assert_eq!(remaining.get(), 0);
    }

    #[test]
    fn eintr_budget_exhaustion_reports_eintr() {
        let calls = Cell::new(0u32);
        let result = retry("stuck", || {
            calls.set(calls.get() + 1);
            set_errno(libc::EINTR);
            -1
        });
        let err = result.unwrap_err();
        assert_eq!(err.errno, libc::EINTR);
        assert_eq!(err.operation, "stuck");
        assert_eq!(calls.get(), MAX_EINTR_RETRIES);
    }

    #[test]
    fn other_errnos_surface_immediately() {
        let calls = Cell::new(0u32);
        let err = retry("bad", || {
            calls.set(calls.get() + 1);
            set_errno(libc::EBADF);
            -1
        })
        .unwrap_err();
        assert_eq!(err.errno, libc::EBADF);
        assert_eq!(calls.get(), 1);
    }
}
