//! The controlling terminal device.
//!
//! BSDs open `/dev/tty` once read-write; elsewhere a write handle and a
//! separate read-only handle are used so the reader can sit in `select`
//! without entangling the writer.

use crate::error::{IoError, Result};
use crate::mode::{ModeControl, TerminalMode};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::{AsRawFd, RawFd};

pub struct Tty {
    write: File,
    read: Option<File>,
    mode: ModeControl,
}

impl Tty {
    /// Open the controlling terminal. Fails with the `open` errno when the
    /// process has no controlling tty.
    pub fn open() -> Result<Tty> {
        #[cfg(any(
            target_os = "macos",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        ))]
        {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open("/dev/tty")
                .map_err(io_to_open_error)?;
            let fd = file.as_raw_fd();
            Ok(Tty {
                write: file,
                read: None,
                mode: ModeControl::new(fd),
            })
        }
        #[cfg(not(any(
            target_os = "macos",
            target_os = "freebsd",
            target_os = "openbsd",
            target_os = "netbsd",
            target_os = "dragonfly"
        )))]
        {
            let write = OpenOptions::new()
                .write(true)
                .open("/dev/tty")
                .map_err(io_to_open_error)?;
            let read = OpenOptions::new()
                .read(true)
                .open("/dev/tty")
                .map_err(io_to_open_error)?;
            let read_fd = read.as_raw_fd();
            Ok(Tty {
                write,
                read: Some(read),
                mode: ModeControl::new(read_fd),
            })
        }
    }

    /// Descriptor input is read from.
    pub fn read_fd(&self) -> RawFd {
        match &self.read {
            Some(file) => file.as_raw_fd(),
            None => self.write.as_raw_fd(),
        }
    }

    /// Descriptor output is written to.
    pub fn write_fd(&self) -> RawFd {
        self.write.as_raw_fd()
    }

    pub fn set_mode(&mut self, mode: TerminalMode) -> Result<()> {
        self.mode.set_mode(mode)
    }

    pub fn current_mode(&self) -> Option<TerminalMode> {
        self.mode.current_mode()
    }

    /// Restore the termios snapshot. Cleanup path: errors are logged, not
    /// propagated.
    pub fn restore(&mut self) {
        if let Err(err) = self.mode.restore() {
            tracing::warn!(target: "termisu.tty", %err, "termios restore failed");
        }
    }

    /// Current window size as `(width, height)` via `TIOCGWINSZ`.
    pub fn size(&self) -> Result<(i32, i32)> {
        window_size(self.write_fd())
    }
}

impl Write for Tty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.write.flush()
    }
}

impl Drop for Tty {
    fn drop(&mut self) {
        self.restore();
    }
}

fn io_to_open_error(err: io::Error) -> IoError {
    IoError::new(err.raw_os_error().unwrap_or(libc::EIO), "open failed")
}

/// `ioctl(TIOCGWINSZ)` on an arbitrary descriptor.
pub fn window_size(fd: RawFd) -> Result<(i32, i32)> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    if unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut ws) } != 0 {
        return Err(IoError::last("ioctl(TIOCGWINSZ) failed"));
    }
    Ok((ws.ws_col as i32, ws.ws_row as i32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_size_rejects_non_tty() {
        let mut fds = [0i32; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let err = window_size(fds[0]).unwrap_err();
        assert_eq!(err.operation, "ioctl(TIOCGWINSZ) failed");
        unsafe {
            libc::close(fds[0]);
            libc::close(fds[1]);
        }
    }
}
