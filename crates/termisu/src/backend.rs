//! Output and termios backends for the terminal facade.

use core_io::{TerminalMode, Tty};
use std::io::{self, Write};
use std::os::unix::io::RawFd;
use std::sync::{Arc, Mutex};

/// Everything the facade needs from the device under it: byte output,
/// geometry, and termios mode control. Production code uses [`TtyBackend`];
/// tests capture bytes with [`TestBackend`].
pub trait Backend: Write + Send {
    fn size(&self) -> core_io::Result<(i32, i32)>;
    fn set_mode(&mut self, mode: TerminalMode) -> core_io::Result<()>;
    fn current_mode(&self) -> Option<TerminalMode>;
    /// Restore the original termios. Cleanup path: must not fail loudly.
    fn restore(&mut self);
    /// Descriptor input should be read from, or `None` when the backend has
    /// no real device (tests).
    fn read_fd(&self) -> Option<RawFd>;
}

/// The real `/dev/tty` backend.
pub struct TtyBackend {
    tty: Tty,
}

impl TtyBackend {
    pub fn open() -> core_io::Result<TtyBackend> {
        Ok(TtyBackend { tty: Tty::open()? })
    }
}

impl Write for TtyBackend {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tty.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.tty.flush()
    }
}

impl Backend for TtyBackend {
    fn size(&self) -> core_io::Result<(i32, i32)> {
        self.tty.size()
    }

    fn set_mode(&mut self, mode: TerminalMode) -> core_io::Result<()> {
        self.tty.set_mode(mode)
    }

    fn current_mode(&self) -> Option<TerminalMode> {
        self.tty.current_mode()
    }

    fn restore(&mut self) {
        self.tty.restore();
    }

    fn read_fd(&self) -> Option<RawFd> {
        Some(self.tty.read_fd())
    }
}

/// In-memory backend: captures emitted bytes and mode transitions for
/// assertions, with a fixed reported size.
pub struct TestBackend {
    output: Arc<Mutex<Vec<u8>>>,
    size: (i32, i32),
    mode: Option<TerminalMode>,
    pub mode_transitions: Vec<TerminalMode>,
    restored: bool,
}

impl TestBackend {
    pub fn new(width: i32, height: i32) -> TestBackend {
        TestBackend {
            output: Arc::new(Mutex::new(Vec::new())),
            size: (width, height),
            mode: None,
            mode_transitions: Vec::new(),
            restored: false,
        }
    }

    /// Shared handle to the captured byte stream; clone before handing the
    /// backend to a terminal.
    pub fn output(&self) -> Arc<Mutex<Vec<u8>>> {
        Arc::clone(&self.output)
    }

    pub fn was_restored(&self) -> bool {
        self.restored
    }
}

impl Write for TestBackend {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.output
            .lock()
            .map_err(|_| io::Error::other("test backend poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Backend for TestBackend {
    fn size(&self) -> core_io::Result<(i32, i32)> {
        Ok(self.size)
    }

    fn set_mode(&mut self, mode: TerminalMode) -> core_io::Result<()> {
        self.mode = Some(mode);
        self.mode_transitions.push(mode);
        Ok(())
    }

    fn current_mode(&self) -> Option<TerminalMode> {
        self.mode
    }

    fn restore(&mut self) {
        self.mode = None;
        self.restored = true;
    }

    fn read_fd(&self) -> Option<RawFd> {
        None
    }
}
