//! Terminal input modes over termios.
//!
//! A mode composes four local-flag bits (ICANON, ECHO, ISIG, IEXTEN) with an
//! input-flag posture: raw modes clear the line-mangling input flags, cooked
//! modes keep the flags the terminal originally had. The first `set_mode`
//! snapshots the original termios; every later transition diffs against that
//! snapshot so `restore` always lands back where the process started.

use crate::error::{IoError, Result};
use std::fmt;
use std::os::unix::io::RawFd;

/// Input flags cleared by raw-input modes.
const RAW_INPUT_CLEAR: libc::tcflag_t = libc::IGNBRK
    | libc::BRKINT
    | libc::PARMRK
    | libc::ISTRIP
    | libc::INLCR
    | libc::IGNCR
    | libc::ICRNL
    | libc::IXON;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalMode {
    /// No canonical processing, no echo, no signals, no extended input.
    Raw,
    /// Everything on; the terminal's normal line discipline.
    Cooked,
    /// Byte-at-a-time input with echo and signals intact.
    Cbreak,
    /// Line input with echo suppressed.
    Password,
    /// Byte-at-a-time, no echo, but Ctrl-C/Ctrl-Z still signal.
    SemiRaw,
}

impl TerminalMode {
    pub fn canonical(self) -> bool {
        matches!(self, TerminalMode::Cooked | TerminalMode::Password)
    }

    pub fn echo(self) -> bool {
        matches!(self, TerminalMode::Cooked | TerminalMode::Cbreak)
    }

    pub fn signals(self) -> bool {
        !matches!(self, TerminalMode::Raw)
    }

    pub fn extended(self) -> bool {
        !matches!(self, TerminalMode::Raw)
    }

    /// Whether the input flags take the raw posture.
    pub fn raw_input(self) -> bool {
        matches!(
            self,
            TerminalMode::Raw | TerminalMode::Cbreak | TerminalMode::SemiRaw
        )
    }

    /// Whether a user at the keyboard can interact line-wise (echoed
    /// canonical input).
    pub fn user_interactive(self) -> bool {
        matches!(self, TerminalMode::Cooked)
    }
}

impl fmt::Display for TerminalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TerminalMode::Raw => "raw",
            TerminalMode::Cooked => "cooked",
            TerminalMode::Cbreak => "cbreak",
            TerminalMode::Password => "password",
            TerminalMode::SemiRaw => "semi-raw",
        };
        f.write_str(name)
    }
}

/// Saved-state termios controller for one descriptor.
pub struct ModeControl {
    fd: RawFd,
    original: Option<libc::termios>,
    current: Option<TerminalMode>,
}

impl ModeControl {
    pub fn new(fd: RawFd) -> ModeControl {
        ModeControl {
            fd,
            original: None,
            current: None,
        }
    }

    pub fn current_mode(&self) -> Option<TerminalMode> {
        self.current
    }

    /// Apply `mode`, capturing the original termios on first use. Flags are
    /// always derived from the original snapshot, and the change lands with
    /// `TCSAFLUSH` so pending input does not leak across the transition.
    pub fn set_mode(&mut self, mode: TerminalMode) -> Result<()> {
        let original = match self.original {
            Some(original) => original,
            None => {
                let mut t: libc::termios = unsafe { std::mem::zeroed() };
                if unsafe { libc::tcgetattr(self.fd, &mut t) } != 0 {
                    return Err(IoError::last("tcgetattr failed"));
                }
                self.original = Some(t);
                t
            }
        };

        let mut t = original;
        apply_flag(&mut t.c_lflag, libc::ICANON, mode.canonical());
        apply_flag(&mut t.c_lflag, libc::ECHO, mode.echo());
        apply_flag(&mut t.c_lflag, libc::ISIG, mode.signals());
        apply_flag(&mut t.c_lflag, libc::IEXTEN, mode.extended());
        if mode.raw_input() {
            t.c_iflag = original.c_iflag & !RAW_INPUT_CLEAR;
        } else {
            t.c_iflag = original.c_iflag;
        }
        if !mode.canonical() {
            t.c_cc[libc::VMIN] = 1;
            t.c_cc[libc::VTIME] = 0;
        }

        if unsafe { libc::tcsetattr(self.fd, libc::TCSAFLUSH, &t) } != 0 {
            return Err(IoError::last("tcsetattr failed"));
        }
        tracing::debug!(target: "termisu.tty", %mode, "terminal mode applied");
        self.current = Some(mode);
        Ok(())
    }

    /// Write back the saved snapshot and forget the current mode. Idempotent
    /// and quiet when no snapshot was ever taken.
    pub fn restore(&mut self) -> Result<()> {
        self.current = None;
        let Some(original) = self.original else {
            return Ok(());
        };
        if unsafe { libc::tcsetattr(self.fd, libc::TCSAFLUSH, &original) } != 0 {
            return Err(IoError::last("tcsetattr failed"));
        }
        Ok(())
    }
}

#[inline]
fn apply_flag(flags: &mut libc::tcflag_t, bit: libc::tcflag_t, on: bool) {
    if on {
        *flags |= bit;
    } else {
        *flags &= !bit;
    }
}
