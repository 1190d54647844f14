//! Channel payloads for the event loop.

use core_input::{KeyEvent, MouseEvent};
use core_io::TerminalMode;
use std::time::Duration;

/// Everything a source can deliver. Plain value types; the loop moves them
/// through a bounded channel without further interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(ResizeEvent),
    Tick(TickEvent),
    ModeChange(ModeChangeEvent),
    FocusGained,
    FocusLost,
}

/// Terminal geometry change. Old dimensions are `None` on the first report,
/// before any prior size was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeEvent {
    pub width: i32,
    pub height: i32,
    pub old_width: Option<i32>,
    pub old_height: Option<i32>,
}

impl ResizeEvent {
    /// False only when both old dimensions are known and equal to the new.
    pub fn changed(&self) -> bool {
        !(self.old_width == Some(self.width) && self.old_height == Some(self.height))
    }
}

/// Periodic timer tick. `frame` counts ticks monotonically, including any
/// the poller coalesced while the consumer lagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    pub elapsed: Duration,
    pub delta: Duration,
    pub frame: u64,
}

/// Terminal mode transition published by the terminal facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChangeEvent {
    pub mode: TerminalMode,
    pub previous_mode: Option<TerminalMode>,
}

impl ModeChangeEvent {
    /// The first assignment is not a change, and neither is re-applying the
    /// current mode.
    pub fn changed(&self) -> bool {
        match self.previous_mode {
            None => false,
            Some(previous) => previous != self.mode,
        }
    }

    pub fn to_raw(&self) -> bool {
        self.mode == TerminalMode::Raw
    }

    pub fn from_raw(&self) -> bool {
        self.previous_mode == Some(TerminalMode::Raw)
    }

    pub fn to_user_interactive(&self) -> bool {
        self.mode.user_interactive()
    }

    pub fn from_user_interactive(&self) -> bool {
        self.previous_mode
            .map(TerminalMode::user_interactive)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_changed_semantics() {
        let first = ResizeEvent {
            width: 80,
            height: 24,
            old_width: None,
            old_height: None,
        };
        assert!(first.changed());

        let same = ResizeEvent {
            width: 80,
            height: 24,
            old_width: Some(80),
            old_height: Some(24),
        };
        assert!(!same.changed());

        let grew = ResizeEvent {
            width: 100,
            height: 24,
            old_width: Some(80),
            old_height: Some(24),
        };
        assert!(grew.changed());
    }

    #[test]
    fn mode_change_first_assignment_is_not_a_change() {
        let first = ModeChangeEvent {
            mode: TerminalMode::Raw,
            previous_mode: None,
        };
        assert!(!first.changed());

        let same = ModeChangeEvent {
            mode: TerminalMode::Raw,
            previous_mode: Some(TerminalMode::Raw),
        };
        assert!(!same.changed());

        let real = ModeChangeEvent {
            mode: TerminalMode::Cooked,
            previous_mode: Some(TerminalMode::Raw),
        };
        assert!(real.changed());
    }

    #[test]
    fn mode_change_direction_helpers() {
        let event = ModeChangeEvent {
            mode: TerminalMode::Cooked,
            previous_mode: Some(TerminalMode::Raw),
        };
        assert!(!event.to_raw());
        assert!(event.from_raw());
        assert!(event.to_user_interactive());
        assert!(!event.from_user_interactive());

        let back = ModeChangeEvent {
            mode: TerminalMode::Raw,
            previous_mode: Some(TerminalMode::Cooked),
        };
        assert!(back.to_raw());
        assert!(!back.from_raw());
        assert!(!back.to_user_interactive());
        assert!(back.from_user_interactive());
    }
}
