//! Cached last-emitted terminal state, minimizing escape traffic.
//!
//! Every style or cursor emission goes through here; a field that matches
//! the cache produces no bytes. `None` means "unknown, must re-emit": the
//! state after construction, after `reset`, and for colors after an SGR
//! reset clobbers them.

use core_style::{Attribute, Color};
use core_terminfo::Terminfo;
use std::io::{self, Write};

#[derive(Debug, Default)]
pub struct RenderState {
    fg: Option<Color>,
    bg: Option<Color>,
    attr: Attribute,
    cursor_x: Option<i32>,
    cursor_y: Option<i32>,
}

impl RenderState {
    pub fn new() -> RenderState {
        RenderState::default()
    }

    /// Forget everything, including the cursor position. Callers must not
    /// assume where the cursor is after a reset; nothing is emitted.
    pub fn reset(&mut self) {
        *self = RenderState::default();
    }

    /// Cached cursor position, when known.
    pub fn cursor(&self) -> Option<(i32, i32)> {
        match (self.cursor_x, self.cursor_y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }

    /// Bring the terminal to `(fg, bg, attr)`, emitting only the delta.
    /// Removing any attribute bit requires a full SGR reset, which also
    /// clobbers the terminal's colors, so the color caches are invalidated
    /// and re-emitted below. Returns whether anything was written.
    pub fn apply_style<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        info: &Terminfo,
        fg: Color,
        bg: Color,
        attr: Attribute,
    ) -> io::Result<bool> {
        let mut emitted = false;

        if attr != self.attr {
            if !self.attr.removed_by(attr).is_empty() {
                out.write_all(info.reset_attrs_seq().as_bytes())?;
                self.attr = Attribute::empty();
                self.fg = None;
                self.bg = None;
                emitted = true;
            }
            let enable = self.attr.added_by(attr);
            for (bit, seq) in [
                (Attribute::BOLD, info.bold_seq()),
                (Attribute::UNDERLINE, info.underline_seq()),
                (Attribute::REVERSE, info.reverse_seq()),
                (Attribute::BLINK, info.blink_seq()),
                (Attribute::DIM, info.dim_seq()),
                (Attribute::CURSIVE, info.italic_seq()),
                (Attribute::HIDDEN, info.hidden_seq()),
                (Attribute::STRIKETHROUGH, info.strikethrough_seq()),
            ] {
                if enable.contains(bit) {
                    out.write_all(seq.as_bytes())?;
                    emitted = true;
                }
            }
            self.attr = attr;
        }

        if self.fg != Some(fg) {
            write_color(out, info, fg, true)?;
            self.fg = Some(fg);
            emitted = true;
        }
        if self.bg != Some(bg) {
            write_color(out, info, bg, false)?;
            self.bg = Some(bg);
            emitted = true;
        }
        Ok(emitted)
    }

    /// Move the terminal cursor, emitting only when the cached position
    /// differs.
    pub fn move_cursor<W: Write + ?Sized>(
        &mut self,
        out: &mut W,
        info: &Terminfo,
        x: i32,
        y: i32,
    ) -> io::Result<bool> {
        if self.cursor_x == Some(x) && self.cursor_y == Some(y) {
            return Ok(false);
        }
        out.write_all(info.cursor_position_seq(y, x).as_bytes())?;
        self.cursor_x = Some(x);
        self.cursor_y = Some(y);
        Ok(true)
    }

    /// Account for `n` columns the terminal advanced by printing text. No
    /// emission; keeps the cache in step with wide-character output.
    pub fn advance_cursor(&mut self, n: i32) {
        if let Some(x) = self.cursor_x {
            self.cursor_x = Some(x + n);
        }
    }
}

/// One color plane. The default color has no palette index and uses the
/// ANSI default-color SGR; RGB uses the direct-color form; palette colors
/// go through the terminfo accessor.
fn write_color<W: Write + ?Sized>(
    out: &mut W,
    info: &Terminfo,
    color: Color,
    foreground: bool,
) -> io::Result<()> {
    if color.is_default() {
        return out.write_all(if foreground { b"\x1b[39m" } else { b"\x1b[49m" });
    }
    match color {
        Color::Rgb(r, g, b) => {
            let plane = if foreground { 38 } else { 48 };
            write!(out, "\x1b[{plane};2;{r};{g};{b}m")
        }
        Color::Ansi8(n) => {
            let seq = if foreground {
                info.foreground_color_seq(n as i32)
            } else {
                info.background_color_seq(n as i32)
            };
            out.write_all(seq.as_bytes())
        }
        Color::Ansi256(n) => {
            let seq = if foreground {
                info.foreground_color_seq(n as i32)
            } else {
                info.background_color_seq(n as i32)
            };
            out.write_all(seq.as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> Terminfo {
        Terminfo::from_term("nonexistent-fake-terminal-xyz")
    }

    fn apply(
        state: &mut RenderState,
        info: &Terminfo,
        fg: Color,
        bg: Color,
        attr: Attribute,
    ) -> (bool, String) {
        let mut out = Vec::new();
        let emitted = state.apply_style(&mut out, info, fg, bg, attr).unwrap();
        (emitted, String::from_utf8(out).unwrap())
    }

    #[test]
    fn first_application_emits_everything() {
        let info = info();
        let mut state = RenderState::new();
        let (emitted, out) = apply(
            &mut state,
            &info,
            Color::Ansi8(1),
            Color::DEFAULT,
            Attribute::BOLD,
        );
        assert!(emitted);
        assert!(out.contains("\x1b[1m"), "bold enable in {out:?}");
        assert!(out.contains("\x1b[31m"), "fg in {out:?}");
        assert!(out.contains("\x1b[49m"), "default bg in {out:?}");
    }

    #[test]
    fn identical_style_emits_nothing() {
        let info = info();
        let mut state = RenderState::new();
        let style = (Color::Ansi8(2), Color::Ansi8(0), Attribute::UNDERLINE);
        apply(&mut state, &info, style.0, style.1, style.2);
        let (emitted, out) = apply(&mut state, &info, style.0, style.1, style.2);
        assert!(!emitted);
        assert!(out.is_empty());
    }

    #[test]
    fn removing_attribute_resets_and_reemits_colors() {
        let info = info();
        let mut state = RenderState::new();
        apply(
            &mut state,
            &info,
            Color::Ansi8(1),
            Color::DEFAULT,
            Attribute::BOLD | Attribute::UNDERLINE,
        );
        let (emitted, out) = apply(
            &mut state,
            &info,
            Color::Ansi8(1),
            Color::DEFAULT,
            Attribute::UNDERLINE,
        );
        assert!(emitted);
        assert!(out.starts_with("\x1b[0m"), "reset first in {out:?}");
        assert!(out.contains("\x1b[4m"), "underline re-enabled in {out:?}");
        assert!(out.contains("\x1b[31m"), "fg re-emitted in {out:?}");
    }

    #[test]
    fn additive_attribute_change_skips_reset() {
        let info = info();
        let mut state = RenderState::new();
        apply(&mut state, &info, Color::DEFAULT, Color::DEFAULT, Attribute::BOLD);
        let (_, out) = apply(
            &mut state,
            &info,
            Color::DEFAULT,
            Color::DEFAULT,
            Attribute::BOLD | Attribute::REVERSE,
        );
        assert!(!out.contains("\x1b[0m"), "no reset in {out:?}");
        assert!(out.contains("\x1b[7m"));
    }

    #[test]
    fn rgb_colors_use_direct_form() {
        let info = info();
        let mut state = RenderState::new();
        let (_, out) = apply(
            &mut state,
            &info,
            Color::Rgb(10, 20, 30),
            Color::Rgb(1, 2, 3),
            Attribute::empty(),
        );
        assert!(out.contains("\x1b[38;2;10;20;30m"));
        assert!(out.contains("\x1b[48;2;1;2;3m"));
    }

    #[test]
    fn cursor_move_caching() {
        let info = info();
        let mut state = RenderState::new();
        let mut out = Vec::new();
        assert!(state.move_cursor(&mut out, &info, 3, 5).unwrap());
        assert_eq!(String::from_utf8_lossy(&out), "\x1b[6;4H");
        out.clear();
        assert!(!state.move_cursor(&mut out, &info, 3, 5).unwrap());
        assert!(out.is_empty());
        assert_eq!(state.cursor(), Some((3, 5)));
    }

    #[test]
    fn advance_tracks_wide_output() {
        let info = info();
        let mut state = RenderState::new();
        let mut out = Vec::new();
        state.move_cursor(&mut out, &info, 0, 0).unwrap();
        state.advance_cursor(4);
        assert_eq!(state.cursor(), Some((4, 0)));
        // The next move to (4, 0) is already cached.
        out.clear();
        assert!(!state.move_cursor(&mut out, &info, 4, 0).unwrap());
    }

    #[test]
    fn reset_forgets_cursor_and_style() {
        let info = info();
        let mut state = RenderState::new();
        let mut out = Vec::new();
        state.move_cursor(&mut out, &info, 1, 1).unwrap();
        apply(&mut state, &info, Color::Ansi8(1), Color::DEFAULT, Attribute::BOLD);
        state.reset();
        assert_eq!(state.cursor(), None);
        let (emitted, _) = apply(&mut state, &info, Color::Ansi8(1), Color::DEFAULT, Attribute::empty());
        assert!(emitted, "colors re-emit after reset");
    }
}
