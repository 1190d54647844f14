//! The facade's renderer half: backend + terminfo + cached emission state.
//!
//! Split out of `Terminal` so the buffer (owned by the same facade) can
//! borrow it as the `CellRenderer` while the facade coordinates both.

use crate::backend::Backend;
use crate::render_state::RenderState;
use core_cell::{CellRenderer, Cursor};
use core_style::{Attribute, Color};
use core_terminfo::Terminfo;
use std::io::{self, Write};

pub(crate) struct TermWriter {
    pub(crate) backend: Box<dyn Backend>,
    pub(crate) info: Terminfo,
    pub(crate) state: RenderState,
    // Direct-setter caches; independent of the batch-render state so callers
    // mixing both paths still skip redundant escapes.
    pub(crate) cached_fg: Option<Color>,
    pub(crate) cached_bg: Option<Color>,
    pub(crate) cached_attr: Attribute,
    /// `None` after external programs may have changed visibility.
    pub(crate) cached_cursor_visible: Option<bool>,
}

impl TermWriter {
    pub(crate) fn new(backend: Box<dyn Backend>, info: Terminfo) -> TermWriter {
        TermWriter {
            backend,
            info,
            state: RenderState::new(),
            cached_fg: None,
            cached_bg: None,
            cached_attr: Attribute::empty(),
            cached_cursor_visible: None,
        }
    }

    pub(crate) fn write_seq(&mut self, seq: &str) -> io::Result<()> {
        self.backend.write_all(seq.as_bytes())
    }
}

impl CellRenderer for TermWriter {
    fn render_batch(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        fg: Color,
        bg: Color,
        attr: Attribute,
        columns: i32,
    ) -> io::Result<()> {
        self.state
            .move_cursor(&mut self.backend, &self.info, x, y)?;
        self.state
            .apply_style(&mut self.backend, &self.info, fg, bg, attr)?;
        self.backend.write_all(text.as_bytes())?;
        self.state.advance_cursor(columns);
        Ok(())
    }

    fn render_cursor(&mut self, cursor: &Cursor) -> io::Result<()> {
        if cursor.hidden() {
            if self.cached_cursor_visible != Some(false) {
                self.backend
                    .write_all(self.info.hide_cursor_seq().as_bytes())?;
                self.cached_cursor_visible = Some(false);
            }
            return Ok(());
        }
        self.state
            .move_cursor(&mut self.backend, &self.info, cursor.x, cursor.y)?;
        if self.cached_cursor_visible != Some(true) {
            self.backend
                .write_all(self.info.show_cursor_seq().as_bytes())?;
            self.cached_cursor_visible = Some(true);
        }
        Ok(())
    }

    fn reset_render_state(&mut self) {
        self.state.reset();
        self.cached_fg = None;
        self.cached_bg = None;
        self.cached_attr = Attribute::empty();
        self.cached_cursor_visible = None;
    }

    fn flush(&mut self) -> io::Result<()> {
        self.backend.flush()
    }
}
