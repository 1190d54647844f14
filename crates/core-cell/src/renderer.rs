//! The rendering seam between the cell grid and a terminal writer.

use crate::Cursor;
use core_style::{Attribute, Color};
use std::io;

/// Receiver for buffer render output. Implemented by the terminal facade's
/// writer; the buffer drives it with style-batched runs and a final cursor
/// placement.
pub trait CellRenderer {
    /// Emit `text` (a concatenation of leader graphemes) at `(x, y)` with one
    /// style triple. `columns` is the total column advance of the run, which
    /// differs from the cluster count when wide graphemes are present; the
    /// implementation keeps its cursor cache consistent using it.
    fn render_batch(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        fg: Color,
        bg: Color,
        attr: Attribute,
        columns: i32,
    ) -> io::Result<()>;

    /// Position (or hide) the terminal cursor after a paint.
    fn render_cursor(&mut self, cursor: &Cursor) -> io::Result<()>;

    /// Forget cached style and cursor state; the next emission re-sends
    /// everything.
    fn reset_render_state(&mut self);

    fn flush(&mut self) -> io::Result<()>;
}
