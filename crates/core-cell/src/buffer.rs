//! Double-buffered cell grid with diff and full-sync rendering.
//!
//! The back buffer is what callers draw into; the front buffer mirrors what
//! the terminal currently shows. `render_to` walks rows left to right,
//! skipping cells whose front and back entries already match, and groups the
//! rest into style-homogeneous batches so the renderer emits each style
//! sequence at most once per run.
//!
//! Occupancy invariants, restored by every write path:
//! - no continuation cell at column 0;
//! - a continuation at `(x, y)` has a width-2 leader at `(x-1, y)`;
//! - no width-2 leader at the last column.

use crate::{Cell, CellRenderer, Cursor};
use core_style::{Attribute, Color};
use std::io;

pub struct Buffer {
    width: i32,
    height: i32,
    front: Vec<Cell>,
    back: Vec<Cell>,
    cursor: Cursor,
    /// Reusable batch scratch; grows to the longest run ever emitted.
    batch: String,
    /// Set by `invalidate`/`resize`: the next render must clear the
    /// renderer's cached style and cursor state before emitting.
    needs_state_reset: bool,
}

impl Buffer {
    pub fn new(width: i32, height: i32) -> Buffer {
        let width = width.max(0);
        let height = height.max(0);
        let len = (width as usize) * (height as usize);
        Buffer {
            width,
            height,
            front: vec![Cell::invalid(); len],
            back: vec![Cell::default(); len],
            cursor: Cursor::default(),
            batch: String::new(),
            needs_state_reset: true,
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    #[inline]
    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Write one grapheme cluster at `(x, y)`.
    ///
    /// Returns `false` without touching the grid for out-of-bounds targets,
    /// zero-width input (control characters, standalone combining marks,
    /// empty strings), and width-2 clusters at the last column. These are
    /// rejections, not errors.
    pub fn set_cell(
        &mut self,
        x: i32,
        y: i32,
        grapheme: &str,
        fg: Color,
        bg: Color,
        attr: Attribute,
    ) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let cell = match Cell::leader(grapheme, fg, bg, attr) {
            Some(cell) => cell,
            None => return false,
        };
        if cell.width == 2 && x == self.width - 1 {
            return false;
        }
        self.put(x, y, cell);
        true
    }

    /// Convenience wrapper over `set_cell` for single scalars.
    pub fn set_char(
        &mut self,
        x: i32,
        y: i32,
        ch: char,
        fg: Color,
        bg: Color,
        attr: Attribute,
    ) -> bool {
        let mut buf = [0u8; 4];
        self.set_cell(x, y, ch.encode_utf8(&mut buf), fg, bg, attr)
    }

    pub fn get_cell(&self, x: i32, y: i32) -> Option<&Cell> {
        if !self.in_bounds(x, y) {
            return None;
        }
        Some(&self.back[self.index(x, y)])
    }

    /// The validated write primitive. `cell` is a leader of width 1 or 2
    /// whose columns fit the row; every orphan the write could create is
    /// repaired here.
    fn put(&mut self, x: i32, y: i32, cell: Cell) {
        let w = cell.width as i32;
        let target = self.index(x, y);
        let prior_was_wide = {
            let prior = &self.back[target];
            !prior.continuation && prior.width == 2
        };

        // Overwriting a continuation orphans its leader.
        if self.back[target].continuation {
            let leader = self.index(x - 1, y);
            self.back[leader] = Cell::default();
        }

        // A wide write that lands on the first column of another wide leader
        // orphans that leader's continuation one further right.
        if w == 2 {
            let next = self.index(x + 1, y);
            if !self.back[next].continuation && self.back[next].width == 2 {
                let orphan = self.index(x + 2, y);
                self.back[orphan] = Cell::default();
            }
        }

        // Pre-clear the target columns, then write leader (+ continuation).
        self.back[target] = Cell::default();
        if w == 2 {
            let next = self.index(x + 1, y);
            self.back[next] = Cell::continuation(cell.fg, cell.bg, cell.attr);
        }
        self.back[target] = cell;

        // A narrow write over a previously wide leader strands the old
        // continuation.
        if w == 1 && prior_was_wide {
            let stale = self.index(x + 1, y);
            self.back[stale] = Cell::default();
        }
    }

    /// Reset every back-buffer cell to the default cell.
    pub fn clear(&mut self) {
        self.back.fill(Cell::default());
    }

    /// Poison the front buffer so the next render re-emits the entire grid
    /// and clears the renderer's cached state first. Used after anything
    /// external may have written to the terminal.
    pub fn invalidate(&mut self) {
        self.front.fill(Cell::invalid());
        self.needs_state_reset = true;
    }

    pub fn set_cursor(&mut self, x: i32, y: i32) {
        self.cursor.set(x, y);
    }

    pub fn hide_cursor(&mut self) {
        self.cursor.hide();
    }

    pub fn show_cursor(&mut self) {
        self.cursor.show();
    }

    /// Resize the grid, preserving overlapping content, then repair cells the
    /// new geometry breaks: wide leaders at the new last column and orphaned
    /// continuations become default, and the cursor is clamped.
    pub fn resize(&mut self, new_w: i32, new_h: i32) {
        let new_w = new_w.max(0);
        let new_h = new_h.max(0);
        if new_w == self.width && new_h == self.height {
            return;
        }
        let len = (new_w as usize) * (new_h as usize);
        let mut back = vec![Cell::default(); len];
        let copy_w = self.width.min(new_w);
        let copy_h = self.height.min(new_h);
        for y in 0..copy_h {
            for x in 0..copy_w {
                back[(y * new_w + x) as usize] = self.back[self.index(x, y)].clone();
            }
        }

        for y in 0..new_h {
            for x in 0..new_w {
                let idx = (y * new_w + x) as usize;
                if back[idx].continuation {
                    let orphan = x == 0 || {
                        let left = &back[(y * new_w + x - 1) as usize];
                        left.continuation || left.width != 2
                    };
                    if orphan {
                        back[idx] = Cell::default();
                    }
                } else if back[idx].width == 2 && x == new_w - 1 {
                    back[idx] = Cell::default();
                }
            }
        }

        self.width = new_w;
        self.height = new_h;
        self.back = back;
        self.front = vec![Cell::invalid(); len];
        self.needs_state_reset = true;
        self.cursor.clamp(new_w, new_h);
    }

    /// Diff the back buffer against the front buffer and emit only changed
    /// runs, then the cursor. With `auto_flush` the renderer is flushed at
    /// the end; callers bracketing the paint (synchronized updates) pass
    /// `false` and flush themselves.
    pub fn render_to<R: CellRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        auto_flush: bool,
    ) -> io::Result<()> {
        if self.needs_state_reset {
            renderer.reset_render_state();
            self.needs_state_reset = false;
        }
        for y in 0..self.height {
            self.render_row(y, renderer, true)?;
        }
        renderer.render_cursor(&self.cursor)?;
        if auto_flush {
            renderer.flush()?;
        }
        Ok(())
    }

    /// Full redraw: every cell is emitted regardless of the front buffer,
    /// after resetting the renderer's cached state.
    pub fn sync_to<R: CellRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        auto_flush: bool,
    ) -> io::Result<()> {
        renderer.reset_render_state();
        self.needs_state_reset = false;
        for y in 0..self.height {
            self.render_row(y, renderer, false)?;
        }
        renderer.render_cursor(&self.cursor)?;
        if auto_flush {
            renderer.flush()?;
        }
        Ok(())
    }

    /// Emit one row. In diff mode unchanged cells are skipped; a batch opens
    /// at the first changed leader and extends over changed-or-continuation
    /// cells sharing its style. Continuations are synced without contributing
    /// rendered columns, so the batch advance equals the sum of leader
    /// widths.
    fn render_row<R: CellRenderer + ?Sized>(
        &mut self,
        y: i32,
        renderer: &mut R,
        diff: bool,
    ) -> io::Result<()> {
        let width = self.width;
        let mut x = 0i32;
        while x < width {
            let idx = self.index(x, y);
            let changed = !diff || self.front[idx] != self.back[idx];
            if !changed {
                x += 1;
                continue;
            }
            if self.back[idx].continuation {
                // A continuation whose leader did not change: sync it
                // silently, the glyph on screen is already right.
                self.front[idx] = self.back[idx].clone();
                x += 1;
                continue;
            }

            let start = x;
            let (fg, bg, attr) = {
                let opener = &self.back[idx];
                (opener.fg, opener.bg, opener.attr)
            };
            self.batch.clear();
            let mut columns = 0i32;
            loop {
                let idx = self.index(x, y);
                self.front[idx] = self.back[idx].clone();
                let cell = &self.front[idx];
                if !cell.continuation {
                    self.batch.push_str(&cell.grapheme);
                    columns += cell.width as i32;
                }
                x += 1;
                if x >= width {
                    break;
                }
                let next_idx = self.index(x, y);
                let next = &self.back[next_idx];
                if next.continuation {
                    continue;
                }
                let next_changed = !diff || self.front[next_idx] != *next;
                if !next_changed {
                    break;
                }
                if !(next.fg == fg && next.bg == bg && next.attr == attr) {
                    break;
                }
            }
            renderer.render_batch(start, y, &self.batch, fg, bg, attr, columns)?;
        }
        Ok(())
    }

    /// Check the occupancy invariants over the whole back buffer. Test
    /// support; not part of the rendering path.
    pub fn check_invariants(&self) -> Result<(), String> {
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = &self.back[self.index(x, y)];
                if cell.continuation {
                    if x == 0 {
                        return Err(format!("continuation at column 0, row {y}"));
                    }
                    let left = &self.back[self.index(x - 1, y)];
                    if left.continuation || left.width != 2 {
                        return Err(format!("orphan continuation at ({x}, {y})"));
                    }
                } else {
                    if cell.width == 0 {
                        return Err(format!("zero-width leader at ({x}, {y})"));
                    }
                    if cell.width == 2 && x == self.width - 1 {
                        return Err(format!("wide leader at last column, row {y}"));
                    }
                }
            }
        }
        Ok(())
    }
}
