//! Cell grid primitives: `Cell`, `Cursor`, and the double-buffered `Buffer`
//! with diff/batch rendering through the `CellRenderer` seam.

mod buffer;
mod cell;
mod cursor;
mod renderer;

pub use buffer::Buffer;
pub use cell::Cell;
pub use cursor::Cursor;
pub use renderer::CellRenderer;

#[cfg(test)]
mod tests {
    use super::*;
    use core_style::{Attribute, Color};

    fn set(buffer: &mut Buffer, x: i32, y: i32, s: &str) -> bool {
        buffer.set_cell(x, y, s, Color::DEFAULT, Color::DEFAULT, Attribute::empty())
    }

    #[test]
    fn wide_write_occupies_two_columns() {
        let mut b = Buffer::new(80, 24);
        assert!(set(&mut b, 0, 0, "中"));
        assert_eq!(b.get_cell(0, 0).unwrap().width, 2);
        assert!(b.get_cell(1, 0).unwrap().continuation);
        assert_eq!(b.get_cell(2, 0).unwrap().width, 1);
        b.check_invariants().unwrap();
    }

    #[test]
    fn overwriting_continuation_clears_leader() {
        let mut b = Buffer::new(80, 24);
        assert!(set(&mut b, 0, 0, "中"));
        assert!(set(&mut b, 1, 0, "X"));
        let leader = b.get_cell(0, 0).unwrap();
        assert_eq!(leader, &Cell::default());
        assert_eq!(b.get_cell(1, 0).unwrap().grapheme, "X");
        assert_eq!(b.get_cell(2, 0).unwrap(), &Cell::default());
        b.check_invariants().unwrap();
    }

    #[test]
    fn narrow_over_wide_leader_clears_stale_continuation() {
        let mut b = Buffer::new(10, 2);
        assert!(set(&mut b, 3, 1, "界"));
        assert!(set(&mut b, 3, 1, "y"));
        assert_eq!(b.get_cell(3, 1).unwrap().grapheme, "y");
        assert!(!b.get_cell(4, 1).unwrap().continuation);
        b.check_invariants().unwrap();
    }

    #[test]
    fn wide_over_next_wide_leader_clears_its_orphan() {
        let mut b = Buffer::new(10, 1);
        assert!(set(&mut b, 2, 0, "中")); // columns 2,3
        assert!(set(&mut b, 1, 0, "界")); // columns 1,2 -> old leader overwritten
        assert_eq!(b.get_cell(1, 0).unwrap().grapheme, "界");
        assert!(b.get_cell(2, 0).unwrap().continuation);
        assert_eq!(b.get_cell(3, 0).unwrap(), &Cell::default());
        b.check_invariants().unwrap();
    }

    #[test]
    fn rejects_controls_bounds_and_wide_at_edge() {
        let mut b = Buffer::new(4, 2);
        assert!(!set(&mut b, -1, 0, "a"));
        assert!(!set(&mut b, 4, 0, "a"));
        assert!(!set(&mut b, 0, 2, "a"));
        assert!(!set(&mut b, 0, 0, "\x1b"));
        assert!(!set(&mut b, 0, 0, "\u{0301}"));
        assert!(!set(&mut b, 0, 0, ""));
        assert!(!set(&mut b, 3, 0, "中"));
        assert!(set(&mut b, 2, 0, "中"));
        b.check_invariants().unwrap();
    }

    #[test]
    fn clear_resets_back_buffer() {
        let mut b = Buffer::new(4, 2);
        assert!(set(&mut b, 0, 0, "中"));
        b.clear();
        for y in 0..2 {
            for x in 0..4 {
                assert_eq!(b.get_cell(x, y).unwrap(), &Cell::default());
            }
        }
        b.check_invariants().unwrap();
    }

    #[test]
    fn resize_preserves_overlap_and_repairs_edges() {
        let mut b = Buffer::new(6, 2);
        assert!(set(&mut b, 0, 0, "a"));
        assert!(set(&mut b, 4, 0, "中")); // columns 4,5
        b.resize(5, 2);
        // The wide leader now sits at the new last column and must go.
        assert_eq!(b.get_cell(4, 0).unwrap(), &Cell::default());
        assert_eq!(b.get_cell(0, 0).unwrap().grapheme, "a");
        b.check_invariants().unwrap();

        b.resize(8, 3);
        assert_eq!(b.get_cell(0, 0).unwrap().grapheme, "a");
        assert_eq!(b.get_cell(7, 2).unwrap(), &Cell::default());
        b.check_invariants().unwrap();
    }

    #[test]
    fn resize_clamps_cursor() {
        let mut b = Buffer::new(80, 24);
        b.set_cursor(79, 23);
        b.resize(10, 5);
        assert_eq!((b.cursor().x, b.cursor().y), (9, 4));
    }

    #[test]
    fn cursor_hide_show_via_buffer() {
        let mut b = Buffer::new(10, 10);
        b.set_cursor(3, 4);
        b.hide_cursor();
        assert!(b.cursor().hidden());
        b.show_cursor();
        assert_eq!((b.cursor().x, b.cursor().y), (3, 4));
    }
}
