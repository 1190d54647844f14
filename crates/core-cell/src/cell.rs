//! A single grid cell: one grapheme cluster plus its style.
//!
//! Invariants:
//! - Leader: `width` 1 or 2, `grapheme` non-empty, `continuation == false`.
//! - Continuation: `width == 0`, `grapheme` empty, `continuation == true`;
//!   occupies the second column of a wide leader and is never printed.
//! - The invalidation sentinel breaks both shapes on purpose (NUL grapheme,
//!   width 0, not a continuation) so it can never compare equal to a cell the
//!   write path produces.

use core_style::{Attribute, Color};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Exactly one grapheme cluster, or empty for continuation cells.
    pub grapheme: String,
    /// Columns this cell occupies: 0 (continuation), 1, or 2.
    pub width: usize,
    /// Whether this is the trailing column of a wide leader.
    pub continuation: bool,
    pub fg: Color,
    pub bg: Color,
    pub attr: Attribute,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            grapheme: " ".to_string(),
            width: 1,
            continuation: false,
            fg: Color::DEFAULT,
            bg: Color::DEFAULT,
            attr: Attribute::empty(),
        }
    }
}

impl Cell {
    /// Build a leader cell from the first grapheme cluster of `grapheme`.
    /// Multi-cluster input is truncated to its first cluster. Returns `None`
    /// when the cluster has no column width (empty input, control characters,
    /// standalone combining marks).
    pub fn leader(grapheme: &str, fg: Color, bg: Color, attr: Attribute) -> Option<Cell> {
        let cluster = grapheme.graphemes(true).next()?;
        let width = core_unicode::grapheme_width(cluster);
        if width == 0 {
            return None;
        }
        Some(Cell {
            grapheme: cluster.to_string(),
            width,
            continuation: false,
            fg,
            bg,
            attr,
        })
    }

    /// The trailing column of a wide leader, carrying the leader's style so
    /// style-batched rendering can run through it.
    pub fn continuation(fg: Color, bg: Color, attr: Attribute) -> Cell {
        Cell {
            grapheme: String::new(),
            width: 0,
            continuation: true,
            fg,
            bg,
            attr,
        }
    }

    /// The front-buffer invalidation sentinel: impossible on purpose, so the
    /// next diff pass re-emits every cell.
    pub(crate) fn invalid() -> Cell {
        Cell {
            grapheme: "\0".to_string(),
            width: 0,
            continuation: false,
            fg: Color::DEFAULT,
            bg: Color::DEFAULT,
            attr: Attribute::empty(),
        }
    }

    /// First scalar of the grapheme, for callers that only care about
    /// single-codepoint cells.
    pub fn ch(&self) -> Option<char> {
        self.grapheme.chars().next()
    }

    /// Whether this cell shares the style triple of another.
    #[inline]
    pub fn same_style(&self, other: &Cell) -> bool {
        self.fg == other.fg && self.bg == other.bg && self.attr == other.attr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leader_derives_width_from_cluster() {
        let c = Cell::leader("x", Color::DEFAULT, Color::DEFAULT, Attribute::empty()).unwrap();
        assert_eq!(c.width, 1);
        assert!(!c.continuation);

        let w = Cell::leader("中", Color::DEFAULT, Color::DEFAULT, Attribute::empty()).unwrap();
        assert_eq!(w.width, 2);
        assert_eq!(w.grapheme, "中");
    }

    #[test]
    fn leader_truncates_to_first_cluster() {
        let c = Cell::leader("abc", Color::DEFAULT, Color::DEFAULT, Attribute::empty()).unwrap();
        assert_eq!(c.grapheme, "a");
        let e = Cell::leader("e\u{0301}x", Color::DEFAULT, Color::DEFAULT, Attribute::empty())
            .unwrap();
        assert_eq!(e.grapheme, "e\u{0301}");
        assert_eq!(e.width, 1);
    }

    #[test]
    fn leader_rejects_zero_width_input() {
        assert!(Cell::leader("", Color::DEFAULT, Color::DEFAULT, Attribute::empty()).is_none());
        assert!(Cell::leader("\x07", Color::DEFAULT, Color::DEFAULT, Attribute::empty()).is_none());
        assert!(
            Cell::leader("\u{0301}", Color::DEFAULT, Color::DEFAULT, Attribute::empty()).is_none()
        );
    }

    #[test]
    fn continuation_shape() {
        let c = Cell::continuation(Color::Ansi8(1), Color::DEFAULT, Attribute::BOLD);
        assert!(c.continuation);
        assert_eq!(c.width, 0);
        assert!(c.grapheme.is_empty());
        assert_eq!(c.fg, Color::Ansi8(1));
    }

    #[test]
    fn sentinel_never_equals_real_cells() {
        let sentinel = Cell::invalid();
        assert_ne!(sentinel, Cell::default());
        assert_ne!(
            sentinel,
            Cell::continuation(Color::DEFAULT, Color::DEFAULT, Attribute::empty())
        );
    }

    #[test]
    fn equality_is_field_wise() {
        let a = Cell::leader("x", Color::Ansi8(2), Color::DEFAULT, Attribute::BOLD).unwrap();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.attr = Attribute::empty();
        assert_ne!(a, b);
    }
}
