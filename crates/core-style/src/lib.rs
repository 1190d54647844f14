//! Colors and SGR attributes for cell styling.
//!
//! `Color` carries one of three palettes (ANSI-8, ANSI-256, direct RGB) with
//! total, deterministic conversions between them; `Attribute` is the SGR
//! attribute bitset. Both are plain value types compared field-wise.

use bitflags::bitflags;

mod color;

pub use color::{ArgumentError, Color};

bitflags! {
    /// SGR text attributes. `CURSIVE` is the italic bit; the name follows the
    /// historical SGR terminology.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attribute: u8 {
        const BOLD          = 1;
        const UNDERLINE     = 2;
        const REVERSE       = 4;
        const BLINK         = 8;
        const DIM           = 16;
        const CURSIVE       = 32;
        const HIDDEN        = 64;
        const STRIKETHROUGH = 128;
    }
}

impl Attribute {
    /// Bits present in `self` but absent from `next`. A non-empty result
    /// means a style transition cannot be expressed additively and requires
    /// a full SGR reset first.
    #[inline]
    pub fn removed_by(self, next: Attribute) -> Attribute {
        self & !next
    }

    /// Bits present in `next` but absent from `self`.
    #[inline]
    pub fn added_by(self, next: Attribute) -> Attribute {
        next & !self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_bit_values() {
        assert_eq!(Attribute::BOLD.bits(), 1);
        assert_eq!(Attribute::UNDERLINE.bits(), 2);
        assert_eq!(Attribute::REVERSE.bits(), 4);
        assert_eq!(Attribute::BLINK.bits(), 8);
        assert_eq!(Attribute::DIM.bits(), 16);
        assert_eq!(Attribute::CURSIVE.bits(), 32);
        assert_eq!(Attribute::HIDDEN.bits(), 64);
        assert_eq!(Attribute::STRIKETHROUGH.bits(), 128);
    }

    #[test]
    fn removed_and_added_deltas() {
        let prev = Attribute::BOLD | Attribute::UNDERLINE;
        let next = Attribute::UNDERLINE | Attribute::REVERSE;
        assert_eq!(prev.removed_by(next), Attribute::BOLD);
        assert_eq!(prev.added_by(next), Attribute::REVERSE);
        assert_eq!(prev.removed_by(prev), Attribute::empty());
    }
}
