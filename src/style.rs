//! Inline style flag set.
//!
//! A small hand-rolled bit set rather than a `bitflags!`-generated type: the
//! flag list is closed and the set needs no iteration or
//! serialization beyond what a `u16` already gives us via `serde`.

use serde::{Deserialize, Serialize};
use std::ops::{BitOr, BitOrAssign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyleFlags(u16);

impl StyleFlags {
    pub const NONE: StyleFlags = StyleFlags(0);
    pub const BOLD: StyleFlags = StyleFlags(1 << 0);
    pub const ITALIC: StyleFlags = StyleFlags(1 << 1);
    pub const CODE: StyleFlags = StyleFlags(1 << 2);
    pub const LINK: StyleFlags = StyleFlags(1 << 3);
    pub const STRIKETHROUGH: StyleFlags = StyleFlags(1 << 4);
    pub const IMAGE: StyleFlags = StyleFlags(1 << 5);
    pub const MATH: StyleFlags = StyleFlags(1 << 6);
    pub const KEYBOARD: StyleFlags = StyleFlags(1 << 7);
    pub const SUPERSCRIPT: StyleFlags = StyleFlags(1 << 8);
    pub const SUBSCRIPT: StyleFlags = StyleFlags(1 << 9);

    #[inline]
    pub fn contains(self, other: StyleFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: StyleFlags) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for StyleFlags {
    type Output = StyleFlags;

    #[inline]
    fn bitor(self, rhs: StyleFlags) -> StyleFlags {
        StyleFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for StyleFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: StyleFlags) {
        self.0 |= rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose() {
        let f = StyleFlags::BOLD | StyleFlags::LINK;
        assert!(f.contains(StyleFlags::BOLD));
        assert!(f.contains(StyleFlags::LINK));
        assert!(!f.contains(StyleFlags::ITALIC));
    }

    #[test]
    fn default_is_none() {
        assert!(StyleFlags::default().is_empty());
    }
}
