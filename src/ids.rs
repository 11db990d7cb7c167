//! Monotonic block identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(u64);

impl BlockId {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for BlockId {
    #[inline]
    fn from(value: u64) -> Self {
        BlockId(value)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues strictly increasing `BlockId`s for the lifetime of one tokenizer.
///
/// The counter only advances on `blockStart` emission, never on a block being considered or rejected.
#[derive(Debug, Default)]
pub struct IdCounter {
    next: u64,
}

impl IdCounter {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    pub fn next_id(&mut self) -> BlockId {
        let id = BlockId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strictly_increasing() {
        let mut c = IdCounter::new();
        let a = c.next_id();
        let b = c.next_id();
        assert!(a < b);
        assert_eq!(a.get(), 0);
        assert_eq!(b.get(), 1);
    }
}
