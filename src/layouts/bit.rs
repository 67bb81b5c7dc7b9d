//! # Layout Bits
//!
//! Every layout starts with a bitmask that records presence of nullable fixed and
//! variable columns and the values of fixed boolean columns. A [`LayoutBit`] is an
//! index into that bitmask; the [`BitAllocator`] hands them out during layout
//! construction.
//!
//! ```text
//! bit index:   0 1 2 3 4 5 6 7 | 8 9 ...
//! byte:        [    byte 0     ] [ byte 1 ...
//! ```
//!
//! Bits are allocated monotonically and never reused, so the mask size of a
//! layout is `ceil(allocated / 8)` bytes.

/// An index into the presence/boolean bitmask of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayoutBit(i32);

impl LayoutBit {
    /// Marker for columns that have no bit (non-nullable or non-boolean columns).
    pub const INVALID: LayoutBit = LayoutBit(-1);

    pub const fn new(index: i32) -> Self {
        Self(index)
    }

    pub fn is_invalid(self) -> bool {
        self.0 == -1
    }

    pub fn index(self) -> i32 {
        self.0
    }

    /// Byte offset of the bit relative to the start of the bitmask at `base`.
    pub fn offset(self, base: usize) -> usize {
        debug_assert!(!self.is_invalid());
        base + (self.0 as usize / 8)
    }

    /// Bit position within the byte returned by [`LayoutBit::offset`].
    pub fn bit(self) -> u8 {
        debug_assert!(!self.is_invalid());
        (self.0 % 8) as u8
    }
}

#[derive(Debug, Default)]
pub struct BitAllocator {
    next: i32,
}

impl BitAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> LayoutBit {
        let bit = LayoutBit(self.next);
        self.next += 1;
        bit
    }

    pub fn num_bytes(&self) -> usize {
        (self.next as usize).div_ceil(8)
    }
}
