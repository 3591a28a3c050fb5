// Copyright 2026 Anapaya Systems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Layout definitions for bit-level data
//!
//! Layouts are the source of truth for where each field of a record lives. Views read and write
//! through them and models encode through them, so a field position is only ever written down
//! once.
//!
//! Layout checks run for every parsed packet and must stay cheap: plain arithmetic on the few
//! length fields, no allocation.

use std::ops::Range;

/// Trait representing the layout of a record on the wire
pub trait Layout {
    /// Returns the size of the layout in bytes
    fn size_bytes(&self) -> usize;

    /// Returns the size of the layout in bits
    #[inline(always)]
    fn size_bits(&self) -> usize {
        self.size_bytes() * 8
    }

    /// Splits the buffer at the size of the layout
    ///
    /// Returns None if the buffer is too small
    #[inline]
    fn split_off_checked<'a>(&self, buf: &'a [u8]) -> Option<(&'a [u8], &'a [u8])> {
        buf.split_at_checked(self.size_bytes())
    }
}

/// A range of bits, numbered from the most significant bit of the first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    /// Start bit (inclusive)
    pub start: usize,
    /// End bit (exclusive)
    pub end: usize,
}
impl BitRange {
    /// Creates a new BitRange with the given start and width
    #[inline]
    pub const fn new(start: usize, width: usize) -> Self {
        Self {
            start,
            end: start + width,
        }
    }

    /// Returns the largest unsigned value the range can hold
    #[inline]
    pub const fn max_uint(&self) -> u64 {
        if self.size_bits() >= 64 {
            u64::MAX
        } else {
            (1 << self.size_bits()) - 1
        }
    }

    /// Checks if the given bit is contained within the range
    #[inline]
    pub const fn contains(&self, bit: usize) -> bool {
        bit >= self.start && bit < self.end
    }

    /// Returns the byte range, assuming the start and end are byte-aligned
    ///
    /// Panics in debug builds if the range is not byte-aligned.
    #[inline]
    pub const fn aligned_byte_range(&self) -> Range<usize> {
        debug_assert!(self.start.is_multiple_of(8), "start bit is not byte-aligned");
        debug_assert!(self.end.is_multiple_of(8), "end bit is not byte-aligned");
        self.start / 8..self.end / 8
    }

    /// Returns the smallest byte range containing the bit range
    #[inline]
    pub const fn containing_byte_range(&self) -> Range<usize> {
        self.start / 8..self.end.div_ceil(8)
    }

    /// Returns the number of bytes touched by the range
    #[inline]
    pub const fn size_bytes(&self) -> usize {
        let range = self.containing_byte_range();
        range.end - range.start
    }

    /// Returns the width of the range in bits
    #[inline]
    pub const fn size_bits(&self) -> usize {
        debug_assert!(self.end >= self.start, "BitRange end must be >= start");
        self.end - self.start
    }

    /// Shifts the range forward by the given number of bytes
    #[inline]
    pub const fn shift(mut self, bytes: usize) -> Self {
        self.start += bytes * 8;
        self.end += bytes * 8;
        self
    }
}

/// Macros for layout definitions
pub mod macros {
    /// Generates a named bit range constant
    macro_rules! gen_bitrange_const {
        ($range_name:ident, $start:expr, $width:expr) => {
            /// Bit range constant for the specified field
            pub const $range_name: BitRange = BitRange::new($start, $width);
        };
    }

    pub(crate) use gen_bitrange_const;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_compute_containing_bytes_for_unaligned_range() {
        // bits 14..20 straddle bytes 1 and 2
        let range = BitRange::new(14, 6);
        assert_eq!(range.containing_byte_range(), 1..3);
        assert_eq!(range.size_bytes(), 2);
        assert_eq!(range.max_uint(), 63);
    }

    #[test]
    fn should_shift_by_whole_bytes() {
        let range = BitRange::new(0, 48).shift(6);
        assert_eq!(range.aligned_byte_range(), 6..12);
        assert!(range.contains(48));
        assert!(!range.contains(96));
    }
}
