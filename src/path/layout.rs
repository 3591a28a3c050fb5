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

//! Standard path layout calculations
//!
//! See [`Layout`](crate::core::layout) for more information about layouts in general.

use crate::{
    core::layout::{BitRange, Layout, macros::gen_bitrange_const},
    error::MalformedPathError,
    path::meta::PathMetaHeader,
};

/// Layout for the standard path, composed of a meta header and data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdPathLayout {
    /// Layout of the path meta header
    pub meta: StdPathMetaLayout,
    /// Layout of the path data
    pub data: StdPathDataLayout,
}
impl StdPathLayout {
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                           PathMeta                            |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                           PathData                            |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

    /// Parses and validates the standard path layout from the given buffer
    ///
    /// Checks the segment lengths and pointers of the meta header, and that the buffer holds
    /// every info and hop field they imply. Trailing bytes are allowed.
    pub fn from_slice(buf: &[u8]) -> Result<Self, MalformedPathError> {
        let (meta_buf, _rest) = StdPathMetaLayout.split_off_checked(buf).ok_or(
            MalformedPathError::BufferTooSmall {
                at: "StdPathMeta",
                required: StdPathMetaLayout::SIZE_BYTES,
                actual: buf.len(),
            },
        )?;

        let meta = PathMetaHeader::read(meta_buf);
        meta.validate()?;

        let [seg0_len, seg1_len, seg2_len] = meta.segment_lengths();
        let data_layout = StdPathDataLayout::new(seg0_len, seg1_len, seg2_len);
        let required_size = StdPathMetaLayout::SIZE_BYTES + data_layout.size_bytes();

        if buf.len() < required_size {
            return Err(MalformedPathError::BufferTooSmall {
                at: "StdPathData",
                required: required_size,
                actual: buf.len(),
            });
        }

        Ok(Self {
            meta: StdPathMetaLayout,
            data: data_layout,
        })
    }
}
impl Layout for StdPathLayout {
    #[inline]
    fn size_bytes(&self) -> usize {
        self.meta.size_bytes() + self.data.size_bytes()
    }
}

/// Layout for the standard path meta header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdPathMetaLayout;
impl StdPathMetaLayout {
    //  0                   1                   2                   3
    //  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // | C |  CurrHF   |    RSV    |  Seg0Len  |  Seg1Len  |  Seg2Len  |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

    gen_bitrange_const!(CURR_INFO_FIELD_RNG, 0, 2);
    gen_bitrange_const!(CURR_HOP_FIELD_RNG, 2, 6);
    gen_bitrange_const!(RSV_RNG, 8, 6);
    gen_bitrange_const!(SEG0_LEN_RNG, 14, 6);
    gen_bitrange_const!(SEG1_LEN_RNG, 20, 6);
    gen_bitrange_const!(SEG2_LEN_RNG, 26, 6);
    gen_bitrange_const!(TOTAL_RNG, 0, 32);

    /// Size of meta header in bytes
    pub const SIZE_BYTES: usize = Self::TOTAL_RNG.end / 8;

    /// Maximum length of a single path segment
    pub const MAX_SEGMENT_LENGTH: usize = 63;

    /// Bit ranges of the three segment length fields, in segment order
    pub const SEG_LEN_RNGS: [BitRange; 3] =
        [Self::SEG0_LEN_RNG, Self::SEG1_LEN_RNG, Self::SEG2_LEN_RNG];
}
impl Layout for StdPathMetaLayout {
    #[inline]
    fn size_bytes(&self) -> usize {
        Self::SIZE_BYTES
    }
}

/// Layout for the standard path data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdPathDataLayout {
    /// Lengths of the three path segments
    pub segment_lengths: (u8, u8, u8),
}
impl StdPathDataLayout {
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                           InfoField                           |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                              ...                              |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                           InfoField                           |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                           HopField                            |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                           HopField                            |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                              ...                              |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

    /// Creates a new StdPathDataLayout with the given segment lengths
    #[inline]
    pub const fn new(seg0len: u8, seg1len: u8, seg2len: u8) -> Self {
        Self {
            segment_lengths: (seg0len, seg1len, seg2len),
        }
    }

    /// Returns the number of info fields
    #[inline]
    pub const fn info_field_count(&self) -> usize {
        (self.segment_lengths.0 > 0) as usize
            + (self.segment_lengths.1 > 0) as usize
            + (self.segment_lengths.2 > 0) as usize
    }

    /// Returns the number of hop fields
    #[inline]
    pub const fn hop_field_count(&self) -> usize {
        (self.segment_lengths.0 as usize)
            + (self.segment_lengths.1 as usize)
            + (self.segment_lengths.2 as usize)
    }

    /// Returns the bit range for the info field at the given index
    #[inline]
    pub fn info_field_range(&self, index: usize) -> BitRange {
        InfoFieldLayout::TOTAL_RNG.shift(index * InfoFieldLayout::SIZE_BYTES)
    }

    /// Returns the bit range for the hop field at the given index
    #[inline]
    pub fn hop_field_range(&self, index: usize) -> BitRange {
        let base = self.info_field_count() * InfoFieldLayout::SIZE_BYTES;
        HopFieldLayout::TOTAL_RNG.shift(base + index * HopFieldLayout::SIZE_BYTES)
    }
}
impl Layout for StdPathDataLayout {
    #[inline]
    fn size_bytes(&self) -> usize {
        let info_fields_size = self.info_field_count() * InfoFieldLayout::SIZE_BYTES;
        let hop_fields_size = self.hop_field_count() * HopFieldLayout::SIZE_BYTES;
        info_fields_size + hop_fields_size
    }
}

/// Layout for a standard path info field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoFieldLayout;
impl InfoFieldLayout {
    //  0                   1                   2                   3
    //  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |r r r r r r P C|      RSV      |             SegID             |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |                           Timestamp                           |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

    gen_bitrange_const!(FLAGS_RNG, 0, 8);
    gen_bitrange_const!(RSV_RNG, 8, 8);
    gen_bitrange_const!(SEGMENT_ID_RNG, 16, 16);
    gen_bitrange_const!(TIMESTAMP_RNG, 32, 32);
    gen_bitrange_const!(TOTAL_RNG, 0, 64);

    /// Size of info field in bytes
    pub const SIZE_BYTES: usize = Self::TOTAL_RNG.end / 8;
}
impl Layout for InfoFieldLayout {
    fn size_bytes(&self) -> usize {
        Self::SIZE_BYTES
    }
}

/// Layout for a standard path hop field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopFieldLayout;
impl HopFieldLayout {
    //  0                   1                   2                   3
    //  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |r r r r r r I E|    ExpTime    |           ConsIngress         |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
    // |        ConsEgress             |                               |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
    // |                              MAC                              |
    // +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

    gen_bitrange_const!(FLAGS_RNG, 0, 8);
    gen_bitrange_const!(EXP_TIME_RNG, 8, 8);
    gen_bitrange_const!(CONS_INGRESS_RNG, 16, 16);
    gen_bitrange_const!(CONS_EGRESS_RNG, 32, 16);
    gen_bitrange_const!(MAC_RNG, 48, 48);
    gen_bitrange_const!(TOTAL_RNG, 0, 96);

    /// Size of hop field in bytes
    pub const SIZE_BYTES: usize = Self::TOTAL_RNG.end / 8;
}
impl Layout for HopFieldLayout {
    #[inline]
    fn size_bytes(&self) -> usize {
        Self::SIZE_BYTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_place_hop_fields_after_info_fields() {
        let layout = StdPathDataLayout::new(3, 2, 4);
        assert_eq!(layout.info_field_count(), 3);
        assert_eq!(layout.hop_field_count(), 9);
        assert_eq!(layout.hop_field_range(0).aligned_byte_range(), 24..36);
        assert_eq!(layout.hop_field_range(8).aligned_byte_range(), 120..132);
        assert_eq!(layout.size_bytes(), 3 * 8 + 9 * 12);
    }

    #[test]
    fn should_reject_truncated_data() {
        // seg0_len = 2, one info field and one hop field present
        let mut buf = vec![0x00, 0x00, 0x20, 0x00];
        buf.extend_from_slice(&[0u8; 8 + 12]);

        assert_eq!(
            StdPathLayout::from_slice(&buf),
            Err(MalformedPathError::BufferTooSmall {
                at: "StdPathData",
                required: 4 + 8 + 24,
                actual: 24,
            })
        );
    }

    #[test]
    fn should_reject_missing_meta_header() {
        assert!(matches!(
            StdPathLayout::from_slice(&[0, 0]),
            Err(MalformedPathError::BufferTooSmall {
                at: "StdPathMeta",
                ..
            })
        ));
    }
}
