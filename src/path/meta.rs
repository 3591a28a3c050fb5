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

//! Path meta header and segment navigation.
//!
//! The meta header is the only traversal state a path carries: two pointers and the three
//! segment lengths. Every navigation question ("which segment owns this hop?", "is this the last
//! hop of the segment?") is a pure function of it, and forwarding moves it forward through
//! [`PathMetaHeader::advance`].

use std::ops::Range;

use crate::{
    core::{read::bit_range_be_read, write::bit_range_be_write},
    error::{MalformedPathError, PathError},
    path::{
        layout::StdPathMetaLayout,
        types::{MAX_HOP_FIELDS, MAX_SEGMENTS},
    },
};

/// Decoded path meta header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PathMetaHeader {
    /// Index of the info field owning the current hop field
    pub curr_inf: u8,
    /// Index of the current hop field
    pub curr_hf: u8,
    /// Number of hop fields in each segment, unused segments are 0
    pub seg_lens: [u8; MAX_SEGMENTS],
}

impl PathMetaHeader {
    /// Creates a meta header and checks it for consistency.
    pub fn new(
        curr_inf: u8,
        curr_hf: u8,
        seg_lens: [u8; MAX_SEGMENTS],
    ) -> Result<Self, MalformedPathError> {
        let meta = Self {
            curr_inf,
            curr_hf,
            seg_lens,
        };
        meta.validate()?;
        Ok(meta)
    }

    /// Reads the meta header from the first four bytes of `buf`.
    ///
    /// No consistency checks are made, see [`PathMetaHeader::validate`]. Missing bytes read as
    /// zero.
    pub fn read(buf: &[u8]) -> Self {
        let [seg0, seg1, seg2] = StdPathMetaLayout::SEG_LEN_RNGS;
        Self {
            curr_inf: bit_range_be_read(buf, StdPathMetaLayout::CURR_INFO_FIELD_RNG),
            curr_hf: bit_range_be_read(buf, StdPathMetaLayout::CURR_HOP_FIELD_RNG),
            seg_lens: [
                bit_range_be_read(buf, seg0),
                bit_range_be_read(buf, seg1),
                bit_range_be_read(buf, seg2),
            ],
        }
    }

    /// Writes the meta header into the first four bytes of `buf`, reserved bits are zeroed.
    ///
    /// Fields wider than their bit range are truncated.
    pub fn write(&self, buf: &mut [u8]) {
        bit_range_be_write(buf, StdPathMetaLayout::CURR_INFO_FIELD_RNG, self.curr_inf);
        bit_range_be_write(buf, StdPathMetaLayout::CURR_HOP_FIELD_RNG, self.curr_hf);
        bit_range_be_write(buf, StdPathMetaLayout::RSV_RNG, 0u8);
        for (range, len) in StdPathMetaLayout::SEG_LEN_RNGS.iter().zip(self.seg_lens) {
            bit_range_be_write(buf, *range, len);
        }
    }

    /// Checks the segment lengths and both pointers.
    pub fn validate(&self) -> Result<(), MalformedPathError> {
        if self.seg_lens.iter().all(|len| *len == 0) {
            return Err(MalformedPathError::Empty);
        }

        for segment in 1..MAX_SEGMENTS {
            if self.seg_lens[segment] > 0 && self.seg_lens[segment - 1] == 0 {
                return Err(MalformedPathError::SegmentGap { segment });
            }
        }

        if let Some(len) = self
            .seg_lens
            .iter()
            .find(|len| usize::from(**len) > StdPathMetaLayout::MAX_SEGMENT_LENGTH)
        {
            return Err(MalformedPathError::TooManyHops {
                total: usize::from(*len),
                max: StdPathMetaLayout::MAX_SEGMENT_LENGTH,
            });
        }

        let hop_count = self.hop_count();
        if hop_count > MAX_HOP_FIELDS {
            return Err(MalformedPathError::TooManyHops {
                total: hop_count,
                max: MAX_HOP_FIELDS,
            });
        }

        let Some(owner) = self.segment_of(usize::from(self.curr_hf)) else {
            return Err(MalformedPathError::CurrentHopOutOfRange {
                curr_hf: self.curr_hf,
                hop_count,
            });
        };

        if usize::from(self.curr_inf) != owner {
            return Err(MalformedPathError::CurrentInfoMismatch {
                curr_inf: self.curr_inf,
                expected: owner as u8,
            });
        }

        Ok(())
    }

    /// Returns the segment lengths.
    #[inline]
    pub fn segment_lengths(&self) -> [u8; MAX_SEGMENTS] {
        self.seg_lens
    }

    /// Returns the total number of hop fields.
    #[inline]
    pub fn hop_count(&self) -> usize {
        self.seg_lens.iter().map(|len| usize::from(*len)).sum()
    }

    /// Returns the number of info fields, one per non-empty segment.
    #[inline]
    pub fn info_field_count(&self) -> usize {
        self.seg_lens.iter().filter(|len| **len > 0).count()
    }

    /// Returns the range of global hop indices belonging to `segment`.
    ///
    /// The range is empty for unused segments and for indices past the last segment.
    pub fn segment_range(&self, segment: usize) -> Range<usize> {
        let start: usize = self
            .seg_lens
            .iter()
            .take(segment)
            .map(|len| usize::from(*len))
            .sum();
        let len = self.seg_lens.get(segment).map_or(0, |len| usize::from(*len));
        start..start + len
    }

    /// Returns the index of the segment owning the hop at `hop_index`.
    ///
    /// Returns None if the index is past the last hop.
    pub fn segment_of(&self, hop_index: usize) -> Option<usize> {
        let mut end = 0;
        for (segment, len) in self.seg_lens.iter().enumerate() {
            end += usize::from(*len);
            if hop_index < end {
                return Some(segment);
            }
        }
        None
    }

    /// Returns the index of the segment owning the current hop field.
    ///
    /// For a validated header this always equals `curr_inf`.
    pub fn current_segment(&self) -> Option<usize> {
        self.segment_of(usize::from(self.curr_hf))
    }

    /// Returns true if the current hop field is the last one of its segment.
    pub fn is_last_hop_of_segment(&self) -> bool {
        self.current_segment()
            .is_some_and(|seg| usize::from(self.curr_hf) + 1 == self.segment_range(seg).end)
    }

    /// Returns true if the current hop field is the first one of its segment.
    pub fn is_first_hop_of_segment(&self) -> bool {
        self.current_segment()
            .is_some_and(|seg| usize::from(self.curr_hf) == self.segment_range(seg).start)
    }

    /// Returns true if the current hop field is the last hop of the path.
    pub fn is_last_hop(&self) -> bool {
        usize::from(self.curr_hf) + 1 >= self.hop_count()
    }

    /// Returns the header with the current hop moved forward by one.
    ///
    /// `curr_inf` follows the hop into the next segment when a segment boundary is crossed.
    /// Advancing from the last hop fails with [`PathError::PathExhausted`].
    pub fn advance(&self) -> Result<Self, PathError> {
        let hop_count = self.hop_count();
        let next_hf = usize::from(self.curr_hf) + 1;
        if next_hf >= hop_count {
            return Err(PathError::PathExhausted { hop_count });
        }

        let next_inf = self.segment_of(next_hf).ok_or(PathError::PathExhausted { hop_count })?;

        Ok(Self {
            curr_inf: next_inf as u8,
            curr_hf: next_hf as u8,
            seg_lens: self.seg_lens,
        })
    }

    /// Returns the header with both pointers at the first hop.
    pub fn rewound(&self) -> Self {
        Self {
            curr_inf: 0,
            curr_hf: 0,
            seg_lens: self.seg_lens,
        }
    }
}
