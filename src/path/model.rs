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

//! Standard path models

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{
    core::{
        encode::{InvalidStructureError, WireEncode},
        layout::Layout,
        view::View,
        write::bit_range_be_write,
    },
    error::{MalformedPathError, PathError},
    path::{
        layout::{HopFieldLayout, InfoFieldLayout, StdPathDataLayout, StdPathMetaLayout},
        meta::PathMetaHeader,
        types::{
            HopFieldFlags, HopFieldMac, InfoFieldFlags, MAX_HOP_FIELDS, MAX_SEGMENTS,
            exp_time_to_duration,
        },
        view::{HopFieldView, InfoFieldView, StandardPathView},
    },
};

/// Represents a standard SCION path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StandardPath {
    /// The current info field index
    pub current_info_field: u8,
    /// The current hop field index
    pub curr_hop_field: u8,
    /// The segments of the path, in traversal order
    pub segments: Vec<Segment>,
}

impl StandardPath {
    /// Constructs a `StandardPath` from a `StandardPathView`
    pub fn from_view(view: &StandardPathView) -> Self {
        let meta = view.meta();

        let segments = (0..meta.info_field_count())
            .filter_map(|segment| {
                let info_field = InfoField::from_view(view.info_field(segment)?);
                let hop_fields = meta
                    .segment_range(segment)
                    .filter_map(|hop| view.hop_field(hop).map(HopField::from_view))
                    .collect();
                Some(Segment {
                    info_field,
                    hop_fields,
                })
            })
            .collect();

        StandardPath {
            current_info_field: meta.curr_inf,
            curr_hop_field: meta.curr_hf,
            segments,
        }
    }

    /// Decodes a path from the front of `buf`, returning the path and the remaining bytes.
    ///
    /// MACs are not verified, see [`crate::mac`].
    pub fn decode(buf: &[u8]) -> Result<(Self, &[u8]), MalformedPathError> {
        let (view, rest) = StandardPathView::from_slice(buf)?;
        Ok((Self::from_view(view), rest))
    }
}

// Navigation
impl StandardPath {
    /// Returns the meta header describing this path
    ///
    /// Segment lengths above 255 saturate and segments past the third are ignored, see
    /// [`Self::checked_meta`] for a header that is guaranteed to describe the whole path.
    pub fn meta(&self) -> PathMetaHeader {
        PathMetaHeader {
            curr_inf: self.current_info_field,
            curr_hf: self.curr_hop_field,
            seg_lens: self.segment_sizes(),
        }
    }

    /// Returns the validated meta header describing this path
    pub fn checked_meta(&self) -> Result<PathMetaHeader, MalformedPathError> {
        if self.segments.len() > MAX_SEGMENTS {
            return Err(MalformedPathError::TooManySegments {
                count: self.segments.len(),
            });
        }

        let mut seg_lens = [0u8; MAX_SEGMENTS];
        for (len, segment) in seg_lens.iter_mut().zip(&self.segments) {
            let hops = segment.hop_fields.len();
            *len = u8::try_from(hops).map_err(|_| MalformedPathError::TooManyHops {
                total: hops,
                max: StdPathMetaLayout::MAX_SEGMENT_LENGTH,
            })?;
        }

        let meta = PathMetaHeader {
            curr_inf: self.current_info_field,
            curr_hf: self.curr_hop_field,
            seg_lens,
        };
        meta.validate()?;
        Ok(meta)
    }

    /// Returns the path with the current hop moved forward by one
    pub fn advance(&self) -> Result<Self, PathError> {
        let next = self.checked_meta()?.advance()?;

        Ok(Self {
            current_info_field: next.curr_inf,
            curr_hop_field: next.curr_hf,
            segments: self.segments.clone(),
        })
    }

    /// Returns the segment index and in-segment index of the hop at `hop_index`
    pub fn locate_hop(&self, hop_index: usize) -> Option<(usize, usize)> {
        let mut start = 0;
        for (segment_index, segment) in self.segments.iter().enumerate() {
            let end = start + segment.hop_fields.len();
            if hop_index < end {
                return Some((segment_index, hop_index - start));
            }
            start = end;
        }
        None
    }

    /// Returns the hop field at the given global index
    pub fn hop_field(&self, hop_index: usize) -> Option<&HopField> {
        let (segment, index) = self.locate_hop(hop_index)?;
        self.segments[segment].hop_fields.get(index)
    }

    /// Returns the segment owning the current hop field
    pub fn current_segment(&self) -> Option<&Segment> {
        let (segment, _) = self.locate_hop(usize::from(self.curr_hop_field))?;
        self.segments.get(segment)
    }

    /// Returns the current hop field
    pub fn current_hop_field(&self) -> Option<&HopField> {
        self.hop_field(usize::from(self.curr_hop_field))
    }
}

// Utility
impl StandardPath {
    /// Returns the total number of hop fields in the path
    pub fn hop_field_count(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| segment.hop_fields.len())
            .sum()
    }

    /// Returns the total number of info fields in the path
    pub fn info_field_count(&self) -> usize {
        self.segments.len()
    }

    /// Returns an iterator over all hop fields in the path
    pub fn iter_hop_fields(&self) -> impl Iterator<Item = &HopField> {
        self.segments
            .iter()
            .flat_map(|segment| segment.hop_fields.iter())
    }

    /// Returns an iterator over all info fields in the path
    pub fn iter_info_fields(&self) -> impl Iterator<Item = &InfoField> {
        self.segments.iter().map(|segment| &segment.info_field)
    }

    /// Returns the sizes of each segment in the path, saturating at 255
    pub fn segment_sizes(&self) -> [u8; MAX_SEGMENTS] {
        let size = |index: usize| {
            self.segments.get(index).map_or(0, |segment| {
                u8::try_from(segment.hop_fields.len()).unwrap_or(u8::MAX)
            })
        };
        [size(0), size(1), size(2)]
    }
}

impl WireEncode for StandardPath {
    fn required_size(&self) -> usize {
        let [seg0, seg1, seg2] = self.segment_sizes();
        StdPathMetaLayout::SIZE_BYTES + StdPathDataLayout::new(seg0, seg1, seg2).size_bytes()
    }

    fn wire_valid(&self) -> Result<(), InvalidStructureError> {
        if self.segments.is_empty() {
            return Err("Standard path must contain at least one segment".into());
        }

        if self.segments.len() > MAX_SEGMENTS {
            return Err("Standard path can not contain more than 3 segments".into());
        }

        for segment in &self.segments {
            if segment.hop_fields.len() > StdPathMetaLayout::MAX_SEGMENT_LENGTH {
                return Err("Number of hop fields in segment exceeds maximum allowed".into());
            }

            if segment.hop_fields.is_empty() {
                return Err("Segment must contain at least one hop field".into());
            }
        }

        if self.hop_field_count() > MAX_HOP_FIELDS {
            return Err("Number of hop fields in path exceeds maximum allowed".into());
        }

        self.meta().validate().map_err(|err| match err {
            MalformedPathError::CurrentHopOutOfRange { .. } => {
                InvalidStructureError::from("curr_hop_field exceeds total number of hop fields")
            }
            MalformedPathError::CurrentInfoMismatch { .. } => InvalidStructureError::from(
                "current_info_field does not match the segment of curr_hop_field",
            ),
            _ => InvalidStructureError::from("inconsistent segment lengths"),
        })
    }

    fn encode_unchecked(&self, buf: &mut [u8]) -> usize {
        let meta = self.meta();
        meta.write(buf);

        let [seg0, seg1, seg2] = meta.seg_lens;
        let data_layout = StdPathDataLayout::new(seg0, seg1, seg2);
        let data_buf = &mut buf[StdPathMetaLayout::SIZE_BYTES..];

        for (i, info_field) in self.iter_info_fields().enumerate() {
            let range = data_layout.info_field_range(i).aligned_byte_range();
            info_field.encode_unchecked(&mut data_buf[range]);
        }

        for (i, hop_field) in self.iter_hop_fields().enumerate() {
            let range = data_layout.hop_field_range(i).aligned_byte_range();
            hop_field.encode_unchecked(&mut data_buf[range]);
        }

        StdPathMetaLayout::SIZE_BYTES + data_layout.size_bytes()
    }
}

/// Read access shared by owned paths and path views
pub(crate) trait PathFields {
    /// Returns the validated meta header
    fn meta(&self) -> Result<PathMetaHeader, MalformedPathError>;
    fn info(&self, segment: usize) -> Option<InfoField>;
    fn hop(&self, index: usize) -> Option<HopField>;
}
impl PathFields for StandardPath {
    fn meta(&self) -> Result<PathMetaHeader, MalformedPathError> {
        self.checked_meta()
    }

    fn info(&self, segment: usize) -> Option<InfoField> {
        self.segments.get(segment).map(|segment| segment.info_field)
    }

    fn hop(&self, index: usize) -> Option<HopField> {
        self.hop_field(index).copied()
    }
}
impl PathFields for StandardPathView {
    fn meta(&self) -> Result<PathMetaHeader, MalformedPathError> {
        let meta = StandardPathView::meta(self);
        meta.validate()?;
        Ok(meta)
    }

    fn info(&self, segment: usize) -> Option<InfoField> {
        self.info_field(segment).map(InfoField::from_view)
    }

    fn hop(&self, index: usize) -> Option<HopField> {
        self.hop_field(index).map(HopField::from_view)
    }
}

/// Represents a segment in a standard SCION path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Info field containing metadata about the segment
    pub info_field: InfoField,
    /// Hop fields of the segment, in traversal order
    pub hop_fields: Vec<HopField>,
}

impl Segment {
    /// Returns the hop field indices of this segment in construction order
    ///
    /// This is the stored order if the segment is traversed in construction direction and the
    /// reversed order otherwise.
    pub fn construction_order(&self) -> impl Iterator<Item = usize> + use<> {
        let len = self.hop_fields.len();
        let cons_dir = self.info_field.flags.cons_dir();
        (0..len).map(move |i| if cons_dir { i } else { len - 1 - i })
    }
}

/// Represents an info field in a standard SCION path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InfoField {
    /// Info field flags
    pub flags: InfoFieldFlags,
    /// Segment ID
    ///
    /// Seeds the MAC chain of the segment.
    pub segment_id: u16,
    /// Timestamp when the segment was created, in seconds since the Unix epoch
    ///
    /// Hop field expiration is relative to it.
    pub timestamp: u32,
}

impl InfoField {
    /// Constructs a `InfoField` from a `InfoFieldView`
    pub fn from_view(view: &InfoFieldView) -> Self {
        InfoField {
            flags: view.flags(),
            segment_id: view.segment_id(),
            timestamp: view.timestamp(),
        }
    }
}

impl WireEncode for InfoField {
    fn required_size(&self) -> usize {
        InfoFieldLayout::SIZE_BYTES
    }

    fn wire_valid(&self) -> Result<(), InvalidStructureError> {
        // All values are full range, so always valid
        Ok(())
    }

    fn encode_unchecked(&self, buf: &mut [u8]) -> usize {
        use InfoFieldLayout as IFL;
        bit_range_be_write(buf, IFL::FLAGS_RNG, self.flags.bits());
        bit_range_be_write(buf, IFL::RSV_RNG, 0u8);
        bit_range_be_write(buf, IFL::SEGMENT_ID_RNG, self.segment_id);
        bit_range_be_write(buf, IFL::TIMESTAMP_RNG, self.timestamp);
        self.required_size()
    }
}

/// Represents a hop field in a standard SCION path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HopField {
    /// Hop field flags
    pub flags: HopFieldFlags,
    /// Hop field expiration units
    ///
    /// The hop field expires `(1 + exp_time)` times
    /// [`EXP_TIME_UNIT`](super::types::EXP_TIME_UNIT) after the timestamp of its info field.
    pub exp_time: u8,
    /// Ingress interface in construction direction
    ///
    /// A value of 0 indicates that the hop is at the start of the segment.
    pub cons_ingress: u16,
    /// Egress interface in construction direction
    ///
    /// A value of 0 indicates that the hop is at the end of the segment.
    pub cons_egress: u16,
    /// Truncated MAC chained to the previous hop in construction order
    pub mac: HopFieldMac,
}

impl HopField {
    /// Constructs a `HopField` from a `HopFieldView`
    pub fn from_view(view: &HopFieldView) -> Self {
        HopField {
            flags: view.flags(),
            exp_time: view.exp_time(),
            cons_ingress: view.cons_ingress(),
            cons_egress: view.cons_egress(),
            mac: view.mac(),
        }
    }

    /// Returns the absolute expiration time given the timestamp of the owning info field
    pub fn expiration(&self, info_timestamp: u32) -> SystemTime {
        UNIX_EPOCH
            + Duration::from_secs(u64::from(info_timestamp))
            + exp_time_to_duration(self.exp_time)
    }

    /// Returns the hop with ingress and egress exchanged, router alerts follow their interface
    pub fn swapped_interfaces(&self) -> Self {
        HopField {
            flags: self.flags.swapped_alerts(),
            exp_time: self.exp_time,
            cons_ingress: self.cons_egress,
            cons_egress: self.cons_ingress,
            mac: self.mac,
        }
    }
}

impl WireEncode for HopField {
    fn required_size(&self) -> usize {
        HopFieldLayout::SIZE_BYTES
    }

    fn wire_valid(&self) -> Result<(), InvalidStructureError> {
        // All values are full range, so always valid
        Ok(())
    }

    fn encode_unchecked(&self, buf: &mut [u8]) -> usize {
        use HopFieldLayout as HFL;
        bit_range_be_write(buf, HFL::FLAGS_RNG, self.flags.bits());
        bit_range_be_write(buf, HFL::EXP_TIME_RNG, self.exp_time);
        bit_range_be_write(buf, HFL::CONS_INGRESS_RNG, self.cons_ingress);
        bit_range_be_write(buf, HFL::CONS_EGRESS_RNG, self.cons_egress);
        buf[HFL::MAC_RNG.aligned_byte_range()].copy_from_slice(self.mac.as_bytes());
        self.required_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::encode::EncodeError;

    fn hop(cons_ingress: u16, cons_egress: u16) -> HopField {
        HopField {
            flags: HopFieldFlags::empty(),
            exp_time: 63,
            cons_ingress,
            cons_egress,
            mac: HopFieldMac::new([cons_ingress as u8, cons_egress as u8, 0, 0, 0, 1]),
        }
    }

    fn segment(flags: InfoFieldFlags, hops: &[(u16, u16)]) -> Segment {
        Segment {
            info_field: InfoField {
                flags,
                segment_id: 0xbeef,
                timestamp: 1_742_904_000,
            },
            hop_fields: hops.iter().map(|(i, e)| hop(*i, *e)).collect(),
        }
    }

    fn two_segment_path() -> StandardPath {
        StandardPath {
            current_info_field: 0,
            curr_hop_field: 1,
            segments: vec![
                segment(InfoFieldFlags::empty(), &[(4, 0), (2, 3)]),
                segment(InfoFieldFlags::CONS_DIR, &[(8, 9), (10, 0)]),
            ],
        }
    }

    #[test]
    fn should_decode_and_leave_trailing_bytes() {
        let path = two_segment_path();
        let mut buf = path.encode_to_vec().unwrap();
        assert_eq!(buf.len(), 4 + 2 * 8 + 4 * 12);
        buf.extend_from_slice(&[0xaa, 0xbb]);

        let (decoded, rest) = StandardPath::decode(&buf).unwrap();
        assert_eq!(decoded, path);
        assert_eq!(rest, &[0xaa, 0xbb]);
    }

    #[test]
    fn should_encode_hop_field_layout() {
        let mut hop = hop(0x0102, 0x0304);
        hop.flags = HopFieldFlags::CONS_EGRESS_ROUTER_ALERT;
        let mut buf = [0u8; 12];
        hop.encode(&mut buf).unwrap();
        assert_eq!(buf, [0x02, 63, 0x01, 0x02, 0x03, 0x04, 0x02, 0x04, 0, 0, 0, 1]);
    }

    #[test]
    fn should_refuse_to_encode_inconsistent_pointers() {
        let mut path = two_segment_path();
        path.curr_hop_field = 2;
        assert!(matches!(
            path.encode_to_vec(),
            Err(EncodeError::InvalidStructure(_))
        ));

        path.curr_hop_field = 4;
        path.current_info_field = 1;
        assert!(path.encode_to_vec().is_err());

        let empty = StandardPath {
            current_info_field: 0,
            curr_hop_field: 0,
            segments: vec![],
        };
        assert!(empty.encode_to_vec().is_err());
    }

    #[test]
    fn should_advance_across_segment_boundary() {
        let path = two_segment_path().advance().unwrap();
        assert_eq!((path.current_info_field, path.curr_hop_field), (1, 2));
        assert_eq!(path.current_hop_field(), Some(&hop(8, 9)));

        let last = path.advance().unwrap();
        assert_eq!(
            last.advance(),
            Err(PathError::PathExhausted { hop_count: 4 })
        );
    }

    #[test]
    fn should_reject_oversized_segments_instead_of_wrapping() {
        let oversized = StandardPath {
            current_info_field: 0,
            curr_hop_field: 0,
            segments: vec![Segment {
                hop_fields: vec![hop(1, 2); 257],
                ..segment(InfoFieldFlags::CONS_DIR, &[])
            }],
        };
        assert_eq!(oversized.segment_sizes(), [255, 0, 0]);
        assert_eq!(
            oversized.advance(),
            Err(PathError::Malformed(MalformedPathError::TooManyHops {
                total: 257,
                max: 63
            }))
        );
        assert!(oversized.meta().validate().is_err());

        let mut four = two_segment_path();
        four.segments.extend(four.segments.clone());
        assert_eq!(
            four.checked_meta(),
            Err(MalformedPathError::TooManySegments { count: 4 })
        );
    }

    #[test]
    fn should_iterate_construction_order_against_traversal() {
        let path = two_segment_path();
        assert_eq!(
            path.segments[0].construction_order().collect::<Vec<_>>(),
            vec![1, 0]
        );
        assert_eq!(
            path.segments[1].construction_order().collect::<Vec<_>>(),
            vec![0, 1]
        );
    }

    #[test]
    fn should_compute_absolute_expiration() {
        let mut hop = hop(1, 2);
        hop.exp_time = 0;
        assert_eq!(
            hop.expiration(1000),
            UNIX_EPOCH + Duration::from_millis(1_000_000 + 337_500)
        );
    }
}
