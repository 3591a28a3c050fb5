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

//! Path construction.
//!
//! [`build_path`] turns a list of segment descriptions and their forwarding keys into a
//! [`StandardPath`] with every MAC filled in. [`PathBuilder`] wraps it in a fluent interface
//! with defaults for timestamps, expiry and keys.
//!
//! Two derived path kinds are built from an up and a down segment:
//!
//! * [`build_shortcut`] joins them at their first common AS instead of going through the core.
//! * [`build_peering`] joins them over a peering link, which mixes a seed into the MACs of the
//!   two hops adjacent to the link.
//!
//! All input errors are reported as [`BuildError`] at build time.

use crate::{
    address::IsdAsn,
    error::BuildError,
    mac::{ForwardingKey, JunctionSeeds, PeeringSeed, compute_segment_macs, validate_segment_macs},
    path::{
        layout::StdPathMetaLayout,
        meta::PathMetaHeader,
        model::{HopField, InfoField, Segment, StandardPath},
        types::{HopFieldFlags, HopFieldMac, InfoFieldFlags, MAX_HOP_FIELDS, MAX_SEGMENTS},
    },
};

/// Description of a single hop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopSpec {
    /// Ingress interface as stored in the hop field
    pub cons_ingress: u16,
    /// Egress interface as stored in the hop field
    pub cons_egress: u16,
    /// Expiration units relative to the segment timestamp
    pub exp_time: u8,
    /// Router alert flags
    pub flags: HopFieldFlags,
    /// AS owning the hop, required for shortcut detection
    pub isd_asn: Option<IsdAsn>,
}
impl HopSpec {
    /// Creates a hop with maximum expiry and no flags
    pub fn new(cons_ingress: u16, cons_egress: u16) -> Self {
        Self {
            cons_ingress,
            cons_egress,
            exp_time: u8::MAX,
            flags: HopFieldFlags::empty(),
            isd_asn: None,
        }
    }

    /// Sets the owning AS
    pub fn in_as(mut self, isd_asn: IsdAsn) -> Self {
        self.isd_asn = Some(isd_asn);
        self
    }

    fn to_hop_field(self) -> HopField {
        HopField {
            flags: self.flags,
            exp_time: self.exp_time,
            cons_ingress: self.cons_ingress,
            cons_egress: self.cons_egress,
            mac: HopFieldMac::ZERO,
        }
    }
}

/// Description of a segment, hops in stored (traversal) order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentSpec {
    /// Info field flags
    pub flags: InfoFieldFlags,
    /// Segment ID
    pub segment_id: u16,
    /// Segment timestamp in seconds since the Unix epoch
    pub timestamp: u32,
    /// Hops of the segment
    pub hops: Vec<HopSpec>,
}
impl SegmentSpec {
    fn info_field(&self) -> InfoField {
        InfoField {
            flags: self.flags,
            segment_id: self.segment_id,
            timestamp: self.timestamp,
        }
    }
}

/// Key material for building a path
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathKeys {
    /// One key per hop, grouped like the segments
    pub segments: Vec<Vec<ForwardingKey>>,
    /// Seeds of the hop before and the hop after a peering junction
    pub peering_seeds: Option<[PeeringSeed; 2]>,
}

/// Builds a path with all MACs computed.
///
/// `curr_inf` and `curr_hf` set the initial pointers and must describe a valid position.
pub fn build_path(
    segments: &[SegmentSpec],
    keys: &PathKeys,
    curr_inf: u8,
    curr_hf: u8,
) -> Result<StandardPath, BuildError> {
    check_segments(segments)?;

    if keys.segments.len() != segments.len() {
        return Err(BuildError::SegmentKeysMismatch {
            expected: segments.len(),
            actual: keys.segments.len(),
        });
    }
    for (segment, (spec, keys)) in segments.iter().zip(&keys.segments).enumerate() {
        if spec.hops.len() != keys.len() {
            return Err(BuildError::KeyCountMismatch {
                segment,
                expected: spec.hops.len(),
                actual: keys.len(),
            });
        }
    }

    let junctions: Vec<bool> = segments
        .windows(2)
        .map(|pair| pair[0].flags.peering() && pair[1].flags.peering())
        .collect();
    let seeds = match (junctions.iter().position(|junction| *junction), keys.peering_seeds) {
        (Some(segment), None) => return Err(BuildError::MissingPeeringSeeds { segment }),
        (None, Some(_)) => return Err(BuildError::UnexpectedPeeringSeeds),
        (_, seeds) => seeds,
    };

    let mut seg_lens = [0u8; MAX_SEGMENTS];
    for (len, spec) in seg_lens.iter_mut().zip(segments) {
        *len = spec.hops.len() as u8;
    }
    PathMetaHeader::new(curr_inf, curr_hf, seg_lens).map_err(BuildError::InvalidPointer)?;

    let mut built = Vec::with_capacity(segments.len());
    for (index, (spec, keys)) in segments.iter().zip(&keys.segments).enumerate() {
        let junction_before = index > 0 && junctions[index - 1];
        let junction_after = junctions.get(index).copied().unwrap_or(false);
        let junction_seeds = JunctionSeeds {
            first: seeds.filter(|_| junction_before).map(|[_, after]| after),
            last: seeds.filter(|_| junction_after).map(|[before, _]| before),
        };

        let mut segment = Segment {
            info_field: spec.info_field(),
            hop_fields: spec.hops.iter().map(|hop| hop.to_hop_field()).collect(),
        };
        compute_segment_macs(&mut segment, keys, junction_seeds)
            .map_err(|err| err.in_segment(index))?;
        debug_assert_eq!(validate_segment_macs(&segment, keys, junction_seeds), Ok(()));

        built.push(segment);
    }

    tracing::debug!(
        segments = built.len(),
        hops = seg_lens.iter().map(|len| usize::from(*len)).sum::<usize>(),
        peering = seeds.is_some(),
        "Built standard path"
    );

    Ok(StandardPath {
        current_info_field: curr_inf,
        curr_hop_field: curr_hf,
        segments: built,
    })
}

fn check_segments(segments: &[SegmentSpec]) -> Result<(), BuildError> {
    if segments.is_empty() {
        return Err(BuildError::NoSegments);
    }
    if segments.len() > MAX_SEGMENTS {
        return Err(BuildError::TooManySegments {
            count: segments.len(),
        });
    }

    for (segment, spec) in segments.iter().enumerate() {
        if spec.hops.is_empty() {
            return Err(BuildError::EmptySegment { segment });
        }
        if spec.hops.len() > StdPathMetaLayout::MAX_SEGMENT_LENGTH {
            return Err(BuildError::TooManyHops {
                total: spec.hops.len(),
                max: StdPathMetaLayout::MAX_SEGMENT_LENGTH,
            });
        }
    }

    let total = segments.iter().map(|spec| spec.hops.len()).sum();
    if total > MAX_HOP_FIELDS {
        return Err(BuildError::TooManyHops {
            total,
            max: MAX_HOP_FIELDS,
        });
    }

    Ok(())
}

/// Builds a shortcut path from an up and a down segment.
///
/// The segments are joined at the first hop of `up` (in traversal order) whose AS also appears
/// on `down`. Both segments are cut at that AS, and a segment that is left with only the
/// junction hop is dropped. The MAC chains of the cut segments are computed afresh with the
/// remaining keys.
///
/// Every hop must carry an [`IsdAsn`]. Fails with [`BuildError::NoCommonHop`] if the segments
/// share no AS.
pub fn build_shortcut(
    up: &SegmentSpec,
    up_keys: &[ForwardingKey],
    down: &SegmentSpec,
    down_keys: &[ForwardingKey],
) -> Result<StandardPath, BuildError> {
    check_segments(&[up.clone(), down.clone()])?;
    for (segment, (spec, keys)) in [(up, up_keys), (down, down_keys)].iter().enumerate() {
        if spec.hops.len() != keys.len() {
            return Err(BuildError::KeyCountMismatch {
                segment,
                expected: spec.hops.len(),
                actual: keys.len(),
            });
        }
    }

    let up_ases = isd_asns(up, 0)?;
    let down_ases = isd_asns(down, 1)?;

    let (up_end, down_start) = up_ases
        .iter()
        .enumerate()
        .find_map(|(i, isd_asn)| {
            let j = down_ases.iter().position(|other| other == isd_asn)?;
            Some((i, j))
        })
        .ok_or(BuildError::NoCommonHop)?;

    tracing::debug!(
        junction = %up_ases[up_end],
        up_hops = up_end + 1,
        down_hops = down.hops.len() - down_start,
        "Found shortcut"
    );

    let cut_up = SegmentSpec {
        hops: up.hops[..=up_end].to_vec(),
        ..up.clone()
    };
    let cut_down = SegmentSpec {
        hops: down.hops[down_start..].to_vec(),
        ..down.clone()
    };
    let up_keys = up_keys[..=up_end].to_vec();
    let down_keys = down_keys[down_start..].to_vec();

    let up_only_junction = cut_up.hops.len() == 1;
    let down_only_junction = cut_down.hops.len() == 1;

    let (segments, keys) = match (up_only_junction, down_only_junction) {
        (true, false) => (vec![cut_down], vec![down_keys]),
        (false, true) | (true, true) => (vec![cut_up], vec![up_keys]),
        (false, false) => (vec![cut_up, cut_down], vec![up_keys, down_keys]),
    };

    build_path(
        &segments,
        &PathKeys {
            segments: keys,
            peering_seeds: None,
        },
        0,
        0,
    )
}

fn isd_asns(spec: &SegmentSpec, segment: usize) -> Result<Vec<IsdAsn>, BuildError> {
    spec.hops
        .iter()
        .enumerate()
        .map(|(hop, spec)| {
            spec.isd_asn
                .ok_or(BuildError::MissingIsdAsn { segment, hop })
        })
        .collect()
}

/// Builds a peering path from an up and a down segment.
///
/// Both info fields get the peering flag. `seeds[0]` goes into the MAC of the last hop of `up`,
/// `seeds[1]` into the MAC of the first hop of `down`.
pub fn build_peering(
    up: &SegmentSpec,
    up_keys: &[ForwardingKey],
    down: &SegmentSpec,
    down_keys: &[ForwardingKey],
    seeds: [PeeringSeed; 2],
) -> Result<StandardPath, BuildError> {
    let segments = [
        SegmentSpec {
            flags: up.flags | InfoFieldFlags::PEERING,
            ..up.clone()
        },
        SegmentSpec {
            flags: down.flags | InfoFieldFlags::PEERING,
            ..down.clone()
        },
    ];

    build_path(
        &segments,
        &PathKeys {
            segments: vec![up_keys.to_vec(), down_keys.to_vec()],
            peering_seeds: Some(seeds),
        },
        0,
        0,
    )
}

/// Fluent builder for standard paths.
///
/// Settings such as the timestamp, expiry and forwarding key apply to the segments and hops
/// added after them. Errors are collected and reported by [`PathBuilder::build`].
///
/// ```
/// # use scipath::path::builder::PathBuilder;
/// let path = PathBuilder::new()
///     .using_info_timestamp(1_742_904_000)
///     .up(1)
///     .add_hop(4, 0)
///     .add_hop(2, 3)
///     .down(2)
///     .add_hop(8, 9)
///     .add_hop(10, 0)
///     .build()
///     .unwrap();
/// assert_eq!(path.hop_field_count(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct PathBuilder {
    segments: Vec<SegmentSpec>,
    keys: Vec<Vec<ForwardingKey>>,
    peering_seeds: Option<[PeeringSeed; 2]>,
    current: (u8, u8),
    default_timestamp: u32,
    default_hop_expiry: u8,
    default_key: ForwardingKey,
    error: Option<BuildError>,
}

impl Default for PathBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathBuilder {
    /// Creates an empty builder
    pub fn new() -> Self {
        PathBuilder {
            segments: Vec::new(),
            keys: Vec::new(),
            peering_seeds: None,
            current: (0, 0),
            default_timestamp: 0,
            default_hop_expiry: u8::MAX,
            default_key: ForwardingKey::new([0u8; 16]),
            error: None,
        }
    }

    /// Sets the timestamp used in the following info fields
    pub fn using_info_timestamp(mut self, timestamp: u32) -> Self {
        self.default_timestamp = timestamp;
        self
    }

    /// Sets the hop expiry time used in the following hop fields
    pub fn with_hop_expiry(mut self, exp_time: u8) -> Self {
        self.default_hop_expiry = exp_time;
        self
    }

    /// Sets the forwarding key used in the following hop fields
    pub fn using_forwarding_key(mut self, key: ForwardingKey) -> Self {
        self.default_key = key;
        self
    }

    /// Sets the initial pointers of the path
    pub fn with_current(mut self, curr_inf: u8, curr_hf: u8) -> Self {
        self.current = (curr_inf, curr_hf);
        self
    }

    /// Sets the seeds for a peering junction, see [`build_peering`]
    pub fn with_peering_seeds(mut self, seeds: [PeeringSeed; 2]) -> Self {
        self.peering_seeds = Some(seeds);
        self
    }

    /// Adds an up segment, traversed against construction direction
    pub fn up(self, segment_id: u16) -> Self {
        self.segment(InfoFieldFlags::empty(), segment_id)
    }

    /// Adds a core segment, traversed in construction direction
    pub fn core(self, segment_id: u16) -> Self {
        self.segment(InfoFieldFlags::CONS_DIR, segment_id)
    }

    /// Adds a down segment, traversed in construction direction
    pub fn down(self, segment_id: u16) -> Self {
        self.segment(InfoFieldFlags::CONS_DIR, segment_id)
    }

    /// Adds a segment with the given flags
    pub fn segment(mut self, flags: InfoFieldFlags, segment_id: u16) -> Self {
        self.segments.push(SegmentSpec {
            flags,
            segment_id,
            timestamp: self.default_timestamp,
            hops: Vec::new(),
        });
        self.keys.push(Vec::new());
        self
    }

    /// Marks the last added segment as part of a peering path
    pub fn peering(mut self) -> Self {
        match self.segments.last_mut() {
            Some(segment) => segment.flags |= InfoFieldFlags::PEERING,
            None => self.record(BuildError::NoSegments),
        }
        self
    }

    /// Adds a hop to the last segment using the default key
    pub fn add_hop(self, cons_ingress: u16, cons_egress: u16) -> Self {
        let key = self.default_key;
        self.add_hop_with_key(cons_ingress, cons_egress, key)
    }

    /// Adds a hop to the last segment using the given key
    pub fn add_hop_with_key(self, cons_ingress: u16, cons_egress: u16, key: ForwardingKey) -> Self {
        let hop = HopSpec {
            exp_time: self.default_hop_expiry,
            ..HopSpec::new(cons_ingress, cons_egress)
        };
        self.add_hop_spec(hop, key)
    }

    /// Adds a hop owned by `isd_asn` to the last segment using the default key
    pub fn add_as_hop(self, isd_asn: IsdAsn, cons_ingress: u16, cons_egress: u16) -> Self {
        let hop = HopSpec {
            exp_time: self.default_hop_expiry,
            ..HopSpec::new(cons_ingress, cons_egress).in_as(isd_asn)
        };
        let key = self.default_key;
        self.add_hop_spec(hop, key)
    }

    /// Adds a fully specified hop to the last segment
    pub fn add_hop_spec(mut self, hop: HopSpec, key: ForwardingKey) -> Self {
        match (self.segments.last_mut(), self.keys.last_mut()) {
            (Some(segment), Some(keys)) => {
                segment.hops.push(hop);
                keys.push(key);
            }
            _ => self.record(BuildError::HopOutsideSegment),
        }
        self
    }

    /// Builds the path
    pub fn build(self) -> Result<StandardPath, BuildError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let (curr_inf, curr_hf) = self.current;
        build_path(
            &self.segments,
            &PathKeys {
                segments: self.keys,
                peering_seeds: self.peering_seeds,
            },
            curr_inf,
            curr_hf,
        )
    }

    fn record(&mut self, err: BuildError) {
        // Only the first error is reported
        if self.error.is_none() {
            self.error = Some(err);
        }
    }
}
