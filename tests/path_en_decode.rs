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

//! Contains tests for standard path parsing, encoding and in-place manipulation
//!
//! 1. All valid paths should roundtrip through encode/decode without loss of information or
//!    panics
//! 2. Advancing a valid path visits every remaining hop exactly once
//! 3. Reversal in place and on the model agree
//! 4. Built paths authenticate at every hop, also after reversal
//! 5. Brute force fuzzing must not panic during parsing, view manipulation or forwarding
//! 6. No invalid path must panic during encoding

use std::{
    panic::catch_unwind,
    time::{Duration, UNIX_EPOCH},
};

use proptest::{
    collection::vec,
    prelude::{ProptestConfig, Strategy, TestCaseError, any},
    prop_assert, prop_assert_eq, prop_oneof, proptest,
};
use proptest_derive::Arbitrary;
use scipath::{
    PathError, PathMetaHeader, StandardPath,
    core::{
        encode::{EncodeError, WireEncode},
        view::View,
    },
    forwarding::Forwarder,
    mac::{ActiveHop, ForwardingKey, verify_active_hop_with_seed},
    path::{builder::build_path, types::HopFieldMac, view::StandardPathView},
};

use crate::{built::BuiltPathOptions, valid::ValidPathOptions};

/// Creates valid paths with various options and ensures they roundtrip through encoding and
/// decoding. Validates all functions in the StandardPathView do not panic
#[test]
fn valid_paths_should_roundtrip_correctly() {
    proptest!(
        ProptestConfig::with_cases(2_000),
        |(opts: ValidPathOptions)| {
            test_impl(opts)?;
        }
    );

    fn test_impl(opts: ValidPathOptions) -> Result<(), TestCaseError> {
        let unwind = catch_unwind(|| {
            let initial = opts.to_path();
            if let Err(e) = initial.wire_valid() {
                println!("Generated path is not valid: {e:?}");
                return Err(TestCaseError::reject("Generated path is not valid"));
            }

            let mut buf = vec![0u8; initial.required_size()];
            initial.encode(&mut buf).expect("Writing to buffer failed");

            let (decoded, rest) = StandardPath::decode(&buf).expect("Decoding failed");
            prop_assert_eq!(rest.len(), 0);
            prop_assert_eq!(&initial, &decoded);

            let (view, rest) = StandardPathView::from_mut_slice(&mut buf).expect("View failed");
            prop_assert_eq!(rest.len(), 0);

            exec_every_view_function(view);

            prop_assert_eq!(initial, StandardPath::from_view(view));
            Ok(())
        });

        match unwind {
            Ok(res) => res,
            Err(panic) => {
                println!("Panic during roundtrip with options: {opts:#?}");
                println!("---");
                println!("{:?}", panic.downcast_ref::<&str>());

                prop_assert!(false, "Panic during roundtrip");
                Ok(())
            }
        }
    }
}

/// Advancing from any valid position visits every remaining hop in order and ends exhausted
#[test]
fn advancing_should_visit_every_hop() {
    proptest!(
        ProptestConfig::with_cases(1_000),
        |(opts: ValidPathOptions)| {
            let path = opts.to_path();
            let start = usize::from(path.curr_hop_field);
            let mut buf = path.encode_to_vec().expect("Encoding failed");
            let (view, _) = StandardPathView::from_mut_slice(&mut buf).expect("View failed");
            let hop_count = view.hop_field_count();

            let mut advances = 0;
            loop {
                match view.advance_in_place() {
                    Ok(meta) => {
                        advances += 1;
                        prop_assert_eq!(usize::from(meta.curr_hf), start + advances);
                        prop_assert_eq!(
                            meta.current_segment(),
                            Some(usize::from(meta.curr_inf))
                        );
                    }
                    Err(PathError::PathExhausted { hop_count: reported }) => {
                        prop_assert_eq!(reported, hop_count);
                        break;
                    }
                    Err(e) => prop_assert!(false, "Unexpected error {:?}", e),
                }
            }
            prop_assert_eq!(advances, hop_count - 1 - start);
        }
    );
}

/// Paths built with real MAC chains verify at every hop, in both directions, and any single
/// flipped MAC bit is caught
#[test]
fn built_paths_should_verify_forward_and_reversed() {
    proptest!(
        ProptestConfig::with_cases(300),
        |(opts in any::<BuiltPathOptions>(), flip in any::<(u8, u8)>())| {
            let (specs, keys) = opts.specs_and_keys();
            let path = build_path(&specs, &keys, 0, 0).expect("Building failed");

            let hop_keys: Vec<ForwardingKey> = keys.segments.iter().flatten().copied().collect();
            let hop_seeds = opts.hop_seeds();
            prop_assert_eq!(hop_keys.len(), path.hop_field_count());

            let positions = every_position(&path);
            prop_assert_eq!(positions.len(), hop_keys.len());
            for (index, position) in positions.iter().enumerate() {
                prop_assert!(
                    verify_active_hop_with_seed(position, &hop_keys[index], hop_seeds[index].as_ref()),
                    "hop {} failed", index
                );
            }

            let reversed = path.reversed();
            prop_assert_eq!(&reversed.reversed(), &path);
            let count = hop_keys.len();
            for (index, position) in every_position(&reversed).iter().enumerate() {
                let original = count - 1 - index;
                prop_assert!(
                    verify_active_hop_with_seed(
                        position,
                        &hop_keys[original],
                        hop_seeds[original].as_ref()
                    ),
                    "reversed hop {} failed", index
                );
            }

            let index = usize::from(flip.0) % count;
            let bit = usize::from(flip.1) % 48;
            let mut tampered = positions[index].clone();
            let (segment, hop) = tampered.locate_hop(index).expect("Hop out of range");
            let field = &mut tampered.segments[segment].hop_fields[hop];
            let mut mac = *field.mac.as_bytes();
            mac[bit / 8] ^= 0x80 >> (bit % 8);
            field.mac = HopFieldMac::new(mac);
            prop_assert!(!verify_active_hop_with_seed(
                &tampered,
                &hop_keys[index],
                hop_seeds[index].as_ref()
            ));
        }
    );

    fn every_position(path: &StandardPath) -> Vec<StandardPath> {
        let mut positions = Vec::new();
        let mut current = path.clone();
        loop {
            let next = current.advance();
            positions.push(current);
            match next {
                Ok(next) => current = next,
                Err(_) => return positions,
            }
        }
    }
}

/// Reversing the bytes in place produces the encoding of the reversed model
#[test]
fn reversal_in_place_should_match_model() {
    proptest!(
        ProptestConfig::with_cases(1_000),
        |(opts: ValidPathOptions)| {
            let path = opts.to_path();
            let mut buf = path.encode_to_vec().expect("Encoding failed");

            let (view, _) = StandardPathView::from_mut_slice(&mut buf).expect("View failed");
            view.reverse_in_place();

            let reversed = path.reversed();
            prop_assert_eq!(&buf, &reversed.encode_to_vec().expect("Encoding failed"));

            let rewound = StandardPath {
                current_info_field: 0,
                curr_hop_field: 0,
                ..path
            };
            prop_assert_eq!(reversed.reversed(), rewound);
        }
    );
}

/// Breaks paths in specific ways and ensures encoding fails without panicking
#[test]
fn encoding_invalid_paths_must_not_panic() {
    proptest!(
        ProptestConfig::with_cases(2_000),
        |(breaking: path_manipulation::PathBreakingOptions, opts: ValidPathOptions)| {
            encoding_invalid_paths_must_not_panic_impl(breaking, opts)?;
        }
    );

    fn encoding_invalid_paths_must_not_panic_impl(
        breaking: path_manipulation::PathBreakingOptions,
        opts: ValidPathOptions,
    ) -> Result<(), TestCaseError> {
        let unwind = catch_unwind(|| {
            let path = breaking.apply(opts.to_path());

            let mut buf = vec![0u8; path.required_size()];
            match path.encode(&mut buf) {
                Ok(_) => prop_assert!(false, "Invalid path encoding succeeded unexpectedly"),
                Err(EncodeError::InvalidStructure(_)) => return Ok(()),
                Err(e) => prop_assert!(false, "Unexpected error during encoding {:?}", e),
            }

            Ok(())
        });

        match unwind {
            Ok(res) => res,
            Err(panic) => {
                println!("{:?}", panic.downcast_ref::<&str>());
                prop_assert!(false, "Panic during invalid path encoding");
                Ok(())
            }
        }
    }
}

/// Feeds random bytes to the parser, the view functions and the forwarder
#[test]
fn parsing_random_bytes_must_not_panic() {
    proptest!(
        ProptestConfig::with_cases(5_000),
        |(data in rand_path_data())| {
            parsing_random_bytes_must_not_panic_impl(data)?;
        }
    );

    fn parsing_random_bytes_must_not_panic_impl(mut data: Vec<u8>) -> Result<(), TestCaseError> {
        let unwind = catch_unwind(move || {
            let forwarder = Forwarder::new(&ForwardingKey::new([0; 16]));
            let now = UNIX_EPOCH + Duration::from_secs(1_742_904_000);
            let _ = forwarder.process(&mut data, None, now);

            let _ = StandardPath::decode(&data);
            // Expected that some random data parses successfully
            if let Ok((view, _rest)) = StandardPathView::from_mut_slice(&mut data) {
                exec_every_view_function(view);
                let _ = ActiveHop::of_view(view);
                let _ = view.hops().count();
                view.reverse_in_place();
                let _ = view.advance_in_place();
            }
        });

        match unwind {
            Ok(()) => Ok(()),
            Err(panic) => {
                println!("{:?}", panic.downcast_ref::<&str>());
                prop_assert!(false, "Panic during random path parsing");
                Ok(())
            }
        }
    }

    /// Strategy for generating random path data
    fn rand_path_data() -> impl Strategy<Value = Vec<u8>> {
        // Bias random data to plausible segment lengths so more data passes the static checks
        fn bias_to_path_shape(mut data: Vec<u8>) -> Vec<u8> {
            if data.len() < 4 {
                return data;
            }
            let seg_lens = [data[1] % 8 + 1, data[2] % 4, data[3] % 4];
            let meta = PathMetaHeader {
                curr_inf: data[0] % 3,
                curr_hf: data[0] % 8,
                seg_lens,
            };
            meta.write(&mut data[..4]);
            data
        }

        prop_oneof![
            6 => vec(any::<u8>(), 4..=256).prop_map(bias_to_path_shape),
            3 => vec(any::<u8>(), 4..=800).prop_map(bias_to_path_shape),
            // Completely random data, likely caught by simple static checks
            1 => vec(any::<u8>(), 0..=800),
        ]
    }
}

/// Execute every function in the StandardPathView to ensure they do not panic
///
/// Mutable functions are called with the current value to avoid changing the path.
fn exec_every_view_function(view: &mut StandardPathView) {
    let _ = view.curr_info_field();
    let _ = view.curr_hop_field();
    let _ = view.seg0_len();
    let _ = view.seg1_len();
    let _ = view.seg2_len();
    let meta = view.meta();
    let _ = view.info_field_count();
    let _ = view.hop_field_count();
    let _ = view.current_info_field();
    let _ = view.current_hop_field();

    view.set_curr_info_field(view.curr_info_field());
    view.set_curr_hop_field(view.curr_hop_field());
    let _ = view.set_pointers(meta.curr_inf, meta.curr_hf);

    for index in 0..=view.info_field_count() {
        if let Some(info) = view.info_field_mut(index) {
            info.set_flags(info.flags());
            info.set_segment_id(info.segment_id());
            info.set_timestamp(info.timestamp());
        }
    }
    for index in 0..=view.hop_field_count() {
        if let Some(hop) = view.hop_field_mut(index) {
            hop.set_flags(hop.flags());
            hop.set_exp_time(hop.exp_time());
            hop.set_cons_ingress(hop.cons_ingress());
            hop.set_cons_egress(hop.cons_egress());
            hop.set_mac(hop.mac());
        }
    }

    let _ = view.info_fields().count();
    let _ = view.hop_fields().count();
}

/// Strategies for generating valid standard paths
mod valid {
    use proptest::prelude::prop;
    use scipath::{
        HopField, InfoField, Segment,
        path::types::{HopFieldFlags, HopFieldMac, InfoFieldFlags},
    };
    use tinyvec::ArrayVec;

    use super::*;

    /// Options for constructing a valid standard path for testing
    #[derive(Debug, Clone, Arbitrary)]
    pub struct ValidPathOptions {
        /// Picks the current hop, reduced modulo the hop count
        current: u8,
        #[proptest(strategy = "segments()")]
        segments: ArrayVec<[SegmentOptions; 3]>,
    }

    impl ValidPathOptions {
        pub fn to_path(&self) -> StandardPath {
            let segments: Vec<Segment> = self
                .segments
                .iter()
                .map(|seg_opt| Segment {
                    info_field: InfoField {
                        flags: seg_opt.info.flags,
                        segment_id: seg_opt.info.seg_id,
                        timestamp: seg_opt.info.timestamp,
                    },
                    hop_fields: seg_opt
                        .hops
                        .iter()
                        .map(|hop| HopField {
                            flags: hop.flags,
                            exp_time: hop.exp_time,
                            cons_ingress: hop.cons_ingress,
                            cons_egress: hop.cons_egress,
                            mac: HopFieldMac::from(hop.mac),
                        })
                        .collect(),
                })
                .collect();

            let hop_count: usize = segments.iter().map(|seg| seg.hop_fields.len()).sum();
            let curr_hop_field = usize::from(self.current) % hop_count.max(1);

            let mut current_info_field = 0;
            let mut start = 0;
            for (index, segment) in segments.iter().enumerate() {
                if curr_hop_field < start + segment.hop_fields.len() {
                    current_info_field = index;
                    break;
                }
                start += segment.hop_fields.len();
            }

            StandardPath {
                current_info_field: current_info_field as u8,
                curr_hop_field: curr_hop_field as u8,
                segments,
            }
        }
    }

    #[derive(Debug, Clone, Default)]
    pub struct SegmentOptions {
        info: TestInfoField,
        /// len must be in 1..=21 so three segments stay below the hop limit
        hops: Vec<TestHopField>,
    }

    #[derive(Debug, Clone, Arbitrary, Default)]
    pub struct TestInfoField {
        #[proptest(strategy = "info_flag()")]
        flags: InfoFieldFlags,
        seg_id: u16,
        timestamp: u32,
    }

    #[derive(Debug, Clone, Arbitrary, Default)]
    pub struct TestHopField {
        #[proptest(strategy = "hop_flag()")]
        flags: HopFieldFlags,
        exp_time: u8,
        cons_ingress: u16,
        cons_egress: u16,
        mac: [u8; 6],
    }

    /// Strategy for generating up to 3 segments
    fn segments() -> impl Strategy<Value = ArrayVec<[SegmentOptions; 3]>> {
        vec(segment_options(), 1..=3).prop_map(|segments| {
            let mut arr = ArrayVec::new();
            for seg in segments {
                if arr.try_push(seg).is_some() {
                    break;
                }
            }
            arr
        })
    }

    fn segment_options() -> impl Strategy<Value = SegmentOptions> {
        (any::<TestInfoField>(), vec(any::<TestHopField>(), 1..=21))
            .prop_map(|(info, hops)| SegmentOptions { info, hops })
    }

    fn hop_flag() -> impl Strategy<Value = HopFieldFlags> {
        prop::num::u8::ANY.prop_map(HopFieldFlags::from_bits_truncate)
    }

    fn info_flag() -> impl Strategy<Value = InfoFieldFlags> {
        prop::num::u8::ANY.prop_map(InfoFieldFlags::from_bits_truncate)
    }
}

/// Strategies for generating path descriptions with keys for the builder
mod built {
    use scipath::{
        mac::PeeringSeed,
        path::{
            builder::{HopSpec, PathKeys, SegmentSpec},
            types::InfoFieldFlags,
        },
    };

    use super::*;

    #[derive(Debug, Clone, Arbitrary)]
    pub struct BuiltPathOptions {
        #[proptest(strategy = "vec(built_segment(), 1..=3)")]
        segments: Vec<BuiltSegment>,
        /// Turns a two segment path into a peering path
        peering: bool,
        seeds: [[u8; 6]; 2],
        timestamp: u32,
    }

    #[derive(Debug, Clone)]
    pub struct BuiltSegment {
        cons_dir: bool,
        segment_id: u16,
        /// Ingress, egress, expiry and key of every hop
        hops: Vec<(u16, u16, u8, [u8; 16])>,
    }

    impl BuiltPathOptions {
        fn is_peering(&self) -> bool {
            self.peering && self.segments.len() == 2
        }

        pub fn specs_and_keys(&self) -> (Vec<SegmentSpec>, PathKeys) {
            let mut flags = InfoFieldFlags::empty();
            if self.is_peering() {
                flags |= InfoFieldFlags::PEERING;
            }

            let specs = self
                .segments
                .iter()
                .map(|segment| SegmentSpec {
                    flags: match segment.cons_dir {
                        true => flags | InfoFieldFlags::CONS_DIR,
                        false => flags,
                    },
                    segment_id: segment.segment_id,
                    timestamp: self.timestamp,
                    hops: segment
                        .hops
                        .iter()
                        .map(|(ingress, egress, exp_time, _)| HopSpec {
                            exp_time: *exp_time,
                            ..HopSpec::new(*ingress, *egress)
                        })
                        .collect(),
                })
                .collect();
            let keys = PathKeys {
                segments: self
                    .segments
                    .iter()
                    .map(|segment| {
                        segment
                            .hops
                            .iter()
                            .map(|(_, _, _, key)| ForwardingKey::new(*key))
                            .collect()
                    })
                    .collect(),
                peering_seeds: self
                    .is_peering()
                    .then(|| self.seeds.map(PeeringSeed)),
            };
            (specs, keys)
        }

        /// Returns the peering seed each hop was built with, in global hop order
        pub fn hop_seeds(&self) -> Vec<Option<PeeringSeed>> {
            let count: usize = self.segments.iter().map(|segment| segment.hops.len()).sum();
            let mut seeds = vec![None; count];
            if self.is_peering() {
                let junction = self.segments[0].hops.len();
                seeds[junction - 1] = Some(PeeringSeed(self.seeds[0]));
                seeds[junction] = Some(PeeringSeed(self.seeds[1]));
            }
            seeds
        }
    }

    fn built_segment() -> impl Strategy<Value = BuiltSegment> {
        (
            any::<bool>(),
            any::<u16>(),
            vec(any::<(u16, u16, u8, [u8; 16])>(), 1..=8),
        )
            .prop_map(|(cons_dir, segment_id, hops)| BuiltSegment {
                cons_dir,
                segment_id,
                hops,
            })
    }
}

/// Strategic manipulation of path models to create unencodable paths
mod path_manipulation {
    use scipath::Segment;

    use super::*;

    #[derive(Debug, Clone, Arbitrary)]
    pub enum PathBreakingOptions {
        /// Removes all segments
        NoSegments,
        /// Appends segments until there are four
        TooManySegments,
        /// Clears the hop fields of one segment
        EmptySegment(u8),
        /// Grows one segment past 63 hop fields
        OversizedSegment(u8),
        /// Moves the hop pointer past the last hop
        HopPointerOutOfRange(u8),
        /// Moves the info pointer away from the segment of the current hop
        InfoPointerMismatch(u8),
    }

    impl PathBreakingOptions {
        pub fn apply(&self, mut path: StandardPath) -> StandardPath {
            let segment_count = path.segments.len();
            match *self {
                PathBreakingOptions::NoSegments => path.segments.clear(),
                PathBreakingOptions::TooManySegments => {
                    let template = path.segments[0].clone();
                    while path.segments.len() < 4 {
                        path.segments.push(template.clone());
                    }
                }
                PathBreakingOptions::EmptySegment(seg) => {
                    path.segments[usize::from(seg) % segment_count]
                        .hop_fields
                        .clear();
                }
                PathBreakingOptions::OversizedSegment(seg) => {
                    let segment: &mut Segment = &mut path.segments[usize::from(seg) % segment_count];
                    let hop = segment.hop_fields[0];
                    segment.hop_fields.resize(64, hop);
                }
                PathBreakingOptions::HopPointerOutOfRange(extra) => {
                    let hop_count = path.hop_field_count();
                    path.curr_hop_field = (hop_count + usize::from(extra % 8)) as u8;
                }
                PathBreakingOptions::InfoPointerMismatch(offset) => {
                    let offset = 1 + offset % 2;
                    path.current_info_field = path.current_info_field.wrapping_add(offset) % 3;
                    if usize::from(path.current_info_field) >= segment_count {
                        path.current_info_field = 3;
                    }
                }
            }
            path
        }
    }
}
