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

//! Hop field authentication.
//!
//! Every hop field carries the first 6 bytes of an AES-128-CMAC over the following block:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |             SegID             |        Timestamp (hi)         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |        Timestamp (lo)         |       0       |    ExpTime    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |         Cons Ingress          |          Cons Egress          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                               0                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Chain MAC                           |
//! +                               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                               |                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
//! |                         Peering Seed                          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                               0                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! * The interface pair is taken in construction direction: as stored when the segment's `C` flag
//!   is set, exchanged otherwise. Reversing a path exchanges the stored pair and flips `C`, so the
//!   block and therefore the MAC stay the same.
//! * The chain MAC is the MAC of the previous hop in construction order, all zero for the first
//!   hop.
//! * The peering seed is only set for the two hop fields next to a peering junction.
//!
//! Forwarding only ever looks at the active hop and its chain predecessor, see [`ActiveHop`].

use std::fmt::Debug;

use aes::Aes128;
use cmac::{Cmac, Mac};
use subtle::ConstantTimeEq;

use crate::{
    error::{BuildError, MalformedPathError, PathError},
    path::{
        meta::PathMetaHeader,
        model::{HopField, InfoField, PathFields, Segment, StandardPath},
        types::HopFieldMac,
        view::StandardPathView,
    },
};

/// Symmetric key of an AS used to authenticate its hop fields.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ForwardingKey([u8; 16]);
impl ForwardingKey {
    /// Creates a key from raw bytes.
    pub const fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}
impl From<[u8; 16]> for ForwardingKey {
    fn from(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }
}
impl Debug for ForwardingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ForwardingKey(..)")
    }
}

/// Opaque per-junction input mixed into the MAC of hop fields next to a peering link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PeeringSeed(pub [u8; 6]);
impl From<[u8; 6]> for PeeringSeed {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

/// Input block of a single hop field MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacInput {
    /// Segment ID of the owning info field
    pub segment_id: u16,
    /// Timestamp of the owning info field
    pub timestamp: u32,
    /// Expiration units of the hop field
    pub exp_time: u8,
    /// Ingress interface in construction direction
    pub cons_ingress: u16,
    /// Egress interface in construction direction
    pub cons_egress: u16,
    /// MAC of the previous hop in construction order
    pub chain: HopFieldMac,
    /// Seed of a peering junction, zero elsewhere
    pub peering_seed: PeeringSeed,
}
impl MacInput {
    /// Size of the input block in bytes
    pub const SIZE: usize = 32;

    /// Builds the input for `hop` stored under `info`.
    pub fn new(
        info: &InfoField,
        hop: &HopField,
        chain: HopFieldMac,
        peering_seed: Option<&PeeringSeed>,
    ) -> Self {
        let (cons_ingress, cons_egress) = match info.flags.cons_dir() {
            true => (hop.cons_ingress, hop.cons_egress),
            false => (hop.cons_egress, hop.cons_ingress),
        };

        Self {
            segment_id: info.segment_id,
            timestamp: info.timestamp,
            exp_time: hop.exp_time,
            cons_ingress,
            cons_egress,
            chain,
            peering_seed: peering_seed.copied().unwrap_or_default(),
        }
    }

    /// Serializes the input block
    pub fn to_block(&self) -> [u8; Self::SIZE] {
        let mut block = [0u8; Self::SIZE];
        block[0..2].copy_from_slice(&self.segment_id.to_be_bytes());
        block[2..6].copy_from_slice(&self.timestamp.to_be_bytes());
        block[7] = self.exp_time;
        block[8..10].copy_from_slice(&self.cons_ingress.to_be_bytes());
        block[10..12].copy_from_slice(&self.cons_egress.to_be_bytes());
        block[16..22].copy_from_slice(self.chain.as_bytes());
        block[22..28].copy_from_slice(&self.peering_seed.0);
        block
    }
}

/// Computes and verifies hop field MACs for a single AS.
///
/// The AES key schedule is prepared once. The authenticator is read-only afterwards and can be
/// shared between threads.
#[derive(Clone)]
pub struct HopAuthenticator {
    cmac: Cmac<Aes128>,
}
impl HopAuthenticator {
    /// Creates an authenticator for the given key
    pub fn new(key: &ForwardingKey) -> Self {
        Self {
            cmac: <Cmac<Aes128> as Mac>::new(&key.0.into()),
        }
    }

    /// Computes the truncated MAC over the given input
    pub fn compute(&self, input: &MacInput) -> HopFieldMac {
        let mut cmac = self.cmac.clone();
        cmac.update(&input.to_block());
        let tag = cmac.finalize().into_bytes();

        // leading 6 bytes, as border routers truncate
        let mut mac = [0u8; HopFieldMac::SIZE];
        mac.copy_from_slice(&tag[..HopFieldMac::SIZE]);
        HopFieldMac::new(mac)
    }

    /// Computes the MAC of `hop` stored under `info`
    pub fn hop_mac(
        &self,
        info: &InfoField,
        hop: &HopField,
        chain: HopFieldMac,
        peering_seed: Option<&PeeringSeed>,
    ) -> HopFieldMac {
        self.compute(&MacInput::new(info, hop, chain, peering_seed))
    }

    /// Returns true if the MAC of the active hop matches, compared in constant time
    pub fn verify(&self, active: &ActiveHop, peering_seed: Option<&PeeringSeed>) -> bool {
        let seed = match active.peering_junction {
            true => peering_seed,
            false => None,
        };
        let expected = self.hop_mac(&active.info, &active.hop, active.chain, seed);
        expected.as_bytes()[..]
            .ct_eq(&active.hop.mac.as_bytes()[..])
            .into()
    }

    /// Verifies the active hop, failing with [`PathError::AuthenticationFailed`] on mismatch
    pub fn authenticate(
        &self,
        active: &ActiveHop,
        peering_seed: Option<&PeeringSeed>,
    ) -> Result<(), PathError> {
        match self.verify(active, peering_seed) {
            true => Ok(()),
            false => Err(PathError::AuthenticationFailed {
                hop_index: active.hop_index,
            }),
        }
    }
}
impl Debug for HopAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HopAuthenticator").finish_non_exhaustive()
    }
}

/// Everything needed to authenticate the current hop field of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveHop {
    /// Global index of the hop field
    pub hop_index: usize,
    /// Index of the owning segment
    pub segment: usize,
    /// Info field of the owning segment
    pub info: InfoField,
    /// The hop field itself
    pub hop: HopField,
    /// MAC of the previous hop in construction order, zero for the first one
    pub chain: HopFieldMac,
    /// Whether the hop is adjacent to a peering junction
    pub peering_junction: bool,
}
impl ActiveHop {
    /// Locates the current hop field of an owned path
    pub fn of_path(path: &StandardPath) -> Result<Self, PathError> {
        Self::locate(path)
    }

    /// Locates the current hop field of a path view
    pub fn of_view(view: &StandardPathView) -> Result<Self, PathError> {
        Self::locate(view)
    }

    fn locate<P: PathFields + ?Sized>(path: &P) -> Result<Self, PathError> {
        let meta = path.meta()?;

        let hop_index = usize::from(meta.curr_hf);
        let segment = usize::from(meta.curr_inf);
        let range = meta.segment_range(segment);
        let missing = PathError::Malformed(MalformedPathError::CurrentHopOutOfRange {
            curr_hf: meta.curr_hf,
            hop_count: meta.hop_count(),
        });

        let info = path.info(segment).ok_or(missing)?;
        let hop = path.hop(hop_index).ok_or(missing)?;

        let predecessor = chain_predecessor(range.clone(), hop_index, info.flags.cons_dir());
        let chain = predecessor
            .and_then(|index| path.hop(index))
            .map_or(HopFieldMac::ZERO, |hop| hop.mac);

        Ok(Self {
            hop_index,
            segment,
            info,
            hop,
            chain,
            peering_junction: is_peering_junction(&meta, hop_index, |seg| path.info(seg)),
        })
    }
}

/// Returns the global index of the hop preceding `hop_index` in construction order
///
/// `segment` is the range of global hop indices of the owning segment.
pub fn chain_predecessor(
    segment: std::ops::Range<usize>,
    hop_index: usize,
    cons_dir: bool,
) -> Option<usize> {
    match cons_dir {
        true => (hop_index > segment.start).then(|| hop_index - 1),
        false => (hop_index + 1 < segment.end).then_some(hop_index + 1),
    }
}

/// Returns true if the hop at `hop_index` sits next to a peering junction
///
/// A junction joins two adjacent segments that both have the peering flag set. The last hop
/// of the earlier segment and the first hop of the later segment are adjacent to it.
pub fn is_peering_junction(
    meta: &PathMetaHeader,
    hop_index: usize,
    info: impl Fn(usize) -> Option<InfoField>,
) -> bool {
    let Some(segment) = meta.segment_of(hop_index) else {
        return false;
    };
    let peering = |seg: usize| info(seg).is_some_and(|info| info.flags.peering());
    if !peering(segment) {
        return false;
    }

    let range = meta.segment_range(segment);
    let junction_after = hop_index + 1 == range.end
        && segment + 1 < meta.info_field_count()
        && peering(segment + 1);
    let junction_before = hop_index == range.start && segment > 0 && peering(segment - 1);

    junction_after || junction_before
}

/// Returns true if the active hop of `path` carries a valid MAC for `key`
///
/// Peering junction hops fail without a seed, see [`verify_active_hop_with_seed`].
pub fn verify_active_hop(path: &StandardPath, key: &ForwardingKey) -> bool {
    verify_active_hop_with_seed(path, key, None)
}

/// Returns true if the active hop of `path` carries a valid MAC for `key` and `peering_seed`
pub fn verify_active_hop_with_seed(
    path: &StandardPath,
    key: &ForwardingKey,
    peering_seed: Option<&PeeringSeed>,
) -> bool {
    authenticate_active_hop(path, &HopAuthenticator::new(key), peering_seed).is_ok()
}

/// Authenticates the active hop of `path`
///
/// Fails with [`PathError::Malformed`] if the pointers are inconsistent and with
/// [`PathError::AuthenticationFailed`] on a MAC mismatch.
pub fn authenticate_active_hop(
    path: &StandardPath,
    authenticator: &HopAuthenticator,
    peering_seed: Option<&PeeringSeed>,
) -> Result<(), PathError> {
    let active = ActiveHop::of_path(path)?;
    authenticator.authenticate(&active, peering_seed)
}

/// Seeds for the two outer hops of a segment, in stored order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JunctionSeeds {
    /// Seed of the first stored hop field
    pub first: Option<PeeringSeed>,
    /// Seed of the last stored hop field
    pub last: Option<PeeringSeed>,
}
impl JunctionSeeds {
    fn for_hop(&self, index: usize, len: usize) -> Option<&PeeringSeed> {
        // A single hop segment can only border one junction
        if index + 1 == len && self.last.is_some() {
            return self.last.as_ref();
        }
        if index == 0 {
            return self.first.as_ref();
        }
        None
    }
}

/// Fills in the MAC chain of a segment
///
/// `keys` holds one key per hop field in stored order. MACs are computed in construction
/// order, each chained to the one computed before it.
///
/// Fails with [`BuildError::KeyCountMismatch`] if the number of keys does not match the number
/// of hop fields, the segment is left untouched then. The reported segment index is 0, callers
/// building a multi-segment path use [`BuildError::in_segment`] to fix it up.
pub fn compute_segment_macs(
    segment: &mut Segment,
    keys: &[ForwardingKey],
    seeds: JunctionSeeds,
) -> Result<(), BuildError> {
    let len = segment.hop_fields.len();
    if keys.len() != len {
        return Err(BuildError::KeyCountMismatch {
            segment: 0,
            expected: len,
            actual: keys.len(),
        });
    }

    let info = segment.info_field;
    let mut chain = HopFieldMac::ZERO;
    for index in segment.construction_order() {
        let seed = seeds.for_hop(index, len);
        let hop = &mut segment.hop_fields[index];
        hop.mac = HopAuthenticator::new(&keys[index]).hop_mac(&info, hop, chain, seed);
        chain = hop.mac;
    }
    Ok(())
}

/// Verifies the whole MAC chain of a segment
///
/// Returns the stored index of the first hop field with a mismatching MAC on failure.
pub fn validate_segment_macs(
    segment: &Segment,
    keys: &[ForwardingKey],
    seeds: JunctionSeeds,
) -> Result<(), usize> {
    if segment.hop_fields.len() != keys.len() {
        return Err(keys.len().min(segment.hop_fields.len()));
    }

    let len = segment.hop_fields.len();
    let mut chain = HopFieldMac::ZERO;
    for index in segment.construction_order() {
        let hop = &segment.hop_fields[index];
        let expected = HopAuthenticator::new(&keys[index]).hop_mac(
            &segment.info_field,
            hop,
            chain,
            seeds.for_hop(index, len),
        );
        if !bool::from(expected.as_bytes()[..].ct_eq(&hop.mac.as_bytes()[..])) {
            return Err(index);
        }
        chain = hop.mac;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::types::{HopFieldFlags, InfoFieldFlags};

    const KEY: ForwardingKey = ForwardingKey::new([
        0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e,
        0x0f,
    ]);

    fn info(flags: InfoFieldFlags) -> InfoField {
        InfoField {
            flags,
            segment_id: 0xbeef,
            timestamp: 1_742_904_000,
        }
    }

    fn hop(cons_ingress: u16, cons_egress: u16) -> HopField {
        HopField {
            flags: HopFieldFlags::empty(),
            exp_time: 63,
            cons_ingress,
            cons_egress,
            mac: HopFieldMac::ZERO,
        }
    }

    #[test]
    fn should_match_known_answer() {
        let mac = HopAuthenticator::new(&KEY).hop_mac(
            &info(InfoFieldFlags::CONS_DIR),
            &hop(2, 3),
            HopFieldMac::ZERO,
            None,
        );
        assert_eq!(mac, HopFieldMac::new([0x34, 0xf4, 0xd8, 0x79, 0x3d, 0x6c]));
    }

    #[test]
    fn should_orient_interfaces_by_construction_direction() {
        let auth = HopAuthenticator::new(&KEY);
        let forward = auth.hop_mac(
            &info(InfoFieldFlags::CONS_DIR),
            &hop(2, 3),
            HopFieldMac::ZERO,
            None,
        );
        let against = auth.hop_mac(
            &info(InfoFieldFlags::empty()),
            &hop(3, 2),
            HopFieldMac::ZERO,
            None,
        );
        assert_eq!(forward, against);
    }

    #[test]
    fn should_serialize_input_block() {
        let input = MacInput {
            segment_id: 0x0102,
            timestamp: 0x0304_0506,
            exp_time: 7,
            cons_ingress: 0x0809,
            cons_egress: 0x0a0b,
            chain: HopFieldMac::new([0x10, 0x11, 0x12, 0x13, 0x14, 0x15]),
            peering_seed: PeeringSeed([0x20, 0x21, 0x22, 0x23, 0x24, 0x25]),
        };
        assert_eq!(
            input.to_block(),
            [
                0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x00, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0, 0, 0,
                0, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0, 0,
                0, 0,
            ]
        );
    }

    #[test]
    fn should_chain_in_construction_order() {
        let mut segment = Segment {
            info_field: info(InfoFieldFlags::empty()),
            hop_fields: vec![hop(4, 0), hop(2, 3), hop(0, 1)],
        };
        compute_segment_macs(&mut segment, &[KEY; 3], JunctionSeeds::default()).unwrap();
        assert_eq!(validate_segment_macs(&segment, &[KEY; 3], JunctionSeeds::default()), Ok(()));

        // construction starts at the last stored hop
        let auth = HopAuthenticator::new(&KEY);
        let first = auth.hop_mac(&segment.info_field, &hop(0, 1), HopFieldMac::ZERO, None);
        assert_eq!(segment.hop_fields[2].mac, first);
        let second = auth.hop_mac(&segment.info_field, &hop(2, 3), first, None);
        assert_eq!(segment.hop_fields[1].mac, second);

        segment.hop_fields[1].mac.0[5] ^= 1;
        assert_eq!(
            validate_segment_macs(&segment, &[KEY; 3], JunctionSeeds::default()),
            Err(1)
        );
    }

    #[test]
    fn should_reject_missing_keys_without_touching_macs() {
        let mut segment = Segment {
            info_field: info(InfoFieldFlags::CONS_DIR),
            hop_fields: vec![hop(0, 1), hop(2, 3), hop(4, 0)],
        };
        let before = segment.clone();

        assert_eq!(
            compute_segment_macs(&mut segment, &[KEY; 2], JunctionSeeds::default()),
            Err(BuildError::KeyCountMismatch {
                segment: 0,
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(segment, before);
        assert!(compute_segment_macs(&mut segment, &[KEY; 4], JunctionSeeds::default()).is_err());
    }

    #[test]
    fn should_find_chain_predecessor() {
        assert_eq!(chain_predecessor(3..5, 3, true), None);
        assert_eq!(chain_predecessor(3..5, 4, true), Some(3));
        assert_eq!(chain_predecessor(3..5, 4, false), None);
        assert_eq!(chain_predecessor(3..5, 3, false), Some(4));
    }

    #[test]
    fn should_detect_peering_junction_hops() {
        let meta = PathMetaHeader {
            curr_inf: 0,
            curr_hf: 0,
            seg_lens: [3, 3, 0],
        };
        let peering = |_: usize| Some(info(InfoFieldFlags::PEERING));
        let junctions: Vec<_> = (0..6)
            .filter(|hop| is_peering_junction(&meta, *hop, peering))
            .collect();
        assert_eq!(junctions, vec![2, 3]);

        let plain = |_: usize| Some(info(InfoFieldFlags::CONS_DIR));
        assert!(!(0..6).any(|hop| is_peering_junction(&meta, hop, plain)));
    }

    #[test]
    fn should_not_leak_key_in_debug() {
        assert_eq!(format!("{KEY:?}"), "ForwardingKey(..)");
    }
}
