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

//! Standard path field types.

use std::{fmt::Debug, time::Duration};

/// Maximum number of segments in a standard path.
pub const MAX_SEGMENTS: usize = 3;

/// Maximum number of hop fields addressable by the 6-bit current hop pointer.
pub const MAX_HOP_FIELDS: usize = 64;

/// Truncated MAC (Message Authentication Code) of a hop field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HopFieldMac(pub [u8; 6]);
impl HopFieldMac {
    /// Size of the MAC in bytes.
    pub const SIZE: usize = 6;

    /// All-zero MAC, used as chain input for the first hop in construction order.
    pub const ZERO: HopFieldMac = HopFieldMac([0; 6]);

    /// Creates a new HopFieldMac from the given byte array.
    pub fn new(bytes: [u8; 6]) -> Self {
        HopFieldMac(bytes)
    }

    /// Returns the byte array representation of the HopFieldMac.
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }
}
impl From<[u8; 6]> for HopFieldMac {
    fn from(bytes: [u8; 6]) -> Self {
        HopFieldMac::new(bytes)
    }
}
impl Debug for HopFieldMac {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

// InfoFieldFlags
bitflags::bitflags! {
    /// InfoField flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InfoFieldFlags: u8 {
        /// Set if the hop fields of the segment are traversed in the direction they were
        /// constructed in.
        const CONS_DIR = 0b0000_0001;

        /// Set if the segment ends or starts at a peering link.
        const PEERING = 0b0000_0010;

        // Other bits are reserved.
        const _ = !0;
    }
}
impl InfoFieldFlags {
    /// Returns true if the segment is traversed in construction direction.
    pub fn cons_dir(&self) -> bool {
        self.contains(InfoFieldFlags::CONS_DIR)
    }

    /// Returns true if the segment is part of a peering path.
    pub fn peering(&self) -> bool {
        self.contains(InfoFieldFlags::PEERING)
    }
}

// HopFieldFlags
bitflags::bitflags! {
    /// HopField flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HopFieldFlags: u8 {
        /// The router at the ingress interface (first interface field) processes the payload.
        const CONS_INGRESS_ROUTER_ALERT = 0b0000_0001;
        /// The router at the egress interface (second interface field) processes the payload.
        const CONS_EGRESS_ROUTER_ALERT = 0b0000_0010;

        // Other bits are reserved.
        const _ = !0;
    }
}
impl HopFieldFlags {
    /// Returns the flags with the ingress and egress router alerts exchanged.
    ///
    /// Used whenever the interface fields of a hop are exchanged, so each alert stays attached
    /// to its interface.
    pub fn swapped_alerts(self) -> Self {
        let mut swapped = self
            - (HopFieldFlags::CONS_INGRESS_ROUTER_ALERT | HopFieldFlags::CONS_EGRESS_ROUTER_ALERT);
        if self.contains(HopFieldFlags::CONS_INGRESS_ROUTER_ALERT) {
            swapped |= HopFieldFlags::CONS_EGRESS_ROUTER_ALERT;
        }
        if self.contains(HopFieldFlags::CONS_EGRESS_ROUTER_ALERT) {
            swapped |= HopFieldFlags::CONS_INGRESS_ROUTER_ALERT;
        }
        swapped
    }
}

// MaxTTL / 256 (5m37.5s) see the following for reference:
// https://datatracker.ietf.org/doc/html/draft-dekater-scion-dataplane#name-hop-field
/// Expiration Duration per ExpTime unit on a HopField.
pub const EXP_TIME_UNIT: Duration = Duration::new(337, 500_000_000);

/// Returns the lifetime of a hop field relative to its segment timestamp.
///
/// A hop field is valid for `(1 + exp_time) * EXP_TIME_UNIT`, so the shortest lifetime is one
/// unit and the longest is exactly 24 hours.
pub fn exp_time_to_duration(exp_time: u8) -> Duration {
    EXP_TIME_UNIT * (u32::from(exp_time) + 1)
}
