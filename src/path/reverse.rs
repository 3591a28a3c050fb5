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

//! Path reversal.
//!
//! A reversed path visits the same hops in the opposite order:
//!
//! 1. The segment order is reversed.
//! 2. The hop field order within each segment is reversed.
//! 3. Ingress and egress of every hop field are exchanged, router alerts follow their interface.
//! 4. The `C` flag of every info field is flipped. `P`, segment ID and timestamp are kept.
//! 5. Both pointers are reset to the first hop.
//!
//! MACs are carried over unchanged. They are computed over the interface pair in construction
//! direction, which steps 3 and 4 together leave intact (see [`crate::mac`]).

use crate::path::{
    layout::{HopFieldLayout, InfoFieldLayout},
    model::{InfoField, Segment, StandardPath},
    types::InfoFieldFlags,
    view::StandardPathView,
};

impl StandardPath {
    /// Returns the reversed path, starting at its first hop
    pub fn reversed(&self) -> Self {
        let segments = self
            .segments
            .iter()
            .rev()
            .map(|segment| Segment {
                info_field: InfoField {
                    flags: segment.info_field.flags ^ InfoFieldFlags::CONS_DIR,
                    ..segment.info_field
                },
                hop_fields: segment
                    .hop_fields
                    .iter()
                    .rev()
                    .map(|hop| hop.swapped_interfaces())
                    .collect(),
            })
            .collect();

        StandardPath {
            current_info_field: 0,
            curr_hop_field: 0,
            segments,
        }
    }
}

impl StandardPathView {
    /// Reverses the path in place, see [`StandardPath::reversed`]
    ///
    /// The view keeps its size, only the order of the records and the pointers change.
    pub fn reverse_in_place(&mut self) {
        let mut meta = self.meta();
        let info_count = self.info_field_count();
        let hop_count = self.hop_field_count();

        // Reversing the whole run and then every record reverses the record order
        let infos = self.info_fields_bytes_mut();
        infos.reverse();
        infos
            .chunks_exact_mut(InfoFieldLayout::SIZE_BYTES)
            .for_each(<[u8]>::reverse);

        let hops = self.hop_fields_bytes_mut();
        hops.reverse();
        hops.chunks_exact_mut(HopFieldLayout::SIZE_BYTES)
            .for_each(<[u8]>::reverse);

        for index in 0..info_count {
            if let Some(info) = self.info_field_mut(index) {
                info.set_flags(info.flags() ^ InfoFieldFlags::CONS_DIR);
            }
        }

        for index in 0..hop_count {
            if let Some(hop) = self.hop_field_mut(index) {
                let (ingress, egress) = (hop.cons_ingress(), hop.cons_egress());
                hop.set_cons_ingress(egress);
                hop.set_cons_egress(ingress);
                hop.set_flags(hop.flags().swapped_alerts());
            }
        }

        meta.seg_lens[..info_count].reverse();
        self.rewrite_meta(meta.rewound());
    }
}
