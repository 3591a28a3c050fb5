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

//! Inter-AS links of a standard path.
//!
//! Every hop field is turned into an `(ingress, egress)` pair in traversal direction. The pair in
//! construction direction (see [`crate::mac`]) is kept if the segment's `C` flag is set and
//! exchanged otherwise. Since reversal exchanges the stored pair together with flipping `C`, this
//! always ends up being the stored pair. Consecutive pairs are then joined into [`PathLink`]s,
//! from the egress of one AS to the ingress of the next.
//!
//! At a regular segment change the AS at the junction appears twice, once as the last hop of the
//! earlier segment and once as the first hop of the later one. The link between the two copies
//! is skipped. A peering junction connects two different ASes, so its link is kept.

use std::iter::FusedIterator;

use crate::path::{
    meta::PathMetaHeader,
    model::{HopField, InfoField, PathFields, StandardPath},
    types::MAX_SEGMENTS,
    view::StandardPathView,
};

/// Link between two consecutive ASes on a path, in traversal direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathLink {
    /// Interface on which the packet leaves the earlier AS
    pub egress: u16,
    /// Interface on which the packet enters the later AS
    pub ingress: u16,
}

impl StandardPath {
    /// Returns an iterator over the inter-AS links of the path
    ///
    /// A path whose segments do not fit a meta header yields no links.
    pub fn hops(&self) -> Hops<'_> {
        Hops::new(Source::Owned(self))
    }
}

impl StandardPathView {
    /// Returns an iterator over the inter-AS links of the path, see [`StandardPath::hops`]
    pub fn hops(&self) -> Hops<'_> {
        Hops::new(Source::View(self))
    }
}

#[derive(Clone, Copy)]
enum Source<'a> {
    Owned(&'a StandardPath),
    View(&'a StandardPathView),
}

impl Source<'_> {
    /// Segment lengths with the pointers reset, which are irrelevant to the link sequence
    fn layout(&self) -> Option<PathMetaHeader> {
        let seg_lens = match self {
            Source::Owned(path) => {
                if path.segments.len() > MAX_SEGMENTS {
                    return None;
                }
                path.segment_sizes()
            }
            Source::View(view) => view.meta().seg_lens,
        };
        let meta = PathMetaHeader {
            curr_inf: 0,
            curr_hf: 0,
            seg_lens,
        };
        meta.validate().ok().map(|_| meta)
    }

    fn info(&self, segment: usize) -> Option<InfoField> {
        match self {
            Source::Owned(path) => PathFields::info(*path, segment),
            Source::View(view) => PathFields::info(*view, segment),
        }
    }

    fn hop(&self, index: usize) -> Option<HopField> {
        match self {
            Source::Owned(path) => PathFields::hop(*path, index),
            Source::View(view) => PathFields::hop(*view, index),
        }
    }
}

/// Iterator over the [`PathLink`]s of a path
#[derive(Clone)]
pub struct Hops<'a> {
    source: Source<'a>,
    hop_count: usize,
    /// Index of the next hop field to read
    index: usize,
    /// One bit per hop field starting a segment whose junction link is skipped
    segment_change: u64,
    previous: (u16, u16),
    current: (u16, u16),
    done: bool,
}

impl<'a> Hops<'a> {
    fn new(source: Source<'a>) -> Self {
        let mut hops = Self {
            source,
            hop_count: 0,
            index: 0,
            segment_change: 0,
            previous: (0, 0),
            current: (0, 0),
            done: true,
        };
        let Some(meta) = source.layout() else {
            return hops;
        };

        let mut start = 0u32;
        for segment in 0..meta.info_field_count() {
            let Some(info) = source.info(segment) else {
                return hops;
            };
            if segment == 0 || !info.flags.peering() {
                hops.segment_change |= 1 << start;
            }
            start += u32::from(meta.seg_lens[segment]);
        }

        hops.hop_count = meta.hop_count();
        hops.done = false;
        // the first link needs the first two hop fields
        hops.step();
        hops
    }

    fn step(&mut self) {
        let steps = if bit(self.segment_change, self.index) { 2 } else { 1 };
        for _ in 0..steps {
            let hop = match self.index < self.hop_count {
                true => self.source.hop(self.index),
                false => None,
            };
            let Some(hop) = hop else {
                self.done = true;
                return;
            };

            self.previous = self.current;
            self.current = (hop.cons_ingress, hop.cons_egress);
            self.index += 1;
        }
    }
}

impl Iterator for Hops<'_> {
    type Item = PathLink;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let link = PathLink {
            egress: self.previous.1,
            ingress: self.current.0,
        };
        self.step();
        Some(link)
    }
}

impl FusedIterator for Hops<'_> {}

fn bit(mask: u64, index: usize) -> bool {
    u32::try_from(index)
        .ok()
        .and_then(|index| mask.checked_shr(index))
        .is_some_and(|shifted| shifted & 1 == 1)
}
