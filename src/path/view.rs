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

//! Standard path views
//!
//! See [`View`](crate::core::view) for more information about views in general.
//!
//! Forwarding works on these views directly: the active hop is located, authenticated and the
//! pointers advanced without copying the path out of the packet buffer.

use std::{fmt::Debug, ops::Range};

use crate::{
    core::{
        layout::Layout,
        view::{
            View,
            macros::{gen_field_read, gen_field_write},
        },
    },
    error::{MalformedPathError, PathError},
    path::{
        layout::{
            HopFieldLayout, InfoFieldLayout, StdPathDataLayout, StdPathLayout, StdPathMetaLayout,
        },
        meta::PathMetaHeader,
        types::{HopFieldFlags, HopFieldMac, InfoFieldFlags},
    },
};

/// A view over a standard SCION path, including meta header and data
///
/// A view can only be obtained through [`View::from_slice`] or [`View::from_mut_slice`], which
/// check the meta header for consistency. The setters for the single pointers do not re-check,
/// use [`StandardPathView::set_pointers`] to move both pointers at once.
#[repr(transparent)]
pub struct StandardPathView([u8]);
impl View for StandardPathView {
    type Error = MalformedPathError;

    #[inline]
    fn has_required_size(buf: &[u8]) -> Result<usize, MalformedPathError> {
        let layout = StdPathLayout::from_slice(buf)?;
        debug_assert!(buf.len() >= layout.size_bytes());

        Ok(layout.size_bytes())
    }

    #[inline]
    unsafe fn from_slice_unchecked(buf: &[u8]) -> &Self {
        // SAFETY: StandardPathView is #[repr(transparent)] over [u8]
        unsafe { &*(buf as *const [u8] as *const Self) }
    }

    #[inline]
    unsafe fn from_mut_slice_unchecked(buf: &mut [u8]) -> &mut Self {
        // SAFETY: StandardPathView is #[repr(transparent)] over [u8]
        unsafe { &mut *(buf as *mut [u8] as *mut Self) }
    }

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
// Meta header
impl StandardPathView {
    gen_field_read!(curr_info_field, StdPathMetaLayout::CURR_INFO_FIELD_RNG, u8);
    gen_field_read!(curr_hop_field, StdPathMetaLayout::CURR_HOP_FIELD_RNG, u8);
    gen_field_read!(seg0_len, StdPathMetaLayout::SEG0_LEN_RNG, u8);
    gen_field_read!(seg1_len, StdPathMetaLayout::SEG1_LEN_RNG, u8);
    gen_field_read!(seg2_len, StdPathMetaLayout::SEG2_LEN_RNG, u8);

    /// Returns the decoded meta header
    #[inline]
    pub fn meta(&self) -> PathMetaHeader {
        PathMetaHeader::read(&self.0)
    }

    /// Returns the number of info fields present in the path
    #[inline]
    pub fn info_field_count(&self) -> usize {
        self.data_layout().info_field_count()
    }

    /// Returns the number of hop fields present in the path
    #[inline]
    pub fn hop_field_count(&self) -> usize {
        self.data_layout().hop_field_count()
    }

    #[inline]
    fn data_layout(&self) -> StdPathDataLayout {
        StdPathDataLayout::new(self.seg0_len(), self.seg1_len(), self.seg2_len())
    }
}
// Meta header mut
impl StandardPathView {
    gen_field_write!(
        set_curr_info_field,
        StdPathMetaLayout::CURR_INFO_FIELD_RNG,
        u8
    );
    gen_field_write!(
        set_curr_hop_field,
        StdPathMetaLayout::CURR_HOP_FIELD_RNG,
        u8
    );

    /// Moves both pointers to the given position
    ///
    /// The view is unchanged if the position is inconsistent with the segment lengths.
    pub fn set_pointers(
        &mut self,
        curr_inf: u8,
        curr_hf: u8,
    ) -> Result<PathMetaHeader, MalformedPathError> {
        let meta = PathMetaHeader {
            curr_inf,
            curr_hf,
            ..self.meta()
        };
        meta.validate()?;

        self.set_curr_info_field(curr_inf);
        self.set_curr_hop_field(curr_hf);
        Ok(meta)
    }

    /// Moves the current hop forward by one, see [`PathMetaHeader::advance`]
    ///
    /// Returns the new meta header. The view is unchanged on error.
    pub fn advance_in_place(&mut self) -> Result<PathMetaHeader, PathError> {
        let next = self.meta().advance()?;
        self.set_curr_info_field(next.curr_inf);
        self.set_curr_hop_field(next.curr_hf);
        Ok(next)
    }
}
// Data Helpers
impl StandardPathView {
    /// Returns the byte range for the info field at the given index, or None if the index is out of
    /// bounds
    #[inline]
    fn checked_info_field_range(&self, index: usize) -> Option<Range<usize>> {
        let layout = self.data_layout();
        if index >= layout.info_field_count() {
            return None;
        }

        Some(
            layout
                .info_field_range(index)
                .shift(StdPathMetaLayout::SIZE_BYTES)
                .aligned_byte_range(),
        )
    }

    /// Returns the byte range for the hop field at the given index, or None if the index is out of
    /// bounds
    #[inline]
    pub fn checked_hop_field_range(&self, index: usize) -> Option<Range<usize>> {
        let layout = self.data_layout();
        if index >= layout.hop_field_count() {
            return None;
        }

        Some(
            layout
                .hop_field_range(index)
                .shift(StdPathMetaLayout::SIZE_BYTES)
                .aligned_byte_range(),
        )
    }
}
// Data
impl StandardPathView {
    /// Returns a view over the info field at the given index, or None if the index is out of bounds
    #[inline]
    pub fn info_field(&self, index: usize) -> Option<&InfoFieldView> {
        let field_range = self.checked_info_field_range(index)?;
        let (field, _) = InfoFieldView::from_slice(self.0.get(field_range)?).ok()?;
        Some(field)
    }

    /// Returns a view over the hop field at the given index, or None if the index is out of bounds
    #[inline]
    pub fn hop_field(&self, index: usize) -> Option<&HopFieldView> {
        let field_range = self.checked_hop_field_range(index)?;
        let (field, _) = HopFieldView::from_slice(self.0.get(field_range)?).ok()?;
        Some(field)
    }

    /// Returns the info field owning the current hop field
    #[inline]
    pub fn current_info_field(&self) -> Option<&InfoFieldView> {
        self.info_field(usize::from(self.curr_info_field()))
    }

    /// Returns the current hop field
    #[inline]
    pub fn current_hop_field(&self) -> Option<&HopFieldView> {
        self.hop_field(usize::from(self.curr_hop_field()))
    }

    /// Returns an iterator over all info fields
    pub fn info_fields(&self) -> impl Iterator<Item = &InfoFieldView> {
        (0..self.info_field_count()).filter_map(|i| self.info_field(i))
    }

    /// Returns an iterator over all hop fields
    pub fn hop_fields(&self) -> impl Iterator<Item = &HopFieldView> {
        (0..self.hop_field_count()).filter_map(|i| self.hop_field(i))
    }
}
// Data mut
impl StandardPathView {
    /// Returns a view over the info field at the given index, or None if the index is out of bounds
    #[inline]
    pub fn info_field_mut(&mut self, index: usize) -> Option<&mut InfoFieldView> {
        let field_range = self.checked_info_field_range(index)?;
        let (field, _) = InfoFieldView::from_mut_slice(self.0.get_mut(field_range)?).ok()?;
        Some(field)
    }

    /// Returns a view over the hop field at the given index, or None if the index is out of bounds
    #[inline]
    pub fn hop_field_mut(&mut self, index: usize) -> Option<&mut HopFieldView> {
        let field_range = self.checked_hop_field_range(index)?;
        let (field, _) = HopFieldView::from_mut_slice(self.0.get_mut(field_range)?).ok()?;
        Some(field)
    }

    /// Returns the raw bytes of all info fields
    pub(crate) fn info_fields_bytes_mut(&mut self) -> &mut [u8] {
        let count = self.info_field_count();
        let start = StdPathMetaLayout::SIZE_BYTES;
        &mut self.0[start..start + count * InfoFieldLayout::SIZE_BYTES]
    }

    /// Returns the raw bytes of all hop fields
    pub(crate) fn hop_fields_bytes_mut(&mut self) -> &mut [u8] {
        let layout = self.data_layout();
        let start =
            StdPathMetaLayout::SIZE_BYTES + layout.info_field_count() * InfoFieldLayout::SIZE_BYTES;
        &mut self.0[start..start + layout.hop_field_count() * HopFieldLayout::SIZE_BYTES]
    }

    /// Rewrites the segment lengths and pointers
    ///
    /// The total number of hop fields and segments must stay the same, otherwise the view would
    /// cover a different number of bytes.
    pub(crate) fn rewrite_meta(&mut self, meta: PathMetaHeader) {
        debug_assert_eq!(meta.hop_count(), self.hop_field_count());
        debug_assert_eq!(meta.info_field_count(), self.info_field_count());
        meta.write(&mut self.0);
    }
}
impl Debug for StandardPathView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardPathView")
            .field("current_info_field", &self.curr_info_field())
            .field("curr_hop_field", &self.curr_hop_field())
            .field("seg0_len", &self.seg0_len())
            .field("seg1_len", &self.seg1_len())
            .field("seg2_len", &self.seg2_len())
            .field("info_fields", &self.info_fields().collect::<Vec<_>>())
            .field("hop_fields", &self.hop_fields().collect::<Vec<_>>())
            .finish()
    }
}

/// A view over a standard SCION path info field
#[repr(transparent)]
pub struct InfoFieldView([u8; InfoFieldLayout::SIZE_BYTES]);
impl View for InfoFieldView {
    type Error = MalformedPathError;

    #[inline]
    fn has_required_size(buf: &[u8]) -> Result<usize, MalformedPathError> {
        if buf.len() < InfoFieldLayout::SIZE_BYTES {
            return Err(MalformedPathError::BufferTooSmall {
                at: "InfoFieldView",
                required: InfoFieldLayout::SIZE_BYTES,
                actual: buf.len(),
            });
        }

        Ok(InfoFieldLayout::SIZE_BYTES)
    }

    #[inline]
    unsafe fn from_slice_unchecked(buf: &[u8]) -> &Self {
        debug_assert_eq!(buf.len(), InfoFieldLayout::SIZE_BYTES);
        // SAFETY: InfoFieldView is #[repr(transparent)] over [u8; SIZE_BYTES] and the caller
        // guarantees the length
        unsafe { &*(buf.as_ptr() as *const Self) }
    }

    #[inline]
    unsafe fn from_mut_slice_unchecked(buf: &mut [u8]) -> &mut Self {
        debug_assert_eq!(buf.len(), InfoFieldLayout::SIZE_BYTES);
        // SAFETY: InfoFieldView is #[repr(transparent)] over [u8; SIZE_BYTES] and the caller
        // guarantees the length
        unsafe { &mut *(buf.as_mut_ptr() as *mut Self) }
    }

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
// Immutable
impl InfoFieldView {
    /// Returns the flags of the info field
    #[inline]
    pub fn flags(&self) -> InfoFieldFlags {
        InfoFieldFlags::from_bits_retain(self.raw_flags())
    }

    gen_field_read!(raw_flags, InfoFieldLayout::FLAGS_RNG, u8);
    gen_field_read!(segment_id, InfoFieldLayout::SEGMENT_ID_RNG, u16);
    gen_field_read!(timestamp, InfoFieldLayout::TIMESTAMP_RNG, u32);
}
// Mutable
impl InfoFieldView {
    /// Sets the flags of the info field
    #[inline]
    pub fn set_flags(&mut self, flags: InfoFieldFlags) {
        self.set_raw_flags(flags.bits());
    }

    gen_field_write!(set_raw_flags, InfoFieldLayout::FLAGS_RNG, u8);
    gen_field_write!(set_segment_id, InfoFieldLayout::SEGMENT_ID_RNG, u16);
    gen_field_write!(set_timestamp, InfoFieldLayout::TIMESTAMP_RNG, u32);
}
impl Debug for InfoFieldView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfoFieldView")
            .field("flags", &self.flags())
            .field("segment_id", &self.segment_id())
            .field("timestamp", &self.timestamp())
            .finish()
    }
}

/// A view over a standard SCION path hop field
#[repr(transparent)]
pub struct HopFieldView([u8; HopFieldLayout::SIZE_BYTES]);
impl View for HopFieldView {
    type Error = MalformedPathError;

    #[inline]
    fn has_required_size(buf: &[u8]) -> Result<usize, MalformedPathError> {
        if buf.len() < HopFieldLayout::SIZE_BYTES {
            return Err(MalformedPathError::BufferTooSmall {
                at: "HopFieldView",
                required: HopFieldLayout::SIZE_BYTES,
                actual: buf.len(),
            });
        }

        Ok(HopFieldLayout::SIZE_BYTES)
    }

    #[inline]
    unsafe fn from_slice_unchecked(buf: &[u8]) -> &Self {
        debug_assert_eq!(buf.len(), HopFieldLayout::SIZE_BYTES);
        // SAFETY: HopFieldView is #[repr(transparent)] over [u8; SIZE_BYTES] and the caller
        // guarantees the length
        unsafe { &*(buf.as_ptr() as *const Self) }
    }

    #[inline]
    unsafe fn from_mut_slice_unchecked(buf: &mut [u8]) -> &mut Self {
        debug_assert_eq!(buf.len(), HopFieldLayout::SIZE_BYTES);
        // SAFETY: HopFieldView is #[repr(transparent)] over [u8; SIZE_BYTES] and the caller
        // guarantees the length
        unsafe { &mut *(buf.as_mut_ptr() as *mut Self) }
    }

    #[inline]
    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
// Immutable
impl HopFieldView {
    /// Returns the flags of the hop field
    #[inline]
    pub fn flags(&self) -> HopFieldFlags {
        HopFieldFlags::from_bits_retain(self.raw_flags())
    }

    gen_field_read!(raw_flags, HopFieldLayout::FLAGS_RNG, u8);
    gen_field_read!(exp_time, HopFieldLayout::EXP_TIME_RNG, u8);
    gen_field_read!(cons_ingress, HopFieldLayout::CONS_INGRESS_RNG, u16);
    gen_field_read!(cons_egress, HopFieldLayout::CONS_EGRESS_RNG, u16);

    /// Returns the MAC of the hop field
    #[inline]
    pub fn mac(&self) -> HopFieldMac {
        let mut mac = [0u8; HopFieldMac::SIZE];
        mac.copy_from_slice(&self.0[HopFieldLayout::MAC_RNG.aligned_byte_range()]);
        HopFieldMac(mac)
    }
}
// Mutable
impl HopFieldView {
    /// Sets the flags of the hop field
    #[inline]
    pub fn set_flags(&mut self, flags: HopFieldFlags) {
        self.set_raw_flags(flags.bits());
    }

    gen_field_write!(set_raw_flags, HopFieldLayout::FLAGS_RNG, u8);
    gen_field_write!(set_exp_time, HopFieldLayout::EXP_TIME_RNG, u8);
    gen_field_write!(set_cons_ingress, HopFieldLayout::CONS_INGRESS_RNG, u16);
    gen_field_write!(set_cons_egress, HopFieldLayout::CONS_EGRESS_RNG, u16);

    /// Sets the MAC of the hop field
    #[inline]
    pub fn set_mac(&mut self, mac: HopFieldMac) {
        self.0[HopFieldLayout::MAC_RNG.aligned_byte_range()].copy_from_slice(mac.as_bytes());
    }
}
impl Debug for HopFieldView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HopFieldView")
            .field("flags", &self.flags())
            .field("exp_time", &self.exp_time())
            .field("cons_ingress", &self.cons_ingress())
            .field("cons_egress", &self.cons_egress())
            .field("mac", &self.mac())
            .finish()
    }
}
