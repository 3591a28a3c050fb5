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

//! Zero-copy views over byte buffers
//!
//! All views are #[repr(transparent)] wrappers around `[u8]` (or `[u8; N]`), so a view is just a
//! reinterpreted pointer:
//!
//! * &[u8] == &View
//! * &mut [u8] == &mut View
//!
//! Mutability and ownership stay with Rust's built-in reference types.
//!
//! ### Safety
//!
//! The invariant every view relies on is that its buffer is large enough for every field it
//! reads. [View::has_required_size] establishes this, and it must check every field that
//! influences the size before a buffer is reinterpreted.
//!
//! ### Limitations
//!
//! Views cannot hold data of their own, so records whose size depends on each other (the meta
//! header and the path data) share a single view.

/// Trait for views over byte buffers
pub trait View {
    /// Error reported when a buffer cannot be interpreted as this view
    type Error;

    /// Checks that the buffer is large enough and consistent for the view.
    ///
    /// Returns the number of bytes the view occupies.
    ///
    /// # Important
    ///
    /// All view accessors rely on this check. An incorrect implementation breaks their
    /// guarantees.
    fn has_required_size(buf: &[u8]) -> Result<usize, Self::Error>;

    /// Interprets the front of the slice as the view, returning the remaining bytes
    #[inline]
    fn from_slice(buf: &[u8]) -> Result<(&Self, &[u8]), Self::Error> {
        let size = Self::has_required_size(buf)?;
        debug_assert!(buf.len() >= size);

        let (view_buf, rest) = buf.split_at(size);
        // SAFETY: size was validated above
        let view = unsafe { Self::from_slice_unchecked(view_buf) };

        Ok((view, rest))
    }

    /// Interprets the front of the mutable slice as the view, returning the remaining bytes
    #[inline]
    fn from_mut_slice(buf: &mut [u8]) -> Result<(&mut Self, &mut [u8]), Self::Error> {
        let size = Self::has_required_size(buf)?;
        debug_assert!(buf.len() >= size);

        let (view_buf, rest) = buf.split_at_mut(size);
        // SAFETY: size was validated above
        let view = unsafe { Self::from_mut_slice_unchecked(view_buf) };

        Ok((view, rest))
    }

    /// Returns the underlying bytes of the view
    fn as_bytes(&self) -> &[u8];

    /// Converts the slice into the view without checking sizes
    ///
    /// # Safety
    /// The caller must ensure that the buffer passed [View::has_required_size].
    unsafe fn from_slice_unchecked(buf: &[u8]) -> &Self;

    /// Converts the mutable slice into the view without checking sizes
    ///
    /// # Safety
    /// The caller must ensure that the buffer passed [View::has_required_size].
    unsafe fn from_mut_slice_unchecked(buf: &mut [u8]) -> &mut Self;
}

pub(crate) mod macros {
    /// Generates a field reader - expects self to be a wrapper around a byte buffer
    ///
    /// - $name: name of the generated function
    /// - $bit_range: bit range of the field
    /// - $repr: integer representation of the field
    macro_rules! gen_field_read {
        ($name:ident, $bit_range:expr, $repr:ty) => {
            #[inline]
            #[allow(unused)]
            /// Reads the field
            pub fn $name(&self) -> $repr {
                $crate::core::read::bit_range_be_read::<$repr>(&self.0, $bit_range)
            }
        };
    }
    pub(crate) use gen_field_read;

    /// Generates a field writer - expects self to be a wrapper around a byte buffer
    ///
    /// - $name: name of the generated function
    /// - $bit_range: bit range of the field
    /// - $repr: integer representation of the field
    macro_rules! gen_field_write {
        ($name:ident, $bit_range:expr, $repr:ty) => {
            #[inline]
            #[allow(unused)]
            /// Writes the field
            pub fn $name(&mut self, value: $repr) {
                $crate::core::write::bit_range_be_write::<$repr>(&mut self.0, $bit_range, value)
            }
        };
    }
    pub(crate) use gen_field_write;
}
