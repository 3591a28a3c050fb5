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

use crate::core::layout::BitRange;

/// Types that can be produced from a bit-range read
pub trait FromBitRead {
    fn from_bit_read(v: u64) -> Self;
}

macro_rules! impl_from_u64 {
    ($($t:ty),*) => {
        $(
            impl FromBitRead for $t {
                #[inline(always)]
                fn from_bit_read(v: u64) -> Self {
                    v as $t
                }
            }
        )*
    };
}
impl_from_u64!(u8, u16, u32, u64);

/// Reads a big-endian value of at most 56 bits from the given bit range.
///
/// Bytes outside the buffer read as zero; callers validate sizes through the layout before
/// reading, so this only matters for ranges that were never meant to be read.
#[inline(always)]
pub fn bit_range_be_read<T>(buf: &[u8], range: BitRange) -> T
where
    T: FromBitRead,
{
    debug_assert!(range.size_bytes() <= 8, "BitRange too large for read");

    let bytes = range.containing_byte_range();
    let mut lane = 0u64;
    for idx in bytes.clone() {
        lane = (lane << 8) | u64::from(buf.get(idx).copied().unwrap_or(0));
    }

    // Drop the bits to the right of the field, then mask the ones to its left
    let right_shift = bytes.end * 8 - range.end;
    let value = (lane >> right_shift) & range.max_uint();

    T::from_bit_read(value)
}
