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

/// Types that can be written into a bit range
pub trait IntoBitWrite {
    fn into_bit_write(v: Self) -> u64;
}

macro_rules! impl_into_u64 {
    ($($t:ty),*) => {
        $(
            impl IntoBitWrite for $t {
                #[inline(always)]
                fn into_bit_write(v: Self) -> u64 {
                    v as u64
                }
            }
        )*
    };
}
impl_into_u64!(u8, u16, u32, u64);

/// Writes a big-endian value of at most 56 bits into the given bit range.
///
/// Values wider than the range are truncated. Bits outside the range are preserved, and bytes
/// outside the buffer are skipped.
#[inline(always)]
pub fn bit_range_be_write<T>(buf: &mut [u8], range: BitRange, val: T)
where
    T: IntoBitWrite,
{
    debug_assert!(range.size_bytes() <= 8, "BitRange too large for write");

    let bytes = range.containing_byte_range();
    let mut lane = 0u64;
    for idx in bytes.clone() {
        lane = (lane << 8) | u64::from(buf.get(idx).copied().unwrap_or(0));
    }

    let left_shift = bytes.end * 8 - range.end;
    let mask = range.max_uint() << left_shift;
    let value = (T::into_bit_write(val) & range.max_uint()) << left_shift;
    lane = (lane & !mask) | value;

    for (pos, idx) in bytes.clone().enumerate() {
        let shift = (bytes.len() - 1 - pos) * 8;
        if let Some(byte) = buf.get_mut(idx) {
            *byte = (lane >> shift) as u8;
        }
    }
}
