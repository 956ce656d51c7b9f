// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Small integer helpers shared by dispatch code.

/// Divides `value` by `divisor`, rounding the quotient up.
///
/// Used to turn an element count into a workgroup count.
#[inline]
pub const fn divide_and_round_up(value: u32, divisor: u32) -> u32 {
    value.div_ceil(divisor)
}

/// Rounds `value` up to the next multiple of `alignment`.
///
/// `alignment` must be non-zero.
#[inline]
pub const fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divide_and_round_up_covers_partial_groups() {
        assert_eq!(divide_and_round_up(256, 256), 1);
        assert_eq!(divide_and_round_up(257, 256), 2);
        assert_eq!(divide_and_round_up(1, 128), 1);
        assert_eq!(divide_and_round_up(16 * 1024, 128), 128);
        assert_eq!(divide_and_round_up(0, 64), 0);
    }

    #[test]
    fn divide_and_round_up_handles_counts_near_u32_max() {
        assert_eq!(divide_and_round_up(u32::MAX, 256), 16_777_216);
        assert_eq!(divide_and_round_up(u32::MAX, 1), u32::MAX);
        assert_eq!(divide_and_round_up(u32::MAX - 1, u32::MAX), 1);
    }

    #[test]
    fn align_up_rounds_to_multiple() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(4, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(65_540, 256), 65_792);
    }
}
