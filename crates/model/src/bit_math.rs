// -------------------------------------------------------------------------------------------------
//  Copyright (C) 2015-2025 Nautech Systems Pty Ltd. All rights reserved.
//  https://nautechsystems.io
//
//  Licensed under the GNU Lesser General Public License Version 3.0 (the "License");
//  You may not use this file except in compliance with the License.
//  You may obtain a copy of the License at https://www.gnu.org/licenses/lgpl-3.0.en.html
//
//  Unless required by applicable law or agreed to in writing, software
//  distributed under the License is distributed on an "AS IS" BASIS,
//  WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//  See the License for the specific language governing permissions and
//  limitations under the License.
// -------------------------------------------------------------------------------------------------

//! Bit-search helpers over a 256-bit word, used by the tick bitmap to find the next
//! initialized tick without scanning every bit.

use alloy_primitives::U256;

/// Index (0-255) of the most significant set bit. Panics on a zero input.
#[must_use]
pub fn most_significant_bit(x: U256) -> u8 {
    assert!(!x.is_zero(), "bit_math: zero has no most significant bit");
    255 - x.leading_zeros() as u8
}

/// Index (0-255) of the least significant set bit. Panics on a zero input.
#[must_use]
pub fn least_significant_bit(x: U256) -> u8 {
    assert!(!x.is_zero(), "bit_math: zero has no least significant bit");
    x.trailing_zeros() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(U256::from(1), 0)]
    #[case(U256::from(2), 1)]
    #[case(U256::from(3), 1)]
    #[case(U256::from(255), 7)]
    fn test_most_significant_bit(#[case] x: U256, #[case] expected: u8) {
        assert_eq!(most_significant_bit(x), expected);
    }

    #[rstest]
    #[case(U256::from(1), 0)]
    #[case(U256::from(2), 1)]
    #[case(U256::from(3), 0)]
    #[case(U256::from(128), 7)]
    fn test_least_significant_bit(#[case] x: U256, #[case] expected: u8) {
        assert_eq!(least_significant_bit(x), expected);
    }

    #[test]
    #[should_panic(expected = "most significant bit")]
    fn test_msb_zero_panics() {
        most_significant_bit(U256::ZERO);
    }
}
