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

//! 512-bit-intermediate multiply-then-divide, ported from Uniswap V3's `FullMath` library.
//!
//! `mul_div(a, b, denominator)` computes `floor(a * b / denominator)` without ever overflowing
//! even when `a * b` does not fit in 256 bits, by building the full 512-bit product and dividing
//! it by `denominator` using Remco Bloemen's technique (div by inverting `denominator` modulo
//! 2^256 via Newton-Raphson).

use alloy_primitives::{I256, U256};

/// `Q128 = 2^128`, the fixed-point base for fee-growth accumulators (dimensionless: these track
/// fees per unit of liquidity, not a price, so the same constant is used regardless of whether
/// the pool's sqrt-price is Q64.96 or Q64.64).
pub const Q128: U256 = U256::from_limbs([0, 0, 1, 0]);

pub struct FullMath;

impl FullMath {
    /// `floor(a * b / denominator)`, reverting (returning `None`) only on division by zero or
    /// on a result that doesn't fit in 256 bits.
    #[must_use]
    pub fn mul_div(a: U256, b: U256, denominator: U256) -> U256 {
        let (result_low, result_high) = Self::mul_high(a, b);

        if result_high.is_zero() {
            return result_low / denominator;
        }

        assert!(denominator > result_high, "FullMath: overflow");

        let remainder = Self::mulmod(a, b, denominator);
        let (mut result_low, mut result_high) = Self::sub_512(result_low, result_high, remainder);

        let mut twos = (!denominator).wrapping_add(U256::from(1)) & denominator;
        let denominator = denominator / twos;
        result_low /= twos;
        twos = (!twos).wrapping_add(U256::from(1)) / twos + U256::from(1);
        result_low |= result_high.wrapping_mul(twos);

        let inv = Self::mod_inverse(denominator);
        result_low.wrapping_mul(inv)
    }

    /// `ceil(a * b / denominator)`.
    #[must_use]
    pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> U256 {
        let result = Self::mul_div(a, b, denominator);
        if Self::mulmod(a, b, denominator) > U256::ZERO {
            assert!(result < U256::MAX, "FullMath: overflow on rounding up");
            result + U256::from(1)
        } else {
            result
        }
    }

    /// `ceil(numerator / denominator)`.
    #[must_use]
    pub fn div_rounding_up(numerator: U256, denominator: U256) -> U256 {
        let quotient = numerator / denominator;
        let remainder = numerator % denominator;
        if remainder.is_zero() {
            quotient
        } else {
            quotient + U256::from(1)
        }
    }

    /// Integer square root via the Babylonian method.
    #[must_use]
    pub fn sqrt(x: U256) -> U256 {
        if x.is_zero() {
            return U256::ZERO;
        }
        let mut z = (x + U256::from(1)) / U256::from(2);
        let mut y = x;
        while z < y {
            y = z;
            z = (x / z + z) / U256::from(2);
        }
        y
    }

    #[must_use]
    pub fn truncate_to_u128(x: U256) -> u128 {
        let masked = x & U256::from(u128::MAX);
        masked.to::<u128>()
    }

    #[must_use]
    pub fn truncate_to_u256(x: I256) -> U256 {
        U256::from_be_bytes(x.to_be_bytes())
    }

    #[must_use]
    pub fn truncate_to_i256(x: U256) -> I256 {
        I256::from_be_bytes(x.to_be_bytes())
    }

    /// `a * b % m` without intermediate overflow, via the full 512-bit product.
    fn mulmod(a: U256, b: U256, m: U256) -> U256 {
        if m.is_zero() {
            return U256::ZERO;
        }
        let (low, high) = Self::mul_high(a, b);
        if high.is_zero() {
            return low % m;
        }
        Self::mulmod_slow(low, high, m)
    }

    /// `(low, high) % m` for a 512-bit dividend, by repeated long division.
    fn mulmod_slow(low: U256, high: U256, m: U256) -> U256 {
        let mut rem = U256::ZERO;
        for i in (0..256).rev() {
            rem = (rem << 1) | ((high >> i) & U256::from(1));
            if rem >= m {
                rem -= m;
            }
        }
        for i in (0..256).rev() {
            rem = (rem << 1) | ((low >> i) & U256::from(1));
            if rem >= m {
                rem -= m;
            }
        }
        rem
    }

    /// Full 512-bit product `a * b` as `(low, high)` 256-bit limbs.
    fn mul_high(a: U256, b: U256) -> (U256, U256) {
        let mask = U256::from(u128::MAX);
        let a_lo = a & mask;
        let a_hi = a >> 128;
        let b_lo = b & mask;
        let b_hi = b >> 128;

        let lo_lo = a_lo * b_lo;
        let lo_hi = a_lo * b_hi;
        let hi_lo = a_hi * b_lo;
        let hi_hi = a_hi * b_hi;

        let (cross, cross_carry) = lo_hi.overflowing_add(hi_lo);
        let (result_low, add_carry) = lo_lo.overflowing_add(cross << 128);
        let result_high = hi_hi
            + (cross >> 128)
            + (U256::from(u8::from(cross_carry)) << 128)
            + U256::from(u8::from(add_carry));

        (result_low, result_high)
    }

    fn sub_512(low: U256, high: U256, sub: U256) -> (U256, U256) {
        let (result_low, borrow) = low.overflowing_sub(sub);
        let result_high = if borrow { high - U256::from(1) } else { high };
        (result_low, result_high)
    }

    /// Modular multiplicative inverse of `denominator` modulo `2^256`, computed by Newton-Raphson
    /// doubling of the correct 2, 4, 8, ..., 256-bit inverse.
    fn mod_inverse(denominator: U256) -> U256 {
        let mut inv = (U256::from(3) * denominator) ^ U256::from(2);
        for _ in 0..6 {
            inv = inv * (U256::from(2) - denominator.wrapping_mul(inv));
        }
        inv
    }
}
