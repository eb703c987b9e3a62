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

//! Closed-form relationships between sqrt-price moves and token amounts, ported from
//! Uniswap V3's `SqrtPriceMath` library and re-based from Q64.96 to this pool's Q64.64
//! sqrt-price encoding (every `<<96`/`>>96` in the reference becomes `<<64`/`>>64` here).

use alloy_primitives::U256;

use crate::errors::CoreError;
use crate::full_math::FullMath;

/// `2^64`, the fixed-point base of the Q64.64 sqrt-price encoding.
pub const Q64: U256 = U256::from_limbs([0, 1, 0, 0]);

/// Amount of token0 between two sqrt-prices for a given liquidity:
/// `L * (sqrt_b - sqrt_a) * 2^64 / (sqrt_a * sqrt_b)`, ordering the inputs internally.
#[must_use]
pub fn get_amount0_delta(sqrt_ratio_a_x64: u128, sqrt_ratio_b_x64: u128, liquidity: u128, round_up: bool) -> U256 {
    let (lo, hi) = if sqrt_ratio_a_x64 <= sqrt_ratio_b_x64 {
        (sqrt_ratio_a_x64, sqrt_ratio_b_x64)
    } else {
        (sqrt_ratio_b_x64, sqrt_ratio_a_x64)
    };
    if lo == 0 {
        return U256::ZERO;
    }

    let numerator1 = U256::from(liquidity) << 64;
    let numerator2 = U256::from(hi) - U256::from(lo);

    if round_up {
        FullMath::div_rounding_up(FullMath::mul_div_rounding_up(numerator1, numerator2, U256::from(hi)), U256::from(lo))
    } else {
        FullMath::mul_div(numerator1, numerator2, U256::from(hi)) / U256::from(lo)
    }
}

/// Amount of token1 between two sqrt-prices for a given liquidity: `L * (sqrt_b - sqrt_a) / 2^64`.
#[must_use]
pub fn get_amount1_delta(sqrt_ratio_a_x64: u128, sqrt_ratio_b_x64: u128, liquidity: u128, round_up: bool) -> U256 {
    let (lo, hi) = if sqrt_ratio_a_x64 <= sqrt_ratio_b_x64 {
        (sqrt_ratio_a_x64, sqrt_ratio_b_x64)
    } else {
        (sqrt_ratio_b_x64, sqrt_ratio_a_x64)
    };

    let numerator = U256::from(liquidity) * (U256::from(hi) - U256::from(lo));
    if round_up {
        FullMath::div_rounding_up(numerator, Q64)
    } else {
        numerator / Q64
    }
}

/// Splits `[lower, upper)` into the three price regimes described in §4.2 and returns
/// `(amount0, amount1)` for the given liquidity at the current price.
#[must_use]
pub fn get_amounts_for_liquidity(
    sqrt_ratio_x64: u128,
    sqrt_ratio_a_x64: u128,
    sqrt_ratio_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> (U256, U256) {
    let (sqrt_a, sqrt_b) = if sqrt_ratio_a_x64 <= sqrt_ratio_b_x64 {
        (sqrt_ratio_a_x64, sqrt_ratio_b_x64)
    } else {
        (sqrt_ratio_b_x64, sqrt_ratio_a_x64)
    };

    if sqrt_ratio_x64 <= sqrt_a {
        (get_amount0_delta(sqrt_a, sqrt_b, liquidity, round_up), U256::ZERO)
    } else if sqrt_ratio_x64 < sqrt_b {
        (
            get_amount0_delta(sqrt_ratio_x64, sqrt_b, liquidity, round_up),
            get_amount1_delta(sqrt_a, sqrt_ratio_x64, liquidity, round_up),
        )
    } else {
        (U256::ZERO, get_amount1_delta(sqrt_a, sqrt_b, liquidity, round_up))
    }
}

/// Next sqrt-price after adding `amount` of token0 as input (price moves down), rounding up
/// so liquidity is never over-credited.
fn get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x64: u128, liquidity: u128, amount: U256, add: bool) -> Result<u128, CoreError> {
    if amount.is_zero() {
        return Ok(sqrt_price_x64);
    }
    let numerator1 = U256::from(liquidity) << 64;

    if add {
        let product = amount * U256::from(sqrt_price_x64);
        if product / amount == U256::from(sqrt_price_x64) {
            let denominator = numerator1 + product;
            if denominator >= numerator1 {
                return Ok(FullMath::truncate_to_u128(FullMath::mul_div_rounding_up(numerator1, U256::from(sqrt_price_x64), denominator)));
            }
        }
        Ok(FullMath::truncate_to_u128(FullMath::div_rounding_up(
            numerator1,
            numerator1 / U256::from(sqrt_price_x64) + amount,
        )))
    } else {
        let product = amount * U256::from(sqrt_price_x64);
        if product / amount != U256::from(sqrt_price_x64) || numerator1 <= product {
            return Err(CoreError::MathDomain("amount0 input exceeds available liquidity".into()));
        }
        let denominator = numerator1 - product;
        Ok(FullMath::truncate_to_u128(FullMath::mul_div_rounding_up(numerator1, U256::from(sqrt_price_x64), denominator)))
    }
}

/// Next sqrt-price after adding `amount` of token1 as input (price moves up), rounding down.
fn get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x64: u128, liquidity: u128, amount: U256, add: bool) -> Result<u128, CoreError> {
    if add {
        let quotient = if amount <= U256::from(u128::MAX) {
            (amount << 64) / U256::from(liquidity)
        } else {
            FullMath::mul_div(amount, Q64, U256::from(liquidity))
        };
        Ok(FullMath::truncate_to_u128(U256::from(sqrt_price_x64) + quotient))
    } else {
        let quotient = if amount <= U256::from(u128::MAX) {
            FullMath::div_rounding_up(amount << 64, U256::from(liquidity))
        } else {
            FullMath::mul_div_rounding_up(amount, Q64, U256::from(liquidity))
        };
        if U256::from(sqrt_price_x64) <= quotient {
            return Err(CoreError::MathDomain("amount1 input exceeds available price range".into()));
        }
        Ok(FullMath::truncate_to_u128(U256::from(sqrt_price_x64) - quotient))
    }
}

/// Next sqrt-price after consuming `amount_in` of the input token, swapping `zero_for_one`.
///
/// # Errors
/// Returns `CoreError::MathDomain` if `liquidity` is zero or the resulting price would be
/// outside the representable Q64.64 range.
pub fn get_next_sqrt_price_from_input(sqrt_price_x64: u128, liquidity: u128, amount_in: U256, zero_for_one: bool) -> Result<u128, CoreError> {
    if sqrt_price_x64 == 0 || liquidity == 0 {
        return Err(CoreError::MathDomain("sqrt price and liquidity must be positive".into()));
    }
    if zero_for_one {
        get_next_sqrt_price_from_amount0_rounding_up(sqrt_price_x64, liquidity, amount_in, true)
    } else {
        get_next_sqrt_price_from_amount1_rounding_down(sqrt_price_x64, liquidity, amount_in, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick_math::get_sqrt_ratio_at_tick;

    #[test]
    fn test_amount0_delta_zero_at_equal_price() {
        let sp = 1u128 << 64;
        assert_eq!(get_amount0_delta(sp, sp, 1_000, false), U256::ZERO);
    }

    #[test]
    fn test_amount1_delta_zero_at_equal_price() {
        let sp = 1u128 << 64;
        assert_eq!(get_amount1_delta(sp, sp, 1_000, false), U256::ZERO);
    }

    #[test]
    fn test_amounts_for_liquidity_below_range_is_all_token0() {
        let lower = get_sqrt_ratio_at_tick(-60).unwrap();
        let upper = get_sqrt_ratio_at_tick(60).unwrap();
        let (a0, a1) = get_amounts_for_liquidity(lower, lower, upper, 1_000_000, false);
        assert!(a0 > U256::ZERO);
        assert_eq!(a1, U256::ZERO);
    }

    #[test]
    fn test_amounts_for_liquidity_above_range_is_all_token1() {
        let lower = get_sqrt_ratio_at_tick(-60).unwrap();
        let upper = get_sqrt_ratio_at_tick(60).unwrap();
        let (a0, a1) = get_amounts_for_liquidity(upper, lower, upper, 1_000_000, false);
        assert_eq!(a0, U256::ZERO);
        assert!(a1 > U256::ZERO);
    }

    #[test]
    fn test_next_sqrt_price_moves_down_on_zero_for_one() {
        let sp = 1u128 << 64;
        let next = get_next_sqrt_price_from_input(sp, 1_000_000_000, U256::from(1_000u64), true).unwrap();
        assert!(next < sp);
    }

    #[test]
    fn test_next_sqrt_price_moves_up_on_one_for_zero() {
        let sp = 1u128 << 64;
        let next = get_next_sqrt_price_from_input(sp, 1_000_000_000, U256::from(1_000u64), false).unwrap();
        assert!(next > sp);
    }
}
