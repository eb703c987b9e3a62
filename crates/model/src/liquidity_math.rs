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

//! Liquidity bookkeeping: the signed add used when a tick's liquidity is touched, the
//! per-tick liquidity cap, the amount-to-liquidity inverse of [`crate::sqrt_price_math`],
//! and the "max liquidity with an optional single swap" deposit optimizer.

use alloy_primitives::U256;

use crate::full_math::FullMath;
use crate::sqrt_price_math::{get_amount0_delta, get_amount1_delta, get_amounts_for_liquidity, Q64};
use crate::tick::{MAX_TICK, MIN_TICK};
use crate::tick_math::get_sqrt_ratio_at_tick;

/// Applies a signed liquidity delta to an unsigned total, panicking on overflow/underflow —
/// both represent a corrupted tick table rather than a recoverable condition.
#[must_use]
pub fn liquidity_math_add(x: u128, y: i128) -> u128 {
    if y < 0 {
        x.checked_sub(y.unsigned_abs())
            .unwrap_or_else(|| panic!("liquidity underflow: {x} - {}", y.unsigned_abs()))
    } else {
        x.checked_add(y as u128)
            .unwrap_or_else(|| panic!("liquidity overflow: {x} + {y}"))
    }
}

/// The maximum `liquidity_gross` a single tick may carry for a given spacing, chosen so
/// that even if every tick in range is maximally initialized, `liquidity_net` sums can
/// never overflow `u128`.
#[must_use]
pub fn tick_spacing_to_max_liquidity_per_tick(tick_spacing: i32) -> u128 {
    let min_tick = MIN_TICK / tick_spacing * tick_spacing;
    let max_tick = MAX_TICK / tick_spacing * tick_spacing;
    let num_ticks = ((max_tick - min_tick) / tick_spacing) as u128 + 1;
    u128::MAX / num_ticks
}

/// Liquidity obtainable from `amount0` alone, between `sqrt_ratio_a_x64` and `sqrt_ratio_b_x64`.
/// Uses ceiling division on the denominator so liquidity is never over-issued.
#[must_use]
pub fn get_liquidity_for_amount0(sqrt_ratio_a_x64: u128, sqrt_ratio_b_x64: u128, amount0: u128) -> u128 {
    let (lo, hi) = order(sqrt_ratio_a_x64, sqrt_ratio_b_x64);
    if lo == 0 {
        return 0;
    }
    let intermediate = FullMath::mul_div(U256::from(lo), U256::from(hi), Q64);
    FullMath::truncate_to_u128(FullMath::mul_div(U256::from(amount0), intermediate, U256::from(hi - lo)))
}

/// Liquidity obtainable from `amount1` alone, between `sqrt_ratio_a_x64` and `sqrt_ratio_b_x64`.
#[must_use]
pub fn get_liquidity_for_amount1(sqrt_ratio_a_x64: u128, sqrt_ratio_b_x64: u128, amount1: u128) -> u128 {
    let (lo, hi) = order(sqrt_ratio_a_x64, sqrt_ratio_b_x64);
    if hi == lo {
        return 0;
    }
    FullMath::truncate_to_u128(FullMath::mul_div(U256::from(amount1), Q64, U256::from(hi - lo)))
}

/// The largest liquidity obtainable without a swap: below range only `amount0` binds, above
/// range only `amount1` binds, and in range the smaller of the two single-sided liquidities
/// applies (the surplus of the other token is left undeployed).
#[must_use]
pub fn get_liquidity_for_amounts(
    sqrt_ratio_x64: u128,
    sqrt_ratio_a_x64: u128,
    sqrt_ratio_b_x64: u128,
    amount0: u128,
    amount1: u128,
) -> u128 {
    let (lo, hi) = order(sqrt_ratio_a_x64, sqrt_ratio_b_x64);

    if sqrt_ratio_x64 <= lo {
        get_liquidity_for_amount0(lo, hi, amount0)
    } else if sqrt_ratio_x64 < hi {
        let l0 = get_liquidity_for_amount0(sqrt_ratio_x64, hi, amount0);
        let l1 = get_liquidity_for_amount1(lo, sqrt_ratio_x64, amount1);
        l0.min(l1)
    } else {
        get_liquidity_for_amount1(lo, hi, amount1)
    }
}

fn order(a: u128, b: u128) -> (u128, u128) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Result of [`max_liquidity_with_optional_swap`]. `remain0`/`remain1` are the signed
/// accounting residuals (Approach-A, see design notes); `actual_remain0`/`actual_remain1`
/// are the physical, non-negative leftovers credited back to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaxLiquidityResult {
    pub liquidity: u128,
    pub deposited_amount0: u128,
    pub deposited_amount1: u128,
    pub remain0: i128,
    pub remain1: i128,
    pub actual_remain0: u128,
    pub actual_remain1: u128,
    pub swap_fee0: u128,
    pub swap_fee1: u128,
    pub slip0: u128,
    pub slip1: u128,
}

/// Default slippage applied to the simulated single-swap leg, in basis points of the
/// swap's output amount.
const DEFAULT_SLIPPAGE_BPS: u128 = 50;

const TWO_POW_64_F64: f64 = 18_446_744_073_709_551_616.0;

fn sqrt_to_f64(x: u128) -> f64 {
    x as f64 / TWO_POW_64_F64
}

/// The target ratio `amount1/amount0` a unit of liquidity consumes at `sqrt_price_x64`
/// within `[sqrt_a, sqrt_b]` — step 1's value-ratio `r`, expressed directly as an amount
/// ratio (rather than a fraction-of-value) since that is what sizes the swap below.
/// Clamped to `0` at or below the lower bound and `+inf` at or above the upper bound,
/// matching the spec's `r = 0` / `r = 1` edge cases.
fn target_amount_ratio(sqrt_price_x64: u128, sqrt_a: u128, sqrt_b: u128) -> f64 {
    if sqrt_price_x64 <= sqrt_a {
        0.0
    } else if sqrt_price_x64 >= sqrt_b {
        f64::INFINITY
    } else {
        let p = sqrt_to_f64(sqrt_price_x64);
        let a = sqrt_to_f64(sqrt_a);
        let b = sqrt_to_f64(sqrt_b);
        (p - a) * p * b / (b - p)
    }
}

/// Computes the maximum liquidity placeable in `[lower, upper)` from a caller's `(amount0,
/// amount1)` budget, optionally simulating a single swap of the unused side to reach a
/// higher liquidity, per §4.2's five-step algorithm.
#[must_use]
pub fn max_liquidity_with_optional_swap(
    sqrt_price_x64: u128,
    lower: i32,
    upper: i32,
    fee_ppm: u32,
    amount0: u128,
    amount1: u128,
) -> MaxLiquidityResult {
    let sqrt_a = get_sqrt_ratio_at_tick(lower).expect("lower tick validated by caller");
    let sqrt_b = get_sqrt_ratio_at_tick(upper).expect("upper tick validated by caller");

    // Step 2: no-swap liquidity from the budget as given.
    let l0 = get_liquidity_for_amounts(sqrt_price_x64, sqrt_a, sqrt_b, amount0, amount1);

    // Step 1: the amounts L0 would actually consume, used to detect which side is in excess.
    let (optimal0, optimal1) = get_amounts_for_liquidity(sqrt_price_x64, sqrt_a, sqrt_b, l0, false);
    let optimal_amount0 = FullMath::truncate_to_u128(optimal0);
    let optimal_amount1 = FullMath::truncate_to_u128(optimal1);

    let mut swap_fee0 = 0u128;
    let mut swap_fee1 = 0u128;
    let mut slip0 = 0u128;
    let mut slip1 = 0u128;
    let mut best_liquidity = l0;

    let rho = target_amount_ratio(sqrt_price_x64, sqrt_a, sqrt_b);
    let price_f = {
        let p = sqrt_to_f64(sqrt_price_x64);
        p * p
    };
    let fee_rate = f64::from(fee_ppm) / 1_000_000.0;
    let slip_rate = DEFAULT_SLIPPAGE_BPS as f64 / 10_000.0;

    if sqrt_price_x64 < sqrt_b && amount0 > optimal_amount0 {
        // Excess token0: swap zero-for-one to pick up more token1. Rather than converting
        // the whole excess, size the swap so the post-swap amounts hit the target ratio
        // `rho` exactly (step 1) — converting everything would needlessly overshoot into
        // a token1-only deposit when only a partial rebalance was required.
        let excess0 = amount0 - optimal_amount0;
        let k = (1.0 - fee_rate) * price_f * (1.0 - slip_rate);
        let s_f = ((rho * amount0 as f64 - amount1 as f64) / (k + rho)).clamp(0.0, excess0 as f64);
        let s = s_f as u128;

        let fee = s * u128::from(fee_ppm) / 1_000_000;
        let after_fee = s - fee;
        let gross_out = FullMath::truncate_to_u128(FullMath::mul_div(U256::from(after_fee), U256::from(sqrt_price_x64) * U256::from(sqrt_price_x64), Q64 * Q64));
        let slippage = gross_out * DEFAULT_SLIPPAGE_BPS / 10_000;
        let net_out = gross_out.saturating_sub(slippage);

        let swapped_amount0 = amount0 - s;
        let swapped_amount1 = amount1 + net_out;
        let l1 = get_liquidity_for_amounts(sqrt_price_x64, sqrt_a, sqrt_b, swapped_amount0, swapped_amount1);

        if optimal_amount0 == 0 || l1 > l0 && (l1 - l0) > 2 * (fee + slippage) {
            best_liquidity = l1;
            swap_fee0 = fee;
            slip1 = slippage;
        }
    } else if sqrt_price_x64 > sqrt_a && amount1 > optimal_amount1 {
        // Excess token1: swap one-for-zero to pick up more token0, sized the same way.
        let excess1 = amount1 - optimal_amount1;
        let s_f = if rho.is_finite() {
            let k_rev = (1.0 - fee_rate) * (1.0 - slip_rate) / price_f;
            ((amount1 as f64 - rho * amount0 as f64) / (1.0 + rho * k_rev)).clamp(0.0, excess1 as f64)
        } else {
            // Target ratio wants all value in token1 already; converting token1 into
            // token0 here would only move away from it.
            0.0
        };
        let s = s_f as u128;

        let fee = s * u128::from(fee_ppm) / 1_000_000;
        let after_fee = s - fee;
        let gross_out = FullMath::truncate_to_u128(FullMath::mul_div(U256::from(after_fee), Q64 * Q64, U256::from(sqrt_price_x64) * U256::from(sqrt_price_x64)));
        let slippage = gross_out * DEFAULT_SLIPPAGE_BPS / 10_000;
        let net_out = gross_out.saturating_sub(slippage);

        let swapped_amount0 = amount0 + net_out;
        let swapped_amount1 = amount1 - s;
        let l1 = get_liquidity_for_amounts(sqrt_price_x64, sqrt_a, sqrt_b, swapped_amount0, swapped_amount1);

        if optimal_amount1 == 0 || l1 > l0 && (l1 - l0) > 2 * (fee + slippage) {
            best_liquidity = l1;
            swap_fee1 = fee;
            slip0 = slippage;
        }
    }

    // Step 5: recompute deposited amounts from the accepted liquidity and close the
    // invariant `amt_i = deposited_i + swapFee_i + slip_i + remain_i`.
    let (dep0, dep1) = get_amounts_for_liquidity(sqrt_price_x64, sqrt_a, sqrt_b, best_liquidity, false);
    let deposited_amount0 = FullMath::truncate_to_u128(dep0);
    let deposited_amount1 = FullMath::truncate_to_u128(dep1);

    let remain0 = amount0 as i128 - deposited_amount0 as i128 - swap_fee0 as i128 - slip0 as i128;
    let remain1 = amount1 as i128 - deposited_amount1 as i128 - swap_fee1 as i128 - slip1 as i128;

    MaxLiquidityResult {
        liquidity: best_liquidity,
        deposited_amount0,
        deposited_amount1,
        remain0,
        remain1,
        actual_remain0: remain0.max(0) as u128,
        actual_remain1: remain1.max(0) as u128,
        swap_fee0,
        swap_fee1,
        slip0,
        slip1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 887_272)]
    #[case(10, 887_270)]
    #[case(60, 887_220)]
    #[case(200, 887_200)]
    fn test_max_liquidity_per_tick_matches_aligned_range(#[case] spacing: i32, #[case] expected_max_tick: i32) {
        let min_tick = MIN_TICK / spacing * spacing;
        let max_tick = MAX_TICK / spacing * spacing;
        assert_eq!(max_tick, expected_max_tick);
        assert_eq!(min_tick, -expected_max_tick);

        let num_ticks = ((max_tick - min_tick) / spacing) as u128 + 1;
        let expected = u128::MAX / num_ticks;
        assert_eq!(tick_spacing_to_max_liquidity_per_tick(spacing), expected);
    }

    #[test]
    fn test_liquidity_add_and_subtract() {
        assert_eq!(liquidity_math_add(100, 50), 150);
        assert_eq!(liquidity_math_add(100, -50), 50);
    }

    #[test]
    #[should_panic(expected = "liquidity underflow")]
    fn test_liquidity_add_underflow_panics() {
        liquidity_math_add(10, -20);
    }

    #[test]
    fn test_get_liquidity_for_amounts_in_range_takes_smaller_side() {
        let lower = get_sqrt_ratio_at_tick(-60).unwrap();
        let upper = get_sqrt_ratio_at_tick(60).unwrap();
        let current = 1u128 << 64;
        let l = get_liquidity_for_amounts(current, lower, upper, 1_000_000, 1_000_000);
        assert!(l > 0);
    }

    #[test]
    fn test_max_liquidity_with_only_token1_triggers_swap_branch() {
        let sqrt_p = 1u128 << 64;
        let result = max_liquidity_with_optional_swap(sqrt_p, -60, 60, 100, 0, 6_000_000_000);
        assert!(result.liquidity > 0);
        assert!(result.swap_fee1 > 0);
        assert!(result.slip0 > 0);
        assert_eq!(result.swap_fee0, 0);
        assert_eq!(result.slip1, 0);
        assert!(result.deposited_amount0 > 0);
        assert!(result.deposited_amount1 > 0);

        // Accounting invariant (§8.2), checked in signed arithmetic.
        let lhs0 = 0i128;
        let rhs0 = result.deposited_amount0 as i128 + result.swap_fee0 as i128 + result.slip0 as i128 + result.remain0;
        assert_eq!(lhs0, rhs0);
        let lhs1 = 6_000_000_000i128;
        let rhs1 = result.deposited_amount1 as i128 + result.swap_fee1 as i128 + result.slip1 as i128 + result.remain1;
        assert_eq!(lhs1, rhs1);
    }
}
