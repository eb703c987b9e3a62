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

//! Per-step swap math: given a price target, how much of the remaining input is consumed
//! reaching it (or short of it) and how much output and fee that produces.
//!
//! The reference `SwapMath` library also handles exact-output swaps; this pool only ever
//! replays exact-input events (§4.3.3 explicitly omits exact-out), so that branch is dropped.

use alloy_primitives::U256;

use crate::errors::CoreError;
use crate::full_math::FullMath;
use crate::sqrt_price_math::{get_amount0_delta, get_amount1_delta, get_next_sqrt_price_from_input};

/// Outcome of advancing one swap step toward (or through) a target sqrt-price.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapStepResult {
    pub sqrt_ratio_next_x64: u128,
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee_amount: U256,
}

/// Advances one exact-input swap step from `sqrt_ratio_current_x64` toward
/// `sqrt_ratio_target_x64`, consuming at most `amount_remaining` of input (after fee).
///
/// `fee_rate` and `fee_denominator` express the fee as `fee_rate / fee_denominator`
/// (e.g. `3000 / 1_000_000` for 30 bps under a ppm-denominated pool).
///
/// # Errors
/// Returns `CoreError::MathDomain` if the underlying price-step math leaves its domain.
pub fn compute_swap_step(
    sqrt_ratio_current_x64: u128,
    sqrt_ratio_target_x64: u128,
    liquidity: u128,
    amount_remaining: U256,
    fee_rate: u32,
    fee_denominator: u32,
) -> Result<SwapStepResult, CoreError> {
    let zero_for_one = sqrt_ratio_current_x64 >= sqrt_ratio_target_x64;
    let fee_denominator = U256::from(fee_denominator);
    let fee_rate = U256::from(fee_rate);
    let fee_complement = fee_denominator - fee_rate;

    let amount_in_to_target = if zero_for_one {
        get_amount0_delta(sqrt_ratio_target_x64, sqrt_ratio_current_x64, liquidity, true)
    } else {
        get_amount1_delta(sqrt_ratio_current_x64, sqrt_ratio_target_x64, liquidity, true)
    };

    let amount_remaining_less_fee = FullMath::mul_div(amount_remaining, fee_complement, fee_denominator);

    if amount_remaining_less_fee >= amount_in_to_target {
        // Full step: price reaches the target exactly.
        let amount_in = amount_in_to_target;
        let amount_out = if zero_for_one {
            get_amount1_delta(sqrt_ratio_target_x64, sqrt_ratio_current_x64, liquidity, false)
        } else {
            get_amount0_delta(sqrt_ratio_current_x64, sqrt_ratio_target_x64, liquidity, false)
        };
        let fee_amount = FullMath::mul_div_rounding_up(amount_in, fee_rate, fee_complement);

        Ok(SwapStepResult {
            sqrt_ratio_next_x64: sqrt_ratio_target_x64,
            amount_in,
            amount_out,
            fee_amount,
        })
    } else {
        // Partial step: fee is taken first off the remaining input, then the new price is
        // solved in closed form and floored back to Q64.64.
        let fee_amount = amount_remaining - amount_remaining_less_fee;
        let effective_in = amount_remaining_less_fee;

        let sqrt_ratio_next_x64 = get_next_sqrt_price_from_input(sqrt_ratio_current_x64, liquidity, effective_in, zero_for_one)?;

        let amount_in = effective_in;
        let amount_out = if zero_for_one {
            get_amount1_delta(sqrt_ratio_next_x64, sqrt_ratio_current_x64, liquidity, false)
        } else {
            get_amount0_delta(sqrt_ratio_current_x64, sqrt_ratio_next_x64, liquidity, false)
        };

        Ok(SwapStepResult {
            sqrt_ratio_next_x64,
            amount_in,
            amount_out,
            fee_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick_math::get_sqrt_ratio_at_tick;

    #[test]
    fn test_full_step_reaches_target() {
        let current = 1u128 << 64;
        let target = get_sqrt_ratio_at_tick(-60).unwrap();
        let step = compute_swap_step(current, target, 1_000_000_000_000, U256::from(u128::MAX), 3_000, 1_000_000).unwrap();
        assert_eq!(step.sqrt_ratio_next_x64, target);
        assert!(step.amount_in > U256::ZERO);
        assert!(step.fee_amount > U256::ZERO);
    }

    #[test]
    fn test_partial_step_does_not_reach_target() {
        let current = 1u128 << 64;
        let target = get_sqrt_ratio_at_tick(-60).unwrap();
        let step = compute_swap_step(current, target, 1_000_000_000_000, U256::from(1_000u64), 3_000, 1_000_000).unwrap();
        assert!(step.sqrt_ratio_next_x64 > target);
        assert!(step.sqrt_ratio_next_x64 < current);
    }

    #[test]
    fn test_zero_remaining_input_is_a_no_op() {
        let current = 1u128 << 64;
        let target = get_sqrt_ratio_at_tick(-60).unwrap();
        let step = compute_swap_step(current, target, 1_000_000_000_000, U256::ZERO, 3_000, 1_000_000).unwrap();
        assert_eq!(step.sqrt_ratio_next_x64, current);
        assert_eq!(step.amount_in, U256::ZERO);
        assert_eq!(step.amount_out, U256::ZERO);
        assert_eq!(step.fee_amount, U256::ZERO);
    }
}
