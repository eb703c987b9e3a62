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

//! The concentrated-liquidity pool: tracks the active tick, sqrt-price, liquidity and
//! fee-growth accumulators, and drives the mint/burn/swap state machine against the tick
//! table in [`crate::tick_map`].

use std::collections::HashMap;

use alloy_primitives::U256;
use tracing::warn;

use crate::errors::{CoreError, CoreResult};
use crate::full_math::{FullMath, Q128};
use crate::liquidity_math::{get_liquidity_for_amounts, liquidity_math_add};
use crate::position::{Position, PositionKey};
use crate::sqrt_price_math::get_amounts_for_liquidity;
use crate::swap_math::compute_swap_step;
use crate::tick::{MAX_TICK, MIN_TICK};
use crate::tick_map::TickMap;
use crate::tick_math::{get_sqrt_ratio_at_tick, max_sqrt_ratio_x64, min_sqrt_ratio_x64, sqrt_price_x64_to_tick};

/// Immutable pool parameters fixed at construction time.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize)]
pub struct PoolConfig {
    pub fee_rate: u32,
    pub fee_denominator: u32,
    pub tick_spacing: i32,
    pub sqrt_price_x64: u128,
    pub max_iterations: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            fee_rate: 3_000,
            fee_denominator: 1_000_000,
            tick_spacing: 60,
            sqrt_price_x64: 1u128 << 64,
            max_iterations: 5_000_000,
        }
    }
}

/// Outcome of a completed (possibly partial) swap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SwapResult {
    pub amount_in: U256,
    pub amount_out: U256,
    pub fee_paid: U256,
    pub ticks_crossed: u64,
    /// Set when the swap loop's safety bound was hit before `amount_specified` was
    /// exhausted; per §9 this is a warning, not a failure — `self` is already a partial
    /// but internally consistent result.
    pub iteration_limit_reached: bool,
}

#[derive(Debug, Clone)]
pub struct Pool {
    pub fee_rate: u32,
    pub fee_denominator: u32,
    pub tick_spacing: i32,
    pub sqrt_price_x64: u128,
    pub current_tick: i32,
    pub liquidity: u128,
    pub fee_growth_global_0_x128: U256,
    pub fee_growth_global_1_x128: U256,
    pub max_iterations: u64,
    tick_map: TickMap,
    positions: HashMap<String, Position>,
}

impl Pool {
    /// # Panics
    /// Panics if `config.sqrt_price_x64` is outside the representable range — this is a
    /// construction-time invariant, not a runtime error.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        let current_tick =
            sqrt_price_x64_to_tick(config.sqrt_price_x64, config.tick_spacing).expect("initial sqrt price out of range");
        Self {
            fee_rate: config.fee_rate,
            fee_denominator: config.fee_denominator,
            tick_spacing: config.tick_spacing,
            sqrt_price_x64: config.sqrt_price_x64,
            current_tick,
            liquidity: 0,
            fee_growth_global_0_x128: U256::ZERO,
            fee_growth_global_1_x128: U256::ZERO,
            max_iterations: config.max_iterations,
            tick_map: TickMap::new(config.tick_spacing),
            positions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn price(&self) -> f64 {
        let sp = self.sqrt_price_x64 as f64 / (1u128 << 64) as f64;
        sp * sp
    }

    #[must_use]
    pub fn get_position(&self, key: &PositionKey) -> Option<&Position> {
        self.positions.get(&key.as_string())
    }

    fn validate_ticks(&self, tick_lower: i32, tick_upper: i32) -> CoreResult<()> {
        if tick_lower >= tick_upper {
            return Err(CoreError::InvalidRange {
                lower: tick_lower,
                upper: tick_upper,
            });
        }
        for tick in [tick_lower, tick_upper] {
            if tick % self.tick_spacing != 0 || tick < MIN_TICK || tick > MAX_TICK {
                return Err(CoreError::InvalidTick {
                    tick,
                    tick_spacing: self.tick_spacing,
                    min_tick: MIN_TICK,
                    max_tick: MAX_TICK,
                });
            }
        }
        Ok(())
    }

    /// Shared mint/burn mechanic: updates the tick table, the position's fee-inside
    /// snapshot, and (if the range covers the current price) the pool's active liquidity.
    fn update_position(&mut self, key: &PositionKey, liquidity_delta: i128) -> CoreResult<()> {
        let current_tick = self.current_tick;
        let key_str = key.as_string();
        let mut position = self.positions.remove(&key_str).unwrap_or_default();

        if liquidity_delta < 0 {
            let burn_amount = liquidity_delta.unsigned_abs();
            if position.liquidity < burn_amount {
                self.positions.insert(key_str, position);
                return Err(CoreError::InsufficientLiquidity {
                    available: position.liquidity,
                    requested: burn_amount,
                });
            }
        }

        let flipped_lower = self.tick_map.update(
            key.tick_lower,
            current_tick,
            liquidity_delta,
            false,
            self.fee_growth_global_0_x128,
            self.fee_growth_global_1_x128,
        );
        let flipped_upper = self.tick_map.update(
            key.tick_upper,
            current_tick,
            liquidity_delta,
            true,
            self.fee_growth_global_0_x128,
            self.fee_growth_global_1_x128,
        );

        let (fee_inside_0, fee_inside_1) = self.tick_map.get_fee_growth_inside(
            key.tick_lower,
            key.tick_upper,
            current_tick,
            self.fee_growth_global_0_x128,
            self.fee_growth_global_1_x128,
        );

        if position.is_empty() {
            // Seed the snapshot without crediting fees accrued before this position existed.
            position.fee_growth_inside_0_last_x128 = fee_inside_0;
            position.fee_growth_inside_1_last_x128 = fee_inside_1;
        } else {
            position.update_fees(fee_inside_0, fee_inside_1);
        }
        position.update_liquidity(liquidity_delta);

        if key.tick_lower <= current_tick && current_tick < key.tick_upper {
            self.liquidity = liquidity_math_add(self.liquidity, liquidity_delta);
        }

        if liquidity_delta < 0 && flipped_lower {
            self.tick_map.clear(key.tick_lower);
        }
        if liquidity_delta < 0 && flipped_upper {
            self.tick_map.clear(key.tick_upper);
        }

        self.positions.insert(key_str, position);
        Ok(())
    }

    /// Mints `liquidity` directly into `[tick_lower, tick_upper)`, e.g. when replaying a
    /// ground-truth event that already carries the exact `L`.
    pub fn mint_with_liquidity(&mut self, owner: &str, tick_lower: i32, tick_upper: i32, liquidity: u128) -> CoreResult<()> {
        self.validate_ticks(tick_lower, tick_upper)?;
        let key = PositionKey::new(owner, tick_lower, tick_upper);
        self.update_position(&key, liquidity as i128)
    }

    /// Derives `L` from a token budget via [`crate::liquidity_math::get_liquidity_for_amounts`]
    /// and mints it. Returns `(position_key, liquidity)`.
    pub fn mint_with_amounts(
        &mut self,
        owner: &str,
        tick_lower: i32,
        tick_upper: i32,
        amount0: u128,
        amount1: u128,
    ) -> CoreResult<(String, u128)> {
        self.validate_ticks(tick_lower, tick_upper)?;
        let sqrt_a = get_sqrt_ratio_at_tick(tick_lower)?;
        let sqrt_b = get_sqrt_ratio_at_tick(tick_upper)?;
        let liquidity = get_liquidity_for_amounts(self.sqrt_price_x64, sqrt_a, sqrt_b, amount0, amount1);
        let key = PositionKey::new(owner, tick_lower, tick_upper);
        self.update_position(&key, liquidity as i128)?;
        Ok((key.as_string(), liquidity))
    }

    /// Removes `liquidity` from `[tick_lower, tick_upper)`. Crediting owed fees happens as
    /// part of `update_position`; `tokens_owed` is left intact (realized only via
    /// `collect`), so burn is idempotent with respect to fee realization.
    pub fn burn(&mut self, owner: &str, tick_lower: i32, tick_upper: i32, liquidity: u128) -> CoreResult<(U256, U256, u128, u128)> {
        let key = PositionKey::new(owner, tick_lower, tick_upper);
        let key_str = key.as_string();
        if !self.positions.contains_key(&key_str) {
            return Err(CoreError::PositionMissing(key_str));
        }

        self.update_position(&key, -(liquidity as i128))?;

        let sqrt_a = get_sqrt_ratio_at_tick(tick_lower)?;
        let sqrt_b = get_sqrt_ratio_at_tick(tick_upper)?;
        let (amount0, amount1) = get_amounts_for_liquidity(self.sqrt_price_x64, sqrt_a, sqrt_b, liquidity, false);

        let position = self.positions.get(&key_str).expect("update_position just inserted it");
        Ok((amount0, amount1, position.tokens_owed_0, position.tokens_owed_1))
    }

    /// Moves up to `(amount0_requested, amount1_requested)` out of a position's owed fees.
    pub fn collect(&mut self, owner: &str, tick_lower: i32, tick_upper: i32, amount0_requested: u128, amount1_requested: u128) -> CoreResult<(u128, u128)> {
        let key_str = PositionKey::new(owner, tick_lower, tick_upper).as_string();
        let position = self.positions.get_mut(&key_str).ok_or_else(|| CoreError::PositionMissing(key_str.clone()))?;
        Ok(position.collect(amount0_requested, amount1_requested))
    }

    /// Advances the pool by consuming `amount_specified` of the input token, per §4.3.3.
    /// Only exact-input swaps are supported.
    ///
    /// # Errors
    /// Returns `CoreError::MathDomain` if the underlying price math leaves its domain.
    pub fn swap(&mut self, zero_for_one: bool, amount_specified: U256, price_limit_x64: Option<u128>) -> CoreResult<SwapResult> {
        let price_limit = price_limit_x64.unwrap_or_else(|| if zero_for_one { min_sqrt_ratio_x64() } else { max_sqrt_ratio_x64() });

        let mut amount_remaining = amount_specified;
        let mut amount_in_total = U256::ZERO;
        let mut amount_out_total = U256::ZERO;
        let mut fee_paid_total = U256::ZERO;
        let mut ticks_crossed = 0u64;
        let mut iteration = 0u64;
        let mut iteration_limit_reached = false;

        while amount_remaining > U256::ZERO {
            iteration += 1;
            if iteration > self.max_iterations {
                iteration_limit_reached = true;
                warn!(ticks_crossed, "swap iteration limit reached; returning partial result");
                break;
            }

            let next_tick = self.tick_map.next_initialized_tick(self.current_tick, zero_for_one);

            if self.liquidity == 0 {
                self.cross_tick(next_tick, zero_for_one);
                ticks_crossed += 1;
                if next_tick <= MIN_TICK || next_tick >= MAX_TICK {
                    break;
                }
                continue;
            }

            let sqrt_price_next = get_sqrt_ratio_at_tick(next_tick)?;
            let sqrt_target = if zero_for_one {
                sqrt_price_next.max(price_limit)
            } else {
                sqrt_price_next.min(price_limit)
            };

            let step = compute_swap_step(self.sqrt_price_x64, sqrt_target, self.liquidity, amount_remaining, self.fee_rate, self.fee_denominator)?;

            let consumed = step.amount_in + step.fee_amount;
            amount_remaining -= consumed;
            amount_in_total += consumed;
            amount_out_total += step.amount_out;
            fee_paid_total += step.fee_amount;

            if self.liquidity > 0 {
                let fee_growth_delta = FullMath::mul_div(step.fee_amount, Q128, U256::from(self.liquidity));
                if zero_for_one {
                    self.fee_growth_global_0_x128 = self.fee_growth_global_0_x128.wrapping_add(fee_growth_delta);
                } else {
                    self.fee_growth_global_1_x128 = self.fee_growth_global_1_x128.wrapping_add(fee_growth_delta);
                }
            }

            self.sqrt_price_x64 = step.sqrt_ratio_next_x64;

            if step.sqrt_ratio_next_x64 == sqrt_price_next {
                self.cross_tick(next_tick, zero_for_one);
                ticks_crossed += 1;
            } else {
                self.current_tick = sqrt_price_x64_to_tick(self.sqrt_price_x64, 1)?;
                break;
            }
        }

        Ok(SwapResult {
            amount_in: amount_in_total,
            amount_out: amount_out_total,
            fee_paid: fee_paid_total,
            ticks_crossed,
            iteration_limit_reached,
        })
    }

    /// Crosses `tick`, flipping its fee-growth-outside snapshot and applying its signed
    /// `liquidity_net` to the pool's active liquidity, then advances `current_tick`.
    fn cross_tick(&mut self, tick: i32, zero_for_one: bool) {
        let net = self.tick_map.cross(tick, self.fee_growth_global_0_x128, self.fee_growth_global_1_x128);
        self.liquidity = liquidity_math_add(self.liquidity, if zero_for_one { -net } else { net });
        self.sqrt_price_x64 = get_sqrt_ratio_at_tick(tick).unwrap_or(self.sqrt_price_x64);
        // Uniswap-V3 convention: after a downward cross the recorded tick is one below the
        // crossed boundary, so a position with tick_lower == tick correctly reads as inactive.
        self.current_tick = if zero_for_one { tick - 1 } else { tick };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s2_pool() -> Pool {
        let mut pool = Pool::new(PoolConfig {
            fee_rate: 3_000,
            fee_denominator: 1_000_000,
            tick_spacing: 60,
            sqrt_price_x64: 1u128 << 64,
            max_iterations: 5_000_000,
        });
        pool.mint_with_amounts("a", -60, 60, 1_000_000, 1_000_000).unwrap();
        pool
    }

    #[test]
    fn test_s1_identity_tick() {
        let sp = get_sqrt_ratio_at_tick(0).unwrap();
        assert_eq!(sp, 18_446_744_073_709_551_616u128);
    }

    #[test]
    fn test_s2_single_mint_in_range() {
        let pool = s2_pool();
        assert!(pool.liquidity > 0);
        let key = PositionKey::new("a", -60, 60);
        let position = pool.get_position(&key).unwrap();
        assert_eq!(position.liquidity, pool.liquidity);
        assert_eq!(position.tokens_owed_0, 0);
        assert_eq!(position.tokens_owed_1, 0);
    }

    #[test]
    fn test_s3_swap_consumes_part_stays_in_tick() {
        let mut pool = s2_pool();
        let sqrt_price_before = pool.sqrt_price_x64;
        let result = pool.swap(true, U256::from(1_000u64), None).unwrap();
        assert_eq!(pool.current_tick, 0);
        assert!(pool.sqrt_price_x64 < sqrt_price_before);
        assert!(pool.fee_growth_global_0_x128 > U256::ZERO);
        assert!(result.fee_paid > U256::ZERO);
    }

    #[test]
    fn test_s4_swap_crosses_tick() {
        let mut pool = s2_pool();
        let result = pool.swap(true, U256::from(10_000_000_000u64), None).unwrap();
        assert!(result.ticks_crossed >= 1);
        assert_eq!(pool.liquidity, 0);
    }

    #[test]
    fn test_mint_burn_round_trip_conserves_liquidity() {
        let mut pool = Pool::new(PoolConfig::default());
        pool.mint_with_liquidity("a", -60, 60, 1_000_000).unwrap();
        assert_eq!(pool.liquidity, 1_000_000);
        pool.burn("a", -60, 60, 1_000_000).unwrap();
        assert_eq!(pool.liquidity, 0);
        assert_eq!(pool.tick_net_sum(), 0);
    }

    #[test]
    fn test_burn_missing_position_fails() {
        let mut pool = Pool::new(PoolConfig::default());
        let result = pool.burn("ghost", -60, 60, 1);
        assert!(matches!(result, Err(CoreError::PositionMissing(_))));
    }

    #[test]
    fn test_burn_insufficient_liquidity_fails() {
        let mut pool = Pool::new(PoolConfig::default());
        pool.mint_with_liquidity("a", -60, 60, 100).unwrap();
        let result = pool.burn("a", -60, 60, 1_000);
        assert!(matches!(result, Err(CoreError::InsufficientLiquidity { .. })));
    }

    #[test]
    fn test_swap_with_price_limit_at_current_price_is_a_no_op() {
        let mut pool = s2_pool();
        let current = pool.sqrt_price_x64;
        let result = pool.swap(true, U256::from(1_000u64), Some(current)).unwrap();
        assert_eq!(result.amount_in, U256::ZERO);
        assert_eq!(result.amount_out, U256::ZERO);
        assert_eq!(result.fee_paid, U256::ZERO);
    }

    impl Pool {
        fn tick_net_sum(&self) -> i128 {
            self.tick_map.liquidity_net_sum()
        }
    }
}
