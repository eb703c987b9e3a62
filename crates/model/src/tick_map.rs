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

//! The tick table: a sparse map of initialized [`TickInfo`] entries plus the bitmap index
//! used to jump between them, and the inside/outside fee-growth bookkeeping that lets a
//! position's owed fees be computed in O(1) regardless of how many ticks it has crossed.

use std::collections::HashMap;

use alloy_primitives::U256;

use crate::liquidity_math::tick_spacing_to_max_liquidity_per_tick;
use crate::tick::TickInfo;
use crate::tick_bitmap::TickBitmap;

#[derive(Debug, Clone)]
pub struct TickMap {
    ticks: HashMap<i32, TickInfo>,
    bitmap: TickBitmap,
    tick_spacing: i32,
    max_liquidity_per_tick: u128,
}

impl TickMap {
    #[must_use]
    pub fn new(tick_spacing: i32) -> Self {
        Self {
            ticks: HashMap::new(),
            bitmap: TickBitmap::new(tick_spacing),
            tick_spacing,
            max_liquidity_per_tick: tick_spacing_to_max_liquidity_per_tick(tick_spacing),
        }
    }

    #[must_use]
    pub fn get_tick(&self, tick: i32) -> Option<&TickInfo> {
        self.ticks.get(&tick)
    }

    #[must_use]
    pub fn is_initialized(&self, tick: i32) -> bool {
        self.ticks.get(&tick).is_some_and(TickInfo::is_active)
    }

    /// Updates the tick's liquidity bookkeeping and, if the boundary flipped between
    /// uninitialized and initialized, updates the bitmap to match. On first
    /// initialization, the fee-growth-outside snapshot is seeded assuming all growth to
    /// date happened below this tick (the standard Uniswap-V3 convention).
    pub fn update(
        &mut self,
        tick: i32,
        current_tick: i32,
        liquidity_delta: i128,
        upper: bool,
        fee_growth_global_0_x128: U256,
        fee_growth_global_1_x128: U256,
    ) -> bool {
        let entry = self.ticks.entry(tick).or_insert_with(|| TickInfo::new(tick));
        let was_initialized = entry.initialized;

        if !was_initialized && tick <= current_tick {
            entry.fee_growth_outside_0_x128 = fee_growth_global_0_x128;
            entry.fee_growth_outside_1_x128 = fee_growth_global_1_x128;
        }

        let flipped = entry.update_liquidity(liquidity_delta, upper);
        assert!(
            entry.liquidity_gross <= self.max_liquidity_per_tick,
            "tick {tick} liquidity_gross {} exceeds max_liquidity_per_tick {}",
            entry.liquidity_gross,
            self.max_liquidity_per_tick
        );

        if flipped {
            self.bitmap.flip_tick(tick);
        }
        flipped
    }

    /// Removes a fully-unwound tick from both the sparse map and the bitmap.
    pub fn clear(&mut self, tick: i32) {
        if self.ticks.remove(&tick).is_some() {
            self.bitmap.flip_tick(tick);
        }
    }

    /// Applies the "flip" at a tick being crossed and returns its `liquidity_net`
    /// (signed: positive when crossing upward, already oriented so the caller can add
    /// it directly to `pool.liquidity`).
    pub fn cross(&mut self, tick: i32, fee_growth_global_0_x128: U256, fee_growth_global_1_x128: U256) -> i128 {
        let entry = self.ticks.entry(tick).or_insert_with(|| TickInfo::new(tick));
        entry.update_fee_growth(fee_growth_global_0_x128, fee_growth_global_1_x128);
        entry.liquidity_net
    }

    /// The standard Uniswap-V3 4-case fee-growth-inside formula for `[lower, upper)`.
    #[must_use]
    pub fn get_fee_growth_inside(
        &self,
        tick_lower: i32,
        tick_upper: i32,
        current_tick: i32,
        fee_growth_global_0_x128: U256,
        fee_growth_global_1_x128: U256,
    ) -> (U256, U256) {
        let lower = self.ticks.get(&tick_lower).copied().unwrap_or_default();
        let upper = self.ticks.get(&tick_upper).copied().unwrap_or_default();

        let (fee_below_0, fee_below_1) = if current_tick >= tick_lower {
            (lower.fee_growth_outside_0_x128, lower.fee_growth_outside_1_x128)
        } else {
            (
                fee_growth_global_0_x128.wrapping_sub(lower.fee_growth_outside_0_x128),
                fee_growth_global_1_x128.wrapping_sub(lower.fee_growth_outside_1_x128),
            )
        };

        let (fee_above_0, fee_above_1) = if current_tick < tick_upper {
            (upper.fee_growth_outside_0_x128, upper.fee_growth_outside_1_x128)
        } else {
            (
                fee_growth_global_0_x128.wrapping_sub(upper.fee_growth_outside_0_x128),
                fee_growth_global_1_x128.wrapping_sub(upper.fee_growth_outside_1_x128),
            )
        };

        (
            fee_growth_global_0_x128.wrapping_sub(fee_below_0).wrapping_sub(fee_above_0),
            fee_growth_global_1_x128.wrapping_sub(fee_below_1).wrapping_sub(fee_above_1),
        )
    }

    /// Next initialized tick starting from `tick` and moving in `direction`
    /// (`zero_for_one` moves to lower ticks). Walks word by word until one is found or the
    /// tick range is exhausted.
    #[must_use]
    pub fn next_initialized_tick(&self, tick: i32, zero_for_one: bool) -> i32 {
        let mut compressed = tick;
        loop {
            let (next, initialized) = self.bitmap.next_initialized_tick_within_one_word(compressed, zero_for_one);
            if initialized {
                return next;
            }
            if next <= crate::tick::MIN_TICK || next >= crate::tick::MAX_TICK {
                return next.clamp(crate::tick::MIN_TICK, crate::tick::MAX_TICK);
            }
            compressed = if zero_for_one { next - self.tick_spacing } else { next + self.tick_spacing };
        }
    }

    #[must_use]
    pub fn liquidity_net_sum(&self) -> i128 {
        self.ticks.values().filter(|t| t.initialized).map(|t| t.liquidity_net).sum()
    }

    #[must_use]
    pub fn max_liquidity_per_tick(&self) -> u128 {
        self.max_liquidity_per_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_growth_inside_uninitialized_ticks_equals_global() {
        let map = TickMap::new(60);
        let (f0, f1) = map.get_fee_growth_inside(-60, 60, 0, U256::from(100u64), U256::from(200u64));
        assert_eq!(f0, U256::from(100u64));
        assert_eq!(f1, U256::from(200u64));
    }

    #[test]
    fn test_update_flips_on_first_mint_and_clears_to_unflip() {
        let mut map = TickMap::new(60);
        let flipped = map.update(60, 0, 1_000, false, U256::ZERO, U256::ZERO);
        assert!(flipped);
        assert!(map.is_initialized(60));

        let flipped_back = map.update(60, 0, -1_000, false, U256::ZERO, U256::ZERO);
        assert!(flipped_back);
        map.clear(60);
        assert!(!map.is_initialized(60));
    }

    #[test]
    fn test_cross_flips_fee_growth_outside() {
        let mut map = TickMap::new(60);
        map.update(60, 0, 1_000, false, U256::from(10u64), U256::from(20u64));
        let net = map.cross(60, U256::from(50u64), U256::from(80u64));
        assert_eq!(net, 1_000);
        let tick = map.get_tick(60).unwrap();
        assert_eq!(tick.fee_growth_outside_0_x128, U256::from(40u64));
    }

    #[test]
    fn test_liquidity_net_sum_is_zero_after_balanced_mint() {
        let mut map = TickMap::new(60);
        map.update(-60, 0, 1_000, false, U256::ZERO, U256::ZERO);
        map.update(60, 0, 1_000, true, U256::ZERO, U256::ZERO);
        assert_eq!(map.liquidity_net_sum(), 0);
    }
}
