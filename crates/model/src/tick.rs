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

//! Per-tick state: the liquidity that flips at a tick and the fee-growth snapshot taken
//! on the far side of it.

use alloy_primitives::U256;

use crate::liquidity_math::liquidity_math_add;

/// The smallest tick index representable (bounded so that `1.0001^tick` does not overflow
/// the Q64.64 sqrt-price encoding).
pub const MIN_TICK: i32 = -887_272;
/// The largest tick index representable.
pub const MAX_TICK: i32 = 887_272;

/// State recorded at a single initialized tick index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInfo {
    pub value: i32,
    /// Total liquidity referencing this tick as an endpoint, irrespective of side.
    pub liquidity_gross: u128,
    /// Net change in pool liquidity when price crosses this tick moving upward.
    pub liquidity_net: i128,
    /// Fee growth (Q128.128, per unit liquidity) accumulated on the side of this tick
    /// away from the current price, for each token.
    pub fee_growth_outside_0_x128: U256,
    pub fee_growth_outside_1_x128: U256,
    pub initialized: bool,
}

impl TickInfo {
    #[must_use]
    pub fn new(value: i32) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }

    /// Whether this tick currently has liquidity referencing it.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.liquidity_gross > 0
    }

    /// Updates a tick's liquidity in response to a position's lower or upper bound being
    /// touched by a mint/burn. Returns `true` if the tick flipped from uninitialized to
    /// initialized or vice versa.
    pub fn update_liquidity(&mut self, liquidity_delta: i128, upper: bool) -> bool {
        let liquidity_gross_before = self.liquidity_gross;
        let liquidity_gross_after = liquidity_math_add(liquidity_gross_before, liquidity_delta);

        let flipped = (liquidity_gross_after == 0) != (liquidity_gross_before == 0);

        self.liquidity_gross = liquidity_gross_after;
        self.liquidity_net = if upper {
            self.liquidity_net - liquidity_delta
        } else {
            self.liquidity_net + liquidity_delta
        };
        self.initialized = liquidity_gross_after != 0;

        flipped
    }

    /// Flips the fee-growth-outside snapshot when price crosses this tick: everything that
    /// was "outside" becomes "inside" and vice versa, so `outside := global - outside`.
    pub fn update_fee_growth(&mut self, fee_growth_global_0_x128: U256, fee_growth_global_1_x128: U256) {
        self.fee_growth_outside_0_x128 = fee_growth_global_0_x128.wrapping_sub(self.fee_growth_outside_0_x128);
        self.fee_growth_outside_1_x128 = fee_growth_global_1_x128.wrapping_sub(self.fee_growth_outside_1_x128);
    }

    /// Resets a tick to its default (empty) state once its liquidity has fully unwound.
    pub fn clear(&mut self) {
        let value = self.value;
        *self = Self::new(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_liquidity_lower_flips_on_first_mint() {
        let mut tick = TickInfo::new(100);
        let flipped = tick.update_liquidity(1_000, false);
        assert!(flipped);
        assert_eq!(tick.liquidity_gross, 1_000);
        assert_eq!(tick.liquidity_net, 1_000);
        assert!(tick.initialized);
    }

    #[test]
    fn test_update_liquidity_upper_negates_net() {
        let mut tick = TickInfo::new(100);
        tick.update_liquidity(1_000, true);
        assert_eq!(tick.liquidity_net, -1_000);
    }

    #[test]
    fn test_update_liquidity_does_not_flip_on_partial_burn() {
        let mut tick = TickInfo::new(100);
        tick.update_liquidity(1_000, false);
        let flipped = tick.update_liquidity(-400, false);
        assert!(!flipped);
        assert_eq!(tick.liquidity_gross, 600);
    }

    #[test]
    fn test_update_liquidity_flips_back_to_zero() {
        let mut tick = TickInfo::new(100);
        tick.update_liquidity(1_000, false);
        let flipped = tick.update_liquidity(-1_000, false);
        assert!(flipped);
        assert_eq!(tick.liquidity_gross, 0);
        assert!(!tick.initialized);
    }

    #[test]
    fn test_fee_growth_flip_on_cross() {
        let mut tick = TickInfo::new(100);
        tick.fee_growth_outside_0_x128 = U256::from(30u64);
        tick.update_fee_growth(U256::from(100u64), U256::from(200u64));
        assert_eq!(tick.fee_growth_outside_0_x128, U256::from(70u64));
    }
}
