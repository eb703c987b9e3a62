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

//! A liquidity provider's stake in a `[tick_lower, tick_upper)` range, carrying its own
//! liquidity and the fee-growth-inside snapshot needed to compute owed fees in O(1).

use alloy_primitives::U256;

use crate::full_math::{FullMath, Q128};
use crate::liquidity_math::liquidity_math_add;

/// Identifies a position by owner and range. Derived, not stored independently — positions
/// are looked up by this key rather than by a direct reference to their owning pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PositionKey {
    pub owner: String,
    pub tick_lower: i32,
    pub tick_upper: i32,
}

impl PositionKey {
    #[must_use]
    pub fn new(owner: impl Into<String>, tick_lower: i32, tick_upper: i32) -> Self {
        Self {
            owner: owner.into(),
            tick_lower,
            tick_upper,
        }
    }

    #[must_use]
    pub fn as_string(&self) -> String {
        format!("{}:{}:{}", self.owner, self.tick_lower, self.tick_upper)
    }
}

/// An LP's stake in a specific range, with its own liquidity and fee-inside snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Position {
    pub liquidity: u128,
    pub fee_growth_inside_0_last_x128: U256,
    pub fee_growth_inside_1_last_x128: U256,
    pub tokens_owed_0: u128,
    pub tokens_owed_1: u128,
}

impl Position {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0 && self.tokens_owed_0 == 0 && self.tokens_owed_1 == 0
    }

    /// Applies a signed liquidity delta from a mint or burn.
    pub fn update_liquidity(&mut self, liquidity_delta: i128) {
        self.liquidity = liquidity_math_add(self.liquidity, liquidity_delta);
    }

    /// Credits fees accrued since the last snapshot, per §4.3.6. The subtraction against the
    /// prior snapshot is wrapping: after enough tick crossings `fee_growth_inside` can wrap
    /// around `2^256`, and the delta is still meaningful modulo `2^256`.
    pub fn update_fees(&mut self, fee_growth_inside_0_x128: U256, fee_growth_inside_1_x128: U256) {
        let delta_0 = fee_growth_inside_0_x128.wrapping_sub(self.fee_growth_inside_0_last_x128);
        let delta_1 = fee_growth_inside_1_x128.wrapping_sub(self.fee_growth_inside_1_last_x128);

        let owed_0 = FullMath::truncate_to_u128(FullMath::mul_div(delta_0, U256::from(self.liquidity), Q128));
        let owed_1 = FullMath::truncate_to_u128(FullMath::mul_div(delta_1, U256::from(self.liquidity), Q128));

        self.tokens_owed_0 = self.tokens_owed_0.wrapping_add(owed_0);
        self.tokens_owed_1 = self.tokens_owed_1.wrapping_add(owed_1);
        self.fee_growth_inside_0_last_x128 = fee_growth_inside_0_x128;
        self.fee_growth_inside_1_last_x128 = fee_growth_inside_1_x128;
    }

    /// Moves up to `(amount0, amount1)` out of the owed balances, capped at what's owed, and
    /// returns the amount actually collected. Calling this twice in a row with no
    /// intervening fee accrual collects zero the second time (idempotent).
    pub fn collect(&mut self, amount0_requested: u128, amount1_requested: u128) -> (u128, u128) {
        let amount0 = amount0_requested.min(self.tokens_owed_0);
        let amount1 = amount1_requested.min(self.tokens_owed_1);
        self.tokens_owed_0 -= amount0;
        self.tokens_owed_1 -= amount1;
        (amount0, amount1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_key_format() {
        let key = PositionKey::new("alice", -60, 60);
        assert_eq!(key.as_string(), "alice:-60:60");
    }

    #[test]
    fn test_update_fees_accumulates_tokens_owed() {
        let mut position = Position::new();
        position.update_liquidity(1_000_000);
        position.update_fees(Q128 * U256::from(10u64), Q128 * U256::from(5u64));
        assert_eq!(position.tokens_owed_0, 10_000_000);
        assert_eq!(position.tokens_owed_1, 5_000_000);
    }

    #[test]
    fn test_collect_is_capped_and_idempotent() {
        let mut position = Position::new();
        position.tokens_owed_0 = 100;
        let (collected, _) = position.collect(1_000, 0);
        assert_eq!(collected, 100);
        assert_eq!(position.tokens_owed_0, 0);

        let (collected_again, _) = position.collect(1_000, 0);
        assert_eq!(collected_again, 0);
    }

    #[test]
    fn test_is_empty() {
        let position = Position::new();
        assert!(position.is_empty());
    }
}
