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

//! A single strategy-held liquidity range as tracked by the virtual position manager,
//! separate from [`clmm_model::position::Position`] which lives on the pool itself — this
//! is the strategy-facing record: it survives a close (liquidity zeroed, not removed) so a
//! backtest can still report on a position's full lifecycle after it winds down.

/// A strategy's virtual liquidity position, keyed by a caller-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VirtualPosition {
    pub id: String,
    pub tick_lower: i32,
    pub tick_upper: i32,
    pub liquidity: u128,
    pub tokens_owed_0: u128,
    pub tokens_owed_1: u128,
    /// Cumulative swap fee paid by this position's single-swap deposit leg, if any.
    pub swap_cost_0: u128,
    pub swap_cost_1: u128,
    /// Cumulative slippage absorbed by this position's single-swap deposit leg, if any.
    pub slippage_0: u128,
    pub slippage_1: u128,
    pub open_time: i64,
    pub close_time: Option<i64>,
}

impl VirtualPosition {
    #[must_use]
    pub fn new(id: String, tick_lower: i32, tick_upper: i32, liquidity: u128, open_time: i64) -> Self {
        Self {
            id,
            tick_lower,
            tick_upper,
            liquidity,
            tokens_owed_0: 0,
            tokens_owed_1: 0,
            swap_cost_0: 0,
            swap_cost_1: 0,
            slippage_0: 0,
            slippage_1: 0,
            open_time,
            close_time: None,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.liquidity > 0
    }

    /// Whether `[self.tick_lower, self.tick_upper)` overlaps `[range_lo, range_hi]`
    /// inclusive — used by the ingestion adapter to shortlist candidate positions before
    /// checking exact activity against the post-event tick.
    #[must_use]
    pub fn overlaps_range(&self, range_lo: i32, range_hi: i32) -> bool {
        self.tick_lower <= range_hi && range_lo < self.tick_upper
    }

    /// Whether `tick` falls within this position's active range, Uniswap-V3 half-open
    /// convention (`tick_lower <= tick < tick_upper`).
    #[must_use]
    pub fn contains_tick(&self, tick: i32) -> bool {
        self.tick_lower <= tick && tick < self.tick_upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlaps_range_detects_partial_overlap() {
        let position = VirtualPosition::new("pos_0".into(), -60, 60, 1_000, 0);
        assert!(position.overlaps_range(-120, -30));
        assert!(position.overlaps_range(30, 120));
        assert!(!position.overlaps_range(60, 120));
        assert!(!position.overlaps_range(-120, -60));
    }

    #[test]
    fn test_contains_tick_is_half_open() {
        let position = VirtualPosition::new("pos_0".into(), -60, 60, 1_000, 0);
        assert!(position.contains_tick(-60));
        assert!(position.contains_tick(59));
        assert!(!position.contains_tick(60));
    }

    #[test]
    fn test_is_active_reflects_liquidity() {
        let mut position = VirtualPosition::new("pos_0".into(), -60, 60, 1_000, 0);
        assert!(position.is_active());
        position.liquidity = 0;
        assert!(!position.is_active());
    }
}
