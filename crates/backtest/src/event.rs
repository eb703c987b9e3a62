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

//! Ingests externally observed swap events (e.g. replayed from an indexer) into a pool
//! whose state is otherwise driven only by the virtual position manager's own mints and
//! burns. Each event both attributes its trading fee to the virtual positions that were
//! active across the price move, and resynchronizes the pool's price/tick/liquidity to
//! the event's reported post-swap values.

use alloy_primitives::U256;
use tracing::trace;

use clmm_model::errors::CoreResult;
use clmm_model::full_math::FullMath;
use clmm_model::pool::Pool;

use crate::vpm::VirtualPositionManager;

/// A single observed swap, as reported by an external source (e.g. a chain indexer). The
/// fields are exactly the values needed to both attribute fees and resynchronize pool
/// state — nothing here is derived, all of it comes off the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SwapEvent {
    pub timestamp: i64,
    pub amount_in: u128,
    pub amount_out: u128,
    pub zero_for_one: bool,
    pub sqrt_price_before_x64: u128,
    pub sqrt_price_after_x64: u128,
    pub fee_amount: u128,
    /// Pool liquidity as of this event — used as the fee-share denominator, not the
    /// pool's locally tracked liquidity, since this is the value the fee was actually
    /// assessed against on-chain.
    pub liquidity: u128,
    pub tick: i32,
    pub reserve_a: u128,
    pub reserve_b: u128,
}

/// Result of ingesting one [`SwapEvent`]: the fee credited to each active, in-range
/// virtual position, plus the resulting pool resync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeeAttribution {
    pub credited_to: Vec<(String, u128, u128)>,
    pub total_fee0: u128,
    pub total_fee1: u128,
}

/// Ingests `event`, crediting its fee to every active virtual position whose range was
/// touched by the price move, then resynchronizes the pool's price/tick/liquidity.
///
/// Ordering matters: fee attribution is computed from `tick_before` (the pool's tick prior
/// to this event) and `event.tick` (the post-swap tick), entirely before the pool's own
/// state is overwritten with the event's reported values, per the adapter's ordering
/// guarantee — a position's activity is judged against the state that was true while the
/// trade happened, not the state left behind after it.
pub fn ingest_swap_event(pool: &mut Pool, vpm: &mut VirtualPositionManager, event: &SwapEvent) -> CoreResult<FeeAttribution> {
    let tick_before = pool.current_tick;
    let tick_after = event.tick;
    let range_lo = tick_before.min(tick_after);
    let range_hi = tick_before.max(tick_after);

    let mut attribution = FeeAttribution::default();

    if event.fee_amount > 0 && event.liquidity > 0 {
        for position in vpm.all_positions_mut() {
            if !position.is_active() || !position.overlaps_range(range_lo, range_hi) {
                continue;
            }
            if !position.contains_tick(tick_after) {
                continue;
            }

            let share = FullMath::mul_div(U256::from(event.fee_amount), U256::from(position.liquidity), U256::from(event.liquidity));
            let share = FullMath::truncate_to_u128(share).min(event.fee_amount);
            if share == 0 {
                continue;
            }

            if event.zero_for_one {
                position.tokens_owed_0 += share;
                attribution.total_fee0 += share;
                attribution.credited_to.push((position.id.clone(), share, 0));
            } else {
                position.tokens_owed_1 += share;
                attribution.total_fee1 += share;
                attribution.credited_to.push((position.id.clone(), 0, share));
            }
            trace!(id = %position.id, share, "credited swap-event fee share");
        }
    }

    pool.sqrt_price_x64 = event.sqrt_price_after_x64;
    pool.current_tick = tick_after;
    pool.liquidity = event.liquidity;

    Ok(attribution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;
    use clmm_model::pool::PoolConfig;

    fn make_pool() -> Pool {
        Pool::new(PoolConfig::default())
    }

    /// Scenario: a single active position spanning the whole observed range. `feeAmount =
    /// 1000`, `liquidity` on the wire is `2*L` (post-event, includes other unrelated
    /// liquidity), so the position's expected share is `floor(1000*L/(2L)) = 500`.
    #[test]
    fn test_fee_share_uses_event_liquidity_as_denominator() {
        let mut pool = make_pool();
        let mut vpm = VirtualPositionManager::new(Wallet::new(10_000_000, 10_000_000), 443_636, 0);
        let position = vpm.create_position(&mut pool, "pos_0", -120, 120, 1_000_000, 1_000_000, 0).unwrap();
        let l = position.liquidity;

        let event = SwapEvent {
            timestamp: 1,
            amount_in: 10_000,
            amount_out: 9_900,
            zero_for_one: true,
            sqrt_price_before_x64: pool.sqrt_price_x64,
            sqrt_price_after_x64: pool.sqrt_price_x64,
            fee_amount: 1_000,
            liquidity: 2 * l,
            tick: 0,
            reserve_a: 0,
            reserve_b: 0,
        };

        let attribution = ingest_swap_event(&mut pool, &mut vpm, &event).unwrap();
        assert_eq!(attribution.total_fee0, 500);
        assert_eq!(attribution.total_fee1, 0);
        assert_eq!(vpm.get_position("pos_0").unwrap().tokens_owed_0, 500);
    }

    #[test]
    fn test_out_of_range_position_receives_no_fee() {
        let mut pool = make_pool();
        let mut vpm = VirtualPositionManager::new(Wallet::new(10_000_000, 10_000_000), 443_636, 0);
        let position = vpm.create_position(&mut pool, "pos_0", 600, 1_200, 1_000_000, 1_000_000, 0).unwrap();
        let l = position.liquidity;

        let event = SwapEvent {
            timestamp: 1,
            amount_in: 10_000,
            amount_out: 9_900,
            zero_for_one: true,
            sqrt_price_before_x64: pool.sqrt_price_x64,
            sqrt_price_after_x64: pool.sqrt_price_x64,
            fee_amount: 1_000,
            liquidity: l,
            tick: 0,
            reserve_a: 0,
            reserve_b: 0,
        };

        let attribution = ingest_swap_event(&mut pool, &mut vpm, &event).unwrap();
        assert_eq!(attribution.total_fee0, 0);
        assert_eq!(vpm.get_position("pos_0").unwrap().tokens_owed_0, 0);
    }

    #[test]
    fn test_ingest_resyncs_pool_state_to_event_values() {
        let mut pool = make_pool();
        let mut vpm = VirtualPositionManager::new(Wallet::new(10_000_000, 10_000_000), 443_636, 0);
        let event = SwapEvent {
            timestamp: 1,
            amount_in: 10_000,
            amount_out: 9_900,
            zero_for_one: true,
            sqrt_price_before_x64: pool.sqrt_price_x64,
            sqrt_price_after_x64: pool.sqrt_price_x64 - 1,
            fee_amount: 0,
            liquidity: 42,
            tick: -1,
            reserve_a: 0,
            reserve_b: 0,
        };
        ingest_swap_event(&mut pool, &mut vpm, &event).unwrap();
        assert_eq!(pool.current_tick, -1);
        assert_eq!(pool.liquidity, 42);
        assert_eq!(pool.sqrt_price_x64, event.sqrt_price_after_x64);
    }
}
