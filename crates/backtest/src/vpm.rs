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

//! The virtual position manager: the strategy-facing layer that sits between a backtest
//! strategy and the pool's own mint/burn/swap machinery. It owns the run's [`Wallet`],
//! simulates a single optional swap on each deposit via
//! [`clmm_model::liquidity_math::max_liquidity_with_optional_swap`], and supports
//! deterministic fault injection so strategies can be exercised against partial failures.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use clmm_model::errors::{CoreError, CoreResult};
use clmm_model::liquidity_math::max_liquidity_with_optional_swap;
use clmm_model::pool::Pool;
use clmm_model::position::PositionKey;
use clmm_model::sqrt_price_math::get_amounts_for_liquidity;
use clmm_model::full_math::FullMath;

use crate::virtual_position::VirtualPosition;
use crate::wallet::Wallet;

/// Valuation of the manager's current state against a pool's live price, used for
/// mark-to-market performance reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VpmTotals {
    pub cash0: u128,
    pub cash1: u128,
    pub active_value0: u128,
    pub active_value1: u128,
    pub owed0: u128,
    pub owed1: u128,
    pub fee_collected0: u128,
    pub fee_collected1: u128,
    pub cumulative_swap_cost0: u128,
    pub cumulative_swap_cost1: u128,
    pub cumulative_slippage0: u128,
    pub cumulative_slippage1: u128,
}

/// Owner name used for every virtual position's underlying pool-level position; the pool
/// itself has no notion of strategies, only the manager distinguishes between them by id.
const VPM_OWNER: &str = "vpm";

#[derive(Debug, Clone)]
pub struct VirtualPositionManager {
    pub wallet: Wallet,
    positions: IndexMap<String, VirtualPosition>,
    /// Narrower tick bound enforced on top of the pool's own `±887 272` absolute range.
    max_tick: i32,
    /// `N` from configuration: `0` disables fault injection, `N > 0` raises
    /// `SimulatedError` on every attempt except the Nth, counted per position id.
    simulate_errors: u32,
    attempt_counts: HashMap<String, u32>,
    next_id: u64,
}

impl VirtualPositionManager {
    #[must_use]
    pub fn new(wallet: Wallet, max_tick: i32, simulate_errors: u32) -> Self {
        Self {
            wallet,
            positions: IndexMap::new(),
            max_tick,
            simulate_errors,
            attempt_counts: HashMap::new(),
            next_id: 0,
        }
    }

    /// Returns a fresh, monotonically increasing position id (`pos_0`, `pos_1`, ...).
    pub fn new_position_id(&mut self) -> String {
        let id = format!("pos_{}", self.next_id);
        self.next_id += 1;
        id
    }

    fn validate_tick_range(&self, tick_lower: i32, tick_upper: i32) -> CoreResult<()> {
        if tick_lower >= tick_upper {
            return Err(CoreError::InvalidRange { lower: tick_lower, upper: tick_upper });
        }
        if tick_lower < -self.max_tick || tick_upper > self.max_tick {
            return Err(CoreError::InvalidTick {
                tick: if tick_lower < -self.max_tick { tick_lower } else { tick_upper },
                tick_spacing: 0,
                min_tick: -self.max_tick,
                max_tick: self.max_tick,
            });
        }
        Ok(())
    }

    /// Deterministic per-id fault injection: the Nth attempt for a given id succeeds, all
    /// others raise `SimulatedError`. Keying on the caller-supplied id (rather than a
    /// single global counter) keeps the sequence reproducible regardless of call order
    /// across unrelated positions.
    fn check_simulated_error(&mut self, id: &str) -> CoreResult<()> {
        if self.simulate_errors == 0 {
            return Ok(());
        }
        let count = self.attempt_counts.entry(id.to_string()).or_insert(0);
        *count += 1;
        if *count == self.simulate_errors {
            Ok(())
        } else {
            Err(CoreError::SimulatedError { attempt: *count })
        }
    }

    /// Opens a new virtual position, debiting the wallet for the deployed amounts plus any
    /// simulated single-swap leg, and crediting back whatever the optimizer leaves over.
    ///
    /// Debit happens before the optimizer runs; the optimizer itself is infallible, so
    /// there is no failure point after the debit that could strand wallet funds.
    pub fn create_position(
        &mut self,
        pool: &mut Pool,
        id: &str,
        tick_lower: i32,
        tick_upper: i32,
        amount0_budget: u128,
        amount1_budget: u128,
        timestamp: i64,
    ) -> CoreResult<VirtualPosition> {
        self.validate_tick_range(tick_lower, tick_upper)?;
        self.check_simulated_error(id)?;

        self.wallet.debit(amount0_budget, amount1_budget)?;

        let result = max_liquidity_with_optional_swap(
            pool.sqrt_price_x64,
            tick_lower,
            tick_upper,
            pool.fee_rate,
            amount0_budget,
            amount1_budget,
        );

        pool.mint_with_liquidity(VPM_OWNER, tick_lower, tick_upper, result.liquidity)?;

        self.wallet.credit(result.actual_remain0, result.actual_remain1);
        self.wallet.record_swap_cost(result.swap_fee0, result.swap_fee1, result.slip0, result.slip1);

        let mut position = VirtualPosition::new(id.to_string(), tick_lower, tick_upper, result.liquidity, timestamp);
        position.swap_cost_0 = result.swap_fee0;
        position.swap_cost_1 = result.swap_fee1;
        position.slippage_0 = result.slip0;
        position.slippage_1 = result.slip1;

        debug!(id, liquidity = result.liquidity, "opened virtual position");
        self.positions.insert(id.to_string(), position.clone());
        Ok(position)
    }

    /// Closes a position: burns its full liquidity on the pool, collects the resulting
    /// principal plus any accrued `tokensOwed`, and credits the total into the wallet in
    /// one step. The position record is kept (with `liquidity == 0`) so later reporting
    /// can still see its lifetime totals.
    pub fn close_position(&mut self, pool: &mut Pool, id: &str, timestamp: i64) -> CoreResult<(u128, u128)> {
        let position = self
            .positions
            .get(id)
            .ok_or_else(|| CoreError::PositionMissing(id.to_string()))?
            .clone();

        if position.liquidity == 0 {
            return Ok((0, 0));
        }

        let (burned0, burned1, _, _) = pool.burn(VPM_OWNER, position.tick_lower, position.tick_upper, position.liquidity)?;
        let (collected0, collected1) = pool.collect(VPM_OWNER, position.tick_lower, position.tick_upper, u128::MAX, u128::MAX)?;

        let total0 = FullMath::truncate_to_u128(burned0) + collected0;
        let total1 = FullMath::truncate_to_u128(burned1) + collected1;
        self.wallet.credit(total0, total1);

        if let Some(stored) = self.positions.get_mut(id) {
            stored.liquidity = 0;
            stored.tokens_owed_0 = 0;
            stored.tokens_owed_1 = 0;
            stored.close_time = Some(timestamp);
        }

        Ok((total0, total1))
    }

    pub fn close_all_positions(&mut self, pool: &mut Pool, timestamp: i64) -> CoreResult<(u128, u128)> {
        let ids: Vec<String> = self.positions.iter().filter(|(_, p)| p.is_active()).map(|(id, _)| id.clone()).collect();
        let (mut total0, mut total1) = (0u128, 0u128);
        for id in ids {
            let (a0, a1) = self.close_position(pool, &id, timestamp)?;
            total0 += a0;
            total1 += a1;
        }
        Ok((total0, total1))
    }

    /// Collects the accrued `tokensOwed` from every active position into the wallet.
    pub fn collect_all_position_fees(&mut self, pool: &mut Pool) -> CoreResult<(u128, u128)> {
        let ids: Vec<String> = self.positions.iter().filter(|(_, p)| p.is_active()).map(|(id, _)| id.clone()).collect();
        let (mut total0, mut total1) = (0u128, 0u128);
        for id in ids {
            let position = self.positions.get(&id).expect("id came from self.positions").clone();
            let (c0, c1) = pool.collect(VPM_OWNER, position.tick_lower, position.tick_upper, u128::MAX, u128::MAX)?;
            self.wallet.credit(c0, c1);
            self.wallet.record_fee_collected(c0, c1);
            if let Some(stored) = self.positions.get_mut(&id) {
                stored.tokens_owed_0 = 0;
                stored.tokens_owed_1 = 0;
            }
            total0 += c0;
            total1 += c1;
        }
        Ok((total0, total1))
    }

    #[must_use]
    pub fn get_position(&self, id: &str) -> Option<&VirtualPosition> {
        self.positions.get(id)
    }

    pub fn get_active_positions(&self) -> impl Iterator<Item = &VirtualPosition> {
        self.positions.values().filter(|p| p.is_active())
    }

    pub fn all_positions(&self) -> impl Iterator<Item = &VirtualPosition> {
        self.positions.values()
    }

    pub fn all_positions_mut(&mut self) -> impl Iterator<Item = &mut VirtualPosition> {
        self.positions.values_mut()
    }

    /// Marks `tokens_owed` up to date against the pool's own position record, used by the
    /// ingestion adapter after it credits a fee share directly on the pool-level position.
    pub fn sync_owed(&mut self, pool: &Pool, id: &str) {
        if let Some(position) = self.positions.get(id) {
            let key = PositionKey::new(VPM_OWNER, position.tick_lower, position.tick_upper);
            if let Some(pool_position) = pool.get_position(&key) {
                let owed0 = pool_position.tokens_owed_0;
                let owed1 = pool_position.tokens_owed_1;
                if let Some(stored) = self.positions.get_mut(id) {
                    stored.tokens_owed_0 = owed0;
                    stored.tokens_owed_1 = owed1;
                }
            }
        }
    }

    /// Marks-to-market every active position at the pool's current price and sums wallet
    /// cash, position value, owed fees, collected fees and cumulative swap costs.
    #[must_use]
    pub fn get_totals(&self, pool: &Pool) -> VpmTotals {
        let mut totals = VpmTotals {
            cash0: self.wallet.amount0,
            cash1: self.wallet.amount1,
            fee_collected0: self.wallet.fee_collected0,
            fee_collected1: self.wallet.fee_collected1,
            cumulative_swap_cost0: self.wallet.cumulative_swap_cost0,
            cumulative_swap_cost1: self.wallet.cumulative_swap_cost1,
            cumulative_slippage0: self.wallet.cumulative_slippage0,
            cumulative_slippage1: self.wallet.cumulative_slippage1,
            ..Default::default()
        };

        for position in self.get_active_positions() {
            let sqrt_a = clmm_model::tick_math::get_sqrt_ratio_at_tick(position.tick_lower).unwrap_or(pool.sqrt_price_x64);
            let sqrt_b = clmm_model::tick_math::get_sqrt_ratio_at_tick(position.tick_upper).unwrap_or(pool.sqrt_price_x64);
            let (amount0, amount1) = get_amounts_for_liquidity(pool.sqrt_price_x64, sqrt_a, sqrt_b, position.liquidity, false);
            totals.active_value0 += FullMath::truncate_to_u128(amount0);
            totals.active_value1 += FullMath::truncate_to_u128(amount1);
            totals.owed0 += position.tokens_owed_0;
            totals.owed1 += position.tokens_owed_1;
        }

        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clmm_model::pool::PoolConfig;

    fn make_pool() -> Pool {
        Pool::new(PoolConfig::default())
    }

    #[test]
    fn test_create_position_debits_wallet_and_credits_remainder() {
        let mut pool = make_pool();
        let mut vpm = VirtualPositionManager::new(Wallet::new(1_000_000, 1_000_000), 443_636, 0);
        let position = vpm.create_position(&mut pool, "pos_0", -60, 60, 500_000, 500_000, 0).unwrap();
        assert!(position.liquidity > 0);
        // Wallet balance should never exceed the pre-debit amount.
        assert!(vpm.wallet.amount0 <= 1_000_000);
        assert!(vpm.wallet.amount1 <= 1_000_000);
    }

    #[test]
    fn test_create_position_insufficient_balance_does_not_create() {
        let mut pool = make_pool();
        let mut vpm = VirtualPositionManager::new(Wallet::new(100, 100), 443_636, 0);
        let result = vpm.create_position(&mut pool, "pos_0", -60, 60, 500_000, 500_000, 0);
        assert!(matches!(result, Err(CoreError::InsufficientBalance { .. })));
        assert!(vpm.get_position("pos_0").is_none());
    }

    #[test]
    fn test_simulated_error_succeeds_only_on_nth_attempt() {
        let mut pool = make_pool();
        let mut vpm = VirtualPositionManager::new(Wallet::new(10_000_000, 10_000_000), 443_636, 3);
        assert!(matches!(
            vpm.create_position(&mut pool, "pos_0", -60, 60, 1_000, 1_000, 0),
            Err(CoreError::SimulatedError { attempt: 1 })
        ));
        assert!(matches!(
            vpm.create_position(&mut pool, "pos_0", -60, 60, 1_000, 1_000, 0),
            Err(CoreError::SimulatedError { attempt: 2 })
        ));
        assert!(vpm.create_position(&mut pool, "pos_0", -60, 60, 1_000, 1_000, 0).is_ok());
    }

    #[test]
    fn test_close_position_credits_wallet_and_zeroes_liquidity() {
        let mut pool = make_pool();
        let mut vpm = VirtualPositionManager::new(Wallet::new(1_000_000, 1_000_000), 443_636, 0);
        vpm.create_position(&mut pool, "pos_0", -60, 60, 500_000, 500_000, 0).unwrap();
        let before0 = vpm.wallet.amount0;
        vpm.close_position(&mut pool, "pos_0", 1_700_000_000).unwrap();
        assert!(vpm.wallet.amount0 >= before0);
        assert_eq!(vpm.get_position("pos_0").unwrap().liquidity, 0);
        assert_eq!(vpm.get_position("pos_0").unwrap().close_time, Some(1_700_000_000));
    }

    #[test]
    fn test_close_missing_position_fails() {
        let mut pool = make_pool();
        let mut vpm = VirtualPositionManager::new(Wallet::new(1_000_000, 1_000_000), 443_636, 0);
        assert!(matches!(vpm.close_position(&mut pool, "nope", 0), Err(CoreError::PositionMissing(_))));
    }

    #[test]
    fn test_new_position_id_is_monotonic() {
        let mut vpm = VirtualPositionManager::new(Wallet::new(0, 0), 443_636, 0);
        assert_eq!(vpm.new_position_id(), "pos_0");
        assert_eq!(vpm.new_position_id(), "pos_1");
    }
}
