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

//! The strategy boundary: a narrow trait a backtest driver calls into at run start, on
//! every ingested event, and at run end. Distinct strategies are distinct `Strategy`
//! implementations rather than subclasses of a shared base — there is no strategy
//! inheritance hierarchy here, just independent implementations of one small interface.

use clmm_model::errors::CoreResult;
use clmm_model::pool::Pool;

use crate::event::SwapEvent;
use crate::vpm::VirtualPositionManager;

/// A strategy's read-only view of the run: the pool's current state plus its own virtual
/// positions. Strategies never hold a direct `&mut Pool` — all position-affecting actions
/// go through the narrow mutating calls on [`Strategy::on_tick`]'s `vpm` argument, which
/// themselves route through the pool.
#[derive(Debug)]
pub struct MarketView<'a> {
    pub pool: &'a Pool,
    pub vpm: &'a VirtualPositionManager,
}

/// Implemented by a concrete backtest strategy. Called by the backtest driver; a strategy
/// never drives itself.
pub trait Strategy {
    /// Called once before the first event is ingested.
    fn on_start(&mut self, view: MarketView<'_>) -> CoreResult<()> {
        let _ = view;
        Ok(())
    }

    /// Called once per ingested [`SwapEvent`], after fee attribution and pool resync have
    /// both completed. `pool` and `vpm` are the same mutable handles the driver uses to
    /// ingest events — a strategy may call `vpm.create_position`, `vpm.close_position`,
    /// `vpm.close_all_positions` or `vpm.collect_all_position_fees` directly, but has no
    /// other way to mutate pool state.
    fn on_tick(&mut self, pool: &mut Pool, vpm: &mut VirtualPositionManager, event: &SwapEvent) -> CoreResult<()>;

    /// Called once after the last event, before final reporting.
    fn on_end(&mut self, pool: &mut Pool, vpm: &mut VirtualPositionManager) -> CoreResult<()> {
        let _ = (pool, vpm);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;
    use clmm_model::pool::PoolConfig;

    struct RangeBoundStrategy {
        position_id: Option<String>,
    }

    impl Strategy for RangeBoundStrategy {
        fn on_tick(&mut self, pool: &mut Pool, vpm: &mut VirtualPositionManager, _event: &SwapEvent) -> CoreResult<()> {
            if self.position_id.is_none() {
                let id = vpm.new_position_id();
                vpm.create_position(pool, &id, -60, 60, 1_000, 1_000, 0)?;
                self.position_id = Some(id);
            }
            Ok(())
        }
    }

    #[test]
    fn test_strategy_can_open_a_position_on_first_tick() {
        let mut pool = Pool::new(PoolConfig::default());
        let mut vpm = VirtualPositionManager::new(Wallet::new(1_000_000, 1_000_000), 443_636, 0);
        let mut strategy = RangeBoundStrategy { position_id: None };

        let event = SwapEvent {
            timestamp: 0,
            amount_in: 0,
            amount_out: 0,
            zero_for_one: true,
            sqrt_price_before_x64: pool.sqrt_price_x64,
            sqrt_price_after_x64: pool.sqrt_price_x64,
            fee_amount: 0,
            liquidity: 0,
            tick: 0,
            reserve_a: 0,
            reserve_b: 0,
        };
        strategy.on_tick(&mut pool, &mut vpm, &event).unwrap();
        assert!(strategy.position_id.is_some());
        assert!(vpm.get_position(strategy.position_id.as_ref().unwrap()).unwrap().is_active());
    }
}
