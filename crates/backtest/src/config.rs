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

use clmm_model::PoolConfig;

/// Configuration for a single-pool backtest run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BacktestConfig {
    /// The pool's fixed-point math parameters (fee rate, spacing, initial price, ...).
    pub pool: PoolConfig,
    /// Deterministic fault injection in `VirtualPositionManager::create_position`: `0`
    /// disables it, `N > 0` raises `SimulatedError` on every attempt except the Nth.
    pub simulate_errors: u32,
    /// Narrower tick bound applied to virtual positions (`±443 636`), distinct from the
    /// pool's own `±887 272` absolute bound — ordinary positions never need the pool extremes.
    pub vpm_max_tick: i32,
    /// Default slippage applied to the VPM's simulated single-swap deposit leg, in basis
    /// points of the swap's output amount.
    pub default_slippage_bps: u32,
}

/// Narrower tick bound enforced by `VirtualPositionManager::create_position` (§4.4).
pub const VPM_DEFAULT_MAX_TICK: i32 = 443_636;

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            pool: PoolConfig::default(),
            simulate_errors: 0,
            vpm_max_tick: VPM_DEFAULT_MAX_TICK,
            default_slippage_bps: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_disables_fault_injection() {
        let config = BacktestConfig::default();
        assert_eq!(config.simulate_errors, 0);
        assert_eq!(config.vpm_max_tick, 443_636);
    }
}
