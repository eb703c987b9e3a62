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

//! The VPM's cash ledger: current balances plus running totals used for performance
//! reporting (initial amounts, collected fees, cumulative swap cost and slippage).

use clmm_model::errors::{CoreError, CoreResult};

/// One per backtest run. `amount0`/`amount1` must remain `>= 0` at every stable point —
/// enforced here by rejecting any debit that would underflow rather than saturating.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Wallet {
    pub amount0: u128,
    pub amount1: u128,
    pub initial_amount0: u128,
    pub initial_amount1: u128,
    pub fee_collected0: u128,
    pub fee_collected1: u128,
    pub cumulative_swap_cost0: u128,
    pub cumulative_swap_cost1: u128,
    pub cumulative_slippage0: u128,
    pub cumulative_slippage1: u128,
}

impl Wallet {
    #[must_use]
    pub fn new(amount0: u128, amount1: u128) -> Self {
        Self {
            amount0,
            amount1,
            initial_amount0: amount0,
            initial_amount1: amount1,
            ..Default::default()
        }
    }

    /// Debits `(amount0, amount1)` atomically: either both succeed or neither is applied.
    pub fn debit(&mut self, amount0: u128, amount1: u128) -> CoreResult<()> {
        if self.amount0 < amount0 {
            return Err(CoreError::InsufficientBalance {
                requested: amount0,
                available: self.amount0,
            });
        }
        if self.amount1 < amount1 {
            return Err(CoreError::InsufficientBalance {
                requested: amount1,
                available: self.amount1,
            });
        }
        self.amount0 -= amount0;
        self.amount1 -= amount1;
        Ok(())
    }

    pub fn credit(&mut self, amount0: u128, amount1: u128) {
        self.amount0 += amount0;
        self.amount1 += amount1;
    }

    pub fn record_swap_cost(&mut self, swap_fee0: u128, swap_fee1: u128, slip0: u128, slip1: u128) {
        self.cumulative_swap_cost0 += swap_fee0;
        self.cumulative_swap_cost1 += swap_fee1;
        self.cumulative_slippage0 += slip0;
        self.cumulative_slippage1 += slip1;
    }

    pub fn record_fee_collected(&mut self, fee0: u128, fee1: u128) {
        self.fee_collected0 += fee0;
        self.fee_collected1 += fee1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_is_atomic_on_partial_insufficiency() {
        let mut wallet = Wallet::new(100, 10);
        let result = wallet.debit(50, 1_000);
        assert!(matches!(result, Err(CoreError::InsufficientBalance { .. })));
        // Neither side was debited.
        assert_eq!(wallet.amount0, 100);
        assert_eq!(wallet.amount1, 10);
    }

    #[test]
    fn test_debit_then_credit_round_trips() {
        let mut wallet = Wallet::new(100, 100);
        wallet.debit(30, 40).unwrap();
        assert_eq!(wallet.amount0, 70);
        assert_eq!(wallet.amount1, 60);
        wallet.credit(30, 40);
        assert_eq!(wallet.amount0, 100);
        assert_eq!(wallet.amount1, 100);
    }
}
