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

//! Error taxonomy shared by the pool core and the backtest layer built on top of it.

use thiserror::Error;

/// Errors raised by tick/price math, the tick table, the pool state machine, and the
/// virtual position manager that replays events against it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A tick index is outside `[MIN_TICK, MAX_TICK]` or not a multiple of the pool's spacing.
    #[error("invalid tick {tick}: must lie in [{min_tick}, {max_tick}] and be a multiple of spacing {tick_spacing}")]
    InvalidTick {
        tick: i32,
        tick_spacing: i32,
        min_tick: i32,
        max_tick: i32,
    },

    /// A tick range was given with `tick_lower >= tick_upper`.
    #[error("invalid range: lower tick {lower} >= upper tick {upper}")]
    InvalidRange { lower: i32, upper: i32 },

    /// A wallet operation requested more of a token than is available.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u128, available: u128 },

    /// A burn (or swap through a range) requested more liquidity than is present.
    #[error("insufficient liquidity: available {available}, requested {requested}")]
    InsufficientLiquidity { available: u128, requested: u128 },

    /// The referenced position does not exist.
    #[error("position not found: {0}")]
    PositionMissing(String),

    /// A fixed-point computation left its valid domain (overflow, division by zero, etc).
    #[error("math domain error: {0}")]
    MathDomain(String),

    /// Deterministic fault injection fired for this call (see `simulateErrors`).
    #[error("simulated error on attempt {attempt}")]
    SimulatedError { attempt: u32 },
}

pub type CoreResult<T> = Result<T, CoreError>;
