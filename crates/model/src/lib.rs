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

//! The CLMM mathematical core: tick/√price fixed-point conversions, liquidity⇄amount
//! formulas, the sparse tick table, and the pool mint/burn/swap state machine.
//!
//! Module map:
//!
//! • [`errors`] – the `CoreError` taxonomy shared with `clmm-backtest`.
//! • [`full_math`] – 512-bit-intermediate `mulDiv`, used everywhere a Q64.64/Q128.128
//!   product would otherwise overflow.
//! • [`bit_math`] – most/least-significant-bit search over a 256-bit word.
//! • [`tick`] – per-tick liquidity and fee-growth-outside bookkeeping.
//! * [`tick_bitmap`] – sparse bitmap index over initialized ticks.
//! • [`tick_map`] – the tick table: initialization, crossing, and the inside-fee-growth formula.
//! • [`tick_math`] – tick ⇄ Q64.64 sqrt-price conversion (the 20 bit-constant ladder).
//! • [`sqrt_price_math`] – sqrt-price ⇄ token-amount deltas.
//! • [`liquidity_math`] – amount ⇄ liquidity conversions and the max-liquidity-with-swap optimizer.
//! • [`swap_math`] – single-step exact-input swap math.
//! • [`position`] – a liquidity provider's per-range stake.
//! • [`pool`] – ties the above into the mint/burn/swap state machine.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod bit_math;
pub mod errors;
pub mod full_math;
pub mod liquidity_math;
pub mod pool;
pub mod position;
pub mod sqrt_price_math;
pub mod swap_math;
pub mod tick;
pub mod tick_bitmap;
pub mod tick_map;
pub mod tick_math;

pub use errors::{CoreError, CoreResult};
pub use pool::{Pool, PoolConfig, SwapResult};
pub use position::{Position, PositionKey};
