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

//! Virtual position manager and swap-event ingestion adapter for concentrated-liquidity
//! strategy backtests.
//!
//! This crate sits one layer above [`clmm_model`]: where that crate provides the pool's
//! own mint/burn/swap mechanics, `clmm-backtest` provides the strategy-facing surface a
//! backtest driver actually replays historical data against —
//!
//! - A [`wallet::Wallet`] tracking cash balances and running cost/fee totals.
//! - A [`vpm::VirtualPositionManager`] that opens and closes positions on a strategy's
//!   behalf, simulating an optional single swap to deploy an uneven deposit and injecting
//!   deterministic, reproducible faults on request.
//! - An [`event::ingest_swap_event`] adapter that replays externally observed swaps,
//!   attributing each one's trading fee to the positions that were active across the
//!   price move before resynchronizing the pool to the event's reported state.
//! - A [`strategy::Strategy`] trait defining the narrow `on_start` / `on_tick` / `on_end`
//!   boundary a concrete strategy implements.

#![warn(rustc::all)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(nonstandard_style)]
#![deny(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod config;
pub mod errors;
pub mod event;
pub mod strategy;
pub mod virtual_position;
pub mod vpm;
pub mod wallet;

pub use config::BacktestConfig;
pub use errors::{CoreError, CoreResult};
pub use event::{FeeAttribution, SwapEvent, ingest_swap_event};
pub use strategy::{MarketView, Strategy};
pub use virtual_position::VirtualPosition;
pub use vpm::{VirtualPositionManager, VpmTotals};
pub use wallet::Wallet;
