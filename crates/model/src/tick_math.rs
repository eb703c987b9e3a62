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

//! Conversions between a tick index and its Q64.64 sqrt-price, ported from Uniswap V3's
//! `TickMath` library. The reference implementation works in Q64.96; this pool tracks
//! sqrt-price as Q64.64, so the only changes from the reference are the final scaling shift
//! and the two boundary constants. The 20 bit constants themselves are dimensionless (they
//! encode `floor(sqrt(1.0001^(2^i)) * 2^128)`) and are carried over unchanged.

use alloy_primitives::U256;

use crate::errors::CoreError;
use crate::tick::{MAX_TICK, MIN_TICK};

/// Smallest representable Q64.64 sqrt-price, corresponding to `MIN_TICK`.
#[must_use]
pub fn min_sqrt_ratio_x64() -> u128 {
    get_sqrt_ratio_at_tick(MIN_TICK).expect("MIN_TICK is always in bounds")
}

/// Largest representable Q64.64 sqrt-price, corresponding to `MAX_TICK`.
#[must_use]
pub fn max_sqrt_ratio_x64() -> u128 {
    get_sqrt_ratio_at_tick(MAX_TICK).expect("MAX_TICK is always in bounds")
}

/// `floor(1.0001^(tick/2) * 2^64)`, i.e. the Q64.64 sqrt-price at `tick`.
///
/// # Errors
/// Returns `CoreError::MathDomain` if `tick` is outside `[MIN_TICK, MAX_TICK]`.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<u128, CoreError> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK.unsigned_abs() {
        return Err(CoreError::MathDomain(format!(
            "tick {tick} outside [{MIN_TICK}, {MAX_TICK}]"
        )));
    }

    let mut ratio: U256 = if abs_tick & 0x1 != 0 {
        U256::from_str_radix("fffcb933bd6fad37aa2d162d1a594001", 16).unwrap()
    } else {
        U256::from_str_radix("100000000000000000000000000000000", 16).unwrap()
    };

    macro_rules! step {
        ($bit:expr, $hex:expr) => {
            if abs_tick & $bit != 0 {
                ratio = (ratio * U256::from_str_radix($hex, 16).unwrap()) >> 128;
            }
        };
    }

    step!(0x2, "fff97272373d413259a46990580e213a");
    step!(0x4, "fff2e50f5f656932ef12357cf3c7fdcc");
    step!(0x8, "ffe5caca7e10e4e61c3624eaa0941cd0");
    step!(0x10, "ffcb9843d60f6159c9db58835c926644");
    step!(0x20, "ff973b41fa98c081472e6896dfb254c0");
    step!(0x40, "ff2ea16466c96a3843ec78b326b52861");
    step!(0x80, "fe5dee046a99a2a811c461f1969c3053");
    step!(0x100, "fcbe86c7900a88aedcffc83b479aa3a4");
    step!(0x200, "f987a7253ac413176f2b074cf7815e54");
    step!(0x400, "f3392b0822b70005940c7a398e4b70f3");
    step!(0x800, "e7159475a2c29b7443b29c7fa6e889d9");
    step!(0x1000, "d097f3bdfd2022b8845ad8f792aa5825");
    step!(0x2000, "a9f746462d870fdf8a65dc1f90e061e5");
    step!(0x4000, "70d869a156d2a1b890bb3df62baf32f7");
    step!(0x8000, "31be135f97d08fd981231505542fcfa6");
    step!(0x10000, "9aa508b5b7a84e1c677de54f3e99bc9");
    step!(0x20000, "5d6af8dedb81196699c329225ee604");
    step!(0x40000, "2216e584f5fa1ea926041bedfe98");
    step!(0x80000, "48a170391f7dc42444e8fa2");

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // ratio is Q128.128; round up and shift to Q64.64.
    let rounding = U256::from((1u128 << 64) - 1);
    let shifted = (ratio + rounding) >> 64;
    Ok(crate::full_math::FullMath::truncate_to_u128(shifted))
}

/// Inverse of [`get_sqrt_ratio_at_tick`]: the greatest tick whose sqrt-price is
/// `<= sqrt_price_x64`.
///
/// # Errors
/// Returns `CoreError::MathDomain` if `sqrt_price_x64` is outside the valid range.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x64: u128) -> Result<i32, CoreError> {
    let min_ratio = min_sqrt_ratio_x64();
    let max_ratio = max_sqrt_ratio_x64();
    if !(min_ratio..=max_ratio).contains(&sqrt_price_x64) {
        return Err(CoreError::MathDomain(format!(
            "sqrt price {sqrt_price_x64} outside [{min_ratio}, {max_ratio}]"
        )));
    }

    // Binary search against the canonical bit-constant table: this keeps the implementation
    // bit-exact with `get_sqrt_ratio_at_tick` rather than relying on a log-based approximation
    // (the reference shows these two approaches diverge by up to one tick at extreme prices).
    let mut lo = MIN_TICK;
    let mut hi = MAX_TICK;
    while lo < hi {
        // Bias the midpoint toward hi so the loop converges on the greatest tick satisfying
        // `sqrt_ratio(mid) <= sqrt_price_x64`.
        let mid = lo + (hi - lo + 1) / 2;
        let ratio_at_mid = get_sqrt_ratio_at_tick(mid).expect("mid is within bounds by construction");
        if ratio_at_mid <= sqrt_price_x64 {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Ok(lo)
}

/// Clamps `sp` to the nearest tick `<= sp`, then aligns it down to the nearest multiple of
/// `tick_spacing`.
///
/// # Errors
/// Returns `CoreError::MathDomain` if `sqrt_price_x64` is outside the valid range.
pub fn sqrt_price_x64_to_tick(sqrt_price_x64: u128, tick_spacing: i32) -> Result<i32, CoreError> {
    let tick = get_tick_at_sqrt_ratio(sqrt_price_x64)?;
    Ok(tick.div_euclid(tick_spacing) * tick_spacing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_tick_zero() {
        let sp = get_sqrt_ratio_at_tick(0).unwrap();
        assert_eq!(sp, 1u128 << 64);
    }

    #[test]
    fn test_round_trip_various_ticks() {
        for tick in [-887_272, -100_000, -60, -1, 1, 60, 100_000, 887_272] {
            let sp = get_sqrt_ratio_at_tick(tick).unwrap();
            let back = get_tick_at_sqrt_ratio(sp).unwrap();
            assert_eq!(back, tick, "round-trip failed for tick {tick}");
        }
    }

    #[test]
    fn test_monotonic_increasing() {
        let a = get_sqrt_ratio_at_tick(-10).unwrap();
        let b = get_sqrt_ratio_at_tick(0).unwrap();
        let c = get_sqrt_ratio_at_tick(10).unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn test_out_of_bounds_tick_is_math_domain_error() {
        assert!(get_sqrt_ratio_at_tick(MAX_TICK + 1).is_err());
    }

    #[test]
    fn test_sqrt_price_to_tick_aligns_to_spacing() {
        let sp = get_sqrt_ratio_at_tick(65).unwrap();
        let tick = sqrt_price_x64_to_tick(sp, 60).unwrap();
        assert_eq!(tick, 60);
    }
}
