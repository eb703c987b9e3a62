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

//! A sparse, word-indexed bitmap over initialized ticks, letting the swap loop jump to the
//! next initialized tick in O(1) amortized instead of scanning every spacing-aligned index.

use std::collections::HashMap;

use alloy_primitives::U256;

use crate::bit_math::{least_significant_bit, most_significant_bit};

/// Splits a compressed tick into its word index and bit position within that word.
fn tick_position(tick: i32) -> (i16, u8) {
    let word = tick >> 8;
    let bit = (tick & 0xff) as u8;
    (word as i16, bit)
}

#[derive(Debug, Clone, Default)]
pub struct TickBitmap {
    words: HashMap<i16, U256>,
    tick_spacing: i32,
}

impl TickBitmap {
    #[must_use]
    pub fn new(tick_spacing: i32) -> Self {
        Self {
            words: HashMap::new(),
            tick_spacing,
        }
    }

    fn compress_tick(&self, tick: i32) -> i32 {
        assert_eq!(tick % self.tick_spacing, 0, "tick not aligned to spacing");
        tick / self.tick_spacing
    }

    /// Flips the bit for `tick`, initializing it if unset and clearing it otherwise.
    pub fn flip_tick(&mut self, tick: i32) {
        let compressed = self.compress_tick(tick);
        let (word_pos, bit_pos) = tick_position(compressed);
        let mask = U256::from(1u8) << (bit_pos as usize);
        let word = self.words.entry(word_pos).or_insert(U256::ZERO);
        *word ^= mask;
    }

    #[must_use]
    pub fn is_initialized(&self, tick: i32) -> bool {
        let compressed = self.compress_tick(tick);
        let (word_pos, bit_pos) = tick_position(compressed);
        self.words
            .get(&word_pos)
            .is_some_and(|word| (*word >> (bit_pos as usize)) & U256::from(1u8) != U256::ZERO)
    }

    /// Finds the next initialized tick within the same word as `tick`, searching left
    /// (`lte = true`) toward lower ticks or right toward higher ticks. Returns the found
    /// (or word-boundary) tick and whether it is actually initialized.
    #[must_use]
    pub fn next_initialized_tick_within_one_word(&self, tick: i32, lte: bool) -> (i32, bool) {
        let compressed = self.compress_tick(tick);

        if lte {
            let (word_pos, bit_pos) = tick_position(compressed);
            let mask = (U256::from(1u8) << (bit_pos as usize)) - U256::from(1u8) + (U256::from(1u8) << (bit_pos as usize));
            let word = self.words.get(&word_pos).copied().unwrap_or(U256::ZERO) & mask;
            let initialized = word != U256::ZERO;
            let next = if initialized {
                (compressed - i32::from(bit_pos - most_significant_bit(word))) * self.tick_spacing
            } else {
                (compressed - i32::from(bit_pos)) * self.tick_spacing
            };
            (next, initialized)
        } else {
            let next_compressed = compressed + 1;
            let (word_pos, bit_pos) = tick_position(next_compressed);
            let mask = !((U256::from(1u8) << (bit_pos as usize)) - U256::from(1u8));
            let word = self.words.get(&word_pos).copied().unwrap_or(U256::ZERO) & mask;
            let initialized = word != U256::ZERO;
            let next = if initialized {
                (next_compressed + i32::from(least_significant_bit(word) - bit_pos)) * self.tick_spacing
            } else {
                (next_compressed + i32::from(255 - bit_pos)) * self.tick_spacing
            };
            (next, initialized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_then_is_initialized() {
        let mut bm = TickBitmap::new(1);
        assert!(!bm.is_initialized(60));
        bm.flip_tick(60);
        assert!(bm.is_initialized(60));
        bm.flip_tick(60);
        assert!(!bm.is_initialized(60));
    }

    #[test]
    fn test_next_initialized_tick_lte_finds_self() {
        let mut bm = TickBitmap::new(1);
        bm.flip_tick(10);
        let (tick, initialized) = bm.next_initialized_tick_within_one_word(10, true);
        assert!(initialized);
        assert_eq!(tick, 10);
    }

    #[test]
    fn test_next_initialized_tick_gt_finds_later_tick() {
        let mut bm = TickBitmap::new(1);
        bm.flip_tick(50);
        let (tick, initialized) = bm.next_initialized_tick_within_one_word(10, false);
        assert!(initialized);
        assert_eq!(tick, 50);
    }

    #[test]
    fn test_next_initialized_tick_respects_spacing() {
        let mut bm = TickBitmap::new(60);
        bm.flip_tick(120);
        let (tick, initialized) = bm.next_initialized_tick_within_one_word(0, false);
        assert!(initialized);
        assert_eq!(tick, 120);
    }
}
