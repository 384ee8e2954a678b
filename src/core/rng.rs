//! Color Source
//!
//! Supplies the next color of the target sequence.
//!
//! - **Uniform**: unbiased draw from the four pads (`rand`).
//! - **Daily**: pure function of `(date key, position)`. Every player
//!   who starts the daily challenge on the same calendar day gets the
//!   same sequence, on any platform.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::color::{Color, COLOR_COUNT};

/// Modulus of the daily linear-congruential step.
pub const LCG_MODULUS: u64 = 233_280;
/// Multiplier of the daily linear-congruential step.
pub const LCG_MULTIPLIER: u64 = 9_301;
/// Increment of the daily linear-congruential step.
pub const LCG_INCREMENT: u64 = 49_297;

/// Source of sequence colors for one run.
#[derive(Clone, Debug)]
pub enum ColorRng {
    /// Uniform random colors (normal play).
    Uniform(StdRng),
    /// Colors derived from a date key (daily challenge).
    Daily(String),
}

impl ColorRng {
    /// Uniform source seeded from OS entropy.
    pub fn uniform() -> Self {
        ColorRng::Uniform(StdRng::from_entropy())
    }

    /// Uniform source with a fixed seed (replays, tests).
    pub fn seeded(seed: u64) -> Self {
        ColorRng::Uniform(StdRng::seed_from_u64(seed))
    }

    /// Daily source keyed by a date string such as `2024-1-15`.
    pub fn daily(seed: impl Into<String>) -> Self {
        ColorRng::Daily(seed.into())
    }

    /// Is this the daily source?
    pub fn is_daily(&self) -> bool {
        matches!(self, ColorRng::Daily(_))
    }

    /// Next color for the given sequence position (0-based).
    ///
    /// The uniform source ignores `position`.
    pub fn next_color(&mut self, position: usize) -> Color {
        match self {
            ColorRng::Uniform(rng) => Color::ALL[rng.gen_range(0..COLOR_COUNT)],
            ColorRng::Daily(seed) => daily_color(seed, position),
        }
    }
}

/// Color at `position` of the daily sequence for `seed`.
pub fn daily_color(seed: &str, position: usize) -> Color {
    let key = format!("{}-{}", seed, position);
    let mixed = splitmix64(fold_hash(&key) as u64);
    let value = lcg_step(mixed % LCG_MODULUS);

    // floor(value / MODULUS * 4) without floating point
    let index = (value * COLOR_COUNT as u64) / LCG_MODULUS;
    Color::ALL[index as usize]
}

/// Fold a string into 32 bits: `value = value * 31 + code_unit`.
///
/// Folds UTF-16 code units with wrapping arithmetic.
pub fn fold_hash(s: &str) -> u32 {
    s.encode_utf16()
        .fold(0u32, |value, unit| value.wrapping_mul(31).wrapping_add(unit as u32))
}

/// One step of the daily LCG. Input and output are in `[0, LCG_MODULUS)`.
#[inline]
pub fn lcg_step(value: u64) -> u64 {
    (value * LCG_MULTIPLIER + LCG_INCREMENT) % LCG_MODULUS
}

/// SplitMix64 finalizer.
/// Adjacent positions fold to adjacent hashes; this spreads them apart.
#[inline]
fn splitmix64(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

// =============================================================================
// TESTS
// =============================================================================
