//! RNG module - gem distribution and cell sampling
//!
//! Randomness is a pluggable collaborator of the engine. Two seams exist:
//!
//! - [`GemSource`]: draws the gem kind for every refilled cell.
//! - [`CellSampler`]: picks cells without replacement for lightning tiles and
//!   purify abilities.
//!
//! Both are implemented on top of a simple LCG so seeded runs are repeatable
//! within one build. No cross-version reproducibility is promised.

use crate::types::Coord;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        // High bits of an LCG are far better distributed than the low ones.
        ((self.next_u32() as u64 * max as u64) >> 32) as u32
    }

    /// Shuffle a slice using Fisher-Yates
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.next_range((i + 1) as u32) as usize;
            slice.swap(i, j);
        }
    }

    /// Current state (for restarting with the same sequence)
    pub fn seed(&self) -> u32 {
        self.state
    }
}

/// Supplies the gem kind for each refilled cell.
pub trait GemSource {
    /// Returns a gem in `[0, gem_kinds)`.
    fn next_gem(&mut self, gem_kinds: u8) -> u8;
}

/// Uniform-sample `n` distinct cells from `candidates`.
pub trait CellSampler {
    /// Returns `min(n, candidates.len())` distinct cells.
    fn sample(&mut self, candidates: &[Coord], n: usize) -> Vec<Coord>;
}

impl CellSampler for SimpleRng {
    fn sample(&mut self, candidates: &[Coord], n: usize) -> Vec<Coord> {
        let mut pool = candidates.to_vec();
        let take = n.min(pool.len());
        // Partial Fisher-Yates: the first `take` slots end up uniformly chosen.
        for i in 0..take {
            let j = i + self.next_range((pool.len() - i) as u32) as usize;
            pool.swap(i, j);
        }
        pool.truncate(take);
        pool
    }
}

/// Uniform gem distribution
#[derive(Debug, Clone)]
pub struct UniformGems {
    rng: SimpleRng,
}

impl UniformGems {
    pub fn new(seed: u32) -> Self {
        Self {
            rng: SimpleRng::new(seed),
        }
    }
}

impl GemSource for UniformGems {
    fn next_gem(&mut self, gem_kinds: u8) -> u8 {
        self.rng.next_range(gem_kinds.max(1) as u32) as u8
    }
}

/// Skewed gem distribution, e.g. a "helper" mode that favours a few kinds.
///
/// Weights beyond `gem_kinds` are ignored; missing weights count as 1.
#[derive(Debug, Clone)]
pub struct WeightedGems {
    rng: SimpleRng,
    weights: Vec<u32>,
}

impl WeightedGems {
    pub fn new(seed: u32, weights: Vec<u32>) -> Self {
        Self {
            rng: SimpleRng::new(seed),
            weights,
        }
    }

    fn weight(&self, gem: u8) -> u32 {
        self.weights.get(gem as usize).copied().unwrap_or(1)
    }
}

impl GemSource for WeightedGems {
    fn next_gem(&mut self, gem_kinds: u8) -> u8 {
        // Summed in 64 bits: ten weights of u32::MAX still fit.
        let total: u64 = (0..gem_kinds).map(|g| self.weight(g) as u64).sum();
        if total == 0 {
            return self.rng.next_range(gem_kinds.max(1) as u32) as u8;
        }
        let wide = ((self.rng.next_u32() as u64) << 32) | self.rng.next_u32() as u64;
        let mut roll = ((wide as u128 * total as u128) >> 64) as u64;
        for gem in 0..gem_kinds {
            let w = self.weight(gem) as u64;
            if roll < w {
                return gem;
            }
            roll -= w;
        }
        gem_kinds.saturating_sub(1)
    }
}

/// Replays a fixed gem sequence, then cycles through `0..gem_kinds`.
///
/// Handy for scripted boards where refills must be known in advance.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGems {
    queue: std::collections::VecDeque<u8>,
    fallback: u8,
}

impl ScriptedGems {
    pub fn new(gems: impl IntoIterator<Item = u8>) -> Self {
        Self {
            queue: gems.into_iter().collect(),
            fallback: 0,
        }
    }
}

impl GemSource for ScriptedGems {
    fn next_gem(&mut self, gem_kinds: u8) -> u8 {
        let kinds = gem_kinds.max(1);
        if let Some(gem) = self.queue.pop_front() {
            return gem % kinds;
        }
        let gem = self.fallback % kinds;
        self.fallback = self.fallback.wrapping_add(1);
        gem
    }
}
