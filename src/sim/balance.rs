//! Spawn balancing: fewest placements wins, ties broken at random
//!
//! Used for ground vs overhead obstacles, the three overhead height modes and
//! the three coin lanes. Counters only reset on run restart.

use rand::Rng;

/// Cumulative placements per bin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneBalanceCounters<const N: usize> {
    counts: [u32; N],
}

impl<const N: usize> Default for LaneBalanceCounters<N> {
    fn default() -> Self {
        Self { counts: [0; N] }
    }
}

impl<const N: usize> LaneBalanceCounters<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from explicit tallies
    pub fn from_counts(counts: [u32; N]) -> Self {
        Self { counts }
    }

    pub fn counts(&self) -> [u32; N] {
        self.counts
    }

    pub fn count(&self, bin: usize) -> u32 {
        self.counts.get(bin).copied().unwrap_or(0)
    }

    /// Pick the bin with the fewest placements, uniformly among ties
    pub fn pick_least_used<R: Rng>(&self, rng: &mut R) -> usize {
        let Some(min) = self.counts.iter().copied().min() else {
            return 0;
        };
        let tied = self.counts.iter().filter(|&&c| c == min).count();
        let mut pick = if tied > 1 { rng.random_range(0..tied) } else { 0 };

        for (bin, &count) in self.counts.iter().enumerate() {
            if count == min {
                if pick == 0 {
                    return bin;
                }
                pick -= 1;
            }
        }
        0
    }

    /// Tally a placement in `bin`
    pub fn record(&mut self, bin: usize) {
        if let Some(count) = self.counts.get_mut(bin) {
            *count = count.saturating_add(1);
        }
    }

    /// Largest minus smallest tally
    pub fn spread(&self) -> u32 {
        let max = self.counts.iter().copied().max().unwrap_or(0);
        let min = self.counts.iter().copied().min().unwrap_or(0);
        max - min
    }

    pub fn reset(&mut self) {
        self.counts = [0; N];
    }
}
