use crate::config::DurationRange;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Source of the randomness behind query choice, video choice, and sleep
/// durations. Abstracted so tests can drive the simulator deterministically.
pub trait RandomSource: Send {
    /// Index in `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Duration drawn uniformly from the inclusive range.
    fn duration_in(&mut self, range: DurationRange) -> Duration;
}

pub struct SystemRandom {
    rng: StdRng,
}

impl SystemRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn duration_in(&mut self, range: DurationRange) -> Duration {
        let secs = self.rng.gen_range(range.min_secs..=range.max_secs);
        Duration::from_secs_f64(secs)
    }
}

/// Replays fixed sequences; once a sequence is exhausted it repeats its last
/// element so tests never panic on length mismatches.
pub struct ScriptedRandom {
    indices: Vec<usize>,
    secs: Vec<f64>,
    index_cursor: usize,
    secs_cursor: usize,
}

impl ScriptedRandom {
    pub fn new(indices: Vec<usize>, secs: Vec<f64>) -> Self {
        Self {
            indices,
            secs,
            index_cursor: 0,
            secs_cursor: 0,
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        let raw = self
            .indices
            .get(self.index_cursor)
            .or_else(|| self.indices.last())
            .copied()
            .unwrap_or(0);
        self.index_cursor += 1;
        raw % len.max(1)
    }

    fn duration_in(&mut self, range: DurationRange) -> Duration {
        let secs = self
            .secs
            .get(self.secs_cursor)
            .or_else(|| self.secs.last())
            .copied()
            .unwrap_or(range.min_secs);
        self.secs_cursor += 1;
        Duration::from_secs_f64(secs.clamp(range.min_secs, range.max_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_random_stays_in_bounds() {
        let mut rng = SystemRandom::new();
        for _ in 0..100 {
            assert!(rng.pick_index(8) < 8);
        }
        let range = DurationRange::new(10.0, 25.0);
        for _ in 0..100 {
            let d = rng.duration_in(range);
            assert!(d >= Duration::from_secs(10) && d <= Duration::from_secs(25));
        }
    }

    #[test]
    fn degenerate_range_is_exact() {
        let mut rng = SystemRandom::new();
        let d = rng.duration_in(DurationRange::new(60.0, 60.0));
        assert_eq!(d, Duration::from_secs(60));
    }

    #[test]
    fn scripted_random_replays_sequences() {
        let mut rng = ScriptedRandom::new(vec![2, 0, 1], vec![12.0, 20.0]);
        assert_eq!(rng.pick_index(8), 2);
        assert_eq!(rng.pick_index(8), 0);
        assert_eq!(rng.pick_index(8), 1);
        // Exhausted: repeats the last value.
        assert_eq!(rng.pick_index(8), 1);

        let range = DurationRange::new(10.0, 25.0);
        assert_eq!(rng.duration_in(range), Duration::from_secs(12));
        assert_eq!(rng.duration_in(range), Duration::from_secs(20));
        assert_eq!(rng.duration_in(range), Duration::from_secs(20));
    }

    #[test]
    fn scripted_indices_wrap_to_fit() {
        let mut rng = ScriptedRandom::new(vec![9], vec![]);
        assert_eq!(rng.pick_index(4), 1);
    }

    #[test]
    fn scripted_durations_clamp_to_range() {
        let mut rng = ScriptedRandom::new(vec![], vec![5.0, 99.0]);
        let range = DurationRange::new(10.0, 25.0);
        assert_eq!(rng.duration_in(range), Duration::from_secs(10));
        assert_eq!(rng.duration_in(range), Duration::from_secs(25));
    }
}
