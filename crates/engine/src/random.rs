use std::collections::VecDeque;

/// Source of entropy for randomized policy functions
///
/// Services own a boxed source. Production uses [`FastRandSource`]; tests
/// inject a [`ScriptedSource`] to force exact outcomes.
pub trait RandomSource: Send + Sync {
    /// Uniform float in `[0, 1)`
    fn unit(&mut self) -> f64;

    /// Uniform integer in `[0, bound)`. Returns `0` when `bound == 0`.
    fn below(&mut self, bound: u32) -> u32;

    /// Uniform float in `[low, high)`
    fn range(&mut self, low: f64, high: f64) -> f64 {
        low + self.unit() * (high - low)
    }

    /// `true` with probability `p`
    fn chance(&mut self, p: f64) -> bool {
        self.unit() < p
    }
}

/// Random source backed by `fastrand`
#[derive(Debug, Clone)]
pub struct FastRandSource {
    rng: fastrand::Rng,
}

impl FastRandSource {
    /// Create a source seeded from the thread-local generator
    pub fn new() -> Self {
        Self {
            rng: fastrand::Rng::new(),
        }
    }

    /// Create a reproducible source
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Default for FastRandSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for FastRandSource {
    fn unit(&mut self) -> f64 {
        self.rng.f64()
    }

    fn below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            0
        } else {
            self.rng.u32(..bound)
        }
    }
}

/// Random source that replays scripted values
///
/// Floats and integers are consumed from separate queues. Scripted values
/// are clamped into the requested range; an exhausted queue yields `0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    units: VecDeque<f64>,
    ints: VecDeque<u32>,
}

impl ScriptedSource {
    pub fn new(units: impl IntoIterator<Item = f64>, ints: impl IntoIterator<Item = u32>) -> Self {
        Self {
            units: units.into_iter().collect(),
            ints: ints.into_iter().collect(),
        }
    }

    /// Source whose every float draw is `value`
    pub fn constant(value: f64) -> Self {
        Self::new(std::iter::repeat_n(value, 4_096), [])
    }
}

impl RandomSource for ScriptedSource {
    fn unit(&mut self) -> f64 {
        self.units
            .pop_front()
            .map(|u| u.clamp(0.0, 1.0 - f64::EPSILON))
            .unwrap_or(0.0)
    }

    fn below(&mut self, bound: u32) -> u32 {
        let value = self.ints.pop_front().unwrap_or(0);
        value.min(bound.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fastrand_bounds() {
        let mut source = FastRandSource::seeded(7);
        for _ in 0..1_000 {
            let u = source.unit();
            assert!((0.0..1.0).contains(&u));
            assert!(source.below(5) < 5);
            let r = source.range(0.01, 0.05);
            assert!((0.01..0.05).contains(&r));
        }
        assert_eq!(source.below(0), 0);
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = FastRandSource::seeded(42);
        let mut b = FastRandSource::seeded(42);
        for _ in 0..16 {
            assert_eq!(a.below(100), b.below(100));
        }
    }

    #[test]
    fn test_scripted_replay_and_clamp() {
        let mut source = ScriptedSource::new([0.25, 3.0], [2, 9]);
        assert_eq!(source.unit(), 0.25);
        assert!(source.unit() < 1.0);
        assert_eq!(source.unit(), 0.0);

        assert_eq!(source.below(5), 2);
        assert_eq!(source.below(3), 2);
        assert_eq!(source.below(3), 0);
        assert_eq!(source.below(0), 0);
    }

    #[test]
    fn test_chance() {
        let mut source = ScriptedSource::new([0.1, 0.9], []);
        assert!(source.chance(0.5));
        assert!(!source.chance(0.5));
    }
}
