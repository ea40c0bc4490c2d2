//! Random source threaded through the engine.
//!
//! Every probabilistic decision in the machine is a Bernoulli trial drawn
//! from a `RandomSource` the engine owns, so a seed fully determines a run.

/// A stream of uniform values in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Seeded pseudorandom generator. The same seed replays the same stream.
#[derive(Clone, Debug)]
pub struct Rng(fastrand::Rng);

impl Rng {
    pub fn with_seed(seed: u64) -> Self {
        Self(fastrand::Rng::with_seed(seed))
    }
}

impl RandomSource for Rng {
    fn next_unit(&mut self) -> f64 {
        self.0.f64()
    }
}

/// Draw `u` in `[0, 1)` and succeed iff `u <= p`.
///
/// `p <= 0.0` can still succeed on an exact zero draw; `p >= 1.0` always succeeds.
pub fn bernoulli<R: RandomSource + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.next_unit() <= p
}

/// Uniform value between `lo` and `hi`.
pub fn uniform<R: RandomSource + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.next_unit()
}
