use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Source of the random draws the simulation depends on.
///
/// Passed into the graph builder and the contagion engine so a run can be
/// replayed from a seed or scripted completely in tests.
pub trait RandomSource {
	/// Uniform integer in `[min, max)`.
	fn int(&mut self, min: usize, max: usize) -> usize;

	/// `true` with probability `p`. `p` is taken as-is: values at or below
	/// `0` never succeed and values at or above `1` always do.
	fn bernoulli(&mut self, p: f64) -> bool;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
	fn int(&mut self, min: usize, max: usize) -> usize {
		(**self).int(min, max)
	}

	fn bernoulli(&mut self, p: f64) -> bool {
		(**self).bernoulli(p)
	}
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
	fn int(&mut self, min: usize, max: usize) -> usize {
		(**self).int(min, max)
	}

	fn bernoulli(&mut self, p: f64) -> bool {
		(**self).bernoulli(p)
	}
}

/// Seedable source backed by Xoshiro256++.
#[derive(Clone, Debug)]
pub struct SeededRandom {
	rng: Xoshiro256PlusPlus,
}

impl SeededRandom {
	/// Creates a source whose sequence is fully determined by `seed`.
	pub fn new(seed: u64) -> Self {
		Self {
			rng: Xoshiro256PlusPlus::seed_from_u64(seed),
		}
	}

	/// Seeds from the browser clock and `Math.random`.
	///
	/// Only meaningful on `wasm32`; elsewhere the JS imports are unavailable.
	#[cfg(target_arch = "wasm32")]
	pub fn from_browser() -> Self {
		let clock = js_sys::Date::now() as u64;
		let noise = (js_sys::Math::random() * u32::MAX as f64) as u64;
		Self::new(clock ^ (noise << 32))
	}
}

impl RandomSource for SeededRandom {
	fn int(&mut self, min: usize, max: usize) -> usize {
		if max <= min {
			return min;
		}
		self.rng.random_range(min..max)
	}

	fn bernoulli(&mut self, p: f64) -> bool {
		self.rng.random::<f64>() < p
	}
}

/// Source built from two closures, the injection point for scripted draws.
pub struct FnRandom<I, B> {
	int: I,
	bernoulli: B,
}

impl<I, B> FnRandom<I, B>
where
	I: FnMut(usize, usize) -> usize,
	B: FnMut(f64) -> bool,
{
	/// Wraps an integer generator and a Bernoulli generator.
	pub fn new(int: I, bernoulli: B) -> Self {
		Self { int, bernoulli }
	}
}

impl<I, B> RandomSource for FnRandom<I, B>
where
	I: FnMut(usize, usize) -> usize,
	B: FnMut(f64) -> bool,
{
	fn int(&mut self, min: usize, max: usize) -> usize {
		(self.int)(min, max)
	}

	fn bernoulli(&mut self, p: f64) -> bool {
		(self.bernoulli)(p)
	}
}
