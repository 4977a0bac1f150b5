use log::trace;

use super::random::RandomSource;
use super::types::{ConnectionValue, ContactGraph};

/// Result of one propagation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
	/// The pass ran; this many entities became infected (possibly zero).
	Spread(usize),
	/// Every entity was already infected; nothing was touched.
	Exhausted,
}

impl TickOutcome {
	/// Newly infected count, or `-1` when exhausted.
	pub fn as_count(self) -> i64 {
		match self {
			Self::Spread(n) => n as i64,
			Self::Exhausted => -1,
		}
	}

	/// Whether the run is over and the periodic driver should stop.
	pub fn is_terminal(self) -> bool {
		self == Self::Exhausted
	}
}

/// Transmission probability actually used for a trial.
///
/// `probability * spread_rate` can exceed `1` for aggressive rates; it is
/// clamped so such trials always succeed.
pub fn effective_probability(probability: f64, spread_rate: f64) -> f64 {
	let p = probability * spread_rate;
	if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

/// Runs one propagation pass over `graph`.
///
/// Infection travels at most one hop per pass: only entities infected before
/// the pass began can infect others. Afterwards every connection touching a
/// newly infected entity becomes contagious.
pub fn spread<R: RandomSource>(
	graph: &mut ContactGraph,
	probabilities: &[f64],
	spread_rate: f64,
	random: &mut R,
) -> TickOutcome {
	if graph.all_infected() {
		return TickOutcome::Exhausted;
	}

	let infectious: Vec<bool> = graph.entities.iter().map(|e| e.infected).collect();
	let mut newly_infected = vec![false; graph.entities.len()];
	let mut count = 0;

	for c in graph.connections.iter().filter(|c| c.value.is_contagious()) {
		let p = effective_probability(probabilities[c.kind], spread_rate);
		for (from, to) in [(c.source, c.target), (c.target, c.source)] {
			if !infectious[from] || graph.entities[to].infected {
				continue;
			}
			if random.bernoulli(p) {
				graph.entities[to].infected = true;
				newly_infected[to] = true;
				count += 1;
				trace!("entity {from} infected {to} over connection type {}", c.kind);
			}
		}
	}

	if count > 0 {
		for c in graph
			.connections
			.iter_mut()
			.filter(|c| !c.value.is_contagious())
		{
			if newly_infected[c.source] || newly_infected[c.target] {
				c.value = ConnectionValue::Contagious;
			}
		}
	}

	TickOutcome::Spread(count)
}

/// Owns the per-tick propagation state: active probabilities and spread rate.
#[derive(Clone, Debug, PartialEq)]
pub struct ContagionEngine {
	probabilities: Vec<f64>,
	spread_rate: f64,
}

impl ContagionEngine {
	/// Creates an engine with the given active probabilities and rate.
	pub fn new(probabilities: Vec<f64>, spread_rate: f64) -> Self {
		Self {
			probabilities,
			spread_rate,
		}
	}

	/// Active probability per connection type.
	pub fn probabilities(&self) -> &[f64] {
		&self.probabilities
	}

	/// Current spread-rate multiplier.
	pub fn spread_rate(&self) -> f64 {
		self.spread_rate
	}

	/// Replaces the active probabilities and rate for the next run.
	pub fn set_parameters(&mut self, probabilities: &[f64], spread_rate: f64) {
		self.probabilities.clear();
		self.probabilities.extend_from_slice(probabilities);
		self.spread_rate = spread_rate;
	}

	/// Runs one pass over `graph`.
	pub fn tick<R: RandomSource>(&self, graph: &mut ContactGraph, random: &mut R) -> TickOutcome {
		spread(graph, &self.probabilities, self.spread_rate, random)
	}
}
