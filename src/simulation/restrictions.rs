use log::warn;

use super::config::Configuration;

/// Derives the active per-connection-type transmission probabilities from the
/// base probabilities and the currently active restrictions.
#[derive(Clone, Debug, PartialEq)]
pub struct RestrictionResolver {
	base: Vec<f64>,
	active: Vec<f64>,
	/// Per restriction, in configured order: (id, [(type index, factor)]).
	restrictions: Vec<(String, Vec<(usize, f64)>)>,
}

impl RestrictionResolver {
	/// Captures the base table and the restriction multipliers of `config`.
	/// Multipliers keyed by an unknown connection type are dropped; a
	/// validated configuration has none.
	pub fn new(config: &Configuration) -> Self {
		let base = config.base_probabilities();
		let restrictions = config
			.restrictions
			.iter()
			.map(|r| {
				let factors = config
					.connection_types
					.iter()
					.enumerate()
					.filter_map(|(idx, t)| r.multipliers.get(&t.id).map(|&f| (idx, f)))
					.collect();
				(r.id.clone(), factors)
			})
			.collect();
		Self {
			active: base.clone(),
			base,
			restrictions,
		}
	}

	/// Base probability per connection type.
	pub fn base(&self) -> &[f64] {
		&self.base
	}

	/// Active probability per connection type.
	pub fn probabilities(&self) -> &[f64] {
		&self.active
	}

	/// Restores the active table to the base probabilities.
	pub fn reset(&mut self) {
		self.active.clone_from(&self.base);
	}

	/// Recomputes the active table from scratch for the given active ids.
	/// Restrictions compose multiplicatively in configured order; unknown ids
	/// are ignored.
	pub fn apply<S: AsRef<str>>(&mut self, active_ids: &[S]) -> &[f64] {
		self.reset();

		for id in active_ids {
			let id = id.as_ref();
			if !self.restrictions.iter().any(|(rid, _)| rid == id) {
				warn!("ignoring unknown restriction '{id}'");
			}
		}

		for (id, factors) in &self.restrictions {
			if !active_ids.iter().any(|a| a.as_ref() == id) {
				continue;
			}
			for &(idx, factor) in factors {
				self.active[idx] *= factor;
			}
		}
		&self.active
	}
}
