use log::debug;

use super::random::RandomSource;
use super::types::{Connection, ConnectionValue, ContactGraph, Entity};

/// Builds a random population and the contacts between its members.
pub struct GraphBuilder<'a, R: RandomSource> {
	random: &'a mut R,
	connection_types: usize,
}

impl<'a, R: RandomSource> GraphBuilder<'a, R> {
	/// Creates a builder drawing connection types from `0..connection_types`.
	pub fn new(random: &'a mut R, connection_types: usize) -> Self {
		Self {
			random,
			connection_types,
		}
	}

	/// Resolves the requested population size. `0` picks one at random from
	/// `[min + 1, max)` so an auto-selected population is never empty.
	pub fn decide_entity_count(&mut self, requested: usize, min: usize, max: usize) -> usize {
		if requested == 0 {
			self.random.int(min + 1, max)
		} else {
			requested
		}
	}

	/// Creates `count` entities, each infected independently with probability
	/// `infected_fraction`.
	pub fn create_entities(&mut self, count: usize, infected_fraction: f64) -> Vec<Entity> {
		(0..count)
			.map(|_| Entity::new(self.random.bernoulli(infected_fraction)))
			.collect()
	}

	/// Draws `2 * entities.len()` random connections without self-loops.
	/// Fewer than two entities yield no connections.
	pub fn create_connections(&mut self, entities: &[Entity]) -> Vec<Connection> {
		let n = entities.len();
		if n < 2 {
			return Vec::new();
		}

		(0..n * 2)
			.map(|_| {
				let source = self.random.int(0, n);
				let mut target = self.random.int(0, n);
				while target == source {
					target = self.random.int(0, n);
				}
				let value =
					ConnectionValue::between(entities[source].infected, entities[target].infected);
				let kind = self.random.int(0, self.connection_types);
				Connection::new(source, target, value, kind)
			})
			.collect()
	}

	/// Full pipeline: size, populate, connect, prune. A population of fewer
	/// than two entities has no connections and is kept whole.
	pub fn build(
		&mut self,
		requested: usize,
		min: usize,
		max: usize,
		infected_fraction: f64,
	) -> ContactGraph {
		let count = self.decide_entity_count(requested, min, max);
		let entities = self.create_entities(count, infected_fraction);
		let connections = self.create_connections(&entities);
		let mut graph = ContactGraph::new(entities, connections);
		let removed = if count < 2 {
			0
		} else {
			prune_isolates(&mut graph)
		};
		debug!(
			"built contact graph: {} entities ({} isolates pruned), {} connections",
			graph.population(),
			removed,
			graph.connections.len()
		);
		graph
	}
}

/// Removes every entity no connection touches and re-indexes the connections
/// so each surviving entity's new index is its old index minus the number of
/// removed entities before it. Returns the number of entities removed.
pub fn prune_isolates(graph: &mut ContactGraph) -> usize {
	let mut linked = vec![false; graph.entities.len()];
	for c in &graph.connections {
		linked[c.source] = true;
		linked[c.target] = true;
	}

	// old index -> new index, computed once for the whole prune
	let mut remap = Vec::with_capacity(linked.len());
	let mut removed = 0;
	for &keep in &linked {
		remap.push(remap.len() - removed);
		if !keep {
			removed += 1;
		}
	}
	if removed == 0 {
		return 0;
	}

	let mut idx = 0;
	graph.entities.retain(|_| {
		let keep = linked[idx];
		idx += 1;
		keep
	});
	for c in &mut graph.connections {
		c.source = remap[c.source];
		c.target = remap[c.target];
	}
	removed
}
