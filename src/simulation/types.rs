use serde::{Serialize, Serializer};

/// A member of the simulated population.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Entity {
	/// Once set, never cleared for the lifetime of the population.
	pub infected: bool,
}

impl Entity {
	/// Creates an entity with the given infection status.
	pub fn new(infected: bool) -> Self {
		Self { infected }
	}
}

/// Propagation eligibility of a connection.
///
/// Serialized as its numeric weight (`1` or `3`), which renderers also use as
/// the line width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionValue {
	/// Neither endpoint has been infected yet.
	#[default]
	Normal,
	/// At least one endpoint is or was infected. Never reverts.
	Contagious,
}

impl ConnectionValue {
	/// Numeric weight of the state.
	pub fn weight(self) -> u8 {
		match self {
			Self::Normal => 1,
			Self::Contagious => 3,
		}
	}

	/// Value for a connection between two entities with the given status.
	pub fn between(a: bool, b: bool) -> Self {
		if a || b { Self::Contagious } else { Self::Normal }
	}

	/// Whether infection may travel over the connection.
	pub fn is_contagious(self) -> bool {
		self == Self::Contagious
	}
}

impl Serialize for ConnectionValue {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_u8(self.weight())
	}
}

/// An undirected contact between two entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Connection {
	/// Index into the entity list.
	pub source: usize,
	/// Index into the entity list.
	pub target: usize,
	/// Propagation eligibility.
	pub value: ConnectionValue,
	/// Index into the configured connection types.
	#[serde(rename = "type")]
	pub kind: usize,
}

impl Connection {
	/// Creates a connection.
	pub fn new(source: usize, target: usize, value: ConnectionValue, kind: usize) -> Self {
		Self {
			source,
			target,
			value,
			kind,
		}
	}

	/// Whether `idx` is one of the endpoints.
	pub fn touches(&self, idx: usize) -> bool {
		self.source == idx || self.target == idx
	}
}

/// Population plus the contacts between its members.
///
/// Connections refer to entities by position, so any removal of entities must
/// be followed by re-indexing the connections.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ContactGraph {
	/// The population.
	#[serde(rename = "nodes")]
	pub entities: Vec<Entity>,
	/// Contacts between entities.
	#[serde(rename = "links")]
	pub connections: Vec<Connection>,
}

impl ContactGraph {
	/// Builds a graph from parts without validating indices.
	pub fn new(entities: Vec<Entity>, connections: Vec<Connection>) -> Self {
		Self {
			entities,
			connections,
		}
	}

	/// Number of entities.
	pub fn population(&self) -> usize {
		self.entities.len()
	}

	/// Number of infected entities.
	pub fn infected_count(&self) -> usize {
		self.entities.iter().filter(|e| e.infected).count()
	}

	/// True when every entity is infected (vacuously true when empty).
	pub fn all_infected(&self) -> bool {
		self.entities.iter().all(|e| e.infected)
	}

	/// Whether every connection endpoint points at an existing entity.
	pub fn indices_valid(&self) -> bool {
		let n = self.entities.len();
		self.connections
			.iter()
			.all(|c| c.source < n && c.target < n)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn value_serializes_as_weight() {
		let c = Connection::new(0, 1, ConnectionValue::Contagious, 2);
		let json = serde_json::to_string(&c).unwrap();
		assert_eq!(json, r#"{"source":0,"target":1,"value":3,"type":2}"#);
	}

	#[test]
	fn empty_graph_is_all_infected() {
		let graph = ContactGraph::default();
		assert!(graph.all_infected());
		assert_eq!(graph.infected_count(), 0);
	}

	#[test]
	fn value_between_endpoints() {
		assert_eq!(ConnectionValue::between(false, false), ConnectionValue::Normal);
		assert_eq!(ConnectionValue::between(true, false), ConnectionValue::Contagious);
		assert_eq!(ConnectionValue::between(false, true), ConnectionValue::Contagious);
	}
}
