//! Renderer-facing views of the session state.

use serde::Serialize;

use super::config::Configuration;
use super::series::{SeriesPoint, TimeSeriesTracker};
use super::types::ContactGraph;

/// Fallback palette for connection types configured without a color.
const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

/// A node as a force-layout renderer wants it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphNode {
	/// Position in the entity list.
	pub id: usize,
	/// Infection status.
	pub infected: bool,
	/// Fill color.
	pub color: String,
}

/// A link as a force-layout renderer wants it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphLink {
	/// Source node id.
	pub source: usize,
	/// Target node id.
	pub target: usize,
	/// `1` or `3`; doubles as the line width.
	pub value: u8,
	/// Connection type index.
	#[serde(rename = "type")]
	pub kind: usize,
	/// Line color of the connection type.
	pub color: String,
	/// Link strength of the connection type.
	pub strength: f64,
}

/// Nodes and links ready for drawing.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GraphData {
	/// One entry per entity.
	pub nodes: Vec<GraphNode>,
	/// One entry per connection.
	pub links: Vec<GraphLink>,
}

impl GraphData {
	/// Decorates `graph` with the colors and strengths from `config`.
	pub fn from_graph(graph: &ContactGraph, config: &Configuration) -> Self {
		let nodes = graph
			.entities
			.iter()
			.enumerate()
			.map(|(id, e)| GraphNode {
				id,
				infected: e.infected,
				color: if e.infected {
					config.node_colors.infected.clone()
				} else {
					config.node_colors.healthy.clone()
				},
			})
			.collect();

		let links = graph
			.connections
			.iter()
			.map(|c| {
				let kind = config.connection_types.get(c.kind);
				let color = kind
					.map(|t| t.color.as_str())
					.filter(|color| !color.is_empty())
					.unwrap_or(COLORS[c.kind % COLORS.len()]);
				GraphLink {
					source: c.source,
					target: c.target,
					value: c.value.weight(),
					kind: c.kind,
					color: color.to_string(),
					strength: kind.map_or(1.0, |t| t.attraction_strength),
				}
			})
			.collect();

		Self { nodes, links }
	}

	/// JSON for hand-off to a JS renderer.
	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}
}

/// The two chart series.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
	/// New infections per tick.
	pub new_infections: Vec<SeriesPoint>,
	/// Cumulative infected count per tick.
	pub total_infected: Vec<SeriesPoint>,
}

impl From<&TimeSeriesTracker> for ChartData {
	fn from(series: &TimeSeriesTracker) -> Self {
		Self {
			new_infections: series.new_infections().to_vec(),
			total_infected: series.total_infected().to_vec(),
		}
	}
}

impl ChartData {
	/// JSON for hand-off to a JS chart.
	pub fn to_json(&self) -> serde_json::Result<String> {
		serde_json::to_string(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::simulation::types::{Connection, ConnectionValue, Entity};

	#[test]
	fn colors_follow_status_and_type() {
		let config = Configuration::default();
		let graph = ContactGraph::new(
			vec![Entity::new(true), Entity::new(false)],
			vec![Connection::new(0, 1, ConnectionValue::Contagious, 3)],
		);
		let data = GraphData::from_graph(&graph, &config);
		assert_eq!(data.nodes[0].color, "#ff0000");
		assert_eq!(data.nodes[1].color, "#808080");
		assert_eq!(data.links[0].value, 3);
		assert_eq!(data.links[0].color, "#808080");
		assert_eq!(data.links[0].strength, 0.1);
	}

	#[test]
	fn blank_type_color_uses_palette() {
		let mut config = Configuration::default();
		config.connection_types[1].color.clear();
		let graph = ContactGraph::new(
			vec![Entity::new(false), Entity::new(false)],
			vec![Connection::new(0, 1, ConnectionValue::Normal, 1)],
		);
		let data = GraphData::from_graph(&graph, &config);
		assert_eq!(data.links[0].color, COLORS[1]);
		assert_eq!(data.links[0].value, 1);
	}

	#[test]
	fn chart_json_uses_xy_points() {
		let mut series = TimeSeriesTracker::new(2);
		series.record_tick(1, 3);
		let json = ChartData::from(&series).to_json().unwrap();
		assert_eq!(
			json,
			r#"{"newInfections":[{"x":0,"y":0},{"x":1,"y":1}],"totalInfected":[{"x":0,"y":2},{"x":1,"y":3}]}"#
		);
	}
}
