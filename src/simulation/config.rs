//! Configuration schema consumed by the simulation.
//!
//! The configuration is authored elsewhere and handed over as JSON using the
//! camelCase field names below. It is validated once, when a session is
//! constructed, and never mutated afterwards.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Bounds of the node-count slider. A requested count of `0` means "pick one
/// at random".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCountRange {
	/// Lower bound.
	pub min: usize,
	/// Upper bound.
	pub max: usize,
}

/// Bounds and default of the infected-percentage slider, in whole percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfectedPercentage {
	/// Lower bound.
	pub min: u32,
	/// Upper bound.
	pub max: u32,
	/// Initial slider position.
	pub default: u32,
}

/// A category of contact, e.g. family or strangers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionType {
	/// Stable identifier referenced by restriction multipliers.
	pub id: String,
	/// Display label.
	pub label: String,
	/// Line color used by renderers.
	pub color: String,
	/// Per-tick transmission probability before restrictions.
	pub base_probability: f64,
	/// Link strength used by force layouts, in `[0, 2]`.
	pub attraction_strength: f64,
}

/// A selectable virus aggressiveness.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpreadRate {
	/// Identifier referenced by scenarios.
	pub id: String,
	/// Display label.
	pub label: String,
	/// Multiplier applied to every transmission probability.
	pub value: f64,
}

/// A measure that scales the transmission probability of some connection
/// types.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Restriction {
	/// Identifier used to activate the restriction.
	pub id: String,
	/// Display label.
	pub label: String,
	/// Hover text.
	#[serde(default)]
	pub tooltip: String,
	/// Connection type id to factor. Types without an entry are unaffected.
	#[serde(default)]
	pub multipliers: BTreeMap<String, f64>,
}

/// A predefined combination of spread rate and restrictions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
	/// Display label.
	pub label: String,
	/// Spread-rate id; `None` (or empty) keeps the current rate.
	#[serde(default)]
	pub spread_rate: Option<String>,
	/// Restriction ids to activate.
	#[serde(default)]
	pub restrictions: Vec<String>,
}

/// Colors for healthy and infected nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeColors {
	/// Fill for entities that are not infected.
	pub healthy: String,
	/// Fill for infected entities.
	pub infected: String,
}

impl Default for NodeColors {
	fn default() -> Self {
		Self {
			healthy: "#808080".into(),
			infected: "#ff0000".into(),
		}
	}
}

fn default_true() -> bool {
	true
}

/// Complete simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
	/// Whether the host page shows the introductory header.
	#[serde(default = "default_true")]
	pub show_header: bool,
	/// Node-count slider bounds.
	pub node_count: NodeCountRange,
	/// Infected-percentage slider bounds.
	pub infected_percentage: InfectedPercentage,
	/// Contact categories, indexed by [`Connection::kind`](super::Connection::kind).
	pub connection_types: Vec<ConnectionType>,
	/// Selectable spread rates.
	pub spread_rates: Vec<SpreadRate>,
	/// Available restrictions, in the order their multipliers compose.
	#[serde(default)]
	pub restrictions: Vec<Restriction>,
	/// Predefined scenarios.
	#[serde(default)]
	pub scenarios: Vec<Scenario>,
	/// Node fill colors.
	#[serde(default)]
	pub node_colors: NodeColors,
}

/// Spread rate and restrictions a scenario resolves to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenarioSelection {
	/// Rate value, or `None` when the scenario keeps the current rate.
	pub spread_rate: Option<f64>,
	/// Known restriction ids, in configured order.
	pub restrictions: Vec<String>,
}

impl Configuration {
	/// Parses and validates a configuration from JSON.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: Self =
			serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
		config.validate()?;
		Ok(config)
	}

	/// Serializes the configuration back to JSON.
	pub fn to_json(&self) -> Result<String, ConfigError> {
		serde_json::to_string(self).map_err(|e| ConfigError::Malformed(e.to_string()))
	}

	/// Checks every rule that would otherwise make the probability table
	/// inconsistent.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.node_count.min > self.node_count.max {
			return Err(ConfigError::NodeCountRange {
				min: self.node_count.min,
				max: self.node_count.max,
			});
		}

		let InfectedPercentage { min, max, default } = self.infected_percentage;
		if min > max || max > 100 || default < min || default > max {
			return Err(ConfigError::InfectedPercentage { min, max, default });
		}

		if self.connection_types.is_empty() {
			return Err(ConfigError::NoConnectionTypes);
		}
		unique_ids("connection type", self.connection_types.iter().map(|t| &t.id))?;
		for t in &self.connection_types {
			if !(0.0..=1.0).contains(&t.base_probability) {
				return Err(ConfigError::BaseProbability {
					id: t.id.clone(),
					value: t.base_probability,
				});
			}
			if !(0.0..=2.0).contains(&t.attraction_strength) {
				return Err(ConfigError::AttractionStrength {
					id: t.id.clone(),
					value: t.attraction_strength,
				});
			}
		}

		unique_ids("spread rate", self.spread_rates.iter().map(|r| &r.id))?;
		for rate in &self.spread_rates {
			if !non_negative(rate.value) {
				return Err(ConfigError::SpreadRate {
					id: rate.id.clone(),
					value: rate.value,
				});
			}
		}

		unique_ids("restriction", self.restrictions.iter().map(|r| &r.id))?;
		for restriction in &self.restrictions {
			for (type_id, &factor) in &restriction.multipliers {
				if self.connection_type_index(type_id).is_none() {
					return Err(ConfigError::UnknownConnectionType {
						restriction: restriction.id.clone(),
						connection_type: type_id.clone(),
					});
				}
				if !non_negative(factor) {
					return Err(ConfigError::Multiplier {
						restriction: restriction.id.clone(),
						connection_type: type_id.clone(),
						value: factor,
					});
				}
			}
		}

		for scenario in &self.scenarios {
			if let Some(rate_id) = scenario.spread_rate.as_deref().filter(|id| !id.is_empty()) {
				if self.spread_rate(rate_id).is_none() {
					return Err(ConfigError::UnknownSpreadRate {
						scenario: scenario.label.clone(),
						spread_rate: rate_id.to_string(),
					});
				}
			}
		}

		Ok(())
	}

	/// Base probability of each connection type, by index.
	pub fn base_probabilities(&self) -> Vec<f64> {
		self.connection_types
			.iter()
			.map(|t| t.base_probability)
			.collect()
	}

	/// Position of a connection type id.
	pub fn connection_type_index(&self, id: &str) -> Option<usize> {
		self.connection_types.iter().position(|t| t.id == id)
	}

	/// Value of the spread rate with the given id.
	pub fn spread_rate(&self, id: &str) -> Option<f64> {
		self.spread_rates
			.iter()
			.find(|r| r.id == id)
			.map(|r| r.value)
	}

	/// Rate preselected before the user picks one: the second entry ("normal"
	/// in the shipped configuration), else the first, else `1.0`.
	pub fn default_spread_rate(&self) -> f64 {
		self.spread_rates
			.get(1)
			.or_else(|| self.spread_rates.first())
			.map_or(1.0, |r| r.value)
	}

	/// Default infected percentage as a fraction in `[0, 1]`.
	pub fn default_infected_fraction(&self) -> f64 {
		f64::from(self.infected_percentage.default) / 100.0
	}

	/// Resolves a scenario to a concrete rate and set of known restriction ids.
	pub fn resolve_scenario(&self, index: usize) -> Option<ScenarioSelection> {
		let scenario = self.scenarios.get(index)?;
		let spread_rate = scenario
			.spread_rate
			.as_deref()
			.and_then(|id| self.spread_rate(id));
		let restrictions = self
			.restrictions
			.iter()
			.filter(|r| scenario.restrictions.contains(&r.id))
			.map(|r| r.id.clone())
			.collect();
		Some(ScenarioSelection {
			spread_rate,
			restrictions,
		})
	}
}

fn non_negative(value: f64) -> bool {
	value.is_finite() && value >= 0.0
}

fn unique_ids<'a>(
	what: &'static str,
	ids: impl Iterator<Item = &'a String>,
) -> Result<(), ConfigError> {
	let mut seen = HashSet::new();
	for id in ids {
		if !seen.insert(id.as_str()) {
			return Err(ConfigError::DuplicateId {
				what,
				id: id.clone(),
			});
		}
	}
	Ok(())
}

fn connection_type(id: &str, label: &str, color: &str, p: f64, strength: f64) -> ConnectionType {
	ConnectionType {
		id: id.into(),
		label: label.into(),
		color: color.into(),
		base_probability: p,
		attraction_strength: strength,
	}
}

fn restriction(id: &str, label: &str, tooltip: &str, multipliers: &[(&str, f64)]) -> Restriction {
	Restriction {
		id: id.into(),
		label: label.into(),
		tooltip: tooltip.into(),
		multipliers: multipliers
			.iter()
			.map(|&(k, v)| (k.to_string(), v))
			.collect(),
	}
}

fn scenario(label: &str, spread_rate: Option<&str>, restrictions: &[&str]) -> Scenario {
	Scenario {
		label: label.into(),
		spread_rate: spread_rate.map(Into::into),
		restrictions: restrictions.iter().map(|r| r.to_string()).collect(),
	}
}

const ALL_RESTRICTIONS: &[&str] = &[
	"respirators",
	"testing",
	"quarantine",
	"distancing",
	"homeoffice",
	"hobbies",
];

impl Default for Configuration {
	/// The configuration shipped with the simulation.
	fn default() -> Self {
		Self {
			show_header: true,
			node_count: NodeCountRange { min: 0, max: 100 },
			infected_percentage: InfectedPercentage {
				min: 0,
				max: 100,
				default: 10,
			},
			spread_rates: vec![
				SpreadRate {
					id: "spreadLow".into(),
					label: "Low".into(),
					value: 0.5,
				},
				SpreadRate {
					id: "spreadMedium".into(),
					label: "Normal".into(),
					value: 1.0,
				},
				SpreadRate {
					id: "spreadHigh".into(),
					label: "High".into(),
					value: 2.0,
				},
			],
			connection_types: vec![
				connection_type("family", "Family", "#00ff00", 0.1, 0.7),
				connection_type("friends", "Friends", "#800080", 0.05, 0.7),
				connection_type("workSchool", "Work/School", "#0000ff", 0.05, 0.7),
				connection_type("strangers", "Strangers", "#808080", 0.01, 0.1),
			],
			node_colors: NodeColors::default(),
			restrictions: vec![
				restriction(
					"respirators",
					"Respirator usage in public spaces",
					"Friends - majority won't follow this restriction.\nSchool/work - helps a bit, people still sit in the same enclosed spaces and are more prone to wear respirators incorrectly at times.\nStrangers - more protected around infected people.",
					&[("workSchool", 0.8), ("strangers", 0.5), ("friends", 0.95)],
				),
				restriction(
					"testing",
					"Antigen testing in schools and workplaces 2x per week",
					"School/work - most cases get caught in time.",
					&[("workSchool", 0.5)],
				),
				restriction(
					"quarantine",
					"2 weeks of quarantine after a positive test",
					"Family - minimal effect due to sharing the same living space.\nFriends - mostly eliminated, but could've spread before the test.\nSchool/work - mostly eliminated, but could've spread before the test.\nStrangers - very unlikely to meet an infectious person.",
					&[
						("family", 0.95),
						("friends", 0.3),
						("workSchool", 0.3),
						("strangers", 0.1),
					],
				),
				restriction(
					"distancing",
					"Social distancing in public spaces",
					"Friends - majority won't follow this restriction.\nStrangers - less interactions with people and safer distances.",
					&[("strangers", 0.5), ("friends", 0.95)],
				),
				restriction(
					"homeoffice",
					"Home office and online school",
					"Family - more time spent around them.\nSchool/work - practically no in-person interactions.\nStrangers - people travel less.",
					&[("family", 1.3), ("workSchool", 0.1), ("strangers", 0.3)],
				),
				restriction(
					"hobbies",
					"Restrictions on hobbies and sports",
					"Friends - less activities to do outside, won't stop them from hanging out.\nStrangers - practically no interactions in movies, clubs, etc.",
					&[("friends", 0.7), ("strangers", 0.5)],
				),
			],
			scenarios: vec![
				scenario("None", None, &[]),
				scenario("Non-aggressive virus, no restrictions", Some("spreadLow"), &[]),
				scenario(
					"Non-aggressive virus, all restrictions",
					Some("spreadLow"),
					ALL_RESTRICTIONS,
				),
				scenario("Normal virus, no restrictions", Some("spreadMedium"), &[]),
				scenario(
					"Normal virus, moderate restrictions",
					Some("spreadMedium"),
					&["respirators", "quarantine", "distancing"],
				),
				scenario(
					"Normal virus, all restrictions",
					Some("spreadMedium"),
					ALL_RESTRICTIONS,
				),
				scenario("Very aggressive virus, no restrictions", Some("spreadHigh"), &[]),
				scenario(
					"Very aggressive virus, all restrictions",
					Some("spreadHigh"),
					ALL_RESTRICTIONS,
				),
			],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_config_is_valid() {
		let config = Configuration::default();
		assert_eq!(config.validate(), Ok(()));
		assert_eq!(config.base_probabilities(), vec![0.1, 0.05, 0.05, 0.01]);
		assert_eq!(config.default_spread_rate(), 1.0);
		assert!((config.default_infected_fraction() - 0.1).abs() < 1e-12);
	}

	#[test]
	fn parses_editor_json() {
		let json = r##"{
			"nodeCount": { "min": 0, "max": 50 },
			"infectedPercentage": { "min": 0, "max": 100, "default": 25 },
			"connectionTypes": [
				{ "id": "family", "label": "Family", "color": "#00ff00", "baseProbability": 0.2, "attractionStrength": 1.0 }
			],
			"spreadRates": [{ "id": "normal", "label": "Normal", "value": 1 }],
			"restrictions": [
				{ "id": "masks", "label": "Masks", "tooltip": "", "multipliers": { "family": 0.5 } }
			],
			"scenarios": [{ "label": "Masks only", "spreadRate": null, "restrictions": ["masks"] }]
		}"##;
		let config = Configuration::from_json(json).unwrap();
		assert!(config.show_header);
		assert_eq!(config.node_colors, NodeColors::default());
		assert_eq!(config.connection_types[0].base_probability, 0.2);
		assert_eq!(config.restrictions[0].multipliers["family"], 0.5);
		assert_eq!(config.scenarios[0].spread_rate, None);
	}

	#[test]
	fn rejects_malformed_json() {
		assert!(matches!(
			Configuration::from_json("{ not json"),
			Err(ConfigError::Malformed(_))
		));
	}

	#[test]
	fn rejects_out_of_range_probability() {
		let mut config = Configuration::default();
		config.connection_types[1].base_probability = 1.5;
		assert_eq!(
			config.validate(),
			Err(ConfigError::BaseProbability {
				id: "friends".into(),
				value: 1.5
			})
		);

		config.connection_types[1].base_probability = f64::NAN;
		assert!(matches!(
			config.validate(),
			Err(ConfigError::BaseProbability { .. })
		));
	}

	#[test]
	fn rejects_negative_or_nan_multiplier() {
		let mut config = Configuration::default();
		config.restrictions[0]
			.multipliers
			.insert("family".into(), -0.5);
		assert!(matches!(config.validate(), Err(ConfigError::Multiplier { .. })));

		config.restrictions[0]
			.multipliers
			.insert("family".into(), f64::NAN);
		assert!(matches!(config.validate(), Err(ConfigError::Multiplier { .. })));
	}

	#[test]
	fn rejects_multiplier_for_missing_type() {
		let mut config = Configuration::default();
		config.restrictions[1]
			.multipliers
			.insert("pets".into(), 0.5);
		assert_eq!(
			config.validate(),
			Err(ConfigError::UnknownConnectionType {
				restriction: "testing".into(),
				connection_type: "pets".into(),
			})
		);
	}

	#[test]
	fn rejects_duplicate_ids_and_empty_types() {
		let mut config = Configuration::default();
		let dup = config.connection_types[0].clone();
		config.connection_types.push(dup);
		assert!(matches!(
			config.validate(),
			Err(ConfigError::DuplicateId {
				what: "connection type",
				..
			})
		));

		config.connection_types.clear();
		assert_eq!(config.validate(), Err(ConfigError::NoConnectionTypes));
	}

	#[test]
	fn rejects_bad_slider_bounds() {
		let mut config = Configuration::default();
		config.node_count = NodeCountRange { min: 10, max: 5 };
		assert!(matches!(config.validate(), Err(ConfigError::NodeCountRange { .. })));

		let mut config = Configuration::default();
		config.infected_percentage.default = 101;
		assert!(matches!(
			config.validate(),
			Err(ConfigError::InfectedPercentage { .. })
		));
	}

	#[test]
	fn rejects_scenario_with_unknown_rate() {
		let mut config = Configuration::default();
		config.scenarios[1].spread_rate = Some("spreadExtreme".into());
		assert!(matches!(
			config.validate(),
			Err(ConfigError::UnknownSpreadRate { .. })
		));
	}

	#[test]
	fn resolves_scenarios() {
		let config = Configuration::default();

		let none = config.resolve_scenario(0).unwrap();
		assert_eq!(none, ScenarioSelection::default());

		let moderate = config.resolve_scenario(4).unwrap();
		assert_eq!(moderate.spread_rate, Some(1.0));
		assert_eq!(
			moderate.restrictions,
			vec!["respirators", "quarantine", "distancing"]
		);

		let all = config.resolve_scenario(7).unwrap();
		assert_eq!(all.spread_rate, Some(2.0));
		assert_eq!(all.restrictions.len(), config.restrictions.len());

		assert_eq!(config.resolve_scenario(99), None);
	}

	#[test]
	fn scenario_drops_unknown_restrictions() {
		let mut config = Configuration::default();
		config.scenarios[1].restrictions = vec!["curfew".into(), "testing".into()];
		let selection = config.resolve_scenario(1).unwrap();
		assert_eq!(selection.restrictions, vec!["testing"]);
	}

	#[test]
	fn json_round_trip_keeps_schema_names() {
		let json = Configuration::default().to_json().unwrap();
		assert!(json.contains("\"baseProbability\""));
		assert!(json.contains("\"nodeColors\""));
		assert_eq!(Configuration::from_json(&json).unwrap(), Configuration::default());
	}
}
