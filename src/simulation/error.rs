use thiserror::Error;

/// Reasons a configuration is rejected at session construction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
	/// JSON could not be parsed into the configuration schema.
	#[error("configuration JSON is malformed: {0}")]
	Malformed(String),
	/// No connection types configured.
	#[error("at least one connection type is required")]
	NoConnectionTypes,
	/// Two items of the same kind share an id.
	#[error("duplicate {what} id '{id}'")]
	DuplicateId {
		/// Kind of item, such as `connection type`.
		what: &'static str,
		/// The repeated id.
		id: String,
	},
	/// Base probability outside `[0, 1]` or not finite.
	#[error("connection type '{id}' has base probability {value}, expected a value in [0, 1]")]
	BaseProbability {
		/// Connection type id.
		id: String,
		/// Rejected probability.
		value: f64,
	},
	/// Attraction strength outside `[0, 2]` or not finite.
	#[error("connection type '{id}' has attraction strength {value}, expected a value in [0, 2]")]
	AttractionStrength {
		/// Connection type id.
		id: String,
		/// Rejected strength.
		value: f64,
	},
	/// Spread-rate value negative or not finite.
	#[error("spread rate '{id}' has value {value}, expected a finite non-negative number")]
	SpreadRate {
		/// Spread-rate id.
		id: String,
		/// Rejected value.
		value: f64,
	},
	/// Restriction multiplier negative or not finite.
	#[error("restriction '{restriction}' has multiplier {value} for '{connection_type}', expected a finite non-negative number")]
	Multiplier {
		/// Restriction id.
		restriction: String,
		/// Connection type the multiplier applies to.
		connection_type: String,
		/// Rejected multiplier.
		value: f64,
	},
	/// Restriction multiplier keyed by a type that does not exist.
	#[error("restriction '{restriction}' references unknown connection type '{connection_type}'")]
	UnknownConnectionType {
		/// Restriction id.
		restriction: String,
		/// The unknown connection type id.
		connection_type: String,
	},
	/// Scenario names a spread rate that does not exist.
	#[error("scenario '{scenario}' references unknown spread rate '{spread_rate}'")]
	UnknownSpreadRate {
		/// Scenario label.
		scenario: String,
		/// The unknown spread-rate id.
		spread_rate: String,
	},
	/// `nodeCount.min` exceeds `nodeCount.max`.
	#[error("node count range {min}..{max} is empty")]
	NodeCountRange {
		/// Lower bound.
		min: usize,
		/// Upper bound.
		max: usize,
	},
	/// Infected percentage bounds out of `[0, 100]` or default out of bounds.
	#[error("infected percentage bounds {min}..{max} (default {default}) are invalid")]
	InfectedPercentage {
		/// Lower bound.
		min: u32,
		/// Upper bound.
		max: u32,
		/// Default percentage.
		default: u32,
	},
}

/// Errors from driving a [`SimulationSession`](super::SimulationSession).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
	/// The configuration was rejected.
	#[error("invalid configuration: {0}")]
	Config(#[from] ConfigError),
	/// Operation requires an idle session.
	#[error("the simulation is running; stop it first")]
	Running,
	/// Initial infected fraction outside `[0, 1]`.
	#[error("infected fraction {0} is outside [0, 1]")]
	InfectedFraction(f64),
	/// Spread rate negative or not finite.
	#[error("spread rate {0} must be finite and non-negative")]
	SpreadRate(f64),
	/// Scenario index out of range.
	#[error("no scenario at index {0}")]
	UnknownScenario(usize),
	/// The periodic driver could not schedule ticks.
	#[error("could not start the tick driver: {0}")]
	Driver(String),
}
