mod config;
mod contagion;
mod driver;
mod error;
mod events;
mod graph;
mod random;
mod restrictions;
mod series;
mod session;
mod snapshot;
mod types;

pub use config::{
	Configuration, ConnectionType, InfectedPercentage, NodeColors, NodeCountRange, Restriction,
	Scenario, ScenarioSelection, SpreadRate,
};
pub use contagion::{ContagionEngine, TickOutcome, effective_probability, spread};
pub use driver::{DEFAULT_TICK_INTERVAL, IntervalDriver, ManualDriver, PeriodicDriver};
pub use error::{ConfigError, SessionError};
pub use events::{
	EventBus, EventKind, ListenerId, SessionEvent, StartedEvent, StoppedEvent, UnknownEvent,
	UpdatedEvent,
};
pub use graph::{GraphBuilder, prune_isolates};
pub use random::{FnRandom, RandomSource, SeededRandom};
pub use restrictions::RestrictionResolver;
pub use series::{SeriesPoint, TimeSeriesTracker};
pub use session::{SessionState, SimulationSession};
pub use snapshot::{ChartData, GraphData, GraphLink, GraphNode};
pub use types::{Connection, ConnectionValue, ContactGraph, Entity};
