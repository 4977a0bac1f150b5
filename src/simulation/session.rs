use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use log::{debug, error, info, warn};

use super::config::Configuration;
use super::contagion::{ContagionEngine, TickOutcome};
use super::driver::{DEFAULT_TICK_INTERVAL, PeriodicDriver};
use super::error::SessionError;
use super::events::{
	EventBus, EventKind, ListenerId, SessionEvent, StartedEvent, StoppedEvent, UpdatedEvent,
};
use super::graph::GraphBuilder;
use super::random::RandomSource;
use super::restrictions::RestrictionResolver;
use super::series::TimeSeriesTracker;
use super::snapshot::{ChartData, GraphData};
use super::types::ContactGraph;

/// Whether a periodic driver is ticking the session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
	/// No run in progress; the session may be reconfigured.
	#[default]
	Idle,
	/// The driver is ticking.
	Running,
}

struct SessionCore<R> {
	config: Configuration,
	random: R,
	graph: ContactGraph,
	resolver: RestrictionResolver,
	engine: ContagionEngine,
	series: TimeSeriesTracker,
	state: SessionState,
}

impl<R: RandomSource> SessionCore<R> {
	fn rebuild(&mut self, node_count: usize, infected_fraction: f64) {
		let type_count = self.config.connection_types.len();
		let range = self.config.node_count;
		self.graph = GraphBuilder::new(&mut self.random, type_count).build(
			node_count,
			range.min,
			range.max,
			infected_fraction,
		);
		self.series.reset(self.graph.infected_count());
	}

	fn stopped_event(&self) -> StoppedEvent {
		StoppedEvent {
			population_size: self.graph.population(),
			final_infected_count: self.graph.infected_count(),
			duration: self.series.tick(),
			new_infection_series: self.series.new_infections().to_vec(),
			total_infected_series: self.series.total_infected().to_vec(),
		}
	}

	/// One driver tick. `None` when not running.
	fn step(&mut self) -> Option<(TickOutcome, SessionEvent)> {
		if self.state != SessionState::Running {
			return None;
		}
		let outcome = self.engine.tick(&mut self.graph, &mut self.random);
		let event = match outcome {
			TickOutcome::Spread(new_infections) => {
				let total_infected = self.graph.infected_count();
				self.series.record_tick(new_infections, total_infected);
				debug!(
					"tick {}: {new_infections} new, {total_infected}/{} infected",
					self.series.tick(),
					self.graph.population()
				);
				SessionEvent::Updated(UpdatedEvent {
					population_size: self.graph.population(),
					new_infections,
					total_infected,
					tick: self.series.tick(),
				})
			}
			TickOutcome::Exhausted => {
				self.state = SessionState::Idle;
				info!(
					"entire population infected after {} ticks; simulation finished",
					self.series.tick()
				);
				SessionEvent::Stopped(self.stopped_event())
			}
		};
		Some((outcome, event))
	}
}

/// Orchestrates graph building, restriction resolution, ticking and the
/// time series over the configure → start → tick → stop lifecycle.
///
/// The session is a cheap handle over shared single-threaded state; clones
/// drive the same simulation. Events are dispatched after the state borrow is
/// released, so listeners may call back into the session.
pub struct SimulationSession<R, D> {
	core: Rc<RefCell<SessionCore<R>>>,
	driver: Rc<RefCell<D>>,
	events: Rc<EventBus>,
	period: Duration,
}

impl<R, D> Clone for SimulationSession<R, D> {
	fn clone(&self) -> Self {
		Self {
			core: Rc::clone(&self.core),
			driver: Rc::clone(&self.driver),
			events: Rc::clone(&self.events),
			period: self.period,
		}
	}
}

impl<R, D> SimulationSession<R, D>
where
	R: RandomSource + 'static,
	D: PeriodicDriver + 'static,
{
	/// Validates `config` and builds the initial population: a random size
	/// and the configured default infected percentage.
	pub fn new(config: Configuration, random: R, driver: D) -> Result<Self, SessionError> {
		config.validate()?;
		let resolver = RestrictionResolver::new(&config);
		let engine = ContagionEngine::new(
			resolver.probabilities().to_vec(),
			config.default_spread_rate(),
		);
		let initial_fraction = config.default_infected_fraction();
		let mut core = SessionCore {
			config,
			random,
			graph: ContactGraph::default(),
			resolver,
			engine,
			series: TimeSeriesTracker::default(),
			state: SessionState::Idle,
		};
		core.rebuild(0, initial_fraction);
		info!(
			"session created with {} entities ({} infected)",
			core.graph.population(),
			core.graph.infected_count()
		);

		Ok(Self {
			core: Rc::new(RefCell::new(core)),
			driver: Rc::new(RefCell::new(driver)),
			events: Rc::new(EventBus::new()),
			period: DEFAULT_TICK_INTERVAL,
		})
	}

	/// Sets the real-time interval between ticks for subsequent runs.
	pub fn with_period(mut self, period: Duration) -> Self {
		self.period = period;
		self
	}

	/// Discards the current population and builds a new one. `node_count` of
	/// `0` picks a random size; `infected_fraction` is in `[0, 1]`.
	pub fn configure(&self, node_count: usize, infected_fraction: f64) -> Result<(), SessionError> {
		if !(0.0..=1.0).contains(&infected_fraction) {
			return Err(SessionError::InfectedFraction(infected_fraction));
		}
		let mut core = self.core.borrow_mut();
		if core.state == SessionState::Running {
			warn!("configure ignored while running");
			return Err(SessionError::Running);
		}
		core.rebuild(node_count, infected_fraction);
		info!(
			"configured {} entities, {} connections, {} infected",
			core.graph.population(),
			core.graph.connections.len(),
			core.graph.infected_count()
		);
		Ok(())
	}

	/// Resolves probabilities for `restriction_ids` and starts ticking.
	pub fn start<S: AsRef<str>>(
		&self,
		spread_rate: f64,
		restriction_ids: &[S],
	) -> Result<(), SessionError> {
		if !spread_rate.is_finite() || spread_rate < 0.0 {
			return Err(SessionError::SpreadRate(spread_rate));
		}

		let started = {
			let mut core = self.core.borrow_mut();
			if core.state == SessionState::Running {
				warn!("start ignored; already running");
				return Err(SessionError::Running);
			}
			let core = &mut *core;
			let probabilities = core.resolver.apply(restriction_ids);
			core.engine.set_parameters(probabilities, spread_rate);
			core.state = SessionState::Running;
			StartedEvent {
				population_size: core.graph.population(),
				initial_infected_count: core.graph.infected_count(),
				spread_rate,
				probabilities: core.engine.probabilities().to_vec(),
			}
		};

		let core = Rc::downgrade(&self.core);
		let driver = Rc::downgrade(&self.driver);
		let events = Rc::downgrade(&self.events);
		let scheduled = self.driver.borrow_mut().start(
			self.period,
			Box::new(move || run_tick(&core, &driver, &events)),
		);
		if let Err(e) = scheduled {
			error!("simulation not started: {e}");
			self.core.borrow_mut().state = SessionState::Idle;
			return Err(e);
		}

		info!(
			"simulation started: rate {spread_rate}, probabilities {:?}",
			started.probabilities
		);
		self.events.emit(&SessionEvent::Started(started));
		Ok(())
	}

	/// Starts with the spread rate and restrictions of a configured scenario.
	/// A scenario without a rate keeps the current one.
	pub fn start_scenario(&self, index: usize) -> Result<(), SessionError> {
		let (selection, current_rate) = {
			let core = self.core.borrow();
			let selection = core
				.config
				.resolve_scenario(index)
				.ok_or(SessionError::UnknownScenario(index))?;
			(selection, core.engine.spread_rate())
		};
		let rate = selection.spread_rate.unwrap_or(current_rate);
		self.start(rate, selection.restrictions.as_slice())
	}

	/// Runs one tick right away. Returns `None` unless running.
	pub fn tick(&self) -> Option<TickOutcome> {
		tick_shared(&self.core, &self.driver, &self.events)
	}

	/// Cancels the driver and emits the final series. Returns `false` (and
	/// does nothing) when already idle.
	pub fn stop(&self) -> bool {
		let stopped = {
			let mut core = self.core.borrow_mut();
			if core.state != SessionState::Running {
				return false;
			}
			core.state = SessionState::Idle;
			core.stopped_event()
		};
		self.driver.borrow_mut().cancel();
		info!(
			"simulation stopped after {} ticks: {}/{} infected",
			stopped.duration, stopped.final_infected_count, stopped.population_size
		);
		self.events.emit(&SessionEvent::Stopped(stopped));
		true
	}

	/// Current lifecycle state.
	pub fn state(&self) -> SessionState {
		self.core.borrow().state
	}

	/// Whether a run is in progress.
	pub fn is_running(&self) -> bool {
		self.state() == SessionState::Running
	}

	/// Registers a listener for `kind`.
	pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> ListenerId
	where
		F: Fn(&SessionEvent) -> anyhow::Result<()> + 'static,
	{
		self.events.subscribe(kind, listener)
	}

	/// Registers a listener by event name; `None` for an unknown name.
	pub fn subscribe_named<F>(&self, name: &str, listener: F) -> Option<ListenerId>
	where
		F: Fn(&SessionEvent) -> anyhow::Result<()> + 'static,
	{
		self.events.subscribe_named(name, listener)
	}

	/// Removes a listener.
	pub fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
		self.events.unsubscribe(kind, id)
	}

	/// Removes a listener by event name.
	pub fn unsubscribe_named(&self, name: &str, id: ListenerId) -> bool {
		self.events.unsubscribe_named(name, id)
	}

	/// Runs `f` against the current graph.
	pub fn with_graph<T>(&self, f: impl FnOnce(&ContactGraph) -> T) -> T {
		f(&self.core.borrow().graph)
	}

	/// Copy of the current graph.
	pub fn graph(&self) -> ContactGraph {
		self.with_graph(|g| g.clone())
	}

	/// Graph decorated for a force-layout renderer.
	pub fn graph_data(&self) -> GraphData {
		let core = self.core.borrow();
		GraphData::from_graph(&core.graph, &core.config)
	}

	/// Both chart series.
	pub fn chart_data(&self) -> ChartData {
		ChartData::from(&self.core.borrow().series)
	}

	/// Copy of the time series.
	pub fn series(&self) -> TimeSeriesTracker {
		self.core.borrow().series.clone()
	}

	/// Active probability per connection type.
	pub fn probabilities(&self) -> Vec<f64> {
		self.core.borrow().engine.probabilities().to_vec()
	}

	/// Spread-rate multiplier of the current or last run.
	pub fn spread_rate(&self) -> f64 {
		self.core.borrow().engine.spread_rate()
	}

	/// Copy of the configuration.
	pub fn config(&self) -> Configuration {
		self.core.borrow().config.clone()
	}
}

#[cfg(target_arch = "wasm32")]
impl SimulationSession<super::random::SeededRandom, super::driver::IntervalDriver> {
	/// Session seeded from the browser and ticked by `setInterval`.
	pub fn in_browser(config: Configuration) -> Result<Self, SessionError> {
		Self::new(
			config,
			super::random::SeededRandom::from_browser(),
			super::driver::IntervalDriver::new(),
		)
	}
}

fn run_tick<R: RandomSource, D: PeriodicDriver>(
	core: &Weak<RefCell<SessionCore<R>>>,
	driver: &Weak<RefCell<D>>,
	events: &Weak<EventBus>,
) {
	let (Some(core), Some(driver), Some(events)) =
		(core.upgrade(), driver.upgrade(), events.upgrade())
	else {
		return;
	};
	tick_shared(&core, &driver, &events);
}

fn tick_shared<R: RandomSource, D: PeriodicDriver>(
	core: &RefCell<SessionCore<R>>,
	driver: &RefCell<D>,
	events: &EventBus,
) -> Option<TickOutcome> {
	let (outcome, event) = core.borrow_mut().step()?;
	if outcome.is_terminal() {
		driver.borrow_mut().cancel();
	}
	events.emit(&event);
	Some(outcome)
}
