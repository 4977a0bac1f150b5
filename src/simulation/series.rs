use serde::Serialize;

/// One chart sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
	/// Tick number.
	#[serde(rename = "x")]
	pub tick: u32,
	/// Sampled count.
	#[serde(rename = "y")]
	pub count: usize,
}

impl SeriesPoint {
	/// Creates a sample.
	pub fn new(tick: u32, count: usize) -> Self {
		Self { tick, count }
	}
}

/// Per-tick new-infection and cumulative-infection series.
///
/// Both series start with a point for tick 0 describing the population before
/// the first tick, and grow by exactly one point per recorded tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesTracker {
	tick: u32,
	new_infections: Vec<SeriesPoint>,
	total_infected: Vec<SeriesPoint>,
}

impl TimeSeriesTracker {
	/// Creates a tracker seeded with the pre-simulation infected count.
	pub fn new(initial_infected: usize) -> Self {
		Self {
			tick: 0,
			new_infections: vec![SeriesPoint::new(0, 0)],
			total_infected: vec![SeriesPoint::new(0, initial_infected)],
		}
	}

	/// Drops every recorded tick and re-seeds tick 0.
	pub fn reset(&mut self, initial_infected: usize) {
		*self = Self::new(initial_infected);
	}

	/// Appends one tick's outcome.
	pub fn record_tick(&mut self, new_infections: usize, total_infected: usize) {
		self.tick += 1;
		self.new_infections.push(SeriesPoint::new(self.tick, new_infections));
		self.total_infected.push(SeriesPoint::new(self.tick, total_infected));
	}

	/// Ticks recorded since the last reset.
	pub fn tick(&self) -> u32 {
		self.tick
	}

	/// New infections per tick.
	pub fn new_infections(&self) -> &[SeriesPoint] {
		&self.new_infections
	}

	/// Cumulative infected count per tick.
	pub fn total_infected(&self) -> &[SeriesPoint] {
		&self.total_infected
	}

	/// New infections of the most recent tick.
	pub fn last_new_infections(&self) -> usize {
		self.new_infections.last().map_or(0, |p| p.count)
	}
}

impl Default for TimeSeriesTracker {
	fn default() -> Self {
		Self::new(0)
	}
}
