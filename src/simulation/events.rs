use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use log::error;
use serde::Serialize;

use super::series::SeriesPoint;

/// Names of the notifications a session emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
	/// A run began.
	Started,
	/// A tick completed.
	Updated,
	/// A run ended.
	Stopped,
}

impl EventKind {
	/// Every kind, in lifecycle order.
	pub const ALL: [EventKind; 3] = [Self::Started, Self::Updated, Self::Stopped];

	/// Canonical lowercase name.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Started => "started",
			Self::Updated => "updated",
			Self::Stopped => "stopped",
		}
	}

	fn slot(self) -> usize {
		self as usize
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Unknown event name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownEvent(pub String);

impl fmt::Display for UnknownEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown event '{}'", self.0)
	}
}

impl std::error::Error for UnknownEvent {}

impl FromStr for EventKind {
	type Err = UnknownEvent;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"started" | "simulationStarted" => Ok(Self::Started),
			"updated" | "simulationUpdated" => Ok(Self::Updated),
			"stopped" | "simulationStopped" => Ok(Self::Stopped),
			other => Err(UnknownEvent(other.to_string())),
		}
	}
}

/// Payload of [`EventKind::Started`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartedEvent {
	/// Entities in the population.
	pub population_size: usize,
	/// Entities infected before the first tick.
	pub initial_infected_count: usize,
	/// Spread-rate multiplier in effect.
	pub spread_rate: f64,
	/// Active probability per connection type.
	pub probabilities: Vec<f64>,
}

/// Payload of [`EventKind::Updated`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedEvent {
	/// Entities in the population.
	pub population_size: usize,
	/// Entities infected by this tick.
	pub new_infections: usize,
	/// Entities infected so far.
	pub total_infected: usize,
	/// Tick number, starting at 1.
	pub tick: u32,
}

/// Payload of [`EventKind::Stopped`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoppedEvent {
	/// Entities in the population.
	pub population_size: usize,
	/// Entities infected at the end of the run.
	pub final_infected_count: usize,
	/// Ticks recorded.
	pub duration: u32,
	/// New infections per tick.
	pub new_infection_series: Vec<SeriesPoint>,
	/// Cumulative infected count per tick.
	pub total_infected_series: Vec<SeriesPoint>,
}

/// Notification emitted by a session.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum SessionEvent {
	/// See [`StartedEvent`].
	Started(StartedEvent),
	/// See [`UpdatedEvent`].
	Updated(UpdatedEvent),
	/// See [`StoppedEvent`].
	Stopped(StoppedEvent),
}

impl SessionEvent {
	/// Kind of this event.
	pub fn kind(&self) -> EventKind {
		match self {
			Self::Started(_) => EventKind::Started,
			Self::Updated(_) => EventKind::Updated,
			Self::Stopped(_) => EventKind::Stopped,
		}
	}
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&SessionEvent) -> anyhow::Result<()>>;

/// Synchronous publish/subscribe over [`EventKind`]s.
///
/// A listener returning an error is logged and skipped; the remaining
/// listeners still run. Listeners may subscribe or unsubscribe while an event
/// is being dispatched; the change applies from the next dispatch.
#[derive(Default)]
pub struct EventBus {
	listeners: RefCell<[Vec<(ListenerId, Listener)>; 3]>,
	next_id: Cell<u64>,
}

impl EventBus {
	/// Creates a bus with no listeners.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `listener` for `kind`.
	pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> ListenerId
	where
		F: Fn(&SessionEvent) -> anyhow::Result<()> + 'static,
	{
		let id = ListenerId(self.next_id.get());
		self.next_id.set(id.0 + 1);
		self.listeners.borrow_mut()[kind.slot()].push((id, Rc::new(listener)));
		id
	}

	/// Registers `listener` by event name; `None` for an unknown name.
	pub fn subscribe_named<F>(&self, name: &str, listener: F) -> Option<ListenerId>
	where
		F: Fn(&SessionEvent) -> anyhow::Result<()> + 'static,
	{
		let kind = name.parse().ok()?;
		Some(self.subscribe(kind, listener))
	}

	/// Removes a listener. Returns whether it was registered for `kind`.
	pub fn unsubscribe(&self, kind: EventKind, id: ListenerId) -> bool {
		let mut listeners = self.listeners.borrow_mut();
		let slot = &mut listeners[kind.slot()];
		let before = slot.len();
		slot.retain(|(lid, _)| *lid != id);
		slot.len() != before
	}

	/// Removes a listener by event name; `false` for an unknown name.
	pub fn unsubscribe_named(&self, name: &str, id: ListenerId) -> bool {
		name.parse()
			.map(|kind| self.unsubscribe(kind, id))
			.unwrap_or(false)
	}

	/// Number of listeners for `kind`.
	pub fn listener_count(&self, kind: EventKind) -> usize {
		self.listeners.borrow()[kind.slot()].len()
	}

	/// Calls every listener of the event's kind, in registration order.
	pub fn emit(&self, event: &SessionEvent) {
		let kind = event.kind();
		let listeners: Vec<Listener> = self.listeners.borrow()[kind.slot()]
			.iter()
			.map(|(_, l)| Rc::clone(l))
			.collect();
		for listener in listeners {
			if let Err(e) = listener(event) {
				error!("error executing event listener for {kind}: {e:#}");
			}
		}
	}
}
