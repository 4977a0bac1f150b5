use std::cell::RefCell;
use std::rc::Rc;

use contagion_graph::{
	Configuration, ConnectionType, Connection, ConnectionValue, ContactGraph, Entity, EventKind,
	FnRandom, ManualDriver, PeriodicDriver, Restriction, RestrictionResolver, SeededRandom, SessionEvent,
	SessionState, SimulationSession, TickOutcome, TimeSeriesTracker, spread,
};

type Session = SimulationSession<SeededRandom, ManualDriver>;

fn seeded(seed: u64) -> (Session, ManualDriver) {
	let driver = ManualDriver::new();
	let session =
		SimulationSession::new(Configuration::default(), SeededRandom::new(seed), driver.clone())
			.unwrap();
	(session, driver)
}

fn record(session: &Session) -> Rc<RefCell<Vec<SessionEvent>>> {
	let log = Rc::new(RefCell::new(Vec::new()));
	for kind in EventKind::ALL {
		let log = log.clone();
		session.subscribe(kind, move |e| {
			log.borrow_mut().push(e.clone());
			Ok(())
		});
	}
	log
}

#[test]
fn full_run_records_consistent_series() {
	let (session, driver) = seeded(2024);
	let events = record(&session);

	session.configure(40, 0.2).unwrap();
	let population = session.graph().population();
	let initial = session.graph().infected_count();
	assert!(population > 0);

	// rate high enough that every trial succeeds; components without an
	// infected member never finish, so cap the run and stop by hand
	session.start(100.0, &[] as &[&str]).unwrap();
	assert_eq!(session.state(), SessionState::Running);
	driver.fire_n(200);
	if session.is_running() {
		assert!(session.stop());
	}
	assert_eq!(session.state(), SessionState::Idle);
	assert!(!driver.is_active());

	let events = events.borrow();
	let SessionEvent::Started(started) = &events[0] else {
		panic!("first event must be started");
	};
	assert_eq!(started.population_size, population);
	assert_eq!(started.initial_infected_count, initial);
	assert_eq!(started.probabilities, vec![0.1, 0.05, 0.05, 0.01]);

	let updates: Vec<_> = events
		.iter()
		.filter_map(|e| match e {
			SessionEvent::Updated(u) => Some(u.clone()),
			_ => None,
		})
		.collect();
	for (i, u) in updates.iter().enumerate() {
		assert_eq!(u.tick as usize, i + 1);
		assert_eq!(u.population_size, population);
	}

	let SessionEvent::Stopped(stopped) = events.last().unwrap() else {
		panic!("last event must be stopped");
	};
	let series = session.series();
	assert_eq!(stopped.duration as usize, updates.len());
	assert_eq!(stopped.new_infection_series, series.new_infections());
	assert_eq!(stopped.total_infected_series, series.total_infected());
	assert_eq!(series.new_infections().len(), series.total_infected().len());
	assert_eq!(series.total_infected()[0].count, initial);

	let total_new: usize = series.new_infections().iter().map(|p| p.count).sum();
	assert_eq!(initial + total_new, stopped.final_infected_count);
}

#[test]
fn stop_emits_accumulated_series() {
	let (session, driver) = seeded(7);
	session.configure(60, 0.1).unwrap();
	let events = record(&session);

	session.start_scenario(4).unwrap();
	driver.fire_n(3);
	assert!(session.stop());
	assert!(!session.stop());

	let events = events.borrow();
	let Some(SessionEvent::Stopped(stopped)) = events.last() else {
		panic!("expected stopped event");
	};
	let ticks = session.series().tick();
	assert_eq!(stopped.duration, ticks);
	assert_eq!(stopped.new_infection_series.len(), ticks as usize + 1);
	assert!(!driver.fire());
}

#[test]
fn listener_can_stop_the_session() {
	let (session, driver) = seeded(11);
	session.configure(30, 0.1).unwrap();

	let handle = session.clone();
	session.subscribe(EventKind::Updated, move |e| {
		if let SessionEvent::Updated(u) = e {
			if u.tick == 2 {
				handle.stop();
			}
		}
		Ok(())
	});

	session.start(0.5, &["quarantine"]).unwrap();
	assert_eq!(driver.fire_n(10), 2);
	assert!(!session.is_running());
	assert_eq!(session.series().tick(), 2);
}

#[test]
fn failing_listener_does_not_affect_simulation() {
	let (session, driver) = seeded(5);
	session.configure(30, 0.1).unwrap();
	session.subscribe(EventKind::Updated, |_| anyhow::bail!("renderer crashed"));
	let events = record(&session);

	session.start(1.0, &[] as &[&str]).unwrap();
	driver.fire_n(3);
	let updates = events
		.borrow()
		.iter()
		.filter(|e| e.kind() == EventKind::Updated)
		.count();
	assert_eq!(updates as u32, session.series().tick());
	assert_eq!(updates, 3);
}

#[test]
fn reconfigure_resets_series() {
	let (session, driver) = seeded(99);
	session.configure(50, 0.3).unwrap();
	session.start(1.0, &["testing"]).unwrap();
	driver.fire_n(4);
	session.stop();
	// series survive the stop until the next rebuild
	assert_eq!(session.series().tick(), 4);

	session.configure(25, 0.3).unwrap();
	let graph = session.graph();
	assert_eq!(session.series(), TimeSeriesTracker::new(graph.infected_count()));
	assert!(graph.indices_valid());
	for idx in 0..graph.population() {
		assert!(graph.connections.iter().any(|c| c.touches(idx)));
	}
}

#[test]
fn one_hop_per_tick_with_forced_success() {
	let mut graph = ContactGraph::new(
		vec![Entity::new(true), Entity::new(false), Entity::new(false)],
		vec![
			Connection::new(0, 1, ConnectionValue::Contagious, 0),
			Connection::new(1, 2, ConnectionValue::Normal, 0),
		],
	);
	let mut random = FnRandom::new(|min, _| min, |_| true);
	assert_eq!(spread(&mut graph, &[0.1], 1.0, &mut random), TickOutcome::Spread(1));
	assert!(graph.entities[1].infected);
	assert!(!graph.entities[2].infected);
	assert_eq!(graph.connections[1].value, ConnectionValue::Contagious);
}

#[test]
fn restriction_scales_matching_types_only() {
	let mut config = Configuration::default();
	config.connection_types = ["family", "workSchool", "strangers"]
		.iter()
		.zip([0.1, 0.05, 0.01])
		.map(|(id, p)| ConnectionType {
			id: id.to_string(),
			label: id.to_string(),
			color: "#000000".into(),
			base_probability: p,
			attraction_strength: 1.0,
		})
		.collect();
	config.restrictions = vec![Restriction {
		id: "respirators".into(),
		label: "Respirators".into(),
		tooltip: String::new(),
		multipliers: [("workSchool".to_string(), 0.8), ("strangers".to_string(), 0.5)]
			.into_iter()
			.collect(),
	}];
	config.scenarios.clear();
	assert_eq!(config.validate(), Ok(()));

	let mut resolver = RestrictionResolver::new(&config);
	let active = resolver.apply(&["respirators"]).to_vec();
	for (got, want) in active.iter().zip([0.1, 0.04, 0.005]) {
		assert!((got - want).abs() < 1e-12, "{got} != {want}");
	}
}
