//! Stochastic contagion over a randomly generated contact graph.
//!
//! A [`SimulationSession`] builds a population and its contacts, resolves
//! per-contact-type transmission probabilities from the active restrictions,
//! and ticks the infection forward on a periodic driver while recording the
//! new and cumulative infection series. Rendering is left to the host: it
//! subscribes to session events and reads [`GraphData`] / [`ChartData`].

use log::{Level, info};

mod simulation;

pub use simulation::*;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}
