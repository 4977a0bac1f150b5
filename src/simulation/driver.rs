use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use log::debug;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use super::error::SessionError;

/// Cadence of the browser driver.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Fires a callback at a fixed real-time interval until cancelled.
pub trait PeriodicDriver {
	/// Starts firing `callback` every `period`, replacing any previous
	/// schedule. On error nothing is scheduled.
	fn start(&mut self, period: Duration, callback: Box<dyn FnMut()>) -> Result<(), SessionError>;

	/// Stops firing. Cancelling an inactive driver does nothing.
	fn cancel(&mut self);

	/// Whether a callback is scheduled.
	fn is_active(&self) -> bool;
}

/// Browser driver backed by `setInterval`.
#[derive(Default)]
pub struct IntervalDriver {
	handle: Option<i32>,
	callback: Option<Closure<dyn FnMut()>>,
	// cancel may run inside the callback itself, so the closure is only
	// dropped once a later schedule replaces it
	retired: Option<Closure<dyn FnMut()>>,
}

impl IntervalDriver {
	/// Creates an inactive driver.
	pub fn new() -> Self {
		Self::default()
	}
}

impl PeriodicDriver for IntervalDriver {
	fn start(&mut self, period: Duration, callback: Box<dyn FnMut()>) -> Result<(), SessionError> {
		self.cancel();
		let window = web_sys::window()
			.ok_or_else(|| SessionError::Driver("no window available".to_string()))?;
		let closure = Closure::wrap(callback);
		let millis = i32::try_from(period.as_millis()).unwrap_or(i32::MAX);
		let handle = window
			.set_interval_with_callback_and_timeout_and_arguments_0(
				closure.as_ref().unchecked_ref(),
				millis,
			)
			.map_err(|e| SessionError::Driver(format!("setInterval failed: {e:?}")))?;
		debug!("interval {handle} started ({millis} ms)");
		self.handle = Some(handle);
		self.callback = Some(closure);
		Ok(())
	}

	fn cancel(&mut self) {
		if let Some(handle) = self.handle.take() {
			if let Some(window) = web_sys::window() {
				window.clear_interval_with_handle(handle);
			}
			debug!("interval {handle} cleared");
		}
		if let Some(callback) = self.callback.take() {
			self.retired = Some(callback);
		}
	}

	fn is_active(&self) -> bool {
		self.handle.is_some()
	}
}

impl Drop for IntervalDriver {
	fn drop(&mut self) {
		self.cancel();
	}
}

/// Driver fired by hand, for native hosts and tests.
///
/// Clones share the same schedule, so a host can keep one clone and call
/// [`fire`](Self::fire) while the session owns another.
#[derive(Clone, Default)]
pub struct ManualDriver {
	callback: Rc<RefCell<Option<Box<dyn FnMut()>>>>,
	generation: Rc<Cell<u64>>,
	period: Rc<Cell<Option<Duration>>>,
}

impl ManualDriver {
	/// Creates an inactive driver.
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs the scheduled callback once. Returns `false` when inactive.
	pub fn fire(&self) -> bool {
		let Some(mut callback) = self.callback.borrow_mut().take() else {
			return false;
		};
		let generation = self.generation.get();
		callback();
		// the callback may have cancelled or rescheduled
		if self.generation.get() == generation {
			*self.callback.borrow_mut() = Some(callback);
		}
		true
	}

	/// Fires up to `n` times, stopping early once inactive. Returns the number
	/// of callbacks run.
	pub fn fire_n(&self, n: usize) -> usize {
		(0..n).take_while(|_| self.fire()).count()
	}

	/// Period of the current schedule.
	pub fn period(&self) -> Option<Duration> {
		self.period.get()
	}
}

impl PeriodicDriver for ManualDriver {
	fn start(&mut self, period: Duration, callback: Box<dyn FnMut()>) -> Result<(), SessionError> {
		self.generation.set(self.generation.get() + 1);
		self.period.set(Some(period));
		*self.callback.borrow_mut() = Some(callback);
		Ok(())
	}

	fn cancel(&mut self) {
		self.generation.set(self.generation.get() + 1);
		self.period.set(None);
		self.callback.borrow_mut().take();
	}

	fn is_active(&self) -> bool {
		self.period.get().is_some()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fires_until_cancelled() {
		let hits = Rc::new(Cell::new(0));
		let mut driver = ManualDriver::new();
		assert!(!driver.fire());

		let h = hits.clone();
		driver
			.start(DEFAULT_TICK_INTERVAL, Box::new(move || h.set(h.get() + 1)))
			.unwrap();
		assert!(driver.is_active());
		assert_eq!(driver.period(), Some(Duration::from_secs(1)));
		assert_eq!(driver.fire_n(3), 3);

		driver.cancel();
		driver.cancel();
		assert!(!driver.is_active());
		assert!(!driver.fire());
		assert_eq!(hits.get(), 3);
	}

	#[test]
	fn callback_can_cancel_its_own_schedule() {
		let handle = ManualDriver::new();
		let mut inner = handle.clone();
		let hits = Rc::new(Cell::new(0));
		let h = hits.clone();
		let mut outer = handle.clone();
		outer
			.start(
				Duration::from_millis(10),
				Box::new(move || {
					h.set(h.get() + 1);
					if h.get() == 2 {
						inner.cancel();
					}
				}),
			)
			.unwrap();
		assert_eq!(handle.fire_n(10), 2);
		assert_eq!(hits.get(), 2);
		assert!(!handle.is_active());
	}
}
