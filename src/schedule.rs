//! Proactive refresh: one background task per provider keeps the cache warm so the request path
//! rarely pays for a token round-trip.
//!
//! A provider's task starts in [`SchedulerState::Idle`] and moves to
//! [`SchedulerState::Armed`] when [`RefreshScheduler::arm`] spawns it. An armed task first
//! performs a best-effort acquisition, then wakes every `proactive_refresh_interval` and forces a
//! refresh whenever the cached token is already stale (late ticks are tolerated). Failures
//! are logged by the broker and retried on the next tick. Tasks run until
//! [`RefreshScheduler::shutdown`] or until the Tokio runtime stops.

// crates.io
use tokio::{
	runtime::Handle,
	task::JoinHandle,
	time::{Instant, MissedTickBehavior},
};
// self
use crate::{
	_prelude::*,
	auth::ProviderId,
	flows::Broker,
	http::{TransportErrorMapper, UpstreamHttpClient},
	obs,
	provider::ProviderConfig,
};

/// Lifecycle of a provider's refresh task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulerState {
	/// No task running.
	Idle,
	/// Periodic task active.
	Armed,
}

/// Owns the per-provider refresh tasks.
///
/// Dropping the scheduler detaches the tasks instead of stopping them; call
/// [`RefreshScheduler::shutdown`] to stop them explicitly.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
	tasks: Mutex<HashMap<ProviderId, JoinHandle<()>>>,
}
impl RefreshScheduler {
	/// Creates a scheduler with no armed providers.
	pub fn new() -> Self {
		Self::default()
	}

	/// Spawns the refresh task for `broker` on the current Tokio runtime.
	///
	/// Returns `false` (leaving the provider idle) when the provider has no proactive refresh
	/// interval, is already armed, or no runtime is available. Intervals longer than
	/// [`ProviderConfig::MAX_REFRESH_INTERVAL`] are clamped to it, and so are
	/// sub-second ones to one second.
	pub fn arm<C, M>(&self, broker: Arc<Broker<C, M>>) -> bool
	where
		C: ?Sized + UpstreamHttpClient,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		let Some(interval) = broker.config.proactive_refresh_interval else {
			return false;
		};
		let provider = broker.provider().clone();
		let mut tasks = self.tasks.lock();

		if tasks.get(&provider).is_some_and(|task| !task.is_finished()) {
			return false;
		}

		let Ok(runtime) = Handle::try_current() else {
			obs::scheduler_unavailable(&provider);

			return false;
		};
		let period =
			interval.clamp(Duration::SECOND, ProviderConfig::MAX_REFRESH_INTERVAL).unsigned_abs();
		let task = runtime.spawn(async move {
			let _ = broker.prime().await;
			let mut ticker = tokio::time::interval_at(Instant::now() + period, period);

			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

			loop {
				ticker.tick().await;

				let stale = broker.cache().is_stale();

				obs::scheduler_tick(broker.provider(), stale);

				if stale {
					let _ = broker.refresh_if_stale().await;
				}
			}
		});

		obs::scheduler_armed(&provider, interval);
		tasks.insert(provider, task);

		true
	}

	/// Current state of `provider`'s task.
	pub fn state(&self, provider: &str) -> SchedulerState {
		match self.tasks.lock().get(provider) {
			Some(task) if !task.is_finished() => SchedulerState::Armed,
			_ => SchedulerState::Idle,
		}
	}

	/// Providers with a running task.
	pub fn armed(&self) -> Vec<ProviderId> {
		let mut armed = self
			.tasks
			.lock()
			.iter()
			.filter(|(_, task)| !task.is_finished())
			.map(|(provider, _)| provider.clone())
			.collect::<Vec<_>>();

		armed.sort();

		armed
	}

	/// Aborts every task; all providers return to idle.
	pub fn shutdown(&self) {
		for (_, task) in self.tasks.lock().drain() {
			task.abort();
		}
	}
}
