// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for one provider's broker.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
	token_requests: AtomicU64,
	forced_refreshes: AtomicU64,
	coalesced: AtomicU64,
	failures: AtomicU64,
	business_calls: AtomicU64,
	retries: AtomicU64,
}
impl BrokerMetrics {
	/// Requests sent to the token endpoint.
	pub fn token_requests(&self) -> u64 {
		self.token_requests.load(Ordering::Relaxed)
	}

	/// Forced or proactive refreshes that reached the token endpoint.
	pub fn forced_refreshes(&self) -> u64 {
		self.forced_refreshes.load(Ordering::Relaxed)
	}

	/// Acquisitions satisfied by a token another caller installed while this one waited.
	pub fn coalesced(&self) -> u64 {
		self.coalesced.load(Ordering::Relaxed)
	}

	/// Failed acquisitions.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Business requests sent through the invoker, retries included.
	pub fn business_calls(&self) -> u64 {
		self.business_calls.load(Ordering::Relaxed)
	}

	/// Invoker retries triggered by an invalid-token verdict.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	pub(crate) fn record_token_request(&self, forced: bool) {
		self.token_requests.fetch_add(1, Ordering::Relaxed);

		if forced {
			self.forced_refreshes.fetch_add(1, Ordering::Relaxed);
		}
	}

	pub(crate) fn record_coalesced(&self) {
		self.coalesced.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_business_call(&self) {
		self.business_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}
}
