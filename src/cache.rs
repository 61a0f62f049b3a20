//! Per-provider token cache.
//!
//! The cache holds at most one [`CachedToken`] behind an `Arc`. Installing a token swaps the
//! whole record by reference under a write lock, so readers observe either the previous pair or
//! the new pair, never a torn `(value, expires_at)` mix. The cache never performs I/O and never
//! erases an entry: a stale token stays in place (invisible to [`TokenCache::peek`]) until a
//! newer one replaces it.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, ProviderId, Secret},
	clock::Clock,
};

/// Holds the current token for one provider.
pub struct TokenCache {
	provider: ProviderId,
	safety_margin: Duration,
	clock: Arc<dyn Clock>,
	slot: RwLock<Option<Arc<CachedToken>>>,
}
impl TokenCache {
	/// Creates an empty cache for `provider`.
	pub fn new(provider: ProviderId, safety_margin: Duration, clock: Arc<dyn Clock>) -> Self {
		Self { provider, safety_margin, clock, slot: RwLock::new(None) }
	}

	/// Provider this cache belongs to.
	pub fn provider(&self) -> &ProviderId {
		&self.provider
	}

	/// Safety margin subtracted from every installed TTL.
	pub fn safety_margin(&self) -> Duration {
		self.safety_margin
	}

	/// Returns the cached token only if it is still fresh.
	pub fn peek(&self) -> Option<Arc<CachedToken>> {
		let now = self.clock.now();

		self.slot.read().as_ref().filter(|token| token.is_fresh_at(now)).cloned()
	}

	/// Returns the cached token whether or not it is fresh.
	pub fn current(&self) -> Option<Arc<CachedToken>> {
		self.slot.read().clone()
	}

	/// Returns `true` when no token is cached or the cached one is stale.
	pub fn is_stale(&self) -> bool {
		self.peek().is_none()
	}

	/// Installs `token` with a lifetime of `ttl`, replacing any previous record.
	pub fn install(&self, token: Secret, ttl: Duration) -> Arc<CachedToken> {
		let record =
			Arc::new(CachedToken::issue(token, self.clock.now(), ttl, self.safety_margin));

		*self.slot.write() = Some(record.clone());

		record
	}
}
impl Debug for TokenCache {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("provider", &self.provider)
			.field("safety_margin", &self.safety_margin)
			.field("current", &self.current())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::clock::ManualClock;

	fn cache(margin: i64) -> (TokenCache, ManualClock) {
		let clock = ManualClock::new(macros::datetime!(2025-01-01 00:00 UTC));
		let provider = ProviderId::new("fi-exchange").expect("Provider fixture should be valid.");

		(TokenCache::new(provider, Duration::seconds(margin), Arc::new(clock.clone())), clock)
	}

	#[test]
	fn empty_cache_peeks_none() {
		let (cache, _clock) = cache(60);

		assert!(cache.peek().is_none());
		assert!(cache.current().is_none());
		assert!(cache.is_stale());
	}

	#[test]
	fn install_then_peek_returns_same_token() {
		let (cache, _clock) = cache(60);
		let installed = cache.install(Secret::new("abc"), Duration::seconds(3600));
		let peeked = cache.peek().expect("Fresh token should be visible.");

		assert!(Arc::ptr_eq(&installed, &peeked));
		assert_eq!(peeked.value().expose(), "abc");
		assert_eq!(peeked.expires_at(), macros::datetime!(2025-01-01 00:59 UTC));
	}

	#[test]
	fn ttl_not_exceeding_margin_is_never_visible() {
		let (cache, _clock) = cache(60);

		cache.install(Secret::new("short"), Duration::seconds(60));

		assert!(cache.peek().is_none());

		cache.install(Secret::new("negative"), Duration::seconds(-5));

		assert!(cache.peek().is_none());
		assert_eq!(
			cache.current().expect("Stale token should remain cached.").value().expose(),
			"negative"
		);
	}

	#[test]
	fn peek_never_returns_expired_tokens() {
		let (cache, clock) = cache(30);

		cache.install(Secret::new("abc"), Duration::seconds(90));
		clock.advance(Duration::seconds(59));

		assert!(cache.peek().is_some());

		clock.advance(Duration::seconds(1));

		assert!(cache.peek().is_none(), "Token must be stale exactly at expires_at.");
		assert!(cache.current().is_some(), "Stale tokens are kept, not erased.");
	}

	#[test]
	fn install_replaces_previous_record() {
		let (cache, clock) = cache(0);
		let first = cache.install(Secret::new("first"), Duration::seconds(10));

		clock.advance(Duration::seconds(5));

		let second = cache.install(Secret::new("second"), Duration::seconds(10));
		let peeked = cache.peek().expect("Replacement should be fresh.");

		assert!(!Arc::ptr_eq(&first, &peeked));
		assert!(Arc::ptr_eq(&second, &peeked));
		assert_eq!(peeked.issued_at(), macros::datetime!(2025-01-01 00:00:05 UTC));
	}

	#[test]
	fn concurrent_installs_never_tear() {
		let (cache, _clock) = cache(0);
		let cache = Arc::new(cache);
		let writers = (0..8)
			.map(|idx| {
				let cache = cache.clone();

				std::thread::spawn(move || {
					for round in 0..200 {
						cache.install(Secret::new(format!("{idx}")), Duration::seconds(idx * 1000 + round));
					}
				})
			})
			.collect::<Vec<_>>();

		for writer in writers {
			writer.join().expect("Writer thread should not panic.");
		}

		let token = cache.peek().expect("Some writer should have won.");
		let idx: i64 = token.value().expose().parse().expect("Token value should be numeric.");
		let ttl = token.expires_at() - token.issued_at();

		assert_eq!(ttl.whole_seconds() / 1000, idx, "Value and expiry must come from one install.");
	}
}
