//! Cached token records and the parsed result of a token-endpoint exchange.

// self
use crate::{_prelude::*, auth::Secret};

/// Lifecycle status of a cached token at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token may be sent upstream.
	Fresh,
	/// Token is inside its safety margin (or past its nominal expiry) and must be replaced.
	Stale,
}

/// Immutable token record held by a [`TokenCache`](crate::cache::TokenCache).
///
/// `expires_at` is always derived from `issued_at`, the TTL, and the provider's safety margin;
/// there is no way to set it independently of `value`. Replacing a token means replacing the
/// whole record.
#[derive(Clone, PartialEq, Eq)]
pub struct CachedToken {
	value: Secret,
	issued_at: OffsetDateTime,
	expires_at: OffsetDateTime,
}
impl CachedToken {
	/// Builds a record whose expiry is `issued_at + ttl - safety_margin`.
	pub fn issue(
		value: Secret,
		issued_at: OffsetDateTime,
		ttl: Duration,
		safety_margin: Duration,
	) -> Self {
		let expires_at = issued_at.saturating_add(ttl).saturating_sub(safety_margin);

		Self { value, issued_at, expires_at }
	}

	/// Bearer value; callers must avoid logging it.
	pub fn value(&self) -> &Secret {
		&self.value
	}

	/// Instant the token was installed.
	pub fn issued_at(&self) -> OffsetDateTime {
		self.issued_at
	}

	/// Instant from which the cache reports the token as stale.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.expires_at
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant < self.expires_at { TokenStatus::Fresh } else { TokenStatus::Stale }
	}

	/// Returns `true` if the token may still be used at the provided instant.
	pub fn is_fresh_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Fresh)
	}
}
impl Debug for CachedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedToken")
			.field("value", &"<redacted>")
			.field("fingerprint", &self.value.fingerprint())
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Token extracted from a token-endpoint response, before it is installed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
	/// Bearer token value.
	pub token: Secret,
	/// Lifetime reported by the endpoint; `None` falls back to the provider default.
	pub ttl: Option<Duration>,
}
impl TokenGrant {
	/// Creates a grant without an explicit lifetime.
	pub fn new(token: impl Into<Secret>) -> Self {
		Self { token: token.into(), ttl: None }
	}

	/// Sets the lifetime reported by the endpoint.
	pub fn with_ttl(mut self, ttl: Duration) -> Self {
		self.ttl = Some(ttl);

		self
	}

	/// Lifetime to install, falling back to `default_ttl` when the endpoint omitted one.
	pub fn ttl_or(&self, default_ttl: Duration) -> Duration {
		self.ttl.unwrap_or(default_ttl)
	}
}
