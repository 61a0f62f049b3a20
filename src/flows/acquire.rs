//! Token acquisition: cache-miss path, forced refresh, and the hooks the scheduler drives.
//!
//! All paths funnel into one guarded section. After taking the provider's singleflight guard a
//! caller first re-reads the cache: a cache miss reuses any fresh token, while a forced refresh
//! reuses a fresh token only if it differs from the one the caller saw rejected. Only when
//! neither holds does the broker build, send, parse, and install.

// self
use crate::{
	_prelude::*,
	auth::{CachedToken, Secret},
	error::AcquisitionError,
	flows::Broker,
	http::{self, TransportErrorMapper, UpstreamHttpClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const BODY_PREVIEW_CHARS: usize = 256;

enum Trigger {
	Miss,
	Replace { observed: Option<Arc<CachedToken>> },
}
impl Trigger {
	fn reuses(&self, current: &Arc<CachedToken>) -> bool {
		match self {
			Trigger::Miss => true,
			Trigger::Replace { observed } =>
				observed.as_ref().is_none_or(|observed| !Arc::ptr_eq(observed, current)),
		}
	}
}

impl<C, M> Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns the cached token if it is still fresh, without any I/O.
	pub fn peek(&self) -> Option<Arc<CachedToken>> {
		self.cache.peek()
	}

	/// Returns a fresh token, acquiring one synchronously on a cache miss.
	///
	/// Fails with [`Error::AuthUnavailable`] when the provider cannot issue a token; the cache
	/// keeps whatever it held before.
	pub async fn token(&self) -> Result<Arc<CachedToken>> {
		if let Some(token) = self.cache.peek() {
			return Ok(token);
		}

		self.acquire(FlowKind::Acquire, Trigger::Miss).await
	}

	/// Reacquires a token, bypassing the cache's freshness check.
	///
	/// `observed` is the token the caller saw rejected (defaults to whatever is cached now). If
	/// another caller already replaced it while this one waited on the guard, the replacement
	/// is returned without a second token request. The previous token value is handed to the
	/// strategy, which is how the password grant resubmits it.
	pub async fn force_refresh(
		&self,
		observed: Option<&Arc<CachedToken>>,
	) -> Result<Arc<CachedToken>> {
		let observed = observed.cloned().or_else(|| self.cache.current());

		self.acquire(FlowKind::ForcedRefresh, Trigger::Replace { observed }).await
	}

	/// Forces a refresh only when the cache is empty or stale; returns the new token if one
	/// was installed.
	pub async fn refresh_if_stale(&self) -> Result<Option<Arc<CachedToken>>> {
		if self.cache.peek().is_some() {
			return Ok(None);
		}

		let observed = self.cache.current();

		self.acquire(FlowKind::ProactiveRefresh, Trigger::Replace { observed }).await.map(Some)
	}

	/// Best-effort start-up acquisition used when the refresh scheduler arms.
	pub async fn prime(&self) -> Result<Arc<CachedToken>> {
		if let Some(token) = self.cache.peek() {
			return Ok(token);
		}

		self.acquire(FlowKind::ProactiveRefresh, Trigger::Miss).await
	}

	async fn acquire(&self, kind: FlowKind, trigger: Trigger) -> Result<Arc<CachedToken>> {
		let span = FlowSpan::new(kind, "acquire", self.provider());

		obs::record_flow_outcome(kind, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;

				if let Some(current) = self.cache.peek().filter(|current| trigger.reuses(current)) {
					self.metrics.record_coalesced();

					return Ok(current);
				}

				let forced = matches!(trigger, Trigger::Replace { .. });
				let prior =
					if forced { self.cache.current().map(|token| token.value().clone()) } else { None };

				self.metrics.record_token_request(forced);

				let token = self.exchange(prior.as_ref()).await?;

				obs::token_installed(kind, self.provider(), &token);

				Ok(token)
			})
			.await;

		match result {
			Ok(token) => {
				obs::record_flow_outcome(kind, FlowOutcome::Success);

				Ok(token)
			},
			Err(source) => {
				self.metrics.record_failure();
				obs::acquisition_failed(kind, self.provider(), &source);
				obs::record_flow_outcome(kind, FlowOutcome::Failure);

				Err(Error::AuthUnavailable { provider: self.provider().clone(), source })
			},
		}
	}

	async fn exchange(&self, prior: Option<&Secret>) -> Result<Arc<CachedToken>, AcquisitionError> {
		let request = self.strategy.build_request(&self.config, prior)?.into_http()?;
		let response = match self.config.acquisition_timeout {
			Some(timeout) => tokio::time::timeout(timeout.unsigned_abs(), self.send(request))
				.await
				.map_err(|_| AcquisitionError::TimedOut { timeout })??,
			None => self.send(request).await?,
		};
		let status = response.status();

		if !status.is_success() {
			return Err(AcquisitionError::Rejected {
				status: status.as_u16(),
				body_preview: body_preview(response.body()),
				retry_after: http::parse_retry_after(response.headers()),
			});
		}

		let grant = self.strategy.parse_response(&self.config, status.as_u16(), response.body())?;
		let ttl = grant.ttl_or(self.config.default_ttl);

		Ok(self.cache.install(grant.token, ttl))
	}
}

fn body_preview(body: &[u8]) -> String {
	String::from_utf8_lossy(body).chars().take(BODY_PREVIEW_CHARS).collect()
}
