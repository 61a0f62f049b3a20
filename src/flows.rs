//! Per-provider broker: token acquisition, forced refresh, and resilient invocation.
//!
//! A [`Broker`] owns one provider's [`TokenCache`], [`CredentialStrategy`], and
//! [`InvalidityClassifier`], plus the transport used for both the token endpoint and the
//! provider's business endpoints. Every acquisition runs under a per-provider singleflight
//! guard, so concurrent cache misses and concurrent forced refreshes collapse into one
//! outstanding token request.

mod acquire;
mod invoke;
mod metrics;

pub use metrics::BrokerMetrics;

// crates.io
use oauth2::AsyncHttpClient;
// self
use crate::{
	_prelude::*,
	HttpRequest, HttpResponse,
	auth::ProviderId,
	cache::TokenCache,
	classify::{DefaultInvalidityClassifier, InvalidityClassifier},
	clock::{Clock, SystemClock},
	error::TransportError,
	http::{ResponseMetadataSlot, TransportErrorMapper, UpstreamHttpClient},
	provider::{CredentialStrategy, ProviderConfig},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

/// Boxed `Send` future returned by transport round-trips.
pub type UpstreamFuture<'a, T> = Pin<Box<dyn 'a + Send + Future<Output = T>>>;

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Token lifecycle coordinator for a single provider.
///
/// The cache, singleflight guard, and metrics are shared between clones, so a clone handed to
/// the refresh scheduler and one used on the request path see the same token.
pub struct Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for token requests and business calls.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Static provider configuration.
	pub config: Arc<ProviderConfig>,
	/// Strategy that builds token requests and parses token responses.
	pub strategy: Arc<dyn CredentialStrategy>,
	/// Classifier deciding whether a business response rejected the token.
	pub classifier: Arc<dyn InvalidityClassifier>,
	/// Counters for this provider's flows.
	pub metrics: Arc<BrokerMetrics>,
	cache: Arc<TokenCache>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	///
	/// The strategy follows `config.grant_strategy`, the classifier uses `config.markers`, and
	/// the cache reads the system clock.
	pub fn with_http_client(
		config: ProviderConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let strategy = config.grant_strategy.strategy();
		let classifier = Arc::new(DefaultInvalidityClassifier::new(config.markers.clone()));
		let cache = Arc::new(TokenCache::new(
			config.id.clone(),
			config.refresh_safety_margin,
			Arc::new(SystemClock),
		));

		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			config: Arc::new(config),
			strategy,
			classifier,
			metrics: Default::default(),
			cache,
			refresh_guard: Default::default(),
		}
	}

	/// Replaces the clock; the cache is rebuilt empty, so call this before first use.
	pub fn with_clock(mut self, clock: impl 'static + Clock) -> Self {
		self.cache = Arc::new(TokenCache::new(
			self.config.id.clone(),
			self.config.refresh_safety_margin,
			Arc::new(clock),
		));

		self
	}

	/// Overrides the credential strategy.
	pub fn with_strategy(mut self, strategy: Arc<dyn CredentialStrategy>) -> Self {
		self.strategy = strategy;

		self
	}

	/// Overrides the invalidity classifier.
	pub fn with_classifier(mut self, classifier: Arc<dyn InvalidityClassifier>) -> Self {
		self.classifier = classifier;

		self
	}

	/// Provider served by this broker.
	pub fn provider(&self) -> &ProviderId {
		&self.config.id
	}

	/// The provider's token cache.
	pub fn cache(&self) -> &TokenCache {
		&self.cache
	}

	/// Sends one request through the transport, mapping failures with the captured metadata.
	///
	/// Non-2xx responses are returned as `Ok`; only transport failures become errors.
	pub fn send(
		&self,
		request: HttpRequest,
	) -> UpstreamFuture<'_, Result<HttpResponse, TransportError>> {
		Box::pin(async move {
			let slot = ResponseMetadataSlot::default();
			let handle = self.http_client.with_metadata(slot.clone());

			handle.call(request).await.map_err(|err| {
				let meta = slot.take();

				self.transport_mapper.map_transport_error(meta.as_ref(), err)
			})
		})
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a broker with its own reqwest-backed transport.
	pub fn new(config: ProviderConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> Clone for Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			config: self.config.clone(),
			strategy: self.strategy.clone(),
			classifier: self.classifier.clone(),
			metrics: self.metrics.clone(),
			cache: self.cache.clone(),
			refresh_guard: self.refresh_guard.clone(),
		}
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("provider", &self.config.id)
			.field("grant_strategy", &self.config.grant_strategy)
			.field("token_endpoint", &self.config.token_endpoint.as_str())
			.field("cache", &self.cache)
			.finish()
	}
}
