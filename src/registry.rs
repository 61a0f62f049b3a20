//! Named collection of provider brokers, the entry point adapters call into.

// self
use crate::{
	_prelude::*,
	HttpRequest, HttpResponse,
	auth::{ProviderId, Secret},
	flows::Broker,
	http::{TransportErrorMapper, UpstreamHttpClient},
	obs,
	provider::ProviderConfig,
	schedule::RefreshScheduler,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Registry specialized for the crate's default reqwest transport stack.
pub type ReqwestRegistry = ProviderRegistry<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// One broker per provider name; each provider owns its cache, so tokens never leak across
/// providers.
pub struct ProviderRegistry<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	brokers: HashMap<ProviderId, Arc<Broker<C, M>>>,
}
impl<C, M> ProviderRegistry<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self { brokers: HashMap::new() }
	}

	/// Builds brokers for `names` from environment-style pairs, sharing one transport.
	///
	/// A provider whose configuration cannot be loaded is logged and skipped so the remaining
	/// providers still come up. Providers missing credential fields are registered anyway (their
	/// acquisitions fail fast) and reported once here.
	pub fn load<I, S, V, K, T>(
		names: I,
		vars: V,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
		V: IntoIterator<Item = (K, T)>,
		K: Into<String>,
		T: Into<String>,
	{
		let http_client = http_client.into();
		let mapper = mapper.into();
		let vars = vars
			.into_iter()
			.map(|(key, value)| (key.into(), value.into()))
			.collect::<Vec<(String, String)>>();
		let mut registry = Self::new();

		for name in names {
			let name = name.as_ref();
			let config = ProviderId::new(name)
				.map_err(|err| obs::provider_config_rejected(name, &err))
				.and_then(|id| {
					ProviderConfig::from_env_vars(id, vars.iter().map(|(key, value)| (key, value.clone())))
						.map_err(|err| obs::provider_config_rejected(name, &err))
				});
			let Ok(config) = config else {
				continue;
			};
			let missing = config.missing_credentials();

			if !missing.is_empty() {
				obs::credentials_missing(&config.id, &missing);
			}

			registry.register(Broker::with_http_client(config, http_client.clone(), mapper.clone()));
		}

		registry
	}

	/// Adds a broker, returning the one it replaced for the same provider.
	pub fn register(&mut self, broker: Broker<C, M>) -> Option<Arc<Broker<C, M>>> {
		self.brokers.insert(broker.provider().clone(), Arc::new(broker))
	}

	/// Looks up a provider's broker.
	pub fn get(&self, provider: &str) -> Option<&Arc<Broker<C, M>>> {
		self.brokers.get(provider)
	}

	/// Registered provider names, sorted.
	pub fn providers(&self) -> Vec<&ProviderId> {
		let mut providers = self.brokers.keys().collect::<Vec<_>>();

		providers.sort();

		providers
	}

	/// Number of registered providers.
	pub fn len(&self) -> usize {
		self.brokers.len()
	}

	/// Returns `true` when no provider is registered.
	pub fn is_empty(&self) -> bool {
		self.brokers.is_empty()
	}

	/// Routes a business call through the named provider's resilient invoker.
	///
	/// See [`Broker::invoke`] for the retry contract.
	pub async fn invoke<F>(&self, provider: &str, build: F) -> Result<HttpResponse>
	where
		F: Fn(&Secret) -> Result<HttpRequest>,
	{
		let broker = self
			.get(provider)
			.ok_or_else(|| Error::UnknownProvider { provider: provider.to_owned() })?;

		broker.invoke(build).await
	}

	/// Arms a refresh task for every provider that declares a proactive refresh interval.
	///
	/// Must run inside a Tokio runtime.
	pub fn start_refresh(&self) -> RefreshScheduler {
		let scheduler = RefreshScheduler::new();

		for broker in self.brokers.values() {
			scheduler.arm(broker.clone());
		}

		scheduler
	}
}
#[cfg(feature = "reqwest")]
impl ProviderRegistry<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Builds reqwest-backed brokers for `names` from the process environment.
	pub fn from_env<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self::load(names, std::env::vars(), ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> Default for ProviderRegistry<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn default() -> Self {
		Self::new()
	}
}
impl<C, M> Debug for ProviderRegistry<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderRegistry").field("providers", &self.providers()).finish()
	}
}
