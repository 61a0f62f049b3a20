// self
use crate::{
	_prelude::*,
	auth::{CachedToken, ProviderId},
	classify::InvalidityVerdict,
	error::AcquisitionError,
	obs::FlowKind,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by broker flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the flow kind, stage, and provider.
	pub fn new(kind: FlowKind, stage: &'static str, provider: &ProviderId) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"partner_auth.flow",
				flow = kind.as_str(),
				stage,
				provider = provider.as_str()
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage, provider);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a freshly installed token by fingerprint.
pub fn token_installed(kind: FlowKind, provider: &ProviderId, token: &CachedToken) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(
			flow = kind.as_str(),
			provider = provider.as_str(),
			fingerprint = %token.value().fingerprint(),
			expires_at = %token.expires_at(),
			"Installed a new bearer token."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, provider, token);
	}
}

/// Logs a failed acquisition; the cache keeps whatever it held before.
pub fn acquisition_failed(kind: FlowKind, provider: &ProviderId, err: &AcquisitionError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			flow = kind.as_str(),
			provider = provider.as_str(),
			status = err.status(),
			error = %err,
			"Token acquisition failed."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, provider, err);
	}
}

/// Logs the single retry triggered by an invalid-token verdict.
pub fn invalid_token_retry(provider: &ProviderId, verdict: &InvalidityVerdict) {
	#[cfg(feature = "tracing")]
	{
		let reason = verdict.reason.as_ref().map(ToString::to_string);

		tracing::info!(
			provider = provider.as_str(),
			reason = reason.as_deref().unwrap_or("unknown"),
			"Upstream rejected the bearer token; refreshing and retrying once."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (provider, verdict);
	}
}

/// Logs a provider whose configuration could not be loaded.
pub fn provider_config_rejected(provider: &str, err: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(provider, error = %err, "Skipping provider with invalid configuration.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (provider, err);
	}
}

/// Logs credential fields the provider's grant needs but does not configure.
pub fn credentials_missing(provider: &ProviderId, fields: &[&'static str]) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			provider = provider.as_str(),
			fields = ?fields,
			"Provider is missing credentials; every acquisition will fail until they are set."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (provider, fields);
	}
}

/// Logs a refresh task transitioning to armed.
pub fn scheduler_armed(provider: &ProviderId, interval: Duration) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(provider = provider.as_str(), %interval, "Armed proactive refresh.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (provider, interval);
	}
}

/// Logs a refresh task that could not start because no Tokio runtime is running.
pub fn scheduler_unavailable(provider: &ProviderId) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			provider = provider.as_str(),
			"Proactive refresh needs a Tokio runtime; the provider stays idle."
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = provider;
	}
}

/// Logs one refresh tick.
pub fn scheduler_tick(provider: &ProviderId, stale: bool) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(provider = provider.as_str(), stale, "Proactive refresh tick.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (provider, stale);
	}
}
