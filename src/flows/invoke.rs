//! Resilient invocation: one business call, plus exactly one retry after a forced refresh when
//! the response says the bearer token was rejected.

// self
use crate::{
	_prelude::*,
	HttpRequest, HttpResponse,
	auth::Secret,
	flows::Broker,
	http::{TransportErrorMapper, UpstreamHttpClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + UpstreamHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends a business request built around the current bearer token.
	///
	/// `build` receives the token and returns the request to send; it runs once, or twice when
	/// the first response is classified as invalid-token. The second response is returned
	/// whatever its own verdict, so a call makes at most two upstream round-trips. Responses
	/// that are not token-related, including non-2xx business errors, pass through untouched.
	///
	/// # Errors
	///
	/// - [`Error::AuthUnavailable`] when no token can be acquired, before the first call or for
	///   the retry.
	/// - [`Error::Transport`] when the business request itself cannot be sent.
	/// - Any error returned by `build`.
	pub async fn invoke<F>(&self, build: F) -> Result<HttpResponse>
	where
		F: Fn(&Secret) -> Result<HttpRequest>,
	{
		const KIND: FlowKind = FlowKind::Invoke;

		let span = FlowSpan::new(KIND, "invoke", self.provider());

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let token = self.token().await?;
				let response = self.call_with(&build, token.value()).await?;
				let verdict =
					self.classifier.classify(response.status().as_u16(), response.body().as_slice());

				if !verdict.is_invalid_token {
					return Ok(response);
				}

				obs::invalid_token_retry(self.provider(), &verdict);
				obs::record_flow_outcome(KIND, FlowOutcome::Retry);
				self.metrics.record_retry();

				let refreshed = self.force_refresh(Some(&token)).await?;

				self.call_with(&build, refreshed.value()).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn call_with<F>(&self, build: &F, token: &Secret) -> Result<HttpResponse>
	where
		F: Fn(&Secret) -> Result<HttpRequest>,
	{
		let request = build(token)?;

		self.metrics.record_business_call();

		Ok(self.send(request).await?)
	}
}
