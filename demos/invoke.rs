//! Registers one provider from environment-style settings, then routes a business call through
//! the resilient invoker. The first call is rejected as invalid-token, so the broker refreshes
//! once and retries with the new bearer.

// crates.io
use color_eyre::{Result, eyre::eyre};
use httpmock::prelude::*;
// self
use partner_auth_broker::{
	http::{ReqwestHttpClient, ReqwestTransportErrorMapper},
	oauth2::http::{self, header::AUTHORIZATION},
	registry::ReqwestRegistry,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let first_token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token").body_includes("client_id=dealer-app");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-first\",\"expires_in\":900}");
		})
		.await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/deals").header("authorization", "Bearer demo-first");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"error\":{\"message\":\"Token expired\"}}");
		})
		.await;
	let accepted = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/deals").header("authorization", "Bearer demo-second");
			then.status(200).header("content-type", "application/json").body("{\"deals\":[]}");
		})
		.await;
	let vars = [
		("FI_EXCHANGE_TOKEN_ENDPOINT", server.url("/oauth/token")),
		("FI_EXCHANGE_GRANT_STRATEGY", "client_credentials".into()),
		("FI_EXCHANGE_CLIENT_ID", "dealer-app".into()),
		("FI_EXCHANGE_CLIENT_SECRET", "super-secret".into()),
	];
	let registry = ReqwestRegistry::load(
		["fi-exchange"],
		vars,
		ReqwestHttpClient::try_default()?,
		ReqwestTransportErrorMapper,
	);
	let deals_url = server.url("/api/deals");
	let broker = registry.get("fi-exchange").ok_or_else(|| eyre!("Provider was not registered."))?;

	println!("Cached token fingerprint: {}.", broker.token().await?.value().fingerprint());

	first_token.assert_async().await;
	first_token.delete_async().await;

	let _second_token = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-second\",\"expires_in\":900}");
		})
		.await;
	let response = registry
		.invoke("fi-exchange", |token| {
			Ok(http::Request::builder()
				.uri(deals_url.as_str())
				.header(AUTHORIZATION, token.bearer())
				.body(Vec::new())?)
		})
		.await?;

	println!("Deals: {}.", String::from_utf8_lossy(response.body()));

	rejected.assert_async().await;
	accepted.assert_async().await;

	Ok(())
}
