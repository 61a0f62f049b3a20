// crates.io
use httpmock::prelude::*;
use partner_auth_broker::{
	auth::ProviderId,
	error::{AcquisitionError, ConfigError, Error},
	flows::ReqwestBroker,
	provider::{CredentialFields, GrantStrategy, ProviderConfig, ProviderConfigBuilder},
	url::Url,
};
use time::Duration;

fn builder(server: &MockServer, name: &str, path: &str) -> ProviderConfigBuilder {
	let provider = ProviderId::new(name).expect("Provider identifier should be valid.");

	ProviderConfig::builder(provider).token_endpoint(
		Url::parse(&server.url(path)).expect("Mock token endpoint should parse successfully."),
	)
}

fn client_credentials_broker(server: &MockServer) -> ReqwestBroker {
	ReqwestBroker::new(
		builder(server, "fi-exchange", "/oauth/token")
			.client_credentials("dealer-app", "s3cr3t")
			.build()
			.expect("Client credentials configuration should build."),
	)
}

#[tokio::test]
async fn client_credentials_acquires_then_serves_from_cache() {
	let server = MockServer::start_async().await;
	let broker = client_credentials_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.body_includes("grant_type=client_credentials")
				.body_includes("client_id=dealer-app")
				.body_includes("client_secret=s3cr3t");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"abc\",\"expires_in\":3600}");
		})
		.await;

	assert!(broker.peek().is_none());

	let first = broker.token().await.expect("Initial acquisition should succeed.");
	let second = broker.token().await.expect("Cached acquisition should succeed.");

	assert_eq!(first.value().expose(), "abc");
	assert_eq!(second.value().expose(), "abc");
	assert!(broker.peek().is_some());
	assert_eq!(broker.metrics.token_requests(), 1);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_misses_share_one_token_request() {
	let server = MockServer::start_async().await;
	let broker = client_credentials_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"shared\",\"expires_in\":3600}");
		})
		.await;
	let (a, b, c) = tokio::join!(broker.token(), broker.token(), broker.token());

	for token in [a, b, c] {
		assert_eq!(token.expect("Every caller should receive the token.").value().expose(), "shared");
	}

	assert_eq!(broker.metrics.token_requests(), 1);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn missing_credentials_fail_without_network() {
	let server = MockServer::start_async().await;
	let config = builder(&server, "fi-exchange", "/oauth/token")
		.grant_strategy(GrantStrategy::ClientCredentials)
		.credentials(CredentialFields { client_id: Some("dealer-app".into()), ..Default::default() })
		.build()
		.expect("Configuration without secrets should still build.");

	assert_eq!(config.missing_credentials(), vec!["client_secret"]);

	let broker = ReqwestBroker::new(config);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200).body("{\"access_token\":\"never\"}");
		})
		.await;
	let err = broker.token().await.expect_err("Acquisition should fail fast.");

	assert!(matches!(
		err,
		Error::AuthUnavailable {
			source: AcquisitionError::Config(ConfigError::MissingCredential {
				field: "client_secret",
				..
			}),
			..
		}
	));
	assert_eq!(broker.metrics.failures(), 1);

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_acquisition_leaves_cache_empty() {
	let server = MockServer::start_async().await;
	let broker = client_credentials_broker(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(500)
				.header("retry-after", "30")
				.body("{\"error\":\"temporarily_unavailable\"}");
		})
		.await;
	let err = broker.token().await.expect_err("A 500 should not produce a token.");

	assert!(err.is_auth_unavailable());

	let Error::AuthUnavailable { source, .. } = err else {
		panic!("Expected AuthUnavailable, got {err:?}.");
	};

	assert_eq!(source.status(), Some(500));
	assert!(matches!(
		source,
		AcquisitionError::Rejected { ref body_preview, retry_after: Some(retry_after), .. }
			if body_preview.contains("temporarily_unavailable")
				&& retry_after == Duration::seconds(30)
	));
	assert!(broker.peek().is_none());
	assert!(broker.cache().current().is_none());
}

#[tokio::test]
async fn success_without_token_is_token_not_found() {
	let server = MockServer::start_async().await;
	let broker = client_credentials_broker(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;
	let err = broker.token().await.expect_err("Missing access_token should fail.");

	assert!(matches!(
		err,
		Error::AuthUnavailable { source: AcquisitionError::TokenNotFound { status: 200 }, .. }
	));
	assert!(broker.peek().is_none());
}

#[tokio::test]
async fn key_secret_sends_header_and_falls_back_to_default_ttl() {
	let server = MockServer::start_async().await;
	let broker = ReqwestBroker::new(
		builder(&server, "dms", "/api/token")
			.key_secret("dealer-42", "AKIA123", "shh")
			.default_ttl(Duration::minutes(10))
			.refresh_safety_margin(Duration::ZERO)
			.build()
			.expect("Key/secret configuration should build."),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/token")
				.header("client-id", "dealer-42")
				.body_includes("grant_type=client_credentials")
				.body_includes("access_key=AKIA123")
				.body_includes("secret_key=shh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"dms-token\"}");
		})
		.await;
	let token = broker.token().await.expect("Key/secret acquisition should succeed.");

	assert_eq!(token.value().expose(), "dms-token");
	assert_eq!(token.expires_at() - token.issued_at(), Duration::minutes(10));

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn password_grant_scans_envelope_and_resubmits_previous_token() {
	let server = MockServer::start_async().await;
	let broker = ReqwestBroker::new(
		builder(&server, "lending", "/auth/login")
			.password("dealer", "hunter2")
			.refresh_safety_margin(Duration::ZERO)
			.build()
			.expect("Password configuration should build."),
	);
	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/login")
				.header("content-type", "application/json")
				.body_includes("\"username\":\"dealer\"")
				.body_includes("\"password\":\"hunter2\"");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"status\":\"ok\",\"data\":{\"session\":{\"jwt\":\"aaa.bbb.ccc\"},\"expiresIn\":900}}",
				);
		})
		.await;
	let first = broker.token().await.expect("Password login should succeed.");

	assert_eq!(first.value().expose(), "aaa.bbb.ccc");
	assert_eq!(first.expires_at() - first.issued_at(), Duration::seconds(900));

	login.assert_calls_async(1).await;

	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login").body_includes("\"refreshToken\":\"aaa.bbb.ccc\"");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"result\":{\"token\":\"ddd.eee.fff\"}}");
		})
		.await;
	let second = broker.force_refresh(None).await.expect("Forced refresh should succeed.");

	assert_eq!(second.value().expose(), "ddd.eee.fff");
	assert_eq!(
		broker.peek().map(|token| token.value().expose().to_owned()).as_deref(),
		Some("ddd.eee.fff")
	);
	assert_eq!(broker.metrics.forced_refreshes(), 1);

	refresh.assert_calls_async(1).await;
}
