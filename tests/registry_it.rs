mod common;

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use partner_auth_broker::{
	clock::ManualClock,
	error::Error,
	registry::ProviderRegistry,
	schedule::{RefreshScheduler, SchedulerState},
};
use time::{Duration, macros::datetime};
// self
use common::*;

type ScriptedRegistry = ProviderRegistry<ScriptedUpstream, ScriptedMapper>;

fn env() -> Vec<(&'static str, &'static str)> {
	vec![
		("FI_EXCHANGE_TOKEN_ENDPOINT", "https://fi.example.com/oauth/token"),
		("FI_EXCHANGE_GRANT_STRATEGY", "client_credentials"),
		("FI_EXCHANGE_CLIENT_ID", "dealer-app"),
		("FI_EXCHANGE_CLIENT_SECRET", "s3cr3t"),
		("LENDING_TOKEN_ENDPOINT", "https://lending.example.com/auth/token"),
		("LENDING_GRANT_STRATEGY", "password_with_refresh"),
		("LENDING_USERNAME", "dealer"),
		("LENDING_PROACTIVE_REFRESH_INTERVAL_SECONDS", "3000"),
		("DMS_TOKEN_ENDPOINT", "ftp://dms.example.com/token"),
		("DMS_GRANT_STRATEGY", "key_secret_header"),
	]
}

#[test]
fn load_skips_invalid_providers_and_keeps_the_rest() {
	let upstream = ScriptedUpstream::new();
	let registry = ScriptedRegistry::load(
		["fi-exchange", "lending", "dms", "bad name", "unconfigured"],
		env(),
		upstream,
		ScriptedMapper,
	);
	let providers = registry.providers().into_iter().map(|id| id.as_str()).collect::<Vec<_>>();

	assert_eq!(providers, vec!["fi-exchange", "lending"]);
	assert_eq!(registry.len(), 2);
	assert!(registry.get("dms").is_none());

	let lending = registry.get("lending").expect("Lending should be registered.");

	assert_eq!(lending.config.missing_credentials(), vec!["password"]);
}

#[tokio::test]
async fn invoke_routes_to_the_named_provider() {
	let upstream = ScriptedUpstream::new()
		.with_tokens([Reply::token("fi-token", 3600)])
		.with_business([Reply::ok_json("{\"deal\":7}")]);
	let registry =
		ScriptedRegistry::load(["fi-exchange", "lending"], env(), upstream.clone(), ScriptedMapper);
	let response = registry
		.invoke("fi-exchange", business_request)
		.await
		.expect("Registered provider should serve the call.");

	assert_eq!(response.status().as_u16(), 200);
	assert_eq!(upstream.business_calls()[0].authorization.as_deref(), Some("Bearer fi-token"));
	assert!(registry.get("lending").expect("Lending should be registered.").peek().is_none());
}

#[tokio::test]
async fn unknown_provider_is_an_error() {
	let registry = ScriptedRegistry::new();
	let err = registry
		.invoke("nowhere", business_request)
		.await
		.expect_err("Unregistered provider should be rejected.");

	assert!(matches!(err, Error::UnknownProvider { ref provider } if provider == "nowhere"));
	assert!(registry.is_empty());
}

#[test]
fn register_replaces_the_previous_broker() {
	let upstream = ScriptedUpstream::new();
	let mut registry = ScriptedRegistry::new();

	assert!(
		registry
			.register(scripted_broker(client_credentials_config("fi-exchange"), &upstream))
			.is_none()
	);
	assert!(
		registry
			.register(scripted_broker(client_credentials_config("fi-exchange"), &upstream))
			.is_some()
	);
	assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn start_refresh_arms_only_providers_with_an_interval() {
	let upstream = ScriptedUpstream::new();
	let registry =
		ScriptedRegistry::load(["fi-exchange", "lending"], env(), upstream, ScriptedMapper);
	let scheduler = registry.start_refresh();

	assert_eq!(scheduler.armed().iter().map(|id| id.as_str()).collect::<Vec<_>>(), vec!["lending"]);
	assert_eq!(scheduler.state("fi-exchange"), SchedulerState::Idle);

	scheduler.shutdown();

	assert!(scheduler.armed().is_empty());
}

#[tokio::test(start_paused = true)]
async fn armed_task_primes_then_replaces_stale_tokens() {
	let clock = ManualClock::new(datetime!(2025-03-01 09:00 UTC));
	let upstream = ScriptedUpstream::new()
		.with_tokens([Reply::token("one", 120), Reply::token("two", 120)]);
	let config = config_builder("fi-exchange")
		.client_credentials("dealer-app", "s3cr3t")
		.proactive_refresh_interval(Duration::seconds(30))
		.build()
		.expect("Configuration with an interval should build.");
	let broker = Arc::new(scripted_broker(config, &upstream).with_clock(clock.clone()));
	let scheduler = RefreshScheduler::new();

	assert!(scheduler.arm(broker.clone()));
	assert!(!scheduler.arm(broker.clone()));
	assert_eq!(scheduler.state("fi-exchange"), SchedulerState::Armed);

	tokio::time::sleep(StdDuration::from_secs(1)).await;

	assert_eq!(upstream.token_calls().len(), 1);
	assert_eq!(
		broker.peek().map(|token| token.value().expose().to_owned()).as_deref(),
		Some("one")
	);

	// Fresh at the first tick: nothing to do.
	tokio::time::sleep(StdDuration::from_secs(30)).await;

	assert_eq!(upstream.token_calls().len(), 1);

	clock.advance(Duration::seconds(61));
	tokio::time::sleep(StdDuration::from_secs(30)).await;

	assert_eq!(upstream.token_calls().len(), 2);
	assert_eq!(
		broker.peek().map(|token| token.value().expose().to_owned()).as_deref(),
		Some("two")
	);
	assert_eq!(broker.metrics.forced_refreshes(), 1);

	scheduler.shutdown();

	assert_eq!(scheduler.state("fi-exchange"), SchedulerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_the_task_armed() {
	let clock = ManualClock::new(datetime!(2025-03-01 09:00 UTC));
	let upstream = ScriptedUpstream::new()
		.with_tokens([Reply::status(503, ""), Reply::token("late", 3600)]);
	let config = config_builder("fi-exchange")
		.client_credentials("dealer-app", "s3cr3t")
		.proactive_refresh_interval(Duration::seconds(10))
		.build()
		.expect("Configuration with an interval should build.");
	let broker = Arc::new(scripted_broker(config, &upstream).with_clock(clock));
	let scheduler = RefreshScheduler::new();

	assert!(scheduler.arm(broker.clone()));

	tokio::time::sleep(StdDuration::from_secs(1)).await;

	assert!(broker.peek().is_none());
	assert_eq!(scheduler.state("fi-exchange"), SchedulerState::Armed);

	tokio::time::sleep(StdDuration::from_secs(10)).await;

	assert_eq!(
		broker.peek().map(|token| token.value().expose().to_owned()).as_deref(),
		Some("late")
	);
	assert_eq!(broker.metrics.failures(), 1);

	scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn oversized_interval_is_clamped_instead_of_killing_the_task() {
	let upstream = ScriptedUpstream::new().with_tokens([Reply::token("one", 3600)]);
	let mut config = client_credentials_config("fi-exchange");

	config.proactive_refresh_interval = Some(Duration::seconds(i64::MAX));

	let broker = Arc::new(scripted_broker(config, &upstream));
	let scheduler = RefreshScheduler::new();

	assert!(scheduler.arm(broker.clone()));

	tokio::time::sleep(StdDuration::from_secs(1)).await;

	assert_eq!(upstream.token_calls().len(), 1);
	assert_eq!(scheduler.state("fi-exchange"), SchedulerState::Armed);

	scheduler.shutdown();
}

#[test]
fn arming_without_a_runtime_leaves_the_provider_idle() {
	let upstream = ScriptedUpstream::new();
	let config = config_builder("fi-exchange")
		.client_credentials("dealer-app", "s3cr3t")
		.proactive_refresh_interval(Duration::seconds(10))
		.build()
		.expect("Configuration with an interval should build.");
	let scheduler = RefreshScheduler::new();

	assert!(!scheduler.arm(Arc::new(scripted_broker(config, &upstream))));
	assert_eq!(scheduler.state("fi-exchange"), SchedulerState::Idle);
	assert!(upstream.token_calls().is_empty());
}
