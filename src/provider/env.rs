//! Environment-style configuration loader.
//!
//! Every key is prefixed with the provider's [`ProviderId::env_prefix`], e.g. the provider
//! `dms` reads `DMS_TOKEN_ENDPOINT`, `DMS_GRANT_STRATEGY`, `DMS_CLIENT_ID`, and so on. Blank
//! values are treated as absent.

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, Secret},
	provider::{
		CredentialFields, GrantStrategy, InvalidityMarkers, ProviderConfig, ProviderConfigError,
	},
};

/// Key suffixes understood by [`ProviderConfig::from_env_vars`].
pub mod keys {
	/// Token endpoint URL.
	pub const TOKEN_ENDPOINT: &str = "TOKEN_ENDPOINT";
	/// Grant strategy label.
	pub const GRANT_STRATEGY: &str = "GRANT_STRATEGY";
	/// OAuth client identifier.
	pub const CLIENT_ID: &str = "CLIENT_ID";
	/// OAuth client secret.
	pub const CLIENT_SECRET: &str = "CLIENT_SECRET";
	/// Password grant login.
	pub const USERNAME: &str = "USERNAME";
	/// Password grant password.
	pub const PASSWORD: &str = "PASSWORD";
	/// Key/secret grant access key.
	pub const ACCESS_KEY: &str = "ACCESS_KEY";
	/// Key/secret grant secret key.
	pub const SECRET_KEY: &str = "SECRET_KEY";
	/// Fallback token lifetime in seconds.
	pub const DEFAULT_TTL_SECONDS: &str = "DEFAULT_TTL_SECONDS";
	/// Safety margin in seconds.
	pub const REFRESH_SAFETY_MARGIN_SECONDS: &str = "REFRESH_SAFETY_MARGIN_SECONDS";
	/// Proactive refresh interval in seconds.
	pub const PROACTIVE_REFRESH_INTERVAL_SECONDS: &str = "PROACTIVE_REFRESH_INTERVAL_SECONDS";
	/// Acquisition timeout in seconds.
	pub const ACQUISITION_TIMEOUT_SECONDS: &str = "ACQUISITION_TIMEOUT_SECONDS";
	/// Comma-separated invalid-token phrases (replaces the defaults).
	pub const INVALID_TOKEN_MARKERS: &str = "INVALID_TOKEN_MARKERS";
	/// Comma-separated integer sentinels.
	pub const INVALID_TOKEN_CODES: &str = "INVALID_TOKEN_CODES";
	/// Header name carrying the client id for the key/secret grant.
	pub const CLIENT_ID_HEADER: &str = "CLIENT_ID_HEADER";
	/// JSON field carrying the previous token for the password grant.
	pub const REFRESH_TOKEN_FIELD: &str = "REFRESH_TOKEN_FIELD";
}

impl ProviderConfig {
	/// Loads the provider's configuration from the process environment.
	pub fn from_env(id: ProviderId) -> Result<Self, ProviderConfigError> {
		Self::from_env_vars(id, std::env::vars())
	}

	/// Loads the provider's configuration from arbitrary key/value pairs.
	pub fn from_env_vars<I, K, V>(id: ProviderId, vars: I) -> Result<Self, ProviderConfigError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let prefix = format!("{}_", id.env_prefix());
		let vars = EnvView::collect(&prefix, vars);
		let endpoint_raw =
			vars.get(keys::TOKEN_ENDPOINT).ok_or(ProviderConfigError::MissingTokenEndpoint)?;
		let token_endpoint = Url::parse(endpoint_raw).map_err(|_| {
			ProviderConfigError::InvalidTokenEndpoint { value: endpoint_raw.to_owned() }
		})?;
		let grant_strategy = vars
			.get(keys::GRANT_STRATEGY)
			.ok_or(ProviderConfigError::MissingGrantStrategy)?
			.parse::<GrantStrategy>()?;
		let credentials = CredentialFields {
			client_id: vars.get(keys::CLIENT_ID).map(str::to_owned),
			client_secret: vars.get(keys::CLIENT_SECRET).map(Secret::from),
			username: vars.get(keys::USERNAME).map(str::to_owned),
			password: vars.get(keys::PASSWORD).map(Secret::from),
			access_key: vars.get(keys::ACCESS_KEY).map(str::to_owned),
			secret_key: vars.get(keys::SECRET_KEY).map(Secret::from),
		};
		let mut builder = ProviderConfig::builder(id)
			.token_endpoint(token_endpoint)
			.grant_strategy(grant_strategy)
			.credentials(credentials);

		if let Some(ttl) = vars.seconds(&prefix, keys::DEFAULT_TTL_SECONDS)? {
			builder = builder.default_ttl(ttl);
		}
		if let Some(margin) = vars.seconds(&prefix, keys::REFRESH_SAFETY_MARGIN_SECONDS)? {
			builder = builder.refresh_safety_margin(margin);
		}
		if let Some(interval) = vars.seconds(&prefix, keys::PROACTIVE_REFRESH_INTERVAL_SECONDS)? {
			builder = builder.proactive_refresh_interval(interval);
		}
		if let Some(timeout) = vars.seconds(&prefix, keys::ACQUISITION_TIMEOUT_SECONDS)? {
			builder = builder.acquisition_timeout(timeout);
		}

		let phrases = vars.get(keys::INVALID_TOKEN_MARKERS).map(split_list);
		let codes = vars
			.get(keys::INVALID_TOKEN_CODES)
			.map(|raw| {
				split_list(raw)
					.into_iter()
					.map(|code| parse_number(&prefix, keys::INVALID_TOKEN_CODES, code))
					.collect::<Result<Vec<i64>, _>>()
			})
			.transpose()?;

		if phrases.is_some() || codes.is_some() {
			let phrases = phrases.unwrap_or_else(|| InvalidityMarkers::DEFAULT_PHRASES.to_vec());

			builder = builder.markers(InvalidityMarkers::new(phrases, codes.unwrap_or_default()));
		}
		if let Some(header) = vars.get(keys::CLIENT_ID_HEADER) {
			builder.quirks.client_id_header = header.to_owned();
		}
		if let Some(field) = vars.get(keys::REFRESH_TOKEN_FIELD) {
			builder.quirks.refresh_token_field = field.to_owned();
		}

		builder.build()
	}
}

struct EnvView(HashMap<String, String>);
impl EnvView {
	fn collect<I, K, V>(prefix: &str, vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: AsRef<str>,
		V: Into<String>,
	{
		let map = vars
			.into_iter()
			.filter_map(|(key, value)| {
				let suffix = key.as_ref().strip_prefix(prefix)?.to_owned();
				let value: String = value.into();
				let trimmed = value.trim();

				(!trimmed.is_empty()).then(|| (suffix, trimmed.to_owned()))
			})
			.collect();

		Self(map)
	}

	fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	fn seconds(&self, prefix: &str, key: &str) -> Result<Option<Duration>, ProviderConfigError> {
		self.get(key).map(|raw| parse_number(prefix, key, raw).map(Duration::seconds)).transpose()
	}
}

fn parse_number(prefix: &str, key: &str, raw: &str) -> Result<i64, ProviderConfigError> {
	raw.trim().parse::<i64>().map_err(|_| ProviderConfigError::InvalidNumber {
		key: format!("{prefix}{key}"),
		value: raw.to_owned(),
	})
}

fn split_list(raw: &str) -> Vec<&str> {
	raw.split(',').map(str::trim).filter(|item| !item.is_empty()).collect()
}
