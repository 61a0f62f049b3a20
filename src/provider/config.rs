//! Provider configuration data structures, builder, and validation.

// self
use crate::{
	_prelude::*,
	auth::{ProviderId, Secret},
	error::ConfigError,
	provider::{InvalidityMarkers, ProviderQuirks},
};

/// Credential-exchange protocol used to obtain a provider's bearer token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantStrategy {
	/// Form-encoded `grant_type=client_credentials` with client id + secret.
	ClientCredentials,
	/// Username/password login; forced refreshes resubmit the previous token.
	PasswordWithRefresh,
	/// Client id header plus access-key/secret-key form fields.
	KeySecretHeader,
}
impl GrantStrategy {
	/// Returns the configuration identifier for the strategy.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantStrategy::ClientCredentials => "client_credentials",
			GrantStrategy::PasswordWithRefresh => "password_with_refresh",
			GrantStrategy::KeySecretHeader => "key_secret_header",
		}
	}

	/// Credential fields that must be configured before a token can be requested.
	pub fn required_fields(self) -> &'static [&'static str] {
		match self {
			GrantStrategy::ClientCredentials => &["client_id", "client_secret"],
			GrantStrategy::PasswordWithRefresh => &["username", "password"],
			GrantStrategy::KeySecretHeader => &["client_id", "access_key", "secret_key"],
		}
	}
}
impl Display for GrantStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for GrantStrategy {
	type Err = ProviderConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let normalized = s
			.trim()
			.chars()
			.filter(|ch| !matches!(ch, '_' | '-' | ' '))
			.collect::<String>()
			.to_ascii_lowercase();

		match normalized.as_str() {
			"clientcredentials" => Ok(Self::ClientCredentials),
			"passwordwithrefresh" | "password" => Ok(Self::PasswordWithRefresh),
			"keysecretheader" | "keysecret" => Ok(Self::KeySecretHeader),
			_ => Err(ProviderConfigError::UnknownGrantStrategy { value: s.to_owned() }),
		}
	}
}

/// Credential fields; which ones are required depends on the [`GrantStrategy`].
///
/// Missing fields are tolerated at construction time so one misconfigured provider cannot stop
/// the process; acquisition fails fast with [`ConfigError::MissingCredential`] instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialFields {
	/// OAuth client identifier (client credentials, key/secret header).
	pub client_id: Option<String>,
	/// OAuth client secret.
	pub client_secret: Option<Secret>,
	/// Login name for the password grant.
	pub username: Option<String>,
	/// Password for the password grant.
	pub password: Option<Secret>,
	/// Access key for the key/secret header grant.
	pub access_key: Option<String>,
	/// Secret key for the key/secret header grant.
	pub secret_key: Option<Secret>,
}
impl CredentialFields {
	/// Looks up a field by its configuration label; blank values count as missing.
	pub fn get(&self, field: &str) -> Option<&str> {
		let value = match field {
			"client_id" => self.client_id.as_deref(),
			"client_secret" => self.client_secret.as_ref().map(Secret::expose),
			"username" => self.username.as_deref(),
			"password" => self.password.as_ref().map(Secret::expose),
			"access_key" => self.access_key.as_deref(),
			"secret_key" => self.secret_key.as_ref().map(Secret::expose),
			_ => None,
		};

		value.filter(|value| !value.trim().is_empty())
	}
}

/// Errors raised while constructing or validating provider configuration.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ProviderConfigError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Grant strategy is mandatory.
	#[error("Missing grant strategy.")]
	MissingGrantStrategy,
	/// Grant strategy label is not recognized.
	#[error("Unknown grant strategy `{value}`.")]
	UnknownGrantStrategy {
		/// Label that failed to parse.
		value: String,
	},
	/// Token endpoint could not be parsed.
	#[error("Token endpoint `{value}` is not a valid URL.")]
	InvalidTokenEndpoint {
		/// Raw endpoint value.
		value: String,
	},
	/// Token endpoint must be reachable over HTTP(S).
	#[error("Token endpoint must use http or https: {url}.")]
	UnsupportedScheme {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A numeric setting could not be parsed.
	#[error("Setting `{key}` has invalid numeric value `{value}`.")]
	InvalidNumber {
		/// Setting key.
		key: String,
		/// Raw value.
		value: String,
	},
	/// A duration setting must be strictly positive.
	#[error("Setting `{field}` must be positive.")]
	NonPositiveDuration {
		/// Setting label.
		field: &'static str,
	},
	/// The safety margin cannot be negative.
	#[error("Refresh safety margin cannot be negative.")]
	NegativeSafetyMargin,
	/// A duration setting exceeds its upper bound.
	#[error("Setting `{field}` cannot exceed {max}.")]
	DurationTooLong {
		/// Setting label.
		field: &'static str,
		/// Largest accepted value.
		max: Duration,
	},
}

/// Static configuration for one upstream provider, loaded once at start-up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
	/// Unique provider key.
	pub id: ProviderId,
	/// Token endpoint used for every acquisition.
	pub token_endpoint: Url,
	/// Credential exchange protocol.
	pub grant_strategy: GrantStrategy,
	/// Strategy-dependent credential fields.
	pub credentials: CredentialFields,
	/// Lifetime assumed when the token response omits an expiry.
	pub default_ttl: Duration,
	/// How early a token is treated as stale.
	pub refresh_safety_margin: Duration,
	/// Wake interval of the proactive refresh task; `None` disables it.
	pub proactive_refresh_interval: Option<Duration>,
	/// Upper bound on one token-endpoint round-trip; `None` relies on the transport.
	pub acquisition_timeout: Option<Duration>,
	/// Markers used to classify business responses as invalid-token.
	pub markers: InvalidityMarkers,
	/// Provider-specific wire-format toggles.
	pub quirks: ProviderQuirks,
}
impl ProviderConfig {
	/// Lifetime used when the token endpoint does not report one.
	pub const DEFAULT_TTL: Duration = Duration::seconds(3600);
	/// Safety margin used when the provider does not configure one.
	pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::seconds(60);
	/// Longest accepted proactive refresh interval.
	pub const MAX_REFRESH_INTERVAL: Duration = Duration::days(30);

	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderConfigBuilder {
		ProviderConfigBuilder::new(id)
	}

	/// Returns a required credential or fails fast without touching the network.
	pub fn credential(&self, field: &'static str) -> Result<&str, ConfigError> {
		self.credentials
			.get(field)
			.ok_or_else(|| ConfigError::MissingCredential { provider: self.id.to_string(), field })
	}

	/// Lists the credential fields the grant strategy needs but the provider lacks.
	pub fn missing_credentials(&self) -> Vec<&'static str> {
		self.grant_strategy
			.required_fields()
			.iter()
			.copied()
			.filter(|field| self.credentials.get(field).is_none())
			.collect()
	}

	fn validate(&self) -> Result<(), ProviderConfigError> {
		if !matches!(self.token_endpoint.scheme(), "http" | "https") {
			return Err(ProviderConfigError::UnsupportedScheme {
				url: self.token_endpoint.to_string(),
			});
		}
		if !self.default_ttl.is_positive() {
			return Err(ProviderConfigError::NonPositiveDuration { field: "default_ttl" });
		}
		if self.refresh_safety_margin.is_negative() {
			return Err(ProviderConfigError::NegativeSafetyMargin);
		}
		if self.proactive_refresh_interval.is_some_and(|interval| !interval.is_positive()) {
			return Err(ProviderConfigError::NonPositiveDuration {
				field: "proactive_refresh_interval",
			});
		}
		if self
			.proactive_refresh_interval
			.is_some_and(|interval| interval > Self::MAX_REFRESH_INTERVAL)
		{
			return Err(ProviderConfigError::DurationTooLong {
				field: "proactive_refresh_interval",
				max: Self::MAX_REFRESH_INTERVAL,
			});
		}
		if self.acquisition_timeout.is_some_and(|timeout| !timeout.is_positive()) {
			return Err(ProviderConfigError::NonPositiveDuration { field: "acquisition_timeout" });
		}

		Ok(())
	}
}

/// Builder for [`ProviderConfig`] values.
#[derive(Debug)]
pub struct ProviderConfigBuilder {
	/// Identifier for the provider being configured.
	pub id: ProviderId,
	/// Token endpoint.
	pub token_endpoint: Option<Url>,
	/// Grant strategy.
	pub grant_strategy: Option<GrantStrategy>,
	/// Credential fields.
	pub credentials: CredentialFields,
	/// Fallback token lifetime.
	pub default_ttl: Duration,
	/// Staleness safety margin.
	pub refresh_safety_margin: Duration,
	/// Proactive refresh interval.
	pub proactive_refresh_interval: Option<Duration>,
	/// Acquisition timeout.
	pub acquisition_timeout: Option<Duration>,
	/// Invalid-token markers.
	pub markers: InvalidityMarkers,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderConfigBuilder {
	/// Creates a new builder seeded with the provided identifier and default timings.
	pub fn new(id: ProviderId) -> Self {
		Self {
			id,
			token_endpoint: None,
			grant_strategy: None,
			credentials: CredentialFields::default(),
			default_ttl: ProviderConfig::DEFAULT_TTL,
			refresh_safety_margin: ProviderConfig::DEFAULT_SAFETY_MARGIN,
			proactive_refresh_interval: None,
			acquisition_timeout: None,
			markers: InvalidityMarkers::default(),
			quirks: ProviderQuirks::default(),
		}
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the grant strategy.
	pub fn grant_strategy(mut self, strategy: GrantStrategy) -> Self {
		self.grant_strategy = Some(strategy);

		self
	}

	/// Selects the client-credentials grant with the given client id + secret.
	pub fn client_credentials(
		mut self,
		client_id: impl Into<String>,
		client_secret: impl Into<Secret>,
	) -> Self {
		self.grant_strategy = Some(GrantStrategy::ClientCredentials);
		self.credentials.client_id = Some(client_id.into());
		self.credentials.client_secret = Some(client_secret.into());

		self
	}

	/// Selects the password grant with the given login.
	pub fn password(mut self, username: impl Into<String>, password: impl Into<Secret>) -> Self {
		self.grant_strategy = Some(GrantStrategy::PasswordWithRefresh);
		self.credentials.username = Some(username.into());
		self.credentials.password = Some(password.into());

		self
	}

	/// Selects the key/secret header grant.
	pub fn key_secret(
		mut self,
		client_id: impl Into<String>,
		access_key: impl Into<String>,
		secret_key: impl Into<Secret>,
	) -> Self {
		self.grant_strategy = Some(GrantStrategy::KeySecretHeader);
		self.credentials.client_id = Some(client_id.into());
		self.credentials.access_key = Some(access_key.into());
		self.credentials.secret_key = Some(secret_key.into());

		self
	}

	/// Replaces all credential fields.
	pub fn credentials(mut self, credentials: CredentialFields) -> Self {
		self.credentials = credentials;

		self
	}

	/// Overrides the fallback token lifetime (defaults to 3600 seconds).
	pub fn default_ttl(mut self, ttl: Duration) -> Self {
		self.default_ttl = ttl;

		self
	}

	/// Overrides the safety margin (defaults to 60 seconds).
	pub fn refresh_safety_margin(mut self, margin: Duration) -> Self {
		self.refresh_safety_margin = margin;

		self
	}

	/// Enables the proactive refresh task with the given wake interval.
	pub fn proactive_refresh_interval(mut self, interval: Duration) -> Self {
		self.proactive_refresh_interval = Some(interval);

		self
	}

	/// Bounds every token-endpoint round-trip.
	pub fn acquisition_timeout(mut self, timeout: Duration) -> Self {
		self.acquisition_timeout = Some(timeout);

		self
	}

	/// Overrides the invalid-token markers.
	pub fn markers(mut self, markers: InvalidityMarkers) -> Self {
		self.markers = markers;

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ProviderConfig, ProviderConfigError> {
		let token_endpoint =
			self.token_endpoint.ok_or(ProviderConfigError::MissingTokenEndpoint)?;
		let grant_strategy =
			self.grant_strategy.ok_or(ProviderConfigError::MissingGrantStrategy)?;
		let config = ProviderConfig {
			id: self.id,
			token_endpoint,
			grant_strategy,
			credentials: self.credentials,
			default_ttl: self.default_ttl,
			refresh_safety_margin: self.refresh_safety_margin,
			proactive_refresh_interval: self.proactive_refresh_interval,
			acquisition_timeout: self.acquisition_timeout,
			markers: self.markers,
			quirks: self.quirks,
		};

		config.validate()?;

		Ok(config)
	}
}
