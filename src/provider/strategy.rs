//! Credential strategies that describe token requests and parse token responses.
//!
//! A strategy is pure: it never performs I/O. [`CredentialStrategy::build_request`] turns the
//! provider configuration (plus, for forced refreshes, the previous token) into a
//! [`TokenRequest`], and [`CredentialStrategy::parse_response`] pulls a [`TokenGrant`] out of a
//! successful token-endpoint body. The [`Broker`](crate::flows::Broker) does the sending.

mod client_credentials;
mod key_secret;
mod password;

pub mod scan;

pub use client_credentials::ClientCredentialsStrategy;
pub use key_secret::KeySecretHeaderStrategy;
pub use password::PasswordRefreshStrategy;

// crates.io
use oauth2::http::{
	self, HeaderName, HeaderValue, Method,
	header::{ACCEPT, CONTENT_TYPE},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	HttpRequest,
	auth::{Secret, TokenGrant},
	error::{AcquisitionError, ConfigError},
	provider::{GrantStrategy, ProviderConfig},
};

/// Request-building and response-parsing hooks for one grant variant.
///
/// Implementors are required to be `Send + Sync` and to stay free of I/O so they can be shared
/// between request handlers and the background refresh task.
pub trait CredentialStrategy: Send + Sync {
	/// Describes the token request. `prior` carries the currently cached token (fresh or stale)
	/// on forced refreshes and is `None` on first acquisition or on a plain cache miss.
	fn build_request(
		&self,
		config: &ProviderConfig,
		prior: Option<&Secret>,
	) -> Result<TokenRequest, ConfigError>;

	/// Extracts the token and optional TTL from a 2xx token-endpoint response body.
	fn parse_response(
		&self,
		config: &ProviderConfig,
		status: u16,
		body: &[u8],
	) -> Result<TokenGrant, AcquisitionError>;
}
impl GrantStrategy {
	/// Returns the built-in strategy implementing this grant.
	pub fn strategy(self) -> Arc<dyn CredentialStrategy> {
		match self {
			GrantStrategy::ClientCredentials => Arc::new(ClientCredentialsStrategy),
			GrantStrategy::PasswordWithRefresh => Arc::new(PasswordRefreshStrategy),
			GrantStrategy::KeySecretHeader => Arc::new(KeySecretHeaderStrategy),
		}
	}
}

/// Body encoding of a token request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenRequestBody {
	/// `application/x-www-form-urlencoded` fields.
	Form(Vec<(String, String)>),
	/// `application/json` document.
	Json(serde_json::Value),
}

/// Transport-agnostic description of an outbound token request.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRequest {
	/// HTTP method (always `POST` for the built-in strategies).
	pub method: Method,
	/// Token endpoint.
	pub url: Url,
	/// Extra headers beyond `Content-Type`/`Accept`.
	pub headers: Vec<(String, String)>,
	/// Encoded body.
	pub body: TokenRequestBody,
}
impl TokenRequest {
	/// Creates a form-encoded POST.
	pub fn form<I, K, V>(url: Url, fields: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let fields = fields.into_iter().map(|(key, value)| (key.into(), value.into())).collect();

		Self { method: Method::POST, url, headers: Vec::new(), body: TokenRequestBody::Form(fields) }
	}

	/// Creates a JSON POST.
	pub fn json(url: Url, body: serde_json::Value) -> Self {
		Self { method: Method::POST, url, headers: Vec::new(), body: TokenRequestBody::Json(body) }
	}

	/// Adds an extra header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Returns a form field value, if the body is form-encoded.
	pub fn form_field(&self, key: &str) -> Option<&str> {
		match &self.body {
			TokenRequestBody::Form(fields) =>
				fields.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str()),
			TokenRequestBody::Json(_) => None,
		}
	}

	/// Returns a header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}

	/// Encodes the description into an HTTP request for the transport.
	pub fn into_http(self) -> Result<HttpRequest, ConfigError> {
		let (content_type, body) = match &self.body {
			TokenRequestBody::Form(fields) => (
				"application/x-www-form-urlencoded",
				form_urlencoded::Serializer::new(String::new())
					.extend_pairs(fields.iter())
					.finish()
					.into_bytes(),
			),
			TokenRequestBody::Json(value) => ("application/json", serde_json::to_vec(value)?),
		};
		let mut builder = http::Request::builder()
			.method(self.method)
			.uri(self.url.as_str())
			.header(CONTENT_TYPE, content_type)
			.header(ACCEPT, "application/json");

		for (name, value) in self.headers {
			let header_name = HeaderName::from_bytes(name.as_bytes())
				.map_err(|_| ConfigError::InvalidHeader { name: name.clone() })?;
			let header_value = HeaderValue::from_str(&value)
				.map_err(|_| ConfigError::InvalidHeader { name: name.clone() })?;

			builder = builder.header(header_name, header_value);
		}

		Ok(builder.body(body)?)
	}
}
impl Debug for TokenRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let body = match &self.body {
			TokenRequestBody::Form(fields) =>
				fields.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>().join("&"),
			TokenRequestBody::Json(_) => "<json>".into(),
		};

		f.debug_struct("TokenRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &self.headers.iter().map(|(name, _)| name).collect::<Vec<_>>())
			.field("body_fields", &body)
			.finish()
	}
}

/// Standard OAuth-style token response shared by the form-encoded grants.
#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	expires_in: Option<ExpiresIn>,
}

/// `expires_in` as sent by upstreams: a JSON number or a numeric string.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ExpiresIn {
	Seconds(i64),
	Float(f64),
	Text(String),
}
impl ExpiresIn {
	pub(crate) fn as_duration(&self) -> Option<Duration> {
		match self {
			Self::Seconds(secs) => Some(Duration::seconds(*secs)),
			Self::Float(secs) if secs.is_finite() => Some(Duration::seconds(secs.trunc() as i64)),
			Self::Float(_) => None,
			Self::Text(raw) => raw.trim().parse::<i64>().ok().map(Duration::seconds),
		}
	}
}

/// Parses `{"access_token": ..., "expires_in": ...}` bodies.
pub(crate) fn parse_access_token_response(
	status: u16,
	body: &[u8],
) -> Result<TokenGrant, AcquisitionError> {
	let deserializer = &mut serde_json::Deserializer::from_slice(body);
	let response: AccessTokenResponse = serde_path_to_error::deserialize(deserializer)
		.map_err(|source| AcquisitionError::Parse { source, status })?;
	let token = response
		.access_token
		.filter(|token| !token.trim().is_empty())
		.ok_or(AcquisitionError::TokenNotFound { status })?;
	let mut grant = TokenGrant::new(token);

	if let Some(ttl) = response.expires_in.as_ref().and_then(ExpiresIn::as_duration) {
		grant = grant.with_ttl(ttl);
	}

	Ok(grant)
}
