//! Broker-level error types shared across acquisition, invocation, and configuration.

// self
use crate::{_prelude::*, auth::ProviderId, provider::ProviderConfigError};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// No token could be obtained for the provider; callers should retry later.
	#[error("Authentication is unavailable for provider `{provider}`.")]
	AuthUnavailable {
		/// Provider whose token could not be acquired.
		provider: ProviderId,
		/// Underlying acquisition failure.
		#[source]
		source: AcquisitionError,
	},
	/// The registry has no broker for the requested provider.
	#[error("Provider `{provider}` is not registered.")]
	UnknownProvider {
		/// Provider name supplied by the caller.
		provider: String,
	},
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure while calling the upstream business endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl Error {
	/// Returns `true` when the error means "no token right now" rather than a hard failure.
	pub fn is_auth_unavailable(&self) -> bool {
		matches!(self, Self::AuthUnavailable { .. })
	}
}
impl From<oauth2::http::Error> for Error {
	fn from(e: oauth2::http::Error) -> Self {
		ConfigError::from(e).into()
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider configuration is invalid.
	#[error(transparent)]
	Provider(#[from] ProviderConfigError),

	/// The grant strategy needs a credential field the provider does not configure.
	#[error("Provider `{provider}` is missing the `{field}` credential.")]
	MissingCredential {
		/// Provider identifier string.
		provider: String,
		/// Missing field label.
		field: &'static str,
	},
	/// A configured value cannot be sent as an HTTP header.
	#[error("The `{name}` header value is not a valid HTTP header.")]
	InvalidHeader {
		/// Header name that failed validation.
		name: String,
	},
	/// A token request body could not be serialized.
	#[error("Token request body could not be serialized.")]
	RequestBody(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Reasons a token could not be acquired; every variant means "no token available".
#[derive(Debug, ThisError)]
pub enum AcquisitionError {
	/// The provider is misconfigured, so no request was sent.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint answered with a non-2xx status.
	#[error("Token endpoint rejected the request with HTTP {status}.")]
	Rejected {
		/// HTTP status code.
		status: u16,
		/// Truncated response body for diagnostics.
		body_preview: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code.
		status: u16,
	},
	/// Token endpoint responded successfully but no token could be located.
	#[error("Token endpoint response did not contain a token.")]
	TokenNotFound {
		/// HTTP status code.
		status: u16,
	},
	/// Token endpoint could not be reached.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token endpoint did not answer within the configured acquisition timeout.
	#[error("Token endpoint did not respond within {timeout}.")]
	TimedOut {
		/// Configured timeout.
		timeout: Duration,
	},
}
impl AcquisitionError {
	/// HTTP status code returned by the token endpoint, when one was observed.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. }
			| Self::Parse { status, .. }
			| Self::TokenNotFound { status } => Some(*status),
			Self::Transport(err) => err.status(),
			Self::Config(_) | Self::TimedOut { .. } => None,
		}
	}
}

/// Transport-level failures (network, IO, request translation).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the upstream endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the upstream endpoint.")]
	Io(#[from] std::io::Error),
	/// Request could not be translated into the transport's request type.
	#[error("Request could not be handed to the HTTP client.")]
	Request(#[from] oauth2::http::Error),
	/// Request timed out inside the transport.
	#[error("Request timed out while calling the upstream endpoint.")]
	TimedOut {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Any other transport failure.
	#[error("HTTP client error occurred while calling the upstream endpoint: {message}.")]
	Other {
		/// Transport-supplied message.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// HTTP status code captured before the failure, when available.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::TimedOut { status, .. } | Self::Other { status, .. } => *status,
			Self::Network { .. } | Self::Io(_) | Self::Request(_) => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn auth_unavailable_exposes_acquisition_source() {
		let provider = ProviderId::new("dms").expect("Provider fixture should be valid.");
		let err = Error::AuthUnavailable {
			provider,
			source: AcquisitionError::TokenNotFound { status: 200 },
		};

		assert!(err.is_auth_unavailable());
		assert_eq!(err.to_string(), "Authentication is unavailable for provider `dms`.");

		let source = StdError::source(&err).expect("Acquisition failure should be the source.");

		assert_eq!(source.to_string(), "Token endpoint response did not contain a token.");
	}

	#[test]
	fn acquisition_status_reads_through_transport() {
		let err = AcquisitionError::from(TransportError::Other {
			message: "connection reset".into(),
			status: Some(502),
		});

		assert_eq!(err.status(), Some(502));
		assert_eq!(AcquisitionError::TimedOut { timeout: Duration::seconds(5) }.status(), None);
		assert!(!Error::UnknownProvider { provider: "nope".into() }.is_auth_unavailable());
	}
}
