// self
use crate::{
	auth::{Secret, TokenGrant},
	error::{AcquisitionError, ConfigError},
	provider::{
		ProviderConfig,
		strategy::{self, CredentialStrategy, TokenRequest},
	},
};

/// Client identifier header plus `access_key`/`secret_key` form fields under
/// `grant_type=client_credentials`.
///
/// The header name comes from [`ProviderQuirks::client_id_header`](crate::provider::ProviderQuirks).
/// A response without `expires_in` falls back to the provider's default TTL.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeySecretHeaderStrategy;
impl CredentialStrategy for KeySecretHeaderStrategy {
	fn build_request(
		&self,
		config: &ProviderConfig,
		_prior: Option<&Secret>,
	) -> Result<TokenRequest, ConfigError> {
		let client_id = config.credential("client_id")?;
		let access_key = config.credential("access_key")?;
		let secret_key = config.credential("secret_key")?;

		Ok(TokenRequest::form(
			config.token_endpoint.clone(),
			[
				("grant_type", "client_credentials"),
				("access_key", access_key),
				("secret_key", secret_key),
			],
		)
		.with_header(config.quirks.client_id_header.as_str(), client_id))
	}

	fn parse_response(
		&self,
		_config: &ProviderConfig,
		status: u16,
		body: &[u8],
	) -> Result<TokenGrant, AcquisitionError> {
		strategy::parse_access_token_response(status, body)
	}
}
