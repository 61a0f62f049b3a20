// self
use crate::{
	auth::{Secret, TokenGrant},
	error::{AcquisitionError, ConfigError},
	provider::{
		ProviderConfig,
		strategy::{self, CredentialStrategy, TokenRequest},
	},
};

/// Form-encoded `grant_type=client_credentials` exchange with the client id and secret in the
/// body; reads `access_token`/`expires_in` from the JSON response.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClientCredentialsStrategy;
impl CredentialStrategy for ClientCredentialsStrategy {
	fn build_request(
		&self,
		config: &ProviderConfig,
		_prior: Option<&Secret>,
	) -> Result<TokenRequest, ConfigError> {
		let client_id = config.credential("client_id")?;
		let client_secret = config.credential("client_secret")?;

		Ok(TokenRequest::form(
			config.token_endpoint.clone(),
			[
				("grant_type", "client_credentials"),
				("client_id", client_id),
				("client_secret", client_secret),
			],
		))
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
