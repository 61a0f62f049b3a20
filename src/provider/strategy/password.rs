// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	auth::{Secret, TokenGrant},
	error::{AcquisitionError, ConfigError},
	provider::{
		ProviderConfig,
		strategy::{CredentialStrategy, TokenRequest, scan},
	},
};

/// JSON login with username and password; forced refreshes resubmit the previous token.
///
/// A refresh posts `{"<refresh_token_field>": "<previous token>"}` to the same endpoint the
/// login uses. The success envelope has no fixed shape, so the token is located with
/// [`scan::find_token`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PasswordRefreshStrategy;
impl CredentialStrategy for PasswordRefreshStrategy {
	fn build_request(
		&self,
		config: &ProviderConfig,
		prior: Option<&Secret>,
	) -> Result<TokenRequest, ConfigError> {
		let mut body = Map::new();

		match prior {
			Some(previous) => {
				body.insert(
					config.quirks.refresh_token_field.clone(),
					Value::String(previous.expose().to_owned()),
				);
			},
			None => {
				let username = config.credential("username")?;
				let password = config.credential("password")?;

				body.insert("username".into(), Value::String(username.to_owned()));
				body.insert("password".into(), Value::String(password.to_owned()));
			},
		}

		Ok(TokenRequest::json(config.token_endpoint.clone(), Value::Object(body)))
	}

	fn parse_response(
		&self,
		_config: &ProviderConfig,
		status: u16,
		body: &[u8],
	) -> Result<TokenGrant, AcquisitionError> {
		let deserializer = &mut serde_json::Deserializer::from_slice(body);
		let document: Value = serde_path_to_error::deserialize(deserializer)
			.map_err(|source| AcquisitionError::Parse { source, status })?;
		let token = scan::find_token(&document).ok_or(AcquisitionError::TokenNotFound { status })?;
		let mut grant = TokenGrant::new(token);

		if let Some(ttl) = scan::find_ttl(&document) {
			grant = grant.with_ttl(ttl);
		}

		Ok(grant)
	}
}
