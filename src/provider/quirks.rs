//! Per-provider wire-format differences kept as data.

// self
use crate::_prelude::*;

/// Provider-specific wire-format toggles used by the credential strategies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Header carrying the client identifier for the key/secret header grant.
	pub client_id_header: String,
	/// JSON field that carries the previous token when the password grant re-authenticates.
	pub refresh_token_field: String,
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self { client_id_header: "Client-Id".into(), refresh_token_field: "refreshToken".into() }
	}
}
