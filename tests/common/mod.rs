//! Scripted transport and fixtures shared by the integration tests.

#![allow(dead_code)]

// std
use std::{collections::VecDeque, future, io, pin::Pin, sync::Arc};
// crates.io
use parking_lot::Mutex;
use partner_auth_broker::{
	HttpRequest, HttpResponse,
	auth::{ProviderId, Secret},
	error::{Result, TransportError},
	flows::Broker,
	http::{ResponseMetadata, ResponseMetadataSlot, TransportErrorMapper, UpstreamHttpClient},
	oauth2::{
		AsyncHttpClient, HttpClientError,
		http::{self, StatusCode, header::AUTHORIZATION},
	},
	provider::{ProviderConfig, ProviderConfigBuilder},
	url::Url,
};

pub type ScriptedBroker = Broker<ScriptedUpstream, ScriptedMapper>;

pub const TOKEN_URL: &str = "https://partner.example.com/oauth/token";
pub const BUSINESS_URL: &str = "https://partner.example.com/api/deals";

/// One canned transport outcome.
#[derive(Clone, Debug)]
pub enum Reply {
	Respond { status: u16, body: String },
	Fail,
}
impl Reply {
	pub fn ok_json(body: impl Into<String>) -> Self {
		Self::Respond { status: 200, body: body.into() }
	}

	pub fn status(status: u16, body: impl Into<String>) -> Self {
		Self::Respond { status, body: body.into() }
	}

	pub fn token(value: &str, expires_in: i64) -> Self {
		Self::ok_json(format!("{{\"access_token\":\"{value}\",\"expires_in\":{expires_in}}}"))
	}
}

/// Request as observed by the scripted transport.
#[derive(Clone, Debug)]
pub struct Recorded {
	pub path: String,
	pub authorization: Option<String>,
	pub body: String,
}

#[derive(Debug, Default)]
struct Script {
	token: Mutex<VecDeque<Reply>>,
	business: Mutex<VecDeque<Reply>>,
	token_calls: Mutex<Vec<Recorded>>,
	business_calls: Mutex<Vec<Recorded>>,
}

/// In-memory transport that routes `/token` paths to the token script and everything else to
/// the business script. An exhausted script answers 500.
#[derive(Clone, Debug, Default)]
pub struct ScriptedUpstream(Arc<Script>);
impl ScriptedUpstream {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_tokens(self, replies: impl IntoIterator<Item = Reply>) -> Self {
		self.0.token.lock().extend(replies);

		self
	}

	pub fn with_business(self, replies: impl IntoIterator<Item = Reply>) -> Self {
		self.0.business.lock().extend(replies);

		self
	}

	pub fn push_token(&self, reply: Reply) {
		self.0.token.lock().push_back(reply);
	}

	pub fn token_calls(&self) -> Vec<Recorded> {
		self.0.token_calls.lock().clone()
	}

	pub fn business_calls(&self) -> Vec<Recorded> {
		self.0.business_calls.lock().clone()
	}

	fn answer(&self, request: HttpRequest) -> Result<HttpResponse, HttpClientError<io::Error>> {
		let path = request.uri().path().to_owned();
		let recorded = Recorded {
			path: path.clone(),
			authorization: request
				.headers()
				.get(AUTHORIZATION)
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned),
			body: String::from_utf8_lossy(request.body()).into_owned(),
		};
		let reply = if path.ends_with("/token") {
			self.0.token_calls.lock().push(recorded);
			self.0.token.lock().pop_front()
		} else {
			self.0.business_calls.lock().push(recorded);
			self.0.business.lock().pop_front()
		};

		match reply.unwrap_or_else(|| Reply::status(500, "script exhausted")) {
			Reply::Respond { status, body } => {
				let mut response = HttpResponse::new(body.into_bytes());

				*response.status_mut() =
					StatusCode::from_u16(status).expect("Scripted status should be valid.");

				Ok(response)
			},
			Reply::Fail => Err(HttpClientError::Io(io::Error::other("connection refused"))),
		}
	}
}
impl UpstreamHttpClient for ScriptedUpstream {
	type Handle = ScriptedHandle;
	type TransportError = io::Error;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		ScriptedHandle { upstream: self.clone(), slot }
	}
}

pub struct ScriptedHandle {
	upstream: ScriptedUpstream,
	slot: ResponseMetadataSlot,
}
impl<'c> AsyncHttpClient<'c> for ScriptedHandle {
	type Error = HttpClientError<io::Error>;
	type Future = Pin<Box<dyn 'c + Send + Future<Output = Result<HttpResponse, Self::Error>>>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		self.slot.take();

		let result = self.upstream.answer(request);

		if let Ok(response) = &result {
			self.slot.store(ResponseMetadata {
				status: Some(response.status().as_u16()),
				retry_after: None,
			});
		}

		Box::pin(future::ready(result))
	}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScriptedMapper;
impl TransportErrorMapper<io::Error> for ScriptedMapper {
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<io::Error>,
	) -> TransportError {
		match error {
			HttpClientError::Io(inner) => TransportError::Io(inner),
			HttpClientError::Reqwest(inner) => TransportError::Io(*inner),
			HttpClientError::Http(inner) => TransportError::Request(inner),
			other => TransportError::Other {
				message: other.to_string(),
				status: metadata.and_then(|meta| meta.status),
			},
		}
	}
}

pub fn provider(name: &str) -> ProviderId {
	ProviderId::new(name).expect("Provider fixture should be valid.")
}

pub fn url(value: &str) -> Url {
	Url::parse(value).expect("Fixture URL should parse.")
}

pub fn config_builder(name: &str) -> ProviderConfigBuilder {
	ProviderConfig::builder(provider(name)).token_endpoint(url(TOKEN_URL))
}

pub fn client_credentials_config(name: &str) -> ProviderConfig {
	config_builder(name)
		.client_credentials("dealer-app", "s3cr3t")
		.build()
		.expect("Client credentials configuration should build.")
}

pub fn scripted_broker(config: ProviderConfig, upstream: &ScriptedUpstream) -> ScriptedBroker {
	Broker::with_http_client(config, upstream.clone(), ScriptedMapper)
}

/// Builds a GET against the business endpoint carrying `token` as a bearer credential.
pub fn business_request(token: &Secret) -> Result<HttpRequest> {
	Ok(http::Request::builder()
		.method(http::Method::GET)
		.uri(BUSINESS_URL)
		.header(AUTHORIZATION, token.bearer())
		.body(Vec::new())?)
}
