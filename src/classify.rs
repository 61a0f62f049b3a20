//! Invalid-token detection for business responses.
//!
//! Upstreams signal a rejected bearer token inconsistently: some use 401/403, others answer 200
//! with an error envelope. Classification therefore short-circuits on the status code and only
//! falls back to a full walk of the JSON body when the status is inconclusive.

// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, provider::InvalidityMarkers};

/// HTTP statuses that always mean the bearer token was rejected.
pub const INVALID_TOKEN_STATUSES: [u16; 2] = [401, 403];

/// Why a response was classified as invalid-token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidityReason {
	/// HTTP status in [`INVALID_TOKEN_STATUSES`].
	Status(u16),
	/// A string value contained this marker phrase.
	Marker(String),
	/// A numeric value matched this sentinel code.
	SentinelCode(i64),
}
impl Display for InvalidityReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Status(status) => write!(f, "status {status}"),
			Self::Marker(phrase) => write!(f, "marker `{phrase}`"),
			Self::SentinelCode(code) => write!(f, "sentinel code {code}"),
		}
	}
}

/// Outcome of classifying one business response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvalidityVerdict {
	/// `true` when the response says the token was rejected.
	pub is_invalid_token: bool,
	/// First signal that triggered the verdict.
	pub reason: Option<InvalidityReason>,
}
impl InvalidityVerdict {
	/// Verdict for a response that carries no invalid-token signal.
	pub fn valid() -> Self {
		Self::default()
	}

	/// Verdict for a response rejected for `reason`.
	pub fn invalid(reason: InvalidityReason) -> Self {
		Self { is_invalid_token: true, reason: Some(reason) }
	}
}

/// Decides whether a business response means "the bearer token was rejected".
pub trait InvalidityClassifier
where
	Self: Send + Sync,
{
	/// Classifies a response from its status code and raw body.
	fn classify(&self, status: u16, body: &[u8]) -> InvalidityVerdict;
}

/// Status check plus JSON body scan driven by [`InvalidityMarkers`].
///
/// Bodies that are not JSON are never scanned; only the status code counts for them.
#[derive(Clone, Debug, Default)]
pub struct DefaultInvalidityClassifier {
	markers: InvalidityMarkers,
}
impl DefaultInvalidityClassifier {
	/// Creates a classifier for the given markers.
	pub fn new(markers: InvalidityMarkers) -> Self {
		Self { markers }
	}

	/// Markers this classifier matches against.
	pub fn markers(&self) -> &InvalidityMarkers {
		&self.markers
	}
}
impl InvalidityClassifier for DefaultInvalidityClassifier {
	fn classify(&self, status: u16, body: &[u8]) -> InvalidityVerdict {
		if INVALID_TOKEN_STATUSES.contains(&status) {
			return InvalidityVerdict::invalid(InvalidityReason::Status(status));
		}
		if body.is_empty() {
			return InvalidityVerdict::valid();
		}

		match serde_json::from_slice::<Value>(body) {
			Ok(document) => classify_value(&self.markers, status, Some(&document)),
			Err(_) => InvalidityVerdict::valid(),
		}
	}
}

/// Classifies an already-parsed body.
///
/// The walk is an explicit depth-first stack, so arbitrarily deep envelopes never grow the call
/// stack. Parsed JSON is a tree, so every node is visited exactly once.
pub fn classify_value(
	markers: &InvalidityMarkers,
	status: u16,
	body: Option<&Value>,
) -> InvalidityVerdict {
	if INVALID_TOKEN_STATUSES.contains(&status) {
		return InvalidityVerdict::invalid(InvalidityReason::Status(status));
	}

	let mut stack = body.into_iter().collect::<Vec<_>>();

	while let Some(value) = stack.pop() {
		match value {
			Value::String(text) =>
				if let Some(phrase) = markers.matching_phrase(text) {
					return InvalidityVerdict::invalid(InvalidityReason::Marker(phrase.to_owned()));
				},
			Value::Number(number) =>
				if let Some(code) = integral(number).filter(|code| markers.is_sentinel(*code)) {
					return InvalidityVerdict::invalid(InvalidityReason::SentinelCode(code));
				},
			Value::Object(map) => stack.extend(map.values()),
			Value::Array(items) => stack.extend(items.iter()),
			Value::Bool(_) | Value::Null => {},
		}
	}

	InvalidityVerdict::valid()
}

fn integral(number: &serde_json::Number) -> Option<i64> {
	number.as_i64().or_else(|| {
		number
			.as_f64()
			.filter(|value| value.fract() == 0.0 && value.abs() < 9.0e15)
			.map(|value| value as i64)
	})
}
