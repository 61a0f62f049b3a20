//! Provider-specific signals that a business response rejected the bearer token.

// self
use crate::_prelude::*;

/// Textual and numeric markers the classifier looks for inside response bodies.
///
/// Phrases are stored lower-cased and matched as case-insensitive substrings of every string
/// value in the body. Sentinel codes match any integer value in the body, covering upstreams that
/// embed their own status code (e.g. `"StatusCode": 1001`) instead of using HTTP semantics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvalidityMarkers {
	/// Lower-cased marker phrases.
	pub phrases: Vec<String>,
	/// Integer sentinels meaning "token invalid or expired".
	pub sentinel_codes: Vec<i64>,
}
impl InvalidityMarkers {
	/// Phrases used when a provider does not configure its own.
	pub const DEFAULT_PHRASES: [&'static str; 3] = ["invalid token", "token expired", "unauthorized"];

	/// Creates a marker set from arbitrary phrases and sentinel codes.
	pub fn new<I, S>(phrases: I, sentinel_codes: impl IntoIterator<Item = i64>) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut markers = Self { phrases: Vec::new(), sentinel_codes: Vec::new() };

		for phrase in phrases {
			markers = markers.with_phrase(phrase);
		}
		for code in sentinel_codes {
			markers = markers.with_sentinel_code(code);
		}

		markers
	}

	/// Adds a marker phrase; blank phrases are ignored.
	pub fn with_phrase(mut self, phrase: impl AsRef<str>) -> Self {
		let normalized = phrase.as_ref().trim().to_lowercase();

		if !normalized.is_empty() && !self.phrases.contains(&normalized) {
			self.phrases.push(normalized);
		}

		self
	}

	/// Adds a numeric sentinel.
	pub fn with_sentinel_code(mut self, code: i64) -> Self {
		if !self.sentinel_codes.contains(&code) {
			self.sentinel_codes.push(code);
		}

		self
	}

	/// Returns the first phrase contained in `text`, ignoring case.
	pub fn matching_phrase(&self, text: &str) -> Option<&str> {
		if self.phrases.is_empty() {
			return None;
		}

		let lowered = text.to_lowercase();

		self.phrases.iter().find(|phrase| lowered.contains(phrase.as_str())).map(String::as_str)
	}

	/// Returns `true` if `code` is a configured sentinel.
	pub fn is_sentinel(&self, code: i64) -> bool {
		self.sentinel_codes.contains(&code)
	}
}
impl Default for InvalidityMarkers {
	fn default() -> Self {
		Self::new(Self::DEFAULT_PHRASES, [])
	}
}
