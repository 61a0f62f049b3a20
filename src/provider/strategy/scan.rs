//! Structural scans over parsed JSON envelopes whose shape is not contractually fixed.

// std
use std::collections::VecDeque;
// crates.io
use serde_json::Value;
// self
use crate::{_prelude::*, provider::strategy::ExpiresIn};

const TTL_KEYS: [&str; 2] = ["expires_in", "expiresIn"];

/// Returns `true` for three non-empty dot-separated base64url segments (`aaa.bbb.ccc`).
pub fn is_token_shaped(candidate: &str) -> bool {
	let mut segments = 0;

	for segment in candidate.split('.') {
		segments += 1;

		if segments > 3
			|| segment.is_empty()
			|| !segment.bytes().all(|byte| byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_'))
		{
			return false;
		}
	}

	segments == 3
}

/// Walks the tree breadth-first and returns the first token-shaped string value.
///
/// Object members are visited in document order, so the first token the upstream wrote wins
/// among siblings; shallower values always win over deeper ones.
pub fn find_token(root: &Value) -> Option<&str> {
	let mut queue = VecDeque::from([root]);

	while let Some(value) = queue.pop_front() {
		match value {
			Value::String(text) if is_token_shaped(text) => return Some(text),
			Value::Object(map) => queue.extend(map.values()),
			Value::Array(items) => queue.extend(items.iter()),
			_ => {},
		}
	}

	None
}

/// Walks the tree breadth-first for the first `expires_in`/`expiresIn` member that parses.
pub fn find_ttl(root: &Value) -> Option<Duration> {
	let mut queue = VecDeque::from([root]);

	while let Some(value) = queue.pop_front() {
		match value {
			Value::Object(map) => {
				let ttl = TTL_KEYS
					.iter()
					.filter_map(|key| map.get(*key))
					.filter_map(|raw| ExpiresIn::deserialize(raw).ok())
					.find_map(|expires_in| expires_in.as_duration());

				if ttl.is_some() {
					return ttl;
				}

				queue.extend(map.values());
			},
			Value::Array(items) => queue.extend(items.iter()),
			_ => {},
		}
	}

	None
}
