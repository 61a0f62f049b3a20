//! Optional observability helpers for broker flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `partner_auth.flow` with the `flow`,
//!   `stage` (call site), and `provider` fields, plus the lifecycle events in this module.
//! - Enable `metrics` to increment the `partner_auth_flow_total` counter for every
//!   attempt/success/failure/retry, labeled by `flow` + `outcome`.
//!
//! Without either feature every helper compiles to a no-op.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Broker flows that carry their own span and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Cache-miss acquisition on the request path.
	Acquire,
	/// Reacquisition that bypasses the cache after an invalid-token response.
	ForcedRefresh,
	/// Background reacquisition driven by the refresh scheduler.
	ProactiveRefresh,
	/// Business call through the resilient invoker.
	Invoke,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Acquire => "acquire",
			FlowKind::ForcedRefresh => "forced_refresh",
			FlowKind::ProactiveRefresh => "proactive_refresh",
			FlowKind::Invoke => "invoke",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
	/// Invoker retried after an invalid-token response.
	Retry,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
			FlowOutcome::Retry => "retry",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
