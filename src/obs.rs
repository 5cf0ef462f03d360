//! Session flow observability.
//!
//! Each login, refresh, renewal, or logout is wrapped in a [`FlowSpan`]. The span is named
//! `session_broker.flow`, carries `flow` and `stage` fields, and records its final `outcome`
//! once the flow settles. With the `metrics` feature on, starting and finishing a span also bumps
//! the `session_broker_flow_total` counter labeled by `flow` and `outcome`.

mod metrics;
mod tracing;

pub use tracing::*;

// self
use crate::_prelude::*;

/// Which part of the session lifecycle a span belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Resource-owner password login.
	Login,
	/// Refresh episode started by a request.
	Refresh,
	/// Refresh episode started by the renewal job.
	Renewal,
	/// Logout or forced re-authentication.
	Logout,
}
impl FlowKind {
	/// Label used in span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Login => "login",
			Self::Refresh => "refresh",
			Self::Renewal => "renewal",
			Self::Logout => "logout",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// How far a flow got.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// The flow started.
	Attempt,
	/// The flow finished with the result it was after.
	Success,
	/// The flow gave up.
	Failure,
}
impl FlowOutcome {
	/// Success for `Ok`, failure for `Err`.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}

	/// Label used in span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Attempt => "attempt",
			Self::Success => "success",
			Self::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
