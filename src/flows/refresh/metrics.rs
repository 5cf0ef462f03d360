// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::_prelude::*;

/// Something a refresh episode or one of its callers did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RefreshEvent {
	/// An episode called the token endpoint.
	Started,
	/// An episode stored a new credential.
	Renewed,
	/// An episode ended the session.
	Failed,
	/// A caller waited on an episode someone else opened.
	Joined,
}

/// Counters for refresh episodes of one broker.
#[derive(Debug, Default)]
pub struct RefreshMetrics([AtomicU64; 4]);
impl RefreshMetrics {
	pub(crate) fn record(&self, event: RefreshEvent) {
		self.0[event as usize].fetch_add(1, Ordering::Relaxed);
	}

	/// Point-in-time copy of every counter.
	pub fn snapshot(&self) -> RefreshSnapshot {
		let read = |event: RefreshEvent| self.0[event as usize].load(Ordering::Relaxed);

		RefreshSnapshot {
			episodes: read(RefreshEvent::Started),
			renewed: read(RefreshEvent::Renewed),
			failed: read(RefreshEvent::Failed),
			coalesced: read(RefreshEvent::Joined),
		}
	}
}

/// Refresh counters as returned by [`RefreshMetrics::snapshot`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSnapshot {
	/// Exchanges sent to the token endpoint.
	pub episodes: u64,
	/// Exchanges that produced a new credential.
	pub renewed: u64,
	/// Exchanges that ended the session.
	pub failed: u64,
	/// Callers served by an exchange another caller started.
	pub coalesced: u64,
}
