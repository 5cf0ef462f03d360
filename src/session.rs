//! Session-scoped flags and the listener that renders teardown to the user.

// std
use std::sync::atomic::{AtomicBool, Ordering};
// crates.io
use tokio::sync::watch;
// self
use crate::_prelude::*;

/// Receives user-visible session transitions.
///
/// Hooks run synchronously on the task that triggered the transition and must not block.
pub trait SessionListener
where
	Self: Send + Sync,
{
	/// The session expired and the UX mode keeps the user in place.
	fn on_login_expired(&self) {}

	/// The session was torn down; `return_to` is the location to resume after signing in.
	fn on_logout(&self, _return_to: Option<&str>) {}

	/// Location recorded for post-login return, when the host tracks one.
	fn current_location(&self) -> Option<String> {
		None
	}
}

/// Listener that ignores every transition.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;
impl SessionListener for NoopListener {}

/// Flags shared by every component of one session.
#[derive(Debug)]
pub struct SessionState {
	login_expired: watch::Sender<bool>,
	access_checked: AtomicBool,
	torn_down: AtomicBool,
}
impl SessionState {
	/// Whether the "login expired" flag is raised.
	pub fn login_expired(&self) -> bool {
		*self.login_expired.borrow()
	}

	/// Subscribes to changes of the "login expired" flag.
	pub fn watch_login_expired(&self) -> watch::Receiver<bool> {
		self.login_expired.subscribe()
	}

	/// Whether the session was confirmed valid at least once.
	pub fn is_access_checked(&self) -> bool {
		self.access_checked.load(Ordering::Acquire)
	}

	/// Records that the session was confirmed valid (e.g., after loading user access).
	pub fn set_access_checked(&self, checked: bool) {
		self.access_checked.store(checked, Ordering::Release);
	}

	pub(crate) fn set_login_expired(&self, expired: bool) {
		self.login_expired.send_if_modified(|current| {
			let changed = *current != expired;

			*current = expired;

			changed
		});
	}

	/// Claims the teardown; only the first caller since the last [`Self::arm`] wins.
	pub(crate) fn begin_teardown(&self) -> bool {
		!self.torn_down.swap(true, Ordering::AcqRel)
	}

	/// Re-arms teardown after a credential was (re)established.
	pub(crate) fn arm(&self) {
		self.torn_down.store(false, Ordering::Release);
	}

	/// Clears all session-scoped flags.
	pub(crate) fn reset(&self) {
		self.access_checked.store(false, Ordering::Release);
		self.set_login_expired(false);
	}
}
impl Default for SessionState {
	fn default() -> Self {
		Self {
			login_expired: watch::Sender::new(false),
			access_checked: AtomicBool::new(false),
			torn_down: AtomicBool::new(false),
		}
	}
}
