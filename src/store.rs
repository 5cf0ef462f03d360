//! Credential State contract and built-in store implementations.
//!
//! Stores hold at most one [`Credential`]. They provide no coordination of their own: every
//! mutation is funneled through [`SessionBroker`](crate::flows::SessionBroker), which serializes
//! renewals and teardown.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Storage contract for the process-wide credential.
///
/// Neither operation blocks on I/O the caller can observe nor fails; persistent backends log
/// write failures and keep serving the in-memory value.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Returns the current credential, if any.
	fn get(&self) -> Option<Credential>;

	/// Replaces the credential; `None` clears all three fields at once.
	fn set(&self, credential: Option<Credential>);

	/// Clears the credential, returning the value that was held.
	fn take(&self) -> Option<Credential> {
		let previous = self.get();

		self.set(None);

		previous
	}
}

/// Failure to open a persistent store.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// The snapshot exists but does not decode as a credential.
	#[error("Stored credential is unreadable: {message}.")]
	Serialization {
		/// Decoder message, prefixed with the snapshot location.
		message: String,
	},
	/// The storage medium refused an operation.
	#[error("Credential storage failed: {message}.")]
	Backend {
		/// What was attempted and the underlying error.
		message: String,
	},
}
