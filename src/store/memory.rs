//! Thread-safe in-memory [`CredentialStore`] implementation.

// self
use crate::{_prelude::*, auth::Credential, store::CredentialStore};

/// Process-local credential slot.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<Option<Credential>>>);
impl MemoryStore {
	/// Creates a store seeded with `credential`.
	pub fn with_credential(credential: Credential) -> Self {
		Self(Arc::new(RwLock::new(Some(credential))))
	}
}
impl CredentialStore for MemoryStore {
	fn get(&self) -> Option<Credential> {
		self.0.read().clone()
	}

	fn set(&self, credential: Option<Credential>) {
		*self.0.write() = credential;
	}

	fn take(&self) -> Option<Credential> {
		self.0.write().take()
	}
}
