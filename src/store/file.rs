//! File-backed [`CredentialStore`] that survives process restarts.

// std
use std::{
	fs, io,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{CredentialStore, StoreError},
};

/// Keeps the credential in memory and mirrors every change to a JSON file.
///
/// A held credential is written to a sibling `.tmp` file and renamed over the target, so a crash
/// mid-write leaves the previous snapshot intact. Clearing the credential deletes the file. A
/// failed write is logged and the in-memory value stays authoritative until the next change.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	current: Arc<RwLock<Option<Credential>>>,
}
impl FileStore {
	/// Opens the store at `path`, restoring the credential a previous process left there.
	///
	/// A missing or blank file means no session. Parent directories are created on demand.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
			fs::create_dir_all(dir).map_err(|e| backend("create", dir, e))?;
		}

		let restored = read_credential(&path)?;

		Ok(Self { path, current: Arc::new(RwLock::new(restored)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn write(&self, credential: Option<&Credential>) -> Result<(), StoreError> {
		let Some(credential) = credential else {
			return match fs::remove_file(&self.path) {
				Err(e) if e.kind() != io::ErrorKind::NotFound =>
					Err(backend("remove", &self.path, e)),
				_ => Ok(()),
			};
		};
		let json = serde_json::to_vec_pretty(credential)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;
		let staging = self.path.with_extension("tmp");

		fs::write(&staging, json).map_err(|e| backend("write", &staging, e))?;
		fs::rename(&staging, &self.path).map_err(|e| backend("replace", &self.path, e))
	}
}
impl CredentialStore for FileStore {
	fn get(&self) -> Option<Credential> {
		self.current.read().clone()
	}

	fn set(&self, credential: Option<Credential>) {
		let mut current = self.current.write();

		if let Err(e) = self.write(credential.as_ref()) {
			tracing::warn!(path = %self.path.display(), error = %e, "Credential not persisted.");
		}

		*current = credential;
	}
}

fn read_credential(path: &Path) -> Result<Option<Credential>, StoreError> {
	let text = match fs::read_to_string(path) {
		Ok(text) => text,
		Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
		Err(e) => return Err(backend("read", path, e)),
	};

	if text.trim().is_empty() {
		return Ok(None);
	}

	serde_json::from_str(&text).map_err(|e| StoreError::Serialization {
		message: format!("{} holds no credential: {e}", path.display()),
	})
}

fn backend(action: &str, path: &Path, e: io::Error) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {e}", path.display()) }
}

#[cfg(test)]
mod tests {
	// std
	use std::env;
	// self
	use super::*;

	fn scratch(tag: &str) -> PathBuf {
		env::temp_dir()
			.join(format!(
				"session-broker-store-{tag}-{}",
				OffsetDateTime::now_utc().unix_timestamp_nanos()
			))
			.join("session.json")
	}

	fn cleanup(path: &Path) {
		if let Some(dir) = path.parent() {
			fs::remove_dir_all(dir).expect("Scratch directory should be removable.");
		}
	}

	#[test]
	fn credential_outlives_the_store_and_clearing_deletes_the_file() {
		let path = scratch("reload");
		let credential = Credential::new(
			"A1",
			"R1",
			OffsetDateTime::from_unix_timestamp(1_900_000_000)
				.expect("Fixture timestamp should be valid."),
		);

		FileStore::open(&path).expect("Store should open.").set(Some(credential.clone()));

		let reopened = FileStore::open(&path).expect("Store should reopen.");

		assert_eq!(reopened.get(), Some(credential));
		assert!(!path.with_extension("tmp").exists());

		reopened.set(None);

		assert!(!path.exists());
		assert!(FileStore::open(&path).expect("Store should reopen.").get().is_none());

		cleanup(&path);
	}

	#[test]
	fn blank_file_is_an_empty_session_and_garbage_is_an_error() {
		let path = scratch("garbage");
		let store = FileStore::open(&path).expect("Store should create its directory.");

		assert_eq!(store.path(), path);

		fs::write(&path, "\n  \n").expect("Blank fixture should be written.");

		assert!(FileStore::open(&path).expect("Blank file should open.").get().is_none());

		fs::write(&path, "{\"access_token\":").expect("Garbage fixture should be written.");

		let err = FileStore::open(&path).expect_err("Truncated JSON should be rejected.");

		assert!(matches!(err, StoreError::Serialization { .. }));

		cleanup(&path);
	}
}
