//! Token material that never reaches logs.

// self
use crate::_prelude::*;

/// Access or refresh token.
///
/// Formatting always prints a placeholder; only [`TokenSecret::expose`] yields the raw value,
/// which is needed to build the `Authorization` header and the refresh grant. Serialization keeps
/// the raw string so persisted credentials survive a restart.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	const PLACEHOLDER: &str = "<redacted>";

	/// Wraps a raw token.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw token value.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Whether the token is the empty string, which the server never issues.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Whether this secret is the token `raw` (e.g., the one a 401 rejected).
	pub fn is(&self, raw: &str) -> bool {
		self.0 == raw
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret({})", Self::PLACEHOLDER)
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(Self::PLACEHOLDER)
	}
}
