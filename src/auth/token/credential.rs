//! The access/refresh/expiry triple shared by every session component.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Current lifecycle status for a credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// Remaining lifetime exceeds the renewal threshold.
	Fresh,
	/// Still valid but inside the renewal threshold.
	Expiring,
	/// Expiry instant has passed.
	Expired,
}

/// Access token, refresh token, and absolute UTC expiry.
///
/// Both secrets are mandatory, so a partially populated credential cannot be represented;
/// "no credential" is `Option::<Credential>::None`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret used exclusively for renewals.
	pub refresh_token: TokenSecret,
	/// Expiry instant, serialized as UTC epoch seconds.
	#[serde(with = "time::serde::timestamp")]
	pub expires_at: OffsetDateTime,
}
impl Credential {
	/// Creates a credential from raw token strings and an absolute expiry.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_at: OffsetDateTime,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			expires_at,
		}
	}

	/// Lifetime left at `now`; negative once expired.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		self.expires_at - now
	}

	/// Classifies the credential against a renewal threshold.
	pub fn status_at(&self, now: OffsetDateTime, threshold: Duration) -> CredentialStatus {
		let remaining = self.remaining_at(now);

		if remaining <= Duration::ZERO {
			CredentialStatus::Expired
		} else if remaining <= threshold {
			CredentialStatus::Expiring
		} else {
			CredentialStatus::Fresh
		}
	}

	/// Returns `true` when the credential outlives `threshold` from `now`.
	pub fn is_fresh_at(&self, now: OffsetDateTime, threshold: Duration) -> bool {
		matches!(self.status_at(now, threshold), CredentialStatus::Fresh)
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Token triple returned by a successful exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenGrant {
	/// Newly issued access token.
	pub access_token: TokenSecret,
	/// Newly issued refresh token.
	pub refresh_token: TokenSecret,
	/// Reported lifetime.
	pub expires_in: Duration,
}
impl TokenGrant {
	/// Creates a grant from raw token strings and a relative lifetime.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		expires_in: Duration,
	) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
			expires_in,
		}
	}

	/// Converts the grant into a credential issued at `issued_at`.
	///
	/// The expiry is truncated to whole seconds to match its epoch-second representation.
	pub fn into_credential(self, issued_at: OffsetDateTime) -> Credential {
		let expires_at = issued_at + self.expires_in;
		let expires_at = expires_at.replace_nanosecond(0).unwrap_or(expires_at);

		Credential {
			access_token: self.access_token,
			refresh_token: self.refresh_token,
			expires_at,
		}
	}
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expires_in", &self.expires_in)
			.finish()
	}
}
