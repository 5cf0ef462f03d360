//! Maps raw tokens onto `Authorization` header values.

// self
use crate::auth::token::secret::TokenSecret;

/// Authorization scheme prefix attached to every access token.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Formats an access token as a bearer header value.
///
/// Returns `None` when no token is held or the token is empty, signalling that the header must be
/// omitted.
pub fn format_token(token: Option<&TokenSecret>) -> Option<String> {
	token
		.filter(|secret| !secret.is_empty())
		.map(|secret| format!("{BEARER_PREFIX}{}", secret.expose()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formats_present_tokens_and_omits_absent_ones() {
		let secret = TokenSecret::new("A1");

		assert_eq!(format_token(Some(&secret)).as_deref(), Some("Bearer A1"));
		assert_eq!(format_token(Some(&TokenSecret::new(""))), None);
		assert_eq!(format_token(None), None);
	}
}
