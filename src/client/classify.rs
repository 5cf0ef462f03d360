//! Generic error classification and the user-facing notification seam.

// self
use crate::{_prelude::*, error::TransportError};

/// User-facing category of a failed call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
	/// Connection-level failure.
	Network,
	/// The call exceeded its deadline.
	Timeout,
	/// HTTP 400.
	BadRequest,
	/// HTTP 401.
	Unauthorized,
	/// HTTP 403.
	Forbidden,
	/// HTTP 404.
	NotFound,
	/// HTTP 408.
	RequestTimeout,
	/// Any other failed status.
	Server,
}
impl ErrorCategory {
	/// Classifies an error; `None` for failures that must not be reported.
	///
	/// Cancellation and forced re-authentication are never reported: the caller gave up, or the
	/// session teardown is already visible to the user.
	pub fn classify(err: &Error) -> Option<Self> {
		match err {
			Error::Transport(TransportError::Timeout) => Some(Self::Timeout),
			Error::Transport(_) => Some(Self::Network),
			Error::Response(err) => Some(Self::from_status(err.response.status)),
			Error::Canceled
			| Error::ReauthRequired { .. }
			| Error::Config(_)
			| Error::Exchange(_)
			| Error::Decode(_) => None,
		}
	}

	/// Maps an HTTP status onto a category.
	pub fn from_status(status: u16) -> Self {
		match status {
			400 => Self::BadRequest,
			401 => Self::Unauthorized,
			403 => Self::Forbidden,
			404 => Self::NotFound,
			408 => Self::RequestTimeout,
			_ => Self::Server,
		}
	}

	/// Default human-readable message.
	pub const fn message(self) -> &'static str {
		match self {
			Self::Network => "Network error. Please check your connection and try again.",
			Self::Timeout | Self::RequestTimeout => "The request timed out. Please try again.",
			Self::BadRequest => "The request is invalid.",
			Self::Unauthorized => "Your login has expired. Please sign in again.",
			Self::Forbidden => "You do not have permission to perform this action.",
			Self::NotFound => "The requested resource was not found.",
			Self::Server => "Internal server error. Please try again later.",
		}
	}
}
impl Display for ErrorCategory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.message())
	}
}

/// Notification handed to the [`Notifier`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorNotice {
	/// Classified category.
	pub category: ErrorCategory,
	/// Server-supplied message when the body carries one, the category message otherwise.
	pub message: String,
	/// HTTP status, when the failure carried a response.
	pub status: Option<u16>,
}
impl ErrorNotice {
	/// Builds the notice for `err`, or `None` when it must not be reported.
	pub fn from_error(err: &Error) -> Option<Self> {
		let category = ErrorCategory::classify(err)?;
		let message = match err {
			Error::Response(response) => response.server_message(),
			_ => None,
		}
		.unwrap_or_else(|| category.message().to_owned());

		Some(Self { category, message, status: err.status() })
	}
}

/// External toast/notification collaborator.
pub trait Notifier
where
	Self: Send + Sync,
{
	/// Presents a failure to the user; must not block.
	fn notify(&self, notice: &ErrorNotice);
}

/// Notifier that only logs.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;
impl Notifier for LogNotifier {
	fn notify(&self, notice: &ErrorNotice) {
		tracing::warn!(
			category = ?notice.category,
			status = notice.status,
			message = %notice.message,
			"Request failed."
		);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		error::ResponseError,
		http::{ApiResponse, HeaderMap},
	};

	fn failed(status: u16, body: &str) -> Error {
		ResponseError::new(ApiResponse::new(status, HeaderMap::new(), body.as_bytes().to_vec()))
			.into()
	}

	#[test]
	fn statuses_map_to_categories() {
		let cases = [
			(400, ErrorCategory::BadRequest),
			(401, ErrorCategory::Unauthorized),
			(403, ErrorCategory::Forbidden),
			(404, ErrorCategory::NotFound),
			(408, ErrorCategory::RequestTimeout),
			(500, ErrorCategory::Server),
			(503, ErrorCategory::Server),
			(422, ErrorCategory::Server),
		];

		for (status, category) in cases {
			assert_eq!(ErrorCategory::classify(&failed(status, "")), Some(category));
		}
	}

	#[test]
	fn transport_failures_and_silent_errors() {
		assert_eq!(
			ErrorCategory::classify(&TransportError::Timeout.into()),
			Some(ErrorCategory::Timeout)
		);
		assert_eq!(
			ErrorCategory::classify(&TransportError::Io(std::io::Error::other("reset")).into()),
			Some(ErrorCategory::Network)
		);
		assert_eq!(ErrorCategory::classify(&Error::Canceled), None);
		assert_eq!(ErrorCategory::classify(&Error::reauth_required("expired")), None);
	}

	#[test]
	fn notice_prefers_server_message() {
		let notice = ErrorNotice::from_error(&failed(403, r#"{"error":"Tenant is locked"}"#))
			.expect("403 should be reported.");

		assert_eq!(notice.category, ErrorCategory::Forbidden);
		assert_eq!(notice.message, "Tenant is locked");
		assert_eq!(notice.status, Some(403));

		let notice =
			ErrorNotice::from_error(&failed(502, "<html/>")).expect("502 should be reported.");

		assert_eq!(notice.message, ErrorCategory::Server.message());
	}
}
