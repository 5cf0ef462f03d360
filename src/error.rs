//! Session-level error types shared across the pipeline, coordinator, and scheduler.

// self
use crate::{_prelude::*, http::ApiResponse};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error used for transport sources and job failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Response failed the configured success predicate.
	#[error(transparent)]
	Response(#[from] ResponseError),
	/// Token endpoint rejected or garbled an exchange.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// Payload did not match the caller's type.
	#[error("Response payload could not be decoded.")]
	Decode(#[from] serde_path_to_error::Error<serde_json::Error>),

	/// The session can no longer be renewed locally; the user must sign in again.
	#[error("Re-authentication is required: {reason}.")]
	ReauthRequired {
		/// Broker-supplied reason string.
		reason: String,
	},
	/// The caller aborted the request.
	#[error("Request was canceled.")]
	Canceled,
}
impl Error {
	/// Builds a [`Error::ReauthRequired`] from any displayable reason.
	pub fn reauth_required(reason: impl Into<String>) -> Self {
		Self::ReauthRequired { reason: reason.into() }
	}

	/// HTTP status tied to the failure, when one is known.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Response(err) => Some(err.response.status),
			Self::Exchange(ExchangeError::Rejected { status, .. }) => *status,
			_ => None,
		}
	}

	/// Returns `true` for caller-initiated aborts.
	pub fn is_canceled(&self) -> bool {
		matches!(self, Self::Canceled)
	}

	/// Returns `true` when the error requires the user to sign in again.
	pub fn is_reauth_required(&self) -> bool {
		matches!(self, Self::ReauthRequired { .. })
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Endpoint or request path cannot be parsed.
	#[error("URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Header value contains characters HTTP does not allow.
	#[error(transparent)]
	InvalidHeader(#[from] oauth2::http::header::InvalidHeaderValue),
	/// Request body could not be serialized.
	#[error("Request body could not be serialized.")]
	Body(#[from] serde_json::Error),
	/// Client identifier is missing.
	#[error("Client identifier must not be empty.")]
	MissingClientId,
	/// Background work was requested outside a Tokio runtime.
	#[error("A Tokio runtime is required.")]
	NoRuntime,
	/// A duration setting is out of range.
	#[error("The {setting} setting must be positive.")]
	NonPositiveDuration {
		/// Setting name.
		setting: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<url::ParseError> for ConfigError {
	fn from(source: url::ParseError) -> Self {
		Self::InvalidUrl { source }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, timeout, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while sending the request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded its deadline.
	#[error("Request timed out.")]
	Timeout,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while sending the request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Response rejected by the shape normalizer; carries the full response.
#[derive(Debug, ThisError)]
#[error("Request failed with HTTP status {}.", response.status)]
pub struct ResponseError {
	/// Response exactly as received.
	pub response: ApiResponse,
}
impl ResponseError {
	/// Wraps a failed response.
	pub fn new(response: ApiResponse) -> Self {
		Self { response }
	}

	/// Server-supplied `error` or `message` text, when the body is JSON and carries one.
	pub fn server_message(&self) -> Option<String> {
		let body = self.response.json().ok()?;

		["error", "message"]
			.into_iter()
			.filter_map(|field| body.get(field).and_then(|value| value.as_str()))
			.find(|text| !text.is_empty())
			.map(ToOwned::to_owned)
	}
}

/// Token endpoint failures.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// Provider rejected the grant (e.g., bad password or refresh token).
	#[error("Token endpoint rejected the grant: {error}.")]
	Rejected {
		/// OAuth `error` code, or `message` when the body carries no code.
		error: String,
		/// Optional human-readable description.
		message: Option<String>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Transport succeeded but the payload lacks a required field.
	#[error("Token endpoint response is missing {field}.")]
	Malformed {
		/// Missing or invalid field name.
		field: &'static str,
	},
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
