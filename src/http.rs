//! Transport primitives shared by the request pipeline and the token endpoint.
//!
//! [`HttpTransport`] is the crate's only dependency on an HTTP stack. It speaks the `http` crate's
//! request/response types (re-exported here) so the pipeline and the `oauth2` facade share one
//! transport. [`TransportHandle`] adapts any transport to `oauth2`'s [`AsyncHttpClient`].

pub use oauth2::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header};

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Object-safe HTTP transport.
///
/// Implementations must resolve non-2xx responses as `Ok`; status interpretation belongs to the
/// pipeline. Only connection-level failures resolve as [`TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and buffers the full response body.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_>;
}

/// Buffered response surfaced to callers and carried by failures.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response from its parts.
	pub fn new(status: u16, headers: HeaderMap, body: Vec<u8>) -> Self {
		Self { status, headers, body }
	}

	/// Returns `true` for 2xx statuses; redirects are not followed and count as failures.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Parses the body as JSON.
	pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
		serde_json::from_slice(&self.body)
	}

	/// Returns the body as UTF-8 text, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}
impl From<HttpResponse> for ApiResponse {
	fn from(response: HttpResponse) -> Self {
		let status = response.status().as_u16();
		let (parts, body) = response.into_parts();

		Self { status, headers: parts.headers, body }
	}
}

/// Adapter exposing an [`HttpTransport`] as an `oauth2` [`AsyncHttpClient`].
#[derive(Clone)]
pub struct TransportHandle(Arc<dyn HttpTransport>);
impl TransportHandle {
	/// Wraps a shared transport.
	pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
		Self(transport)
	}
}
impl Debug for TransportHandle {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TransportHandle(..)")
	}
}
impl<'c> AsyncHttpClient<'c> for TransportHandle {
	type Error = HttpClientError<TransportError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.0.execute(request).await.map_err(|e| HttpClientError::Reqwest(Box::new(e)))
		})
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Redirects are not followed; token endpoints answer directly and API redirects are surfaced to
/// the caller as 3xx responses.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport whose client enforces `timeout` on every call.
	pub fn new(timeout: StdDuration) -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder()
			.timeout(timeout)
			.redirect(reqwest::redirect::Policy::none())
			.build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request = reqwest::Request::try_from(request).map_err(map_reqwest_error)?;
			let response = client.execute(request).await.map_err(map_reqwest_error)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(map_reqwest_error)?;
			let mut response_new = HttpResponse::new(body.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(err: ReqwestError) -> TransportError {
	if err.is_timeout() {
		return TransportError::Timeout;
	}

	TransportError::from(err)
}
