//! Outbound request description and the per-request retry context.

// crates.io
use serde_json::Value;
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	client::ResponseReturn,
	error::ConfigError,
	http::{HeaderMap, HeaderName, HeaderValue, Method},
};

/// Request body encodings.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// `application/json` body.
	Json(Value),
	/// `application/x-www-form-urlencoded` body; pairs keep their order.
	Form(Vec<(String, String)>),
}

/// One call to the backend, relative to the client's base URL.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	pub(crate) method: Method,
	pub(crate) path: String,
	pub(crate) query: Vec<(String, String)>,
	pub(crate) headers: HeaderMap,
	pub(crate) body: RequestBody,
	pub(crate) response_return: Option<ResponseReturn>,
	pub(crate) cancellation: Option<CancellationToken>,
}
impl ApiRequest {
	/// Creates a request for `method` and `path`.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: RequestBody::Empty,
			response_return: None,
			cancellation: None,
		}
	}

	/// `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Sets a header; `Authorization` and `Accept-Language` are overwritten by the pipeline.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Serializes `body` as JSON.
	pub fn json<T>(mut self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		self.body = RequestBody::Json(serde_json::to_value(body)?);

		Ok(self)
	}

	/// Sends `pairs` form-encoded.
	pub fn form<I, K, V>(mut self, pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.body =
			RequestBody::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect());

		self
	}

	/// Overrides the client's [`ResponseReturn`] for this call.
	pub fn response_return(mut self, mode: ResponseReturn) -> Self {
		self.response_return = Some(mode);

		self
	}

	/// Aborts the call once `token` is canceled; the call then fails with
	/// [`Error::Canceled`](crate::error::Error::Canceled).
	pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
		self.cancellation = Some(token);

		self
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Path relative to the base URL.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Request body.
	pub fn body(&self) -> &RequestBody {
		&self.body
	}
}

/// Per-request pipeline context carrying the retry marker.
///
/// The marker is set once, after the first credential refresh for this request, and consulted
/// once when a later 401 arrives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequestContext {
	retried: bool,
}
impl RequestContext {
	/// Whether this request was already re-issued after a refresh.
	pub fn is_retry(self) -> bool {
		self.retried
	}

	/// Returns the context for the re-issued request.
	pub fn into_retry(self) -> Self {
		Self { retried: true }
	}
}
