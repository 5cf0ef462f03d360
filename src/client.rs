//! Session-aware request pipeline.
//!
//! Every call passes through a fixed chain: the pre-request hook attaches the current bearer
//! token and the configured locale, then the response runs through the shape normalizer, the 401
//! interceptor, and finally the error classifier that feeds the [`Notifier`].
//!
//! A 401 is recovered at most once per request. The first one asks the broker for a renewed
//! credential (sharing any refresh already in flight) and re-issues the request with the
//! [`RequestContext`] retry marker set; a 401 on the re-issued request, or any 401 while renewal
//! is disabled, tears the session down and fails with
//! [`Error::ReauthRequired`](crate::error::Error::ReauthRequired).

pub mod classify;
pub mod request;
pub mod shape;

pub use classify::*;
pub use request::*;
pub use shape::*;

// crates.io
use serde::de::DeserializeOwned;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{Credential, format_token},
	error::{ConfigError, TransportError},
	flows::SessionBroker,
	http::{ApiResponse, HeaderValue, HttpTransport, header},
};

const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";

/// HTTP client bound to one base URL and one session.
#[derive(Clone)]
pub struct RequestClient {
	inner: Arc<ClientInner>,
}
impl RequestClient {
	/// Starts building a client for `base_url` backed by `broker`.
	pub fn builder(base_url: Url, broker: SessionBroker) -> RequestClientBuilder {
		RequestClientBuilder {
			base_url,
			broker,
			transport: None,
			notifier: None,
			shape: ResponseShape::default(),
			response_return: ResponseReturn::default(),
		}
	}

	/// Session this client authenticates with.
	pub fn broker(&self) -> &SessionBroker {
		&self.inner.broker
	}

	/// Sends `request` through the pipeline.
	///
	/// Failures are reported to the notifier before they are returned, except cancellation and
	/// forced re-authentication.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiPayload> {
		let result = match request.cancellation.clone() {
			Some(token) => tokio::select! {
				biased;
				_ = token.cancelled() => Err(Error::Canceled),
				result = self.run(&request) => result,
			},
			None => self.run(&request).await,
		};

		if let Err(err) = &result {
			self.report(err);
		}

		result
	}

	/// Sends `request` and decodes the shaped payload into `T`.
	pub async fn send_json<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.send(request).await?.decode()
	}

	async fn run(&self, request: &ApiRequest) -> Result<ApiPayload> {
		let mode = request.response_return.unwrap_or(self.inner.response_return);
		let mut context = RequestContext::default();
		let mut credential = self.inner.broker.credential();

		loop {
			let response = self.execute(request, credential.as_ref()).await?;
			let err = match self.inner.shape.normalize(response, mode) {
				Ok(payload) => return Ok(payload),
				Err(err) => err,
			};

			if err.response.status != 401 {
				return Err(err.into());
			}

			let broker = &self.inner.broker;

			if context.is_retry() || !broker.config().enable_refresh_token {
				tracing::warn!(
					path = request.path(),
					retried = context.is_retry(),
					"Request was rejected with 401; re-authentication is required."
				);
				broker.force_reauthenticate();

				return Err(Error::reauth_required("the server rejected the session"));
			}

			let rejected = credential.as_ref().map(|credential| credential.access_token.expose());
			let renewed = broker.ensure_after_rejection(rejected).await?;

			tracing::debug!(path = request.path(), "Re-issuing request with a renewed credential.");

			credential = Some(renewed);
			context = context.into_retry();
		}
	}

	async fn execute(
		&self,
		request: &ApiRequest,
		credential: Option<&Credential>,
	) -> Result<ApiResponse> {
		let http_request = self.build_http_request(request, credential)?;
		let timeout = self.inner.broker.config().request_timeout;
		let response = tokio::time::timeout(timeout, self.inner.transport.execute(http_request))
			.await
			.map_err(|_| TransportError::Timeout)??;

		Ok(response.into())
	}

	fn build_http_request(
		&self,
		request: &ApiRequest,
		credential: Option<&Credential>,
	) -> Result<oauth2::HttpRequest, ConfigError> {
		let mut url = self.resolve_url(&request.path)?;

		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&request.query);
		}

		let (content_type, body) = match &request.body {
			RequestBody::Empty => (None, Vec::new()),
			RequestBody::Json(value) => (Some(JSON_CONTENT_TYPE), serde_json::to_vec(value)?),
			RequestBody::Form(pairs) => (
				Some(FORM_CONTENT_TYPE),
				form_urlencoded::Serializer::new(String::new())
					.extend_pairs(pairs)
					.finish()
					.into_bytes(),
			),
		};
		let mut http_request = oauth2::http::Request::builder()
			.method(request.method.clone())
			.uri(url.as_str())
			.body(body)?;
		let headers = http_request.headers_mut();

		headers.extend(request.headers.clone());

		if let Some(content_type) = content_type {
			headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
		}

		// Pre-request hook.
		match format_token(credential.map(|credential| &credential.access_token)) {
			Some(value) => {
				headers.insert(header::AUTHORIZATION, HeaderValue::try_from(value)?);
			},
			None => {
				headers.remove(header::AUTHORIZATION);
			},
		}

		headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::try_from(&self.inner.locale)?);

		Ok(http_request)
	}

	fn resolve_url(&self, path: &str) -> Result<Url, ConfigError> {
		if path.starts_with("http://") || path.starts_with("https://") {
			return Ok(Url::parse(path)?);
		}

		let base = self.inner.base_url.as_str().trim_end_matches('/');
		let path = path.trim_start_matches('/');

		Ok(Url::parse(&format!("{base}/{path}"))?)
	}

	fn report(&self, err: &Error) {
		if let Some(notice) = ErrorNotice::from_error(err) {
			self.inner.notifier.notify(&notice);
		}
	}
}
impl Debug for RequestClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestClient")
			.field("base_url", &self.inner.base_url.as_str())
			.field("shape", &self.inner.shape)
			.field("response_return", &self.inner.response_return)
			.finish()
	}
}

/// Builder for [`RequestClient`].
pub struct RequestClientBuilder {
	base_url: Url,
	broker: SessionBroker,
	transport: Option<Arc<dyn HttpTransport>>,
	notifier: Option<Arc<dyn Notifier>>,
	shape: ResponseShape,
	response_return: ResponseReturn,
}
impl RequestClientBuilder {
	/// Overrides the transport; defaults to the broker's.
	pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
		self.transport = Some(transport);

		self
	}

	/// Sets the notification collaborator; defaults to [`LogNotifier`].
	pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
		self.notifier = Some(notifier);

		self
	}

	/// Sets the response envelope convention.
	pub fn shape(mut self, shape: ResponseShape) -> Self {
		self.shape = shape;

		self
	}

	/// Sets the default [`ResponseReturn`].
	pub fn response_return(mut self, mode: ResponseReturn) -> Self {
		self.response_return = mode;

		self
	}

	/// Builds the client.
	pub fn build(self) -> RequestClient {
		let transport = self.transport.unwrap_or_else(|| self.broker.transport());
		let locale = self.broker.config().locale.clone();

		RequestClient {
			inner: Arc::new(ClientInner {
				base_url: self.base_url,
				locale,
				transport,
				notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
				shape: self.shape,
				response_return: self.response_return,
				broker: self.broker,
			}),
		}
	}
}
impl Debug for RequestClientBuilder {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestClientBuilder")
			.field("base_url", &self.base_url.as_str())
			.field("shape", &self.shape)
			.field("response_return", &self.response_return)
			.finish()
	}
}

struct ClientInner {
	base_url: Url,
	locale: String,
	broker: SessionBroker,
	transport: Arc<dyn HttpTransport>,
	notifier: Arc<dyn Notifier>,
	shape: ResponseShape,
	response_return: ResponseReturn,
}
