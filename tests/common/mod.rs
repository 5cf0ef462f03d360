//! Shared fixtures for the integration suites: a scripted token endpoint, a scripted API backend,
//! and listener/notifier doubles that count what the user would see.

#![allow(dead_code)]

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use oauth2::{HttpRequest, HttpResponse};
use parking_lot::Mutex;
use serde_json::Value;
use time::{Duration, OffsetDateTime};
use url::Url;
// self
use session_broker::{
	auth::{Credential, TokenGrant, TokenSecret},
	client::{ErrorNotice, Notifier},
	config::{SessionConfig, SessionConfigBuilder},
	error::{ExchangeError, TransportError},
	flows::SessionBroker,
	http::{HttpTransport, TransportFuture, header},
	oauth::{ExchangeFuture, TokenExchange},
	session::SessionListener,
	store::{CredentialStore, MemoryStore},
};

/// Scripted answer of [`ScriptedExchange`].
#[derive(Clone, Debug)]
pub enum ScriptedOutcome {
	/// Issue a grant with the provided tokens and lifetime in seconds.
	Grant { access: String, refresh: String, expires_in: i64 },
	/// Reject the grant with an OAuth error code.
	Reject(String),
	/// Succeed at the transport level but omit the refresh token.
	Malformed,
}

/// In-process token endpoint that counts calls and can hold responses open.
#[derive(Debug)]
pub struct ScriptedExchange {
	outcome: Mutex<ScriptedOutcome>,
	delay: StdDuration,
	refresh_calls: AtomicUsize,
	password_calls: AtomicUsize,
	seen_refresh_tokens: Mutex<Vec<String>>,
}
impl ScriptedExchange {
	pub fn new(outcome: ScriptedOutcome, delay: StdDuration) -> Self {
		Self {
			outcome: Mutex::new(outcome),
			delay,
			refresh_calls: AtomicUsize::new(0),
			password_calls: AtomicUsize::new(0),
			seen_refresh_tokens: Mutex::new(Vec::new()),
		}
	}

	/// Issues `access`/`refresh` with a one hour lifetime.
	pub fn granting(access: &str, refresh: &str, delay: StdDuration) -> Self {
		let outcome = ScriptedOutcome::Grant {
			access: access.into(),
			refresh: refresh.into(),
			expires_in: 3_600,
		};

		Self::new(outcome, delay)
	}

	pub fn rejecting(code: &str, delay: StdDuration) -> Self {
		Self::new(ScriptedOutcome::Reject(code.into()), delay)
	}

	pub fn set_outcome(&self, outcome: ScriptedOutcome) {
		*self.outcome.lock() = outcome;
	}

	pub fn refresh_calls(&self) -> usize {
		self.refresh_calls.load(Ordering::SeqCst)
	}

	pub fn password_calls(&self) -> usize {
		self.password_calls.load(Ordering::SeqCst)
	}

	/// Refresh tokens presented to the endpoint, in call order.
	pub fn seen_refresh_tokens(&self) -> Vec<String> {
		self.seen_refresh_tokens.lock().clone()
	}

	fn respond(&self) -> ExchangeFuture<'_> {
		let outcome = self.outcome.lock().clone();
		let delay = self.delay;

		Box::pin(async move {
			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			}

			match outcome {
				ScriptedOutcome::Grant { access, refresh, expires_in } =>
					Ok(TokenGrant::new(access, refresh, Duration::seconds(expires_in))),
				ScriptedOutcome::Reject(code) => Err(ExchangeError::Rejected {
					error: code,
					message: None,
					status: Some(400),
				}
				.into()),
				ScriptedOutcome::Malformed =>
					Err(ExchangeError::Malformed { field: "refresh_token" }.into()),
			}
		})
	}
}
impl TokenExchange for ScriptedExchange {
	fn exchange_password<'a>(&'a self, _: &'a str, _: &'a str) -> ExchangeFuture<'a> {
		self.password_calls.fetch_add(1, Ordering::SeqCst);

		self.respond()
	}

	fn exchange_refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> ExchangeFuture<'a> {
		self.refresh_calls.fetch_add(1, Ordering::SeqCst);
		self.seen_refresh_tokens.lock().push(refresh_token.expose().to_owned());

		self.respond()
	}
}

/// Request as observed by [`ScriptedTransport`].
#[derive(Clone, Debug)]
pub struct SeenRequest {
	pub method: String,
	pub uri: String,
	pub authorization: Option<String>,
	pub accept_language: Option<String>,
	pub content_type: Option<String>,
	pub body: Vec<u8>,
}

type Responder = Box<dyn Fn(&SeenRequest) -> (u16, Value) + Send + Sync>;

/// API backend double answering every request through a closure.
pub struct ScriptedTransport {
	respond: Responder,
	delay: StdDuration,
	seen: Mutex<Vec<SeenRequest>>,
}
impl ScriptedTransport {
	pub fn new<F>(respond: F) -> Self
	where
		F: 'static + Fn(&SeenRequest) -> (u16, Value) + Send + Sync,
	{
		Self { respond: Box::new(respond), delay: StdDuration::ZERO, seen: Mutex::new(Vec::new()) }
	}

	/// Answers with 200 for `Bearer <access>` and 401 for anything else.
	pub fn accepting(access: &'static str, body: Value) -> Self {
		let expected = format!("Bearer {access}");

		Self::new(move |request| match request.authorization.as_deref() {
			Some(value) if value == expected => (200, body.clone()),
			_ => (401, serde_json::json!({ "message": "token expired" })),
		})
	}

	pub fn with_delay(mut self, delay: StdDuration) -> Self {
		self.delay = delay;

		self
	}

	pub fn seen(&self) -> Vec<SeenRequest> {
		self.seen.lock().clone()
	}

	pub fn calls(&self) -> usize {
		self.seen.lock().len()
	}
}
impl HttpTransport for ScriptedTransport {
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
		let header_text = |name: header::HeaderName| {
			request.headers().get(name).and_then(|value| value.to_str().ok()).map(ToOwned::to_owned)
		};
		let seen = SeenRequest {
			method: request.method().to_string(),
			uri: request.uri().to_string(),
			authorization: header_text(header::AUTHORIZATION),
			accept_language: header_text(header::ACCEPT_LANGUAGE),
			content_type: header_text(header::CONTENT_TYPE),
			body: request.body().clone(),
		};
		let (status, body) = (self.respond)(&seen);

		self.seen.lock().push(seen);

		let delay = self.delay;

		Box::pin(async move {
			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			}

			let response: HttpResponse = oauth2::http::Response::builder()
				.status(status)
				.header(header::CONTENT_TYPE, "application/json")
				.body(body.to_string().into_bytes())
				.map_err(TransportError::network)?;

			Ok(response)
		})
	}
}

/// Listener that counts every user-visible session transition.
#[derive(Debug, Default)]
pub struct CountingListener {
	expired: AtomicUsize,
	logouts: AtomicUsize,
	return_to: Mutex<Vec<Option<String>>>,
}
impl CountingListener {
	pub fn expired(&self) -> usize {
		self.expired.load(Ordering::SeqCst)
	}

	pub fn logouts(&self) -> usize {
		self.logouts.load(Ordering::SeqCst)
	}

	/// Return locations handed to each logout, in order.
	pub fn return_locations(&self) -> Vec<Option<String>> {
		self.return_to.lock().clone()
	}
}
impl SessionListener for CountingListener {
	fn on_login_expired(&self) {
		self.expired.fetch_add(1, Ordering::SeqCst);
	}

	fn on_logout(&self, return_to: Option<&str>) {
		self.logouts.fetch_add(1, Ordering::SeqCst);
		self.return_to.lock().push(return_to.map(ToOwned::to_owned));
	}

	fn current_location(&self) -> Option<String> {
		Some("/dashboard".into())
	}
}

/// Notifier recording every notice it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
	notices: Mutex<Vec<ErrorNotice>>,
}
impl RecordingNotifier {
	pub fn notices(&self) -> Vec<ErrorNotice> {
		self.notices.lock().clone()
	}
}
impl Notifier for RecordingNotifier {
	fn notify(&self, notice: &ErrorNotice) {
		self.notices.lock().push(notice.clone());
	}
}

/// Config builder pointing at `token_endpoint` with a test client identity.
pub fn config_builder(token_endpoint: &str) -> SessionConfigBuilder {
	SessionConfig::builder(
		Url::parse(token_endpoint).expect("Test token endpoint should parse successfully."),
	)
	.client_id("client-test")
	.client_secret("secret-test")
}

pub fn test_config(token_endpoint: &str) -> SessionConfig {
	config_builder(token_endpoint).build().expect("Test session config should build successfully.")
}

/// Credential that expires `expires_in` from now.
pub fn credential_expiring_in(access: &str, refresh: &str, expires_in: Duration) -> Credential {
	Credential::new(access, refresh, OffsetDateTime::now_utc() + expires_in)
}

/// Everything a scripted broker was built from.
pub struct Harness {
	pub broker: SessionBroker,
	pub store: Arc<MemoryStore>,
	pub exchange: Arc<ScriptedExchange>,
	pub transport: Arc<ScriptedTransport>,
	pub listener: Arc<CountingListener>,
}

/// Builds a broker over an in-memory store, the scripted exchange and transport, and a counting
/// listener.
pub fn harness(
	config: SessionConfig,
	exchange: ScriptedExchange,
	transport: ScriptedTransport,
) -> Harness {
	let store = Arc::new(MemoryStore::default());
	let exchange = Arc::new(exchange);
	let transport = Arc::new(transport);
	let listener = Arc::new(CountingListener::default());
	let store_handle: Arc<dyn CredentialStore> = store.clone();
	let broker = SessionBroker::with_parts(
		config,
		store_handle,
		exchange.clone(),
		transport.clone(),
		listener.clone(),
	);

	Harness { broker, store, exchange, transport, listener }
}

/// Transport for suites that never reach the backend.
pub fn unreachable_backend() -> ScriptedTransport {
	ScriptedTransport::new(|_| (503, Value::Null))
}
