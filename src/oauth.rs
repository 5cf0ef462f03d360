//! Token endpoint facade: `password` logins and `refresh_token` renewals.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RefreshToken,
	RequestTokenError, ResourceOwnerPassword, ResourceOwnerUsername, Scope, TokenResponse,
	TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenGrant, TokenSecret},
	config::SessionConfig,
	error::{ConfigError, ExchangeError, TransportError},
	http::{HttpTransport, TransportHandle},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Boxed future returned by [`TokenExchange`] calls.
pub type ExchangeFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenGrant>> + 'a + Send>>;

/// Token endpoint collaborator.
///
/// Successful calls return a complete [`TokenGrant`]; payloads missing the access token, refresh
/// token, or a positive lifetime resolve as [`ExchangeError::Malformed`].
pub trait TokenExchange
where
	Self: Send + Sync,
{
	/// Exchanges resource-owner credentials for a token triple.
	fn exchange_password<'a>(&'a self, username: &'a str, password: &'a str) -> ExchangeFuture<'a>;

	/// Exchanges a refresh token for a new token triple.
	fn exchange_refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> ExchangeFuture<'a>;
}

/// [`TokenExchange`] backed by the `oauth2` crate over any [`HttpTransport`].
///
/// Client id and secret travel in the form body alongside the grant parameters.
#[derive(Clone)]
pub struct OAuth2Exchange {
	oauth_client: ConfiguredBasicClient,
	http: TransportHandle,
	scope: Option<String>,
	timeout: StdDuration,
}
impl OAuth2Exchange {
	/// Builds the facade from the session configuration.
	pub fn new(config: &SessionConfig, transport: Arc<dyn HttpTransport>) -> Result<Self> {
		let token_url = TokenUrl::new(config.token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidUrl { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(config.client.client_id.clone()))
			.set_token_uri(token_url)
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = &config.client.client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.clone()));
		}

		Ok(Self {
			oauth_client,
			http: TransportHandle::new(transport),
			scope: config.client.scope.clone(),
			timeout: config.request_timeout,
		})
	}
}
impl TokenExchange for OAuth2Exchange {
	fn exchange_password<'a>(&'a self, username: &'a str, password: &'a str) -> ExchangeFuture<'a> {
		Box::pin(async move {
			let username = ResourceOwnerUsername::new(username.to_owned());
			let password = ResourceOwnerPassword::new(password.to_owned());
			let mut request = self.oauth_client.exchange_password(&username, &password);

			if let Some(scope) = &self.scope {
				for value in scope.split_whitespace() {
					request = request.add_scope(Scope::new(value.to_owned()));
				}
			}

			let response = tokio::time::timeout(self.timeout, request.request_async(&self.http))
				.await
				.map_err(|_| TransportError::Timeout)?
				.map_err(map_request_error)?;

			map_token_response(response)
		})
	}

	fn exchange_refresh<'a>(&'a self, refresh_token: &'a TokenSecret) -> ExchangeFuture<'a> {
		Box::pin(async move {
			let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
			let request = self.oauth_client.exchange_refresh_token(&refresh_secret);
			let response = tokio::time::timeout(self.timeout, request.request_async(&self.http))
				.await
				.map_err(|_| TransportError::Timeout)?
				.map_err(map_request_error)?;

			map_token_response(response)
		})
	}
}
impl Debug for OAuth2Exchange {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Exchange")
			.field("token_url", &self.oauth_client.token_uri().as_str())
			.field("scope", &self.scope)
			.field("timeout", &self.timeout)
			.finish()
	}
}

fn map_token_response(response: BasicTokenResponse) -> Result<TokenGrant> {
	let access_token = response.access_token().secret();

	if access_token.is_empty() {
		return Err(ExchangeError::Malformed { field: "access_token" }.into());
	}

	let refresh_token = response
		.refresh_token()
		.map(|token| token.secret())
		.filter(|secret| !secret.is_empty())
		.ok_or(ExchangeError::Malformed { field: "refresh_token" })?;
	let expires_in =
		response.expires_in().ok_or(ExchangeError::Malformed { field: "expires_in" })?.as_secs();
	let expires_in =
		i64::try_from(expires_in).map_err(|_| ExchangeError::Malformed { field: "expires_in" })?;

	if expires_in <= 0 {
		return Err(ExchangeError::Malformed { field: "expires_in" }.into());
	}

	Ok(TokenGrant::new(
		access_token.to_owned(),
		refresh_token.to_owned(),
		Duration::seconds(expires_in),
	))
}

fn map_request_error(err: BasicRequestTokenError<HttpClientError<TransportError>>) -> Error {
	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response),
		RequestTokenError::Request(error) => map_transport_error(error),
		RequestTokenError::Parse(source, body) =>
			message_body_error(&body).unwrap_or(ExchangeError::Parse { source }).into(),
		RequestTokenError::Other(message) =>
			ExchangeError::Rejected { error: message, message: None, status: None }.into(),
	}
}

fn map_server_response_error(response: BasicErrorResponse) -> Error {
	ExchangeError::Rejected {
		error: response.error().as_ref().to_owned(),
		message: response.error_description().cloned(),
		status: None,
	}
	.into()
}

// Non-OAuth error bodies such as `{"message": "..."}` fail `oauth2`'s error parsing.
fn message_body_error(body: &[u8]) -> Option<ExchangeError> {
	let value: serde_json::Value = serde_json::from_slice(body).ok()?;
	let message = value.get("message")?.as_str()?.to_owned();

	Some(ExchangeError::Rejected { error: message.clone(), message: Some(message), status: None })
}

fn map_transport_error(err: HttpClientError<TransportError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => (*inner).into(),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) =>
			TransportError::network(std::io::Error::other(message)).into(),
		_ => TransportError::network(std::io::Error::other("unknown HTTP client error")).into(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::{HttpRequest, HttpResponse, http::StatusCode};
	// self
	use super::*;
	use crate::http::TransportFuture;

	struct CannedTransport {
		status: StatusCode,
		body: &'static str,
		seen: Mutex<Vec<String>>,
	}
	impl CannedTransport {
		fn new(status: StatusCode, body: &'static str) -> Arc<Self> {
			Arc::new(Self { status, body, seen: Mutex::new(Vec::new()) })
		}
	}
	impl HttpTransport for CannedTransport {
		fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
			self.seen.lock().push(String::from_utf8_lossy(request.body()).into_owned());

			let mut response = HttpResponse::new(self.body.as_bytes().to_vec());

			*response.status_mut() = self.status;
			response.headers_mut().insert(
				oauth2::http::header::CONTENT_TYPE,
				oauth2::http::HeaderValue::from_static("application/json"),
			);

			Box::pin(async move { Ok(response) })
		}
	}

	fn config() -> SessionConfig {
		SessionConfig::builder(
			Url::parse("https://auth.example.com/connect/token")
				.expect("Failed to parse token endpoint URL."),
		)
		.client_id("web-client")
		.client_secret("web-secret")
		.scope("openid offline_access")
		.build()
		.expect("Failed to build session config.")
	}

	#[tokio::test]
	async fn refresh_sends_grant_and_maps_triple() {
		let transport = CannedTransport::new(
			StatusCode::OK,
			r#"{"access_token":"A2","refresh_token":"R2","token_type":"bearer","expires_in":1800}"#,
		);
		let exchange =
			OAuth2Exchange::new(&config(), transport.clone()).expect("Failed to build exchange.");
		let grant = exchange
			.exchange_refresh(&TokenSecret::new("R1"))
			.await
			.expect("Refresh exchange should succeed.");

		assert_eq!(grant.access_token.expose(), "A2");
		assert_eq!(grant.refresh_token.expose(), "R2");
		assert_eq!(grant.expires_in, Duration::seconds(1_800));

		let body = transport.seen.lock()[0].clone();

		assert!(body.contains("grant_type=refresh_token"));
		assert!(body.contains("refresh_token=R1"));
		assert!(body.contains("client_id=web-client"));
		assert!(body.contains("client_secret=web-secret"));
	}

	#[tokio::test]
	async fn password_grant_requests_configured_scopes() {
		let transport = CannedTransport::new(
			StatusCode::OK,
			r#"{"access_token":"A1","refresh_token":"R1","token_type":"bearer","expires_in":3600}"#,
		);
		let exchange =
			OAuth2Exchange::new(&config(), transport.clone()).expect("Failed to build exchange.");

		exchange.exchange_password("alice", "pa55").await.expect("Password grant should succeed.");

		let body = transport.seen.lock()[0].clone();

		assert!(body.contains("grant_type=password"));
		assert!(body.contains("username=alice"));
		assert!(body.contains("scope=openid+offline_access"));
	}

	#[tokio::test]
	async fn missing_refresh_token_is_malformed() {
		let transport = CannedTransport::new(
			StatusCode::OK,
			r#"{"access_token":"A2","token_type":"bearer","expires_in":1800}"#,
		);
		let exchange =
			OAuth2Exchange::new(&config(), transport).expect("Failed to build exchange.");
		let err = exchange
			.exchange_refresh(&TokenSecret::new("R1"))
			.await
			.expect_err("A grant without a refresh token should be rejected.");

		assert!(matches!(
			err,
			Error::Exchange(ExchangeError::Malformed { field: "refresh_token" })
		));
	}

	#[tokio::test]
	async fn oauth_and_message_error_bodies_are_rejections() {
		let transport =
			CannedTransport::new(StatusCode::BAD_REQUEST, r#"{"error":"invalid_grant"}"#);
		let exchange =
			OAuth2Exchange::new(&config(), transport).expect("Failed to build exchange.");
		let err = exchange
			.exchange_refresh(&TokenSecret::new("R1"))
			.await
			.expect_err("invalid_grant should be rejected.");

		assert!(matches!(
			err,
			Error::Exchange(ExchangeError::Rejected { ref error, .. }) if error == "invalid_grant"
		));

		let transport =
			CannedTransport::new(StatusCode::UNAUTHORIZED, r#"{"message":"session revoked"}"#);
		let exchange =
			OAuth2Exchange::new(&config(), transport).expect("Failed to build exchange.");
		let err = exchange
			.exchange_refresh(&TokenSecret::new("R1"))
			.await
			.expect_err("Message bodies should be rejected.");

		assert!(matches!(
			err,
			Error::Exchange(ExchangeError::Rejected { ref error, .. }) if error == "session revoked"
		));
	}
}
