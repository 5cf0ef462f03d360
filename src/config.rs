//! Construction-time configuration for the session broker.
//!
//! Everything the broker needs (client identity, endpoints, renewal policy, UX mode) is captured
//! in one validated [`SessionConfig`] and handed over at construction, so no component reads
//! ambient process state.

// self
use crate::{_prelude::*, error::ConfigError};

/// How a forced re-authentication surfaces to the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginExpiredMode {
	/// Raise the "login expired" flag and keep the current view (only once access was checked).
	Modal,
	#[default]
	/// Run the full logout flow and send the user back to the entry point.
	Logout,
}

/// Client identity presented to the token endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Optional client secret sent in the form body.
	pub client_secret: Option<String>,
	/// Optional scope requested with password grants.
	pub scope: Option<String>,
}
impl Debug for ClientIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientIdentity")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("scope", &self.scope)
			.finish()
	}
}

/// Validated broker configuration.
#[derive(Clone, Debug)]
pub struct SessionConfig {
	/// Client identity used for every grant.
	pub client: ClientIdentity,
	/// Token endpoint serving both `password` and `refresh_token` grants.
	pub token_endpoint: Url,
	/// Optional logout endpoint notified during teardown.
	pub logout_endpoint: Option<Url>,
	/// Credentials expiring within this window are renewed.
	pub refresh_threshold: Duration,
	/// Tick period of the proactive renewal job.
	pub renewal_interval: StdDuration,
	/// Deadline applied to every outbound call, the exchange included.
	pub request_timeout: StdDuration,
	/// Enables 401-triggered and proactive renewal.
	pub enable_refresh_token: bool,
	/// Teardown UX.
	pub login_expired_mode: LoginExpiredMode,
	/// Value sent as `Accept-Language`.
	pub locale: String,
}
impl SessionConfig {
	/// Default renewal window.
	pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::minutes(5);
	/// Default proactive renewal tick.
	pub const DEFAULT_RENEWAL_INTERVAL: StdDuration = StdDuration::from_secs(200);
	/// Default per-request deadline.
	pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

	/// Creates a builder for the provided token endpoint.
	pub fn builder(token_endpoint: Url) -> SessionConfigBuilder {
		SessionConfigBuilder::new(token_endpoint)
	}
}

/// Builder for [`SessionConfig`].
#[derive(Clone, Debug)]
pub struct SessionConfigBuilder {
	token_endpoint: Url,
	logout_endpoint: Option<Url>,
	client_id: String,
	client_secret: Option<String>,
	scope: Option<String>,
	refresh_threshold: Duration,
	renewal_interval: StdDuration,
	request_timeout: StdDuration,
	enable_refresh_token: bool,
	login_expired_mode: LoginExpiredMode,
	locale: String,
}
impl SessionConfigBuilder {
	fn new(token_endpoint: Url) -> Self {
		Self {
			token_endpoint,
			logout_endpoint: None,
			client_id: String::new(),
			client_secret: None,
			scope: None,
			refresh_threshold: SessionConfig::DEFAULT_REFRESH_THRESHOLD,
			renewal_interval: SessionConfig::DEFAULT_RENEWAL_INTERVAL,
			request_timeout: SessionConfig::DEFAULT_REQUEST_TIMEOUT,
			enable_refresh_token: true,
			login_expired_mode: LoginExpiredMode::default(),
			locale: "en-US".into(),
		}
	}

	/// Sets the client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the scope requested during login.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the logout endpoint.
	pub fn logout_endpoint(mut self, endpoint: Url) -> Self {
		self.logout_endpoint = Some(endpoint);

		self
	}

	/// Overrides the renewal window (negative values clamp to zero).
	pub fn refresh_threshold(mut self, threshold: Duration) -> Self {
		self.refresh_threshold = if threshold.is_negative() { Duration::ZERO } else { threshold };

		self
	}

	/// Overrides the proactive renewal tick.
	pub fn renewal_interval(mut self, interval: StdDuration) -> Self {
		self.renewal_interval = interval;

		self
	}

	/// Overrides the per-request deadline.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Enables or disables credential renewal.
	pub fn enable_refresh_token(mut self, enabled: bool) -> Self {
		self.enable_refresh_token = enabled;

		self
	}

	/// Selects the teardown UX.
	pub fn login_expired_mode(mut self, mode: LoginExpiredMode) -> Self {
		self.login_expired_mode = mode;

		self
	}

	/// Sets the `Accept-Language` value.
	pub fn locale(mut self, locale: impl Into<String>) -> Self {
		self.locale = locale.into();

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<SessionConfig, ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.renewal_interval.is_zero() {
			return Err(ConfigError::NonPositiveDuration { setting: "renewal_interval" });
		}
		if self.request_timeout.is_zero() {
			return Err(ConfigError::NonPositiveDuration { setting: "request_timeout" });
		}

		Ok(SessionConfig {
			client: ClientIdentity {
				client_id: self.client_id,
				client_secret: self.client_secret,
				scope: self.scope,
			},
			token_endpoint: self.token_endpoint,
			logout_endpoint: self.logout_endpoint,
			refresh_threshold: self.refresh_threshold,
			renewal_interval: self.renewal_interval,
			request_timeout: self.request_timeout,
			enable_refresh_token: self.enable_refresh_token,
			login_expired_mode: self.login_expired_mode,
			locale: self.locale,
		})
	}
}
