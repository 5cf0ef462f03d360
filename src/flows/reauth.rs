//! Re-authentication trigger: idempotent teardown after the session can no longer be renewed.

// self
use crate::{
	auth::Credential,
	config::LoginExpiredMode,
	flows::SessionBroker,
	obs::{FlowKind, FlowOutcome, FlowSpan},
};

impl SessionBroker {
	/// Ends the session after renewal became impossible.
	///
	/// Only the first call since the last login or restore has an effect. It clears the
	/// credential and then either raises the "login expired" flag (modal mode, once access was
	/// checked) or runs the full logout flow, recording the listener's current location for the
	/// return trip. Never fails; logout endpoint errors are swallowed.
	pub fn force_reauthenticate(&self) {
		self.reauthenticate_after(None);
	}

	/// Same as [`SessionBroker::force_reauthenticate`] when the caller already cleared the store;
	/// `cleared` supplies the access token for the logout notice.
	pub(crate) fn reauthenticate_after(&self, cleared: Option<Credential>) {
		if !self.inner.state.begin_teardown() {
			tracing::debug!("Re-authentication already triggered; ignoring.");

			return;
		}

		let span = FlowSpan::start(FlowKind::Logout, "force_reauthenticate");
		let _guard = span.enter();
		let previous = self.inner.store.take().or(cleared);

		if self.inner.config.login_expired_mode == LoginExpiredMode::Modal
			&& self.inner.state.is_access_checked()
		{
			tracing::warn!("Session expired; raising the login expired flag.");

			self.inner.state.set_login_expired(true);
			self.inner.listener.on_login_expired();
		} else {
			tracing::warn!("Session expired; logging out.");

			let return_to = self.inner.listener.current_location();

			self.spawn_logout_notice(previous.map(|credential| credential.access_token));
			self.inner.state.reset();
			self.inner.listener.on_logout(return_to.as_deref());
		}

		span.finish(FlowOutcome::Success);
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::{
		_prelude::*,
		auth::TokenSecret,
		config::SessionConfig,
		error::TransportError,
		http::{HttpTransport, TransportFuture},
		oauth::{ExchangeFuture, TokenExchange},
		session::SessionListener,
		store::{CredentialStore, MemoryStore},
	};

	struct Unreachable;
	impl TokenExchange for Unreachable {
		fn exchange_password<'a>(&'a self, _: &'a str, _: &'a str) -> ExchangeFuture<'a> {
			Box::pin(async { Err(TransportError::Timeout.into()) })
		}

		fn exchange_refresh<'a>(&'a self, _: &'a TokenSecret) -> ExchangeFuture<'a> {
			Box::pin(async { Err(TransportError::Timeout.into()) })
		}
	}
	impl HttpTransport for Unreachable {
		fn execute(&self, _: oauth2::HttpRequest) -> TransportFuture<'_> {
			Box::pin(async { Err(TransportError::Timeout) })
		}
	}

	#[derive(Default)]
	struct Transitions {
		expired: AtomicUsize,
		logouts: AtomicUsize,
	}
	impl SessionListener for Transitions {
		fn on_login_expired(&self) {
			self.expired.fetch_add(1, Ordering::SeqCst);
		}

		fn on_logout(&self, return_to: Option<&str>) {
			assert_eq!(return_to, Some("/orders/42"));

			self.logouts.fetch_add(1, Ordering::SeqCst);
		}

		fn current_location(&self) -> Option<String> {
			Some("/orders/42".into())
		}
	}

	fn build(mode: LoginExpiredMode) -> (SessionBroker, Arc<Transitions>) {
		let config = SessionConfig::builder(
			Url::parse("https://auth.example.com/token").expect("Failed to parse endpoint."),
		)
		.client_id("web")
		.login_expired_mode(mode)
		.build()
		.expect("Failed to build config.");
		let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::with_credential(
			Credential::new("A1", "R1", OffsetDateTime::now_utc() + Duration::hours(1)),
		));
		let listener = Arc::new(Transitions::default());
		let broker = SessionBroker::with_parts(
			config,
			store,
			Arc::new(Unreachable),
			Arc::new(Unreachable),
			listener.clone(),
		);

		(broker, listener)
	}

	#[tokio::test]
	async fn repeated_triggers_log_out_once() {
		let (broker, listener) = build(LoginExpiredMode::Logout);

		broker.force_reauthenticate();
		broker.force_reauthenticate();

		assert!(broker.credential().is_none());
		assert_eq!(listener.logouts.load(Ordering::SeqCst), 1);
		assert_eq!(listener.expired.load(Ordering::SeqCst), 0);
	}

	#[tokio::test]
	async fn modal_mode_raises_flag_only_after_access_check() {
		let (broker, listener) = build(LoginExpiredMode::Modal);

		broker.state().set_access_checked(true);
		broker.force_reauthenticate();

		assert!(broker.state().login_expired());
		assert_eq!(listener.expired.load(Ordering::SeqCst), 1);
		assert_eq!(listener.logouts.load(Ordering::SeqCst), 0);

		let (broker, listener) = build(LoginExpiredMode::Modal);

		broker.force_reauthenticate();

		assert!(!broker.state().login_expired());
		assert_eq!(listener.logouts.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn restore_rearms_teardown() {
		let (broker, listener) = build(LoginExpiredMode::Logout);

		broker.force_reauthenticate();
		broker.restore(Credential::new("A9", "R9", OffsetDateTime::now_utc() + Duration::hours(1)));
		broker.force_reauthenticate();

		assert_eq!(listener.logouts.load(Ordering::SeqCst), 2);
	}
}
