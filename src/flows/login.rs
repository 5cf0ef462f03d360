//! Password login and explicit logout.

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret, format_token},
	flows::SessionBroker,
	http::{HttpTransport, Method, header},
	obs::{FlowKind, FlowOutcome, FlowSpan},
};

impl SessionBroker {
	/// Exchanges resource-owner credentials for a new session.
	///
	/// On success the credential is stored, teardown is re-armed, and the "login expired" flag is
	/// cleared. Exchange failures are returned unchanged and leave the current state untouched.
	pub async fn login(&self, username: &str, password: &str) -> Result<Credential> {
		let span = FlowSpan::start(FlowKind::Login, "login");
		let result = span.in_span(self.inner.exchange.exchange_password(username, password)).await;

		span.finish(FlowOutcome::of(&result));

		match result {
			Ok(grant) => {
				let credential = grant.into_credential(OffsetDateTime::now_utc());

				self.inner.store.set(Some(credential.clone()));
				self.inner.state.arm();
				self.inner.state.set_login_expired(false);

				Ok(credential)
			},
			Err(err) => {
				tracing::info!(error = %err, "Login failed.");

				Err(err)
			},
		}
	}

	/// Ends the session on request of the user.
	///
	/// The logout endpoint is notified with the outgoing access token and its answer is ignored.
	/// The credential and every session flag are cleared. With `redirect`, the listener receives
	/// the current location so the user can return there after signing in again.
	pub async fn logout(&self, redirect: bool) {
		let span = FlowSpan::start(FlowKind::Logout, "logout");

		// Claiming the latch keeps late 401s from tearing down a second time.
		self.inner.state.begin_teardown();

		let previous = self.inner.store.take();
		let return_to = if redirect { self.inner.listener.current_location() } else { None };

		span.in_span(send_logout_notice(
			self.inner.transport.clone(),
			self.inner.config.logout_endpoint.clone(),
			previous.map(|credential| credential.access_token),
		))
		.await;

		self.inner.state.reset();
		self.inner.listener.on_logout(return_to.as_deref());
		span.finish(FlowOutcome::Success);
	}

	pub(crate) fn spawn_logout_notice(&self, access_token: Option<TokenSecret>) {
		let Some(endpoint) = self.inner.config.logout_endpoint.clone() else {
			return;
		};
		let Ok(runtime) = tokio::runtime::Handle::try_current() else {
			tracing::debug!("No async runtime available; skipping logout notice.");

			return;
		};

		runtime.spawn(send_logout_notice(
			self.inner.transport.clone(),
			Some(endpoint),
			access_token,
		));
	}
}

async fn send_logout_notice(
	transport: Arc<dyn HttpTransport>,
	endpoint: Option<Url>,
	access_token: Option<TokenSecret>,
) {
	let Some(endpoint) = endpoint else {
		return;
	};
	let mut builder = oauth2::http::Request::builder().method(Method::POST).uri(endpoint.as_str());

	if let Some(value) = format_token(access_token.as_ref()) {
		builder = builder.header(header::AUTHORIZATION, value);
	}

	let request = match builder.body(Vec::new()) {
		Ok(request) => request,
		Err(err) => {
			tracing::debug!(error = %err, "Logout notice could not be built.");

			return;
		},
	};

	match transport.execute(request).await {
		Ok(response) if !response.status().is_success() => {
			let status = response.status().as_u16();

			tracing::debug!(status, "Logout endpoint rejected the notice.");
		},
		Ok(_) => {},
		Err(err) => tracing::debug!(error = %err, "Logout notice failed; ignoring."),
	}
}
