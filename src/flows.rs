//! Session flow orchestrators powered by the broker handle.

pub mod login;
pub mod reauth;
pub mod refresh;

pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	config::SessionConfig,
	http::HttpTransport,
	oauth::{OAuth2Exchange, TokenExchange},
	session::{SessionListener, SessionState},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Explicit owner of one session: the credential, the refresh single-flight, and teardown.
///
/// The request pipeline, the renewal scheduler, and application code share clones of the same
/// handle; every clone observes the same credential and the same in-flight refresh. The store,
/// token exchange, HTTP transport, and listener are injected so each can be swapped in tests.
#[derive(Clone)]
pub struct SessionBroker {
	inner: Arc<BrokerInner>,
}
impl SessionBroker {
	/// Creates a broker over the caller-provided collaborators.
	pub fn with_parts(
		config: SessionConfig,
		store: Arc<dyn CredentialStore>,
		exchange: Arc<dyn TokenExchange>,
		transport: Arc<dyn HttpTransport>,
		listener: Arc<dyn SessionListener>,
	) -> Self {
		Self {
			inner: Arc::new(BrokerInner {
				config,
				store,
				exchange,
				transport,
				listener,
				state: SessionState::default(),
				refresh: RefreshSlot::default(),
				refresh_metrics: RefreshMetrics::default(),
			}),
		}
	}

	/// Creates a broker whose token exchange and logout calls share `transport`.
	pub fn with_transport(
		config: SessionConfig,
		store: Arc<dyn CredentialStore>,
		transport: Arc<dyn HttpTransport>,
		listener: Arc<dyn SessionListener>,
	) -> Result<Self> {
		let exchange = Arc::new(OAuth2Exchange::new(&config, transport.clone())?);

		Ok(Self::with_parts(config, store, exchange, transport, listener))
	}

	/// Shared transport used for logout notifications and, by default, the request pipeline.
	pub fn transport(&self) -> Arc<dyn HttpTransport> {
		self.inner.transport.clone()
	}

	/// Active configuration.
	pub fn config(&self) -> &SessionConfig {
		&self.inner.config
	}

	/// Session-scoped flags (login expired, access checked).
	pub fn state(&self) -> &SessionState {
		&self.inner.state
	}

	/// Counters describing refresh activity.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.inner.refresh_metrics
	}

	/// Returns the currently held credential without renewing it.
	pub fn credential(&self) -> Option<Credential> {
		self.inner.store.get()
	}

	/// Installs a credential obtained out of band (e.g., restored from a previous process).
	///
	/// An already expired credential is accepted; the next call that needs it renews it.
	pub fn restore(&self, credential: Credential) {
		self.inner.store.set(Some(credential));
		self.inner.state.arm();
	}
}
#[cfg(feature = "reqwest")]
impl SessionBroker {
	/// Creates a broker backed by the crate's reqwest transport.
	///
	/// The transport enforces [`SessionConfig::request_timeout`] on every call and does not
	/// follow redirects.
	pub fn new(
		config: SessionConfig,
		store: Arc<dyn CredentialStore>,
		listener: Arc<dyn SessionListener>,
	) -> Result<Self> {
		let transport: Arc<dyn HttpTransport> =
			Arc::new(ReqwestTransport::new(config.request_timeout)?);
		let exchange = Arc::new(OAuth2Exchange::new(&config, transport.clone())?);

		Ok(Self::with_parts(config, store, exchange, transport, listener))
	}
}
impl Debug for SessionBroker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionBroker")
			.field("config", &self.inner.config)
			.field("state", &self.inner.state)
			.field("refresh_in_flight", &self.refresh_in_flight())
			.field("refresh_metrics", &self.inner.refresh_metrics)
			.finish()
	}
}

struct BrokerInner {
	config: SessionConfig,
	store: Arc<dyn CredentialStore>,
	exchange: Arc<dyn TokenExchange>,
	transport: Arc<dyn HttpTransport>,
	listener: Arc<dyn SessionListener>,
	state: SessionState,
	refresh: RefreshSlot,
	refresh_metrics: RefreshMetrics,
}
