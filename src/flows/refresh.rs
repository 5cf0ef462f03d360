//! Refresh coordination with a single-flight slot, FIFO fan-out, and metrics.
//!
//! [`SessionBroker::ensure_fresh_credential`] returns the held credential while it outlives the
//! configured threshold. Otherwise the first caller opens a refresh episode: the in-flight check
//! and the episode registration happen under one lock, so concurrent callers either see the open
//! episode and wait on it or see the finished result. Exactly one `refresh_token` exchange runs
//! per episode and every waiter observes its single outcome, released in registration order.
//!
//! The exchange runs on its own task. A caller that is dropped or canceled only loses its waiter;
//! the episode still completes and stores its result for everyone else.

mod metrics;

pub use self::metrics::{RefreshMetrics, RefreshSnapshot};

// crates.io
use tokio::sync::oneshot;
// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	error::TransportError,
	flows::{SessionBroker, refresh::metrics::RefreshEvent},
	obs::{FlowKind, FlowOutcome, FlowSpan},
};

type RefreshOutcome = std::result::Result<Credential, String>;

/// FIFO list of waiters for the open refresh episode; `None` while nothing is in flight.
#[derive(Debug, Default)]
pub(crate) struct RefreshSlot(Mutex<Option<Vec<oneshot::Sender<RefreshOutcome>>>>);

/// Result of one proactive renewal check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenewalDecision {
	/// Renewal is disabled by configuration.
	Disabled,
	/// No credential is held.
	NoCredential,
	/// The credential outlives the threshold.
	NotDue,
	/// A refresh episode was already in flight.
	InFlight,
	/// A new credential was issued and stored.
	Renewed(Credential),
}

enum Admission {
	Ready(Credential),
	Wait(oneshot::Receiver<RefreshOutcome>),
	Reauth(&'static str),
}

impl SessionBroker {
	/// Returns a credential that outlives the refresh threshold, renewing it when needed.
	///
	/// Concurrent callers share one exchange. A failed exchange clears the credential, runs the
	/// re-authentication trigger once, and resolves every waiter with
	/// [`Error::ReauthRequired`].
	pub async fn ensure_fresh_credential(&self) -> Result<Credential> {
		let threshold = self.inner.config.refresh_threshold;
		let admission = self.admit(FlowKind::Refresh, |current| {
			current.is_fresh_at(OffsetDateTime::now_utc(), threshold)
		});

		self.resolve(admission).await
	}

	/// Renews after the server rejected `rejected_access_token` with 401.
	///
	/// When the held credential already differs from the rejected token (another request refreshed
	/// it meanwhile) it is returned as-is; otherwise a refresh is forced regardless of the expiry
	/// instant.
	pub async fn ensure_after_rejection(
		&self,
		rejected_access_token: Option<&str>,
	) -> Result<Credential> {
		let admission = self.admit(FlowKind::Refresh, |current| {
			rejected_access_token.is_none_or(|rejected| !current.access_token.is(rejected))
		});

		self.resolve(admission).await
	}

	/// Runs one proactive renewal check; failures end the session and surface as errors.
	pub async fn renew_if_due(&self) -> Result<RenewalDecision> {
		if !self.inner.config.enable_refresh_token {
			return Ok(RenewalDecision::Disabled);
		}

		let rx = {
			let mut slot = self.inner.refresh.0.lock();

			if slot.is_some() {
				return Ok(RenewalDecision::InFlight);
			}

			let Some(current) = self.inner.store.get() else {
				return Ok(RenewalDecision::NoCredential);
			};
			let remaining = current.remaining_at(OffsetDateTime::now_utc());

			if remaining > self.inner.config.refresh_threshold {
				tracing::debug!(remaining = %remaining, "Credential is not due for renewal.");

				return Ok(RenewalDecision::NotDue);
			}

			self.open_episode(&mut slot, current.refresh_token, FlowKind::Renewal)
		};

		Self::await_outcome(rx).await.map(RenewalDecision::Renewed)
	}

	/// Whether a refresh episode is currently open.
	pub fn refresh_in_flight(&self) -> bool {
		self.inner.refresh.0.lock().is_some()
	}

	fn admit<F>(&self, kind: FlowKind, usable: F) -> Admission
	where
		F: FnOnce(&Credential) -> bool,
	{
		let mut slot = self.inner.refresh.0.lock();

		if let Some(waiters) = slot.as_mut() {
			let (tx, rx) = oneshot::channel();

			waiters.push(tx);
			self.inner.refresh_metrics.record(RefreshEvent::Joined);

			return Admission::Wait(rx);
		}

		let Some(current) = self.inner.store.get() else {
			return Admission::Reauth("no credential is held");
		};

		if usable(&current) {
			return Admission::Ready(current);
		}
		if !self.inner.config.enable_refresh_token {
			return Admission::Reauth("credential renewal is disabled");
		}

		Admission::Wait(self.open_episode(&mut slot, current.refresh_token, kind))
	}

	async fn resolve(&self, admission: Admission) -> Result<Credential> {
		match admission {
			Admission::Ready(credential) => Ok(credential),
			Admission::Wait(rx) => Self::await_outcome(rx).await,
			Admission::Reauth(reason) => {
				self.force_reauthenticate();

				Err(Error::reauth_required(reason))
			},
		}
	}

	async fn await_outcome(rx: oneshot::Receiver<RefreshOutcome>) -> Result<Credential> {
		match rx.await {
			Ok(Ok(credential)) => Ok(credential),
			Ok(Err(reason)) => Err(Error::reauth_required(reason)),
			Err(_) => Err(Error::reauth_required("refresh episode ended without a result")),
		}
	}

	// The caller holds the slot lock, which makes the in-flight check and this registration atomic.
	fn open_episode(
		&self,
		slot: &mut Option<Vec<oneshot::Sender<RefreshOutcome>>>,
		refresh_token: TokenSecret,
		kind: FlowKind,
	) -> oneshot::Receiver<RefreshOutcome> {
		let (tx, rx) = oneshot::channel();
		let broker = self.clone();

		*slot = Some(vec![tx]);

		tokio::spawn(async move { broker.run_episode(refresh_token, kind).await });

		rx
	}

	async fn run_episode(self, refresh_token: TokenSecret, kind: FlowKind) {
		let span = FlowSpan::start(kind, "refresh_episode");
		let mut guard = EpisodeGuard { broker: self.clone(), settled: false };

		self.inner.refresh_metrics.record(RefreshEvent::Started);

		let exchange = tokio::time::timeout(
			self.inner.config.request_timeout,
			self.inner.exchange.exchange_refresh(&refresh_token),
		);
		let result = match span.in_span(exchange).await {
			Ok(result) => result,
			Err(_) => Err(TransportError::Timeout.into()),
		};
		let mut cleared = None;
		let outcome = match result {
			Ok(grant) => {
				let credential = grant.into_credential(OffsetDateTime::now_utc());

				self.inner.store.set(Some(credential.clone()));
				self.inner.refresh_metrics.record(RefreshEvent::Renewed);

				Ok(credential)
			},
			Err(err) => {
				tracing::error!(flow = kind.as_str(), error = %err, "Credential refresh failed.");

				cleared = self.inner.store.take();
				self.inner.refresh_metrics.record(RefreshEvent::Failed);

				Err(err.to_string())
			},
		};

		span.finish(FlowOutcome::of(&outcome));
		guard.settled = true;
		self.settle(outcome, cleared);
	}

	// A failed episode tears the session down before its waiters are released.
	fn settle(&self, outcome: RefreshOutcome, cleared: Option<Credential>) {
		let waiters = self.inner.refresh.0.lock().take().unwrap_or_default();

		if outcome.is_err() {
			self.reauthenticate_after(cleared);
		}

		for waiter in waiters {
			let _ = waiter.send(outcome.clone());
		}
	}
}

/// Fails the open episode when `run_episode` is dropped before settling, e.g. after the exchange
/// panicked.
struct EpisodeGuard {
	broker: SessionBroker,
	settled: bool,
}
impl Drop for EpisodeGuard {
	fn drop(&mut self) {
		if self.settled {
			return;
		}

		tracing::error!("Refresh episode aborted before the exchange resolved.");

		let cleared = self.broker.inner.store.take();

		self.broker.inner.refresh_metrics.record(RefreshEvent::Failed);
		self.broker.settle(Err("refresh episode aborted".into()), cleared);
	}
}
