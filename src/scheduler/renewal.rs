//! Proactive credential renewal as a scheduled job.

// self
use crate::{
	_prelude::*,
	error::BoxError,
	flows::{RenewalDecision, SessionBroker},
	scheduler::{JobSpec, Scheduler},
};

/// Job id of the proactive renewal job.
pub const AUTO_REFRESH_JOB_ID: &str = "auto-refresh-token";

impl SessionBroker {
	/// Job renewing the credential every [`SessionConfig::renewal_interval`] once it enters the
	/// refresh threshold.
	///
	/// A failed renewal ends the session like any other failed refresh; the scheduler logs it.
	///
	/// [`SessionConfig::renewal_interval`]: crate::config::SessionConfig::renewal_interval
	pub fn renewal_job(&self) -> JobSpec {
		let broker = self.clone();

		JobSpec::new(self.config().renewal_interval, move || {
			let broker = broker.clone();

			async move {
				let decision = broker.renew_if_due().await?;

				match decision {
					RenewalDecision::Renewed(credential) => tracing::info!(
						expires_at = %credential.expires_at,
						"Credential renewed proactively."
					),
					decision => tracing::debug!(?decision, "Renewal check finished."),
				}

				Ok::<(), BoxError>(())
			}
		})
	}

	/// Registers the renewal job under [`AUTO_REFRESH_JOB_ID`]; returns `false` when it was
	/// already running or renewal is disabled.
	pub fn start_auto_refresh(&self, scheduler: &Scheduler) -> Result<bool> {
		if !self.config().enable_refresh_token {
			tracing::debug!("Credential renewal is disabled; not scheduling the renewal job.");

			return Ok(false);
		}
		if scheduler.contains(AUTO_REFRESH_JOB_ID) {
			return Ok(false);
		}

		scheduler.register(AUTO_REFRESH_JOB_ID, self.renewal_job())?;

		Ok(true)
	}

	/// Removes the renewal job; returns whether it was registered.
	pub fn stop_auto_refresh(&self, scheduler: &Scheduler) -> bool {
		scheduler.remove(AUTO_REFRESH_JOB_ID)
	}
}
