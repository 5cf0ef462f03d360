//! Fixed-interval background jobs with overrun protection.
//!
//! Each registered job owns a ticker task. A tick spawns one run of the job's handler; with the
//! overrun guard (the default) a tick that fires while the previous run is still going is dropped,
//! never queued. Registering an id that already exists replaces the old job, so at most one job is
//! active per id. Removing a job cancels its ticker and any run in progress.

pub mod renewal;

pub use renewal::AUTO_REFRESH_JOB_ID;

// crates.io
use tokio::{
	task::JoinHandle,
	time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
// self
use crate::{
	_prelude::*,
	error::{BoxError, ConfigError},
};

/// Boxed future produced by one job run.
pub type JobFuture = Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send>>;
/// Hook receiving the job id and the error of a failed run.
pub type ErrorHook = Arc<dyn Fn(&str, &BoxError) + Send + Sync>;

/// Work performed on every tick.
pub trait JobHandler
where
	Self: 'static + Send + Sync,
{
	/// Starts one run.
	fn run(&self) -> JobFuture;
}
impl<F, Fut> JobHandler for F
where
	F: 'static + Fn() -> Fut + Send + Sync,
	Fut: 'static + Future<Output = Result<(), BoxError>> + Send,
{
	fn run(&self) -> JobFuture {
		Box::pin(self())
	}
}

/// Registration parameters of a job.
#[derive(Clone)]
pub struct JobSpec {
	interval: StdDuration,
	handler: Arc<dyn JobHandler>,
	prevent_overrun: bool,
	on_error: Option<ErrorHook>,
}
impl JobSpec {
	/// Runs `handler` every `interval`, first one interval after registration.
	pub fn new(interval: StdDuration, handler: impl JobHandler) -> Self {
		Self { interval, handler: Arc::new(handler), prevent_overrun: true, on_error: None }
	}

	/// Enables or disables the overrun guard (enabled by default).
	pub fn prevent_overrun(mut self, enabled: bool) -> Self {
		self.prevent_overrun = enabled;

		self
	}

	/// Replaces the default error logging with `hook`.
	pub fn on_error<F>(mut self, hook: F) -> Self
	where
		F: 'static + Fn(&str, &BoxError) + Send + Sync,
	{
		self.on_error = Some(Arc::new(hook));

		self
	}

	/// Tick period.
	pub fn interval(&self) -> StdDuration {
		self.interval
	}
}
impl Debug for JobSpec {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("JobSpec")
			.field("interval", &self.interval)
			.field("prevent_overrun", &self.prevent_overrun)
			.field("on_error_set", &self.on_error.is_some())
			.finish()
	}
}

/// Registry of running jobs; clones share the registry.
#[derive(Clone, Debug, Default)]
pub struct Scheduler {
	jobs: Arc<Mutex<HashMap<String, JobEntry>>>,
}
impl Scheduler {
	/// Creates an empty scheduler.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `spec` under `id`, replacing any job with the same id.
	///
	/// Must be called from within a Tokio runtime.
	pub fn register(&self, id: impl Into<String>, spec: JobSpec) -> Result<()> {
		if spec.interval.is_zero() {
			return Err(ConfigError::NonPositiveDuration { setting: "interval" }.into());
		}

		let runtime = tokio::runtime::Handle::try_current().map_err(|_| ConfigError::NoRuntime)?;
		let id = id.into();
		let cancel = CancellationToken::new();
		let task = runtime.spawn(drive(id.clone(), spec, cancel.clone()));

		if let Some(previous) = self.jobs.lock().insert(id.clone(), JobEntry { cancel, task }) {
			tracing::debug!(job = %id, "Replacing scheduled job.");

			previous.cancel.cancel();
		}

		Ok(())
	}

	/// Removes the job registered under `id`; returns whether one existed.
	pub fn remove(&self, id: &str) -> bool {
		let Some(entry) = self.jobs.lock().remove(id) else {
			return false;
		};

		entry.cancel.cancel();

		true
	}

	/// Whether a job is registered under `id`.
	pub fn contains(&self, id: &str) -> bool {
		self.jobs.lock().get(id).is_some_and(|entry| !entry.task.is_finished())
	}

	/// Ids of all registered jobs.
	pub fn job_ids(&self) -> Vec<String> {
		self.jobs.lock().keys().cloned().collect()
	}

	/// Cancels every job.
	pub fn shutdown(&self) {
		for (_, entry) in self.jobs.lock().drain() {
			entry.cancel.cancel();
		}
	}
}

#[derive(Debug)]
struct JobEntry {
	cancel: CancellationToken,
	task: JoinHandle<()>,
}

async fn drive(id: String, spec: JobSpec, cancel: CancellationToken) {
	let running = Arc::new(AsyncMutex::new(()));
	let mut ticker = time::interval_at(Instant::now() + spec.interval, spec.interval);

	ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

	loop {
		tokio::select! {
			_ = cancel.cancelled() => break,
			_ = ticker.tick() => {},
		}

		let permit = if spec.prevent_overrun {
			match running.try_lock_arc() {
				Some(permit) => Some(permit),
				None => {
					tracing::debug!(job = %id, "Previous run still in progress; skipping tick.");

					continue;
				},
			}
		} else {
			None
		};
		let run = spec.handler.run();
		let id = id.clone();
		let on_error = spec.on_error.clone();
		let cancel = cancel.clone();

		tokio::spawn(async move {
			let _permit = permit;
			let result = tokio::select! {
				_ = cancel.cancelled() => return,
				result = run => result,
			};

			if let Err(err) = result {
				match on_error {
					Some(hook) => hook(&id, &err),
					None => tracing::error!(job = %id, error = %err, "Scheduled job failed."),
				}
			}
		});
	}

	tracing::debug!(job = %id, "Scheduled job stopped.");
}
