// crates.io
use tracing::{Instrument, Span, field, instrument::Instrumented, span::EnteredSpan};
// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome, metrics},
};

/// Span around one session flow.
///
/// Starting the span counts an attempt; [`FlowSpan::finish`] records the outcome on the span and
/// in the flow counter.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	kind: FlowKind,
	span: Span,
}
impl FlowSpan {
	/// Opens a span for `kind` at `stage` and counts the attempt.
	pub fn start(kind: FlowKind, stage: &'static str) -> Self {
		let span = tracing::info_span!(
			"session_broker.flow",
			flow = kind.as_str(),
			stage,
			outcome = field::Empty
		);

		metrics::count(kind, FlowOutcome::Attempt);

		Self { kind, span }
	}

	/// Records how the flow ended.
	pub fn finish(&self, outcome: FlowOutcome) {
		self.span.record("outcome", outcome.as_str());
		metrics::count(self.kind, outcome);
	}

	/// Enters the span for the rest of a synchronous section.
	pub fn enter(&self) -> FlowSpanGuard {
		FlowSpanGuard(self.span.clone().entered())
	}

	/// Runs `fut` inside the span.
	pub fn in_span<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

/// Keeps a [`FlowSpan`] entered until dropped.
pub struct FlowSpanGuard(EnteredSpan);
impl Debug for FlowSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("FlowSpanGuard").finish_non_exhaustive()
	}
}
