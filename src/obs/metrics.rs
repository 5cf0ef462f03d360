// self
use crate::obs::{FlowKind, FlowOutcome};

#[cfg(feature = "metrics")]
pub(super) fn count(kind: FlowKind, outcome: FlowOutcome) {
	metrics::counter!(
		"session_broker_flow_total",
		"flow" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
}

#[cfg(not(feature = "metrics"))]
pub(super) fn count(_: FlowKind, _: FlowOutcome) {}
