use opentelemetry::global;
use opentelemetry::propagation::{TextMapCompositePropagator, TextMapPropagator};
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};

use crate::b3::{B3Encoding, B3Propagator};
use crate::config::{Propagator, PropagatorSet};

/// Instantiate the enabled propagators in their fixed application order:
/// trace-context, B3 single-header, B3 multi-header, baggage.
pub fn build_propagators(set: PropagatorSet) -> Vec<Box<dyn TextMapPropagator + Send + Sync>> {
    let mut propagators: Vec<Box<dyn TextMapPropagator + Send + Sync>> = Vec::new();

    for propagator in set.iter() {
        match propagator {
            Propagator::TraceContext => propagators.push(Box::new(TraceContextPropagator::new())),
            Propagator::B3 => propagators.push(Box::new(B3Propagator::new(B3Encoding::SingleHeader))),
            Propagator::B3Multi => {
                propagators.push(Box::new(B3Propagator::new(B3Encoding::MultipleHeader)))
            }
            Propagator::Baggage => propagators.push(Box::new(BaggagePropagator::new())),
        }
    }

    propagators
}

/// Compose the enabled propagators into one text-map propagator.
///
/// On injection every member writes its headers in the fixed order above; on
/// extraction every member runs in the same order over the carrier. Enabled
/// members cover disjoint header sets in practice, so they coexist without
/// conflict.
pub fn build_composite(set: PropagatorSet) -> TextMapCompositePropagator {
    TextMapCompositePropagator::new(build_propagators(set))
}

/// Replace the process-wide propagator with a composite built from `set`.
///
/// The previous global propagator has no further effect, though callers that
/// already captured a reference keep using it. Replacement is an atomic
/// pointer swap with no further synchronization; call this during startup
/// only, not concurrently with extraction or injection.
pub fn install(set: PropagatorSet) {
    global::set_text_map_propagator(build_composite(set));
}
