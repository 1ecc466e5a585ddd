use opentelemetry::propagation::text_map_propagator::FieldIter;
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::trace::{SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState};
use opentelemetry::Context;

const B3_SINGLE_HEADER: &str = "b3";
const B3_TRACE_ID_HEADER: &str = "x-b3-traceid";
const B3_SPAN_ID_HEADER: &str = "x-b3-spanid";
const B3_SAMPLED_HEADER: &str = "x-b3-sampled";
const B3_FLAGS_HEADER: &str = "x-b3-flags";

/// Header layout used by a [`B3Propagator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum B3Encoding {
    /// Everything in one `b3` header: `{trace_id}-{span_id}-{sampled}`.
    SingleHeader,
    /// Zipkin-style `x-b3-*` headers, one value each.
    MultipleHeader,
}

/// B3 context propagator.
///
/// Injects only valid span contexts; extraction that encounters missing or
/// malformed headers leaves the incoming context untouched rather than
/// failing.
#[derive(Debug, Clone)]
pub struct B3Propagator {
    encoding: B3Encoding,
    fields: Vec<String>,
}

impl B3Propagator {
    pub fn new(encoding: B3Encoding) -> Self {
        let fields = match encoding {
            B3Encoding::SingleHeader => vec![B3_SINGLE_HEADER.to_string()],
            B3Encoding::MultipleHeader => vec![
                B3_TRACE_ID_HEADER.to_string(),
                B3_SPAN_ID_HEADER.to_string(),
                B3_SAMPLED_HEADER.to_string(),
            ],
        };
        Self { encoding, fields }
    }

    fn extract_span_context(&self, extractor: &dyn Extractor) -> Option<SpanContext> {
        match self.encoding {
            B3Encoding::SingleHeader => {
                let header = extractor.get(B3_SINGLE_HEADER)?;
                let mut segments = header.split('-');
                let trace_id = parse_trace_id(segments.next()?)?;
                let span_id = parse_span_id(segments.next()?)?;
                let flags = parse_sampled(segments.next());
                Some(SpanContext::new(
                    trace_id,
                    span_id,
                    flags,
                    true,
                    TraceState::default(),
                ))
            }
            B3Encoding::MultipleHeader => {
                let trace_id = parse_trace_id(extractor.get(B3_TRACE_ID_HEADER)?)?;
                let span_id = parse_span_id(extractor.get(B3_SPAN_ID_HEADER)?)?;
                let flags = if extractor.get(B3_FLAGS_HEADER) == Some("1") {
                    TraceFlags::SAMPLED
                } else {
                    parse_sampled(extractor.get(B3_SAMPLED_HEADER))
                };
                Some(SpanContext::new(
                    trace_id,
                    span_id,
                    flags,
                    true,
                    TraceState::default(),
                ))
            }
        }
    }
}

fn parse_trace_id(hex: &str) -> Option<TraceId> {
    // B3 allows 64-bit trace ids; left-pad them to the 128-bit form.
    match hex.len() {
        32 => TraceId::from_hex(hex).ok(),
        16 => TraceId::from_hex(&format!("0000000000000000{hex}")).ok(),
        _ => None,
    }
}

fn parse_span_id(hex: &str) -> Option<SpanId> {
    if hex.len() == 16 {
        SpanId::from_hex(hex).ok()
    } else {
        None
    }
}

fn parse_sampled(token: Option<&str>) -> TraceFlags {
    match token {
        Some("1") | Some("d") | Some("true") => TraceFlags::SAMPLED,
        _ => TraceFlags::default(),
    }
}

fn trace_id_hex(span_context: &SpanContext) -> String {
    format!("{:032x}", u128::from_be_bytes(span_context.trace_id().to_bytes()))
}

fn span_id_hex(span_context: &SpanContext) -> String {
    format!("{:016x}", u64::from_be_bytes(span_context.span_id().to_bytes()))
}

impl TextMapPropagator for B3Propagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        let span = cx.span();
        let span_context = span.span_context();
        if !span_context.is_valid() {
            return;
        }

        let sampled = if span_context.is_sampled() { "1" } else { "0" };
        match self.encoding {
            B3Encoding::SingleHeader => {
                injector.set(
                    B3_SINGLE_HEADER,
                    format!(
                        "{}-{}-{}",
                        trace_id_hex(span_context),
                        span_id_hex(span_context),
                        sampled
                    ),
                );
            }
            B3Encoding::MultipleHeader => {
                injector.set(B3_TRACE_ID_HEADER, trace_id_hex(span_context));
                injector.set(B3_SPAN_ID_HEADER, span_id_hex(span_context));
                injector.set(B3_SAMPLED_HEADER, sampled.to_string());
            }
        }
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        match self.extract_span_context(extractor) {
            Some(span_context) if span_context.is_valid() => {
                cx.with_remote_span_context(span_context)
            }
            _ => cx.clone(),
        }
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(&self.fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn remote_context(sampled: bool) -> Context {
        let flags = if sampled {
            TraceFlags::SAMPLED
        } else {
            TraceFlags::default()
        };
        Context::new().with_remote_span_context(SpanContext::new(
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(),
            SpanId::from_hex("00f067aa0ba902b7").unwrap(),
            flags,
            true,
            TraceState::default(),
        ))
    }

    #[test]
    fn single_header_injects_combined_value() {
        let propagator = B3Propagator::new(B3Encoding::SingleHeader);
        let mut carrier = HashMap::new();

        propagator.inject_context(&remote_context(true), &mut carrier);

        assert_eq!(
            carrier.get("b3").map(String::as_str),
            Some("4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-1")
        );
    }

    #[test]
    fn multi_header_injects_separate_values() {
        let propagator = B3Propagator::new(B3Encoding::MultipleHeader);
        let mut carrier = HashMap::new();

        propagator.inject_context(&remote_context(false), &mut carrier);

        assert_eq!(
            carrier.get("x-b3-traceid").map(String::as_str),
            Some("4bf92f3577b34da6a3ce929d0e0e4736")
        );
        assert_eq!(
            carrier.get("x-b3-spanid").map(String::as_str),
            Some("00f067aa0ba902b7")
        );
        assert_eq!(carrier.get("x-b3-sampled").map(String::as_str), Some("0"));
    }

    #[test]
    fn invalid_context_is_not_injected() {
        let propagator = B3Propagator::new(B3Encoding::SingleHeader);
        let mut carrier = HashMap::new();

        propagator.inject_context(&Context::new(), &mut carrier);

        assert!(carrier.is_empty());
    }

    #[test]
    fn single_header_round_trips() {
        let propagator = B3Propagator::new(B3Encoding::SingleHeader);
        let mut carrier = HashMap::new();
        propagator.inject_context(&remote_context(true), &mut carrier);

        let extracted = propagator.extract(&carrier);
        let binding = extracted.span();
        let span_context = binding.span_context();

        assert!(span_context.is_valid());
        assert!(span_context.is_remote());
        assert!(span_context.is_sampled());
        assert_eq!(
            span_context.trace_id(),
            TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap()
        );
    }

    #[test]
    fn multi_header_round_trips() {
        let propagator = B3Propagator::new(B3Encoding::MultipleHeader);
        let mut carrier = HashMap::new();
        propagator.inject_context(&remote_context(true), &mut carrier);

        let extracted = propagator.extract(&carrier);
        let binding = extracted.span();
        let span_context = binding.span_context();

        assert!(span_context.is_valid());
        assert!(span_context.is_sampled());
    }

    #[test]
    fn short_trace_id_is_left_padded() {
        let mut carrier = HashMap::new();
        carrier.insert(
            "b3".to_string(),
            "a3ce929d0e0e4736-00f067aa0ba902b7-1".to_string(),
        );

        let extracted = B3Propagator::new(B3Encoding::SingleHeader).extract(&carrier);
        let binding = extracted.span();
        let span_context = binding.span_context();

        assert_eq!(
            span_context.trace_id(),
            TraceId::from_hex("0000000000000000a3ce929d0e0e4736").unwrap()
        );
    }

    #[test]
    fn malformed_header_leaves_context_untouched() {
        let mut carrier = HashMap::new();
        carrier.insert("b3".to_string(), "not-a-context".to_string());

        let extracted = B3Propagator::new(B3Encoding::SingleHeader).extract(&carrier);
        let binding = extracted.span();

        assert!(!binding.span_context().is_valid());
    }

    #[test]
    fn missing_sampled_segment_defaults_to_unsampled() {
        let mut carrier = HashMap::new();
        carrier.insert(
            "b3".to_string(),
            "4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7".to_string(),
        );

        let extracted = B3Propagator::new(B3Encoding::SingleHeader).extract(&carrier);
        let binding = extracted.span();
        let span_context = binding.span_context();

        assert!(span_context.is_valid());
        assert!(!span_context.is_sampled());
    }

    #[test]
    fn debug_flag_header_implies_sampled() {
        let mut carrier = HashMap::new();
        carrier.insert(
            "x-b3-traceid".to_string(),
            "4bf92f3577b34da6a3ce929d0e0e4736".to_string(),
        );
        carrier.insert("x-b3-spanid".to_string(), "00f067aa0ba902b7".to_string());
        carrier.insert("x-b3-flags".to_string(), "1".to_string());

        let extracted = B3Propagator::new(B3Encoding::MultipleHeader).extract(&carrier);
        let binding = extracted.span();

        assert!(binding.span_context().is_sampled());
    }
}
