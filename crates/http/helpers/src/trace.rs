use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, HttpMakeClassifier, TraceLayer};
use tracing::Level;

/// Request logging: one span per request (method, path, version) and an `info` event
/// with status and latency once the response is ready.
#[must_use]
pub fn trace_layer() -> TraceLayer<HttpMakeClassifier> {
    TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(
            DefaultOnResponse::new().level(Level::INFO).latency_unit(LatencyUnit::Millis),
        )
}
