use anyhow::Result;
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;

pub fn describe() {
    describe_counter!(
        "scout_api_requests_total",
        "Number of feed requests made."
    );
    describe_histogram!(
        "scout_api_latency_ms",
        "Feed request latency in milliseconds."
    );
    describe_counter!(
        "scout_api_errors_total",
        "Number of failed feed requests by error kind."
    );
    describe_counter!(
        "scout_positions_normalized_total",
        "Number of position rows emitted by the normalizer."
    );
    describe_counter!(
        "scout_rows_dropped_total",
        "Number of position rows dropped by the normalizer, by stage."
    );
    describe_counter!(
        "scout_alternatives_ranked_total",
        "Number of alternative pools returned by the ranker."
    );
    describe_counter!(
        common::observability::ERROR_EVENTS_METRIC,
        "Number of ERROR-level log events."
    );
}

pub fn install_prometheus(port: u16) -> Result<PrometheusHandle> {
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    Ok(PrometheusBuilder::new()
        .with_http_listener(addr)
        .install_recorder()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prometheus_handle_renders_metric_names() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe();
            metrics::counter!("scout_positions_normalized_total").increment(2);
        });

        let rendered = handle.render();
        assert!(rendered.contains("scout_positions_normalized_total"));
        assert!(rendered.contains("# HELP scout_positions_normalized_total"));
    }

    #[test]
    fn test_error_events_metric_is_described() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe();
            metrics::counter!(common::observability::ERROR_EVENTS_METRIC).increment(1);
        });

        let rendered = handle.render();
        assert!(rendered.contains("# HELP scout_error_log_events_total Number of ERROR-level log events."));
    }
}
