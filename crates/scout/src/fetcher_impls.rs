use common::client::{FeedClient, FetchError, POOLS_ENDPOINT, POSITIONS_ENDPOINT};
use serde_json::Value;
use std::time::Instant;

use crate::fetcher_traits::{PoolsFetcher, PositionsFetcher};

fn record_request(endpoint: &'static str, started: Instant, res: &Result<Value, FetchError>) {
    let ms = started.elapsed().as_secs_f64() * 1000.0;
    metrics::histogram!("scout_api_latency_ms", "endpoint" => endpoint).record(ms);
    match res {
        Ok(_) => {
            metrics::counter!("scout_api_requests_total", "endpoint" => endpoint, "status" => "ok")
                .increment(1);
        }
        Err(e) => {
            metrics::counter!("scout_api_requests_total", "endpoint" => endpoint, "status" => "error")
                .increment(1);
            metrics::counter!("scout_api_errors_total", "endpoint" => endpoint, "kind" => e.kind())
                .increment(1);
            tracing::error!(endpoint, error = %e, "feed request failed");
        }
    }
}

impl PositionsFetcher for FeedClient {
    async fn fetch_positions(&self, wallet: &str) -> Result<Value, FetchError> {
        let started = Instant::now();
        let res = FeedClient::fetch_positions(self, wallet).await;
        record_request(POSITIONS_ENDPOINT, started, &res);
        res
    }
}

impl PoolsFetcher for FeedClient {
    async fn fetch_pools(&self) -> Result<Value, FetchError> {
        let started = Instant::now();
        let res = FeedClient::fetch_pools(self).await;
        record_request(POOLS_ENDPOINT, started, &res);
        res
    }
}
