use common::client::FetchError;
use serde_json::Value;

pub trait PositionsFetcher {
    fn fetch_positions(
        &self,
        wallet: &str,
    ) -> impl std::future::Future<Output = Result<Value, FetchError>> + Send;
}

pub trait PoolsFetcher {
    fn fetch_pools(&self) -> impl std::future::Future<Output = Result<Value, FetchError>> + Send;
}
