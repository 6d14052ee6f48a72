use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::numeric::try_parse_number;

/// One protocol's holdings for a wallet, from the positions API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProtocolEntry {
    #[serde(default, deserialize_with = "de_opt_string_lenient")]
    pub chain: Option<String>,
    #[serde(
        rename = "commonName",
        default,
        deserialize_with = "de_opt_string_lenient"
    )]
    pub common_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_seq_lenient")]
    pub portfolio: Option<Vec<RawPortfolioModule>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPortfolioModule {
    #[serde(default, deserialize_with = "de_opt_string_lenient")]
    pub module: Option<String>,
    #[serde(default, deserialize_with = "de_opt_object_lenient")]
    pub detailed: Option<RawDetailed>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDetailed {
    #[serde(default, deserialize_with = "de_opt_seq_lenient")]
    pub supply: Option<Vec<RawToken>>,
}

/// Numeric fields stay as raw JSON; callers coerce them with
/// [`try_parse_number`] and decide their own skip policy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawToken {
    #[serde(
        rename = "tokenSymbol",
        default,
        deserialize_with = "de_opt_string_lenient"
    )]
    pub token_symbol: Option<String>,
    #[serde(default)]
    pub balance: Option<Value>,
    #[serde(rename = "balanceUSD", default)]
    pub balance_usd: Option<Value>,
}

/// Pool from the yield aggregator `/pools` feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPool {
    #[serde(default, deserialize_with = "de_string_or_empty")]
    pub symbol: String,
    #[serde(default, deserialize_with = "de_string_or_empty")]
    pub project: String,
    #[serde(default, deserialize_with = "de_string_or_empty")]
    pub chain: String,
    #[serde(default, deserialize_with = "de_number_or_zero")]
    pub apy: f64,
    #[serde(rename = "tvlUsd", default, deserialize_with = "de_number_or_zero")]
    pub tvl_usd: f64,
}

/// Flat output row of the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPosition {
    pub chain: String,
    pub protocol: String,
    pub module: String,
    pub token_symbol: String,
    pub balance_usd: Decimal,
}

impl NormalizedPosition {
    pub fn balance_usd_f64(&self) -> f64 {
        self.balance_usd.to_f64().unwrap_or(0.0)
    }
}

/// A pool offered as an alternative for one position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeCandidate {
    pub symbol: String,
    pub project: String,
    pub chain: String,
    pub apy: f64,
    pub tvl_usd: f64,
}

impl From<&RawPool> for AlternativeCandidate {
    fn from(pool: &RawPool) -> Self {
        Self {
            symbol: pool.symbol.clone(),
            project: pool.project.clone(),
            chain: pool.chain.clone(),
            apy: pool.apy,
            tvl_usd: pool.tvl_usd,
        }
    }
}

/// Decode a positions payload. Anything but a JSON array yields no entries;
/// array elements that are not objects are skipped.
pub fn parse_protocol_entries(raw: &Value) -> Vec<RawProtocolEntry> {
    match raw {
        Value::Array(items) => decode_items(items.iter().cloned()),
        _ => Vec::new(),
    }
}

/// Decode a yield aggregator payload: either `{"data": [...]}` or a bare array.
pub fn parse_pools(raw: &Value) -> Vec<RawPool> {
    let items = match raw {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    decode_items(items.iter().cloned())
}

fn decode_items<T, I>(items: I) -> Vec<T>
where
    T: DeserializeOwned,
    I: IntoIterator<Item = Value>,
{
    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

fn lenient_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn de_opt_string_lenient<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(Value::deserialize(deserializer)?))
}

fn de_string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn de_number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(try_parse_number(&Value::deserialize(deserializer)?).unwrap_or(0.0))
}

fn de_opt_seq_lenient<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(decode_items(items)),
        _ => None,
    })
}

fn de_opt_object_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        v @ Value::Object(_) => serde_json::from_value(v).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_protocol_entry_tolerates_wrong_types() {
        let raw = json!([
            {"chain": 42, "commonName": null, "portfolio": "nope"},
            "not an object",
            {"chain": "Solana", "portfolio": [{"module": "Staked", "detailed": 5}, 7]}
        ]);
        let entries = parse_protocol_entries(&raw);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].chain.as_deref(), Some("42"));
        assert!(entries[0].common_name.is_none());
        assert!(entries[0].portfolio.is_none());

        let modules = entries[1].portfolio.as_ref().unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].module.as_deref(), Some("Staked"));
        assert!(modules[0].detailed.is_none());
    }

    #[test]
    fn test_parse_protocol_entries_non_array() {
        assert!(parse_protocol_entries(&json!({"error": "boom"})).is_empty());
        assert!(parse_protocol_entries(&json!("x")).is_empty());
        assert!(parse_protocol_entries(&Value::Null).is_empty());
    }

    #[test]
    fn test_token_keeps_raw_numeric_fields() {
        let token: RawToken =
            serde_json::from_value(json!({"tokenSymbol": "SOL", "balance": 2, "balanceUSD": "300.5"}))
                .unwrap();
        assert_eq!(token.token_symbol.as_deref(), Some("SOL"));
        assert_eq!(token.balance, Some(json!(2)));
        assert_eq!(token.balance_usd, Some(json!("300.5")));
    }

    #[test]
    fn test_parse_pools_defaults_missing_numbers() {
        let raw = json!({"status": "success", "data": [
            {"symbol": "USDC", "project": "aave-v3", "chain": "Ethereum", "apy": 4.2, "tvlUsd": 1000000},
            {"symbol": "ETH", "project": "lido", "chain": "Ethereum", "apy": null},
            {"symbol": "BTC", "apy": "oops", "tvlUsd": "12"}
        ]});
        let pools = parse_pools(&raw);
        assert_eq!(pools.len(), 3);
        assert!((pools[0].apy - 4.2).abs() < f64::EPSILON);
        assert!((pools[0].tvl_usd - 1_000_000.0).abs() < f64::EPSILON);
        assert!(pools[1].apy.abs() < f64::EPSILON);
        assert!(pools[1].tvl_usd.abs() < f64::EPSILON);
        assert!(pools[2].apy.abs() < f64::EPSILON);
        assert!((pools[2].tvl_usd - 12.0).abs() < f64::EPSILON);
        assert_eq!(pools[2].project, "");
    }

    #[test]
    fn test_parse_pools_accepts_bare_array_and_rejects_other_shapes() {
        assert_eq!(parse_pools(&json!([{"symbol": "DAI"}])).len(), 1);
        assert!(parse_pools(&json!({"error": "down"})).is_empty());
        assert!(parse_pools(&json!({"data": "nope"})).is_empty());
        assert!(parse_pools(&json!(3)).is_empty());
    }

    #[test]
    fn test_parse_fixture_pools() {
        let json = include_str!("../tests/fixtures/pools_sample.json");
        let value: Value = serde_json::from_str(json).unwrap();
        let pools = parse_pools(&value);
        assert!(!pools.is_empty());
    }
}
