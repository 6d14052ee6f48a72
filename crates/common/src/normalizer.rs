use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::config;
use crate::numeric::try_parse_opt;
use crate::types::{parse_protocol_entries, NormalizedPosition, RawProtocolEntry, RawToken};

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizerSettings {
    /// Rows at or below this USD value are dropped.
    pub min_balance_usd: f64,
    /// Module label whose first two supply tokens are merged into one pair row.
    pub liquidity_pool_module: String,
    pub round_digits: u32,
}

impl Default for NormalizerSettings {
    fn default() -> Self {
        Self {
            min_balance_usd: 5.0,
            liquidity_pool_module: "Liquidity Pool".to_string(),
            round_digits: 6,
        }
    }
}

impl From<&config::Normalizer> for NormalizerSettings {
    fn from(cfg: &config::Normalizer) -> Self {
        Self {
            min_balance_usd: cfg.min_balance_usd,
            liquidity_pool_module: cfg.liquidity_pool_module.clone(),
            round_digits: cfg.round_digits,
        }
    }
}

/// Why rows never made it into the table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DroppedRows {
    /// Single tokens or pool pairs whose `balanceUSD` failed coercion.
    pub unparsable_balance: usize,
    pub below_min_balance: usize,
    /// Values that could not be represented as a decimal.
    pub unrepresentable: usize,
}

impl DroppedRows {
    pub fn total(&self) -> usize {
        self.unparsable_balance + self.below_min_balance + self.unrepresentable
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub positions: Vec<NormalizedPosition>,
    pub dropped: DroppedRows,
}

#[derive(Debug)]
struct PendingRow {
    chain: String,
    protocol: String,
    module: String,
    token_symbol: String,
    balance_usd: f64,
}

/// Flatten a raw positions payload into a position table.
///
/// Never fails: a payload that is not a JSON array gives an empty table and
/// malformed fragments are skipped and counted in [`NormalizeReport::dropped`].
pub fn normalize(raw: &Value, settings: &NormalizerSettings) -> NormalizeReport {
    normalize_entries(&parse_protocol_entries(raw), settings)
}

pub fn normalize_entries(
    entries: &[RawProtocolEntry],
    settings: &NormalizerSettings,
) -> NormalizeReport {
    let mut dropped = DroppedRows::default();
    let mut pending = Vec::new();

    for entry in entries {
        let chain = entry.chain.clone().unwrap_or_default();
        let protocol = entry.common_name.clone().unwrap_or_default();

        for module in entry.portfolio.iter().flatten() {
            let label = module.module.clone().unwrap_or_default();
            let Some(supply) = module.detailed.as_ref().and_then(|d| d.supply.as_ref()) else {
                continue;
            };

            if label == settings.liquidity_pool_module && supply.len() >= 2 {
                match merge_pool_pair(&supply[0], &supply[1]) {
                    Some((token_symbol, balance_usd)) => pending.push(PendingRow {
                        chain: chain.clone(),
                        protocol: protocol.clone(),
                        module: label.clone(),
                        token_symbol,
                        balance_usd,
                    }),
                    None => {
                        tracing::debug!(%chain, %protocol, "dropping pool pair with unparsable balance");
                        dropped.unparsable_balance += 1;
                    }
                }
                continue;
            }

            for token in supply {
                let symbol = token_symbol(token);
                match try_parse_opt(token.balance_usd.as_ref()) {
                    Ok(balance_usd) => pending.push(PendingRow {
                        chain: chain.clone(),
                        protocol: protocol.clone(),
                        module: label.clone(),
                        token_symbol: symbol,
                        balance_usd,
                    }),
                    Err(e) => {
                        tracing::debug!(%chain, %protocol, token = %symbol, error = %e, "dropping token with unparsable balance");
                        dropped.unparsable_balance += 1;
                    }
                }
            }
        }
    }

    let positions = finish_rows(pending, settings, &mut dropped);
    NormalizeReport { positions, dropped }
}

/// Both sides must parse; a half-parsed pair is never emitted.
fn merge_pool_pair(first: &RawToken, second: &RawToken) -> Option<(String, f64)> {
    let a = try_parse_opt(first.balance_usd.as_ref()).ok()?;
    let b = try_parse_opt(second.balance_usd.as_ref()).ok()?;
    let symbol = format!("{}/{}", token_symbol(first), token_symbol(second));
    Some((symbol, a + b))
}

fn token_symbol(token: &RawToken) -> String {
    token.token_symbol.clone().unwrap_or_default()
}

fn finish_rows(
    pending: Vec<PendingRow>,
    settings: &NormalizerSettings,
    dropped: &mut DroppedRows,
) -> Vec<NormalizedPosition> {
    let min_balance = Decimal::from_f64(settings.min_balance_usd).unwrap_or(Decimal::MAX);
    let mut out = Vec::with_capacity(pending.len());
    for row in pending {
        if row.balance_usd <= settings.min_balance_usd {
            dropped.below_min_balance += 1;
            continue;
        }
        let Some(balance_usd) = Decimal::from_f64(row.balance_usd) else {
            dropped.unrepresentable += 1;
            continue;
        };
        // The minimum applies to the value as emitted.
        let balance_usd = balance_usd.round_dp(settings.round_digits);
        if balance_usd <= min_balance {
            dropped.below_min_balance += 1;
            continue;
        }
        out.push(NormalizedPosition {
            chain: row.chain,
            protocol: row.protocol,
            module: row.module,
            token_symbol: row.token_symbol,
            balance_usd,
        });
    }
    out
}
