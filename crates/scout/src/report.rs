use chrono::{DateTime, Utc};
use common::config::Config;
use common::normalizer::{normalize, DroppedRows, NormalizeReport, NormalizerSettings};
use common::opportunity::{evaluate_position, Opportunity};
use common::ranker::rank_alternatives;
use common::types::{parse_pools, AlternativeCandidate, NormalizedPosition, RawPool};
use serde::Serialize;

use crate::fetcher_traits::{PoolsFetcher, PositionsFetcher};

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub normalizer: NormalizerSettings,
    pub limit: usize,
}

impl ReportSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            normalizer: NormalizerSettings::from(&cfg.normalizer),
            limit: cfg.ranker.limit,
        }
    }
}

/// Normalized positions of one wallet. `error` is set when the positions
/// feed failed; the table is then empty.
#[derive(Debug, Serialize)]
pub struct PositionsReport {
    pub generated_at: DateTime<Utc>,
    pub wallet: String,
    pub positions: Vec<NormalizedPosition>,
    pub dropped: DroppedRows,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Positions with ranked alternatives. A failed pools feed still yields the
/// position table, with no alternatives and `pools_error` set.
#[derive(Debug, Serialize)]
pub struct WalletReport {
    pub generated_at: DateTime<Utc>,
    pub wallet: String,
    pub opportunities: Vec<Opportunity>,
    pub dropped: DroppedRows,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pools_error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AlternativesReport {
    pub generated_at: DateTime<Utc>,
    pub symbol: String,
    pub alternatives: Vec<AlternativeCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn record_normalized(report: &NormalizeReport) {
    metrics::counter!("scout_positions_normalized_total").increment(report.positions.len() as u64);
    let dropped = report.dropped;
    for (stage, count) in [
        ("unparsable_balance", dropped.unparsable_balance),
        ("below_min_balance", dropped.below_min_balance),
        ("unrepresentable", dropped.unrepresentable),
    ] {
        if count > 0 {
            metrics::counter!("scout_rows_dropped_total", "stage" => stage).increment(count as u64);
        }
    }
}

fn normalize_feed(
    raw: Result<serde_json::Value, common::client::FetchError>,
    settings: &NormalizerSettings,
) -> (NormalizeReport, Option<String>) {
    match raw {
        Ok(value) => {
            let report = normalize(&value, settings);
            record_normalized(&report);
            tracing::info!(
                positions = report.positions.len(),
                dropped = report.dropped.total(),
                "normalized positions"
            );
            (report, None)
        }
        Err(e) => (NormalizeReport::default(), Some(e.to_string())),
    }
}

pub async fn build_positions_report<F>(
    fetcher: &F,
    wallet: &str,
    settings: &ReportSettings,
) -> PositionsReport
where
    F: PositionsFetcher + Sync,
{
    let raw = fetcher.fetch_positions(wallet).await;
    let (normalized, error) = normalize_feed(raw, &settings.normalizer);
    PositionsReport {
        generated_at: Utc::now(),
        wallet: wallet.to_string(),
        positions: normalized.positions,
        dropped: normalized.dropped,
        error,
    }
}

pub async fn build_wallet_report<F>(fetcher: &F, wallet: &str, settings: &ReportSettings) -> WalletReport
where
    F: PositionsFetcher + PoolsFetcher + Sync,
{
    let (raw_positions, raw_pools) =
        tokio::join!(fetcher.fetch_positions(wallet), fetcher.fetch_pools());

    let (normalized, error) = normalize_feed(raw_positions, &settings.normalizer);
    let (pools, pools_error): (Vec<RawPool>, _) = match raw_pools {
        Ok(value) => (parse_pools(&value), None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };

    let opportunities: Vec<Opportunity> = normalized
        .positions
        .iter()
        .map(|p| evaluate_position(p, &pools, settings.limit))
        .collect();
    let ranked: usize = opportunities.iter().map(|o| o.alternatives.len()).sum();
    metrics::counter!("scout_alternatives_ranked_total").increment(ranked as u64);

    WalletReport {
        generated_at: Utc::now(),
        wallet: wallet.to_string(),
        opportunities,
        dropped: normalized.dropped,
        error,
        pools_error,
    }
}

pub async fn build_alternatives_report<F>(fetcher: &F, symbol: &str, limit: usize) -> AlternativesReport
where
    F: PoolsFetcher + Sync,
{
    let (alternatives, error) = match fetcher.fetch_pools().await {
        Ok(value) => (rank_alternatives(symbol, &parse_pools(&value), limit), None),
        Err(e) => (Vec::new(), Some(e.to_string())),
    };
    metrics::counter!("scout_alternatives_ranked_total").increment(alternatives.len() as u64);
    AlternativesReport {
        generated_at: Utc::now(),
        symbol: symbol.to_string(),
        alternatives,
        error,
    }
}

fn fmt_opt_pct(x: Option<f64>) -> String {
    x.map_or_else(|| "-".to_string(), |v| format!("{v:+.2}%"))
}

fn fmt_opt_usd(x: Option<f64>) -> String {
    x.map_or_else(|| "-".to_string(), |v| format!("{v:+.2}"))
}

fn position_line(p: &NormalizedPosition) -> String {
    format!(
        "{:<10} {:<20} {:<16} {:<16} {:>16}",
        p.chain, p.protocol, p.module, p.token_symbol, p.balance_usd
    )
}

fn dropped_line(d: &DroppedRows) -> String {
    format!(
        "dropped: {} unparsable, {} below minimum, {} unrepresentable",
        d.unparsable_balance, d.below_min_balance, d.unrepresentable
    )
}

pub fn render_positions(report: &PositionsReport) -> String {
    let mut lines = vec![format!("Positions for {}:", report.wallet)];
    if let Some(err) = &report.error {
        lines.push(format!("error: {err}"));
        return lines.join("\n");
    }
    if report.positions.is_empty() {
        lines.push("(no positions above the minimum balance)".to_string());
    }
    lines.extend(report.positions.iter().map(position_line));
    lines.push(dropped_line(&report.dropped));
    lines.join("\n")
}

pub fn render_wallet_report(report: &WalletReport) -> String {
    let mut lines = vec![format!("Yield report for {}:", report.wallet)];
    if let Some(err) = &report.error {
        lines.push(format!("error: {err}"));
        return lines.join("\n");
    }
    if let Some(err) = &report.pools_error {
        lines.push(format!("pools unavailable: {err}"));
    }
    if report.opportunities.is_empty() {
        lines.push("(no positions above the minimum balance)".to_string());
    }
    for opp in &report.opportunities {
        lines.push(position_line(&opp.position));
        lines.push(format!(
            "    current apy: {}",
            opp.current_apy
                .map_or_else(|| "unknown".to_string(), |v| format!("{v:.2}%"))
        ));
        if opp.alternatives.is_empty() {
            lines.push("    no alternatives".to_string());
        }
        for alt in &opp.alternatives {
            lines.push(format!(
                "    {:>7.2}%  {:<14} {:<24} {:<10} tvl={:.0} yearly={:.2} delta={} gain={}",
                alt.candidate.apy,
                alt.candidate.symbol,
                alt.candidate.project,
                alt.candidate.chain,
                alt.candidate.tvl_usd,
                alt.projected_annual_gain_usd,
                fmt_opt_pct(alt.apy_delta),
                fmt_opt_usd(alt.potential_gain_usd),
            ));
        }
    }
    lines.push(dropped_line(&report.dropped));
    lines.join("\n")
}

pub fn render_alternatives(report: &AlternativesReport) -> String {
    let mut lines = vec![format!("Alternatives for {}:", report.symbol)];
    if let Some(err) = &report.error {
        lines.push(format!("error: {err}"));
        return lines.join("\n");
    }
    if report.alternatives.is_empty() {
        lines.push("(no matching pools)".to_string());
    }
    lines.extend(report.alternatives.iter().enumerate().map(|(i, c)| {
        format!(
            "{:>3}  {:>7.2}%  {:<14} {:<24} {:<10} tvl={:.0}",
            i + 1,
            c.apy,
            c.symbol,
            c.project,
            c.chain,
            c.tvl_usd
        )
    }));
    lines.join("\n")
}
