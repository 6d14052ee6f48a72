use serde::Serialize;

use crate::ranker::rank_alternatives;
use crate::types::{AlternativeCandidate, NormalizedPosition, RawPool};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredAlternative {
    #[serde(flatten)]
    pub candidate: AlternativeCandidate,
    /// Yearly yield on the position's balance at this pool's APY.
    pub projected_annual_gain_usd: f64,
    pub apy_delta: Option<f64>,
    /// Extra yearly yield versus the position's current pool.
    pub potential_gain_usd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub position: NormalizedPosition,
    pub current_apy: Option<f64>,
    pub alternatives: Vec<ScoredAlternative>,
}

fn slug(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Aggregator project ids look like `raydium-amm` for a protocol named
/// `Raydium`.
fn project_matches(protocol: &str, project: &str) -> bool {
    let protocol = slug(protocol);
    if protocol.is_empty() {
        return false;
    }
    let project = project.to_lowercase();
    project == protocol
        || project
            .strip_prefix(protocol.as_str())
            .is_some_and(|rest| rest.starts_with('-'))
}

/// APY of the pool the position most likely sits in, if the feed lists it.
pub fn current_apy(position: &NormalizedPosition, pools: &[RawPool]) -> Option<f64> {
    let symbol = position.token_symbol.replace('/', "-").to_lowercase();
    pools
        .iter()
        .find(|p| {
            p.symbol.to_lowercase() == symbol
                && p.chain.eq_ignore_ascii_case(&position.chain)
                && project_matches(&position.protocol, &p.project)
        })
        .map(|p| p.apy)
}

pub fn score_alternative(
    balance_usd: f64,
    current_apy: Option<f64>,
    candidate: AlternativeCandidate,
) -> ScoredAlternative {
    let apy_delta = current_apy.map(|cur| candidate.apy - cur);
    ScoredAlternative {
        projected_annual_gain_usd: balance_usd * candidate.apy / 100.0,
        apy_delta,
        potential_gain_usd: apy_delta.map(|d| balance_usd * d / 100.0),
        candidate,
    }
}

/// Rank alternatives for one position and attach gain estimates.
pub fn evaluate_position(
    position: &NormalizedPosition,
    pools: &[RawPool],
    limit: usize,
) -> Opportunity {
    let balance = position.balance_usd_f64();
    let current = current_apy(position, pools);
    let alternatives = rank_alternatives(&position.token_symbol, pools, limit)
        .into_iter()
        .map(|c| score_alternative(balance, current, c))
        .collect();
    Opportunity {
        position: position.clone(),
        current_apy: current,
        alternatives,
    }
}
