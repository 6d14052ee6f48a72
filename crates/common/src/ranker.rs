use crate::types::{AlternativeCandidate, RawPool};

pub const DEFAULT_LIMIT: usize = 3;

/// Sub-symbols of a position symbol: `"SOL/USDC"` gives `["sol", "usdc"]`.
/// Blank parts are discarded so a missing symbol never matches every pool.
fn query_symbols(token_symbol: &str) -> Vec<String> {
    token_symbol
        .split('/')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn pool_matches(pool: &RawPool, needles: &[String]) -> bool {
    let symbol = pool.symbol.to_lowercase();
    needles.iter().any(|n| symbol.contains(n.as_str()))
}

/// Pools whose symbol contains any sub-symbol of `token_symbol`
/// (case-insensitive substring), best APY first, at most `limit` of them.
/// Pools with equal APY keep their input order.
pub fn rank_alternatives(
    token_symbol: &str,
    pools: &[RawPool],
    limit: usize,
) -> Vec<AlternativeCandidate> {
    let needles = query_symbols(token_symbol);
    if needles.is_empty() || limit == 0 {
        return Vec::new();
    }

    let mut selected: Vec<&RawPool> = pools.iter().filter(|p| pool_matches(p, &needles)).collect();
    selected.sort_by(|a, b| b.apy.total_cmp(&a.apy));
    selected.truncate(limit);

    tracing::trace!(token = token_symbol, matched = selected.len(), "ranked alternatives");
    selected.into_iter().map(AlternativeCandidate::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(symbol: &str, project: &str, apy: f64) -> RawPool {
        RawPool {
            symbol: symbol.to_string(),
            project: project.to_string(),
            chain: "Ethereum".to_string(),
            apy,
            tvl_usd: 0.0,
        }
    }

    fn symbols(ranked: &[AlternativeCandidate]) -> Vec<&str> {
        ranked.iter().map(|c| c.symbol.as_str()).collect()
    }

    #[test]
    fn test_pair_query_matches_either_side() {
        let pools = vec![pool("ETH-USDC", "a", 5.0), pool("USDT", "b", 10.0), pool("BTC", "c", 50.0)];
        let ranked = rank_alternatives("ETH/USDT", &pools, 3);
        assert_eq!(symbols(&ranked), vec!["USDT", "ETH-USDC"]);
        assert!((ranked[0].apy - 10.0).abs() < f64::EPSILON);
        assert!((ranked[1].apy - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_match_is_case_insensitive_substring() {
        let pools = vec![pool("usdc-usdt", "curve", 3.0), pool("sUSDe", "ethena", 9.0), pool("DAI", "maker", 8.0)];
        let ranked = rank_alternatives("USDC", &pools, 3);
        assert_eq!(symbols(&ranked), vec!["usdc-usdt"]);

        let ranked = rank_alternatives("usde", &pools, 3);
        assert_eq!(symbols(&ranked), vec!["sUSDe"]);
    }

    #[test]
    fn test_truncates_to_limit() {
        let pools: Vec<_> = (0..10).map(|i| pool("USDC", "p", f64::from(i))).collect();
        let ranked = rank_alternatives("USDC", &pools, 3);
        assert_eq!(ranked.len(), 3);
        assert!((ranked[0].apy - 9.0).abs() < f64::EPSILON);
        assert!((ranked[2].apy - 7.0).abs() < f64::EPSILON);

        assert!(rank_alternatives("USDC", &pools, 0).is_empty());
    }

    #[test]
    fn test_equal_apy_keeps_input_order() {
        let pools = vec![pool("SOL", "first", 7.0), pool("SOL", "second", 7.0), pool("SOL", "top", 9.0)];
        let ranked = rank_alternatives("SOL", &pools, 3);
        let projects: Vec<_> = ranked.iter().map(|c| c.project.as_str()).collect();
        assert_eq!(projects, vec!["top", "first", "second"]);
    }

    #[test]
    fn test_nan_apy_keeps_finite_pools_ordered() {
        let pools = vec![
            pool("SOL", "low", 2.0),
            pool("SOL", "broken", f64::NAN),
            pool("SOL", "high", 11.0),
            pool("SOL", "mid", 6.0),
        ];
        let ranked = rank_alternatives("SOL", &pools, 4);
        assert_eq!(ranked.len(), 4);
        let finite: Vec<_> = ranked
            .iter()
            .filter(|c| c.apy.is_finite())
            .map(|c| c.project.as_str())
            .collect();
        assert_eq!(finite, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_empty_pools_or_symbol() {
        assert!(rank_alternatives("ETH/USDT", &[], 3).is_empty());
        let pools = vec![pool("ETH", "a", 1.0)];
        assert!(rank_alternatives("", &pools, 3).is_empty());
        assert!(rank_alternatives(" / ", &pools, 3).is_empty());
    }
}
