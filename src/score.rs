//! Fuzzy relevance scoring between a query and a candidate address.
//!
//! This is an additive point system, not a metric-space distance. It was
//! chosen for explainability and O(tokens) cost: every bonus corresponds to
//! a property a dispatcher can name ("starts with what I typed", "is the
//! default pickup"). Treat the weights as tunable; they carry no empirical
//! claim beyond the ordering properties the tests pin down.

use crate::model::AddressRecord;
use crate::normalize::NormalizedKey;

/// Whether the query targets a pickup or a drop field; gates the
/// default-location bonus.
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext {
    pub is_pickup: bool,
}

/// Scoring weights, grouped so tuning is one edit.
const EXACT_MATCH: f64 = 100.0;
const PREFIX_MATCH: f64 = 50.0;
const SUBSTRING_MATCH: f64 = 30.0;
const TOKEN_PREFIX: f64 = 20.0;
const TOKEN_SUBSTRING: f64 = 10.0;
const DEFAULT_LOCATION_BONUS: f64 = 25.0;
const NAMED_LOCATION_BONUS: f64 = 15.0;
const LENGTH_PENALTY_PER_CHAR: f64 = 0.5;

/// Scores a candidate against a (search-normalized) query. Always >= 0;
/// a zero score means "no signal at all" and callers drop the candidate.
pub fn score(
    query: &NormalizedKey,
    candidate: &NormalizedKey,
    record: &AddressRecord,
    context: ScoreContext,
) -> f64 {
    if query.is_empty() || candidate.is_empty() {
        return 0.0;
    }

    let q = query.as_str();
    let c = candidate.as_str();
    let mut total = 0.0;

    if c == q {
        total += EXACT_MATCH;
    }
    if c.starts_with(q) {
        total += PREFIX_MATCH;
    }
    if c.contains(q) {
        total += SUBSTRING_MATCH;
    }

    // Both token bonuses may fire per pair; a starts-with hit is also a
    // contains hit.
    for query_token in query.tokens() {
        for candidate_token in candidate.tokens() {
            if candidate_token.starts_with(query_token) {
                total += TOKEN_PREFIX;
            }
            if candidate_token.contains(query_token) {
                total += TOKEN_SUBSTRING;
            }
        }
    }

    let default_for_context = if context.is_pickup {
        record.is_default_pickup
    } else {
        record.is_default_drop
    };
    if default_for_context {
        total += DEFAULT_LOCATION_BONUS;
    }

    if record
        .location_name
        .as_deref()
        .map(|name| !name.trim().is_empty())
        .unwrap_or(false)
    {
        total += NAMED_LOCATION_BONUS;
    }

    let len_diff = (c.len() as f64 - q.len() as f64).abs();
    total -= LENGTH_PENALTY_PER_CHAR * len_diff;

    total.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record;
    use crate::normalize::search_normalize;

    const PICKUP: ScoreContext = ScoreContext { is_pickup: true };
    const DROP: ScoreContext = ScoreContext { is_pickup: false };

    #[test]
    fn test_exact_match_outranks_everything_else() {
        let rec = record(1, "Acme", None, "123 Main St", "Chicago", "IL");
        let q = search_normalize("123 main st chicago il");
        let exact = score(&q, &q, &rec, PICKUP);
        let near = score(&q, &search_normalize("123 main st chicago illinois"), &rec, PICKUP);
        assert!(exact > near);
    }

    #[test]
    fn test_score_never_negative() {
        let rec = record(1, "Acme", None, "1 A", "B", "C");
        let q = search_normalize("zzz");
        let long = search_normalize(
            "completely unrelated candidate text that is very much longer than the query",
        );
        assert_eq!(score(&q, &long, &rec, PICKUP), 0.0);
    }

    #[test]
    fn test_empty_query_scores_zero() {
        let rec = record(1, "Acme", None, "123 Main St", "Chicago", "IL");
        let c = search_normalize("123 main st chicago il");
        assert_eq!(score(&search_normalize(""), &c, &rec, PICKUP), 0.0);
    }

    #[test]
    fn test_prefix_beats_substring() {
        let rec = record(1, "Acme", None, "x", "y", "z");
        let q = search_normalize("123 main");
        let prefix = score(&q, &search_normalize("123 main st chicago il"), &rec, PICKUP);
        let inner = score(&q, &search_normalize("dock b 123 main st chicago"), &rec, PICKUP);
        assert!(prefix > inner);
    }

    #[test]
    fn test_default_pickup_bonus_is_context_gated() {
        let mut rec = record(1, "Acme", None, "123 Main St", "Chicago", "IL");
        rec.is_default_pickup = true;
        let q = search_normalize("123 main");
        let c = search_normalize("123 main st chicago il");
        let as_pickup = score(&q, &c, &rec, PICKUP);
        let as_drop = score(&q, &c, &rec, DROP);
        assert_eq!(as_pickup - as_drop, 25.0);
    }

    #[test]
    fn test_named_location_bonus() {
        let plain = record(1, "Acme", None, "123 Main St", "Chicago", "IL");
        let named = record(2, "Acme", Some("Yard"), "123 Main St", "Chicago", "IL");
        let q = search_normalize("123 main");
        let c = search_normalize("123 main st chicago il");
        let delta = score(&q, &c, &named, PICKUP) - score(&q, &c, &plain, PICKUP);
        assert_eq!(delta, 15.0);
    }

    #[test]
    fn test_token_bonuses_stack() {
        let rec = record(1, "Acme", None, "x", "y", "z");
        let q = search_normalize("main");
        // "main" starts "main": +20, contains: +10; prefix of whole: no;
        // substring of whole: +30; length penalty applies.
        let c = search_normalize("smain main");
        let s = score(&q, &c, &rec, PICKUP);
        // pairs: "smain" contains (+10), "main" starts-with (+20) + contains (+10)
        // whole contains (+30); penalty 0.5 * (10 - 4) = 3.0
        assert_eq!(s, 10.0 + 20.0 + 10.0 + 30.0 - 3.0);
    }

    #[test]
    fn test_length_penalty_prefers_closer_candidate() {
        let rec = record(1, "Acme", None, "x", "y", "z");
        let q = search_normalize("123 main");
        let close = score(&q, &search_normalize("123 main st"), &rec, PICKUP);
        let far = score(
            &q,
            &search_normalize("123 main st extremely long industrial park drive south"),
            &rec,
            PICKUP,
        );
        assert!(close > far);
    }
}
