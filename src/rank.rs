//! Candidate ranking with deterministic tie-breaks.

use crate::model::{AddressRecord, ScoredSuggestion};
use crate::normalize::{record_search_key, search_normalize, NormalizedKey};
use crate::score::{score, ScoreContext};

/// Scores and orders candidates for one query.
///
/// Order: score descending; ties broken by default-for-context first, then
/// shorter normalized text, then lexical key order. The chain is total, so
/// repeated calls on identical input produce identical output. Zero-score
/// candidates are excluded entirely; an empty return means "hide
/// suggestions". The result is capped at `max_suggestions`.
pub fn rank(
    candidates: Vec<AddressRecord>,
    query: &str,
    context: ScoreContext,
    max_suggestions: usize,
) -> Vec<ScoredSuggestion> {
    let query_key = search_normalize(query);

    let mut scored: Vec<(NormalizedKey, ScoredSuggestion)> = candidates
        .into_iter()
        .filter_map(|record| {
            let key = record_search_key(&record);
            let s = score(&query_key, &key, &record, context);
            if s > 0.0 {
                Some((key, ScoredSuggestion { record, score: s }))
            } else {
                None
            }
        })
        .collect();

    scored.sort_by(|(a_key, a), (b_key, b)| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| {
                let a_default = default_for_context(&a.record, context);
                let b_default = default_for_context(&b.record, context);
                b_default.cmp(&a_default)
            })
            .then_with(|| a_key.len().cmp(&b_key.len()))
            .then_with(|| a_key.cmp(b_key))
    });

    scored.truncate(max_suggestions);
    scored.into_iter().map(|(_, suggestion)| suggestion).collect()
}

fn default_for_context(record: &AddressRecord, context: ScoreContext) -> bool {
    if context.is_pickup {
        record.is_default_pickup
    } else {
        record.is_default_drop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record;

    fn context() -> ScoreContext {
        ScoreContext { is_pickup: true }
    }

    #[test]
    fn test_default_pickup_ranks_first_for_123_main() {
        let mut first = record(1, "Acme", None, "123 Main St", "Chicago", "IL");
        first.is_default_pickup = true;
        let second = record(2, "Acme", None, "456 Main St", "Chicago", "IL");

        let ranked = rank(vec![second.clone(), first.clone()], "123 main", context(), 8);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].record.id, 1);
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_zero_score_candidates_excluded() {
        let unrelated = record(1, "Acme", None, "99 Nowhere Ln", "Tulsa", "OK");
        let ranked = rank(vec![unrelated], "zzzz", context(), 8);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_is_deterministic() {
        let candidates = vec![
            record(1, "Acme", None, "123 Main St", "Chicago", "IL"),
            record(2, "Acme", Some("Yard"), "123 Main St", "Chicago", "IL"),
            record(3, "Acme", None, "123 Main Ave", "Chicago", "IL"),
            record(4, "Acme", None, "12 Main St", "Peoria", "IL"),
        ];
        let a = rank(candidates.clone(), "123 main", context(), 8);
        let b = rank(candidates, "123 main", context(), 8);
        assert_eq!(a, b);
    }

    #[test]
    fn test_tie_break_is_lexical_when_scores_tie() {
        // Same token hits, same length, so raw scores tie; lexical order of
        // the normalized keys decides, independent of input order.
        let a = record(1, "Acme", None, "Abd", "Dock", "IL");
        let b = record(2, "Bolt", None, "Abc", "Dock", "IL");

        let forward = rank(vec![a.clone(), b.clone()], "dock", context(), 8);
        let reverse = rank(vec![b, a], "dock", context(), 8);
        assert_eq!(forward[0].record.id, 2);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_result_capped_at_max_suggestions() {
        let candidates: Vec<_> = (0..20)
            .map(|i| record(i, "Acme", None, "123 Main St", "Chicago", "IL"))
            .collect();
        let ranked = rank(candidates, "123 main", context(), 8);
        assert_eq!(ranked.len(), 8);
    }

    #[test]
    fn test_empty_query_hides_suggestions() {
        let candidates = vec![record(1, "Acme", None, "123 Main St", "Chicago", "IL")];
        assert!(rank(candidates, "", context(), 8).is_empty());
    }
}
