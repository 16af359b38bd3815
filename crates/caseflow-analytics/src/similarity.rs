//! Case similarity scoring.
//!
//! Scores a candidate against a query case by keyword overlap and category
//! equality. The keyword term is normalized by the *query* case's keyword
//! count, not the candidate's: the score measures how much of the query's
//! signature the candidate covers, and is deliberately not a symmetric
//! Jaccard index. A query case with no keywords scores 0 on the keyword
//! term against everything.

use std::collections::HashSet;

use caseflow_core::{Case, SimilarCase};

/// Weight of the keyword-overlap term.
pub const KEYWORD_WEIGHT: f64 = 0.7;

/// Weight of the category-match term.
pub const CATEGORY_WEIGHT: f64 = 0.3;

/// Value of the category term when both categories are present and equal.
pub const CATEGORY_MATCH_SCORE: f64 = 0.5;

/// Default number of ranked candidates returned.
pub const DEFAULT_SIMILARITY_LIMIT: usize = 5;

/// Score one candidate against the query case.
///
/// Returns the combined score and the keywords shared with the query, in the
/// query's keyword order.
pub fn score(query: &Case, candidate: &Case) -> (f64, Vec<String>) {
    // Keywords are a set; duplicates in the stored vec must not skew the
    // overlap ratio.
    let candidate_keywords: HashSet<&str> =
        candidate.keywords.iter().map(String::as_str).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut query_count = 0;
    let mut matching: Vec<String> = Vec::new();
    for keyword in &query.keywords {
        if !seen.insert(keyword.as_str()) {
            continue;
        }
        query_count += 1;
        if candidate_keywords.contains(keyword.as_str()) {
            matching.push(keyword.clone());
        }
    }

    let keyword_score = matching.len() as f64 / query_count.max(1) as f64;

    let category_score = match (&query.category, &candidate.category) {
        (Some(a), Some(b)) if a == b => CATEGORY_MATCH_SCORE,
        _ => 0.0,
    };

    let total = KEYWORD_WEIGHT * keyword_score + CATEGORY_WEIGHT * category_score;
    (total, matching)
}

/// Rank all candidates against the query case.
///
/// Candidates scoring zero are excluded; the rest are sorted descending by
/// score (ties keep the collection's order, which is not contractually
/// stable) and truncated to `limit`.
pub fn rank(query: &Case, candidates: &[Case], limit: usize) -> Vec<SimilarCase> {
    let mut ranked: Vec<SimilarCase> = candidates
        .iter()
        .filter(|c| c.id != query.id)
        .filter_map(|candidate| {
            let (total, matching) = score(query, candidate);
            (total > 0.0).then(|| SimilarCase {
                case: candidate.summary(),
                score: total,
                matching_keywords: matching,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseflow_core::CaseStatus;
    use uuid::Uuid;

    fn case(keywords: &[&str], category: Option<&str>) -> Case {
        Case {
            id: Uuid::new_v4(),
            external_ref: None,
            title: "t".to_string(),
            description: String::new(),
            status: CaseStatus::Pending,
            category: category.map(String::from),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            creator_id: None,
            assignee_id: None,
            opened_at: chrono::Utc::now(),
            closed_at: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_worked_example() {
        // keywords {pix, erro} / category Pagamento vs keywords {pix} /
        // category Pagamento: 0.7 * (1/2) + 0.3 * 0.5 = 0.50
        let query = case(&["pix", "erro"], Some("Pagamento"));
        let candidate = case(&["pix"], Some("Pagamento"));

        let (total, matching) = score(&query, &candidate);
        assert!((total - 0.50).abs() < 1e-9);
        assert_eq!(matching, vec!["pix"]);
    }

    #[test]
    fn test_scoring_is_asymmetric() {
        // An empty query keyword set scores 0 on keywords no matter how many
        // keywords the candidate has.
        let query = case(&[], None);
        let candidate = case(&["pix", "erro", "boleto"], None);
        let (total, matching) = score(&query, &candidate);
        assert_eq!(total, 0.0);
        assert!(matching.is_empty());

        // Reversed direction scores nonzero
        let (reverse, _) = score(&candidate, &query);
        assert_eq!(reverse, 0.0); // candidate has no keywords to match either

        let partial = case(&["pix"], None);
        let (forward, _) = score(&candidate, &partial);
        let (backward, _) = score(&partial, &candidate);
        // 1/3 of candidate's signature vs 1/1 of partial's signature
        assert!((forward - 0.7 / 3.0).abs() < 1e-9);
        assert!((backward - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_missing_categories_never_match() {
        let query = case(&["pix"], None);
        let candidate = case(&["pix"], None);
        let (total, _) = score(&query, &candidate);
        // Keyword term only; two absent categories are not "equal"
        assert!((total - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_category_only_match() {
        let query = case(&["pix"], Some("Pagamento"));
        let candidate = case(&["endosso"], Some("Pagamento"));
        let (total, matching) = score(&query, &candidate);
        assert!((total - 0.15).abs() < 1e-9);
        assert!(matching.is_empty());
    }

    #[test]
    fn test_rank_excludes_zero_scores_and_self() {
        let query = case(&["pix"], Some("Pagamento"));
        let zero = case(&["endosso"], Some("Corretor"));
        let hit = case(&["pix"], None);

        let candidates = vec![query.clone(), zero, hit.clone()];
        let ranked = rank(&query, &candidates, 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].case.id, hit.id);
    }

    #[test]
    fn test_rank_sorted_descending_and_truncated() {
        let query = case(&["a", "b", "c", "d"], Some("Cat"));
        let full = case(&["a", "b", "c", "d"], Some("Cat")); // 0.85
        let half = case(&["a", "b"], None); // 0.35
        let quarter = case(&["a"], None); // 0.175
        let category_only = case(&["x"], Some("Cat")); // 0.15

        let candidates = vec![quarter.clone(), full.clone(), category_only, half.clone()];
        let ranked = rank(&query, &candidates, 3);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].case.id, full.id);
        assert_eq!(ranked[1].case.id, half.id);
        assert_eq!(ranked[2].case.id, quarter.id);
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_duplicate_query_keywords_do_not_skew_overlap() {
        // Stored keyword vecs are not guaranteed unique; scoring treats them
        // as a set. {pix, pix, erro} is the set {pix, erro}: matching only
        // "pix" gives 1/2, not 2/3.
        let query = case(&["pix", "pix", "erro"], None);
        let candidate = case(&["pix"], None);
        let (total, matching) = score(&query, &candidate);
        assert!((total - 0.7 * 0.5).abs() < 1e-9);
        assert_eq!(matching, vec!["pix"]);

        // A fully duplicated single keyword is still a full match
        let query = case(&["pix", "pix"], None);
        let (total, matching) = score(&query, &candidate);
        assert!((total - 0.7).abs() < 1e-9);
        assert_eq!(matching, vec!["pix"]);
    }

    #[test]
    fn test_full_overlap_with_category() {
        let query = case(&["pix", "erro"], Some("Pagamento"));
        let twin = case(&["pix", "erro"], Some("Pagamento"));
        let (total, _) = score(&query, &twin);
        // 0.7 * 1.0 + 0.3 * 0.5
        assert!((total - 0.85).abs() < 1e-9);
    }
}
