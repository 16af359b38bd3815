//! Category recurrence analysis.
//!
//! Groups the case collection by category and assigns each bucket an
//! automation-suggestion tier from fixed count thresholds. This is an
//! advisory heuristic, not a statistical test.

use std::collections::HashMap;

use caseflow_core::{Case, CategoryRecurrence, RecurrenceTier};

/// Bucket count at or above which automation is urgently recommended.
pub const CRITICAL_THRESHOLD: usize = 5;

/// Bucket count at or above which automation should be considered.
pub const ATTENTION_THRESHOLD: usize = 3;

/// Maximum representative cases carried per bucket.
pub const MAX_SAMPLE_CASES: usize = 5;

/// Bucket label for cases without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Tier for a bucket of `count` cases.
pub fn tier_for(count: usize) -> RecurrenceTier {
    if count >= CRITICAL_THRESHOLD {
        RecurrenceTier::Critical
    } else if count >= ATTENTION_THRESHOLD {
        RecurrenceTier::Attention
    } else {
        RecurrenceTier::Monitor
    }
}

/// Group all cases by category, sorted descending by bucket size.
///
/// Percentages are `count / total * 100`, rounded to one decimal; bucket
/// counts always sum to the input length. An empty input yields no buckets.
pub fn analyze(cases: &[Case]) -> Vec<CategoryRecurrence> {
    let total = cases.len();
    if total == 0 {
        return Vec::new();
    }

    let mut buckets: HashMap<&str, Vec<&Case>> = HashMap::new();
    for case in cases {
        let category = case
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED);
        buckets.entry(category).or_default().push(case);
    }

    let mut groups: Vec<CategoryRecurrence> = buckets
        .into_iter()
        .map(|(category, members)| {
            let count = members.len();
            let percentage = (count as f64 / total as f64 * 1000.0).round() / 10.0;
            CategoryRecurrence {
                category: category.to_string(),
                count,
                percentage,
                tier: tier_for(count),
                sample_cases: members
                    .iter()
                    .take(MAX_SAMPLE_CASES)
                    .map(|c| c.summary())
                    .collect(),
            }
        })
        .collect();

    groups.sort_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use caseflow_core::CaseStatus;
    use uuid::Uuid;

    fn case(category: Option<&str>) -> Case {
        Case {
            id: Uuid::new_v4(),
            external_ref: None,
            title: "t".to_string(),
            description: String::new(),
            status: CaseStatus::Pending,
            category: category.map(String::from),
            keywords: vec![],
            creator_id: None,
            assignee_id: None,
            opened_at: chrono::Utc::now(),
            closed_at: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(tier_for(0), RecurrenceTier::Monitor);
        assert_eq!(tier_for(2), RecurrenceTier::Monitor);
        assert_eq!(tier_for(3), RecurrenceTier::Attention);
        assert_eq!(tier_for(4), RecurrenceTier::Attention);
        assert_eq!(tier_for(5), RecurrenceTier::Critical);
        assert_eq!(tier_for(50), RecurrenceTier::Critical);
    }

    #[test]
    fn test_empty_input_yields_no_buckets() {
        assert!(analyze(&[]).is_empty());
    }

    #[test]
    fn test_single_dominant_category() {
        let mut cases: Vec<Case> = (0..5).map(|_| case(Some("Integração"))).collect();
        cases.push(case(Some("Outros")));

        let groups = analyze(&cases);
        assert_eq!(groups[0].category, "Integração");
        assert_eq!(groups[0].count, 5);
        assert_eq!(groups[0].tier, RecurrenceTier::Critical);
        assert!((groups[0].percentage - 83.3).abs() < 1e-9);
    }

    #[test]
    fn test_counts_sum_to_total_and_percentages_to_100() {
        let mut cases = Vec::new();
        for _ in 0..6 {
            cases.push(case(Some("A")));
        }
        for _ in 0..3 {
            cases.push(case(Some("B")));
        }
        cases.push(case(None));

        let groups = analyze(&cases);
        let count_sum: usize = groups.iter().map(|g| g.count).sum();
        assert_eq!(count_sum, cases.len());

        let pct_sum: f64 = groups.iter().map(|g| g.percentage).sum();
        assert!((pct_sum - 100.0).abs() < 0.5); // within rounding
    }

    #[test]
    fn test_uncategorized_bucket() {
        let cases = vec![case(None), case(Some("")), case(Some("Pagamento"))];
        let groups = analyze(&cases);

        let uncategorized = groups
            .iter()
            .find(|g| g.category == UNCATEGORIZED)
            .expect("uncategorized bucket present");
        // Both None and empty-string map to the same bucket
        assert_eq!(uncategorized.count, 2);
    }

    #[test]
    fn test_sorted_descending_by_count() {
        let mut cases = Vec::new();
        for _ in 0..2 {
            cases.push(case(Some("Small")));
        }
        for _ in 0..4 {
            cases.push(case(Some("Big")));
        }

        let groups = analyze(&cases);
        assert_eq!(groups[0].category, "Big");
        assert_eq!(groups[1].category, "Small");
        assert_eq!(groups[0].tier, RecurrenceTier::Attention);
        assert_eq!(groups[1].tier, RecurrenceTier::Monitor);
    }

    #[test]
    fn test_samples_capped_at_five() {
        let cases: Vec<Case> = (0..8).map(|_| case(Some("Busy"))).collect();
        let groups = analyze(&cases);
        assert_eq!(groups[0].count, 8);
        assert_eq!(groups[0].sample_cases.len(), MAX_SAMPLE_CASES);
    }
}
