//! # caseflow-analytics
//!
//! Read-only analytics over the case collection: keyword/category similarity
//! scoring and recurrence grouping for automation candidates.
//!
//! Both operations materialize the full case set per call; no incremental
//! index is maintained. They either return a full result or propagate a
//! not-found error for an invalid input id; there are no partial failures.

pub mod recurrence;
pub mod similarity;

use std::sync::Arc;

use uuid::Uuid;

use caseflow_core::{CaseStore, CategoryRecurrence, Result, SimilarCase};

pub use recurrence::{ATTENTION_THRESHOLD, CRITICAL_THRESHOLD, MAX_SAMPLE_CASES, UNCATEGORIZED};
pub use similarity::{CATEGORY_MATCH_SCORE, CATEGORY_WEIGHT, DEFAULT_SIMILARITY_LIMIT, KEYWORD_WEIGHT};

/// Query facade over the case store for both analytics operations.
#[derive(Clone)]
pub struct AnalyticsEngine {
    cases: Arc<dyn CaseStore>,
}

impl AnalyticsEngine {
    pub fn new(cases: Arc<dyn CaseStore>) -> Self {
        Self { cases }
    }

    /// Rank every other case against the named one.
    /// Fails with `CaseNotFound` when the query id does not exist.
    pub async fn similar_cases(
        &self,
        case_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<SimilarCase>> {
        let query = self.cases.fetch(case_id).await?;
        let all = self.cases.list_all().await?;
        let limit = limit.unwrap_or(DEFAULT_SIMILARITY_LIMIT);
        let results = similarity::rank(&query, &all, limit);
        tracing::debug!(
            case_id = %case_id,
            result_count = results.len(),
            "similarity query"
        );
        Ok(results)
    }

    /// Group all cases by category and derive automation-suggestion tiers.
    pub async fn recurrent_categories(&self) -> Result<Vec<CategoryRecurrence>> {
        let all = self.cases.list_all().await?;
        let groups = recurrence::analyze(&all);
        tracing::debug!(result_count = groups.len(), "recurrence query");
        Ok(groups)
    }
}
