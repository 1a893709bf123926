//! Contract-level risk: mean of matched clause scores.

use chrono::Utc;
use sentinel_core::model::{AnalysisResult, ClassifiedClause, DISCLAIMER, RiskLevel};
use tracing::info;

/// Mean of the matched clauses' scores, rounded to one decimal place.
/// Unmatched clauses are left out; with no matches the score is 0.
pub fn overall_risk_score(clauses: &[ClassifiedClause]) -> f64 {
    let scores: Vec<u8> = clauses.iter().filter_map(|c| c.risk_score()).collect();
    if scores.is_empty() {
        return 0.0;
    }
    let mean = scores.iter().map(|&s| f64::from(s)).sum::<f64>() / scores.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// Build the general-mode result. The category is taken from the rounded
/// score so the two always agree.
pub fn aggregate(catalog_version: &str, clauses: Vec<ClassifiedClause>) -> AnalysisResult {
    let overall_risk_score = overall_risk_score(&clauses);
    let overall_risk_category = RiskLevel::from_mean(overall_risk_score);
    let risky_clauses: Vec<ClassifiedClause> =
        clauses.iter().filter(|c| c.is_risky()).cloned().collect();

    info!(
        clauses = clauses.len(),
        risky = risky_clauses.len(),
        score = overall_risk_score,
        category = overall_risk_category.as_str(),
        "aggregated risk"
    );

    AnalysisResult {
        catalog_version: catalog_version.to_string(),
        total_clauses_analyzed: clauses.len(),
        risky_clauses_found: risky_clauses.len(),
        overall_risk_score,
        overall_risk_category,
        risky_clauses,
        all_clauses: clauses,
        disclaimer: DISCLAIMER.to_string(),
        analyzed_at: Utc::now(),
    }
}
