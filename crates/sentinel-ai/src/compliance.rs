//! HR compliance: required-clause presence, score, and document risk.
//!
//! A required type counts as present when any clause's triggers fired for it,
//! even if a higher-risk rule won that clause.

use chrono::Utc;
use sentinel_core::catalog::{ClauseTypeRule, RuleCatalog};
use sentinel_core::model::{
    ClassifiedClause, ComplianceResult, ComplianceStatus, DISCLAIMER, MissingClause, RiskLevel,
};
use tracing::info;

/// Score below which a document is HIGH risk.
pub const HIGH_RISK_BELOW: u8 = 50;
/// Score below which a document is MEDIUM risk.
pub const MEDIUM_RISK_BELOW: u8 = 80;

/// Check classified clauses (from an all-rules classification) against the
/// catalog's required subset.
pub fn validate(catalog: &RuleCatalog, clauses: Vec<ClassifiedClause>) -> ComplianceResult {
    let required = catalog.required_rules();
    let missing: Vec<MissingClause> = required
        .iter()
        .filter(|rule| !clauses.iter().any(|c| c.evidences(rule.type_id())))
        .map(|rule| missing_clause(rule))
        .collect();

    let compliance_score = compliance_score(required.len(), required.len() - missing.len());
    let critical_missing = missing.iter().any(|m| m.critical);
    let risk_level = document_risk(compliance_score, critical_missing);
    let summary = summary(&clauses, &missing, compliance_score);

    info!(
        clauses = clauses.len(),
        required = required.len(),
        missing = missing.len(),
        score = compliance_score,
        risk = risk_level.as_str(),
        "validated compliance"
    );

    ComplianceResult {
        catalog_version: catalog.version().to_string(),
        total_clauses: clauses.len(),
        compliance_score,
        risk_level,
        clause_results: clauses,
        missing_clauses: missing,
        summary,
        disclaimer: DISCLAIMER.to_string(),
        analyzed_at: Utc::now(),
    }
}

/// Percentage of required types present, rounded. A catalog with no
/// required types is fully compliant.
pub fn compliance_score(required: usize, present: usize) -> u8 {
    if required == 0 {
        return 100;
    }
    let pct = (present.min(required) as f64 / required as f64 * 100.0).round();
    pct as u8
}

pub fn document_risk(compliance_score: u8, critical_missing: bool) -> RiskLevel {
    if compliance_score < HIGH_RISK_BELOW || critical_missing {
        RiskLevel::High
    } else if compliance_score < MEDIUM_RISK_BELOW {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn missing_clause(rule: &ClauseTypeRule) -> MissingClause {
    let reason = rule
        .spec
        .missing_reason
        .clone()
        .unwrap_or_else(|| format!("A {} clause is required", rule.display_name()));
    let suggested_text = if rule.spec.safer_rewrite.trim().is_empty() {
        "Clause text to be drafted by legal counsel.".to_string()
    } else {
        rule.spec.safer_rewrite.clone()
    };
    MissingClause {
        type_id: rule.type_id().to_string(),
        clause_type: rule.display_name().to_string(),
        reason,
        suggested_text,
        required: true,
        critical: rule.is_critical(),
        status: ComplianceStatus::Missing,
    }
}

fn summary(clauses: &[ClassifiedClause], missing: &[MissingClause], score: u8) -> String {
    let risky = clauses
        .iter()
        .filter(|c| c.status == ComplianceStatus::Risky)
        .count();
    let valid = clauses.len() - risky;

    let mut summary = format!(
        "Analyzed {} clauses. {valid} valid, {risky} risky. Compliance score: {score}/100. ",
        clauses.len()
    );
    if missing.is_empty() {
        summary.push_str("All required clauses present.");
    } else {
        let names: Vec<&str> = missing.iter().map(|m| m.clause_type.as_str()).collect();
        summary.push_str(&format!(
            "{} required clause(s) missing: {}.",
            missing.len(),
            names.join(", ")
        ));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Classifier, RuleScope};
    use sentinel_core::Segmenter;
    use std::sync::Arc;

    fn run(text: &str) -> ComplianceResult {
        let catalog = Arc::new(RuleCatalog::builtin().unwrap());
        let clauses = Segmenter::default().segment(text);
        let classified = Classifier::new(catalog.clone(), RuleScope::All).classify_all(&clauses);
        validate(&catalog, classified)
    }

    const COMPLETE: &str = "\
1. This Agreement shall be governed by the laws of India.

2. The courts at Pune shall have exclusive jurisdiction over disputes.

3. Any dispute shall be referred to arbitration under the 1996 Act.

4. Either party may terminate this Agreement with 60 days written notice.";

    #[test]
    fn complete_contract_is_fully_compliant() {
        let result = run(COMPLETE);
        assert_eq!(result.compliance_score, 100);
        assert!(result.missing_clauses.is_empty());
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.summary.ends_with("All required clauses present."));
    }

    #[test]
    fn missing_termination_clause_is_reported_once() {
        let text = "\
1. This Agreement shall be governed by the laws of India.

2. The courts at Pune shall have exclusive jurisdiction over disputes.

3. Any dispute shall be referred to arbitration under the 1996 Act.";
        let result = run(text);
        assert_eq!(result.missing_clauses.len(), 1);
        let missing = &result.missing_clauses[0];
        assert_eq!(missing.type_id, "termination_clause");
        assert_eq!(missing.clause_type, "Termination Clause");
        assert!(!missing.suggested_text.is_empty());
        assert!(missing.critical);
        assert_eq!(missing.status, ComplianceStatus::Missing);
        assert_eq!(result.compliance_score, 75);
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn at_will_termination_still_counts_as_present() {
        let text = "\
1. This Agreement shall be governed by the laws of India.

2. The courts at Pune shall have exclusive jurisdiction over disputes.

3. Any dispute shall be referred to arbitration under the 1996 Act.

4. The Company may terminate at will without any notice.";
        let result = run(text);
        assert!(result.missing_clauses.is_empty());
        assert_eq!(result.risky_clauses().count(), 1);
    }

    #[test]
    fn adding_a_required_clause_never_lowers_the_score() {
        let partial = "1. The Employee shall work from the Mumbai office.\n\n\
                       2. Either party may terminate this Agreement with notice.";
        let before = run(partial).compliance_score;
        let after = run(&format!(
            "{partial}\n\n3. This Agreement shall be governed by the laws of India."
        ))
        .compliance_score;
        assert!(after >= before);
        assert_eq!((before, after), (25, 50));
    }

    #[test]
    fn score_and_risk_thresholds() {
        assert_eq!(compliance_score(0, 0), 100);
        assert_eq!(compliance_score(3, 2), 67);
        assert_eq!(compliance_score(4, 1), 25);
        assert_eq!(document_risk(49, false), RiskLevel::High);
        assert_eq!(document_risk(50, false), RiskLevel::Medium);
        assert_eq!(document_risk(79, false), RiskLevel::Medium);
        assert_eq!(document_risk(80, false), RiskLevel::Low);
        assert_eq!(document_risk(100, true), RiskLevel::High);
    }
}
