//! Rule-based clause classification.
//!
//! A single generic loop walks the catalog in evaluation order and tests each
//! rule's triggers against the clause's normalized text. The first rule that
//! fires wins; every rule that fires is recorded in `triggered` so compliance
//! checks can see evidence that the winner would otherwise hide.
//!
//! Classification is pure: the same clause and catalog always produce the
//! same result, and no input can make it fail.

use std::sync::Arc;

use sentinel_core::catalog::{ClauseTypeRule, RuleCatalog, RuleKind};
use sentinel_core::model::{Clause, ClassifiedClause, ComplianceStatus, RiskLevel};
use tracing::{debug, info};

/// Which catalog rules take part in classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuleScope {
    /// `kind = "risk"` rules only (general analysis).
    #[default]
    RiskOnly,
    /// Every rule (HR validation).
    All,
}

impl RuleScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RiskOnly => "risk",
            Self::All => "all",
        }
    }

    fn admits(&self, rule: &ClauseTypeRule) -> bool {
        match self {
            Self::RiskOnly => rule.kind() == RuleKind::Risk,
            Self::All => true,
        }
    }
}

/// Matches clauses against a shared, read-only catalog.
#[derive(Debug, Clone)]
pub struct Classifier {
    catalog: Arc<RuleCatalog>,
    scope: RuleScope,
}

impl Classifier {
    pub fn new(catalog: Arc<RuleCatalog>, scope: RuleScope) -> Self {
        Self { catalog, scope }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn scope(&self) -> RuleScope {
        self.scope
    }

    /// Classify one clause. Clauses no rule matches come back benign.
    pub fn classify(&self, clause: &Clause) -> ClassifiedClause {
        let triggered: Vec<&ClauseTypeRule> = self
            .catalog
            .rules()
            .iter()
            .filter(|r| self.scope.admits(r))
            .filter(|r| r.matches(&clause.normalized_text))
            .collect();

        let Some(winner) = triggered.first() else {
            return ClassifiedClause::benign(clause.clone());
        };

        let level = winner.risk_level();
        let status = match level {
            RiskLevel::Medium | RiskLevel::High => ComplianceStatus::Risky,
            RiskLevel::Low => ComplianceStatus::Valid,
        };
        debug!(
            index = clause.index,
            rule = winner.type_id(),
            score = winner.base_risk_score(),
            triggered = triggered.len(),
            "clause matched"
        );

        ClassifiedClause {
            clause: clause.clone(),
            matched_rule: Some(winner.to_match()),
            risk_level: Some(level),
            status,
            triggered: triggered.iter().map(|r| r.type_id().to_string()).collect(),
        }
    }

    /// Classify every clause, preserving order.
    pub fn classify_all(&self, clauses: &[Clause]) -> Vec<ClassifiedClause> {
        let classified: Vec<ClassifiedClause> = clauses.iter().map(|c| self.classify(c)).collect();
        info!(
            clauses = classified.len(),
            matched = classified.iter().filter(|c| c.matched_rule.is_some()).count(),
            scope = self.scope.as_str(),
            "classified clauses"
        );
        classified
    }
}
