//! Rule catalog: the static, versioned table of clause-type definitions.
//!
//! The catalog is data, not code. Each rule declares its triggers (keywords
//! and regex patterns), a canonical risk score, a statutory citation, and the
//! remediation text shown to the user. Adding a rule means editing the TOML,
//! never the classifier.
//!
//! Rules are held in evaluation order: base risk score descending, then
//! declaration order. The sort is stable, so two rules with equal scores keep
//! the order in which the catalog declares them.

use std::collections::HashSet;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CatalogError;
use crate::model::{RiskLevel, RuleMatch, normalize_text};

/// Catalog shipped with the crate.
const BUILTIN_CATALOG: &str = include_str!("../catalog/rules.toml");

/// Whether a rule participates in general risk analysis or only in HR mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    #[default]
    Risk,
    Standard,
}

/// A rule as written in the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSpec {
    pub type_id: String,
    pub display_name: String,
    #[serde(default)]
    pub kind: RuleKind,
    pub base_risk_score: u8,
    pub statutory_reference: String,
    /// Case-insensitive substrings.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Case-insensitive regular expressions.
    #[serde(default)]
    pub patterns: Vec<String>,
    pub risk_explanation: String,
    #[serde(default)]
    pub user_actions: Vec<String>,
    #[serde(default)]
    pub safer_rewrite: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub critical: bool,
    #[serde(default)]
    pub missing_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    version: String,
    #[serde(default)]
    jurisdiction: Option<String>,
    rules: Vec<RuleSpec>,
}

/// A compiled, read-only rule.
#[derive(Debug, Clone)]
pub struct ClauseTypeRule {
    pub spec: RuleSpec,
    /// Position in the source file (0-based).
    pub declaration_order: usize,
    keywords: Vec<String>,
    patterns: Vec<Regex>,
}

impl ClauseTypeRule {
    fn compile(spec: RuleSpec, declaration_order: usize) -> Result<Self, CatalogError> {
        if spec.base_risk_score > 10 {
            return Err(CatalogError::ScoreOutOfRange {
                type_id: spec.type_id,
                score: spec.base_risk_score,
            });
        }

        let keywords: Vec<String> = spec
            .keywords
            .iter()
            .map(|k| normalize_text(k))
            .filter(|k| !k.is_empty())
            .collect();

        let patterns = spec
            .patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| CatalogError::Pattern {
                        type_id: spec.type_id.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if keywords.is_empty() && patterns.is_empty() {
            return Err(CatalogError::NoTriggers(spec.type_id));
        }

        Ok(Self {
            spec,
            declaration_order,
            keywords,
            patterns,
        })
    }

    pub fn type_id(&self) -> &str {
        &self.spec.type_id
    }

    pub fn display_name(&self) -> &str {
        &self.spec.display_name
    }

    pub fn base_risk_score(&self) -> u8 {
        self.spec.base_risk_score
    }

    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from_score(self.spec.base_risk_score)
    }

    pub fn kind(&self) -> RuleKind {
        self.spec.kind
    }

    pub fn is_required(&self) -> bool {
        self.spec.required
    }

    pub fn is_critical(&self) -> bool {
        self.spec.required && self.spec.critical
    }

    /// Test the triggers against already-normalized clause text.
    pub fn matches(&self, normalized: &str) -> bool {
        if normalized.is_empty() {
            return false;
        }
        self.keywords.iter().any(|k| normalized.contains(k.as_str()))
            || self.patterns.iter().any(|p| p.is_match(normalized))
    }

    /// Snapshot carried by a classified clause.
    pub fn to_match(&self) -> RuleMatch {
        RuleMatch {
            type_id: self.spec.type_id.clone(),
            clause_type: self.spec.display_name.clone(),
            risk_score: self.spec.base_risk_score,
            statutory_reference: self.spec.statutory_reference.clone(),
            why_risky: self.spec.risk_explanation.clone(),
            what_user_can_do: self.spec.user_actions.clone(),
            safer_rewrite: self.spec.safer_rewrite.clone(),
            why_risky_simplified: None,
        }
    }
}

/// The full rule table, loaded once and shared read-only.
#[derive(Debug, Clone)]
pub struct RuleCatalog {
    version: String,
    jurisdiction: Option<String>,
    rules: Vec<ClauseTypeRule>,
}

impl RuleCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// Load a catalog from a TOML file on disk.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&text)?;
        info!(path = %path.display(), version = %catalog.version, "loaded rule catalog");
        Ok(catalog)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        Self::from_specs(file.version, file.jurisdiction, file.rules)
    }

    pub fn from_specs(
        version: String,
        jurisdiction: Option<String>,
        specs: Vec<RuleSpec>,
    ) -> Result<Self, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::new();
        let mut rules = Vec::with_capacity(specs.len());
        for (order, spec) in specs.into_iter().enumerate() {
            if !seen.insert(spec.type_id.clone()) {
                return Err(CatalogError::DuplicateRule(spec.type_id));
            }
            rules.push(ClauseTypeRule::compile(spec, order)?);
        }

        // Stable: equal scores keep declaration order.
        rules.sort_by(|a, b| b.base_risk_score().cmp(&a.base_risk_score()));

        Ok(Self {
            version,
            jurisdiction,
            rules,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn jurisdiction(&self) -> Option<&str> {
        self.jurisdiction.as_deref()
    }

    /// All rules in evaluation order.
    pub fn rules(&self) -> &[ClauseTypeRule] {
        &self.rules
    }

    /// Rules used by general risk analysis, in evaluation order.
    pub fn risk_rules(&self) -> impl Iterator<Item = &ClauseTypeRule> {
        self.rules.iter().filter(|r| r.kind() == RuleKind::Risk)
    }

    /// Rules flagged `required`, in declaration order.
    pub fn required_rules(&self) -> Vec<&ClauseTypeRule> {
        let mut required: Vec<&ClauseTypeRule> =
            self.rules.iter().filter(|r| r.is_required()).collect();
        required.sort_by_key(|r| r.declaration_order);
        required
    }

    pub fn get(&self, type_id: &str) -> Option<&ClauseTypeRule> {
        self.rules.iter().find(|r| r.type_id() == type_id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(type_id: &str, score: u8, keywords: &[&str]) -> RuleSpec {
        RuleSpec {
            type_id: type_id.into(),
            display_name: type_id.into(),
            kind: RuleKind::Risk,
            base_risk_score: score,
            statutory_reference: "Section 1".into(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            patterns: vec![],
            risk_explanation: "why".into(),
            user_actions: vec![],
            safer_rewrite: String::new(),
            required: false,
            critical: false,
            missing_reason: None,
        }
    }

    #[test]
    fn builtin_catalog_loads() {
        let catalog = RuleCatalog::builtin().unwrap();
        assert!(!catalog.is_empty());
        for id in [
            "non_compete",
            "unlimited_liability",
            "penalty",
            "unfair_termination",
            "ip_transfer",
            "termination_clause",
        ] {
            assert!(catalog.get(id).is_some(), "missing rule {id}");
        }
    }

    #[test]
    fn builtin_catalog_is_in_evaluation_order() {
        let catalog = RuleCatalog::builtin().unwrap();
        for pair in catalog.rules().windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.base_risk_score() >= b.base_risk_score());
            if a.base_risk_score() == b.base_risk_score() {
                assert!(a.declaration_order < b.declaration_order);
            }
        }
    }

    #[test]
    fn builtin_required_rules_include_termination() {
        let catalog = RuleCatalog::builtin().unwrap();
        let required = catalog.required_rules();
        let termination = required
            .iter()
            .find(|r| r.type_id() == "termination_clause")
            .expect("termination clause is required");
        assert!(termination.is_critical());
        assert!(!termination.spec.safer_rewrite.is_empty());
    }

    #[test]
    fn equal_scores_keep_declaration_order() {
        let catalog = RuleCatalog::from_specs(
            "t".into(),
            None,
            vec![
                spec("low", 2, &["a"]),
                spec("first_nine", 9, &["b"]),
                spec("eight", 8, &["c"]),
                spec("second_nine", 9, &["d"]),
            ],
        )
        .unwrap();
        let ids: Vec<&str> = catalog.rules().iter().map(|r| r.type_id()).collect();
        assert_eq!(ids, ["first_nine", "second_nine", "eight", "low"]);
    }

    #[test]
    fn keywords_match_case_insensitively_on_normalized_text() {
        let rule = ClauseTypeRule::compile(spec("nc", 9, &["Restraint  of Trade"]), 0).unwrap();
        assert!(rule.matches(&normalize_text("This is a RESTRAINT of trade.")));
        assert!(!rule.matches(""));
    }

    #[test]
    fn patterns_are_case_insensitive() {
        let mut s = spec("hours", 6, &[]);
        s.patterns = vec![r"\b(49|[5-9][0-9])\s*hours\b".into()];
        let rule = ClauseTypeRule::compile(s, 0).unwrap();
        assert!(rule.matches("work 60 HOURS per week"));
        assert!(!rule.matches("work 40 hours per week"));
    }

    #[test]
    fn rejects_score_above_ten() {
        let err = RuleCatalog::from_specs("t".into(), None, vec![spec("x", 11, &["a"])]);
        assert!(matches!(err, Err(CatalogError::ScoreOutOfRange { .. })));
    }

    #[test]
    fn rejects_duplicate_type_ids() {
        let err = RuleCatalog::from_specs(
            "t".into(),
            None,
            vec![spec("x", 1, &["a"]), spec("x", 2, &["b"])],
        );
        assert!(matches!(err, Err(CatalogError::DuplicateRule(id)) if id == "x"));
    }

    #[test]
    fn rejects_rule_without_triggers() {
        let err = RuleCatalog::from_specs("t".into(), None, vec![spec("x", 1, &[])]);
        assert!(matches!(err, Err(CatalogError::NoTriggers(_))));
    }

    #[test]
    fn rejects_invalid_regex() {
        let mut s = spec("x", 1, &[]);
        s.patterns = vec!["(unclosed".into()];
        let err = RuleCatalog::from_specs("t".into(), None, vec![s]);
        assert!(matches!(err, Err(CatalogError::Pattern { .. })));
    }

    #[test]
    fn parses_toml_with_defaults() {
        let text = r#"
            version = "test-1"

            [[rules]]
            type_id = "gov"
            display_name = "Governing Law"
            kind = "standard"
            base_risk_score = 1
            statutory_reference = "CPC"
            keywords = ["governing law"]
            risk_explanation = "ok"
            required = true
        "#;
        let catalog = RuleCatalog::from_toml_str(text).unwrap();
        assert_eq!(catalog.version(), "test-1");
        let rule = catalog.get("gov").unwrap();
        assert_eq!(rule.kind(), RuleKind::Standard);
        assert!(rule.is_required());
        assert!(!rule.is_critical());
        assert_eq!(catalog.risk_rules().count(), 0);
    }
}
