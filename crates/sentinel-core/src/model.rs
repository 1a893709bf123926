//! Shared analysis types: clauses, classifications, and per-request results.
//!
//! Everything here is created once per request and never mutated afterwards.
//! All types serialize to the JSON shapes returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed disclaimer attached to every analysis and answer.
pub const DISCLAIMER: &str = "This tool does not provide legal advice. It offers educational \
information only. Consult a qualified lawyer for legal matters.";

/// Clause-level and document-level risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Band for an integer clause score: 0-4 low, 5-7 medium, 8-10 high.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=4 => Self::Low,
            5..=7 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Band for an aggregate (fractional) score, using the same cut points.
    pub fn from_mean(score: f64) -> Self {
        if score >= 8.0 {
            Self::High
        } else if score >= 5.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }

    /// Human label, e.g. "High Risk".
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        }
    }
}

/// Per-clause status in HR compliance mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Valid,
    Risky,
    Missing,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "VALID",
            Self::Risky => "RISKY",
            Self::Missing => "MISSING",
        }
    }
}

/// One contiguous segment of contract text, as produced by the segmenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    /// Zero-based position in document order.
    pub index: usize,
    pub text: String,
    /// Lowercased, whitespace-collapsed form used for matching.
    pub normalized_text: String,
}

impl Clause {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        let normalized_text = normalize_text(&text);
        Self {
            index,
            text,
            normalized_text,
        }
    }
}

/// Lowercase and collapse all whitespace runs to a single space.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Snapshot of the catalog rule that won a clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub type_id: String,
    pub clause_type: String,
    pub risk_score: u8,
    pub statutory_reference: String,
    pub why_risky: String,
    pub what_user_can_do: Vec<String>,
    pub safer_rewrite: String,
    /// Plain-language rephrasing from the generator, when requested and available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub why_risky_simplified: Option<String>,
}

/// A clause plus the outcome of classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedClause {
    #[serde(flatten)]
    pub clause: Clause,
    /// At most one rule, chosen by evaluation order.
    pub matched_rule: Option<RuleMatch>,
    /// `None` for benign clauses.
    pub risk_level: Option<RiskLevel>,
    pub status: ComplianceStatus,
    /// Every rule whose triggers fired, winner first.
    pub triggered: Vec<String>,
}

impl ClassifiedClause {
    /// A clause no rule matched.
    pub fn benign(clause: Clause) -> Self {
        Self {
            clause,
            matched_rule: None,
            risk_level: None,
            status: ComplianceStatus::Valid,
            triggered: Vec::new(),
        }
    }

    pub fn risk_score(&self) -> Option<u8> {
        self.matched_rule.as_ref().map(|m| m.risk_score)
    }

    pub fn type_id(&self) -> Option<&str> {
        self.matched_rule.as_ref().map(|m| m.type_id.as_str())
    }

    /// MEDIUM or HIGH.
    pub fn is_risky(&self) -> bool {
        matches!(self.risk_level, Some(RiskLevel::Medium | RiskLevel::High))
    }

    /// Whether any of this clause's triggers belonged to `type_id`.
    pub fn evidences(&self, type_id: &str) -> bool {
        self.triggered.iter().any(|t| t == type_id)
    }
}

/// General-mode output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub catalog_version: String,
    pub total_clauses_analyzed: usize,
    pub risky_clauses_found: usize,
    /// Mean of matched clause scores, one decimal place, 0 when nothing matched.
    pub overall_risk_score: f64,
    pub overall_risk_category: RiskLevel,
    pub risky_clauses: Vec<ClassifiedClause>,
    pub all_clauses: Vec<ClassifiedClause>,
    pub disclaimer: String,
    pub analyzed_at: DateTime<Utc>,
}

/// A required clause type absent from the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingClause {
    pub type_id: String,
    pub clause_type: String,
    pub reason: String,
    pub suggested_text: String,
    pub required: bool,
    pub critical: bool,
    pub status: ComplianceStatus,
}

/// HR-mode output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub catalog_version: String,
    pub total_clauses: usize,
    /// Percentage of required clause types present, 0-100.
    pub compliance_score: u8,
    pub risk_level: RiskLevel,
    pub clause_results: Vec<ClassifiedClause>,
    pub missing_clauses: Vec<MissingClause>,
    pub summary: String,
    pub disclaimer: String,
    pub analyzed_at: DateTime<Utc>,
}

impl ComplianceResult {
    pub fn risky_clauses(&self) -> impl Iterator<Item = &ClassifiedClause> {
        self.clause_results
            .iter()
            .filter(|c| c.status == ComplianceStatus::Risky)
    }
}

/// Which collection a retrieved passage came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PassageSource {
    Contract,
    Law,
}

/// A passage returned for a question. Ephemeral, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub source: PassageSource,
    /// Section title for law passages, `Clause N` for contract passages.
    pub title: String,
    pub passage_text: String,
    /// 1-based rank within its collection.
    pub relevance_rank: usize,
    pub score: f64,
}

/// The passages an answer was grounded on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextUsed {
    pub law_sections_retrieved: Vec<RetrievalHit>,
    pub contract_clauses_retrieved: Vec<RetrievalHit>,
    pub risky_clauses_summary: String,
}

/// Q&A output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
    /// A generator was configured for this request.
    pub ai_enabled: bool,
    /// The generator failed or timed out and `answer` is a fallback.
    pub degraded: bool,
    pub context_used: ContextUsed,
    pub disclaimer: String,
    pub answered_at: DateTime<Utc>,
}
