//! One analysis request end to end: text in, structured result out.
//!
//! `Analyzer` holds only read-only state (catalog, law collection, compiled
//! patterns) and can be shared across concurrent requests. Each call owns its
//! clauses and result.

use std::sync::Arc;

use anyhow::Context;
use sentinel_core::config::SentinelConfig;
use sentinel_core::corpus::StatutoryCorpus;
use sentinel_core::model::{AnalysisResult, ComplianceResult};
use sentinel_core::{Result, RuleCatalog, Segmenter};
use tracing::info;

use crate::aggregate::aggregate;
use crate::classifier::{Classifier, RuleScope};
use crate::compliance::validate;
use crate::composer::Composer;
use crate::extract::SalaryExtractor;
use crate::retrieval::Collection;
use crate::salary::{SalaryReport, analyze_salary};
use crate::session::Session;

/// Which analysis a document gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Risk classification against `risk` rules.
    #[default]
    General,
    /// Required-clause compliance against every rule.
    Hr,
    /// Compensation breakdown and the seven answers.
    Salary,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Hr => "hr",
            Self::Salary => "salary",
        }
    }
}

pub struct Analyzer {
    config: SentinelConfig,
    catalog: Arc<RuleCatalog>,
    law: Arc<Collection>,
    segmenter: Segmenter,
    extractor: SalaryExtractor,
    general: Classifier,
    hr: Classifier,
}

impl Analyzer {
    /// Load the catalog and corpus named in `config`, or the built-in ones.
    pub fn new(config: SentinelConfig) -> anyhow::Result<Self> {
        let catalog = match &config.catalog.path {
            Some(path) => RuleCatalog::load(path)
                .with_context(|| format!("loading rule catalog from {}", path.display()))?,
            None => RuleCatalog::builtin().context("loading built-in rule catalog")?,
        };
        let corpus = match &config.corpus.path {
            Some(path) => StatutoryCorpus::load(path)
                .with_context(|| format!("loading statutory corpus from {}", path.display()))?,
            None => StatutoryCorpus::builtin().context("loading built-in statutory corpus")?,
        };
        Self::from_parts(config, Arc::new(catalog), &corpus)
    }

    /// Built-in catalog and corpus with default settings.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::new(SentinelConfig::default())
    }

    pub fn from_parts(
        config: SentinelConfig,
        catalog: Arc<RuleCatalog>,
        corpus: &StatutoryCorpus,
    ) -> anyhow::Result<Self> {
        let extractor = SalaryExtractor::new()?;
        let law = Arc::new(Collection::from_corpus(corpus));
        info!(
            catalog = catalog.version(),
            rules = catalog.len(),
            law_sections = law.len(),
            "analyzer ready"
        );
        Ok(Self {
            segmenter: Segmenter::new(&config.segmenter),
            general: Classifier::new(catalog.clone(), RuleScope::RiskOnly),
            hr: Classifier::new(catalog.clone(), RuleScope::All),
            config,
            catalog,
            law,
            extractor,
        })
    }

    pub fn config(&self) -> &SentinelConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn law(&self) -> Arc<Collection> {
        self.law.clone()
    }

    /// General mode: segment, classify against risk rules, aggregate.
    pub fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        let clauses = self.segmenter.segment_document(text)?;
        let classified = self.general.classify_all(&clauses);
        Ok(aggregate(self.catalog.version(), classified))
    }

    /// HR mode: segment, classify against every rule, check required clauses.
    pub fn validate(&self, text: &str) -> Result<ComplianceResult> {
        let clauses = self.segmenter.segment_document(text)?;
        let classified = self.hr.classify_all(&clauses);
        Ok(validate(&self.catalog, classified))
    }

    /// Salary mode: extract compensation fields and evaluate them.
    pub fn salary(&self, text: &str) -> Result<SalaryReport> {
        let clean = self.segmenter.check_document(text)?;
        let fields = self.extractor.extract(&clean);
        Ok(analyze_salary(&fields))
    }

    /// An empty Q&A session sharing this analyzer's law collection.
    pub fn session(&self, composer: Composer) -> Session {
        Session::new(self.law.clone(), self.config.retrieval.clone(), composer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::salary::{PfStatus, Verdict};
    use sentinel_core::error::InputError;
    use sentinel_core::model::RiskLevel;
    use sentinel_core::SentinelError;

    fn analyzer() -> Analyzer {
        Analyzer::builtin().unwrap()
    }

    const EMPLOYMENT: &str = "\
1. The Employee shall be paid a monthly salary of Rs. 50,000 by bank transfer.

2. The Employee shall not engage in any competing business for two years after leaving.

3. A penalty of Rs. 1,00,000 shall be payable if the Employee resigns within one year.

4. The Employee shall work from the Company's office in Pune on weekdays.";

    #[test]
    fn single_non_compete_sentence() {
        let result = analyzer()
            .analyze("Employee shall not engage in any competing business for 2 years post-termination")
            .unwrap();
        assert_eq!(result.total_clauses_analyzed, 1);
        let clause = &result.all_clauses[0];
        let rule = clause.matched_rule.as_ref().unwrap();
        assert_eq!(rule.clause_type, "Non-Compete / Restraint of Trade");
        assert_eq!(rule.risk_score, 9);
        assert_eq!(clause.risk_level, Some(RiskLevel::High));
        assert!(rule.statutory_reference.contains("Section 27"));
    }

    #[test]
    fn benign_document_scores_zero() {
        let result = analyzer()
            .analyze(
                "The office of the Company is located in Bengaluru. \
                 Work is performed from the office on weekdays.",
            )
            .unwrap();
        assert_eq!(result.overall_risk_score, 0.0);
        assert_eq!(result.overall_risk_category, RiskLevel::Low);
        assert_eq!(result.risky_clauses_found, 0);
        assert!(result.total_clauses_analyzed >= 1);
    }

    #[test]
    fn general_analysis_counts_every_clause() {
        let result = analyzer().analyze(EMPLOYMENT).unwrap();
        assert_eq!(result.total_clauses_analyzed, 4);
        assert_eq!(result.risky_clauses_found, 2);
        assert!(result.risky_clauses_found <= result.total_clauses_analyzed);
        assert_eq!(result.overall_risk_score, 8.5);
        assert_eq!(result.overall_risk_category, RiskLevel::High);
        // Salary is a standard rule, so general mode leaves it unmatched.
        assert!(result.all_clauses[0].matched_rule.is_none());
    }

    #[test]
    fn short_numbered_items_are_classified_separately() {
        let result = analyzer()
            .analyze("1. Non-compete: 2 years\n2. Penalty: Rs 50,000\n3. Probation: six months")
            .unwrap();
        assert_eq!(result.total_clauses_analyzed, 3);
        let types: Vec<Option<&str>> = result
            .all_clauses
            .iter()
            .map(|c| c.matched_rule.as_ref().map(|r| r.type_id.as_str()))
            .collect();
        assert_eq!(types, [Some("non_compete"), Some("penalty"), None]);
        assert_eq!(result.risky_clauses_found, 2);
    }

    #[test]
    fn hr_mode_reports_missing_termination_clause() {
        let text = "\
1. This Agreement shall be governed by the laws of India.

2. The courts at Mumbai shall have exclusive jurisdiction.

3. Disputes shall be settled by arbitration in Mumbai.

4. The Employee shall keep all business information confidential.";
        let result = analyzer().validate(text).unwrap();
        assert_eq!(result.missing_clauses.len(), 1);
        assert_eq!(result.missing_clauses[0].clause_type, "Termination Clause");
        assert!(!result.missing_clauses[0].suggested_text.is_empty());
        assert_eq!(result.risk_level, RiskLevel::High);
    }

    #[test]
    fn salary_mode_checks_pf() {
        let report = analyzer()
            .salary(
                "Salary annexure\nMonthly CTC: Rs. 50,000\nEmployee PF: Rs. 6,000\n\
                 Professional Tax: Rs. 200",
            )
            .unwrap();
        assert_eq!(report.comparison_stats.pf_status, PfStatus::Correct);
        assert_eq!(report.salary_breakdown.in_hand_monthly, Some(43_800.0));
        assert_eq!(report.overall_verdict, Verdict::Good);
    }

    #[test]
    fn salary_mode_derives_annual_from_monthly_ctc() {
        let report = analyzer()
            .salary(
                "Salary annexure\nMonthly CTC: Rs. 1,50,000\nEmployee PF: Rs. 3,000\n\
                 Basic Salary: Rs. 25,000",
            )
            .unwrap();
        let b = &report.salary_breakdown;
        assert_eq!(b.ctc_monthly, Some(150_000.0));
        assert_eq!(b.ctc_annual, Some(1_800_000.0));
    }

    #[test]
    fn empty_and_short_documents_are_rejected() {
        let a = analyzer();
        assert!(matches!(
            a.analyze("   \n\t "),
            Err(SentinelError::Input(InputError::Empty))
        ));
        assert!(matches!(
            a.validate("Too short."),
            Err(SentinelError::Input(InputError::TooShort { .. }))
        ));
        assert!(matches!(
            a.salary("CTC: 12 LPA"),
            Err(SentinelError::Input(InputError::TooShort { .. }))
        ));
    }

    #[test]
    fn mode_names() {
        assert_eq!(Mode::default().as_str(), "general");
        assert_eq!(Mode::Hr.as_str(), "hr");
        assert_eq!(Mode::Salary.as_str(), "salary");
    }
}
