//! A Q&A session over the most recently analyzed document.
//!
//! Loading a result replaces whatever the session held before. Asking before
//! anything is loaded fails with `NotReady`.

use std::sync::Arc;

use sentinel_core::config::RetrievalConfig;
use sentinel_core::model::{AnalysisResult, AnswerRecord, ComplianceResult, PassageSource};
use sentinel_core::{Result, SentinelError};
use tracing::info;

use crate::composer::{Composer, summarize_risky};
use crate::pipeline::Mode;
use crate::retrieval::{Collection, Passage, RetrievalIndex, Retrieved};
use crate::salary::{Outcome, SalaryReport, format_inr};

struct Loaded {
    mode: Mode,
    index: RetrievalIndex,
    risky_summary: String,
}

pub struct Session {
    law: Arc<Collection>,
    retrieval: RetrievalConfig,
    composer: Composer,
    loaded: Option<Loaded>,
}

impl Session {
    pub fn new(law: Arc<Collection>, retrieval: RetrievalConfig, composer: Composer) -> Self {
        Self {
            law,
            retrieval,
            composer,
            loaded: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.loaded.is_some()
    }

    /// Mode of the loaded document, if any.
    pub fn mode(&self) -> Option<Mode> {
        self.loaded.as_ref().map(|l| l.mode)
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn load_analysis(&mut self, result: &AnalysisResult) {
        let contract = Collection::from_clauses(&result.all_clauses);
        self.load(Mode::General, contract, summarize_risky(&result.all_clauses));
    }

    pub fn load_compliance(&mut self, result: &ComplianceResult) {
        let contract = Collection::from_clauses(&result.clause_results);
        let mut summary = summarize_risky(&result.clause_results);
        if !result.missing_clauses.is_empty() {
            let names: Vec<&str> = result
                .missing_clauses
                .iter()
                .map(|m| m.clause_type.as_str())
                .collect();
            summary.push_str(&format!("\nMissing required clauses: {}.", names.join(", ")));
        }
        self.load(Mode::Hr, contract, summary);
    }

    pub fn load_salary(&mut self, report: &SalaryReport) {
        let contract = Collection::new(PassageSource::Contract, salary_facts(report));
        let failed: Vec<&str> = report
            .seven_answers
            .iter()
            .filter(|(_, a)| a.outcome == Outcome::Fail)
            .map(|(name, _)| name)
            .collect();
        let summary = if failed.is_empty() {
            format!(
                "Salary verdict: {}. No checks failed.",
                report.overall_verdict.as_str()
            )
        } else {
            format!(
                "Salary verdict: {}. Failed checks: {}.",
                report.overall_verdict.as_str(),
                failed.join(", ")
            )
        };
        self.load(Mode::Salary, contract, summary);
    }

    fn load(&mut self, mode: Mode, contract: Collection, risky_summary: String) {
        info!(mode = mode.as_str(), passages = contract.len(), "session loaded");
        self.loaded = Some(Loaded {
            mode,
            index: RetrievalIndex::new(contract, self.law.clone(), &self.retrieval),
            risky_summary,
        });
    }

    /// Passages for `question` from the loaded document and the law corpus.
    pub fn retrieve(&self, question: &str) -> Result<Retrieved> {
        let loaded = self.loaded.as_ref().ok_or(SentinelError::NotReady)?;
        Ok(loaded.index.retrieve(question))
    }

    /// Retrieve, then compose an answer. Generator trouble degrades the
    /// answer; only a missing document is an error.
    pub async fn ask(&self, question: &str) -> Result<AnswerRecord> {
        let loaded = self.loaded.as_ref().ok_or(SentinelError::NotReady)?;
        let retrieved = loaded.index.retrieve(question);
        Ok(self
            .composer
            .answer(question, retrieved, loaded.risky_summary.clone())
            .await)
    }
}

/// One retrievable line per known salary figure and check.
pub fn salary_facts(report: &SalaryReport) -> Vec<Passage> {
    let b = &report.salary_breakdown;
    let c = &report.comparison_stats;
    let mut facts: Vec<(String, String)> = Vec::new();

    if let Some(annual) = b.ctc_annual {
        let monthly = b
            .ctc_monthly
            .map(|m| format!(" ({} per month)", format_inr(m)))
            .unwrap_or_default();
        facts.push(("CTC".into(), format!("CTC: {} per year{monthly}", format_inr(annual))));
    }
    if let Some(basic) = b.basic_salary {
        facts.push((
            "Basic salary".into(),
            format!("Basic salary: {} per month", format_inr(basic)),
        ));
    }
    if let Some(pf) = b.pf_employee {
        let rate = c.pf_rate.map(|r| format!(" ({r}%)")).unwrap_or_default();
        facts.push((
            "Employee PF".into(),
            format!(
                "Employee provident fund (PF) contribution: {} per month{rate}, status {}",
                format_inr(pf),
                c.pf_status.as_str()
            ),
        ));
    }
    if let Some(pf) = b.pf_employer {
        facts.push((
            "Employer PF".into(),
            format!(
                "Employer provident fund (PF) contribution: {} per month",
                format_inr(pf)
            ),
        ));
    }
    for (name, amount) in &b.other_deductions {
        let label = name.replace('_', " ");
        facts.push((
            label.clone(),
            format!("Deduction {label}: {} per month", format_inr(*amount)),
        ));
    }
    facts.push((
        "Admin charges".into(),
        format!(
            "Admin charges status: {} ({} per month)",
            c.admin_charges_status.as_str(),
            format_inr(c.admin_charges)
        ),
    ));
    if let Some(in_hand) = b.in_hand_monthly {
        let pct = b
            .in_hand_percentage
            .map(|p| format!(" ({p}% of monthly CTC)"))
            .unwrap_or_default();
        facts.push((
            "In-hand".into(),
            format!("In-hand salary: {} per month{pct}", format_inr(in_hand)),
        ));
    }
    for (name, answer) in report.seven_answers.iter() {
        facts.push((
            name.replace('_', " "),
            format!("{}: {} {}", name.replace('_', " "), answer.outcome.as_str(), answer.detail),
        ));
    }
    facts.push((
        "Verdict".into(),
        format!("Overall salary verdict: {}", report.overall_verdict.as_str()),
    ));

    facts
        .into_iter()
        .map(|(title, text)| Passage { title, text })
        .collect()
}
