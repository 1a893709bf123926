//! Grounded answers: retrieved passages in, one generator round trip, an
//! `AnswerRecord` out.
//!
//! Generator failures never reach the caller. A missing generator yields a
//! fallback answer built from the top contract passage; a failing or slow one
//! yields a degraded answer that says so.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sentinel_core::config::GeneratorConfig;
use sentinel_core::model::{AnswerRecord, ClassifiedClause, ContextUsed, DISCLAIMER, RuleMatch};
use tracing::{debug, info, warn};

use crate::generator::{GenerateError, GenerateRequest, Generated, Generator};
use crate::retrieval::Retrieved;

// ── Prompt templates ──

pub const SYSTEM_PROMPT: &str = "\
You are a friendly legal explainer who helps ordinary people understand Indian employment and \
freelance contracts in plain English.

Answer ONLY from the contract passages, law sections and risky-clause notes you are given. \
If they do not answer the question, say that the contract does not cover it.

- Start with the direct answer (\"Yes, ...\", \"No, ...\", \"The notice period is ...\").
- Explain what the clause means for the reader in practice. Do not recite it.
- Do not quote the contract. Paraphrase.
- Keep it to two or three sentences unless the question needs more.
- Mention a law section only if it appears in the context.";

const SIMPLIFY_PROMPT: &str = "\
You rewrite contract risk explanations for an Indian freelancer with no legal background.

Rewrite the explanation in two or three simple, conversational sentences. Keep the same meaning. \
Do not add legal interpretations, do not change the risk level and do not mention any law other \
than the one given. Respond with the rewritten explanation only.";

/// Shortest rewrite accepted from the generator.
const MIN_SIMPLIFIED_CHARS: usize = 20;
/// Clause text is cut to this many characters in the risky summary.
const SUMMARY_EXCERPT_CHARS: usize = 200;

const NO_CONTRACT_CONTEXT: &str = "No relevant contract clauses found.";
const NO_LAW_CONTEXT: &str = "No relevant law sections found.";
const NO_RISKY_CLAUSES: &str = "No risky clauses detected in this contract.";

pub fn build_user_prompt(question: &str, retrieved: &Retrieved, risky_summary: &str) -> String {
    let contract = if retrieved.contract.is_empty() {
        NO_CONTRACT_CONTEXT.to_string()
    } else {
        retrieved
            .contract
            .iter()
            .map(|h| format!("{}: {}", h.title, h.passage_text))
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    let law = if retrieved.law.is_empty() {
        NO_LAW_CONTEXT.to_string()
    } else {
        retrieved
            .law
            .iter()
            .map(|h| format!("{}\n{}", h.title, h.passage_text))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "### CONTRACT PASSAGES\n\
         {contract}\n\
         \n\
         ### RELEVANT INDIAN LAW\n\
         {law}\n\
         \n\
         ### RISKY CLAUSES\n\
         {risky_summary}\n\
         \n\
         ### QUESTION\n\
         {question}"
    )
}

fn build_simplify_prompt(rule: &RuleMatch) -> String {
    format!(
        "Clause type: {clause_type}\n\
         Risk score: {score}/10 (do not change)\n\
         Law reference: {reference}\n\
         Original explanation: {explanation}",
        clause_type = rule.clause_type,
        score = rule.risk_score,
        reference = rule.statutory_reference,
        explanation = rule.why_risky,
    )
}

/// Plain-text digest of the risky clauses, fed to the prompt and echoed in
/// `context_used`.
pub fn summarize_risky(clauses: &[ClassifiedClause]) -> String {
    let risky: Vec<&ClassifiedClause> = clauses.iter().filter(|c| c.is_risky()).collect();
    if risky.is_empty() {
        return NO_RISKY_CLAUSES.to_string();
    }

    let mut summary = format!("Found {} risky clauses:\n", risky.len());
    for (i, clause) in risky.iter().enumerate() {
        let Some(rule) = &clause.matched_rule else {
            continue;
        };
        let level = clause.risk_level.map(|l| l.as_str()).unwrap_or("UNKNOWN");
        let why = rule.why_risky_simplified.as_deref().unwrap_or(&rule.why_risky);
        summary.push_str(&format!(
            "\nRisky Clause {n}:\nType: {ty}\nRisk Level: {level} ({score}/10)\nWhy: {why}\nLaw: {law}\nText: \"{text}\"\n",
            n = i + 1,
            ty = rule.clause_type,
            score = rule.risk_score,
            law = rule.statutory_reference,
            text = excerpt(&clause.clause.text, SUMMARY_EXCERPT_CHARS),
        ));
    }
    summary
}

fn excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

// ── Fallback answers ──

fn fallback_answer(question: &str, retrieved: &Retrieved) -> String {
    match retrieved.contract.first() {
        Some(top) => format!(
            "AI answers are not enabled, so here is the passage of your contract that best \
             matches \"{question}\":\n\n{}: {}",
            top.title, top.passage_text
        ),
        None => format!(
            "AI answers are not enabled, and no part of your contract matches \"{question}\"."
        ),
    }
}

fn degraded_answer(question: &str, retrieved: &Retrieved, err: &GenerateError) -> String {
    let reason = match err {
        GenerateError::Timeout(_) => "the language model took too long to respond",
        GenerateError::QuotaExhausted => "the language model's usage quota is used up",
        _ => "the language model could not be reached",
    };
    match retrieved.contract.first() {
        Some(top) => format!(
            "Sorry, a full answer is not available because {reason}. The passage of your \
             contract that best matches \"{question}\" is:\n\n{}: {}",
            top.title, top.passage_text
        ),
        None => format!(
            "Sorry, a full answer is not available because {reason}, and no part of your \
             contract matches \"{question}\"."
        ),
    }
}

// ── Composer ──

/// Builds prompts, calls the generator under a timeout, and wraps the result.
#[derive(Clone)]
pub struct Composer {
    generator: Option<Arc<dyn Generator>>,
    timeout: Duration,
    max_output_tokens: u32,
    temperature: f32,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("model", &self.generator.as_ref().map(|g| g.model().to_string()))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Composer {
    pub fn new(generator: Option<Arc<dyn Generator>>, config: &GeneratorConfig) -> Self {
        Self {
            generator,
            timeout: Duration::from_secs(config.timeout_secs),
            max_output_tokens: config.max_output_tokens,
            temperature: config.temperature,
        }
    }

    /// A composer with no generator: every answer is a fallback.
    pub fn offline() -> Self {
        Self::new(None, &GeneratorConfig::default())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn ai_enabled(&self) -> bool {
        self.generator.is_some()
    }

    /// Answer a question from retrieved passages. Never fails.
    pub async fn answer(
        &self,
        question: &str,
        retrieved: Retrieved,
        risky_summary: String,
    ) -> AnswerRecord {
        let (answer, degraded) = match &self.generator {
            None => (fallback_answer(question, &retrieved), false),
            Some(generator) => {
                let request = GenerateRequest::new(
                    SYSTEM_PROMPT,
                    build_user_prompt(question, &retrieved, &risky_summary),
                )
                .with_limits(self.max_output_tokens, self.temperature);

                match self.call(generator.as_ref(), &request).await {
                    Ok(generated) if !generated.text.trim().is_empty() => {
                        info!(model = %generated.model, chars = generated.text.len(), "answer generated");
                        (generated.text.trim().to_string(), false)
                    }
                    Ok(_) => {
                        let err = GenerateError::Malformed("empty answer".into());
                        warn!(error = %err, "generator returned nothing, answering from context");
                        (degraded_answer(question, &retrieved, &err), true)
                    }
                    Err(err) => {
                        warn!(error = %err, "generator failed, answering from context");
                        (degraded_answer(question, &retrieved, &err), true)
                    }
                }
            }
        };

        AnswerRecord {
            question: question.to_string(),
            answer,
            ai_enabled: self.ai_enabled(),
            degraded,
            context_used: ContextUsed {
                law_sections_retrieved: retrieved.law,
                contract_clauses_retrieved: retrieved.contract,
                risky_clauses_summary: risky_summary,
            },
            disclaimer: DISCLAIMER.to_string(),
            answered_at: Utc::now(),
        }
    }

    /// Ask the generator for a plainer `why_risky`. Score, level and citation
    /// are left alone; any failure leaves the match unchanged.
    pub async fn simplify_explanation(&self, rule: &mut RuleMatch) {
        let Some(generator) = &self.generator else {
            return;
        };
        let request = GenerateRequest::new(SIMPLIFY_PROMPT, build_simplify_prompt(rule))
            .with_limits(self.max_output_tokens.min(256), self.temperature);

        match self.call(generator.as_ref(), &request).await {
            Ok(generated) => {
                let text = generated.text.trim();
                if text.chars().count() > MIN_SIMPLIFIED_CHARS {
                    rule.why_risky_simplified = Some(text.to_string());
                } else {
                    debug!(rule = %rule.type_id, "simplified explanation too short, keeping original");
                }
            }
            Err(err) => {
                warn!(rule = %rule.type_id, error = %err, "explanation simplification failed");
            }
        }
    }

    /// Simplify every matched rule in place.
    pub async fn simplify_all(&self, clauses: &mut [ClassifiedClause]) {
        if !self.ai_enabled() {
            return;
        }
        for clause in clauses.iter_mut() {
            if let Some(rule) = clause.matched_rule.as_mut() {
                self.simplify_explanation(rule).await;
            }
        }
    }

    async fn call(
        &self,
        generator: &dyn Generator,
        request: &GenerateRequest,
    ) -> Result<Generated, GenerateError> {
        match tokio::time::timeout(self.timeout, generator.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(GenerateError::Timeout(self.timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sentinel_core::model::{Clause, ComplianceStatus, PassageSource, RetrievalHit, RiskLevel};

    struct Echo;

    #[async_trait]
    impl Generator for Echo {
        fn model(&self) -> &str {
            "echo"
        }

        async fn generate(&self, request: &GenerateRequest) -> Result<Generated, GenerateError> {
            Ok(Generated {
                text: format!("ECHO {}", request.prompt),
                model: "echo".into(),
            })
        }
    }

    struct Failing;

    #[async_trait]
    impl Generator for Failing {
        fn model(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _: &GenerateRequest) -> Result<Generated, GenerateError> {
            Err(GenerateError::Server {
                status: 500,
                body: "boom".into(),
            })
        }
    }

    struct Slow;

    #[async_trait]
    impl Generator for Slow {
        fn model(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _: &GenerateRequest) -> Result<Generated, GenerateError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Generated {
                text: "too late".into(),
                model: "slow".into(),
            })
        }
    }

    fn composer(generator: impl Generator + 'static) -> Composer {
        Composer::new(Some(Arc::new(generator)), &GeneratorConfig::default())
    }

    fn hit(source: PassageSource, title: &str, text: &str) -> RetrievalHit {
        RetrievalHit {
            source,
            title: title.into(),
            passage_text: text.into(),
            relevance_rank: 1,
            score: 1.0,
        }
    }

    fn retrieved() -> Retrieved {
        Retrieved {
            contract: vec![hit(
                PassageSource::Contract,
                "Clause 4",
                "The notice period is 90 days.",
            )],
            law: vec![hit(
                PassageSource::Law,
                "Section 27 - Agreement in restraint of trade",
                "Every agreement by which anyone is restrained ... is void.",
            )],
        }
    }

    fn rule() -> RuleMatch {
        RuleMatch {
            type_id: "penalty".into(),
            clause_type: "Penalty Clause".into(),
            risk_score: 8,
            statutory_reference: "Section 74, Indian Contract Act, 1872".into(),
            why_risky: "Penalties beyond actual loss are not enforceable.".into(),
            what_user_can_do: vec![],
            safer_rewrite: String::new(),
            why_risky_simplified: None,
        }
    }

    #[test]
    fn prompt_carries_context_and_question() {
        let prompt = build_user_prompt("How long is notice?", &retrieved(), "none");
        assert!(prompt.contains("Clause 4: The notice period is 90 days."));
        assert!(prompt.contains("Section 27 - Agreement in restraint of trade"));
        assert!(prompt.ends_with("### QUESTION\nHow long is notice?"));
    }

    #[test]
    fn prompt_marks_empty_context() {
        let prompt = build_user_prompt("anything", &Retrieved::default(), NO_RISKY_CLAUSES);
        assert!(prompt.contains(NO_CONTRACT_CONTEXT));
        assert!(prompt.contains(NO_LAW_CONTEXT));
    }

    #[test]
    fn risky_summary_lists_only_risky_clauses() {
        let risky = ClassifiedClause {
            clause: Clause::new(0, "A penalty of Rs. 1,00,000 applies."),
            matched_rule: Some(rule()),
            risk_level: Some(RiskLevel::High),
            status: ComplianceStatus::Risky,
            triggered: vec!["penalty".into()],
        };
        let benign = ClassifiedClause::benign(Clause::new(1, "Salary is paid monthly."));
        let summary = summarize_risky(&[risky, benign]);
        assert!(summary.starts_with("Found 1 risky clauses:"));
        assert!(summary.contains("Risk Level: HIGH (8/10)"));
        assert!(!summary.contains("Salary"));
        assert_eq!(summarize_risky(&[]), NO_RISKY_CLAUSES);
    }

    #[test]
    fn excerpt_cuts_on_char_boundaries() {
        assert_eq!(excerpt("₹₹₹₹", 2), "₹₹...");
        assert_eq!(excerpt("short", 10), "short");
    }

    #[tokio::test]
    async fn offline_answer_cites_top_contract_passage() {
        let record = Composer::offline()
            .answer("What is the notice period?", retrieved(), "none".into())
            .await;
        assert!(!record.ai_enabled);
        assert!(!record.degraded);
        assert!(record.answer.contains("The notice period is 90 days."));
        assert_eq!(record.disclaimer, DISCLAIMER);
        assert_eq!(record.context_used.contract_clauses_retrieved.len(), 1);
        assert_eq!(record.context_used.law_sections_retrieved.len(), 1);
    }

    #[tokio::test]
    async fn generated_answer_is_returned() {
        let record = composer(Echo)
            .answer("How long is notice?", retrieved(), "none".into())
            .await;
        assert!(record.ai_enabled);
        assert!(!record.degraded);
        assert!(record.answer.starts_with("ECHO ### CONTRACT PASSAGES"));
        assert!(record.answer.contains("How long is notice?"));
    }

    #[tokio::test]
    async fn generator_failure_degrades_without_error() {
        let record = composer(Failing)
            .answer("How long is notice?", retrieved(), "none".into())
            .await;
        assert!(record.ai_enabled);
        assert!(record.degraded);
        assert!(record.answer.contains("could not be reached"));
        assert!(record.answer.contains("Clause 4"));
        assert!(!record.answer.contains("boom"));
    }

    #[tokio::test]
    async fn slow_generator_times_out() {
        let record = composer(Slow)
            .with_timeout(Duration::from_millis(20))
            .answer("How long is notice?", Retrieved::default(), "none".into())
            .await;
        assert!(record.degraded);
        assert!(record.answer.contains("took too long"));
    }

    #[tokio::test]
    async fn simplification_keeps_score_and_citation() {
        let mut r = rule();
        composer(Echo).simplify_explanation(&mut r).await;
        assert!(r.why_risky_simplified.as_deref().unwrap().starts_with("ECHO"));
        assert_eq!(r.risk_score, 8);
        assert_eq!(r.statutory_reference, "Section 74, Indian Contract Act, 1872");
        assert_eq!(r.why_risky, "Penalties beyond actual loss are not enforceable.");
    }

    #[tokio::test]
    async fn simplification_falls_back_silently() {
        let mut r = rule();
        composer(Failing).simplify_explanation(&mut r).await;
        assert!(r.why_risky_simplified.is_none());

        Composer::offline().simplify_explanation(&mut r).await;
        assert!(r.why_risky_simplified.is_none());
    }
}
