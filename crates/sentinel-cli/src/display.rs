//! Terminal rendering for analysis results.
//!
//! Header sections print as aligned key/value cards; clause, missing-clause
//! and rule listings go through Arrow's pretty table formatter.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use sentinel_ai::SalaryReport;
use sentinel_ai::salary::format_inr;
use sentinel_core::model::{AnalysisResult, AnswerRecord, ClassifiedClause, ComplianceResult};
use sentinel_core::{RuleCatalog, clauses};

/// Table cells longer than this are cut.
const MAX_CELL_CHARS: usize = 60;

// ── Public API ──

pub fn print_analysis(result: &AnalysisResult) -> anyhow::Result<()> {
    println!("=== Contract risk analysis ===");
    println!();
    println!("Summary");
    field("catalog", &result.catalog_version);
    field("clauses analyzed", &result.total_clauses_analyzed.to_string());
    field("risky clauses", &result.risky_clauses_found.to_string());
    field(
        "overall risk",
        &format!(
            "{} ({:.1}/10)",
            result.overall_risk_category.label(),
            result.overall_risk_score
        ),
    );
    println!();

    print_table("Clauses", clauses::clauses_to_batch(&result.all_clauses)?)?;
    print_risky_details(&result.risky_clauses);
    println!("{}", result.disclaimer);
    Ok(())
}

pub fn print_compliance(result: &ComplianceResult) -> anyhow::Result<()> {
    println!("=== HR compliance check ===");
    println!();
    println!("Summary");
    field("catalog", &result.catalog_version);
    field("clauses analyzed", &result.total_clauses.to_string());
    field("compliance score", &format!("{}/100", result.compliance_score));
    field("risk level", result.risk_level.label());
    println!("  {}", result.summary);
    println!();

    print_table("Clauses", clauses::clauses_to_batch(&result.clause_results)?)?;
    if !result.missing_clauses.is_empty() {
        print_table(
            "Missing clauses",
            clauses::missing_to_batch(&result.missing_clauses)?,
        )?;
        println!("Suggested text");
        for missing in &result.missing_clauses {
            println!("  {}:", missing.clause_type);
            println!("    {}", missing.suggested_text);
        }
        println!();
    }
    let risky: Vec<ClassifiedClause> = result.risky_clauses().cloned().collect();
    print_risky_details(&risky);
    println!("{}", result.disclaimer);
    Ok(())
}

pub fn print_salary(report: &SalaryReport) {
    let b = &report.salary_breakdown;
    let c = &report.comparison_stats;

    println!("=== Salary structure check ===");
    println!();
    println!("Breakdown");
    opt_field("ctc (annual)", b.ctc_annual.map(format_inr));
    opt_field("ctc (monthly)", b.ctc_monthly.map(format_inr));
    opt_field("basic salary", b.basic_salary.map(format_inr));
    opt_field("pf (employee)", b.pf_employee.map(format_inr));
    opt_field("pf (employer)", b.pf_employer.map(format_inr));
    for (name, amount) in &b.other_deductions {
        field(&name.replace('_', " "), &format_inr(*amount));
    }
    opt_field("in-hand (monthly)", b.in_hand_monthly.map(format_inr));
    opt_field("in-hand share", b.in_hand_percentage.map(|p| format!("{p:.1}%")));
    println!();

    println!("Comparison");
    field(
        "pf status",
        &match c.pf_rate {
            Some(rate) => format!("{} ({rate}%)", c.pf_status.as_str()),
            None => c.pf_status.as_str().to_string(),
        },
    );
    field("admin charges", c.admin_charges_status.as_str());
    println!();

    println!("Seven answers");
    for (name, answer) in report.seven_answers.iter() {
        println!("  {:<26} {}", name, answer.outcome.as_str());
        println!("    {}", answer.detail);
    }
    println!();
    field("verdict", report.overall_verdict.as_str());
    println!();
    println!("{}", report.disclaimer);
}

pub fn print_answer(record: &AnswerRecord) {
    println!("Q: {}", record.question);
    println!();
    println!("{}", record.answer);
    println!();
    if record.degraded {
        println!("(the language model was unavailable; this answer comes from the retrieved text)");
        println!();
    }

    let ctx = &record.context_used;
    if !ctx.contract_clauses_retrieved.is_empty() {
        println!("Contract passages");
        for hit in &ctx.contract_clauses_retrieved {
            println!("  {}. {}", hit.relevance_rank, hit.title);
        }
    }
    if !ctx.law_sections_retrieved.is_empty() {
        println!("Law sections");
        for hit in &ctx.law_sections_retrieved {
            println!("  {}. {}", hit.relevance_rank, hit.title);
        }
    }
    println!();
    println!("{}", record.disclaimer);
}

pub fn print_rules(catalog: &RuleCatalog) -> anyhow::Result<()> {
    println!(
        "=== Rule catalog {} ({}) ===",
        catalog.version(),
        catalog.jurisdiction().unwrap_or("unspecified")
    );
    println!();
    print_table("Rules (evaluation order)", clauses::rules_to_batch(catalog)?)
}

// ── Section rendering ──

fn field(name: &str, value: &str) {
    println!("  {:<26} {}", name, value);
}

fn opt_field(name: &str, value: Option<String>) {
    match value {
        Some(v) => field(name, &v),
        None => field(name, "-"),
    }
}

fn print_table(header: &str, batch: RecordBatch) -> anyhow::Result<()> {
    if batch.num_rows() == 0 {
        return Ok(());
    }
    let batch = shorten_text_columns(&batch)?;
    println!("{header}");
    println!("{}", pretty_format_batches(&[batch])?);
    println!();
    Ok(())
}

fn print_risky_details(risky: &[ClassifiedClause]) {
    if risky.is_empty() {
        return;
    }
    println!("Risky clauses");
    for clause in risky {
        let Some(rule) = &clause.matched_rule else {
            continue;
        };
        let level = clause.risk_level.map(|l| l.label()).unwrap_or("-");
        println!(
            "  [{}] {} ({}, {}/10)",
            clause.clause.index + 1,
            rule.clause_type,
            level,
            rule.risk_score
        );
        println!("    law: {}", rule.statutory_reference);
        println!(
            "    why: {}",
            rule.why_risky_simplified.as_deref().unwrap_or(&rule.why_risky)
        );
        for action in &rule.what_user_can_do {
            println!("    - {action}");
        }
        if !rule.safer_rewrite.is_empty() {
            println!("    safer wording: {}", rule.safer_rewrite);
        }
    }
    println!();
}

// ── Helpers ──

/// Copy of `batch` with every string cell cut to `MAX_CELL_CHARS`.
fn shorten_text_columns(batch: &RecordBatch) -> anyhow::Result<RecordBatch> {
    let columns: Vec<ArrayRef> = batch
        .columns()
        .iter()
        .map(|col| match col.as_any().downcast_ref::<StringArray>() {
            Some(strings) => {
                let short: StringArray = (0..strings.len())
                    .map(|i| col_str(strings, i).map(|s| shorten(s, MAX_CELL_CHARS)))
                    .collect();
                Arc::new(short) as ArrayRef
            }
            None => col.clone(),
        })
        .collect();
    Ok(RecordBatch::try_new(batch.schema(), columns)?)
}

fn col_str(col: &StringArray, i: usize) -> Option<&str> {
    if col.is_null(i) {
        return None;
    }
    Some(col.value(i))
}

fn shorten(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars.saturating_sub(3)) {
        Some((cut, _)) if s.chars().count() > max_chars => format!("{}...", &s[..cut]),
        _ => s.to_string(),
    }
}
