//! Salary analysis: breakdown, comparison against statutory rates, the seven
//! answers, and an overall verdict.
//!
//! Everything here is plain arithmetic over [`SalaryFields`]. A judgment that
//! needs a field the document did not state reports
//! [`Outcome::InsufficientData`] rather than assuming zero.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sentinel_core::DISCLAIMER;
use tracing::info;

/// Statutory employee PF rate, percent of basic wages.
pub const STANDARD_PF_RATE: f64 = 12.0;
/// Allowed deviation from the statutory rate, in percentage points.
pub const PF_TOLERANCE: f64 = 0.1;
/// Admin charges above this (per month) are flagged HIGH.
pub const ADMIN_CHARGE_LIMIT: f64 = 500.0;

/// Monthly unless the name says otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalaryFields {
    pub ctc_annual: Option<f64>,
    pub ctc_monthly: Option<f64>,
    pub basic_monthly: Option<f64>,
    pub pf_employee: Option<f64>,
    pub pf_employer: Option<f64>,
    pub professional_tax: Option<f64>,
    pub esi: Option<f64>,
    pub admin_charges: Option<f64>,
    pub in_hand_monthly: Option<f64>,
}

impl SalaryFields {
    fn other_deductions(&self) -> BTreeMap<String, f64> {
        [
            ("professional_tax", self.professional_tax),
            ("esi", self.esi),
            ("admin_charges", self.admin_charges),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.map(|v| (name.to_string(), v)))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryBreakdown {
    pub ctc_annual: Option<f64>,
    pub ctc_monthly: Option<f64>,
    pub basic_salary: Option<f64>,
    pub pf_employee: Option<f64>,
    pub pf_employer: Option<f64>,
    pub other_deductions: BTreeMap<String, f64>,
    pub in_hand_monthly: Option<f64>,
    pub in_hand_percentage: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PfStatus {
    Correct,
    High,
    Low,
    Unknown,
}

impl PfStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Correct => "CORRECT",
            Self::High => "HIGH",
            Self::Low => "LOW",
            Self::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminChargesStatus {
    High,
    Acceptable,
    #[serde(rename = "NONE")]
    NotCharged,
}

impl AdminChargesStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Acceptable => "ACCEPTABLE",
            Self::NotCharged => "NONE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonStats {
    /// Employee PF as a percentage of its base, two decimals.
    pub pf_rate: Option<f64>,
    pub pf_status: PfStatus,
    pub admin_charges: f64,
    pub admin_charges_status: AdminChargesStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Pass,
    Warn,
    Fail,
    InsufficientData,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Warn => "WARN",
            Self::Fail => "FAIL",
            Self::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub outcome: Outcome,
    pub detail: String,
}

impl Answer {
    fn new(outcome: Outcome, detail: impl Into<String>) -> Self {
        Self {
            outcome,
            detail: detail.into(),
        }
    }

    fn insufficient(what: &str) -> Self {
        Self::new(
            Outcome::InsufficientData,
            format!("Insufficient data: the document does not state {what}. Please verify with HR."),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SevenAnswers {
    pub pf_correct: Answer,
    pub deductions_comparison: Answer,
    pub ctc_vs_inhand: Answer,
    pub legally_wrong: Answer,
    pub ethically_questionable: Answer,
    pub company_should_do: Answer,
    pub employee_should_know: Answer,
}

impl SevenAnswers {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Answer)> {
        [
            ("pf_correct", &self.pf_correct),
            ("deductions_comparison", &self.deductions_comparison),
            ("ctc_vs_inhand", &self.ctc_vs_inhand),
            ("legally_wrong", &self.legally_wrong),
            ("ethically_questionable", &self.ethically_questionable),
            ("company_should_do", &self.company_should_do),
            ("employee_should_know", &self.employee_should_know),
        ]
        .into_iter()
    }

    pub fn failures(&self) -> usize {
        self.iter().filter(|(_, a)| a.outcome == Outcome::Fail).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Good,
    Questionable,
    NeedsReview,
}

impl Verdict {
    pub fn from_failures(failures: usize) -> Self {
        match failures {
            0 => Self::Good,
            1 => Self::Questionable,
            _ => Self::NeedsReview,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Questionable => "QUESTIONABLE",
            Self::NeedsReview => "NEEDS_REVIEW",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryReport {
    pub salary_breakdown: SalaryBreakdown,
    pub comparison_stats: ComparisonStats,
    pub seven_answers: SevenAnswers,
    pub overall_verdict: Verdict,
    pub disclaimer: String,
    pub analyzed_at: DateTime<Utc>,
}

/// Analyze extracted compensation fields.
pub fn analyze_salary(fields: &SalaryFields) -> SalaryReport {
    let breakdown = breakdown(fields);
    let comparison = compare(&breakdown);
    let seven_answers = seven_answers(&breakdown, &comparison);
    let overall_verdict = Verdict::from_failures(seven_answers.failures());

    info!(
        pf_status = comparison.pf_status.as_str(),
        admin = comparison.admin_charges_status.as_str(),
        failures = seven_answers.failures(),
        verdict = overall_verdict.as_str(),
        "salary analysis complete"
    );

    SalaryReport {
        salary_breakdown: breakdown,
        comparison_stats: comparison,
        seven_answers,
        overall_verdict,
        disclaimer: DISCLAIMER.to_string(),
        analyzed_at: Utc::now(),
    }
}

/// Fill derivable fields: monthly/annual CTC from each other, and in-hand
/// from CTC minus deductions when it was not declared.
pub fn breakdown(fields: &SalaryFields) -> SalaryBreakdown {
    let ctc_monthly = fields.ctc_monthly.or(fields.ctc_annual.map(|a| a / 12.0));
    let ctc_annual = fields.ctc_annual.or(fields.ctc_monthly.map(|m| m * 12.0));
    let other_deductions = fields.other_deductions();

    let in_hand_monthly = fields.in_hand_monthly.or_else(|| {
        let ctc = ctc_monthly?;
        let pf = fields.pf_employee?;
        Some(round_to(ctc - pf - other_deductions.values().sum::<f64>(), 2))
    });
    let in_hand_percentage = match (in_hand_monthly, ctc_monthly) {
        (Some(in_hand), Some(ctc)) if ctc > 0.0 => Some(round_to(in_hand / ctc * 100.0, 1)),
        _ => None,
    };

    SalaryBreakdown {
        ctc_annual,
        ctc_monthly: ctc_monthly.map(|m| round_to(m, 2)),
        basic_salary: fields.basic_monthly,
        pf_employee: fields.pf_employee,
        pf_employer: fields.pf_employer,
        other_deductions,
        in_hand_monthly,
        in_hand_percentage,
    }
}

/// PF rate against the statutory 12%, and admin charges against the limit.
/// The PF base is basic salary when known, otherwise monthly CTC.
pub fn compare(breakdown: &SalaryBreakdown) -> ComparisonStats {
    let base = breakdown.basic_salary.or(breakdown.ctc_monthly);
    let pf_rate = match (breakdown.pf_employee, base) {
        (Some(pf), Some(base)) if base > 0.0 && pf > 0.0 => Some(round_to(pf / base * 100.0, 2)),
        _ => None,
    };
    let pf_status = match pf_rate {
        None => PfStatus::Unknown,
        Some(rate) if (rate - STANDARD_PF_RATE).abs() <= PF_TOLERANCE => PfStatus::Correct,
        Some(rate) if rate > STANDARD_PF_RATE => PfStatus::High,
        Some(_) => PfStatus::Low,
    };

    let admin_charges = breakdown
        .other_deductions
        .get("admin_charges")
        .copied()
        .unwrap_or(0.0);
    let admin_charges_status = if admin_charges > ADMIN_CHARGE_LIMIT {
        AdminChargesStatus::High
    } else if admin_charges > 0.0 {
        AdminChargesStatus::Acceptable
    } else {
        AdminChargesStatus::NotCharged
    };

    ComparisonStats {
        pf_rate,
        pf_status,
        admin_charges,
        admin_charges_status,
    }
}

pub fn seven_answers(b: &SalaryBreakdown, c: &ComparisonStats) -> SevenAnswers {
    let total_deductions = b
        .pf_employee
        .map(|pf| pf + b.other_deductions.values().sum::<f64>())
        .or_else(|| {
            (!b.other_deductions.is_empty()).then(|| b.other_deductions.values().sum::<f64>())
        });
    let deduction_pct = match (total_deductions, b.ctc_monthly) {
        (Some(d), Some(ctc)) if ctc > 0.0 => Some(d / ctc * 100.0),
        _ => None,
    };

    SevenAnswers {
        pf_correct: pf_correct(c),
        deductions_comparison: deductions_comparison(deduction_pct),
        ctc_vs_inhand: ctc_vs_inhand(b),
        legally_wrong: legally_wrong(c),
        ethically_questionable: ethically_questionable(b, c),
        company_should_do: company_should_do(b, c),
        employee_should_know: employee_should_know(b, c, total_deductions, deduction_pct),
    }
}

fn pf_correct(c: &ComparisonStats) -> Answer {
    match (c.pf_status, c.pf_rate) {
        (PfStatus::Correct, Some(rate)) => Answer::new(
            Outcome::Pass,
            format!(
                "Yes. PF is deducted at {rate}%, the statutory rate in India (12% employee + 12% employer)."
            ),
        ),
        (PfStatus::High, Some(rate)) => Answer::new(
            Outcome::Fail,
            format!("No. PF is deducted at {rate}%, higher than the statutory 12%. This is unusual and may be incorrect."),
        ),
        (PfStatus::Low, Some(rate)) => Answer::new(
            Outcome::Fail,
            format!("No. PF is deducted at {rate}%, lower than the statutory 12%. Check whether this is intentional."),
        ),
        _ => Answer::insufficient("the PF deduction or the salary it is based on"),
    }
}

fn deductions_comparison(deduction_pct: Option<f64>) -> Answer {
    let Some(pct) = deduction_pct else {
        return Answer::insufficient("the monthly CTC and deductions");
    };
    if pct < 15.0 {
        Answer::new(
            Outcome::Pass,
            format!("Normal. Total deductions are {pct:.1}% of CTC, within the usual range."),
        )
    } else if pct < 25.0 {
        Answer::new(
            Outcome::Warn,
            format!("Slightly high. Total deductions are {pct:.1}% of CTC; 12-20% is typical."),
        )
    } else {
        Answer::new(
            Outcome::Fail,
            format!("High. Total deductions are {pct:.1}% of CTC, well above the typical 12-20%."),
        )
    }
}

fn ctc_vs_inhand(b: &SalaryBreakdown) -> Answer {
    let (Some(pct), Some(in_hand), Some(ctc)) =
        (b.in_hand_percentage, b.in_hand_monthly, b.ctc_monthly)
    else {
        return Answer::insufficient("both the CTC and the in-hand amount");
    };
    let lead = format!(
        "You receive about {pct:.1}% of your CTC in hand ({} per month from {} monthly CTC).",
        format_inr(in_hand),
        format_inr(ctc)
    );
    if pct >= 75.0 {
        Answer::new(Outcome::Pass, format!("{lead} This is a fair in-hand amount."))
    } else if pct >= 65.0 {
        Answer::new(Outcome::Warn, format!("{lead} This is average for Indian employers."))
    } else {
        Answer::new(
            Outcome::Fail,
            format!("{lead} This is low; much of the CTC goes to deductions and employer contributions."),
        )
    }
}

fn legally_wrong(c: &ComparisonStats) -> Answer {
    match c.pf_status {
        PfStatus::High => Answer::new(
            Outcome::Fail,
            "Potential issue: the PF deduction exceeds the statutory rate. Consult HR or a labour law expert.",
        ),
        PfStatus::Unknown => Answer::insufficient("the PF deduction"),
        PfStatus::Correct | PfStatus::Low => Answer::new(
            Outcome::Pass,
            "No statutory violation is apparent from the stated figures.",
        ),
    }
}

fn ethically_questionable(b: &SalaryBreakdown, c: &ComparisonStats) -> Answer {
    let mut issues = Vec::new();
    if c.admin_charges_status == AdminChargesStatus::High {
        issues.push(format!(
            "high admin charges ({} per month)",
            format_inr(c.admin_charges)
        ));
    }
    if b.in_hand_percentage.is_some_and(|p| p < 65.0) {
        issues.push("a low in-hand share of CTC".to_string());
    }

    if !issues.is_empty() {
        return Answer::new(
            Outcome::Fail,
            format!(
                "Yes: {}. This may be legal but it reduces your take-home pay significantly.",
                issues.join(" and ")
            ),
        );
    }
    if b.in_hand_percentage.is_none() {
        return Answer::insufficient("the in-hand amount");
    }
    Answer::new(Outcome::Pass, "No. The salary structure appears fair and transparent.")
}

fn company_should_do(b: &SalaryBreakdown, c: &ComparisonStats) -> Answer {
    let mut suggestions = Vec::new();
    if c.admin_charges_status == AdminChargesStatus::High {
        suggestions.push("reduce admin charges to about ₹200-300 per month".to_string());
    }
    match c.pf_status {
        PfStatus::High => suggestions.push("limit the PF deduction to 12% of basic wages".to_string()),
        PfStatus::Low => suggestions.push("confirm PF is deducted at the statutory 12% of basic wages".to_string()),
        PfStatus::Correct | PfStatus::Unknown => {}
    }
    if b.in_hand_percentage.is_some_and(|p| p < 70.0) {
        suggestions.push("raise the basic component to improve the in-hand share".to_string());
    }

    if suggestions.is_empty() {
        Answer::new(Outcome::Pass, "The current structure is fair. No major changes are needed.")
    } else {
        Answer::new(Outcome::Warn, format!("Suggestions: {}.", suggestions.join("; ")))
    }
}

fn employee_should_know(
    b: &SalaryBreakdown,
    c: &ComparisonStats,
    total_deductions: Option<f64>,
    deduction_pct: Option<f64>,
) -> Answer {
    let Some(ctc_annual) = b.ctc_annual else {
        return Answer::insufficient("the CTC");
    };

    let mut points = Vec::new();
    match b.in_hand_monthly {
        Some(in_hand) => points.push(format!(
            "Your CTC is {} per year, but you will receive about {} per month in hand",
            format_inr(ctc_annual),
            format_inr(in_hand)
        )),
        None => points.push(format!("Your CTC is {} per year", format_inr(ctc_annual))),
    }
    points.push("CTC includes the employer's PF contribution, which you do not receive directly".to_string());
    if let (Some(total), Some(pct)) = (total_deductions, deduction_pct) {
        points.push(format!(
            "Total deductions: {} per month ({pct:.1}% of CTC)",
            format_inr(total)
        ));
    }
    if c.admin_charges > 0.0 {
        points.push(format!(
            "Admin charges of {} per month are deducted",
            format_inr(c.admin_charges)
        ));
    }
    Answer::new(Outcome::Pass, format!("Key points: {}.", points.join(" | ")))
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Format rupees with Indian digit grouping, e.g. `₹6,00,000`.
pub fn format_inr(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, last3) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{last3}", groups.join(","))
    };
    format!("₹{sign}{grouped}")
}
