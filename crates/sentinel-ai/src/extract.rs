//! Regex extraction of compensation fields from salary annexure text.
//!
//! Each field has an ordered list of patterns. The first match whose amount
//! falls inside the field's plausibility window wins; everything else stays
//! `None` so the analyzer can report insufficient data instead of guessing.

use std::ops::RangeInclusive;

use anyhow::Context;
use regex::Regex;
use tracing::debug;

use crate::salary::SalaryFields;

const LAKH: f64 = 100_000.0;

const CTC_ANNUAL_WINDOW: RangeInclusive<f64> = 100_000.0..=10_000_000.0;
const CTC_MONTHLY_WINDOW: RangeInclusive<f64> = 8_000.0..=850_000.0;
const BASIC_WINDOW: RangeInclusive<f64> = 5_000.0..=500_000.0;
const PF_WINDOW: RangeInclusive<f64> = 100.0..=50_000.0;
const SMALL_DEDUCTION_WINDOW: RangeInclusive<f64> = 1.0..=50_000.0;
const IN_HAND_WINDOW: RangeInclusive<f64> = 1_000.0..=850_000.0;

/// `{cur}`, `{amt}` and `{unit}` are substituted before compiling.
const CURRENCY: &str = r"(?:\brs\.?|\binr|₹)?\s*";
const AMOUNT: &str = r"(\d+(?:,\d+)*(?:\.\d+)?)";
const UNIT: &str = r"\s*(lakhs?|lacs?|lpa)?";

const CTC_ANNUAL: &[&str] = &[
    r"(?:annual |total |yearly )?ctc(?: per annum| \(annual\))?[:\s=-]+{cur}{amt}{unit}",
    r"cost to company(?: \(ctc\))?[:\s=-]+{cur}{amt}{unit}",
    r"(?:annual|yearly)\s+(?:package|compensation|salary)[:\s=-]+{cur}{amt}{unit}",
    r"(?:\brs\.?|\binr|₹)\s*{amt}{unit}\s*(?:per|/|p\.?)\s*(?:annum|year|a\.)",
    r"ctc\s*[|\t]\s*{cur}{amt}{unit}",
];
const CTC_MONTHLY: &[&str] = &[
    r"(?:monthly ctc|ctc per month|monthly gross|gross monthly salary)[:\s=-]+{cur}{amt}",
];
const BASIC: &[&str] = &[
    r"basic(?: salary| pay)?(?: per month| \(monthly\))?[:\s=-]+{cur}{amt}",
    r"basic(?: salary| pay)?\s*[|\t]\s*{cur}{amt}",
];
const PF_EMPLOYEE: &[&str] = &[
    r"employee(?:'s)?(?: pf| provident fund)(?: contribution)?[:\s=-]+{cur}{amt}",
    r"pf\s+employee(?: contribution)?[:\s=-]+{cur}{amt}",
    r"employee contribution[:\s=-]+{cur}{amt}",
    r"pf\s+deduction[:\s=-]+{cur}{amt}",
    r"(?:^|[^r]\s)provident fund[:\s=-]+{cur}{amt}",
    r"(?:employee\s+)?pf\s*[|\t]\s*{cur}{amt}",
];
const PF_EMPLOYER: &[&str] = &[
    r"employer(?:'s)?(?: pf| provident fund)(?: contribution)?[:\s=-]+{cur}{amt}",
    r"pf\s+employer(?: contribution)?[:\s=-]+{cur}{amt}",
    r"employer contribution[:\s=-]+{cur}{amt}",
];
const PROFESSIONAL_TAX: &[&str] = &[r"professional tax[:\s=-]+{cur}{amt}"];
const ESI: &[&str] = &[r"\besic?[:\s=-]+{cur}{amt}"];
const ADMIN_CHARGES: &[&str] = &[r"admin(?:istrative|istration)?\s+(?:charges?|fees?)[:\s=-]+{cur}{amt}"];
const IN_HAND: &[&str] = &[
    r"\b(?:in[- ]hand|take[- ]home|net)(?: salary| pay)?(?: per month| \(monthly\))?[:\s=-]+{cur}{amt}",
];

/// Compiled extraction patterns. Build once and reuse.
#[derive(Debug, Clone)]
pub struct SalaryExtractor {
    ctc_annual: Vec<Regex>,
    ctc_monthly: Vec<Regex>,
    basic: Vec<Regex>,
    pf_employee: Vec<Regex>,
    pf_employer: Vec<Regex>,
    professional_tax: Vec<Regex>,
    esi: Vec<Regex>,
    admin_charges: Vec<Regex>,
    in_hand: Vec<Regex>,
    currency_amount: Regex,
}

impl SalaryExtractor {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            ctc_annual: compile("ctc_annual", CTC_ANNUAL)?,
            ctc_monthly: compile("ctc_monthly", CTC_MONTHLY)?,
            basic: compile("basic", BASIC)?,
            pf_employee: compile("pf_employee", PF_EMPLOYEE)?,
            pf_employer: compile("pf_employer", PF_EMPLOYER)?,
            professional_tax: compile("professional_tax", PROFESSIONAL_TAX)?,
            esi: compile("esi", ESI)?,
            admin_charges: compile("admin_charges", ADMIN_CHARGES)?,
            in_hand: compile("in_hand", IN_HAND)?,
            currency_amount: Regex::new(&format!(r"(?:\brs\.?|\binr|₹)\s*{AMOUNT}"))
                .context("compiling currency amount pattern")?,
        })
    }

    /// Pull whatever fields the text states. Never fails; unknowns stay `None`.
    pub fn extract(&self, text: &str) -> SalaryFields {
        let lower = text.to_lowercase();

        let ctc_monthly = first_amount(&self.ctc_monthly, &lower, &CTC_MONTHLY_WINDOW);
        let fields = SalaryFields {
            ctc_annual: self.ctc_annual(&lower, ctc_monthly.is_some()),
            ctc_monthly,
            basic_monthly: first_amount(&self.basic, &lower, &BASIC_WINDOW),
            pf_employee: first_amount(&self.pf_employee, &lower, &PF_WINDOW),
            pf_employer: first_amount(&self.pf_employer, &lower, &PF_WINDOW),
            professional_tax: first_amount(&self.professional_tax, &lower, &SMALL_DEDUCTION_WINDOW),
            esi: first_amount(&self.esi, &lower, &SMALL_DEDUCTION_WINDOW),
            admin_charges: first_amount(&self.admin_charges, &lower, &SMALL_DEDUCTION_WINDOW),
            in_hand_monthly: first_amount(&self.in_hand, &lower, &IN_HAND_WINDOW),
        };
        debug!(?fields, "extracted salary fields");
        fields
    }

    /// Annual CTC from labelled figures. The unlabelled fallback is skipped
    /// when a monthly CTC was stated.
    fn ctc_annual(&self, lower: &str, has_monthly: bool) -> Option<f64> {
        for re in &self.ctc_annual {
            for caps in re.captures_iter(lower) {
                if caps.get(0).is_some_and(|m| is_monthly_label(&lower[..m.start()])) {
                    continue;
                }
                let Some(mut amount) = caps.get(1).and_then(|m| parse_amount(m.as_str())) else {
                    continue;
                };
                // Explicit lakh units, or a bare figure too small to be rupees.
                if caps.get(2).is_some() || amount < 1_000.0 {
                    amount *= LAKH;
                }
                if CTC_ANNUAL_WINDOW.contains(&amount) {
                    return Some(amount);
                }
            }
        }

        if has_monthly {
            return None;
        }
        // Fall back to the largest currency-marked figure that could be a CTC.
        self.currency_amount
            .captures_iter(lower)
            .filter_map(|caps| caps.get(1).and_then(|m| parse_amount(m.as_str())))
            .filter(|a| CTC_ANNUAL_WINDOW.contains(a))
            .reduce(f64::max)
    }
}

/// Whether the text just before a CTC match qualifies it as monthly.
fn is_monthly_label(before: &str) -> bool {
    let before = before.trim_end();
    ["monthly", "gross", "per month"]
        .iter()
        .any(|label| before.ends_with(label))
}

fn compile(field: &str, patterns: &[&str]) -> anyhow::Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| {
            let expanded = p
                .replace("{cur}", CURRENCY)
                .replace("{amt}", AMOUNT)
                .replace("{unit}", UNIT);
            Regex::new(&expanded).with_context(|| format!("compiling {field} pattern {p}"))
        })
        .collect()
}

fn first_amount(patterns: &[Regex], lower: &str, window: &RangeInclusive<f64>) -> Option<f64> {
    patterns
        .iter()
        .flat_map(|re| re.captures_iter(lower))
        .filter_map(|caps| caps.get(1).and_then(|m| parse_amount(m.as_str())))
        .find(|a| window.contains(a))
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SalaryExtractor {
        SalaryExtractor::new().unwrap()
    }

    const ANNEXURE: &str = "\
ANNEXURE A - SALARY STRUCTURE
Annual CTC: Rs. 6,00,000
Basic Salary: Rs. 25,000
Employee PF: Rs. 3,000
Employer PF: Rs. 3,000
Professional Tax: Rs. 200
Admin Charges: Rs. 750
";

    #[test]
    fn extracts_labelled_annexure() {
        let f = extractor().extract(ANNEXURE);
        assert_eq!(f.ctc_annual, Some(600_000.0));
        assert_eq!(f.basic_monthly, Some(25_000.0));
        assert_eq!(f.pf_employee, Some(3_000.0));
        assert_eq!(f.pf_employer, Some(3_000.0));
        assert_eq!(f.professional_tax, Some(200.0));
        assert_eq!(f.admin_charges, Some(750.0));
        assert_eq!(f.esi, None);
        assert_eq!(f.in_hand_monthly, None);
    }

    #[test]
    fn converts_lakh_units() {
        let f = extractor().extract("Your CTC: 7.5 lakhs per annum.");
        assert_eq!(f.ctc_annual, Some(750_000.0));
        let f = extractor().extract("CTC: 12 LPA");
        assert_eq!(f.ctc_annual, Some(1_200_000.0));
    }

    #[test]
    fn per_annum_form() {
        let f = extractor().extract("You will be paid ₹ 4,80,000 per annum.");
        assert_eq!(f.ctc_annual, Some(480_000.0));
    }

    #[test]
    fn implausible_values_are_ignored() {
        let f = extractor().extract("Basic: Rs. 50\nEmployee PF: Rs. 90,000");
        assert_eq!(f.basic_monthly, None);
        assert_eq!(f.pf_employee, None);
    }

    #[test]
    fn employer_line_does_not_fill_employee_pf() {
        let f = extractor().extract("Employer Provident Fund: Rs. 1,800");
        assert_eq!(f.pf_employer, Some(1_800.0));
        assert_eq!(f.pf_employee, None);
    }

    #[test]
    fn declared_in_hand_and_monthly_ctc() {
        let f = extractor().extract("Monthly CTC: 50,000\nNet Salary: Rs. 42,300");
        assert_eq!(f.ctc_monthly, Some(50_000.0));
        assert_eq!(f.in_hand_monthly, Some(42_300.0));
        assert_eq!(f.ctc_annual, None);
    }

    #[test]
    fn monthly_ctc_is_not_read_as_annual() {
        let text = "Monthly CTC: Rs. 1,50,000\nEmployee PF: Rs. 3,000\nBasic Salary: Rs. 25,000";
        let f = extractor().extract(text);
        assert_eq!(f.ctc_monthly, Some(150_000.0));
        assert_eq!(f.ctc_annual, None);
        assert_eq!(f.basic_monthly, Some(25_000.0));
    }

    #[test]
    fn annual_ctc_next_to_monthly_ctc() {
        let f = extractor().extract("Monthly CTC: Rs. 50,000\nAnnual CTC: Rs. 6,00,000");
        assert_eq!(f.ctc_monthly, Some(50_000.0));
        assert_eq!(f.ctc_annual, Some(600_000.0));
    }

    #[test]
    fn nothing_to_extract() {
        let f = extractor().extract("This letter confirms your appointment.");
        assert_eq!(f, SalaryFields::default());
    }
}
