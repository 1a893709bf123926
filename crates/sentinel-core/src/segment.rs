//! Clause segmentation.
//!
//! Splits extracted contract text into an ordered sequence of [`Clause`]s.
//!
//! # Splitting policy
//!
//! 1. Sanitize: normalize line endings, drop control characters (other than
//!    newline and tab) and characters outside the Basic Multilingual Plane.
//! 2. If the text has structure (a clause header line anywhere, or more than
//!    one blank-line-delimited paragraph), split on it: a blank line ends a
//!    clause and a header line always starts a new one. A header line standing
//!    alone (e.g. "7. TERMINATION") is kept with the paragraph that follows it
//!    across blank lines.
//! 3. Otherwise fall back to sentence boundaries.
//! 4. Drop fragments shorter than `min_clause_chars`, then number the rest.
//!
//! The result depends only on the input text and the thresholds.

use tracing::debug;

use crate::config::SegmenterConfig;
use crate::error::InputError;
use crate::model::Clause;

/// Tokens that end in a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "rs", "no", "nos", "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "ltd", "pvt", "co", "inc",
    "corp", "llp", "llc", "e.g", "i.e", "viz", "sec", "secs", "cl", "art", "para", "vs", "etc",
    "approx", "govt", "dept", "st", "p.a", "a.m", "p.m",
];

#[derive(Debug, Clone)]
pub struct Segmenter {
    min_clause_chars: usize,
    min_document_chars: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new(&SegmenterConfig::default())
    }
}

impl Segmenter {
    pub fn new(config: &SegmenterConfig) -> Self {
        Self {
            min_clause_chars: config.min_clause_chars,
            min_document_chars: config.min_document_chars,
        }
    }

    /// Split `text` into clauses. Blank input yields an empty sequence.
    pub fn segment(&self, text: &str) -> Vec<Clause> {
        let clean = sanitize(text);
        if clean.trim().is_empty() {
            return Vec::new();
        }

        let (blocks, has_header) = split_blocks(&clean);
        let pieces = if has_header || blocks.len() > 1 {
            blocks
        } else {
            split_sentences(&clean)
        };

        let clauses: Vec<Clause> = pieces
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| p.chars().count() >= self.min_clause_chars)
            .enumerate()
            .map(|(i, p)| Clause::new(i, p))
            .collect();

        debug!(clauses = clauses.len(), structured = has_header, "segmented document");
        clauses
    }

    /// Reject empty or too-short documents, then segment.
    pub fn segment_document(&self, text: &str) -> Result<Vec<Clause>, InputError> {
        let clean = self.check_document(text)?;
        Ok(self.segment(&clean))
    }

    /// Sanitize `text` and reject it when empty or shorter than the document
    /// minimum.
    pub fn check_document(&self, text: &str) -> Result<String, InputError> {
        let clean = sanitize(text);
        let chars = clean.trim().chars().count();
        if chars == 0 {
            return Err(InputError::Empty);
        }
        if chars < self.min_document_chars {
            return Err(InputError::TooShort {
                chars,
                min: self.min_document_chars,
            });
        }
        Ok(clean)
    }
}

/// Normalize line endings and strip characters that only add noise.
pub fn sanitize(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .chars()
        .filter(|&c| c == '\n' || c == '\t' || (!c.is_control() && (c as u32) <= 0xFFFF))
        .collect()
}

/// Split on blank lines and header lines. Returns the blocks and whether any
/// header was seen.
fn split_blocks(text: &str) -> (Vec<String>, bool) {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut header_only = false;
    let mut has_header = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            // A bare header waits for its body.
            if !current.is_empty() && !header_only {
                blocks.push(current.join("\n"));
                current.clear();
            }
            continue;
        }
        if is_header_line(trimmed) {
            has_header = true;
            if !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
            }
            current.push(trimmed);
            header_only = is_bare_header(trimmed);
            continue;
        }
        current.push(trimmed);
        header_only = false;
    }
    if !current.is_empty() {
        blocks.push(current.join("\n"));
    }
    (blocks, has_header)
}

/// A header with little or no body text on the same line, e.g. "3. SALARY".
fn is_bare_header(line: &str) -> bool {
    let words = line.split_whitespace().count();
    words == 1 || (words <= 4 && !line.ends_with('.'))
}

/// Whether a trimmed line opens a clause.
///
/// Recognized forms:
/// - keyword: `Clause 5`, `Section 2.1`, `Article 7`
/// - numbered: `1.`, `4)`, `2.3`, `2.3.1`
/// - parenthesized: `(a)`, `(iv)`, `(12)`
/// - lettered: `A.`, `B)`
pub fn is_header_line(line: &str) -> bool {
    let bytes = line.as_bytes();
    if bytes.is_empty() {
        return false;
    }

    let lower = line.to_ascii_lowercase();
    for keyword in ["clause ", "section ", "article "] {
        if let Some(rest) = lower.strip_prefix(keyword) {
            return rest.as_bytes().first().is_some_and(u8::is_ascii_digit);
        }
    }

    let ends_token = |i: usize| bytes.get(i).is_none_or(u8::is_ascii_whitespace);

    if bytes[0].is_ascii_digit() {
        let mut i = 0;
        let mut groups = 0;
        loop {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let len = i - start;
            if len == 0 || len > 3 {
                return false;
            }
            groups += 1;
            match bytes.get(i) {
                Some(b'.') if bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => i += 1,
                Some(b'.') | Some(b')') => return ends_token(i + 1),
                _ => return groups > 1 && ends_token(i),
            }
        }
    }

    if bytes[0] == b'(' {
        let close = match bytes.iter().position(|&b| b == b')') {
            Some(p) => p,
            None => return false,
        };
        let inner = &bytes[1..close];
        let label_ok = match inner {
            [] => false,
            [c] => c.is_ascii_alphanumeric(),
            _ if inner.len() <= 3 && inner.iter().all(u8::is_ascii_digit) => true,
            _ => {
                inner.len() <= 5
                    && inner
                        .iter()
                        .all(|c| matches!(c.to_ascii_lowercase(), b'i' | b'v' | b'x' | b'l'))
            }
        };
        return label_ok && ends_token(close + 1);
    }

    bytes[0].is_ascii_uppercase()
        && matches!(bytes.get(1), Some(b'.') | Some(b')'))
        && ends_token(2)
        && bytes.len() > 2
}

/// Split unstructured text after `.`, `!` or `?` when followed by a space and
/// a sentence opener, skipping known abbreviations and single-letter initials.
fn split_sentences(text: &str) -> Vec<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let chars: Vec<(usize, char)> = collapsed.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;

    for (i, &(pos, c)) in chars.iter().enumerate() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let (Some(&(_, gap)), Some(&(_, next))) = (chars.get(i + 1), chars.get(i + 2)) else {
            continue;
        };
        if gap != ' ' || !opens_sentence(next) {
            continue;
        }
        if c == '.' && is_abbreviation(&collapsed[start..pos]) {
            continue;
        }
        let end = pos + c.len_utf8();
        sentences.push(collapsed[start..end].to_string());
        start = end;
    }
    if start < collapsed.len() {
        sentences.push(collapsed[start..].to_string());
    }
    sentences
}

fn opens_sentence(c: char) -> bool {
    c.is_uppercase() || c.is_ascii_digit() || matches!(c, '(' | '"' | '\'' | '[')
}

fn is_abbreviation(before: &str) -> bool {
    let token = before
        .rsplit(' ')
        .next()
        .unwrap_or("")
        .trim_start_matches(['(', '"', '\'', '[']);
    if token.is_empty() {
        return false;
    }
    if token.chars().count() == 1 && token.chars().all(char::is_alphabetic) {
        return true;
    }
    let lower = token.to_lowercase();
    ABBREVIATIONS.contains(&lower.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(clauses: &[Clause]) -> Vec<&str> {
        clauses.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn blank_input_yields_nothing() {
        let seg = Segmenter::default();
        assert!(seg.segment("").is_empty());
        assert!(seg.segment("   \n\t  \n").is_empty());
    }

    #[test]
    fn document_checks_reject_empty_and_short_text() {
        let seg = Segmenter::default();
        assert_eq!(seg.segment_document("  \n "), Err(InputError::Empty));
        assert_eq!(
            seg.segment_document("Too short to be a contract."),
            Err(InputError::TooShort { chars: 27, min: 50 })
        );
    }

    #[test]
    fn splits_on_numbered_headers() {
        let text = "1. The Employee shall report to the Manager.\n\
                    2. The Employee shall be paid monthly by bank transfer.\n\
                    3. Either party may terminate with 30 days notice.";
        let clauses = Segmenter::default().segment(text);
        assert_eq!(clauses.len(), 3);
        assert!(clauses[1].text.starts_with("2. The Employee"));
        assert_eq!(
            clauses.iter().map(|c| c.index).collect::<Vec<_>>(),
            [0, 1, 2]
        );
    }

    #[test]
    fn short_numbered_items_stay_separate() {
        let text = "1. Non-compete: 2 years\n2. Penalty: Rs 50,000\n3. Probation: six months";
        let clauses = Segmenter::default().segment(text);
        assert_eq!(
            texts(&clauses),
            [
                "1. Non-compete: 2 years",
                "2. Penalty: Rs 50,000",
                "3. Probation: six months"
            ]
        );
    }

    #[test]
    fn header_after_bare_header_starts_new_clause() {
        let text = "7. TERMINATION\n(a) Either party may end this agreement with notice.";
        let clauses = Segmenter::default().segment(text);
        assert_eq!(
            texts(&clauses),
            ["(a) Either party may end this agreement with notice."]
        );
    }

    #[test]
    fn check_document_returns_sanitized_text() {
        let seg = Segmenter::default();
        let clean = seg
            .check_document("The Employee\r\nshall be paid Rs. 50,000 per month by transfer.")
            .unwrap();
        assert_eq!(clean, "The Employee\nshall be paid Rs. 50,000 per month by transfer.");
        assert_eq!(seg.check_document(""), Err(InputError::Empty));
    }

    #[test]
    fn splits_on_blank_lines() {
        let text = "The Employee shall keep all company information confidential.\n\n\
                    The Company shall pay salary on the last working day.";
        let clauses = Segmenter::default().segment(text);
        assert_eq!(clauses.len(), 2);
    }

    #[test]
    fn bare_header_joins_following_paragraph() {
        let text = "7. TERMINATION\n\nEither party may terminate this agreement with notice.\n\n\
                    8. GOVERNING LAW\n\nThis agreement is governed by the laws of India.";
        let clauses = Segmenter::default().segment(text);
        assert_eq!(clauses.len(), 2);
        assert!(clauses[0].text.starts_with("7. TERMINATION\nEither party"));
        assert!(clauses[1].normalized_text.contains("laws of india"));
    }

    #[test]
    fn sentence_fallback_respects_abbreviations() {
        let text = "The Employee will receive Rs. 50,000 per month from ABC Pvt. Ltd. as salary. \
                    The Employee shall not engage in any competing business for 2 years.";
        let clauses = Segmenter::default().segment(text);
        assert_eq!(clauses.len(), 2);
        assert!(clauses[0].text.ends_with("as salary."));
        assert!(clauses[1].text.starts_with("The Employee shall not"));
    }

    #[test]
    fn short_fragments_are_dropped() {
        let text = "Page 1\n\nThe Employee shall keep all company information confidential.\n\nSigned";
        let clauses = Segmenter::default().segment(text);
        assert_eq!(
            texts(&clauses),
            ["The Employee shall keep all company information confidential."]
        );
        assert_eq!(clauses[0].index, 0);
    }

    #[test]
    fn sanitize_strips_emoji_and_controls() {
        assert_eq!(sanitize("a\u{1F600}b\u{0007}c\r\nd"), "abc\nd");
    }

    #[test]
    fn header_forms() {
        for line in [
            "1. Scope",
            "12) Payment",
            "2.3 Notice",
            "2.3.1 Notice",
            "(a) the Employee",
            "(iv) any breach",
            "(12) fees",
            "A. Definitions",
            "Clause 5 Termination",
            "SECTION 2. Duties",
            "Article 7",
        ] {
            assert!(is_header_line(line), "{line}");
        }
        for line in [
            "12.5% of basic",
            "2024 was a good year",
            "The Employee",
            "(the Company)",
            "Rs. 500",
            "A",
        ] {
            assert!(!is_header_line(line), "{line}");
        }
    }

    #[test]
    fn segmentation_is_deterministic() {
        let text = "1. The Employee shall not compete after leaving.\n(a) This applies worldwide for all time.";
        let seg = Segmenter::default();
        assert_eq!(seg.segment(text), seg.segment(text));
    }
}
