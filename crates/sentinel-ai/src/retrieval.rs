//! Lexical retrieval over contract clauses and statutory sections.
//!
//! Each collection keeps its own document frequencies. A passage's score for
//! a question is the sum, over distinct query terms it contains, of
//! `ln(1 + N / df)`. Passages scoring zero are dropped; ties go to the earlier
//! passage. The same question against the same collections always yields the
//! same hits in the same order.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use sentinel_core::config::RetrievalConfig;
use sentinel_core::corpus::StatutoryCorpus;
use sentinel_core::model::{ClassifiedClause, PassageSource, RetrievalHit};
use tracing::debug;

const STOPWORDS: &[&str] = &[
    "a", "about", "am", "an", "and", "any", "are", "as", "at", "be", "been", "being", "but", "by",
    "can", "could", "do", "does", "for", "from", "had", "has", "have", "he", "her", "his", "how",
    "i", "if", "in", "into", "is", "it", "its", "me", "my", "not", "of", "on", "or", "our", "she",
    "should", "so", "such", "than", "that", "the", "their", "them", "then", "there", "these",
    "they", "this", "those", "to", "us", "was", "we", "were", "what", "when", "where", "which",
    "who", "whom", "why", "will", "with", "would", "you", "your",
];

/// Extra terms added when a trigger appears in the question.
const EXPANSIONS: &[(&[&str], &[&str])] = &[
    (
        &["non-compete", "noncompete", "compete", "competitor", "competing"],
        &["compete", "competing", "competitor", "restraint", "non-compete", "27"],
    ),
    (
        &["confidential", "confidentiality", "nda", "secret"],
        &["confidential", "confidentiality", "secret", "disclosure", "proprietary"],
    ),
    (
        &["payment", "paid", "pay", "salary", "wage", "wages"],
        &["payment", "salary", "wages", "compensation", "paid", "pay", "deductions"],
    ),
    (
        &["terminate", "termination", "fire", "fired", "quit", "resign", "leave"],
        &["terminate", "termination", "notice", "retrenchment", "exit"],
    ),
    (
        &["penalty", "penalties", "fine", "damages"],
        &["penalty", "compensation", "breach", "damages", "liquidated", "74"],
    ),
    (
        &["liability", "liable", "indemnity", "indemnify"],
        &["liable", "liability", "indemnify", "indemnity", "public", "policy", "23"],
    ),
    (
        &["risk", "risky", "dangerous", "unfair"],
        &["restraint", "penalty", "liability", "indemnify", "void"],
    ),
    (
        &["ip", "intellectual", "copyright", "invention", "patent"],
        &["intellectual", "property", "copyright", "patent", "assign", "ownership", "employment"],
    ),
    (
        &["hours", "overtime", "weekend"],
        &["hours", "overtime", "week", "day"],
    ),
    (
        &["pf", "provident"],
        &["provident", "fund", "pf", "contribution", "basic"],
    ),
    (
        &["dispute", "arbitration", "court", "sue"],
        &["arbitration", "dispute", "court", "courts", "jurisdiction"],
    ),
    (
        &["data", "privacy", "personal"],
        &["personal", "data", "privacy", "consent", "sensitive"],
    ),
    (
        &["notice"],
        &["notice", "termination", "month"],
    ),
];

/// Lowercase alphanumeric runs, keeping inner hyphens, minus stop-words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .map(|t| t.trim_matches('-'))
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

/// Distinct query terms after expansion, in a stable order.
pub fn query_terms(question: &str) -> Vec<String> {
    let base = tokenize(question);
    let mut terms: BTreeSet<String> = base.iter().cloned().collect();
    for (triggers, extra) in EXPANSIONS {
        if base.iter().any(|t| triggers.contains(&t.as_str())) {
            terms.extend(extra.iter().map(|s| s.to_string()));
        }
    }
    terms.into_iter().collect()
}

/// A retrievable piece of text.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    pub title: String,
    pub text: String,
}

/// One searchable collection with its own term statistics.
#[derive(Debug, Clone)]
pub struct Collection {
    source: PassageSource,
    passages: Vec<Passage>,
    terms: Vec<HashSet<String>>,
    df: HashMap<String, usize>,
}

impl Collection {
    pub fn new(source: PassageSource, passages: Vec<Passage>) -> Self {
        let terms: Vec<HashSet<String>> = passages
            .iter()
            .map(|p| tokenize(&p.text).into_iter().collect())
            .collect();
        let mut df: HashMap<String, usize> = HashMap::new();
        for set in &terms {
            for term in set {
                *df.entry(term.clone()).or_default() += 1;
            }
        }
        Self {
            source,
            passages,
            terms,
            df,
        }
    }

    /// Law sections from the statutory corpus.
    pub fn from_corpus(corpus: &StatutoryCorpus) -> Self {
        let passages = corpus
            .sections()
            .iter()
            .map(|s| Passage {
                title: s.title.clone(),
                text: s.text.clone(),
            })
            .collect();
        Self::new(PassageSource::Law, passages)
    }

    /// Contract clauses, titled `Clause N` (1-based).
    pub fn from_clauses(clauses: &[ClassifiedClause]) -> Self {
        let passages = clauses
            .iter()
            .map(|c| Passage {
                title: format!("Clause {}", c.clause.index + 1),
                text: c.clause.text.clone(),
            })
            .collect();
        Self::new(PassageSource::Contract, passages)
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Top `k` passages for already-expanded query terms.
    pub fn search(&self, terms: &[String], k: usize) -> Vec<RetrievalHit> {
        let n = self.passages.len() as f64;
        let mut scored: Vec<(usize, f64)> = self
            .terms
            .iter()
            .enumerate()
            .map(|(i, doc)| {
                let score = terms
                    .iter()
                    .filter(|t| doc.contains(t.as_str()))
                    .map(|t| {
                        let df = self.df.get(t.as_str()).copied().unwrap_or(1) as f64;
                        (1.0 + n / df).ln()
                    })
                    .sum::<f64>();
                (i, score)
            })
            .filter(|&(_, score)| score > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });

        scored
            .into_iter()
            .take(k)
            .enumerate()
            .map(|(rank, (i, score))| RetrievalHit {
                source: self.source,
                title: self.passages[i].title.clone(),
                passage_text: self.passages[i].text.clone(),
                relevance_rank: rank + 1,
                score,
            })
            .collect()
    }
}

/// Hits for one question, per collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Retrieved {
    pub contract: Vec<RetrievalHit>,
    pub law: Vec<RetrievalHit>,
}

/// A session's contract clauses plus the shared law collection.
#[derive(Debug, Clone)]
pub struct RetrievalIndex {
    contract: Collection,
    law: Arc<Collection>,
    contract_top_k: usize,
    law_top_k: usize,
}

impl RetrievalIndex {
    pub fn new(contract: Collection, law: Arc<Collection>, config: &RetrievalConfig) -> Self {
        let clamp = |k: usize| k.clamp(1, RetrievalConfig::MAX_TOP_K);
        Self {
            contract,
            law,
            contract_top_k: clamp(config.contract_top_k),
            law_top_k: clamp(config.law_top_k),
        }
    }

    pub fn retrieve(&self, question: &str) -> Retrieved {
        let terms = query_terms(question);
        let retrieved = Retrieved {
            contract: self.contract.search(&terms, self.contract_top_k),
            law: self.law.search(&terms, self.law_top_k),
        };
        debug!(
            terms = terms.len(),
            contract = retrieved.contract.len(),
            law = retrieved.law.len(),
            "retrieved passages"
        );
        retrieved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(texts: &[&str]) -> Collection {
        Collection::new(
            PassageSource::Contract,
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| Passage {
                    title: format!("Clause {}", i + 1),
                    text: t.to_string(),
                })
                .collect(),
        )
    }

    fn law() -> Arc<Collection> {
        Arc::new(Collection::from_corpus(&StatutoryCorpus::builtin().unwrap()))
    }

    #[test]
    fn tokenize_keeps_hyphenated_words_and_drops_stopwords() {
        assert_eq!(
            tokenize("Is the Non-Compete clause valid? -- Section 27."),
            ["non-compete", "clause", "valid", "section", "27"]
        );
    }

    #[test]
    fn query_expansion_adds_related_terms() {
        let terms = query_terms("Can they fire me?");
        assert!(terms.contains(&"termination".to_string()));
        assert!(terms.contains(&"notice".to_string()));
        assert!(!terms.contains(&"me".to_string()));
    }

    #[test]
    fn ranks_by_rarer_terms_first() {
        let c = collection(&[
            "The employee shall be paid a salary every month.",
            "The employee shall not compete with the company after leaving.",
            "The employee shall work from the office.",
        ]);
        let hits = c.search(&query_terms("Is the non-compete enforceable?"), 3);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Clause 2");
        assert_eq!(hits[0].relevance_rank, 1);
    }

    #[test]
    fn zero_scores_are_dropped_and_k_bounds_results() {
        let c = collection(&[
            "salary paid monthly",
            "salary reviewed yearly",
            "salary in rupees",
            "office in pune",
        ]);
        let hits = c.search(&["salary".to_string()], 2);
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.passage_text.contains("salary")));
        assert!(c.search(&["unrelated".to_string()], 3).is_empty());
    }

    #[test]
    fn ties_go_to_the_earlier_passage() {
        let c = collection(&["notice period one", "notice period two", "notice period three"]);
        let hits = c.search(&["notice".to_string()], 3);
        let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, ["Clause 1", "Clause 2", "Clause 3"]);
        assert_eq!(
            hits.iter().map(|h| h.relevance_rank).collect::<Vec<_>>(),
            [1, 2, 3]
        );
    }

    #[test]
    fn law_retrieval_finds_restraint_of_trade() {
        let index = RetrievalIndex::new(
            collection(&["The employee shall not compete after leaving."]),
            law(),
            &RetrievalConfig::default(),
        );
        let retrieved = index.retrieve("Is my non-compete clause enforceable?");
        assert!(!retrieved.law.is_empty());
        assert!(retrieved.law.len() <= 3);
        assert!(retrieved.law[0].title.starts_with("Section 27"));
        assert_eq!(retrieved.law[0].source, PassageSource::Law);
    }

    #[test]
    fn nda_questions_reach_confidentiality_guidance() {
        let index = RetrievalIndex::new(
            collection(&["The Employee shall keep all client lists confidential."]),
            law(),
            &RetrievalConfig::default(),
        );
        let retrieved = index.retrieve("How long does my NDA last?");
        assert_eq!(
            retrieved.law[0].title,
            "Non-disclosure agreements - Duration and return of material"
        );
        assert_eq!(retrieved.contract[0].title, "Clause 1");
    }

    #[test]
    fn retrieval_is_deterministic() {
        let index = RetrievalIndex::new(
            collection(&["A penalty of Rs. 50,000 applies.", "Salary is paid monthly."]),
            law(),
            &RetrievalConfig::default(),
        );
        let q = "What happens if I pay the penalty?";
        assert_eq!(index.retrieve(q), index.retrieve(q));
    }
}
