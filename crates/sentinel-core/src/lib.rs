pub mod catalog;
pub mod config;
pub mod corpus;
pub mod error;
pub mod model;
pub mod schema;
pub mod segment;

pub use catalog::{ClauseTypeRule, RuleCatalog, RuleKind, RuleSpec};
pub use config::SentinelConfig;
pub use corpus::{LawSection, StatutoryCorpus};
pub use error::{CatalogError, InputError, Result, SentinelError};
pub use model::{
    AnalysisResult, AnswerRecord, Clause, ClassifiedClause, ComplianceResult, ComplianceStatus,
    ContextUsed, DISCLAIMER, MissingClause, PassageSource, RetrievalHit, RiskLevel, RuleMatch,
};
pub use schema::clauses;
pub use segment::Segmenter;
