//! Analysis engine: rule-based classification, compliance and salary checks,
//! retrieval, and grounded answers from a pluggable language model.

pub mod aggregate;
pub mod classifier;
pub mod compliance;
pub mod composer;
pub mod extract;
pub mod generator;
pub mod pipeline;
pub mod retrieval;
pub mod salary;
pub mod session;

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::GeminiGenerator;

pub use classifier::{Classifier, RuleScope};
pub use composer::Composer;
pub use extract::SalaryExtractor;
pub use generator::{GenerateError, GenerateRequest, Generated, Generator};
pub use pipeline::{Analyzer, Mode};
pub use retrieval::{Collection, RetrievalIndex, Retrieved};
pub use salary::{SalaryFields, SalaryReport, Verdict};
pub use session::Session;
