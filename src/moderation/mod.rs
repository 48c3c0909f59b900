pub mod metrics;
pub mod normalizer;
pub mod schema;
pub mod summary;

pub use metrics::{score, ValidationReport};
pub use normalizer::{Normalizer, ParseError};
pub use schema::{validate_records, validate_results, SchemaReport};
pub use summary::{summarize, RunSummary};
