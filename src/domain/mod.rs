pub mod content;
pub mod types;

pub use content::{ContentItem, HumanAnnotation};
pub use types::{Category, ClassificationResult, Flagged, LabelVector};
