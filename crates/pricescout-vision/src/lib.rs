//! Vision module - device image classification for price estimation

pub mod cache;
pub mod classifier;
pub mod preprocess;

// Re-export main types for convenience
pub use cache::{Cache, CacheStats};
pub use classifier::command::{parse_classifier_output, CommandClassifier};
pub use classifier::response::extract_json_from_response;
pub use classifier::{Classifier, FixedLabelClassifier, UnconfiguredClassifier};
pub use preprocess::MODEL_INPUT_SIZE;
