//! Application use cases

pub mod estimation_service;

pub use estimation_service::{build_classifier, EstimationService, EstimationServiceError};
