//! Core value objects for price estimation

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::PathBuf;

/// Label used when no classification is available
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Maximum device age accepted by the age slider (months)
pub const MAX_AGE_MONTHS: f64 = 48.0;

/// Maximum remaining warranty accepted by the warranty slider (months)
pub const MAX_WARRANTY_MONTHS: f64 = 24.0;

/// Condition slider scale.
///
/// The mobile app used 1-5, the native prototype 1-10. The scale only
/// decides which values a caller accepts; the estimator formula is the same
/// for both (centered at 3, 10% per step).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionScale {
    /// 1-5 (mobile)
    #[default]
    #[value(name = "five")]
    #[serde(rename = "five")]
    FivePoint,
    /// 1-10 (native)
    #[value(name = "ten")]
    #[serde(rename = "ten")]
    TenPoint,
}

impl ConditionScale {
    /// Accepted condition values for this scale
    pub fn range(&self) -> RangeInclusive<i32> {
        match self {
            ConditionScale::FivePoint => 1..=5,
            ConditionScale::TenPoint => 1..=10,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConditionScale::FivePoint => "1-5",
            ConditionScale::TenPoint => "1-10",
        }
    }
}

impl std::fmt::Display for ConditionScale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConditionScale::FivePoint => write!(f, "five"),
            ConditionScale::TenPoint => write!(f, "ten"),
        }
    }
}

/// Top prediction returned by a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Free-text class name (e.g. "cellular telephone")
    pub label: String,
    /// Model probability for the label, if the classifier reports one
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN_LABEL, None)
    }

    pub fn is_unknown(&self) -> bool {
        self.label == UNKNOWN_LABEL
    }
}

/// User-supplied condition sliders
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderValues {
    pub condition: i32,
    pub age_months: f64,
    pub warranty_months: f64,
}

impl Default for SliderValues {
    /// Initial slider positions of the mobile app
    fn default() -> Self {
        Self {
            condition: 3,
            age_months: 6.0,
            warranty_months: 6.0,
        }
    }
}

/// Everything the estimator needs for one call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationInput {
    pub label: String,
    pub condition: i32,
    pub age_months: f64,
    pub warranty_months: f64,
}

impl EstimationInput {
    pub fn new(label: impl Into<String>, sliders: SliderValues) -> Self {
        Self {
            label: label.into(),
            condition: sliders.condition,
            age_months: sliders.age_months,
            warranty_months: sliders.warranty_months,
        }
    }

    pub fn sliders(&self) -> SliderValues {
        SliderValues {
            condition: self.condition,
            age_months: self.age_months,
            warranty_months: self.warranty_months,
        }
    }
}

/// Base price, every adjustment factor, and the final price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub condition_factor: f64,
    pub warranty_factor: f64,
    pub age_factor: f64,
    pub noise: f64,
    pub adjusted_price: f64,
}

/// Result of estimating one image (or one label)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationReport {
    /// Source image, absent for label-only quotes
    #[serde(default)]
    pub image_path: Option<PathBuf>,
    pub classification: Classification,
    /// Classification was served from the cache
    #[serde(default)]
    pub from_cache: bool,
    /// Classifier error that forced the fallback label
    #[serde(default)]
    pub classifier_error: Option<String>,
    pub sliders: SliderValues,
    pub scale: ConditionScale,
    pub breakdown: PriceBreakdown,
    /// Display string, e.g. "$482.17"
    pub formatted_price: String,
    pub estimated_at: DateTime<Utc>,
}

/// Failed entry in a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub image_path: PathBuf,
    pub error: String,
}

/// Batch estimation results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    pub reports: Vec<EstimationReport>,
    #[serde(default)]
    pub failures: Vec<BatchFailure>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_images: usize,
}

impl BatchResults {
    pub fn successful(&self) -> usize {
        self.reports.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Sum of all adjusted prices in the batch
    pub fn total_value(&self) -> f64 {
        self.reports.iter().map(|r| r.breakdown.adjusted_price).sum()
    }
}
