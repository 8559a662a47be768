//! Estimation Service - Core Use Case for Device Price Estimation
//!
//! This service orchestrates the complete estimation workflow:
//! 1. Validate the condition sliders against the configured scale
//! 2. Validate the input image
//! 3. Check cache for an existing classification
//! 4. Classify the image (fall back to "Unknown" if the classifier fails)
//! 5. Estimate the price with the domain estimator
//! 6. Return the estimation report

use crate::config::Config;
use crate::scanner::validate_image;
use crate::validation::validate_sliders;
use chrono::Utc;
use pricescout_domain::{format_price, JitterSource, PriceEstimator, DEFAULT_CURRENCY_SYMBOL};
use pricescout_types::{
    Classification, ConditionScale, Error, EstimationInput, EstimationReport, SliderValues,
    UNKNOWN_LABEL,
};
use pricescout_vision::{
    Cache, Classifier, CommandClassifier, FixedLabelClassifier, UnconfiguredClassifier,
};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors specific to the estimation service
#[derive(Debug, Error)]
pub enum EstimationServiceError {
    #[error("Image validation failed: {0}")]
    InvalidImage(String),

    #[error("Invalid slider value: {0}")]
    InvalidInput(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Estimation failed: {0}")]
    EstimationFailed(String),
}

impl From<Error> for EstimationServiceError {
    fn from(err: Error) -> Self {
        match err {
            Error::FileNotFound(msg) | Error::InvalidImageFormat(msg) => {
                EstimationServiceError::InvalidImage(msg)
            }
            Error::Image(e) => EstimationServiceError::InvalidImage(e.to_string()),
            Error::InvalidInput(msg) => EstimationServiceError::InvalidInput(msg),
            Error::Cache(e) => EstimationServiceError::CacheError(e.to_string()),
            Error::Config(e) => EstimationServiceError::ConfigError(e.to_string()),
            Error::ClassifierUnavailable(msg) => EstimationServiceError::ConfigError(msg),
            _ => EstimationServiceError::EstimationFailed(err.to_string()),
        }
    }
}

/// Pick the classifier for this run.
///
/// An explicit label wins over the configured command; with neither, the
/// classifier reports itself unavailable and estimates use the default price.
pub fn build_classifier(
    config: &Config,
    label_override: Option<String>,
) -> Result<Box<dyn Classifier>, EstimationServiceError> {
    if let Some(label) = label_override {
        return Ok(Box::new(FixedLabelClassifier::new(label)));
    }

    match config.classifier_command.as_deref() {
        Some(cmd) if !cmd.trim().is_empty() => {
            Ok(Box::new(CommandClassifier::from_command_line(cmd)?))
        }
        _ => Ok(Box::new(UnconfiguredClassifier)),
    }
}

/// Estimation Service
///
/// Holds no per-estimate state. Jitter sources are passed in per call so a
/// single service can be shared by several worker threads.
pub struct EstimationService {
    classifier: Box<dyn Classifier>,
    cache: Option<Cache>,
    estimator: PriceEstimator,
    scale: ConditionScale,
    currency_symbol: String,
    min_confidence: Option<f64>,
}

/// Report predictions below `min_confidence` as "Unknown", keeping the score
fn apply_min_confidence(classification: Classification, min_confidence: Option<f64>) -> Classification {
    match (min_confidence, classification.confidence) {
        (Some(min), Some(confidence)) if confidence < min => {
            warn!(
                label = %classification.label,
                confidence,
                min_confidence = min,
                "prediction below minimum confidence"
            );
            Classification::new(UNKNOWN_LABEL, Some(confidence))
        }
        _ => classification,
    }
}

impl EstimationService {
    pub fn new(classifier: Box<dyn Classifier>) -> Self {
        Self {
            classifier,
            cache: None,
            estimator: PriceEstimator::new(),
            scale: ConditionScale::default(),
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            min_confidence: None,
        }
    }

    /// Build a service from configuration
    pub fn from_config(
        config: &Config,
        label_override: Option<String>,
        use_cache: bool,
    ) -> Result<Self, EstimationServiceError> {
        let classifier = build_classifier(config, label_override)?;
        let mut service = Self::new(classifier)
            .with_scale(config.condition_scale)
            .with_currency_symbol(config.currency_symbol.clone())
            .with_min_confidence(config.min_confidence);

        if use_cache && service.classifier.cacheable() {
            service = service.with_cache(Cache::new(config.cache_dir()?)?);
        }

        Ok(service)
    }

    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_scale(mut self, scale: ConditionScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    /// Predictions below this confidence are reported as "Unknown".
    /// Applied after the cache lookup.
    pub fn with_min_confidence(mut self, min_confidence: Option<f64>) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    pub fn scale(&self) -> ConditionScale {
        self.scale
    }

    /// Classify an image and estimate its resale price
    pub fn estimate_image(
        &self,
        image_path: &Path,
        sliders: SliderValues,
        jitter: &mut dyn JitterSource,
    ) -> Result<EstimationReport, EstimationServiceError> {
        validate_sliders(&sliders, self.scale)?;
        validate_image(image_path)?;

        let (classification, from_cache, classifier_error) = self.classify(image_path);
        let classification = apply_min_confidence(classification, self.min_confidence);

        let mut report = self.build_report(classification, sliders, jitter);
        report.image_path = Some(image_path.to_path_buf());
        report.from_cache = from_cache;
        report.classifier_error = classifier_error;

        info!(
            image = %image_path.display(),
            label = %report.classification.label,
            price = %report.formatted_price,
            "estimate complete"
        );

        Ok(report)
    }

    /// Estimate the price for a label without an image
    pub fn estimate_label(
        &self,
        label: &str,
        sliders: SliderValues,
        jitter: &mut dyn JitterSource,
    ) -> Result<EstimationReport, EstimationServiceError> {
        validate_sliders(&sliders, self.scale)?;
        Ok(self.build_report(Classification::new(label, None), sliders, jitter))
    }

    /// Returns the raw classification, whether it was served from cache, and
    /// the classifier error if any
    fn classify(&self, image_path: &Path) -> (Classification, bool, Option<String>) {
        let name = self.classifier.name();

        if let Some(ref cache) = self.cache {
            match cache.get(image_path, name) {
                Ok(Some(cached)) => {
                    debug!(image = %image_path.display(), "using cached classification");
                    return (cached, true, None);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "cache lookup failed"),
            }
        }

        match self.classifier.classify(image_path) {
            Ok(classification) => {
                if let Some(ref cache) = self.cache {
                    if let Err(e) = cache.set(image_path, name, &classification) {
                        warn!(error = %e, "failed to cache classification");
                    }
                }
                (classification, false, None)
            }
            Err(e) => {
                warn!(
                    image = %image_path.display(),
                    classifier = name,
                    error = %e,
                    "classification failed, using default price"
                );
                (Classification::unknown(), false, Some(e.to_string()))
            }
        }
    }

    fn build_report(
        &self,
        classification: Classification,
        sliders: SliderValues,
        jitter: &mut dyn JitterSource,
    ) -> EstimationReport {
        let input = EstimationInput::new(classification.label.clone(), sliders);
        let breakdown = self.estimator.estimate(&input, jitter);

        EstimationReport {
            image_path: None,
            classification,
            from_cache: false,
            classifier_error: None,
            sliders,
            scale: self.scale,
            formatted_price: format_price(breakdown.adjusted_price, &self.currency_symbol),
            breakdown,
            estimated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use pricescout_domain::FixedJitter;
    use pricescout_types::Result;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    /// Counts calls so cache hits can be observed
    struct CountingClassifier {
        label: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl Classifier for CountingClassifier {
        fn name(&self) -> &str {
            "counting"
        }

        fn classify(&self, _image_path: &Path) -> Result<Classification> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Classification::new(self.label, Some(0.9)))
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn name(&self) -> &str {
            "failing"
        }

        fn classify(&self, _image_path: &Path) -> Result<Classification> {
            Err(Error::ClassificationFailed("model crashed".to_string()))
        }
    }

    fn sample_image(dir: &Path) -> PathBuf {
        let path = dir.join("device.png");
        RgbImage::from_pixel(16, 16, Rgb([0, 128, 255])).save(&path).unwrap();
        path
    }

    fn neutral() -> SliderValues {
        SliderValues {
            condition: 3,
            age_months: 0.0,
            warranty_months: 0.0,
        }
    }

    #[test]
    fn test_estimate_image_with_label() {
        let dir = tempdir().unwrap();
        let service = EstimationService::new(Box::new(FixedLabelClassifier::new("Gaming Laptop")));

        let report = service
            .estimate_image(&sample_image(dir.path()), neutral(), &mut FixedJitter(1.0))
            .unwrap();

        assert_eq!(report.classification.label, "Gaming Laptop");
        assert_eq!(report.breakdown.base_price, 1000.0);
        assert_eq!(report.formatted_price, "$1000.00");
        assert!(!report.from_cache);
        assert!(report.classifier_error.is_none());
    }

    #[test]
    fn test_classifier_failure_falls_back_to_default() {
        let dir = tempdir().unwrap();
        let service = EstimationService::new(Box::new(FailingClassifier));

        let report = service
            .estimate_image(&sample_image(dir.path()), neutral(), &mut FixedJitter(1.0))
            .unwrap();

        assert!(report.classification.is_unknown());
        assert_eq!(report.breakdown.base_price, 100.0);
        assert_eq!(report.formatted_price, "$100.00");
        assert!(report.classifier_error.unwrap().contains("model crashed"));
    }

    #[test]
    fn test_unconfigured_classifier_falls_back() {
        let dir = tempdir().unwrap();
        let service = EstimationService::new(Box::new(UnconfiguredClassifier));

        let report = service
            .estimate_image(&sample_image(dir.path()), neutral(), &mut FixedJitter(1.0))
            .unwrap();
        assert_eq!(report.breakdown.base_price, 100.0);
        assert!(report.classifier_error.is_some());
    }

    #[test]
    fn test_cache_hit_skips_classifier() {
        let dir = tempdir().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let service = EstimationService::new(Box::new(CountingClassifier {
            label: "desktop computer monitor",
            calls: Arc::clone(&calls),
        }))
        .with_cache(Cache::new(dir.path().join("cache")).unwrap());
        let image = sample_image(dir.path());

        let first = service.estimate_image(&image, neutral(), &mut FixedJitter(1.0)).unwrap();
        let second = service.estimate_image(&image, neutral(), &mut FixedJitter(1.0)).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(second.breakdown.base_price, 300.0);
    }

    #[test]
    fn test_invalid_image_is_rejected() {
        let dir = tempdir().unwrap();
        let service = EstimationService::new(Box::new(FixedLabelClassifier::new("phone")));

        let err = service
            .estimate_image(&dir.path().join("missing.jpg"), neutral(), &mut FixedJitter(1.0))
            .unwrap_err();
        assert!(matches!(err, EstimationServiceError::InvalidImage(_)));
    }

    #[test]
    fn test_sliders_validated_against_scale() {
        let service = EstimationService::new(Box::new(UnconfiguredClassifier));
        let sliders = SliderValues {
            condition: 8,
            ..neutral()
        };

        let err = service
            .estimate_label("phone", sliders, &mut FixedJitter(1.0))
            .unwrap_err();
        assert!(matches!(err, EstimationServiceError::InvalidInput(_)));

        let service = service.with_scale(ConditionScale::TenPoint);
        let report = service.estimate_label("phone", sliders, &mut FixedJitter(1.0)).unwrap();
        // 600 × (1 + 5/10)
        assert!((report.breakdown.adjusted_price - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_label_currency() {
        let service = EstimationService::new(Box::new(UnconfiguredClassifier)).with_currency_symbol("€");
        let report = service
            .estimate_label("keyboard", neutral(), &mut FixedJitter(1.0))
            .unwrap();
        assert_eq!(report.formatted_price, "€80.00");
        assert!(report.image_path.is_none());
    }

    #[test]
    fn test_build_classifier_precedence() {
        let config = Config {
            classifier_command: Some("python3 classify.py".to_string()),
            ..Config::default()
        };

        let classifier = build_classifier(&config, Some("laptop".to_string())).unwrap();
        assert_eq!(classifier.name(), "fixed-label");

        let classifier = build_classifier(&config, None).unwrap();
        assert_eq!(classifier.name(), "python3 classify.py");

        let classifier = build_classifier(&Config::default(), None).unwrap();
        assert_eq!(classifier.name(), "unconfigured");
    }

    #[test]
    fn test_from_config_skips_cache_for_fixed_label() {
        let dir = tempdir().unwrap();
        let config = Config {
            cache_dir: Some(dir.path().join("cache")),
            ..Config::default()
        };

        let service = EstimationService::from_config(&config, Some("phone".to_string()), true).unwrap();
        assert!(service.cache.is_none());

        let config = Config {
            classifier_command: Some("runner".to_string()),
            ..config
        };
        let service = EstimationService::from_config(&config, None, true).unwrap();
        assert!(service.cache.is_some());
    }

    #[test]
    fn test_min_confidence_downgrades_label() {
        let low = apply_min_confidence(Classification::new("laptop", Some(0.3)), Some(0.5));
        assert!(low.is_unknown());
        assert_eq!(low.confidence, Some(0.3));

        let high = apply_min_confidence(Classification::new("laptop", Some(0.8)), Some(0.5));
        assert_eq!(high.label, "laptop");

        // no reported confidence, nothing to compare against
        let none = apply_min_confidence(Classification::new("laptop", None), Some(0.5));
        assert_eq!(none.label, "laptop");
    }

    #[test]
    fn test_lowering_min_confidence_uses_cached_label() {
        let dir = tempdir().unwrap();
        let image = sample_image(dir.path());
        let cache_dir = dir.path().join("cache");
        let calls = Arc::new(AtomicUsize::new(0));
        let counting = || {
            Box::new(CountingClassifier {
                label: "notebook computer",
                calls: Arc::clone(&calls),
            })
        };

        // CountingClassifier reports 0.9
        let strict = EstimationService::new(counting())
            .with_cache(Cache::new(cache_dir.clone()).unwrap())
            .with_min_confidence(Some(0.95));
        let report = strict.estimate_image(&image, neutral(), &mut FixedJitter(1.0)).unwrap();
        assert!(report.classification.is_unknown());

        let relaxed = EstimationService::new(counting())
            .with_cache(Cache::new(cache_dir.clone()).unwrap())
            .with_min_confidence(None);
        let report = relaxed.estimate_image(&image, neutral(), &mut FixedJitter(1.0)).unwrap();
        assert!(report.from_cache);
        assert_eq!(report.classification.label, "notebook computer");
        assert_eq!(report.breakdown.base_price, 1000.0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_switching_model_command_misses_cache() {
        let dir = tempdir().unwrap();
        let image = sample_image(dir.path());
        let config_for = |label: &str| Config {
            classifier_command: Some(format!(r#"sh -c 'echo {{"label":"{}"}}'"#, label)),
            cache_dir: Some(dir.path().join("cache")),
            ..Config::default()
        };

        let service = EstimationService::from_config(&config_for("laptop"), None, true).unwrap();
        let first = service.estimate_image(&image, neutral(), &mut FixedJitter(1.0)).unwrap();
        assert_eq!(first.classification.label, "laptop");
        assert!(!first.from_cache);

        let service = EstimationService::from_config(&config_for("keyboard"), None, true).unwrap();
        let second = service.estimate_image(&image, neutral(), &mut FixedJitter(1.0)).unwrap();
        assert_eq!(second.classification.label, "keyboard");
        assert!(!second.from_cache);
        assert_eq!(second.breakdown.base_price, 80.0);
    }
}
