//! Slider range checks.
//!
//! The estimator accepts any numbers; this is where the application
//! enforces the ranges its controls allow.

use pricescout_types::{
    ConditionScale, Error, Result, SliderValues, MAX_AGE_MONTHS, MAX_WARRANTY_MONTHS,
};

/// Check sliders against the ranges of the given condition scale
pub fn validate_sliders(sliders: &SliderValues, scale: ConditionScale) -> Result<()> {
    let range = scale.range();
    if !range.contains(&sliders.condition) {
        return Err(Error::InvalidInput(format!(
            "condition {} is outside the {} scale",
            sliders.condition,
            scale.label()
        )));
    }

    if !sliders.age_months.is_finite() || !(0.0..=MAX_AGE_MONTHS).contains(&sliders.age_months) {
        return Err(Error::InvalidInput(format!(
            "age {} months is outside 0-{}",
            sliders.age_months, MAX_AGE_MONTHS
        )));
    }

    if !sliders.warranty_months.is_finite()
        || !(0.0..=MAX_WARRANTY_MONTHS).contains(&sliders.warranty_months)
    {
        return Err(Error::InvalidInput(format!(
            "warranty {} months is outside 0-{}",
            sliders.warranty_months, MAX_WARRANTY_MONTHS
        )));
    }

    Ok(())
}
