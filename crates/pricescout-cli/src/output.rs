//! Output formatting module

use pricescout_domain::{format_price, DEFAULT_BASE_PRICE, PRICE_CATEGORIES};
use pricescout_types::{BatchResults, EstimationReport, OutputFormat, Result};

pub fn output_report(output_format: OutputFormat, report: &EstimationReport) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(report)?;
        println!("{}", content);
        return Ok(());
    }

    println!("\nEstimation Result");
    println!("=================");

    if let Some(ref path) = report.image_path {
        println!("Image:            {}", path.display());
    }

    let classification = &report.classification;
    match classification.confidence {
        Some(confidence) => println!(
            "Detected object:  {} ({:.0}%)",
            classification.label,
            confidence * 100.0
        ),
        None => println!("Detected object:  {}", classification.label),
    }
    if report.from_cache {
        println!("                  (cached classification)");
    }
    if let Some(ref error) = report.classifier_error {
        println!("Classifier:       failed, using default price ({})", error);
    }

    let sliders = &report.sliders;
    let breakdown = &report.breakdown;
    println!("\n--- Adjustments ---");
    println!("Base price:       {:.2}", breakdown.base_price);
    println!(
        "Condition:        {} / {}  x{:.3}",
        sliders.condition,
        report.scale.range().end(),
        breakdown.condition_factor
    );
    println!(
        "Age:              {} mo  x{:.3}",
        sliders.age_months, breakdown.age_factor
    );
    println!(
        "Warranty:         {} mo  x{:.3}",
        sliders.warranty_months, breakdown.warranty_factor
    );
    println!("Market noise:     x{:.3}", breakdown.noise);
    println!("-------------------");

    println!("Estimated price:  {}", report.formatted_price);

    Ok(())
}

pub fn output_batch_summary(output_format: OutputFormat, results: &BatchResults, currency_symbol: &str) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(results)?;
        println!("{}", content);
        return Ok(());
    }

    println!("\nBatch Result");
    println!("============");
    for report in &results.reports {
        let name = report
            .image_path
            .as_ref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("-");
        println!(
            "{:<32} {:<28} {:>12}",
            name, report.classification.label, report.formatted_price
        );
    }
    for failure in &results.failures {
        println!("{:<32} ERROR: {}", failure.image_path.display(), failure.error);
    }

    let elapsed = results.finished_at - results.started_at;
    println!();
    println!("Images:       {}", results.total_images);
    println!("Estimated:    {}", results.successful());
    println!("Failed:       {}", results.failed());
    println!("Total value:  {}", format_price(results.total_value(), currency_symbol));
    println!("Elapsed:      {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);

    Ok(())
}

pub fn output_categories(output_format: OutputFormat, currency_symbol: &str) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(&serde_json::json!({
            "categories": PRICE_CATEGORIES,
            "default_base_price": DEFAULT_BASE_PRICE,
        }))?;
        println!("{}", content);
        return Ok(());
    }

    println!("\nDevice Categories (first match wins)");
    println!("====================================");
    for category in PRICE_CATEGORIES {
        println!(
            "{:<12} {:>10}",
            category.keyword,
            format_price(category.base_price, currency_symbol)
        );
    }
    println!(
        "{:<12} {:>10}",
        "(other)",
        format_price(DEFAULT_BASE_PRICE, currency_symbol)
    );

    Ok(())
}
