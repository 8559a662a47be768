//! Command handlers

use crate::cli::{Cli, Commands, JitterArgs, SliderArgs};
use crate::error::Result;
use crate::output::{output_batch_summary, output_categories, output_report};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use pricescout_app::app::EstimationService;
use pricescout_app::config::Config;
use pricescout_app::scanner::scan_directory;
use pricescout_domain::{FixedJitter, JitterSource, UniformJitter};
use pricescout_types::{
    BatchFailure, BatchResults, CacheError, ConditionScale, Error, EstimationReport,
    OutputFormat, SliderValues,
};
use pricescout_vision::Cache;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{info, warn};

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let output_format = cli.format.unwrap_or(config.output_format);

    match cli.command {
        Commands::Estimate {
            image,
            label,
            sliders,
            jitter,
            no_cache,
        } => {
            // Cache disabled if: --no-cache OR config.cache_enabled=false
            let use_cache = !no_cache && config.cache_enabled;
            cmd_estimate(&config, image, label, &sliders, &jitter, use_cache, output_format)
        }

        Commands::Quote {
            label,
            sliders,
            jitter,
        } => cmd_quote(&config, &label, &sliders, &jitter, output_format),

        Commands::Batch {
            folder,
            output,
            label,
            sliders,
            jitter,
            no_cache,
            jobs,
        } => {
            // Use CLI jobs if specified, otherwise default 4. 0 = auto CPU count.
            let job_count = match jobs {
                Some(0) => num_cpus::get(),
                Some(n) => n,
                None => 4,
            };
            let use_cache = !no_cache && config.cache_enabled;
            cmd_batch(
                &config,
                BatchRequest {
                    folder,
                    output,
                    label,
                    sliders: resolve_sliders(&sliders, &config),
                    scale: sliders.scale.unwrap_or(config.condition_scale),
                    jitter,
                    use_cache,
                    jobs: job_count,
                },
                output_format,
            )
        }

        Commands::Categories => output_categories(output_format, &config.currency_symbol).map_err(Into::into),

        Commands::Config {
            show,
            set_classifier_cmd,
            set_min_confidence,
            set_cache,
            set_output,
            set_scale,
            set_currency,
            reset,
        } => cmd_config(ConfigUpdate {
            show,
            set_classifier_cmd,
            set_min_confidence,
            set_cache,
            set_output,
            set_scale,
            set_currency,
            reset,
        }),

        Commands::Cache { clear, stats } => cmd_cache(&config, clear, stats),
    }
}

/// Fill unset sliders from the config defaults
fn resolve_sliders(args: &SliderArgs, config: &Config) -> SliderValues {
    let defaults = config.default_sliders();
    SliderValues {
        condition: args.condition.unwrap_or(defaults.condition),
        age_months: args.age.map(f64::from).unwrap_or(defaults.age_months),
        warranty_months: args.warranty.map(f64::from).unwrap_or(defaults.warranty_months),
    }
}

/// Noise source for one worker; seeded runs offset the seed by `worker_id`
fn make_jitter(args: &JitterArgs, worker_id: usize) -> Box<dyn JitterSource> {
    if args.no_jitter {
        Box::new(FixedJitter(1.0))
    } else if let Some(seed) = args.seed {
        Box::new(UniformJitter::seeded(seed.wrapping_add(worker_id as u64)))
    } else {
        Box::new(UniformJitter::from_entropy())
    }
}

fn cmd_estimate(
    config: &Config,
    image: PathBuf,
    label: Option<String>,
    sliders: &SliderArgs,
    jitter: &JitterArgs,
    use_cache: bool,
    output_format: OutputFormat,
) -> Result<()> {
    let service = EstimationService::from_config(config, label, use_cache)?
        .with_scale(sliders.scale.unwrap_or(config.condition_scale));

    info!(image = %image.display(), classifier = service.classifier_name(), "estimating");

    let mut jitter = make_jitter(jitter, 0);
    let report = service.estimate_image(&image, resolve_sliders(sliders, config), jitter.as_mut())?;

    output_report(output_format, &report)?;
    Ok(())
}

fn cmd_quote(
    config: &Config,
    label: &str,
    sliders: &SliderArgs,
    jitter: &JitterArgs,
    output_format: OutputFormat,
) -> Result<()> {
    let service = EstimationService::from_config(config, Some(label.to_string()), false)?
        .with_scale(sliders.scale.unwrap_or(config.condition_scale));

    let mut jitter = make_jitter(jitter, 0);
    let report = service.estimate_label(label, resolve_sliders(sliders, config), jitter.as_mut())?;

    output_report(output_format, &report)?;
    Ok(())
}

struct BatchRequest {
    folder: PathBuf,
    output: Option<PathBuf>,
    label: Option<String>,
    sliders: SliderValues,
    scale: ConditionScale,
    jitter: JitterArgs,
    use_cache: bool,
    jobs: usize,
}

/// Result from a single estimation task
#[derive(Debug)]
struct EstimationTaskResult {
    image_path: PathBuf,
    result: std::result::Result<EstimationReport, String>,
}

fn cmd_batch(config: &Config, request: BatchRequest, output_format: OutputFormat) -> Result<()> {
    let images = scan_directory(&request.folder)?;

    if images.is_empty() {
        return Err(Error::FileNotFound(format!(
            "No images found in {}",
            request.folder.display()
        ))
        .into());
    }

    info!(
        folder = %request.folder.display(),
        images = images.len(),
        jobs = request.jobs.min(images.len()),
        cache = request.use_cache,
        "starting batch"
    );

    let service = Arc::new(
        EstimationService::from_config(config, request.label.clone(), request.use_cache)?
            .with_scale(request.scale),
    );

    let pb = ProgressBar::new(images.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let batch = run_batch(service, images, request.sliders, &request.jitter, request.jobs, &pb);
    pb.finish_with_message("done");

    if let Some(ref output_path) = request.output {
        write_batch_json(output_path, &batch)?;
        eprintln!("Results written to {}", output_path.display());
    }

    output_batch_summary(output_format, &batch, &config.currency_symbol)?;
    Ok(())
}

/// Estimate `images` on up to `jobs` worker threads.
///
/// Workers claim images through a shared index and each owns its noise
/// source. Failed images are collected rather than aborting the run, and
/// both lists come back sorted by path.
fn run_batch(
    service: Arc<EstimationService>,
    images: Vec<PathBuf>,
    sliders: SliderValues,
    jitter: &JitterArgs,
    jobs: usize,
    pb: &ProgressBar,
) -> BatchResults {
    let total_images = images.len();
    let jobs = jobs.clamp(1, total_images.max(1));

    let results: Arc<Mutex<Vec<EstimationTaskResult>>> = Arc::new(Mutex::new(Vec::new()));
    let images = Arc::new(images);
    let next_index = Arc::new(AtomicUsize::new(0));

    let started_at = Utc::now();

    let mut handles = Vec::new();

    for worker_id in 0..jobs {
        let images = Arc::clone(&images);
        let next_index = Arc::clone(&next_index);
        let results = Arc::clone(&results);
        let service = Arc::clone(&service);
        let pb = pb.clone();
        let jitter = jitter.clone();

        let handle = thread::spawn(move || {
            let mut jitter = make_jitter(&jitter, worker_id);

            loop {
                let idx = next_index.fetch_add(1, Ordering::SeqCst);
                if idx >= images.len() {
                    break;
                }

                let image = &images[idx];
                let filename = image
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("")
                    .to_string();
                pb.set_message(filename);

                let result = service
                    .estimate_image(image, sliders, jitter.as_mut())
                    .map_err(|e| e.to_string());

                if let Err(ref e) = result {
                    warn!(worker = worker_id, image = %image.display(), error = %e, "estimate failed");
                }

                results
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .push(EstimationTaskResult {
                        image_path: image.clone(),
                        result,
                    });

                pb.inc(1);
            }
        });

        handles.push(handle);
    }

    for handle in handles {
        if handle.join().is_err() {
            warn!("batch worker panicked");
        }
    }

    let finished_at = Utc::now();

    let task_results = std::mem::take(&mut *results.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));
    let mut reports = Vec::new();
    let mut failures = Vec::new();
    for task in task_results {
        match task.result {
            Ok(report) => reports.push(report),
            Err(error) => failures.push(BatchFailure {
                image_path: task.image_path,
                error,
            }),
        }
    }

    // Workers finish out of order
    reports.sort_by(|a, b| a.image_path.cmp(&b.image_path));
    failures.sort_by(|a, b| a.image_path.cmp(&b.image_path));

    BatchResults {
        reports,
        failures,
        started_at,
        finished_at,
        total_images,
    }
}

fn write_batch_json(path: &Path, batch: &BatchResults) -> Result<()> {
    let content = serde_json::to_string_pretty(batch).map_err(Error::from)?;
    std::fs::write(path, content).map_err(Error::from)?;
    Ok(())
}

struct ConfigUpdate {
    show: bool,
    set_classifier_cmd: Option<String>,
    set_min_confidence: Option<f64>,
    set_cache: Option<bool>,
    set_output: Option<OutputFormat>,
    set_scale: Option<ConditionScale>,
    set_currency: Option<String>,
    reset: bool,
}

fn cmd_config(update: ConfigUpdate) -> Result<()> {
    if update.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(cmd) = update.set_classifier_cmd {
        config.classifier_command = if cmd.trim().is_empty() { None } else { Some(cmd) };
        modified = true;
    }

    if let Some(min) = update.set_min_confidence {
        config.min_confidence = parse_min_confidence(min)?;
        modified = true;
    }

    if let Some(cache_enabled) = update.set_cache {
        config.cache_enabled = cache_enabled;
        modified = true;
    }

    if let Some(output_format) = update.set_output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(scale) = update.set_scale {
        config.condition_scale = scale;
        // keep the stored default usable on the narrower scale
        let range = scale.range();
        config.default_condition = config.default_condition.clamp(*range.start(), *range.end());
        modified = true;
    }

    if let Some(symbol) = update.set_currency {
        config.currency_symbol = symbol;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration updated");
    }

    if update.show || !modified {
        println!("{}", config);
    }

    Ok(())
}

/// Negative clears the threshold; anything else must be a finite value up to 1.0
fn parse_min_confidence(min: f64) -> Result<Option<f64>> {
    if !min.is_finite() {
        return Err(Error::InvalidInput(format!("minimum confidence {} is not a number", min)).into());
    }
    if min > 1.0 {
        return Err(Error::InvalidInput(format!("minimum confidence {} is above 1.0", min)).into());
    }
    Ok(if min < 0.0 { None } else { Some(min) })
}

fn cmd_cache(config: &Config, clear: bool, stats: bool) -> Result<()> {
    if !config.cache_enabled {
        return Err(Error::Cache(CacheError::IoError(
            "Cache is disabled. Enable with: pricescout config --set-cache true".to_string(),
        ))
        .into());
    }

    let cache = Cache::new(config.cache_dir()?)?;

    if clear {
        let count = cache.clear()?;
        println!("Cleared {} cached entries", count);
    }

    if stats || !clear {
        let stats = cache.stats()?;
        println!("{}", stats.display());
    }

    Ok(())
}
