//! CLI definition using clap

use clap::{Args, Parser, Subcommand};
use pricescout_types::{ConditionScale, OutputFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pricescout")]
#[command(version)]
#[command(about = "Estimate the resale price of a used device from a photo")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Condition sliders. Unset values come from the config defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct SliderArgs {
    /// Device condition, higher is better (1-5, or 1-10 with --scale ten)
    #[arg(long, short = 'c', value_parser = clap::value_parser!(i32).range(1..=10))]
    pub condition: Option<i32>,

    /// Device age in months (0-48)
    #[arg(long, short = 'a', value_parser = clap::value_parser!(u32).range(0..=48))]
    pub age: Option<u32>,

    /// Remaining warranty in months (0-24)
    #[arg(long, short = 'w', value_parser = clap::value_parser!(u32).range(0..=24))]
    pub warranty: Option<u32>,

    /// Condition scale override (five, ten)
    #[arg(long)]
    pub scale: Option<ConditionScale>,
}

/// Noise controls
#[derive(Args, Debug, Clone, Default)]
pub struct JitterArgs {
    /// Seed the price noise for reproducible output (batch workers add their id)
    #[arg(long, conflicts_with = "no_jitter")]
    pub seed: Option<u64>,

    /// Disable the ±5% price noise
    #[arg(long)]
    pub no_jitter: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a device photo and estimate its price
    Estimate {
        /// Path to image file
        image: PathBuf,

        /// Use this label instead of running the classifier
        #[arg(long, short = 'l')]
        label: Option<String>,

        #[command(flatten)]
        sliders: SliderArgs,

        #[command(flatten)]
        jitter: JitterArgs,

        /// Skip cache lookup (overrides config)
        #[arg(long)]
        no_cache: bool,
    },

    /// Estimate a price from a label, without an image
    Quote {
        /// Device label, e.g. "cellular telephone"
        label: String,

        #[command(flatten)]
        sliders: SliderArgs,

        #[command(flatten)]
        jitter: JitterArgs,
    },

    /// Estimate every image in a folder
    Batch {
        /// Path to folder containing images
        folder: PathBuf,

        /// Output file for results (JSON)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Use this label for every image instead of running the classifier
        #[arg(long, short = 'l')]
        label: Option<String>,

        #[command(flatten)]
        sliders: SliderArgs,

        #[command(flatten)]
        jitter: JitterArgs,

        /// Skip cache lookup (overrides config)
        #[arg(long)]
        no_cache: bool,

        /// Number of parallel workers. 0 = auto (CPU count). Uses 4 if not specified.
        #[arg(long, short = 'j')]
        jobs: Option<usize>,
    },

    /// List device categories and their base prices
    Categories,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set classifier command (empty string clears it)
        #[arg(long)]
        set_classifier_cmd: Option<String>,

        /// Set minimum classifier confidence (0.0-1.0, negative clears it)
        #[arg(long, allow_negative_numbers = true)]
        set_min_confidence: Option<f64>,

        /// Enable/disable cache
        #[arg(long)]
        set_cache: Option<bool>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Set condition scale (five, ten)
        #[arg(long)]
        set_scale: Option<ConditionScale>,

        /// Set currency symbol
        #[arg(long)]
        set_currency: Option<String>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },

    /// Manage classification cache
    Cache {
        /// Clear all cache
        #[arg(long)]
        clear: bool,

        /// Show cache statistics
        #[arg(long)]
        stats: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_estimate() {
        let cli = Cli::try_parse_from([
            "pricescout", "estimate", "phone.jpg", "-c", "4", "-a", "12", "-w", "6", "--seed", "9",
        ])
        .unwrap();

        match cli.command {
            Commands::Estimate { image, sliders, jitter, .. } => {
                assert_eq!(image, PathBuf::from("phone.jpg"));
                assert_eq!(sliders.condition, Some(4));
                assert_eq!(sliders.age, Some(12));
                assert_eq!(sliders.warranty, Some(6));
                assert_eq!(jitter.seed, Some(9));
            }
            _ => panic!("expected estimate"),
        }
    }

    #[test]
    fn test_slider_ranges_enforced() {
        assert!(Cli::try_parse_from(["pricescout", "quote", "laptop", "-a", "49"]).is_err());
        assert!(Cli::try_parse_from(["pricescout", "quote", "laptop", "-w", "25"]).is_err());
        assert!(Cli::try_parse_from(["pricescout", "quote", "laptop", "-c", "0"]).is_err());
        assert!(Cli::try_parse_from(["pricescout", "quote", "laptop", "-c", "10"]).is_ok());
    }

    #[test]
    fn test_seed_conflicts_with_no_jitter() {
        assert!(Cli::try_parse_from(["pricescout", "quote", "laptop", "--seed", "1", "--no-jitter"]).is_err());
    }

    #[test]
    fn test_parse_batch_jitter() {
        let cli = Cli::try_parse_from(["pricescout", "batch", "shelf", "--no-jitter", "-j", "2"]).unwrap();
        match cli.command {
            Commands::Batch { folder, jitter, jobs, .. } => {
                assert_eq!(folder, PathBuf::from("shelf"));
                assert!(jitter.no_jitter);
                assert_eq!(jitter.seed, None);
                assert_eq!(jobs, Some(2));
            }
            _ => panic!("expected batch"),
        }

        assert!(Cli::try_parse_from(["pricescout", "batch", "shelf", "--seed", "3", "--no-jitter"]).is_err());
    }

    #[test]
    fn test_scale_values() {
        let cli = Cli::try_parse_from(["pricescout", "quote", "tv", "--scale", "ten"]).unwrap();
        match cli.command {
            Commands::Quote { sliders, .. } => assert_eq!(sliders.scale, Some(ConditionScale::TenPoint)),
            _ => panic!("expected quote"),
        }
    }
}
