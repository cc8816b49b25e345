//! Command line entry point: one projection over a CSV-backed region table.
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use crate::config::ProjectionConfig;
use crate::data::{load_regions_csv, InMemoryInterventions, InMemoryParameterStore, ParameterStore};
use crate::log::{info, set_log_level, LevelFilter};
use crate::report::{write_projection_csv, JsonParameterStore};
use crate::runner::{ProjectionRequest, ProjectionResult, ProjectionRunner};

#[derive(Parser, Debug)]
#[command(name = "covid-projection")]
#[command(about = "Fit a two-wave surge model to a region's recent cases and project it forward")]
pub struct ProjectionArgs {
    /// CSV with region,date,confirmed,recovered,deceased,population,intervention_score rows
    #[arg(long)]
    pub data: PathBuf,

    /// Region to project
    #[arg(long, required_unless_present = "country_level")]
    pub region: Option<String>,

    /// Country the region belongs to
    #[arg(long)]
    pub country: String,

    /// Optional path for a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Optional path for the CSV projection report
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Directory holding the last learned parameters of each region
    #[arg(long)]
    pub params_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 14)]
    pub fitment_days: usize,

    #[arg(long, default_value_t = 5)]
    pub test_days: usize,

    #[arg(long, default_value_t = 60)]
    pub projection_days: usize,

    /// Population override; defaults to the population of the last record
    #[arg(long)]
    pub population: Option<u64>,

    /// Daily testing capacity; unlimited when absent
    #[arg(long)]
    pub testing_capacity: Option<f64>,

    /// Reuse the stored parameters instead of learning new ones
    #[arg(long)]
    pub reuse_params: bool,

    /// Project the country-wide series stored under the country code
    #[arg(long)]
    pub country_level: bool,

    /// Largest share of transmission interventions can remove
    #[arg(long, default_value_t = 0.0)]
    pub intervention_ceiling: f64,

    /// Random seed, overriding the configuration file
    #[arg(short, long)]
    pub random_seed: Option<u64>,

    /// One of off, error, warn, info, debug, trace
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl ProjectionArgs {
    #[must_use]
    pub fn request(&self) -> ProjectionRequest {
        ProjectionRequest {
            country_code: self.country.clone(),
            region_identifier: self.region.clone().unwrap_or_default(),
            population: self.population,
            testing_capacity: self.testing_capacity.unwrap_or(f64::INFINITY),
            fitment_days: self.fitment_days,
            test_days: self.test_days,
            projection_days: self.projection_days,
            learn_params: !self.reuse_params,
            country_level_projection: self.country_level,
            intervention_influence_pctg: self.intervention_ceiling,
        }
    }
}

/// Loads the configuration and data named by `args`, runs the projection and writes the
/// report if an output path was given.
///
/// # Errors
/// Any loading, projection or reporting failure.
pub fn run_with_args(args: &ProjectionArgs) -> Result<ProjectionResult> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            ProjectionConfig::from_json_file(path)
                .with_context(|| format!("reading configuration {}", path.display()))?
        }
        None => ProjectionConfig::default(),
    };
    if let Some(seed) = args.random_seed {
        config.random_seed = seed;
    }

    let regions = load_regions_csv(&args.data)
        .with_context(|| format!("loading region data {}", args.data.display()))?;
    // The CSV carries scores per record, so there is no separate intervention feed.
    let interventions = InMemoryInterventions::new();
    let store: Box<dyn ParameterStore> = match &args.params_dir {
        Some(dir) => Box::new(JsonParameterStore::new(dir)),
        None => Box::new(InMemoryParameterStore::new()),
    };

    let runner = ProjectionRunner::new(config, &regions, &interventions, &regions, store.as_ref());
    let result = runner.run(&args.request())?;

    if let Some(output) = &args.output {
        write_projection_csv(&result, output)
            .with_context(|| format!("writing report {}", output.display()))?;
    }
    Ok(result)
}

pub fn main() -> Result<()> {
    let args = ProjectionArgs::parse();
    let level: LevelFilter = args
        .log_level
        .parse()
        .map_err(|_| anyhow!("unknown log level {}", args.log_level))?;
    set_log_level(level);

    let result = run_with_args(&args)?;
    let params = &result.chosen_parameters;
    println!(
        "{}: {} days from {}",
        result.region,
        result.daily_projected_cases.len(),
        result.projection_start
    );
    println!(
        "parameters: transmission {:.4}, peak week {}, spread {}",
        params.transmission_probability, params.wave1_peak_week, params.wave1_spread
    );
    println!(
        "test window error {:.4} (constant-rate baseline {:.4})",
        result.test_window_error, result.baseline_test_error
    );
    Ok(())
}
