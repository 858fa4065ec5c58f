use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn, Level};

use trainload::advice::{retry_with_backoff, AdviceCache, AdviceCoach, AdviceContext, RuleBasedProvider};
use trainload::config::AppConfig;
use trainload::error::{ErrorSeverity, TrainLoadError};
use trainload::export::{self, text, ExportFormat};
use trainload::import::ImportManager;
use trainload::load_model::{LoadModel, RatioStatus};
use trainload::logging::init_logging;
use trainload::models::{Activity, Observation};
use trainload::summary::{ActivityCategory, ActivitySummary};
use trainload::windows::LookbackWindow;

/// trainload - Training Load Model CLI
///
/// Turns an activity export into daily fitness, fatigue and form using an
/// impulse-response load model, and flags risky acute:chronic load ratios.
#[derive(Parser)]
#[command(name = "trainload")]
#[command(version)]
#[command(about = "Training load model CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the daily load series
    Series {
        /// Activity export (CSV or JSON); defaults to settings.activities_file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Range end (YYYY-MM-DD, default: today)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Lookback window when --from is not given (1Y, YTD, 6M, 3M, 30D, 7D, <n>D)
        #[arg(short, long)]
        window: Option<LookbackWindow>,

        /// Output format (table, csv, json)
        #[arg(short = 'F', long)]
        format: Option<ExportFormat>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show fitness, fatigue, form and load status for one day
    Status {
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Day to report (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project tomorrow's numbers for a planned training stress
    Forecast {
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Planned stress for the next day
        #[arg(short, long)]
        stress: f64,

        /// Last completed day (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Get coaching advice for the current load
    Advice {
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Day to advise on (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Free-form notes for the coach, e.g. "legs heavy after long run"
        #[arg(long)]
        context: Option<String>,

        /// Ignore cached advice and ask again
        #[arg(long)]
        refresh: bool,
    },

    /// Yearly project progress and activity volume trend
    Summary {
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Calendar year to total (default: current year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Activity category (all, running, strength, walking, other)
        #[arg(short = 'a', long, default_value = "all")]
        category: ActivityCategory,

        /// Trend window (1Y, YTD, 6M, 3M, 30D, 7D, <n>D)
        #[arg(short, long)]
        window: Option<LookbackWindow>,

        /// Last day of the trend window (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configure application settings
    Config {
        /// List all configuration options
        #[arg(short, long)]
        list: bool,

        /// Set a configuration value (key=value)
        #[arg(short, long)]
        set: Option<String>,

        /// Get a configuration value
        #[arg(short, long)]
        get: Option<String>,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<TrainLoadError>() {
            Some(app_err) => {
                report_error(app_err);
                eprintln!("{} {}", "Error:".red().bold(), app_err.user_message());
            }
            None => eprintln!("{} {:#}", "Error:".red().bold(), err),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_config_path);
    let mut config = AppConfig::load_or_default(Some(config_path.as_path()))
        .map_err(|e| TrainLoadError::Configuration(format!("{:#}", e)))?;

    let mut log_config = config.logging.clone();
    log_config.level = log_config.level.raised_by(cli.verbose);
    init_logging(&log_config)?;

    let today = Local::now().date_naive();

    match cli.command {
        Commands::Series {
            file,
            from,
            to,
            window,
            format,
            output,
        } => {
            let end = to.unwrap_or(today);
            let start = match (from, window) {
                (Some(from), _) => from,
                (None, Some(window)) => window.range(end).0,
                (None, None) => default_window(&config)?.range(end).0,
            };

            let observations = load_observations(&config, file.as_deref())?;
            let model = LoadModel::with_config(config.load_model);
            let series = model
                .compute_series(&observations, start, end)
                .map_err(TrainLoadError::from)?;
            let format = format.unwrap_or(config.settings.output_format);

            match output {
                Some(path) => {
                    export::write_series(&series, format, &path)
                        .map_err(TrainLoadError::from)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!(
                        "{} {} days written to {}",
                        "✓".green(),
                        series.len(),
                        path.display()
                    );
                }
                None => println!(
                    "{}",
                    export::render_series(&series, format).map_err(TrainLoadError::from)?
                ),
            }
        }

        Commands::Status { file, date, json } => {
            let as_of = date.unwrap_or(today);
            let observations = load_observations(&config, file.as_deref())?;
            let snapshot = LoadModel::with_config(config.load_model)
                .snapshot(&observations, as_of)
                .map_err(TrainLoadError::from)?;

            if json {
                println!(
                    "{}",
                    export::json::to_json_string(&snapshot).map_err(TrainLoadError::from)?
                );
            } else {
                println!("{}", "Training Load Status".bold());
                println!("{}", text::status_report(&snapshot).map_err(TrainLoadError::from)?);
                println!(
                    "Load: {}",
                    colorize_status(snapshot.ratio_status, snapshot.ratio_status.label())
                );
            }
        }

        Commands::Forecast { file, stress, date } => {
            let as_of = date.unwrap_or(today);
            let observations = load_observations(&config, file.as_deref())?;
            let model = LoadModel::with_config(config.load_model);

            let current = model
                .snapshot(&observations, as_of)
                .map_err(TrainLoadError::from)?;
            let projected = model
                .project_next_day(&observations, as_of, stress)
                .map_err(TrainLoadError::from)?;

            println!(
                "{}",
                format!("Forecast for {} with stress {:.1}", projected.date, stress)
                    .cyan()
                    .bold()
            );
            println!(
                "  Fitness: {:.1} → {:.1}",
                current.record.fitness, projected.fitness
            );
            println!(
                "  Fatigue: {:.1} → {:.1}",
                current.record.fatigue, projected.fatigue
            );
            println!("  Form:    {:.1} → {:.1}", current.record.form, projected.form);

            let status = trainload::classify_ratio(projected.acr);
            println!("  Load:    {}", colorize_status(status, status.label()));
        }

        Commands::Advice {
            file,
            date,
            context,
            refresh,
        } => {
            let as_of = date.unwrap_or(today);
            let observations = load_observations(&config, file.as_deref())?;
            let history_start = as_of - Duration::days(6);
            let series = LoadModel::with_config(config.load_model)
                .compute_series(&observations, history_start, as_of)
                .map_err(TrainLoadError::from)?;

            let advice_context =
                AdviceContext::from_series(&series, config.advice.goals.clone(), context)
                    .ok_or_else(|| TrainLoadError::from(trainload::advice::AdviceError::EmptyHistory))?;

            let cache_path = config.advice_cache_path();
            let cache = match AdviceCache::load(&cache_path, config.advice.cache_ttl()) {
                Ok(cache) => cache,
                Err(err) => {
                    warn!(error = %err, "Ignoring unreadable advice cache");
                    AdviceCache::with_ttl(config.advice.cache_ttl())
                }
            };

            let mut coach = AdviceCoach::with_cache(
                RuleBasedProvider::new(),
                config.advice.models.clone(),
                cache,
            );
            let policy = config.advice.backoff_policy();
            let result = retry_with_backoff(
                &policy,
                || {
                    if refresh {
                        coach.refresh(&advice_context)
                    } else {
                        coach.ask(&advice_context)
                    }
                },
                std::thread::sleep,
            );

            match result {
                Ok(advice) => {
                    println!("{} ({})", "Coach".magenta().bold(), advice.model.dimmed());
                    println!("{}", advice.advice);
                }
                Err(err) => {
                    let err = TrainLoadError::from(err);
                    report_error(&err);
                    println!("{} {}", "Coach".magenta().bold(), err.user_message());
                }
            }

            let mut cache = coach.into_cache();
            cache.purge_expired(chrono::Utc::now());
            if let Err(err) = cache.save(&cache_path) {
                warn!(error = %err, "Failed to save advice cache");
            }
        }

        Commands::Summary {
            file,
            year,
            category,
            window,
            date,
            json,
        } => {
            let as_of = date.unwrap_or(today);
            let window = match window {
                Some(window) => window,
                None => default_window(&config)?,
            };
            let activities = load_activities(&config, file.as_deref())?;
            let summary = ActivitySummary::build(
                &activities,
                year.unwrap_or_else(|| as_of.year()),
                &config.targets,
                category,
                window,
                as_of,
            );

            if json {
                println!(
                    "{}",
                    export::json::to_json_string(&summary).map_err(TrainLoadError::from)?
                );
            } else {
                println!("{}", "Activity Summary".bold());
                println!(
                    "{}",
                    text::summary_report(&summary).map_err(TrainLoadError::from)?
                );
            }
        }

        Commands::Config {
            list,
            set,
            get,
            init,
        } => {
            if init {
                if config_path.exists() {
                    bail!("Config file already exists: {}", config_path.display());
                }
                let mut fresh = AppConfig::default();
                fresh.save_to_file(&config_path)?;
                println!("{} Wrote {}", "✓".green(), config_path.display());
            } else if let Some(key_value) = set {
                let (key, value) = key_value
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Expected key=value, got: {}", key_value))?;
                config.set_value(key.trim(), value.trim())?;
                config.save_to_file(&config_path)?;
                info!(key = key.trim(), "Configuration updated");
                println!("{} {} = {}", "✓".green(), key.trim(), config.get_value(key.trim())?);
            } else if let Some(key) = get {
                println!("{}", config.get_value(&key)?);
            } else if list {
                println!("{}", format!("# {}", config_path.display()).dimmed());
                println!("{}", toml::to_string_pretty(&config)?);
            } else {
                println!("Config file: {}", config_path.display());
            }
        }
    }

    Ok(())
}

/// Read the activity export given on the command line or in the config
fn load_activities(config: &AppConfig, file: Option<&Path>) -> Result<Vec<Activity>> {
    let path = file
        .map(Path::to_path_buf)
        .or_else(|| config.settings.activities_file.clone())
        .ok_or_else(|| {
            anyhow!("No activity file given. Pass --file or set settings.activities_file")
        })?;

    let activities = ImportManager::new()
        .import_file(&path)
        .map_err(TrainLoadError::from)
        .with_context(|| format!("Failed to import {}", path.display()))?;
    Ok(activities)
}

/// Read the activity export and fold it into daily stress observations
fn load_observations(config: &AppConfig, file: Option<&Path>) -> Result<Vec<Observation>> {
    let activities = load_activities(config, file)?;
    let scorer = config.heart_rate.scorer().map_err(TrainLoadError::from)?;

    Ok(scorer.daily_observations(&activities))
}

fn default_window(config: &AppConfig) -> Result<LookbackWindow> {
    config
        .settings
        .lookback_window()
        .map_err(|e| TrainLoadError::Configuration(format!("{:#}", e)).into())
}

fn colorize_status(status: RatioStatus, label: &str) -> ColoredString {
    match status {
        RatioStatus::Undertraining => label.blue(),
        RatioStatus::Optimal => label.green(),
        RatioStatus::Overreaching => label.yellow(),
        RatioStatus::HighRisk => label.red().bold(),
    }
}

fn report_error(err: &TrainLoadError) {
    let severity = err.severity();
    let critical = severity == ErrorSeverity::Critical;
    match severity.to_tracing_level() {
        Level::ERROR => error!(error = %err, critical, "Command failed"),
        Level::WARN => warn!(error = %err, "Command degraded"),
        _ => info!(error = %err, "Command skipped"),
    }
}
