use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use dotenv::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::info;

use lifeexp_dashboard::api::{AppState, DashboardServer};
use lifeexp_dashboard::core::Settings;
use lifeexp_dashboard::dataset::{source_for, DatasetStore};
use lifeexp_dashboard::ml::{Trainer, TrainingReport};
use lifeexp_dashboard::monitoring::{self, LogLevel, TelemetryConfig};
use lifeexp_dashboard::predictor::{PredictionRequest, Predictor, PredictorForm};
use lifeexp_dashboard::track_performance;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file layered over config/default.toml
    #[arg(short, long, global = true, env = "LIFEEXP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard page and its API
    Serve,
    /// Fit the random forest and write the model artifact
    Train {
        /// Artifact path (overrides model.path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Predict life expectancy once from the command line
    Predict {
        #[arg(long, default_value_t = 2000)]
        year: i64,
        #[arg(long, default_value_t = 1_000_000)]
        pop: i64,
        #[arg(long = "gdp-percap", default_value_t = 5000)]
        gdp_percap: i64,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize logging
    let log_level = settings
        .log_level
        .parse::<LogLevel>()
        .map_err(anyhow::Error::msg)
        .context("Invalid log_level")?;
    monitoring::init_telemetry(&TelemetryConfig {
        log_level,
        respect_env: true,
    });

    match cli.command {
        Commands::Serve => serve(settings).await,
        Commands::Train { output } => train(settings, output).await,
        Commands::Predict {
            year,
            pop,
            gdp_percap,
        } => predict(
            &settings,
            PredictionRequest {
                year,
                pop,
                gdp_percap,
            },
        ),
        Commands::Config => {
            print!("{}", settings.to_toml()?);
            Ok(())
        }
    }
}

async fn serve(settings: Settings) -> Result<()> {
    let store = DatasetStore::new(source_for(settings.dataset.path.as_ref()));
    let predictor = Predictor::load(&settings.model.path, PredictorForm::default()).with_context(|| {
        format!(
            "Failed to load model from {} (run `lifeexp train` first)",
            settings.model.path.display()
        )
    })?;

    let state = AppState::new(store, settings.charts.clone(), predictor);
    state.warm_up().await.context("Failed to load dataset")?;

    DashboardServer::new(settings.server.clone(), state).start().await
}

async fn train(settings: Settings, output: Option<PathBuf>) -> Result<()> {
    track_performance!("training");
    let path = output.unwrap_or_else(|| settings.model.path.clone());

    let store = DatasetStore::new(source_for(settings.dataset.path.as_ref()));
    let dataset = store.get().await.context("Failed to load dataset")?;

    let trainer = Trainer::from_settings(&settings.model);
    let progress = ProgressBar::new(trainer.params().n_estimators as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} fitting trees [{bar:40}] {pos}/{len} ({elapsed})")
            .context("Invalid progress template")?
            .progress_chars("=> "),
    );

    let (artifact, report) = trainer
        .train(&dataset, |done| progress.set_position(done as u64))
        .context("Training failed")?;
    progress.finish_and_clear();

    artifact
        .save(&path)
        .with_context(|| format!("Failed to write model to {}", path.display()))?;

    print_report(&report);
    println!("{} {}", style("Model saved as").bold(), path.display());
    Ok(())
}

fn print_report(report: &TrainingReport) {
    println!(
        "{} {} rows ({} train / {} test), {} trees in {:.1?}",
        style("Trained on").bold(),
        report.n_rows,
        report.n_train,
        report.n_test,
        report.n_trees,
        report.elapsed
    );
    println!("{} {}", style("Mean Squared Error:").green().bold(), report.forest_mse);
    if let Some(baseline) = report.baseline_mse {
        println!("{} {}", style("Linear baseline MSE:").dim(), baseline);
    }
}

fn predict(settings: &Settings, request: PredictionRequest) -> Result<()> {
    let predictor = Predictor::load(&settings.model.path, PredictorForm::default())
        .with_context(|| format!("Failed to load model from {}", settings.model.path.display()))?;

    let result = predictor.predict(&request)?;
    if result.input != request {
        info!(requested = ?request, used = ?result.input, "Inputs clamped to form bounds");
    }
    println!("Predicted life expectancy: {}", result.life_expectancy);
    Ok(())
}
