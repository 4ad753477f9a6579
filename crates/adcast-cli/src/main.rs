mod predict;
mod train;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "adcast-cli")]
#[command(about = "Train ad outcome models and query them offline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the training pipeline and write artifacts
    Train {
        /// Directory holding campaigns.csv, ads.csv and `ad_events.csv`
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Directory to write the schema, models and report into
        #[arg(long)]
        artifact_dir: Option<PathBuf>,
        /// Pipeline YAML overriding the default columns and targets
        #[arg(long)]
        pipeline: Option<PathBuf>,
    },
    /// Predict every target for one ad, given as JSON or `@file`
    Predict {
        #[arg(long)]
        input: String,
        #[arg(long)]
        artifact_dir: Option<PathBuf>,
        #[arg(long)]
        pipeline: Option<PathBuf>,
    },
    /// Print the persisted feature schema
    Schema {
        #[arg(long)]
        artifact_dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = adcast_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Train {
            data_dir,
            artifact_dir,
            pipeline,
        }) => train::run_train(
            &data_dir.unwrap_or_else(|| config.data_dir.clone()),
            &artifact_dir.unwrap_or_else(|| config.artifact_dir.clone()),
            &pipeline.unwrap_or_else(|| config.pipeline_path.clone()),
        )?,
        Some(Commands::Predict {
            input,
            artifact_dir,
            pipeline,
        }) => predict::run_predict(
            &input,
            &artifact_dir.unwrap_or_else(|| config.artifact_dir.clone()),
            &pipeline.unwrap_or_else(|| config.pipeline_path.clone()),
        )?,
        Some(Commands::Schema { artifact_dir }) => {
            predict::run_schema(&artifact_dir.unwrap_or_else(|| config.artifact_dir.clone()))?;
        }
        None => println!("adcast-cli: run `adcast-cli --help` for commands"),
    }

    Ok(())
}
