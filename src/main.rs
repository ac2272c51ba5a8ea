use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use framegen::brief::{AssetBrief, Brief};
use framegen::cli::{CliOptions, Command};
use framegen::config::{build_expander, build_pipeline, setup_logging};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env is fine, everything can come from flags or the real environment
    let _ = dotenvy::dotenv();
    let cli = CliOptions::parse();

    if let Err(err) = setup_logging(cli.debug) {
        eprintln!("Continuing without logging: {err}");
    }

    let client = reqwest::Client::new();

    match &cli.command {
        Command::Expand { brief } => {
            let brief: Brief = read_json(brief)?;
            let expander = build_expander(&cli, &client)?;
            let frames = expander.expand(&brief).await?;
            print_json(&frames)?;
        }
        Command::Generate { brief } => {
            let brief: AssetBrief = read_json(brief)?;
            let pipeline = build_pipeline(&cli, &client)?;
            let result = pipeline.generate(&brief, &cli.out_dir).await?;
            print_json(&result)?;
        }
        Command::Run { brief } => {
            let brief: Brief = read_json(brief)?;
            let expander = build_expander(&cli, &client)?;
            let pipeline = build_pipeline(&cli, &client)?;
            let frames = expander.expand(&brief).await?;
            info!("Expanded {} entries into {} frames", brief.len(), frames.len());
            let result = pipeline.generate(&AssetBrief::from(frames), &cli.out_dir).await?;
            print_json(&result)?;
        }
    }
    Ok(())
}
