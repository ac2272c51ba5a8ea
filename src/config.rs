//! Config handling: logging setup, and turning CLI options into components.
//!
//! Credentials are read here, once, and handed to each client explicitly.

use tracing::log::LevelFilter;

use crate::cli::CliOptions;
use crate::error::PipelineError;
use crate::expander::DescriptionExpander;
use crate::pipeline::AssetPipeline;
use crate::providers::{GenerationSettings, OpenAiChatClient, ReplicateImageClient};

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("reqwest", LevelFilter::Warn)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Returns the secret or a config error naming the missing flag/env var.
fn require<'a>(value: Option<&'a str>, what: &str) -> Result<&'a str, PipelineError> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(PipelineError::Config(format!("{what} is not set"))),
    }
}

/// Image generation settings from the CLI flags.
pub fn generation_settings(cli: &CliOptions) -> GenerationSettings {
    GenerationSettings {
        performance: cli.performance,
        aspect_ratio: cli.aspect_ratio.clone(),
        seed: cli.seed,
        sharpness: cli.sharpness,
    }
}

/// Builds the description expander backed by OpenAI.
pub fn build_expander(
    cli: &CliOptions,
    client: &reqwest::Client,
) -> Result<DescriptionExpander<OpenAiChatClient>, PipelineError> {
    let api_key = require(
        cli.openai_api_key.as_deref(),
        "OpenAI API key (--openai-api-key / OPENAI_API_KEY)",
    )?;
    let provider =
        OpenAiChatClient::new(client.clone(), api_key).with_base_url(cli.openai_base_url.clone());
    Ok(DescriptionExpander::new(provider)
        .with_model(cli.text_model.clone())
        .with_policy(cli.on_expansion_failure))
}

/// Builds the asset pipeline backed by Replicate.
pub fn build_pipeline(
    cli: &CliOptions,
    client: &reqwest::Client,
) -> Result<AssetPipeline<ReplicateImageClient>, PipelineError> {
    let api_token = require(
        cli.replicate_api_token.as_deref(),
        "Replicate API token (--replicate-api-token / REPLICATE_API_TOKEN)",
    )?;
    let provider = ReplicateImageClient::new(client.clone(), api_token, &cli.image_model)?
        .with_base_url(cli.replicate_base_url.clone());
    Ok(AssetPipeline::new(provider, client.clone())
        .with_settings(generation_settings(cli))
        .with_policy(cli.on_retrieval_failure))
}
