//! CLI parser
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_ASPECT_RATIO, DEFAULT_IMAGE_MODEL, DEFAULT_SEED, DEFAULT_SHARPNESS, DEFAULT_TEXT_MODEL,
    IMAGE_DIR, OPENAI_BASE_URL, REPLICATE_BASE_URL,
};
use crate::expander::ExpansionFailurePolicy;
use crate::pipeline::RetrievalFailurePolicy;
use crate::providers::Performance;

#[derive(Parser, Debug)]
#[command(name = "framegen")]
#[command(about = "Expand a framed creative brief and render each element to an image")]
/// CLI Options
pub struct CliOptions {
    #[clap(long, global = true, help = "Enable debug logging", env = "FRAMEGEN_DEBUG")]
    /// Enable debug logging. Env: FRAMEGEN_DEBUG
    pub debug: bool,

    #[clap(long, global = true, default_value = IMAGE_DIR, env = "FRAMEGEN_IMAGE_DIR")]
    /// Where downloaded images are written, defaults to `./images`.
    /// Env: FRAMEGEN_IMAGE_DIR
    pub out_dir: PathBuf,

    #[clap(long, global = true, env = "OPENAI_API_KEY", hide_env_values = true)]
    /// OpenAI API key, needed to expand descriptions
    pub openai_api_key: Option<String>,

    #[clap(long, global = true, default_value = OPENAI_BASE_URL, env = "OPENAI_BASE_URL")]
    /// OpenAI API base URL
    pub openai_base_url: String,

    #[clap(long, global = true, default_value = DEFAULT_TEXT_MODEL, env = "FRAMEGEN_TEXT_MODEL")]
    /// Text model used to expand descriptions
    pub text_model: String,

    #[clap(long, global = true, env = "REPLICATE_API_TOKEN", hide_env_values = true)]
    /// Replicate API token, needed to generate images
    pub replicate_api_token: Option<String>,

    #[clap(long, global = true, default_value = REPLICATE_BASE_URL, env = "REPLICATE_BASE_URL")]
    /// Replicate API base URL
    pub replicate_base_url: String,

    #[clap(long, global = true, default_value = DEFAULT_IMAGE_MODEL, env = "FRAMEGEN_IMAGE_MODEL")]
    /// Replicate image model, `owner/name` or `owner/name:version`
    pub image_model: String,

    #[clap(long, global = true, value_enum, default_value_t = Performance::Speed)]
    /// Speed/fidelity trade-off for image generation
    pub performance: Performance,

    #[clap(long, global = true, default_value = DEFAULT_ASPECT_RATIO)]
    /// Output size, eg `1024*1024`
    pub aspect_ratio: String,

    #[clap(long, global = true, default_value_t = DEFAULT_SEED)]
    /// Seed for reproducible images
    pub seed: i64,

    #[clap(long, global = true, default_value_t = DEFAULT_SHARPNESS)]
    /// Edge contrast of generated images
    pub sharpness: u32,

    #[clap(long, global = true, value_enum, default_value_t = ExpansionFailurePolicy::Abort)]
    /// What to do when a description can't be expanded
    pub on_expansion_failure: ExpansionFailurePolicy,

    #[clap(long, global = true, value_enum, default_value_t = RetrievalFailurePolicy::Abort)]
    /// What to do when an image can't be downloaded
    pub on_retrieval_failure: RetrievalFailurePolicy,

    #[command(subcommand)]
    /// What to do
    pub command: Command,
}

#[derive(Subcommand, Debug)]
/// Subcommands
pub enum Command {
    /// Expand a brief (`{"label": "description"}` JSON) into numbered frames
    Expand {
        /// Path to the brief JSON file
        brief: PathBuf,
    },
    /// Render an already-framed brief (`{"frame_1": {"label": "description"}}` JSON)
    Generate {
        /// Path to the framed brief JSON file
        brief: PathBuf,
    },
    /// Expand a brief, then render every frame
    Run {
        /// Path to the brief JSON file
        brief: PathBuf,
    },
}
