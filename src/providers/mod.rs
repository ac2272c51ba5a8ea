//! Remote generation providers.
//!
//! The expander and the pipeline only see the traits here, so tests can swap in
//! fakes and the CLI can hand over real clients.

pub mod openai;
pub mod replicate;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::{DEFAULT_ASPECT_RATIO, DEFAULT_SEED, DEFAULT_SHARPNESS};
use crate::error::GenerationError;

pub use openai::OpenAiChatClient;
pub use replicate::ReplicateImageClient;

/// A chat-style completion request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// System instruction
    pub system: String,
    /// User prompt
    pub user: String,
}

/// Something that can turn a prompt into candidate completions.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &str;

    /// Returns every candidate completion the provider gave back, in order.
    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>, GenerationError>;
}

/// Speed/fidelity trade-off for image generation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize, clap::ValueEnum)]
pub enum Performance {
    /// Fast, reasonable quality
    #[default]
    Speed,
    /// Slower, higher fidelity
    Quality,
    /// Fastest, lowest fidelity
    #[serde(rename = "Extreme Speed")]
    ExtremeSpeed,
}

/// Knobs passed to the image provider alongside each prompt.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GenerationSettings {
    /// Speed/fidelity trade-off
    pub performance: Performance,
    /// Output dimensions, eg `1024*1024`
    pub aspect_ratio: String,
    /// Same seed and prompt give the same image
    pub seed: i64,
    /// Edge contrast in the output
    pub sharpness: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            performance: Performance::default(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            seed: DEFAULT_SEED,
            sharpness: DEFAULT_SHARPNESS,
        }
    }
}

/// A single image generation request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImageRequest {
    /// What to draw
    pub prompt: String,
    /// How to draw it
    pub settings: GenerationSettings,
}

/// Something that renders prompts into retrievable images.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &str;

    /// Returns references to the generated images, in the order the provider listed them.
    async fn generate(&self, request: &ImageRequest) -> Result<Vec<Url>, GenerationError>;
}

/// Joins an API base with a path, tolerating a trailing slash on the base.
pub(crate) fn endpoint(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
