//! Shared constants/defaults for things
//!

/// The default place we put images
pub const IMAGE_DIR: &str = "./images";

/// Only top-level brief keys starting with this are turned into images.
pub const FRAME_PREFIX: &str = "frame";

/// Label that gets renamed on expansion.
pub const CTA_LABEL: &str = "CTA Button";

/// Abbreviation replaced inside expanded CTA descriptions.
pub const CTA_ABBREVIATION: &str = "CTA";

/// What [`CTA_LABEL`] and [`CTA_ABBREVIATION`] become.
pub const CALL_TO_ACTION: &str = "Call to Action";

/// Default text model used to expand descriptions.
pub const DEFAULT_TEXT_MODEL: &str = "gpt-3.5-turbo";

/// Default Replicate model (`owner/name:version`) used to render images.
pub const DEFAULT_IMAGE_MODEL: &str = "konieshadow/fooocus-api-realistic:612fd74b69e6c030e88f6548848593a1aaabe16a09cb79e6d714718c15f37f47";

/// OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Replicate API base URL.
pub const REPLICATE_BASE_URL: &str = "https://api.replicate.com";

/// How long to wait between polls of an unfinished Replicate prediction.
pub const REPLICATE_POLL_INTERVAL_MS: u64 = 1000;

/// System instruction for the expansion model.
pub const EXPANSION_SYSTEM_PROMPT: &str = "You are a helpful assistant. Your task is to generate a more detailed description based on the given description.";

/// Builds the user prompt asking for a more detailed description of one element.
pub fn expansion_user_prompt(label: &str, description: &str) -> String {
    format!(
        "Given the following description, generate a more detailed description:\n{label}: {description}\n"
    )
}

/// Default seed for image generation.
pub const DEFAULT_SEED: i64 = 1234;

/// Default sharpness for image generation.
pub const DEFAULT_SHARPNESS: u32 = 2;

/// Default aspect ratio for image generation.
pub const DEFAULT_ASPECT_RATIO: &str = "1024*1024";
