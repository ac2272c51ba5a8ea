//! Elaborates each brief entry into a longer description, one frame per entry.

use tracing::{error, info, warn};

use crate::brief::{Brief, ExpandedFrames};
use crate::constants::{
    CALL_TO_ACTION, CTA_ABBREVIATION, CTA_LABEL, DEFAULT_TEXT_MODEL, EXPANSION_SYSTEM_PROMPT,
    expansion_user_prompt,
};
use crate::error::{GenerationError, PipelineError};
use crate::providers::{CompletionProvider, CompletionRequest};

/// What to do when one entry can't be expanded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum ExpansionFailurePolicy {
    /// Stop and return the error
    #[default]
    Abort,
    /// Log it and leave the entry out
    Skip,
}

/// Renames the CTA label and spells out the abbreviation in its description.
pub fn normalize_call_to_action(label: &str, description: String) -> (String, String) {
    if label == CTA_LABEL {
        (
            CALL_TO_ACTION.to_string(),
            description.replace(CTA_ABBREVIATION, CALL_TO_ACTION),
        )
    } else {
        (label.to_string(), description)
    }
}

/// Expands brief descriptions through a [`CompletionProvider`].
pub struct DescriptionExpander<C> {
    provider: C,
    model: String,
    policy: ExpansionFailurePolicy,
}

impl<C: CompletionProvider> DescriptionExpander<C> {
    /// Uses the default model and aborts on the first failure.
    pub fn new(provider: C) -> Self {
        Self {
            provider,
            model: DEFAULT_TEXT_MODEL.to_string(),
            policy: ExpansionFailurePolicy::default(),
        }
    }

    /// Sets the model identifier sent with each request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets what happens when an entry can't be expanded.
    pub fn with_policy(mut self, policy: ExpansionFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Asks for one detailed description, trimmed.
    async fn expand_one(&self, label: &str, description: &str) -> Result<String, GenerationError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            system: EXPANSION_SYSTEM_PROMPT.to_string(),
            user: expansion_user_prompt(label, description),
        };
        let choices = self.provider.complete(&request).await?;
        let first = choices
            .into_iter()
            .next()
            .map(|choice| choice.trim().to_string())
            .unwrap_or_default();
        if first.is_empty() {
            return Err(GenerationError::Empty);
        }
        Ok(first)
    }

    /// Expands every entry of `brief`, in order, into `frame_1..frame_n`.
    pub async fn expand(&self, brief: &Brief) -> Result<ExpandedFrames, PipelineError> {
        let mut frames = ExpandedFrames::default();
        for (label, description) in brief.iter() {
            let expanded = match self.expand_one(label, description).await {
                Ok(expanded) => expanded,
                Err(err) => match self.policy {
                    ExpansionFailurePolicy::Abort => {
                        error!(
                            "Failed to expand '{}' via {}: {}",
                            label,
                            self.provider.name(),
                            err
                        );
                        return Err(PipelineError::Expansion {
                            label: label.to_string(),
                            source: err,
                        });
                    }
                    ExpansionFailurePolicy::Skip => {
                        warn!(
                            "Skipping '{}', {} failed to expand it: {}",
                            label,
                            self.provider.name(),
                            err
                        );
                        continue;
                    }
                },
            };
            let (label, expanded) = normalize_call_to_action(label, expanded);
            let frame = frames.push(label, expanded);
            info!("Expanded {} via {}", frame, self.provider.name());
        }
        Ok(frames)
    }
}
