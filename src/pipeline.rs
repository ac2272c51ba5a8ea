//! Turns every element of every frame into a generated, downloaded image.
//!
//! Work is strictly sequential: one element finishes (generate, download, save)
//! before the next one starts, so results come back in input order.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};
use url::Url;

use crate::brief::{AssetBrief, AssetResult, GeneratedAsset};
use crate::download;
use crate::error::{PipelineError, RetrievalError};
use crate::providers::{GenerationSettings, ImageProvider, ImageRequest};

/// What to do when an element's image can't be downloaded or saved.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, clap::ValueEnum)]
pub enum RetrievalFailurePolicy {
    /// Stop the run and return the error
    #[default]
    Abort,
    /// Log it and carry on without that element
    SkipElement,
}

/// Generates, fetches and stores images for an [`AssetBrief`].
pub struct AssetPipeline<P> {
    provider: P,
    client: reqwest::Client,
    settings: GenerationSettings,
    policy: RetrievalFailurePolicy,
}

impl<P: ImageProvider> AssetPipeline<P> {
    /// Default generation settings, aborting on the first retrieval failure.
    pub fn new(provider: P, client: reqwest::Client) -> Self {
        Self {
            provider,
            client,
            settings: GenerationSettings::default(),
            policy: RetrievalFailurePolicy::default(),
        }
    }

    /// Sets the settings sent with every image request.
    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets what happens when an image can't be retrieved.
    pub fn with_policy(mut self, policy: RetrievalFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Asks the provider for an image of `description`.
    ///
    /// Provider failures are logged and come back as `None`.
    pub async fn request_image(&self, description: &str) -> Option<Url> {
        let request = ImageRequest {
            prompt: description.to_string(),
            settings: self.settings.clone(),
        };
        match self.provider.generate(&request).await {
            Ok(refs) => {
                let first = refs.into_iter().next();
                if first.is_none() {
                    error!("Failed to generate image: {} returned no images", self.provider.name());
                }
                first
            }
            Err(err) => {
                error!("Failed to generate image via {}: {}", self.provider.name(), err);
                None
            }
        }
    }

    /// Downloads `reference` and saves it into `destination`.
    pub async fn fetch_and_store(
        &self,
        reference: &Url,
        destination: &Path,
    ) -> Result<(Url, PathBuf), RetrievalError> {
        download::fetch_and_store(&self.client, reference, destination).await
    }

    /// Renders every element of every frame in `brief` into `destination`.
    ///
    /// Top-level keys that aren't frames are left alone. Elements whose image
    /// couldn't be generated are left out of the result.
    pub async fn generate(
        &self,
        brief: &AssetBrief,
        destination: &Path,
    ) -> Result<AssetResult, PipelineError> {
        let mut result = AssetResult::default();

        for (frame, elements) in brief.frames() {
            result.frame_mut(frame);
            for (label, description) in elements {
                let Some(reference) = self.request_image(description).await else {
                    warn!("No image for {}/'{}', skipping it", frame, label);
                    continue;
                };

                match self.fetch_and_store(&reference, destination).await {
                    Ok((source, saved_path)) => {
                        result.frame_mut(frame).push(GeneratedAsset {
                            label: label.clone(),
                            source,
                            saved_path,
                        });
                    }
                    Err(err) => match self.policy {
                        RetrievalFailurePolicy::Abort => {
                            error!("Failed to retrieve {} for {}/'{}': {}", reference, frame, label, err);
                            return Err(PipelineError::Retrieval {
                                frame: frame.to_string(),
                                label: label.clone(),
                                source: err,
                            });
                        }
                        RetrievalFailurePolicy::SkipElement => {
                            warn!(
                                "Skipping {}/'{}', failed to retrieve {}: {}",
                                frame, label, reference, err
                            );
                        }
                    },
                }
            }
        }

        info!(
            "Saved {} images across {} frames",
            result.asset_count(),
            result.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedImages, png_bytes, spawn_file_server};
    use serde_json::json;

    struct Fixture {
        base: String,
        _served: tempfile::TempDir,
        out: tempfile::TempDir,
    }

    async fn fixture(files: &[&str]) -> Fixture {
        let served = tempfile::tempdir().expect("tempdir");
        for file in files {
            std::fs::write(served.path().join(file), png_bytes()).expect("write fixture");
        }
        let base = spawn_file_server(served.path()).await;
        Fixture {
            base,
            _served: served,
            out: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn brief(value: serde_json::Value) -> AssetBrief {
        serde_json::from_value(value).expect("asset brief")
    }

    fn labels(result: &AssetResult, frame: &str) -> Vec<String> {
        result
            .get(frame)
            .expect("frame present")
            .iter()
            .map(|asset| asset.label.clone())
            .collect()
    }

    #[tokio::test]
    async fn keeps_element_order_and_ignores_non_frames() {
        let fx = fixture(&["a.png", "b.png", "c.png"]).await;
        let provider = ScriptedImages::default()
            .image("draw a", &format!("{}/files/a.png", fx.base))
            .image("draw b", &format!("{}/files/b.png", fx.base))
            .image("draw c", &format!("{}/files/c.png", fx.base));
        let pipeline = AssetPipeline::new(provider, reqwest::Client::new());

        let input = brief(json!({
            "frame_1": {"A": "draw a", "B": "draw b", "C": "draw c"},
            "frame_2": "draw a",
            "explanation": "never drawn"
        }));
        let result = pipeline
            .generate(&input, fx.out.path())
            .await
            .expect("generate");

        assert_eq!(result.len(), 1);
        assert_eq!(labels(&result, "frame_1"), vec!["A", "B", "C"]);
        let first = &result.get("frame_1").expect("frame_1")[0];
        assert_eq!(first.saved_path, fx.out.path().join("a.png"));
        assert!(first.saved_path.exists());
        assert_eq!(
            *pipeline.provider.prompts.lock().expect("lock"),
            vec!["draw a", "draw b", "draw c"]
        );
    }

    #[tokio::test]
    async fn element_without_image_is_left_out() {
        let fx = fixture(&["a.png", "c.png"]).await;
        let provider = ScriptedImages::default()
            .image("draw a", &format!("{}/files/a.png", fx.base))
            .image("draw c", &format!("{}/files/c.png", fx.base));
        let pipeline = AssetPipeline::new(provider, reqwest::Client::new());

        let input = brief(json!({
            "frame_1": {"A": "draw a", "B": "no provider script for this", "C": "draw c"},
            "frame_2": {"B": "nothing here either"}
        }));
        let result = pipeline
            .generate(&input, fx.out.path())
            .await
            .expect("generate");

        assert_eq!(labels(&result, "frame_1"), vec!["A", "C"]);
        assert_eq!(result.get("frame_2"), Some(&[][..]));
    }

    #[tokio::test]
    async fn retrieval_failure_aborts_by_default() {
        let fx = fixture(&["a.png"]).await;
        let provider = ScriptedImages::default()
            .image("draw a", &format!("{}/files/a.png", fx.base))
            .image("draw gone", &format!("{}/files/gone.png", fx.base));
        let pipeline = AssetPipeline::new(provider, reqwest::Client::new());

        let input = brief(json!({"frame_1": {"A": "draw a", "Gone": "draw gone"}}));
        let err = pipeline
            .generate(&input, fx.out.path())
            .await
            .expect_err("should abort");

        match err {
            PipelineError::Retrieval {
                frame,
                label,
                source,
            } => {
                assert_eq!(frame, "frame_1");
                assert_eq!(label, "Gone");
                assert_eq!(source.status_code(), Some(404));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn skip_element_policy_isolates_failures() {
        let fx = fixture(&["a.png", "c.png"]).await;
        let provider = ScriptedImages::default()
            .image("draw a", &format!("{}/files/a.png", fx.base))
            .image("draw gone", &format!("{}/files/gone.png", fx.base))
            .image("draw c", &format!("{}/files/c.png", fx.base));
        let pipeline = AssetPipeline::new(provider, reqwest::Client::new())
            .with_policy(RetrievalFailurePolicy::SkipElement);

        let input = brief(json!({
            "frame_1": {"A": "draw a", "Gone": "draw gone"},
            "frame_2": {"C": "draw c"}
        }));
        let result = pipeline
            .generate(&input, fx.out.path())
            .await
            .expect("generate");

        assert_eq!(labels(&result, "frame_1"), vec!["A"]);
        assert_eq!(labels(&result, "frame_2"), vec!["C"]);
        assert!(!fx.out.path().join("gone.png").exists());
    }

    #[tokio::test]
    async fn request_image_swallows_provider_errors() {
        let pipeline = AssetPipeline::new(ScriptedImages::default(), reqwest::Client::new());
        assert!(pipeline.request_image("anything").await.is_none());
    }
}
