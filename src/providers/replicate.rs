//! Replicate predictions client, shaped for the Fooocus image models.
//!
//! A prediction is created with `Prefer: wait`. If it hasn't finished by the
//! time Replicate answers, we follow `urls.get` until it has.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::{ImageProvider, ImageRequest, Performance, endpoint};
use crate::constants::{REPLICATE_BASE_URL, REPLICATE_POLL_INTERVAL_MS};
use crate::error::{GenerationError, PipelineError};

/// Which model a prediction runs on.
#[derive(Clone, Debug, Eq, PartialEq)]
enum ModelRef {
    /// `owner/name:version`, run through `/v1/predictions`
    Version(String),
    /// `owner/name`, run on the model's latest version
    Latest(String),
}

impl ModelRef {
    fn parse(model: &str) -> Result<Self, PipelineError> {
        let model = model.trim();
        if model.contains(['{', '}']) {
            return Err(PipelineError::Config(format!(
                "Image model identifier has an unresolved placeholder: {model}"
            )));
        }
        let (name, version) = match model.split_once(':') {
            Some((name, version)) => (name, Some(version)),
            None => (model, None),
        };
        let valid_name = name
            .split_once('/')
            .is_some_and(|(owner, model)| !owner.is_empty() && !model.is_empty() && !model.contains('/'));
        if !valid_name {
            return Err(PipelineError::Config(format!(
                "Image model must look like owner/name[:version], got: {model}"
            )));
        }
        match version {
            Some("") => Err(PipelineError::Config(format!(
                "Image model has an empty version: {model}"
            ))),
            Some(version) => Ok(Self::Version(version.to_string())),
            None => Ok(Self::Latest(name.to_string())),
        }
    }
}

/// Request body for creating a prediction.
#[derive(Serialize, Debug)]
struct PredictionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    input: FooocusInput<'a>,
}

#[derive(Serialize, Debug)]
struct FooocusInput<'a> {
    prompt: &'a str,
    performance_selection: Performance,
    aspect_ratios_selection: &'a str,
    image_seed: i64,
    sharpness: u32,
}

#[derive(Deserialize, Debug)]
struct Prediction {
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    urls: Option<PredictionUrls>,
}

#[derive(Deserialize, Debug)]
struct PredictionUrls {
    #[serde(default)]
    get: Option<String>,
}

/// Generates images through Replicate.
#[derive(Clone, Debug)]
pub struct ReplicateImageClient {
    client: reqwest::Client,
    api_token: String,
    base_url: String,
    model: ModelRef,
    poll_interval: Duration,
}

impl ReplicateImageClient {
    /// Builds a client for `model` (`owner/name` or `owner/name:version`).
    ///
    /// Identifiers with `{`/`}` in them are refused, they're an unsubstituted template.
    pub fn new(
        client: reqwest::Client,
        api_token: impl Into<String>,
        model: &str,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            client,
            api_token: api_token.into(),
            base_url: REPLICATE_BASE_URL.to_string(),
            model: ModelRef::parse(model)?,
            poll_interval: Duration::from_millis(REPLICATE_POLL_INTERVAL_MS),
        })
    }

    /// Points the client at a different API host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Changes how long to wait between status checks of an unfinished prediction.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Prediction, GenerationError> {
        let resp = builder.bearer_auth(&self.api_token).send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                code: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).to_string(),
            });
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Pulls image URLs out of a prediction's `output`, which is a list or a single string.
///
/// Positions are kept: an unusable first item is an error rather than letting
/// the second image stand in for it, and an unusable later item ends the list.
fn output_urls(output: Option<Value>) -> Result<Vec<Url>, GenerationError> {
    let values = match output {
        Some(Value::Array(values)) => values,
        Some(value @ Value::String(_)) => vec![value],
        Some(other) => {
            return Err(GenerationError::Provider(format!(
                "unexpected prediction output shape: {other}"
            )));
        }
        None => return Ok(Vec::new()),
    };

    let mut urls = Vec::with_capacity(values.len());
    for (position, value) in values.into_iter().enumerate() {
        let parsed = match &value {
            Value::String(raw) => Url::parse(raw).map_err(|err| err.to_string()),
            _ => Err("not a string".to_string()),
        };
        match parsed {
            Ok(url) => urls.push(url),
            Err(reason) if position == 0 => {
                return Err(GenerationError::Provider(format!(
                    "first prediction output {value} is not an image reference: {reason}"
                )));
            }
            Err(reason) => {
                warn!("Ignoring prediction output {value} and everything after it: {reason}");
                break;
            }
        }
    }
    Ok(urls)
}

#[async_trait]
impl ImageProvider for ReplicateImageClient {
    fn name(&self) -> &str {
        "replicate"
    }

    async fn generate(&self, request: &ImageRequest) -> Result<Vec<Url>, GenerationError> {
        let input = FooocusInput {
            prompt: &request.prompt,
            performance_selection: request.settings.performance,
            aspect_ratios_selection: &request.settings.aspect_ratio,
            image_seed: request.settings.seed,
            sharpness: request.settings.sharpness,
        };
        let (url, version) = match &self.model {
            ModelRef::Version(version) => (
                endpoint(&self.base_url, "/v1/predictions"),
                Some(version.as_str()),
            ),
            ModelRef::Latest(name) => (
                endpoint(&self.base_url, &format!("/v1/models/{name}/predictions")),
                None,
            ),
        };

        let mut prediction = self
            .send(
                self.client
                    .post(url)
                    .header("Prefer", "wait")
                    .json(&PredictionRequest { version, input }),
            )
            .await?;

        loop {
            match prediction.status.as_str() {
                "succeeded" => {
                    info!("Image generated successfully.");
                    return output_urls(prediction.output);
                }
                "failed" | "canceled" => {
                    let reason = match prediction.error {
                        Some(Value::String(message)) => message,
                        Some(other) => other.to_string(),
                        None => format!("prediction {}", prediction.status),
                    };
                    return Err(GenerationError::Provider(reason));
                }
                status => {
                    let Some(poll_url) = prediction.urls.and_then(|urls| urls.get) else {
                        return Err(GenerationError::Provider(format!(
                            "prediction is {status} but has no status URL"
                        )));
                    };
                    debug!("Prediction is {status}, checking again in {:?}", self.poll_interval);
                    tokio::time::sleep(self.poll_interval).await;
                    prediction = self.send(self.client.get(poll_url)).await?;
                }
            }
        }
    }
}
