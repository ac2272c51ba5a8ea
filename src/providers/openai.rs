//! OpenAI chat completions client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CompletionProvider, CompletionRequest, endpoint};
use crate::constants::OPENAI_BASE_URL;
use crate::error::GenerationError;

/// Request body for POST /v1/chat/completions
#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize, Debug)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Talks to the OpenAI chat completions endpoint.
#[derive(Clone, Debug)]
pub struct OpenAiChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiChatClient {
    /// Client for the public OpenAI API.
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    /// Points the client at a different API host, eg a proxy or a test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiChatClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>, GenerationError> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        let resp = self
            .client
            .post(endpoint(&self.base_url, "/v1/chat/completions"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let bytes = resp.bytes().await?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                code: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).to_string(),
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_slice(&bytes)?;
        debug!("chat completion returned {} choices", parsed.choices.len());
        // null content (refusals, tool calls) stays in place as an empty candidate
        Ok(parsed
            .choices
            .into_iter()
            .map(|choice| choice.message.content.unwrap_or_default())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_router;
    use axum::Json;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use serde_json::{Value, json};

    async fn echo_completion(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Json(json!({
            "choices": [
                {"message": {"role": "assistant", "content": format!("{auth}|{}", body["model"].as_str().unwrap_or_default())}},
                {"message": {"role": "assistant", "content": body["messages"][1]["content"]}},
                {"message": {"role": "assistant", "content": body["messages"][0]["content"]}}
            ]
        }))
    }

    #[tokio::test]
    async fn sends_system_and_user_messages_with_bearer_auth() {
        let base = spawn_router(Router::new().route("/v1/chat/completions", post(echo_completion))).await;
        let client = OpenAiChatClient::new(reqwest::Client::new(), "sk-test").with_base_url(base);

        let choices = client
            .complete(&CompletionRequest {
                model: "gpt-3.5-turbo".to_string(),
                system: "be helpful".to_string(),
                user: "describe a circle".to_string(),
            })
            .await
            .expect("completion");

        assert_eq!(
            choices,
            vec![
                "Bearer sk-test|gpt-3.5-turbo".to_string(),
                "describe a circle".to_string(),
                "be helpful".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let base = spawn_router(Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
        ))
        .await;
        let client = OpenAiChatClient::new(reqwest::Client::new(), "nope").with_base_url(base);

        let err = client
            .complete(&CompletionRequest {
                model: "m".to_string(),
                system: "s".to_string(),
                user: "u".to_string(),
            })
            .await
            .expect_err("should fail");
        match err {
            GenerationError::Status { code, body } => {
                assert_eq!(code, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn null_first_choice_is_not_replaced_by_the_second() {
        let base = spawn_router(Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                Json(json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": null, "refusal": "no"}},
                        {"message": {"role": "assistant", "content": "SECOND CANDIDATE"}}
                    ]
                }))
            }),
        ))
        .await;
        let client = OpenAiChatClient::new(reqwest::Client::new(), "sk-test").with_base_url(base);

        let brief: crate::brief::Brief = [("Background", "a red circle")].into_iter().collect();
        let err = crate::expander::DescriptionExpander::new(client)
            .expand(&brief)
            .await
            .expect_err("unusable first choice");
        assert!(matches!(
            err,
            crate::error::PipelineError::Expansion {
                source: GenerationError::Empty,
                ..
            }
        ));
    }
}
