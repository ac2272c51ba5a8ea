//! Local fixture servers and fake providers shared by the unit tests.

use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use tower_http::services::ServeDir;
use url::Url;

use crate::error::GenerationError;
use crate::providers::{CompletionProvider, CompletionRequest, ImageProvider, ImageRequest};

/// Serves `router` on an ephemeral local port, returns its base URL.
pub(crate) async fn spawn_router(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture server");
    let addr = listener.local_addr().expect("fixture address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fixture server");
    });
    format!("http://{addr}")
}

/// Serves the files in `dir` under `/files/`, 404 for anything missing.
pub(crate) async fn spawn_file_server(dir: &Path) -> String {
    spawn_router(Router::new().nest_service("/files", ServeDir::new(dir))).await
}

/// A tiny valid PNG.
pub(crate) fn png_bytes() -> Vec<u8> {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        4,
        4,
        image::Rgb([200, 20, 20]),
    ));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// Completion provider that answers from a script and records what it was asked.
#[derive(Default)]
pub(crate) struct ScriptedCompletions {
    answers: HashMap<String, Result<Vec<String>, String>>,
    pub(crate) seen: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletions {
    /// Any request whose user prompt mentions `needle` gets `answer`.
    pub(crate) fn answer(mut self, needle: &str, answer: &[&str]) -> Self {
        self.answers.insert(
            needle.to_string(),
            Ok(answer.iter().map(|s| s.to_string()).collect()),
        );
        self
    }

    /// Any request whose user prompt mentions `needle` fails.
    pub(crate) fn fail(mut self, needle: &str, message: &str) -> Self {
        self.answers
            .insert(needle.to_string(), Err(message.to_string()));
        self
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletions {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Vec<String>, GenerationError> {
        self.seen.lock().expect("lock").push(request.clone());
        let answer = self
            .answers
            .iter()
            .find(|(needle, _)| request.user.contains(needle.as_str()))
            .map(|(_, answer)| answer.clone());
        match answer {
            Some(Ok(choices)) => Ok(choices),
            Some(Err(message)) => Err(GenerationError::Provider(message)),
            None => Ok(vec![format!("  detailed: {}  ", request.user.trim())]),
        }
    }
}

/// Image provider that maps prompts to fixed references.
#[derive(Default)]
pub(crate) struct ScriptedImages {
    refs: HashMap<String, Vec<Url>>,
    pub(crate) prompts: Mutex<Vec<String>>,
}

impl ScriptedImages {
    /// `prompt` renders to `reference`.
    pub(crate) fn image(mut self, prompt: &str, reference: &str) -> Self {
        self.refs.insert(
            prompt.to_string(),
            vec![Url::parse(reference).expect("fixture url")],
        );
        self
    }
}

#[async_trait]
impl ImageProvider for ScriptedImages {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, request: &ImageRequest) -> Result<Vec<Url>, GenerationError> {
        self.prompts
            .lock()
            .expect("lock")
            .push(request.prompt.clone());
        match self.refs.get(&request.prompt) {
            Some(refs) => Ok(refs.clone()),
            None => Err(GenerationError::Provider(format!(
                "no image scripted for {}",
                request.prompt
            ))),
        }
    }
}
