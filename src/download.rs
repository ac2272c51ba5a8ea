//! Fetching generated images and saving them locally.

use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::RetrievalError;

/// The file name an image reference is saved under: its last non-empty path segment.
pub fn file_name_for(reference: &Url) -> Result<String, RetrievalError> {
    reference
        .path_segments()
        .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
        .map(str::to_string)
        .ok_or_else(|| RetrievalError::InvalidReference(reference.to_string()))
}

/// Downloads `reference`, checks it decodes as an image, and writes it into `destination`.
///
/// `destination` is created if it doesn't exist. Nothing is written unless the
/// download returned 200 and the bytes decoded.
pub async fn fetch_and_store(
    client: &reqwest::Client,
    reference: &Url,
    destination: &Path,
) -> Result<(Url, PathBuf), RetrievalError> {
    let file_name = file_name_for(reference)?;

    let resp = client.get(reference.clone()).send().await?;
    let status = resp.status();
    if status != StatusCode::OK {
        return Err(RetrievalError::Status(status.as_u16()));
    }
    let bytes = resp.bytes().await?;
    debug!("Downloaded {} bytes from {}", bytes.len(), reference);

    let format = image::guess_format(&bytes)?;
    let image = image::load_from_memory_with_format(&bytes, format)?;

    tokio::fs::create_dir_all(destination).await?;
    let saved_path = destination.join(file_name);
    if tokio::fs::try_exists(&saved_path).await.unwrap_or(false) {
        warn!(
            "{} already exists, overwriting it with {}",
            saved_path.display(),
            reference
        );
    }
    image.save_with_format(&saved_path, format)?;
    info!("Image saved to {}", saved_path.display());

    Ok((reference.clone(), saved_path))
}
