//! Error handling

use std::fmt;

/// A generation provider (text or image) failed or gave back nothing usable.
#[derive(Debug)]
pub enum GenerationError {
    /// The request could not be sent or the response not read
    Http(reqwest::Error),
    /// The provider answered with a non-success status
    Status {
        /// HTTP status code
        code: u16,
        /// Response body, for diagnosis
        body: String,
    },
    /// The provider reported the job as failed
    Provider(String),
    /// The provider response was not the JSON we expected
    Decode(serde_json::Error),
    /// The provider succeeded but returned no usable output
    Empty,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "Provider request failed: {err}"),
            Self::Status { code, body } => write!(f, "Provider returned status {code}: {body}"),
            Self::Provider(message) => write!(f, "Provider reported failure: {message}"),
            Self::Decode(err) => write!(f, "Failed to parse provider response: {err}"),
            Self::Empty => write!(f, "Provider returned no usable output"),
        }
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Http(err)
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::Decode(err)
    }
}

/// Downloading, decoding or saving a generated image failed.
#[derive(Debug)]
pub enum RetrievalError {
    /// The image host answered with something other than 200
    Status(u16),
    /// Network-level failure while downloading
    Network(reqwest::Error),
    /// The downloaded bytes are not a decodable image
    Decode(image::ImageError),
    /// The reference has no path segment to name the file after
    InvalidReference(String),
    /// Creating the directory or writing the file failed
    Io(std::io::Error),
}

impl RetrievalError {
    /// The HTTP status carried by a [`RetrievalError::Status`], if that's what this is.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for RetrievalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "Failed to download image. Status code: {code}"),
            Self::Network(err) => write!(f, "Failed to download image: {err}"),
            Self::Decode(err) => write!(f, "Downloaded bytes are not a valid image: {err}"),
            Self::InvalidReference(reference) => {
                write!(f, "Can't derive a filename from image reference: {reference}")
            }
            Self::Io(err) => write!(f, "Failed to store image: {err}"),
        }
    }
}

impl std::error::Error for RetrievalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Network(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        RetrievalError::Network(err)
    }
}

impl From<image::ImageError> for RetrievalError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(err) => RetrievalError::Io(err),
            other => RetrievalError::Decode(other),
        }
    }
}

impl From<std::io::Error> for RetrievalError {
    fn from(err: std::io::Error) -> Self {
        RetrievalError::Io(err)
    }
}

/// Errors surfaced by the expander and the asset pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// Expanding one brief entry failed
    Expansion {
        /// Label of the entry being expanded
        label: String,
        /// What went wrong
        source: GenerationError,
    },
    /// Retrieving one element's image failed
    Retrieval {
        /// Frame the element belongs to
        frame: String,
        /// Element label
        label: String,
        /// What went wrong
        source: RetrievalError,
    },
    /// A component was constructed with unusable parameters
    Config(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expansion { label, source } => {
                write!(f, "Failed to expand description for '{label}': {source}")
            }
            Self::Retrieval {
                frame,
                label,
                source,
            } => write!(f, "Failed to retrieve image for {frame}/'{label}': {source}"),
            Self::Config(message) => write!(f, "Invalid configuration: {message}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Expansion { source, .. } => Some(source),
            Self::Retrieval { source, .. } => Some(source),
            Self::Config(_) => None,
        }
    }
}
