//! Image references and loading.
//!
//! An image arrives as a single string which is either an HTTP(S) URL
//! or a local filesystem path. [`ImageSource`] classifies the reference
//! once, loads the full byte content (images are small, no streaming),
//! and encodes it as an inline base64 `data:` URL for the multimodal
//! request payload.

use std::path::PathBuf;
use std::str::FromStr;

use base64::{Engine, prelude::BASE64_STANDARD};
use mime_guess::{Mime, mime};

use crate::error::{PipelineError, Result};

/// A classified image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Remote reference, fetched with a single HTTP GET.
    Url(String),
    /// Local filesystem path, read fully into memory.
    Path(PathBuf),
}

impl ImageSource {
    /// Classify a raw string reference.
    ///
    /// Anything starting with the literal prefix `http` is treated as a
    /// remote reference; everything else is a local path.
    #[must_use]
    pub fn classify(input: &str) -> Self {
        if input.starts_with("http") {
            Self::Url(input.to_owned())
        } else {
            Self::Path(PathBuf::from(input))
        }
    }

    /// Load the complete byte content of the referenced image.
    ///
    /// A single attempt, no retries.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Fetch`] when a remote fetch returns non-2xx.
    /// - [`PipelineError::NotFound`] when a local path does not exist.
    /// - Transport variants for connection and read failures.
    pub async fn load(&self, client: &reqwest::Client) -> Result<Vec<u8>> {
        match self {
            Self::Url(url) => {
                let response = client.get(url).send().await?;
                if !response.status().is_success() {
                    return Err(PipelineError::Fetch {
                        status: response.status(),
                        url: url.clone(),
                    });
                }
                Ok(response.bytes().await?.to_vec())
            }
            Self::Path(path) => {
                if !path.exists() {
                    return Err(PipelineError::NotFound { path: path.clone() });
                }
                Ok(std::fs::read(path)?)
            }
        }
    }

    /// The media type of the image, sniffed from a local path's
    /// extension. Remote and unknown-extension references default to
    /// JPEG.
    #[must_use]
    pub fn media_type(&self) -> Mime {
        match self {
            Self::Url(_) => mime::IMAGE_JPEG,
            Self::Path(path) => mime_guess::from_path(path).first_or(mime::IMAGE_JPEG),
        }
    }

    /// Encode raw image bytes as an inline `data:` URL suitable for a
    /// multimodal chat request.
    #[must_use]
    pub fn data_url(&self, bytes: &[u8]) -> String {
        format!(
            "data:{};base64,{}",
            self.media_type(),
            BASE64_STANDARD.encode(bytes)
        )
    }
}

impl FromStr for ImageSource {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::classify(s))
    }
}

impl std::fmt::Display for ImageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}
