//! Object detection pipeline.
//!
//! One image in, one [`DetectionResult`] out. The pipeline is strictly
//! linear: load the image, encode it into a multimodal request, send it
//! to the vision model, normalize and parse the reply, fill defaults.
//! [`Detector::detect`] never fails: any error along the way is
//! converted into a sentinel result whose fields carry the failure
//! description, so callers never need to handle an error path.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, instrument, warn};

use crate::client::ChatClient;
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::extract;
use crate::image::ImageSource;

/// Field value substituted when the model omits a required key.
const UNKNOWN: &str = "unknown";

/// Field value marking a sentinel error result.
const ERROR: &str = "error";

/// System instruction fixing the reply schema for the vision model.
const SYSTEM_PROMPT: &str = "\
You are a precise object detection system. You must respond with a valid JSON object \
containing exactly these fields:
- object_name: string
- object_category: string
- distinguishing_features: array of strings

Example format:
{
    \"object_name\": \"Hammer\",
    \"object_category\": \"Tool\",
    \"distinguishing_features\": [\"Metal head\", \"Wooden handle\", \"16 oz marking\"]
}

Rules:
1. Response must be ONLY the JSON object, no other text
2. No markdown formatting or code blocks
3. distinguishing_features must be an array of strings
4. All fields are required
5. No trailing commas
6. Use double quotes for strings";

/// User instruction sent alongside the inline image.
const USER_PROMPT: &str = "\
Analyze this image and identify the primary object within it. Return ONLY a JSON \
object with object_name, object_category, and distinguishing_features fields.";

/// Structured description of the primary object in an image.
///
/// Always structurally complete: decoding fills any missing field with
/// its documented default (`"unknown"` / empty list), and a bare-string
/// `distinguishing_features` is normalized to a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Name of the detected object.
    #[serde(default = "default_unknown")]
    pub object_name: String,
    /// Category of the detected object.
    #[serde(default = "default_unknown")]
    pub object_category: String,
    /// Distinguishing features, in the order the model listed them.
    #[serde(default, deserialize_with = "string_or_list")]
    pub distinguishing_features: Vec<String>,
}

fn default_unknown() -> String {
    UNKNOWN.to_owned()
}

/// Accept either a bare string or a list of strings for
/// `distinguishing_features`; a bare string becomes a one-element list.
fn string_or_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Features {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Features>::deserialize(deserializer)? {
        Some(Features::One(feature)) => vec![feature],
        Some(Features::Many(features)) => features,
        None => Vec::new(),
    })
}

impl DetectionResult {
    /// Parse a model reply into a detection result.
    ///
    /// Applies the full normalize → decode → default-fill chain. The
    /// defaults are unconditional: they also fill keys a successfully
    /// decoded reply omitted.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Parse`] when the reply is not decodable by any
    /// strategy.
    pub fn from_reply(reply: &str) -> Result<Self> {
        let value = extract::extract_json_object(reply)?;
        serde_json::from_value(value).map_err(|_| PipelineError::parse(reply))
    }

    /// The sentinel result substituted when any pipeline stage fails.
    #[must_use]
    pub fn error_sentinel(message: &str) -> Self {
        Self {
            object_name: ERROR.to_owned(),
            object_category: ERROR.to_owned(),
            distinguishing_features: vec![format!("Error processing image: {message}")],
        }
    }

    /// Whether this result is the sentinel produced by a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.object_name == ERROR && self.object_category == ERROR
    }
}

/// Runs the object detection pipeline against a vision model.
#[derive(Debug, Clone)]
pub struct Detector {
    client: ChatClient,
    vision_model: String,
}

impl Detector {
    /// Create a detector from the pipeline config.
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            client: ChatClient::new(config),
            vision_model: config.vision_model.clone(),
        }
    }

    /// Analyze the referenced image and describe its primary object.
    ///
    /// Never fails: on any error (fetch, missing file, upstream,
    /// unparseable reply) the sentinel result is returned instead, with
    /// the failure description in `distinguishing_features`.
    #[instrument(skip(self), fields(source = %source))]
    pub async fn detect(&self, source: &ImageSource) -> DetectionResult {
        match self.run(source).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "object detection failed");
                DetectionResult::error_sentinel(&err.to_string())
            }
        }
    }

    async fn run(&self, source: &ImageSource) -> Result<DetectionResult> {
        let bytes = source.load(self.client.http_client()).await?;
        debug!(len = bytes.len(), "image loaded");

        let data_url = source.data_url(&bytes);
        let messages = vec![
            ChatClient::text_message("system", SYSTEM_PROMPT),
            ChatClient::image_message(USER_PROMPT, &data_url),
        ];

        let reply = self.client.complete(&self.vision_model, messages).await?;
        DetectionResult::from_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_reply_passes_through_untouched() {
        let reply = r#"{
            "object_name": "Hammer",
            "object_category": "Tool",
            "distinguishing_features": ["Metal head", "Wooden handle"]
        }"#;
        let result = DetectionResult::from_reply(reply).unwrap();
        assert_eq!(result.object_name, "Hammer");
        assert_eq!(result.object_category, "Tool");
        assert_eq!(
            result.distinguishing_features,
            vec!["Metal head", "Wooden handle"]
        );
    }

    #[test]
    fn test_missing_keys_are_filled_with_defaults() {
        let result = DetectionResult::from_reply(r#"{"object_name": "Hammer"}"#).unwrap();
        assert_eq!(result.object_name, "Hammer");
        assert_eq!(result.object_category, "unknown");
        assert!(result.distinguishing_features.is_empty());

        let result = DetectionResult::from_reply("{}").unwrap();
        assert_eq!(result.object_name, "unknown");
        assert_eq!(result.object_category, "unknown");
        assert!(result.distinguishing_features.is_empty());
    }

    #[test]
    fn test_bare_string_features_become_a_list() {
        let reply = r#"{
            "object_name": "Hammer",
            "object_category": "Tool",
            "distinguishing_features": "Metal head"
        }"#;
        let result = DetectionResult::from_reply(reply).unwrap();
        assert_eq!(result.distinguishing_features, vec!["Metal head"]);
    }

    #[test]
    fn test_null_features_become_empty_list() {
        let reply = r#"{"object_name": "Vase", "distinguishing_features": null}"#;
        let result = DetectionResult::from_reply(reply).unwrap();
        assert!(result.distinguishing_features.is_empty());
    }

    #[test]
    fn test_fenced_reply_parses_like_bare_json() {
        let bare = r#"{"object_name":"Hammer","object_category":"Tool","distinguishing_features":"Metal head"}"#;
        let fenced = format!("```json\n{bare}\n```");
        assert_eq!(
            DetectionResult::from_reply(bare).unwrap(),
            DetectionResult::from_reply(&fenced).unwrap()
        );
    }

    #[test]
    fn test_unparseable_reply_is_an_error() {
        assert!(DetectionResult::from_reply("the image shows a hammer").is_err());
    }

    #[test]
    fn test_sentinel_shape() {
        let sentinel = DetectionResult::error_sentinel("File not found: /no/such/file.jpg");
        assert_eq!(sentinel.object_name, "error");
        assert_eq!(sentinel.object_category, "error");
        assert_eq!(
            sentinel.distinguishing_features,
            vec!["Error processing image: File not found: /no/such/file.jpg"]
        );
        assert!(sentinel.is_error());
    }

    #[tokio::test]
    async fn test_detect_missing_file_returns_sentinel() {
        let config = PipelineConfig::new("test-key").unwrap();
        let detector = Detector::new(&config);

        let result = detector
            .detect(&ImageSource::classify("/no/such/file.jpg"))
            .await;

        assert_eq!(result.object_name, "error");
        assert_eq!(result.object_category, "error");
        assert_eq!(
            result.distinguishing_features,
            vec!["Error processing image: File not found: /no/such/file.jpg"]
        );
    }
}
