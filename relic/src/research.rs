//! Historical research pipeline.
//!
//! Given a detected object, build a handful of search queries, run them
//! sequentially through a web-search backend, feed the combined result
//! text to the text model, and parse its reply into an ordered list of
//! historical milestones. Like detection, [`Researcher::research`]
//! never fails: any error produces a fallback report carrying the
//! failure description.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::client::ChatClient;
use crate::config::PipelineConfig;
use crate::detect::DetectionResult;
use crate::error::{PipelineError, Result};
use crate::extract;
use crate::search::WebSearch;

/// One historical-development entry for the detected object.
///
/// Fields default to empty strings on decode so a partially filled
/// model reply still yields structurally complete records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRecord {
    /// Approximate year or time period.
    #[serde(default)]
    pub year: String,
    /// Brief name of the milestone.
    #[serde(default)]
    pub title: String,
    /// Detailed description of the innovation or change.
    #[serde(default)]
    pub description: String,
    /// Historical importance of the milestone.
    #[serde(default)]
    pub significance: String,
    /// Description of the object's appearance at this milestone.
    #[serde(default)]
    pub visual_description: String,
}

/// The research pipeline's output: milestones in the model's narrative
/// order, plus the raw error string when the pipeline fell back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchReport {
    /// Historical milestones, chronological as narrated by the model.
    #[serde(default)]
    pub milestones: Vec<MilestoneRecord>,
    /// Raw error description when any stage of the pipeline failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResearchReport {
    /// The fallback report substituted when any pipeline stage fails:
    /// a single placeholder milestone plus the raw error string.
    #[must_use]
    pub fn fallback(object_name: &str, error: &str) -> Self {
        Self {
            milestones: vec![MilestoneRecord {
                year: "Unknown".to_owned(),
                title: "Error retrieving historical data".to_owned(),
                description: format!(
                    "An error occurred while researching the history of {object_name}"
                ),
                significance: "Please try again with more specific details".to_owned(),
                visual_description: "Error visualization".to_owned(),
            }],
            error: Some(error.to_owned()),
        }
    }

    /// Whether this report is the fallback produced by a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// Intermediate shape of the model reply.
#[derive(Deserialize)]
struct MilestonesReply {
    #[serde(default)]
    milestones: Vec<MilestoneRecord>,
}

/// Runs the historical research pipeline against a text model.
#[derive(Debug)]
pub struct Researcher {
    client: ChatClient,
    search: WebSearch,
    text_model: String,
}

impl Researcher {
    /// Create a researcher from the pipeline config and a search
    /// backend.
    #[must_use]
    pub fn new(config: &PipelineConfig, search: WebSearch) -> Self {
        Self {
            client: ChatClient::new(config),
            search,
            text_model: config.text_model.clone(),
        }
    }

    /// Research the historical evolution of a detected object.
    ///
    /// Never fails: on any error (search backend, upstream model,
    /// unparseable reply) the fallback report is returned instead.
    #[instrument(skip(self, subject), fields(object = %subject.object_name))]
    pub async fn research(&self, subject: &DetectionResult) -> ResearchReport {
        match self.run(subject).await {
            Ok(milestones) => ResearchReport {
                milestones,
                error: None,
            },
            Err(err) => {
                warn!(error = %err, "historical research failed");
                ResearchReport::fallback(&subject.object_name, &err.to_string())
            }
        }
    }

    async fn run(&self, subject: &DetectionResult) -> Result<Vec<MilestoneRecord>> {
        // Sequential chain: each query blocks the next.
        let mut search_results = String::new();
        for query in Self::queries(&subject.object_name) {
            debug!(query = %query, "running search query");
            let result = self.search.run(&query).await?;
            let _ = write!(search_results, "\nQuery: {query}\nResults: {result}\n");
        }

        let prompt = Self::milestone_prompt(subject, &search_results);
        let reply = self
            .client
            .complete(
                &self.text_model,
                vec![ChatClient::text_message("user", &prompt)],
            )
            .await?;

        Self::parse_milestones(&reply)
    }

    /// The search queries issued for an object, in order.
    fn queries(object_name: &str) -> [String; 4] {
        [
            format!("history of {object_name}"),
            format!("evolution of {object_name} through history"),
            format!("{object_name} invention and development timeline"),
            format!("how has the {object_name} changed over time"),
        ]
    }

    /// Render the research prompt from object details and the combined
    /// search-result text.
    fn milestone_prompt(subject: &DetectionResult, search_results: &str) -> String {
        let features = subject.distinguishing_features.join(", ");
        format!(
            "Based on the following object details and search results, identify 1-5 key \
             historical milestones in the evolution of this object. For each milestone, \
             provide:\n\
             1. The approximate year or time period\n\
             2. A description of the innovation or change\n\
             3. The historical context or importance of this milestone\n\
             4. A brief visual description of the object at this milestone\n\
             \n\
             Object Details:\n\
             - Name: {name}\n\
             - Category: {category}\n\
             - Distinguishing Features: {features}\n\
             \n\
             Search Results:\n\
             {search_results}\n\
             \n\
             Format your response as a JSON object with this structure:\n\
             {{\n\
                 \"milestones\": [\n\
                     {{\n\
                         \"year\": \"year or time period\",\n\
                         \"title\": \"brief name of milestone\",\n\
                         \"description\": \"detailed description\",\n\
                         \"significance\": \"historical importance\",\n\
                         \"visual_description\": \"description for image generation\"\n\
                     }}\n\
                 ]\n\
             }}",
            name = subject.object_name,
            category = subject.object_category,
        )
    }

    /// Parse the model reply into milestone records, preserving the
    /// model's narrative order.
    fn parse_milestones(reply: &str) -> Result<Vec<MilestoneRecord>> {
        let value = extract::extract_json_object(reply)?;
        let parsed: MilestonesReply =
            serde_json::from_value(value).map_err(|_| PipelineError::parse(reply))?;
        Ok(parsed.milestones)
    }
}
