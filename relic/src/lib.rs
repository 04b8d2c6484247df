//! Relic turns a photo of an object into a structured description and,
//! optionally, a researched timeline of the object's historical
//! evolution.
//!
//! Vision understanding and language reasoning are delegated to hosted
//! models. This crate owns the plumbing around them: loading an image
//! from a path or URL, building the multimodal request, and defensively
//! parsing the free-text reply into typed records. Callers always
//! receive a structurally complete value, never an error.
//!
//! # Example
//!
//! ```rust,ignore
//! use relic::{Detector, ImageSource, PipelineConfig, Researcher, WebSearch};
//!
//! let config = PipelineConfig::from_env()?;
//!
//! let detector = Detector::new(&config);
//! let result = detector.detect(&ImageSource::classify("hammer.jpg")).await;
//! println!("{} ({})", result.object_name, result.object_category);
//!
//! let researcher = Researcher::new(&config, WebSearch::duckduckgo());
//! let report = researcher.research(&result).await;
//! for milestone in &report.milestones {
//!     println!("{}: {}", milestone.year, milestone.title);
//! }
//! ```

pub mod client;
pub mod config;
pub mod detect;
pub mod error;
pub mod extract;
pub mod image;
pub mod research;
pub mod search;

pub use client::ChatClient;
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use detect::{DetectionResult, Detector};
pub use error::{PipelineError, Result};
pub use image::ImageSource;
pub use research::{MilestoneRecord, ResearchReport, Researcher};
pub use search::{DuckDuckGoProvider, SearchProvider, SearchResult, TavilyProvider, WebSearch};
