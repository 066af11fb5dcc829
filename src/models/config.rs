//! Configuration model loaded from external sources.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Pretrained text-embedding models the provider knows how to load.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub enum EmbeddingModelKind {
    #[default]
    #[serde(rename = "all-minilm-l6-v2")]
    AllMiniLmL6V2,
    #[serde(rename = "all-minilm-l12-v2")]
    AllMiniLmL12V2,
    #[serde(rename = "bge-small-en-v1.5")]
    BgeSmallEnV15,
    #[serde(rename = "multilingual-e5-small")]
    MultilingualE5Small,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
/// Settings for loading the embedding model.
pub struct EmbeddingConfig {
    pub model: EmbeddingModelKind,
    pub cache_dir: Option<PathBuf>,
    /// Access token forwarded as-is to the model hub.
    pub hf_token: Option<String>,
    pub batch_size: Option<usize>,
    pub show_download_progress: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub url_column: String,
    pub columns: Vec<String>,
    /// Matches scoring below this are counted and reported, never dropped.
    pub low_similarity_threshold: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            url_column: "Address".to_string(),
            columns: Vec::new(),
            low_similarity_threshold: crate::LOW_SIMILARITY_THRESHOLD,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub embedding: EmbeddingConfig,
    pub matching: MatchingConfig,
}

impl Settings {
    /// Loads settings from an optional YAML file, overridden by
    /// `MATCHMAKER__SECTION__KEY` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix("MATCHMAKER")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("matching.columns")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
