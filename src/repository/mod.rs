use std::io::Write;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{Dataset, RedirectMatch};
use crate::errors::DatasetError;

pub mod crawl_export;

pub use crawl_export::CsvRepository;

/// Serialization used for the result table.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

pub trait DatasetReader {
    fn read_dataset(&self, path: &Path) -> Result<Dataset, DatasetError>;
}

pub trait MatchWriter {
    fn write_matches(
        &self,
        writer: &mut dyn Write,
        matches: &[RedirectMatch],
        format: OutputFormat,
    ) -> Result<(), DatasetError>;
}
