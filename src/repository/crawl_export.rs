use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use indexmap::IndexMap;

use crate::domain::{Dataset, FieldValue, RedirectMatch, Row};
use crate::errors::{DatasetError, InputError};
use crate::repository::{DatasetReader, MatchWriter, OutputFormat};

/// Reads crawl exports and writes match tables as delimited text.
#[derive(Clone, Debug)]
pub struct CsvRepository {
    url_column: String,
    delimiter: u8,
}

impl Default for CsvRepository {
    fn default() -> Self {
        Self::new("Address")
    }
}

impl CsvRepository {
    pub fn new(url_column: impl Into<String>) -> Self {
        Self {
            url_column: url_column.into(),
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parse a crawl export from any reader.
    ///
    /// Empty cells and cells missing from short rows become
    /// [`FieldValue::Null`]. The URL column is kept as a regular field too,
    /// so it can be selected for matching like any other column.
    pub fn read_dataset_from<R: Read>(&self, source: R) -> Result<Dataset, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(source);

        let columns: Vec<String> = reader
            .headers()?
            .iter()
            .map(|header| header.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        if columns.iter().all(|column| column.is_empty()) {
            return Err(InputError::MissingHeader.into());
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = columns.iter().find(|column| !seen.insert(column.as_str())) {
            return Err(InputError::DuplicateColumn(duplicate.clone()).into());
        }

        let url_position = columns
            .iter()
            .position(|column| *column == self.url_column)
            .ok_or_else(|| InputError::MissingUrlColumn(self.url_column.clone()))?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let fields: IndexMap<String, FieldValue> = columns
                .iter()
                .enumerate()
                .map(|(position, column)| {
                    let value = record
                        .get(position)
                        .filter(|value| !value.is_empty())
                        .map(FieldValue::from)
                        .unwrap_or(FieldValue::Null);
                    (column.clone(), value)
                })
                .collect();
            let url = record.get(url_position).unwrap_or_default().to_string();
            if url.is_empty() {
                log::warn!("Row {} has an empty {} value", rows.len() + 1, self.url_column);
            }
            rows.push(Row { url, fields });
        }

        log::info!("Read {} rows with {} columns", rows.len(), columns.len());

        Ok(Dataset::new(columns, rows))
    }
}

impl DatasetReader for CsvRepository {
    fn read_dataset(&self, path: &Path) -> Result<Dataset, DatasetError> {
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.read_dataset_from(file)
    }
}

impl MatchWriter for CsvRepository {
    fn write_matches(
        &self,
        writer: &mut dyn Write,
        matches: &[RedirectMatch],
        format: OutputFormat,
    ) -> Result<(), DatasetError> {
        match format {
            OutputFormat::Csv => {
                let mut csv_writer = csv::WriterBuilder::new()
                    .delimiter(self.delimiter)
                    .from_writer(writer);
                if matches.is_empty() {
                    csv_writer.write_record(["origin_url", "matched_url", "similarity_score"])?;
                }
                for redirect in matches {
                    csv_writer.serialize(redirect)?;
                }
                csv_writer.flush()?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *writer, matches)?;
                writeln!(writer)?;
            }
        }
        Ok(())
    }
}
