use crate::domain::{Dataset, Row};

/// Build the text that represents a row for embedding.
///
/// The values of `columns` are rendered in the given order and joined by a
/// single space. Missing values render as empty strings.
pub fn combined_text(row: &Row, columns: &[String]) -> String {
    columns
        .iter()
        .map(|column| row.field(column).to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Combined text for every row of `dataset`, in row order.
pub fn normalize_dataset(dataset: &Dataset, columns: &[String]) -> Vec<String> {
    dataset
        .rows()
        .iter()
        .map(|row| combined_text(row, columns))
        .collect()
}
