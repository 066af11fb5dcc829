use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

/// A single cell of a crawl export.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    /// Null renders as the empty string so missing cells never break a row.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Number(value) => write!(f, "{value}"),
            FieldValue::Bool(value) => write!(f, "{value}"),
            FieldValue::Null => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// One page record from a crawl export.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    pub url: String,
    pub fields: IndexMap<String, FieldValue>,
}

impl Row {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field insertion, mostly useful when assembling rows by hand.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns the value stored under `name`, or [`FieldValue::Null`] when absent.
    pub fn field(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&FieldValue::Null)
    }
}

/// An ordered set of rows sharing one schema.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Builds a dataset whose schema is the union of the rows' field names,
    /// in first-seen order.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for name in row.fields.keys() {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }
}

/// Column names present in both datasets, in origin order.
pub fn common_columns(origin: &Dataset, destination: &Dataset) -> Vec<String> {
    origin
        .columns()
        .iter()
        .filter(|column| destination.has_column(column))
        .cloned()
        .collect()
}
