pub mod dataset;
pub mod redirect;

pub use dataset::{Dataset, FieldValue, Row, common_columns};
pub use redirect::RedirectMatch;
