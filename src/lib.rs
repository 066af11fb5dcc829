pub mod domain;
pub mod errors;
pub mod models;
pub mod processing;
pub mod repository;

/// Default score below which a match is reported as low similarity.
pub const LOW_SIMILARITY_THRESHOLD: f32 = 0.5;
