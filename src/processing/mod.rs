pub mod embedding;
pub mod index;
pub mod matcher;
pub mod normalizer;

pub use embedding::{Embedder, FastEmbedProvider};
pub use index::{Neighbor, VectorIndex};
pub use matcher::{MatchReport, MatchStats, Matcher};
