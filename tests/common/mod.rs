//! Helpers for integration tests.

use std::io::Write;

use redirect_matchmaker::errors::ProviderError;
use redirect_matchmaker::processing::Embedder;
use tempfile::NamedTempFile;

const DIMENSIONS: usize = 64;

/// Feature-hashing bag-of-words embedder, deterministic and offline.
#[derive(Default)]
pub struct HashingEmbedder {
    pub calls: usize,
}

impl HashingEmbedder {
    fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0_f32; DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
        {
            let hash = fnv1a(&token.to_lowercase());
            let sign = if hash & 1 == 0 { 1.0 } else { -1.0 };
            vector[(hash >> 1) as usize % DIMENSIONS] += sign;
        }
        vector
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.calls += 1;
        Ok(texts.iter().map(|text| Self::vector(text)).collect())
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf29ce484222325_u64, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x100000001b3)
    })
}

/// Write `contents` to a temporary `.csv` file that lives as long as the handle.
pub fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp file.");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp file.");
    file
}
