use std::fs;
use std::path::PathBuf;

use fastembed::{
    EmbeddingModel, InitOptions, InitOptionsUserDefined, Pooling, TextEmbedding, TokenizerFiles,
    UserDefinedEmbeddingModel,
};
use hf_hub::api::sync::ApiBuilder;

use crate::errors::ProviderError;
use crate::models::config::{EmbeddingConfig, EmbeddingModelKind};

/// A deterministic text to fixed-length vector function.
///
/// Implementations must return one vector per input text, in input order.
pub trait Embedder {
    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub(crate) fn normalize_embedding(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| x / norm).collect()
    }
}

/// Embed `texts` and check the provider kept its contract.
///
/// Every returned vector is normalized to unit length so both datasets are
/// compared on the same scale regardless of provider.
pub fn embed_texts<E>(
    embedder: &mut E,
    texts: &[String],
) -> Result<Vec<Vec<f32>>, ProviderError>
where
    E: Embedder + ?Sized,
{
    if texts.is_empty() {
        return Ok(Vec::new());
    }

    let vectors = embedder.embed(texts)?;
    if vectors.len() != texts.len() {
        return Err(ProviderError::CountMismatch {
            expected: texts.len(),
            actual: vectors.len(),
        });
    }

    let dimension = vectors[0].len();
    if let Some(bad) = vectors.iter().find(|vector| vector.len() != dimension) {
        return Err(ProviderError::DimensionMismatch {
            expected: dimension,
            actual: bad.len(),
        });
    }

    Ok(vectors.iter().map(|vector| normalize_embedding(vector)).collect())
}

struct HubModel {
    repo: &'static str,
    onnx_file: &'static str,
    pooling: Pooling,
}

impl EmbeddingModelKind {
    fn fastembed_model(self) -> EmbeddingModel {
        match self {
            EmbeddingModelKind::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            EmbeddingModelKind::AllMiniLmL12V2 => EmbeddingModel::AllMiniLML12V2,
            EmbeddingModelKind::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
            EmbeddingModelKind::MultilingualE5Small => EmbeddingModel::MultilingualE5Small,
        }
    }

    fn hub_model(self) -> HubModel {
        match self {
            EmbeddingModelKind::AllMiniLmL6V2 => HubModel {
                repo: "Qdrant/all-MiniLM-L6-v2-onnx",
                onnx_file: "model.onnx",
                pooling: Pooling::Mean,
            },
            EmbeddingModelKind::AllMiniLmL12V2 => HubModel {
                repo: "Xenova/all-MiniLM-L12-v2",
                onnx_file: "onnx/model.onnx",
                pooling: Pooling::Mean,
            },
            EmbeddingModelKind::BgeSmallEnV15 => HubModel {
                repo: "Xenova/bge-small-en-v1.5",
                onnx_file: "onnx/model.onnx",
                pooling: Pooling::Cls,
            },
            EmbeddingModelKind::MultilingualE5Small => HubModel {
                repo: "intfloat/multilingual-e5-small",
                onnx_file: "onnx/model.onnx",
                pooling: Pooling::Mean,
            },
        }
    }
}

/// [`Embedder`] backed by a local ONNX model run through fastembed.
pub struct FastEmbedProvider {
    model: TextEmbedding,
    batch_size: Option<usize>,
}

impl FastEmbedProvider {
    /// Load the configured model, downloading it when it is not cached.
    ///
    /// When a token is configured the model files are fetched through the
    /// hub client with that token; otherwise fastembed's own loader is used.
    pub fn load(config: &EmbeddingConfig) -> Result<Self, ProviderError> {
        log::info!("Loading embedding model {:?}", config.model);

        let model = match config.hf_token.as_deref() {
            Some(token) if !token.is_empty() => Self::load_with_token(config, token)?,
            _ => {
                let mut options = InitOptions::new(config.model.fastembed_model())
                    .with_show_download_progress(config.show_download_progress);
                if let Some(cache_dir) = &config.cache_dir {
                    options = options.with_cache_dir(cache_dir.clone());
                }
                TextEmbedding::try_new(options)
                    .map_err(|error| ProviderError::Load(format!("{error:?}")))?
            }
        };

        log::info!("Embedding model {:?} ready", config.model);

        Ok(Self {
            model,
            batch_size: config.batch_size,
        })
    }

    fn load_with_token(
        config: &EmbeddingConfig,
        token: &str,
    ) -> Result<TextEmbedding, ProviderError> {
        let hub_model = config.model.hub_model();

        let mut builder = ApiBuilder::new()
            .with_token(Some(token.to_string()))
            .with_progress(config.show_download_progress);
        if let Some(cache_dir) = &config.cache_dir {
            builder = builder.with_cache_dir(cache_dir.clone());
        }
        let api = builder
            .build()
            .map_err(|error| ProviderError::Load(format!("hub client: {error}")))?;
        let repo = api.model(hub_model.repo.to_string());

        let fetch = |file: &str| -> Result<Vec<u8>, ProviderError> {
            let path: PathBuf = repo.get(file).map_err(|error| {
                ProviderError::Load(format!("{}/{file}: {error}", hub_model.repo))
            })?;
            fs::read(&path)
                .map_err(|error| ProviderError::Load(format!("{}: {error}", path.display())))
        };

        let tokenizer_files = TokenizerFiles {
            tokenizer_file: fetch("tokenizer.json")?,
            config_file: fetch("config.json")?,
            special_tokens_map_file: fetch("special_tokens_map.json")?,
            tokenizer_config_file: fetch("tokenizer_config.json")?,
        };
        let user_model =
            UserDefinedEmbeddingModel::new(fetch(hub_model.onnx_file)?, tokenizer_files)
                .with_pooling(hub_model.pooling);

        TextEmbedding::try_new_from_user_defined(user_model, InitOptionsUserDefined::default())
            .map_err(|error| ProviderError::Load(format!("{error:?}")))
    }
}

impl Embedder for FastEmbedProvider {
    fn embed(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        self.model
            .embed(texts.to_vec(), self.batch_size)
            .map_err(|error| ProviderError::Inference(format!("{error:?}")))
    }
}
