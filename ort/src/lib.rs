//! Local ONNX Runtime embedding backend for ragshelf.
//!
//! [`OrtEmbedding`] implements [`ragshelf_core::EmbeddingModel`] by running an encoder model
//! exported to ONNX. It is the "local" embedding backend selected by the quantized model types;
//! by default it serves [`BGE_SMALL_EN_V15`], fetched once from the Hugging Face hub and reused
//! from the hub cache afterwards.
//!
//! ```rust,no_run
//! use ragshelf_core::EmbeddingModel;
//! use ragshelf_ort::{BGE_SMALL_EN_V15, OrtEmbedding};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = OrtEmbedding::from_hub(BGE_SMALL_EN_V15)?;
//! assert_eq!(embedder.dim(), 384);
//! let embedding = embedder.embed("Hello, world!").await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod hub;
mod pooling;

pub use error::OrtError;
pub use pooling::PoolingStrategy;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use ndarray::Ix3;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ragshelf_core::EmbeddingModel;
use tokenizers::{Tokenizer, TruncationParams};

/// Hub id of the default local embedding model.
pub const BGE_SMALL_EN_V15: &str = "BAAI/bge-small-en-v1.5";

/// Maximum sequence length accepted by BERT-style encoders.
pub const MAX_SEQUENCE_LENGTH: usize = 512;

/// An embedding model backed by ONNX Runtime.
pub struct OrtEmbedding {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    name: String,
    dimension: usize,
    pooling: PoolingStrategy,
    normalize: bool,
    token_type_ids: bool,
}

impl std::fmt::Debug for OrtEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtEmbedding")
            .field("name", &self.name)
            .field("dimension", &self.dimension)
            .field("pooling", &self.pooling)
            .field("normalize", &self.normalize)
            .finish_non_exhaustive()
    }
}

impl OrtEmbedding {
    /// Fetches `repo_id` from the Hugging Face hub (or the local hub cache) and loads it.
    ///
    /// # Errors
    /// Returns an error if the files cannot be downloaded or the model cannot be loaded.
    pub fn from_hub(repo_id: &str) -> Result<Self, OrtError> {
        let files = hub::fetch(repo_id, false)?;
        Self::builder()
            .name(repo_id)
            .model_path(files.model)
            .tokenizer_path(files.tokenizer)
            .build()
    }

    /// Loads an embedding model from a local directory holding `model.onnx` (or
    /// `onnx/model.onnx`) and `tokenizer.json`.
    ///
    /// # Errors
    /// Returns an error if the model or tokenizer cannot be found or loaded.
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, OrtError> {
        let dir = path.as_ref();
        let model = find_file(dir, &["model.onnx", "onnx/model.onnx"])
            .ok_or_else(|| OrtError::ModelNotFound(dir.to_path_buf()))?;
        let tokenizer = find_file(dir, &["tokenizer.json", "onnx/tokenizer.json"])
            .ok_or_else(|| OrtError::TokenizerNotFound(dir.to_path_buf()))?;

        let mut builder = Self::builder().model_path(model).tokenizer_path(tokenizer);
        if let Some(name) = dir.file_name().and_then(|name| name.to_str()) {
            builder = builder.name(name);
        }
        builder.build()
    }

    /// Create a builder for custom configuration.
    #[must_use]
    pub fn builder() -> OrtEmbeddingBuilder {
        OrtEmbeddingBuilder::default()
    }

    /// Returns the pooling strategy.
    #[must_use]
    pub const fn pooling(&self) -> PoolingStrategy {
        self.pooling
    }

    fn run(&self, text: &str) -> Result<Vec<f32>, OrtError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| OrtError::Tokenization(e.to_string()))?;

        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| i64::from(m))
            .collect();
        let seq_len = ids.len();

        let ids = ort::value::Tensor::from_array(([1, seq_len], ids.into_boxed_slice()))?;
        let mask_tensor =
            ort::value::Tensor::from_array(([1, seq_len], mask.into_boxed_slice()))?;

        let mut inputs = ort::inputs![
            "input_ids" => ids,
            "attention_mask" => mask_tensor,
        ];
        if self.token_type_ids {
            let types = vec![0_i64; seq_len].into_boxed_slice();
            let types = ort::value::Tensor::from_array(([1, seq_len], types))?;
            inputs.push(("token_type_ids".into(), types.into()));
        }

        let hidden = {
            let mut session = self
                .session
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let outputs = session.run(inputs)?;
            let hidden = outputs
                .get("last_hidden_state")
                .or_else(|| outputs.get("token_embeddings"))
                .ok_or(OrtError::InvalidOutputShape(0))?;
            hidden.try_extract_array::<f32>()?.to_owned()
        };

        let rank = hidden.shape().len();
        if rank != 3 {
            return Err(OrtError::InvalidOutputShape(rank));
        }
        let hidden = hidden
            .into_dimensionality::<Ix3>()
            .map_err(|e| OrtError::Shape(e.to_string()))?;

        let mut embedding = self
            .pooling
            .apply(&hidden.view(), encoding.get_attention_mask());
        if self.normalize {
            l2_normalize(&mut embedding);
        }
        Ok(embedding)
    }
}

impl EmbeddingModel for OrtEmbedding {
    fn dim(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> ragshelf_core::Result<Vec<f32>> {
        Ok(self.run(text)?)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`OrtEmbedding`].
#[derive(Debug)]
pub struct OrtEmbeddingBuilder {
    model_path: Option<PathBuf>,
    tokenizer_path: Option<PathBuf>,
    name: Option<String>,
    pooling: PoolingStrategy,
    normalize: bool,
}

impl Default for OrtEmbeddingBuilder {
    fn default() -> Self {
        Self {
            model_path: None,
            tokenizer_path: None,
            name: None,
            pooling: PoolingStrategy::Cls,
            normalize: true,
        }
    }
}

impl OrtEmbeddingBuilder {
    /// Set the path to the ONNX model file.
    #[must_use]
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    /// Set the path to the tokenizer.json file.
    #[must_use]
    pub fn tokenizer_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tokenizer_path = Some(path.into());
        self
    }

    /// Name recorded alongside persisted vectors.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the pooling strategy. Default: [`PoolingStrategy::Cls`].
    #[must_use]
    pub const fn pooling(mut self, strategy: PoolingStrategy) -> Self {
        self.pooling = strategy;
        self
    }

    /// Enable or disable L2 normalization. Default: `true`.
    #[must_use]
    pub const fn normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    /// Build the [`OrtEmbedding`] instance.
    ///
    /// # Errors
    /// Returns an error if a path is missing, a file cannot be loaded, or the model output
    /// dimension cannot be determined.
    pub fn build(self) -> Result<OrtEmbedding, OrtError> {
        let model_path = self.model_path.ok_or(OrtError::MissingModelPath)?;
        if !model_path.exists() {
            return Err(OrtError::ModelNotFound(model_path));
        }

        let tokenizer_path = self.tokenizer_path.ok_or_else(|| {
            OrtError::TokenizerNotFound(model_path.parent().unwrap_or(&model_path).to_path_buf())
        })?;
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| OrtError::tokenizer(&tokenizer_path, e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQUENCE_LENGTH,
                ..TruncationParams::default()
            }))
            .map_err(|e| OrtError::tokenizer(&tokenizer_path, e))?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(num_cpus())?
            .commit_from_file(&model_path)?;

        let dimension = detect_embedding_dimension(&session)?;
        let token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");
        let name = self.name.unwrap_or_else(|| {
            model_path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("onnx")
                .to_string()
        });

        tracing::debug!(
            model = %name,
            dimension,
            path = %model_path.display(),
            "loaded onnx embedding model"
        );

        Ok(OrtEmbedding {
            session: Mutex::new(session),
            tokenizer,
            name,
            dimension,
            pooling: self.pooling,
            normalize: self.normalize,
            token_type_ids,
        })
    }
}

/// L2 normalize a vector in place.
fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}

fn find_file(dir: &Path, candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|candidate| dir.join(candidate))
        .find(|path| path.exists())
}

/// Reads the hidden dimension from the last axis of the first rank-3 output.
fn detect_embedding_dimension(session: &Session) -> Result<usize, OrtError> {
    session
        .outputs()
        .iter()
        .find_map(|output| match output.dtype() {
            ort::value::ValueType::Tensor { shape, .. } if shape.len() == 3 => shape
                .last()
                .copied()
                .filter(|&dim| dim > 0)
                .and_then(|dim| usize::try_from(dim).ok()),
            _ => None,
        })
        .ok_or(OrtError::UnknownDimension)
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builder_requires_model_path() {
        let result = OrtEmbedding::builder().build();
        assert!(matches!(result, Err(OrtError::MissingModelPath)));
    }

    #[test]
    fn builder_validates_model_exists() {
        let result = OrtEmbedding::builder()
            .model_path("/nonexistent/model.onnx")
            .tokenizer_path("/nonexistent/tokenizer.json")
            .build();
        assert!(matches!(result, Err(OrtError::ModelNotFound(_))));
    }

    #[test]
    fn builder_defaults_match_bge() {
        let builder = OrtEmbedding::builder();
        assert_eq!(builder.pooling, PoolingStrategy::Cls);
        assert!(builder.normalize);
    }

    #[test]
    fn from_directory_reports_missing_model() {
        let dir = tempdir().unwrap();
        let result = OrtEmbedding::from_directory(dir.path());
        assert!(matches!(result, Err(OrtError::ModelNotFound(_))));
    }

    #[test]
    fn from_directory_reports_missing_tokenizer() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("onnx")).unwrap();
        std::fs::write(dir.path().join("onnx/model.onnx"), b"").unwrap();

        let result = OrtEmbedding::from_directory(dir.path());
        assert!(matches!(result, Err(OrtError::TokenizerNotFound(_))));
    }

    #[test]
    fn l2_normalize_works() {
        let mut vec = vec![3.0, 4.0];
        l2_normalize(&mut vec);
        assert!((vec[0] - 0.6).abs() < 1e-6);
        assert!((vec[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero_vector() {
        let mut vec = vec![0.0, 0.0];
        l2_normalize(&mut vec);
        assert_eq!(vec, vec![0.0, 0.0]);
    }
}
