//! Fetching model files from the Hugging Face hub.

use std::path::PathBuf;

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};

use crate::OrtError;

const ONNX_EXPORT: &str = "onnx/model.onnx";
const ROOT_MODEL: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Local paths of a model downloaded into the hub cache.
#[derive(Debug, Clone)]
pub(crate) struct HubFiles {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
}

/// Downloads (or reuses from the cache) the ONNX model and tokenizer of `repo_id`.
///
/// Files already present in the cache (`$HF_HOME/hub`) are not downloaded again.
pub(crate) fn fetch(repo_id: &str, show_progress: bool) -> Result<HubFiles, OrtError> {
    let api = ApiBuilder::new()
        .with_progress(show_progress)
        .build()
        .map_err(|source| OrtError::Hub {
            repo: repo_id.to_string(),
            file: String::new(),
            source,
        })?;
    let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));

    tracing::info!(repo = repo_id, "fetching embedding model from the hub");

    let tokenizer = repo.get(TOKENIZER_FILE).map_err(|source| OrtError::Hub {
        repo: repo_id.to_string(),
        file: TOKENIZER_FILE.to_string(),
        source,
    })?;

    let model = match repo.get(ONNX_EXPORT) {
        Ok(path) => path,
        Err(error) => {
            tracing::debug!(
                repo = repo_id,
                file = ONNX_EXPORT,
                error = %error,
                "no onnx/ export, trying repository root"
            );
            repo.get(ROOT_MODEL).map_err(|source| OrtError::Hub {
                repo: repo_id.to_string(),
                file: ROOT_MODEL.to_string(),
                source,
            })?
        }
    };

    tracing::debug!(repo = repo_id, path = %model.display(), "model file ready");
    Ok(HubFiles { model, tokenizer })
}
