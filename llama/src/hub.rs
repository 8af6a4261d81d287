//! GGUF weights hosted on the Hugging Face hub.

use std::path::PathBuf;

use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Cache, Repo, RepoType};
use url::Url;

use crate::LlamaError;

const HUB_HOST: &str = "huggingface.co";

/// A single file inside a hub repository, as addressed by a
/// `https://huggingface.co/<owner>/<repo>/resolve/<revision>/<file>` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubFile {
    repo: String,
    revision: String,
    filename: String,
}

impl HubFile {
    /// Parses a hub resolve URL.
    ///
    /// # Errors
    /// Returns [`LlamaError::NotHubUrl`] for any other URL shape.
    pub fn from_url(url: &Url) -> Result<Self, LlamaError> {
        let not_hub = || LlamaError::NotHubUrl(url.to_string());
        if url.host_str() != Some(HUB_HOST) {
            return Err(not_hub());
        }

        let segments: Vec<&str> = url
            .path_segments()
            .ok_or_else(not_hub)?
            .filter(|segment| !segment.is_empty())
            .collect();
        match segments.as_slice() {
            [owner, name, "resolve", revision, file @ ..] if !file.is_empty() => Ok(Self {
                repo: format!("{owner}/{name}"),
                revision: (*revision).to_string(),
                filename: file.join("/"),
            }),
            _ => Err(not_hub()),
        }
    }

    /// Repository id, e.g. `TheBloke/Llama-2-7B-Chat-GGUF`.
    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Git revision the file is resolved at.
    #[must_use]
    pub fn revision(&self) -> &str {
        &self.revision
    }

    /// Path of the file inside the repository.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    fn hub_repo(&self) -> Repo {
        Repo::with_revision(self.repo.clone(), RepoType::Model, self.revision.clone())
    }

    /// Returns the local path if the file is already in the hub cache.
    #[must_use]
    pub fn cached(&self) -> Option<PathBuf> {
        Cache::default().repo(self.hub_repo()).get(&self.filename)
    }

    /// Downloads the file into the hub cache, reusing a cached copy when present.
    ///
    /// # Errors
    /// Returns [`LlamaError::Download`] if the hub cannot be reached or the file is missing.
    pub fn fetch(&self, show_progress: bool) -> Result<PathBuf, LlamaError> {
        let download_error = |source| LlamaError::Download {
            repo: self.repo.clone(),
            file: self.filename.clone(),
            source,
        };
        let api = ApiBuilder::new()
            .with_progress(show_progress)
            .build()
            .map_err(download_error)?;

        tracing::info!(repo = %self.repo, file = %self.filename, "fetching model weights");
        let path = api
            .repo(self.hub_repo())
            .get(&self.filename)
            .map_err(download_error)?;
        tracing::info!(path = %path.display(), "model weights ready");
        Ok(path)
    }
}
