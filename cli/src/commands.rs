//! Subcommand implementations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ragshelf_index::{
    BackendEmbedder, DirectoryReader, IndexManager, LlmSource, ModelType, StorageFormat,
    VectorStoreIndex,
};

pub fn persist(
    docs: &Path,
    storage: PathBuf,
    model_type: Option<&str>,
    format: StorageFormat,
    extensions: Vec<String>,
    recursive: bool,
) -> Result<()> {
    let documents = DirectoryReader::new(docs)
        .recursive(recursive)
        .extensions(extensions)
        .load()
        .with_context(|| format!("failed to read documents from {}", docs.display()))?;
    if documents.is_empty() {
        bail!("no readable documents in {}", docs.display());
    }

    let mut builder = IndexManager::builder()
        .storage_dir(&storage)
        .documents(documents)
        .storage_format(format);
    if let Some(label) = model_type {
        builder = builder.model_type(label);
    }
    let manager = builder.build()?;

    let index = manager.persist()?.context("index was not built")?;
    println!(
        "Indexed {} documents into {} chunks at {} ({format})",
        index.ref_doc_ids().len(),
        index.len(),
        storage.display()
    );
    Ok(())
}

fn open(storage: PathBuf, model_type: Option<&str>) -> Result<VectorStoreIndex<BackendEmbedder>> {
    let display = storage.display().to_string();
    let manager = IndexManager::new(Some(storage), None, model_type)?;
    manager
        .load()
        .with_context(|| format!("failed to load index from {display}"))?
        .with_context(|| format!("no index at {display}; run `ragshelf persist` first"))
}

pub fn load(storage: PathBuf, model_type: Option<&str>) -> Result<()> {
    let index = open(storage, model_type)?;
    let splitter = index.splitter();
    println!("Documents: {}", index.ref_doc_ids().len());
    println!("Chunks:    {}", index.len());
    println!(
        "Chunking:  {} tokens, {} overlap",
        splitter.chunk_size(),
        splitter.chunk_overlap()
    );
    Ok(())
}

pub async fn query(
    storage: PathBuf,
    model_type: Option<&str>,
    text: &str,
    top_k: usize,
) -> Result<()> {
    let index = open(storage, model_type)?;
    let results = index.retrieve(text, top_k).await?;
    if results.is_empty() {
        println!("No matches.");
    }
    for (rank, result) in results.iter().enumerate() {
        println!("{}. [{:.4}] {}", rank + 1, result.score, result.chunk.id);
        println!("   {}", preview(&result.chunk.text, 160));
    }
    Ok(())
}

pub fn fetch(model_type: &str) -> Result<()> {
    let manager = IndexManager::new(None, None, Some(model_type))?;
    match manager.fetch_llm()? {
        Some(path) => println!("{}", path.display()),
        None => println!("{model_type} uses the default language model; nothing to fetch"),
    }
    Ok(())
}

pub fn models() {
    for model_type in ModelType::ALL {
        let profile = model_type.profile();
        let llm = match profile.llm {
            LlmSource::Default => "default",
            LlmSource::Remote { url } => url,
        };
        println!(
            "{:<14} {:<8} {} ({})",
            profile.label,
            profile.embedding.to_string(),
            llm,
            profile.embedding.model_name()
        );
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
