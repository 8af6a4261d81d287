//! Build, load and query ragshelf indexes from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Index a directory with local embeddings and Llama 2 7B
//! ragshelf persist --docs ./notes --storage ./storage --model-type LLAMA2-7B_Q4
//!
//! # Check what is stored
//! ragshelf load --storage ./storage --model-type LLAMA2-7B_Q4
//!
//! # Retrieve the closest chunks
//! ragshelf query --storage ./storage --model-type LLAMA2-7B_Q4 "how do lifetimes work?"
//!
//! # Download the GGUF weights for a model type
//! ragshelf fetch --model-type MIXTRAL-7B_Q5
//!
//! # List model types
//! ragshelf models
//! ```
//!
//! Logging follows `RUST_LOG`; `--verbose` raises the default level to `debug`, which also
//! turns on per-document progress while indexing.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ragshelf_index::{DEFAULT_TOP_K, StorageFormat};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ragshelf", version, about)]
struct Args {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an index from a directory of documents and write it to storage.
    Persist {
        /// Directory of documents to index.
        #[arg(long)]
        docs: PathBuf,
        /// Storage directory. Any index already there is replaced.
        #[arg(long)]
        storage: PathBuf,
        /// Model type label (see `ragshelf models`).
        #[arg(short, long)]
        model_type: Option<String>,
        /// Storage format.
        #[arg(long, default_value_t = StorageFormat::Json)]
        format: StorageFormat,
        /// Only read files with these extensions.
        #[arg(short, long = "ext", value_delimiter = ',')]
        extensions: Vec<String>,
        /// Do not descend into subdirectories.
        #[arg(long)]
        no_recursive: bool,
    },
    /// Load an index from storage and summarize it.
    Load {
        #[arg(long)]
        storage: PathBuf,
        #[arg(short, long)]
        model_type: Option<String>,
    },
    /// Retrieve the chunks most similar to a query.
    Query {
        #[arg(long)]
        storage: PathBuf,
        #[arg(short, long)]
        model_type: Option<String>,
        /// Number of chunks to return.
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Query text.
        text: String,
    },
    /// Download the language-model weights of a model type.
    Fetch {
        #[arg(short, long)]
        model_type: String,
    },
    /// List supported model types.
    Models,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match args.command {
        Command::Persist {
            docs,
            storage,
            model_type,
            format,
            extensions,
            no_recursive,
        } => commands::persist(
            &docs,
            storage,
            model_type.as_deref(),
            format,
            extensions,
            !no_recursive,
        ),
        Command::Load {
            storage,
            model_type,
        } => commands::load(storage, model_type.as_deref()),
        Command::Query {
            storage,
            model_type,
            top_k,
            text,
        } => commands::query(storage, model_type.as_deref(), &text, top_k).await,
        Command::Fetch { model_type } => commands::fetch(&model_type),
        Command::Models => {
            commands::models();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn parses_persist() {
        let args = Args::try_parse_from([
            "ragshelf",
            "persist",
            "--docs",
            "in",
            "--storage",
            "out",
            "-m",
            "LLAMA2-13B_Q5",
            "--format",
            "redb",
            "--ext",
            "md,txt",
        ])
        .unwrap();
        let Command::Persist {
            model_type,
            format,
            extensions,
            no_recursive,
            ..
        } = args.command
        else {
            panic!("expected persist");
        };
        assert_eq!(model_type.as_deref(), Some("LLAMA2-13B_Q5"));
        assert_eq!(format, StorageFormat::Redb);
        assert_eq!(extensions, vec!["md", "txt"]);
        assert!(!no_recursive);
    }

    #[test]
    fn query_defaults_top_k() {
        let args =
            Args::try_parse_from(["ragshelf", "query", "--storage", "s", "what is rust"]).unwrap();
        let Command::Query { top_k, text, .. } = args.command else {
            panic!("expected query");
        };
        assert_eq!(top_k, DEFAULT_TOP_K);
        assert_eq!(text, "what is rust");
    }
}
