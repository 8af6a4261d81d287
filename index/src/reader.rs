//! Loading documents from a directory tree.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};
use crate::types::{Document, Metadata};

/// Reads every UTF-8 text file under a directory into [`Document`]s.
///
/// Document ids are paths relative to the input directory (with `/` separators), so the same
/// file keeps its id across runs. Hidden files and directories are skipped, as are files that
/// cannot be read or are not valid UTF-8.
///
/// ```rust,no_run
/// use ragshelf_index::DirectoryReader;
///
/// # fn example() -> ragshelf_index::Result<()> {
/// let docs = DirectoryReader::new("./notes")
///     .extensions(["md", "txt"])
///     .load()?;
/// println!("read {} documents", docs.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryReader {
    root: PathBuf,
    recursive: bool,
    extensions: Vec<String>,
}

impl DirectoryReader {
    /// Creates a recursive reader accepting every file extension.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            recursive: true,
            extensions: Vec::new(),
        }
    }

    /// Whether to descend into subdirectories.
    #[must_use]
    pub const fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Restricts reading to files with one of these extensions (without the dot).
    #[must_use]
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|ext| ext.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    /// Reads all matching files, sorted by path.
    ///
    /// # Errors
    /// Returns an error if the root is not a directory or a directory cannot be listed.
    pub fn load(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(IndexError::persistence(
                &self.root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            ));
        }

        let mut documents = Vec::new();
        for path in self.collect_files()? {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable file");
                    continue;
                }
            };
            documents.push(self.document(&path, text));
        }

        tracing::debug!(root = %self.root.display(), documents = documents.len(), "read directory");
        Ok(documents)
    }

    fn document(&self, path: &Path, text: String) -> Document {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let id = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let mut metadata = Metadata::new();
        metadata.insert("file_path".into(), path.display().to_string());
        if let Some(name) = path.file_name() {
            metadata.insert("file_name".into(), name.to_string_lossy().into_owned());
        }
        Document::with_metadata(id, text, metadata)
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }

    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut stack = vec![self.root.clone()];
        let mut files = Vec::new();

        while let Some(dir) = stack.pop() {
            for entry in fs::read_dir(&dir).map_err(|err| IndexError::persistence(&dir, err))? {
                let path = entry?.path();
                if is_hidden(&path) {
                    continue;
                }
                let Ok(metadata) = fs::metadata(&path) else {
                    continue;
                };

                if metadata.is_dir() {
                    if self.recursive {
                        stack.push(path);
                    }
                } else if metadata.is_file() && self.accepts(&path) {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn reads_nested_files_with_relative_ids() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("b.md"), "beta").unwrap();

        let docs = DirectoryReader::new(dir.path()).load().unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a.txt", "sub/b.md"]);
        assert_eq!(docs[1].metadata["file_name"], "b.md");
        assert_eq!(docs[1].text, "beta");
    }

    #[test]
    fn non_recursive_stays_at_top_level() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("b.txt"), "beta").unwrap();

        let docs = DirectoryReader::new(dir.path())
            .recursive(false)
            .load()
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn filters_extensions_and_hidden_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("keep.MD"), "kept").unwrap();
        fs::write(dir.path().join("drop.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join(".hidden.md"), "secret").unwrap();

        let docs = DirectoryReader::new(dir.path())
            .extensions([".md"])
            .load()
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "keep.MD");
    }

    #[test]
    fn skips_non_utf8_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("good.txt"), "fine").unwrap();
        fs::write(dir.path().join("bad.bin"), [0xff, 0xfe, 0xfd]).unwrap();

        let docs = DirectoryReader::new(dir.path()).load().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "good.txt");
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let err = DirectoryReader::new(dir.path().join("nope")).load().unwrap_err();
        assert!(matches!(err, IndexError::Persistence { .. }));
    }
}
