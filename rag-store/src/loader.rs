//! File loaders: `.txt` / `.md` as one document, `.pdf` as one document per page.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::errors::LoadError;
use crate::record::{Document, SOURCE_KEY};

/// Extensions accepted by [`load_file`], lowercase and without the dot.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "md", "pdf"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum FileKind {
    Text,
    Markdown,
    Pdf,
}

impl FileKind {
    fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = extension_of(path);
        match ext.as_str() {
            "txt" => Ok(Self::Text),
            "md" => Ok(Self::Markdown),
            "pdf" => Ok(Self::Pdf),
            _ => Err(LoadError::UnsupportedType {
                path: path.to_path_buf(),
                extension: ext,
            }),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Markdown => "md",
            Self::Pdf => "pdf",
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Whether [`load_file`] accepts this path's extension.
pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Loads one file; `source` metadata is the path.
pub async fn load_file(path: impl AsRef<Path>) -> Result<Vec<Document>, LoadError> {
    let path = path.as_ref();
    load_file_as(path, &path.display().to_string()).await
}

/// Loads one file and labels every document with `source`.
///
/// Uploads use the original file name here instead of the temp path.
pub async fn load_file_as(
    path: impl AsRef<Path>,
    source: &str,
) -> Result<Vec<Document>, LoadError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let kind = FileKind::from_path(path)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = |extra: Option<(&str, Value)>| {
        let mut meta = BTreeMap::new();
        meta.insert(SOURCE_KEY.to_string(), json!(source));
        meta.insert("file_name".to_string(), json!(file_name));
        meta.insert("file_type".to_string(), json!(kind.label()));
        if let Some((k, v)) = extra {
            meta.insert(k.to_string(), v);
        }
        meta
    };

    let docs = match kind {
        FileKind::Text | FileKind::Markdown => {
            let bytes = tokio::fs::read(path).await.map_err(|err| LoadError::Io {
                path: path.to_path_buf(),
                source: err,
            })?;
            let text =
                String::from_utf8(bytes).map_err(|_| LoadError::Decode(path.to_path_buf()))?;
            vec![Document::with_metadata(text, base(None))]
        }
        FileKind::Pdf => extract_pdf_pages(path)
            .await?
            .into_iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| Document::with_metadata(text, base(Some(("page", json!(i + 1))))))
            .collect(),
    };

    debug!(path = %path.display(), documents = docs.len(), "file loaded");
    Ok(docs)
}

/// Text of every page; extraction runs on the blocking pool.
async fn extract_pdf_pages(path: &Path) -> Result<Vec<String>, LoadError> {
    let owned: PathBuf = path.to_path_buf();
    let joined =
        tokio::task::spawn_blocking(move || pdf_extract::extract_text_by_pages(&owned)).await;
    match joined {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(LoadError::Pdf {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
        // The extractor panics on some malformed files.
        Err(e) => Err(LoadError::Pdf {
            path: path.to_path_buf(),
            reason: format!("extractor aborted: {e}"),
        }),
    }
}

/// Loads every supported file under `dir` recursively.
///
/// Unsupported extensions are skipped silently; files that fail to load are
/// logged and skipped.
pub async fn load_directory(dir: impl AsRef<Path>) -> Result<Vec<Document>, LoadError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(LoadError::NotFound(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file() && is_supported(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();

    let mut docs = Vec::new();
    let mut failed = 0usize;
    for file in &files {
        match load_file(file).await {
            Ok(mut loaded) => docs.append(&mut loaded),
            Err(err) => {
                failed += 1;
                warn!(path = %file.display(), error = %err, "failed to load file; skipping");
            }
        }
    }

    info!(
        dir = %dir.display(),
        files = files.len(),
        failed,
        documents = docs.len(),
        "directory loaded"
    );
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn loads_text_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        fs::write(&path, "# Title\n\nBody").unwrap();

        let docs = load_file_as(&path, "notes.md").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content(), "# Title\n\nBody");
        assert_eq!(docs[0].source(), Some("notes.md"));
        assert_eq!(docs[0].metadata()["file_type"], json!("md"));
        assert_eq!(docs[0].metadata()["file_name"], json!("notes.md"));
    }

    #[tokio::test]
    async fn rejects_unsupported_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("table.csv");
        fs::write(&csv, "a,b\n1,2").unwrap();
        assert!(matches!(
            load_file(&csv).await,
            Err(LoadError::UnsupportedType { extension, .. }) if extension == "csv"
        ));
        assert!(matches!(
            load_file(dir.path().join("gone.txt")).await,
            Err(LoadError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_is_not_found_whatever_its_extension() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_file(dir.path().join("gone.csv")).await,
            Err(LoadError::NotFound(p)) if p.ends_with("gone.csv")
        ));
        assert!(matches!(
            load_file(dir.path().join("no_extension")).await,
            Err(LoadError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.txt");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(load_file(&path).await, Err(LoadError::Decode(_))));
    }

    #[tokio::test]
    async fn broken_pdf_is_reported_not_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"definitely not a pdf").unwrap();
        assert!(matches!(load_file(&path).await, Err(LoadError::Pdf { .. })));
    }

    #[tokio::test]
    async fn directory_skips_unsupported_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("nested/b.MD"), "beta").unwrap();
        fs::write(dir.path().join("c.csv"), "x,y").unwrap();
        fs::write(dir.path().join("d.txt"), [0xff, 0xfe]).unwrap();

        let docs = load_directory(dir.path()).await.unwrap();
        let contents: Vec<&str> = docs.iter().map(|d| d.content()).collect();
        assert_eq!(contents, vec!["alpha", "beta"]);
    }
}
