// ABOUTME: persists rendered schema documents under the output root at a path derived from the type name.
// ABOUTME: writes through a synced temp file and a rename so a failed write never leaves a target behind.

use std::path::{Path, PathBuf};

use jsonschemes_common::split_qualified_name;
use tokio::io::AsyncWriteExt;

use crate::assembler::SchemaDocument;
use crate::config::{GeneratorConfig, PathLayout};

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serialize schema for {qualified_name}: {source}")]
    Serialize {
        qualified_name: String,
        #[source]
        source: serde_json::Error,
    },
}

pub fn document_path(output_dir: &Path, qualified_name: &str, layout: PathLayout) -> PathBuf {
    let mut path = output_dir.to_path_buf();
    let (namespace, simple_name) = split_qualified_name(qualified_name);

    if let Some(namespace) = namespace {
        path.extend(namespace.split('.'));
    }
    if layout == PathLayout::TypeDirectory {
        path.push(simple_name);
    }
    path.push(format!("{simple_name}.json"));
    path
}

pub struct OutputSink<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> OutputSink<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    pub async fn prepare(&self) -> Result<(), SinkError> {
        create_dir_all(&self.config.output_dir).await
    }

    pub async fn persist(&self, document: &SchemaDocument) -> Result<PathBuf, SinkError> {
        let text = document.render().map_err(|source| SinkError::Serialize {
            qualified_name: document.qualified_name.clone(),
            source,
        })?;

        let target = document_path(
            &self.config.output_dir,
            &document.qualified_name,
            self.config.layout,
        );
        if let Some(parent) = target.parent() {
            create_dir_all(parent).await?;
        }

        let tmp = temp_path_for(&target);
        if let Err(source) = write_then_rename(&tmp, &target, text.as_bytes()).await {
            if let Err(err) = tokio::fs::remove_file(&tmp).await {
                tracing::debug!(path = %tmp.display(), error = %err, "temp file cleanup failed");
            }
            return Err(SinkError::Write {
                path: target,
                source,
            });
        }

        Ok(target)
    }
}

async fn create_dir_all(path: &Path) -> Result<(), SinkError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| SinkError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}

fn temp_path_for(target: &Path) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    target.with_file_name(format!(".{file_name}.tmp"))
}

async fn write_then_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(tmp)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(tmp, target).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::json_schema;

    fn document(name: &str) -> SchemaDocument {
        SchemaDocument {
            qualified_name: name.to_string(),
            schema: json_schema!({ "type": "object" }),
        }
    }

    #[test]
    fn flat_layout_mirrors_namespace() {
        let path = document_path(Path::new("out"), "a.b.Widget", PathLayout::Flat);
        assert_eq!(path, Path::new("out").join("a").join("b").join("Widget.json"));
    }

    #[test]
    fn type_directory_layout_nests_simple_name() {
        let path = document_path(Path::new("out"), "a.b.Widget", PathLayout::TypeDirectory);
        assert_eq!(
            path,
            Path::new("out").join("a").join("b").join("Widget").join("Widget.json")
        );
    }

    #[test]
    fn unqualified_name_lands_in_root() {
        let path = document_path(Path::new("out"), "Widget", PathLayout::Flat);
        assert_eq!(path, Path::new("out").join("Widget.json"));
    }

    #[tokio::test]
    async fn persist_creates_directories_and_writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::new(dir.path().join("out"));
        let sink = OutputSink::new(&config);
        sink.prepare().await.unwrap();

        let path = sink.persist(&document("a.b.Widget")).await.unwrap();
        assert_eq!(path, dir.path().join("out/a/b/Widget.json"));

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(text, "{\n  \"type\": \"object\"\n}\n");
        assert!(!dir.path().join("out/a/b/.Widget.json.tmp").exists());
    }

    #[tokio::test]
    async fn persist_overwrites_existing_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::new(dir.path());
        let sink = OutputSink::new(&config);

        let path = sink.persist(&document("a.Widget")).await.unwrap();
        tokio::fs::write(&path, b"stale").await.unwrap();
        sink.persist(&document("a.Widget")).await.unwrap();

        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(text.starts_with('{'));
    }

    #[tokio::test]
    async fn prepare_fails_when_root_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("out");
        tokio::fs::write(&blocker, b"not a directory").await.unwrap();

        let config = GeneratorConfig::new(&blocker);
        let sink = OutputSink::new(&config);
        let err = sink.prepare().await.unwrap_err();
        assert!(matches!(err, SinkError::CreateDir { .. }));
    }

    #[tokio::test]
    async fn failed_write_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig::new(dir.path());
        let sink = OutputSink::new(&config);

        let occupied = dir.path().join("a").join("Widget.json");
        tokio::fs::create_dir_all(occupied.join("inner")).await.unwrap();

        let err = sink.persist(&document("a.Widget")).await.unwrap_err();
        assert!(matches!(err, SinkError::Write { .. }));
        assert!(occupied.is_dir());
        assert!(!dir.path().join("a").join(".Widget.json.tmp").exists());
    }
}
