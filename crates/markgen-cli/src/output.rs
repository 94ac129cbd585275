//! # Output Writer
//!
//! Generated documents are grouped into named artifacts (`crds`, `role`,
//! `manifests`, `metrics`). An artifact is rendered to text in the chosen
//! [`OutputFormat`] and handed to an [`OutputSink`].
//!
//! YAML artifacts hold one document per item separated by `---`. JSON
//! artifacts hold a single document when there is exactly one item and an
//! array otherwise.

use std::io::Write;
use std::path::{Path, PathBuf};

use markgen_core::MarkgenError;
use serde::Serialize;

use crate::config::OutputFormat;

/// A named group of documents ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    /// File stem, e.g. `crds`.
    pub name: &'static str,
    pub documents: Vec<serde_json::Value>,
}

impl Artifact {
    /// Convert every item into a document, preserving field order.
    pub fn new<T: Serialize>(name: &'static str, items: &[T]) -> Result<Self, MarkgenError> {
        let documents = items
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { name, documents })
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// File name for this artifact in the given format.
    pub fn file_name(&self, format: OutputFormat) -> String {
        match format {
            OutputFormat::Yaml => format!("{}.yaml", self.name),
            OutputFormat::Json => format!("{}.json", self.name),
        }
    }

    /// Render to text.
    pub fn render(&self, format: OutputFormat) -> Result<String, MarkgenError> {
        match format {
            OutputFormat::Yaml => {
                let mut out = String::new();
                for (i, doc) in self.documents.iter().enumerate() {
                    if i > 0 {
                        out.push_str("---\n");
                    }
                    let text = serde_yaml::to_string(doc)
                        .map_err(|e| MarkgenError::Serialization(e.to_string()))?;
                    out.push_str(&text);
                }
                Ok(out)
            }
            OutputFormat::Json => {
                let mut text = match self.documents.as_slice() {
                    [single] => serde_json::to_string_pretty(single)?,
                    many => serde_json::to_string_pretty(many)?,
                };
                text.push('\n');
                Ok(text)
            }
        }
    }
}

/// Destination for rendered artifacts.
pub trait OutputSink {
    /// Write one rendered artifact.
    fn write(&mut self, file_name: &str, contents: &str) -> Result<(), MarkgenError>;
}

/// Writes each artifact to a file in a directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, MarkgenError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl OutputSink for DirectorySink {
    fn write(&mut self, file_name: &str, contents: &str) -> Result<(), MarkgenError> {
        let path = self.dir.join(file_name);
        std::fs::write(&path, contents)?;
        tracing::info!(path = %path.display(), bytes = contents.len(), "wrote artifact");
        self.written.push(path);
        Ok(())
    }
}

/// Writes every artifact to one stream, each preceded by a `# name` line.
pub struct StreamSink<W: Write> {
    writer: W,
}

impl<W: Write> StreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for StreamSink<W> {
    fn write(&mut self, file_name: &str, contents: &str) -> Result<(), MarkgenError> {
        writeln!(self.writer, "# {file_name}")?;
        self.writer.write_all(contents.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Render and write artifacts. Empty artifacts are skipped.
pub fn write_artifacts(
    sink: &mut dyn OutputSink,
    artifacts: &[Artifact],
    format: OutputFormat,
) -> Result<usize, MarkgenError> {
    let mut written = 0;
    for artifact in artifacts {
        if artifact.is_empty() {
            tracing::debug!(artifact = artifact.name, "nothing to write");
            continue;
        }
        let text = artifact.render(format)?;
        sink.write(&artifact.file_name(format), &text)?;
        written += 1;
    }
    Ok(written)
}
