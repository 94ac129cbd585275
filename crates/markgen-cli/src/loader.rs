//! # Type-Graph Documents
//!
//! [`DocumentLoader`] is the [`TypeLoader`] used by the CLI. Each input file
//! holds either one package or a list of packages, serialized the way
//! [`PackageNode`] derives it. The format follows the file extension:
//! `.json` is JSON, `.yaml`/`.yml` is YAML. Packages from every input are
//! concatenated in input order and then resolved into a single graph.

use std::path::{Path, PathBuf};

use markgen_core::{MarkgenError, PackageNode, TypeGraph, TypeLoader};
use serde::Deserialize;
use thiserror::Error;

/// Why an input document could not be read.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{path}: unsupported extension (expected .yaml, .yml or .json)")]
    UnsupportedFormat { path: PathBuf },

    #[error("{path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("no input documents given")]
    NoInputs,
}

impl From<LoadError> for MarkgenError {
    fn from(err: LoadError) -> Self {
        MarkgenError::Load(err.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Many(Vec<PackageNode>),
    One(PackageNode),
}

impl Document {
    fn into_packages(self) -> Vec<PackageNode> {
        match self {
            Self::Many(packages) => packages,
            Self::One(package) => vec![package],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Yaml,
    Json,
}

fn format_of(path: &Path) -> Result<Format, LoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => Ok(Format::Yaml),
        Some("json") => Ok(Format::Json),
        _ => Err(LoadError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Reads serialized packages from YAML or JSON files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    /// Read the packages of one document.
    pub fn read(&self, path: &Path) -> Result<Vec<PackageNode>, LoadError> {
        let format = format_of(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_error = |message: String| LoadError::Parse {
            path: path.to_path_buf(),
            message,
        };
        let document: Document = match format {
            Format::Yaml => serde_yaml::from_str(&text).map_err(|e| parse_error(e.to_string()))?,
            Format::Json => serde_json::from_str(&text).map_err(|e| parse_error(e.to_string()))?,
        };
        let packages = document.into_packages();
        tracing::debug!(path = %path.display(), packages = packages.len(), "read type-graph document");
        Ok(packages)
    }
}

impl TypeLoader for DocumentLoader {
    fn load(&self, roots: &[PathBuf]) -> Result<TypeGraph, MarkgenError> {
        if roots.is_empty() {
            return Err(LoadError::NoInputs.into());
        }
        let mut packages = Vec::new();
        for root in roots {
            packages.extend(self.read(root)?);
        }
        let graph = TypeGraph::new(packages)?;
        tracing::info!(inputs = roots.len(), declarations = graph.len(), "loaded type graph");
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markgen_core::{TypeIdent, TypeRef};

    const YAML: &str = r#"
- name: example.com/v1
  doc: ["+groupName=example.com"]
  types:
    - name: Widget
      package: example.com/v1
      kind: record
      fields:
        - name: Replicas
          type: { scalar: int32 }
          key: replicas
"#;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    // ── Formats ──────────────────────────────────────────────────────

    #[test]
    fn test_yaml_list_of_packages() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "types.yaml", YAML);
        let graph = DocumentLoader.load(&[path]).unwrap();
        let widget = graph.resolve(&TypeIdent::new("example.com/v1", "Widget")).unwrap();
        assert_eq!(widget.fields()[0].key, "replicas");
        assert!(matches!(widget.fields()[0].ty, TypeRef::Scalar(_)));
    }

    #[test]
    fn test_json_single_package() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{"name": "example.com/v2", "types": []}"#;
        let path = write(dir.path(), "types.json", json);
        let packages = DocumentLoader.read(&path).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "example.com/v2");
    }

    #[test]
    fn test_inputs_concatenate() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.yaml", YAML);
        let b = write(dir.path(), "b.json", r#"{"name": "example.com/v2"}"#);
        let graph = DocumentLoader.load(&[a, b]).unwrap();
        let names: Vec<&str> = graph.packages().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["example.com/v1", "example.com/v2"]);
    }

    // ── Errors ───────────────────────────────────────────────────────

    #[test]
    fn test_unknown_extension() {
        let err = DocumentLoader.read(Path::new("types.toml")).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = DocumentLoader.read(Path::new("/nonexistent/types.yaml")).unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[test]
    fn test_malformed_document_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.yaml", "- name: [unclosed\n");
        let err = DocumentLoader.load(&[path]).unwrap_err();
        assert!(matches!(err, MarkgenError::Load(ref m) if m.contains("bad.yaml")));
    }

    #[test]
    fn test_duplicate_across_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.yaml", YAML);
        let b = write(dir.path(), "b.yaml", YAML);
        let err = DocumentLoader.load(&[a, b]).unwrap_err();
        assert!(matches!(err, MarkgenError::DuplicateDeclaration(_)));
    }

    #[test]
    fn test_no_inputs() {
        assert!(matches!(DocumentLoader.load(&[]), Err(MarkgenError::Load(_))));
    }
}
