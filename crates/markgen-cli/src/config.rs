//! # Generator Configuration
//!
//! `markgen.yaml` controls which inputs are read, which gates are enabled,
//! where output goes, and which generators run. Every key is optional; an
//! absent file means defaults. Command-line flags override file values.
//!
//! ```yaml
//! inputs: [api/v1.yaml]
//! featureGates: alpha=true,beta=false
//! output: { dir: config, format: yaml }
//! crd: { enabled: true, maxDescriptionLength: 200 }
//! rbac: { enabled: true, roleName: manager-role }
//! webhook: { enabled: true, configName: webhooks, serviceName: svc, serviceNamespace: system }
//! metrics: { enabled: false }
//! ```

use std::path::{Path, PathBuf};

use markgen_core::MarkgenError;
use markgen_webhook::ManifestOptions;
use serde::{Deserialize, Serialize};

/// Serialization format of generated documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Directory to write into; stdout when absent.
    pub dir: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CrdSection {
    pub enabled: bool,
    pub max_description_length: Option<usize>,
}

impl Default for CrdSection {
    fn default() -> Self {
        Self {
            enabled: true,
            max_description_length: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RbacSection {
    pub enabled: bool,
    pub role_name: String,
}

impl Default for RbacSection {
    fn default() -> Self {
        Self {
            enabled: true,
            role_name: "manager-role".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WebhookSection {
    pub enabled: bool,
    pub config_name: String,
    pub service_name: String,
    pub service_namespace: String,
}

impl Default for WebhookSection {
    fn default() -> Self {
        let options = ManifestOptions::default();
        Self {
            enabled: true,
            config_name: options.config_name,
            service_name: options.service_name,
            service_namespace: options.service_namespace,
        }
    }
}

impl WebhookSection {
    pub fn manifest_options(&self) -> ManifestOptions {
        ManifestOptions {
            config_name: self.config_name.clone(),
            service_name: self.service_name.clone(),
            service_namespace: self.service_namespace.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSection {
    pub enabled: bool,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// The whole configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Type-graph documents to load, YAML or JSON by extension.
    pub inputs: Vec<PathBuf>,
    /// Gate state in `name=true,name=false` form.
    pub feature_gates: String,
    pub output: OutputSection,
    pub crd: CrdSection,
    pub rbac: RbacSection,
    pub webhook: WebhookSection,
    pub metrics: MetricsSection,
}

impl GeneratorConfig {
    /// Parse a configuration document.
    pub fn from_yaml(text: &str) -> Result<Self, MarkgenError> {
        serde_yaml::from_str(text).map_err(|e| MarkgenError::Config(e.to_string()))
    }

    /// Read a configuration file. Relative input paths and the output
    /// directory are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self, MarkgenError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| MarkgenError::Config(format!("{}: {e}", path.display())))?;
        let mut config = Self::from_yaml(&text)?;
        if let Some(base) = path.parent() {
            for input in &mut config.inputs {
                if input.is_relative() {
                    *input = base.join(&*input);
                }
            }
            if let Some(dir) = config.output.dir.as_mut() {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
        tracing::debug!(path = %path.display(), inputs = config.inputs.len(), "loaded configuration");
        Ok(config)
    }

    /// Apply command-line overrides. Non-empty inputs replace the file's.
    pub fn apply(&mut self, overrides: &Overrides) {
        if !overrides.inputs.is_empty() {
            self.inputs = overrides.inputs.clone();
        }
        if let Some(gates) = &overrides.feature_gates {
            self.feature_gates = gates.clone();
        }
        if let Some(dir) = &overrides.output_dir {
            self.output.dir = Some(dir.clone());
        }
        if let Some(format) = overrides.format {
            self.output.format = format;
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub inputs: Vec<PathBuf>,
    pub feature_gates: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<OutputFormat>,
}
