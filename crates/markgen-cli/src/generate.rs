//! # Generation Pipeline
//!
//! One run of markgen over a loaded type graph:
//!
//! 1. Compose the marker registry from every provider.
//! 2. Parse markers for every package, declaration and field.
//! 3. Parse the feature-gate state.
//! 4. Run each enabled generator: resource definitions, access rules,
//!    webhooks and metrics.
//! 5. Merge every engine's diagnostics in pipeline order.
//!
//! The pipeline never fails because of a diagnostic. Writing the results is
//! left to the caller so `check` and `generate` share the same run.

use anyhow::{Context, Result};
use markgen_core::{Diagnostics, TypeGraph};
use markgen_gates::{GateState, SkippedEntry};
use markgen_markers::{MarkerIndex, MarkerParser, Registry, RegistryError};
use markgen_metrics::{MetricsConfig, MetricsMarkers};
use markgen_rbac::{RbacMarkers, RoleManifest};
use markgen_schema::{CustomResourceDefinition, SchemaMarkers, SynthesisOptions, Synthesizer};
use markgen_webhook::{WebhookConfiguration, WebhookMarkers};

use crate::config::GeneratorConfig;
use crate::output::Artifact;

/// The registry holding every marker markgen understands.
pub fn registry() -> Result<Registry, RegistryError> {
    Registry::compose(&[&SchemaMarkers, &RbacMarkers, &WebhookMarkers, &MetricsMarkers])
}

/// Everything one run produced.
#[derive(Debug, Default)]
pub struct Generated {
    pub crds: Vec<CustomResourceDefinition>,
    pub roles: Vec<RoleManifest>,
    pub webhooks: Vec<WebhookConfiguration>,
    pub metrics: Option<MetricsConfig>,
    pub diagnostics: Diagnostics,
    /// Gate configuration entries that were not understood.
    pub skipped_gates: Vec<SkippedEntry>,
}

impl Generated {
    /// Output artifacts in write order.
    pub fn artifacts(&self) -> Result<Vec<Artifact>> {
        let metrics: Vec<&MetricsConfig> = self.metrics.iter().filter(|m| !m.is_empty()).collect();
        Ok(vec![
            Artifact::new("crds", &self.crds)?,
            Artifact::new("role", &self.roles)?,
            Artifact::new("manifests", &self.webhooks)?,
            Artifact::new("metrics", &metrics)?,
        ])
    }
}

/// Run every enabled generator over `graph`.
pub fn run_pipeline(graph: &TypeGraph, config: &GeneratorConfig) -> Result<Generated> {
    let registry = registry().context("composing marker registry")?;
    let parser = MarkerParser::new(&registry);
    let (index, mut diagnostics) = MarkerIndex::collect(graph, &parser);
    tracing::debug!(markers = registry.len(), diagnostics = diagnostics.len(), "parsed markers");

    let (gates, skipped_gates) = GateState::parse_with_report(&config.feature_gates);
    tracing::debug!(gates = gates.len(), skipped = skipped_gates.len(), "parsed feature gates");

    let mut out = Generated {
        skipped_gates,
        ..Generated::default()
    };

    if config.crd.enabled {
        out.crds = generate_crds(graph, &index, &gates, config, &mut diagnostics);
    }

    if config.rbac.enabled {
        let (rules, diags) = markgen_rbac::collect(&index, &gates);
        diagnostics.extend(diags);
        out.roles = markgen_rbac::render_roles(&rules, &config.rbac.role_name);
    }

    if config.webhook.enabled {
        let (lists, diags) = markgen_webhook::assemble(&index, &gates);
        diagnostics.extend(diags);
        out.webhooks = markgen_webhook::render_configurations(&lists, &config.webhook.manifest_options());
    }

    if config.metrics.enabled {
        let (metrics, diags) = markgen_metrics::collect(graph, &index, &gates);
        diagnostics.extend(diags);
        out.metrics = Some(metrics);
    }

    tracing::info!(
        crds = out.crds.len(),
        roles = out.roles.len(),
        webhook_configurations = out.webhooks.len(),
        diagnostics = diagnostics.len(),
        "generation complete"
    );
    out.diagnostics = diagnostics;
    Ok(out)
}

fn generate_crds(
    graph: &TypeGraph,
    index: &MarkerIndex,
    gates: &GateState,
    config: &GeneratorConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<CustomResourceDefinition> {
    let mut synth = Synthesizer::new(graph, index, gates).with_options(SynthesisOptions {
        max_description_length: config.crd.max_description_length,
    });
    let (crds, assembly) = markgen_schema::assemble(&mut synth);
    diagnostics.extend(synth.into_diagnostics());
    diagnostics.extend(assembly);
    crds
}

/// Log every diagnostic at warn level.
pub fn report(diagnostics: &Diagnostics) {
    for diag in diagnostics {
        tracing::warn!(kind = %diag.kind, location = %diag.location, "{}", diag.message);
    }
}
