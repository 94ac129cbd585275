//! End-to-end runs of the `generate` and `check` handlers over YAML
//! type-graph fixtures.

use std::path::{Path, PathBuf};

use markgen_cli::commands::{run_check, run_generate, GlobalOptions, PipelineArgs};
use markgen_cli::{run_pipeline, DocumentLoader, GeneratorConfig, OutputFormat};
use markgen_core::{DiagnosticKind, TypeLoader};
use serde::Deserialize;
use serde_yaml::Value;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn documents(path: &Path) -> Vec<Value> {
    let text = std::fs::read_to_string(path).unwrap();
    serde_yaml::Deserializer::from_str(&text)
        .map(|doc| Value::deserialize(doc).unwrap())
        .collect()
}

fn generate_into(dir: &Path, fixture_name: &str, format: Option<OutputFormat>) -> u8 {
    let args = PipelineArgs {
        inputs: vec![fixture(fixture_name)],
        output_dir: Some(dir.to_path_buf()),
        format,
        ..PipelineArgs::default()
    };
    run_generate(&args, &GlobalOptions::default()).unwrap()
}

fn strings(value: &Value) -> Vec<&str> {
    value
        .as_sequence()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect()
}

// ── generate ─────────────────────────────────────────────────────────

#[test]
fn generate_writes_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(generate_into(dir.path(), "widgets.yaml", None), 0);
    for name in ["crds.yaml", "role.yaml", "manifests.yaml", "metrics.yaml"] {
        assert!(dir.path().join(name).is_file(), "{name} not written");
    }
}

#[test]
fn generated_crd_carries_schema_and_names() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path(), "widgets.yaml", None);
    let crds = documents(&dir.path().join("crds.yaml"));
    assert_eq!(crds.len(), 1);
    let crd = &crds[0];
    assert_eq!(crd["kind"], "CustomResourceDefinition");
    assert_eq!(crd["spec"]["group"], "widgets.example.com");
    assert_eq!(crd["spec"]["names"]["plural"], "widgets");
    assert_eq!(strings(&crd["spec"]["names"]["shortNames"]), ["wd"]);
    assert_eq!(crd["spec"]["scope"], "Namespaced");

    let version = &crd["spec"]["versions"][0];
    assert_eq!(version["name"], "v1");
    assert_eq!(version["storage"], true);
    assert!(version["subresources"]["status"].is_mapping());
    assert_eq!(version["additionalPrinterColumns"][0]["jsonPath"], ".spec.replicas");

    let spec = &version["schema"]["openAPIV3Schema"]["properties"]["spec"];
    let replicas = &spec["properties"]["replicas"];
    assert_eq!(replicas["type"], "integer");
    assert_eq!(replicas["minimum"], 1);
    assert_eq!(replicas["maximum"], 10);
    assert_eq!(replicas["description"], "Replicas is the desired number of gadgets.");
    assert_eq!(strings(&spec["properties"]["color"]["enum"]), ["red", "blue"]);
    assert_eq!(strings(&spec["required"]), ["replicas"]);
}

#[test]
fn generated_roles_merge_and_split_by_namespace() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path(), "widgets.yaml", None);
    let roles = documents(&dir.path().join("role.yaml"));
    assert_eq!(roles.len(), 2);

    let cluster = &roles[0];
    assert_eq!(cluster["kind"], "ClusterRole");
    assert_eq!(cluster["metadata"]["name"], "manager-role");
    let rules = cluster["rules"].as_sequence().unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(strings(&rules[0]["resources"]), ["widgets"]);
    assert_eq!(
        strings(&rules[0]["verbs"]),
        ["create", "delete", "get", "list", "watch"]
    );
    assert_eq!(strings(&rules[1]["resources"]), ["widgets/status"]);

    let namespaced = &roles[1];
    assert_eq!(namespaced["kind"], "Role");
    assert_eq!(namespaced["metadata"]["namespace"], "widget-system");
    assert_eq!(strings(&namespaced["rules"][0]["apiGroups"]), [""]);
}

#[test]
fn generated_webhooks_by_kind() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path(), "widgets.yaml", None);
    let docs = documents(&dir.path().join("manifests.yaml"));
    let kinds: Vec<&str> = docs.iter().map(|d| d["kind"].as_str().unwrap()).collect();
    assert_eq!(kinds, ["MutatingWebhookConfiguration", "ValidatingWebhookConfiguration"]);
    let validating = &docs[1]["webhooks"][0];
    assert_eq!(validating["name"], "vwidget.example.com");
    assert_eq!(validating["failurePolicy"], "Ignore");
    assert_eq!(validating["clientConfig"]["service"]["path"], "/validate-v1-widget");
    assert_eq!(strings(&validating["rules"][0]["operations"]), ["CREATE", "UPDATE"]);
}

#[test]
fn generated_metrics_follow_serialization_keys() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path(), "widgets.yaml", None);
    let docs = documents(&dir.path().join("metrics.yaml"));
    assert_eq!(docs.len(), 1);
    let resource = &docs[0]["spec"]["resources"][0];
    assert_eq!(resource["groupVersionKind"]["kind"], "Widget");
    assert_eq!(resource["metricNamePrefix"], "widget");
    let metrics = resource["metrics"].as_sequence().unwrap();
    assert_eq!(metrics[0]["name"], "replicas");
    assert_eq!(strings(&metrics[0]["each"]["gauge"]["path"]), ["spec", "replicas"]);
    assert_eq!(metrics[1]["each"]["type"], "StateSet");
    assert_eq!(strings(&metrics[1]["each"]["stateSet"]["path"]), ["status", "phase"]);
}

#[test]
fn generate_json_format() {
    let dir = tempfile::tempdir().unwrap();
    generate_into(dir.path(), "widgets.yaml", Some(OutputFormat::Json));
    let text = std::fs::read_to_string(dir.path().join("crds.json")).unwrap();
    let crd: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(crd["metadata"]["name"], "widgets.widgets.example.com");
    assert!(!dir.path().join("crds.yaml").exists());
}

#[test]
fn generate_is_deterministic() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    generate_into(a.path(), "widgets.yaml", None);
    generate_into(b.path(), "widgets.yaml", None);
    for name in ["crds.yaml", "role.yaml", "manifests.yaml", "metrics.yaml"] {
        let left = std::fs::read_to_string(a.path().join(name)).unwrap();
        let right = std::fs::read_to_string(b.path().join(name)).unwrap();
        assert_eq!(left, right, "{name} differs between runs");
    }
}

#[test]
fn generate_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("markgen.yaml");
    std::fs::write(
        &config,
        format!(
            "inputs: [{}]\noutput: {{ dir: out }}\nrbac: {{ roleName: widget-manager }}\nwebhook: {{ enabled: false }}\n",
            fixture("widgets.yaml").display()
        ),
    )
    .unwrap();
    let global = GlobalOptions {
        config: Some(config),
        strict: false,
    };
    assert_eq!(run_generate(&PipelineArgs::default(), &global).unwrap(), 0);
    let out = dir.path().join("out");
    let roles = documents(&out.join("role.yaml"));
    assert_eq!(roles[0]["metadata"]["name"], "widget-manager");
    assert!(!out.join("manifests.yaml").exists());
}

// ── diagnostics ──────────────────────────────────────────────────────

#[test]
fn diagnostics_do_not_abort_unrelated_output() {
    let graph = DocumentLoader.load(&[fixture("broken.yaml")]).unwrap();
    let out = run_pipeline(&graph, &GeneratorConfig::default()).unwrap();
    assert_eq!(out.crds.len(), 1);
    assert!(out.roles.is_empty());
    assert!(out.webhooks.is_empty());
    assert_eq!(out.diagnostics.of_kind(DiagnosticKind::Semantic).count(), 3);
}

#[test]
fn strict_check_exits_two() {
    let args = PipelineArgs {
        inputs: vec![fixture("broken.yaml")],
        ..PipelineArgs::default()
    };
    let lenient = GlobalOptions::default();
    let strict = GlobalOptions {
        strict: true,
        ..GlobalOptions::default()
    };
    assert_eq!(run_check(&args, &lenient).unwrap(), 0);
    assert_eq!(run_check(&args, &strict).unwrap(), 2);
    let clean = PipelineArgs {
        inputs: vec![fixture("widgets.yaml")],
        ..PipelineArgs::default()
    };
    assert_eq!(run_check(&clean, &strict).unwrap(), 0);
}

#[test]
fn missing_input_is_an_error() {
    let args = PipelineArgs {
        inputs: vec![fixture("absent.yaml")],
        ..PipelineArgs::default()
    };
    let err = run_check(&args, &GlobalOptions::default()).unwrap_err();
    assert!(format!("{err:#}").contains("absent.yaml"));
}
