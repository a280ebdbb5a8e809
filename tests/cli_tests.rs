//! Command handler tests against files on disk.

use breach_render::cli::{run_functions, run_render, run_schema, run_validate, RenderOptions, SchemaKind};
use breach_render::config::{generate_example_templates, load_template_file, TemplateFile};
use breach_render::{EvalLimits, OutputFormat, Validatable};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BREACHES: &str = r#"[
  {"breach-type": "key-value", "check-name": "config-check", "check-type": "yaml",
   "severity": "high", "key": "config.yml", "value": "invalid syntax"},
  {"breach-type": "key-values", "check-name": "deps-check", "check-type": "json",
   "key": "composer.json", "values": ["1.0", "2.0"]},
  {"breach-type": "value", "check-name": "unknown-check", "value": "left alone"}
]"#;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn options(dir: &TempDir, format: OutputFormat, json: bool) -> RenderOptions {
    RenderOptions {
        template: write(dir.path(), "rules.yaml", &generate_example_templates()),
        breaches: write(dir.path(), "breaches.json", BREACHES),
        facts: None,
        format,
        json,
        limits: EvalLimits::default(),
    }
}

fn render_to_string(opts: &RenderOptions) -> String {
    let mut out = Vec::new();
    run_render(opts, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn example_templates_are_valid() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "rules.yaml", &generate_example_templates());
    let file = load_template_file(&path).unwrap();
    assert!(matches!(file, TemplateFile::Rules(_)));
    assert_eq!(file.len(), 2);
    assert!(file.is_valid());
}

#[test]
fn render_text_output() {
    let dir = TempDir::new().unwrap();
    let out = render_to_string(&options(&dir, OutputFormat::Pretty, false));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        [
            "[File:config.yml] Error: INVALID SYNTAX",
            "[:composer.json] [composer.json: 2 versions (1.0, 2.0)]",
            "left alone",
        ]
    );
}

#[test]
fn render_json_uses_format_templates() {
    let dir = TempDir::new().unwrap();
    let out = render_to_string(&options(&dir, OutputFormat::Json, true));
    let rendered: serde_json::Value = serde_json::from_str(&out).unwrap();
    let items = rendered.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[1]["breach-type"], "key-values");
    assert_eq!(items[1]["values"][0], r#"{"package":"composer.json","count":2}"#);
    assert_eq!(items[1]["check-name"], "deps-check");
}

#[test]
fn render_reads_facts() {
    let dir = TempDir::new().unwrap();
    let mut opts = options(&dir, OutputFormat::Pretty, false);
    opts.template = write(
        dir.path(),
        "single.yaml",
        "template: '{{ .Breach.Value }} on php {{ lookup \"php\" \"version\" }}'\n",
    );
    opts.facts = Some(write(dir.path(), "facts.json", r#"{"php": {"version": "8.3"}}"#));
    let out = render_to_string(&opts);
    assert!(out.ends_with("left alone on php 8.3\n"), "{out}");
}

#[test]
fn render_rejects_malformed_inputs() {
    let dir = TempDir::new().unwrap();
    let mut opts = options(&dir, OutputFormat::Pretty, false);
    opts.breaches = write(dir.path(), "bad.json", "[{\"breach-type\": \"sideways\"}]");
    let err = run_render(&opts, &mut Vec::new()).unwrap_err();
    assert!(format!("{err:#}").contains("breach 0"), "{err:#}");

    let mut opts = options(&dir, OutputFormat::Pretty, false);
    opts.facts = Some(write(dir.path(), "facts.json", "[1, 2]"));
    assert!(run_render(&opts, &mut Vec::new()).is_err());

    let mut opts = options(&dir, OutputFormat::Pretty, false);
    opts.template = dir.path().join("missing.yaml");
    assert!(run_render(&opts, &mut Vec::new()).is_err());
}

#[test]
fn validate_reports_each_broken_template() {
    let dir = TempDir::new().unwrap();
    let good = write(dir.path(), "good.yaml", &generate_example_templates());
    let mut out = Vec::new();
    assert!(run_validate(&good, &mut out).unwrap());
    assert!(String::from_utf8(out).unwrap().contains("2 template(s) OK"));

    let bad = write(
        dir.path(),
        "bad.yaml",
        "first:\n  value: '{{ .Breach.Value | }}'\nsecond:\n  templates:\n    json: '{{ uppr . }}'\n",
    );
    let mut out = Vec::new();
    assert!(!run_validate(&bad, &mut out).unwrap());
    let report = String::from_utf8(out).unwrap();
    assert!(report.contains("first.value: template: breach:1:"), "{report}");
    assert!(report.contains("second.templates.json:"), "{report}");
    assert_eq!(report.lines().count(), 2);
}

#[test]
fn functions_listing_and_schemas() {
    let mut out = Vec::new();
    run_functions(&mut out).unwrap();
    let listing = String::from_utf8(out).unwrap();
    for name in ["pluralize", "lookup", "regexMatch", "printf"] {
        assert!(listing.contains(name), "missing {name}");
    }

    for kind in [SchemaKind::Template, SchemaKind::Config] {
        let mut out = Vec::new();
        run_schema(kind, &mut out).unwrap();
        let schema: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(schema.get("properties").is_some() || schema.get("anyOf").is_some());
    }
}
