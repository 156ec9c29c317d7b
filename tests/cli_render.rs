//! Behavioural tests for `albharness render` and `albharness template`.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    TempDir::new().unwrap_or_else(|err| panic!("create temp dir: {err}"))
}

fn write_fixture(dir: &TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap_or_else(|err| panic!("write {name}: {err}"));
    path.to_string_lossy().into_owned()
}

fn render_stdout(args: &[&str]) -> String {
    let output = cargo_bin_cmd!("albharness")
        .args(args)
        .output()
        .unwrap_or_else(|err| panic!("run albharness: {err}"));
    assert!(output.status.success(), "render failed: {output:?}");
    String::from_utf8(output.stdout).unwrap_or_else(|err| panic!("stdout utf8: {err}"))
}

#[test]
fn render_backend_group_emits_only_enabled_backends() {
    let mut cmd = cargo_bin_cmd!("albharness");
    cmd.args(["render", "backend-group", "--seed", "1", "--http", "--http-check"]);
    cmd.assert()
        .success()
        .stdout(contains("resource \"yandex_alb_backend_group\" \"test-bg\""))
        .stdout(contains("http_backend"))
        .stdout(contains("http_healthcheck"))
        .stdout(contains("grpc_backend").not())
        .stdout(contains("\"tf-bg-"));
}

#[test]
fn render_backend_group_without_backends_has_no_target_group() {
    let mut cmd = cargo_bin_cmd!("albharness");
    cmd.args(["render", "backend-group", "--seed", "1"]);
    cmd.assert()
        .success()
        .stdout(contains("test-target-group").not());
}

#[test]
fn seeded_renders_are_identical() {
    let args = ["render", "target-group", "--seed", "17", "--targets", "3"];
    let first = render_stdout(&args);
    let second = render_stdout(&args);
    assert_eq!(first, second);
    assert!(first.contains("yandex_compute_instance\" \"test-instance-3\""));
}

#[test]
fn template_renders_fixture_file() {
    let dir = temp_dir();
    let template = write_fixture(
        &dir,
        "tg.tf.tmpl",
        "resource \"yandex_alb_target_group\" \"test-tg\" {\n  name = \"{{.TGName}}\"\n{{range .Targets}}  {{.}}\n{{end}}}\n",
    );
    let fixtures = write_fixture(
        &dir,
        "fixtures.json",
        r#"{"TGName": {"random_with_prefix": "tf-tg"}, "Targets": ["target-a", "target-b"]}"#,
    );

    let mut cmd = cargo_bin_cmd!("albharness");
    cmd.args(["template", template.as_str(), "--fixtures", fixtures.as_str()]);
    cmd.assert()
        .success()
        .stdout(contains("name = \"tf-tg-"))
        .stdout(contains("  target-a\n  target-b\n"));
}

#[test]
fn template_with_defaults_resolves_fixture_keys() {
    let dir = temp_dir();
    let template = write_fixture(&dir, "bg.tmpl", "interval = \"{{.Interval}}\"\nport = {{.Port}}\n");

    let mut cmd = cargo_bin_cmd!("albharness");
    cmd.args(["template", template.as_str(), "--defaults"]);
    cmd.assert()
        .success()
        .stdout("interval = \"560s\"\nport = 3\n");
}

#[test]
fn template_missing_key_fails_without_output() {
    let dir = temp_dir();
    let template = write_fixture(&dir, "bg.tmpl", "name = \"{{.BGName}}\"\n");

    let mut cmd = cargo_bin_cmd!("albharness");
    cmd.args(["template", template.as_str()]);
    cmd.assert()
        .failure()
        .code(1)
        .stdout("")
        .stderr(contains("missing fixture key `BGName`"));
}
