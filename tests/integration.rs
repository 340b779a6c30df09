use predicates::prelude::*;
use std::{fs, path::Path};

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn stencil() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("stencil").unwrap()
}

#[test]
fn render_file() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "{{name}}.txt", "Hello, {{name}}!");
    write(dir.path(), "vars.json", r#"{"name": "World"}"#);

    let mut cmd = stencil();

    cmd.arg("file")
        .arg(dir.path().join("{{name}}.txt"))
        .arg(dir.path().join("out/{{name}}.txt"))
        .arg(dir.path().join("vars.json"))
        .arg("--transformFilePath");

    cmd.assert().success().stdout(predicate::str::contains("World.txt"));

    assert_eq!(
        fs::read_to_string(dir.path().join("out/World.txt")).unwrap(),
        "Hello, World!"
    );
}

#[test]
fn render_directory() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template");
    write(&template, "a/{{x}}.txt", "v={{x}}");
    write(&template, "a/skip.txt", "skip");
    write(dir.path(), "vars.json", r#"{"x": "1"}"#);
    write(dir.path(), ".templateignore", "a/skip.txt\n");

    let mut cmd = stencil();

    cmd.arg("dir")
        .arg(&template)
        .arg(dir.path().join("output"))
        .arg(dir.path().join("vars.json"))
        .arg("--gitignore")
        .arg(dir.path().join(".templateignore"))
        .arg("--transform-file-path");

    cmd.assert().success();

    assert_eq!(
        fs::read_to_string(dir.path().join("output/a/1.txt")).unwrap(),
        "v=1"
    );
    assert!(!dir.path().join("output/a/skip.txt").exists());
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("template");
    write(&template, "{{x}}.txt", "{{x}}");
    write(dir.path(), "vars.json", r#"{"x": "rendered"}"#);

    let mut cmd = stencil();

    cmd.arg("dir")
        .arg(&template)
        .arg(dir.path().join("output"))
        .arg(dir.path().join("vars.json"))
        .arg("--transform-file-path")
        .arg("--dry-run");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("rendered.txt"));

    assert!(!dir.path().join("output").exists());
}

#[test]
fn missing_template_fails() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "vars.json", "{}");

    let mut cmd = stencil();

    cmd.arg("file")
        .arg(dir.path().join("missing.txt"))
        .arg(dir.path().join("out.txt"))
        .arg(dir.path().join("vars.json"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing.txt"));

    assert!(!dir.path().join("out.txt").exists());
}

#[test]
fn malformed_variables_fail() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "t.txt", "{{x}}");
    write(dir.path(), "vars.json", "not json");

    let mut cmd = stencil();

    cmd.arg("file")
        .arg(dir.path().join("t.txt"))
        .arg(dir.path().join("out.txt"))
        .arg(dir.path().join("vars.json"));

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Variables unavailable"));
}
