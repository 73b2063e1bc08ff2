#![cfg(unix)]

mod common;

use std::{fs, path::Path, process};

use tempfile::tempdir;

fn testgen(config: &Path, args: &[&str]) -> process::Output {
    process::Command::new(env!("CARGO_BIN_EXE_testgen"))
        .arg("--config")
        .arg(config)
        .arg("--silent")
        .args(args)
        .output()
        .unwrap()
}

fn write_config(dir: &Path) -> std::path::PathBuf {
    let testdata = common::testdata();
    let path = dir.join("testgen.yml");

    fs::write(
        &path,
        format!(
            "goroot: {}\ngopath: [{}]\ngoimports: cat\noutput_root: {}\n",
            testdata.join("goroot").display(),
            testdata.join("gopath").display(),
            dir.join("out").display(),
        ),
    )
    .unwrap();

    path
}

#[test]
fn prints_stub() {
    let dir = tempdir().unwrap();
    let output = testgen(&write_config(dir.path()), &["FakeB", "example.com/store.B"]);
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.starts_with("// Code generated by testgen; DO NOT EDIT."));
    assert!(stdout.contains("type FakeB struct {"));
}

#[test]
fn writes_stub() {
    let dir = tempdir().unwrap();
    let output = testgen(
        &write_config(dir.path()),
        &["FakeB", "example.com/store.B", "example.com/fakes/b.go"],
    );
    let path = dir.path().join("out/example.com/fakes/b.go");

    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        format!("generated file: {}\n", path.display())
    );
    assert!(fs::read_to_string(path).unwrap().contains("package fakes\n"));
}

#[test]
fn exit_codes() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());

    assert_eq!(testgen(&config, &["OnlyRecv"]).status.code(), Some(2));
    assert_eq!(testgen(&config, &["Recv", "net/http/"]).status.code(), Some(1));
    assert_eq!(
        testgen(&config, &["Recv", "example.com/store.Widget"]).status.code(),
        Some(1)
    );
}
