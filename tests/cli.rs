//! Integration tests for the rossby binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const HDF5_MAGIC: [u8; 8] = [137, 72, 68, 70, 13, 10, 26, 10];

fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(bytes).unwrap();
    path
}

#[test]
fn classifies_hdf4_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "a.hdf", &[14, 3, 19, 1, 0, 0, 0, 0, 0, 0, 0, 0]);

    Command::cargo_bin("rossby")
        .unwrap()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("hdf4"));
}

#[test]
fn classifies_hdf5_files_behind_a_user_block() {
    let dir = tempfile::tempdir().unwrap();
    let mut bytes = vec![0u8; 600];
    bytes[512..520].copy_from_slice(&HDF5_MAGIC);
    let path = write_file(&dir, "b.h5", &bytes);

    Command::cargo_bin("rossby")
        .unwrap()
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("hdf5"));
}

#[test]
fn unrecognized_files_exit_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "noise.bin", &[1, 2, 3, 4, 5, 6, 7, 8, 9]);

    Command::cargo_bin("rossby")
        .unwrap()
        .arg(&path)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("unknown"));
}

#[test]
fn missing_files_are_an_error() {
    Command::cargo_bin("rossby")
        .unwrap()
        .arg("/definitely/not/here.h5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Path not found"));
}
