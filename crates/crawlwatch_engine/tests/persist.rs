use std::fs;

use crawlwatch_engine::{ensure_state_dir, AtomicFileWriter};
use tempfile::TempDir;

#[test]
fn creates_missing_state_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("state");
    assert!(!new_dir.exists());
    ensure_state_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn atomic_write_replaces_existing_file() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    let first = writer.write("session.ron", "(api_key: \"a\")").unwrap();
    assert_eq!(first.file_name().unwrap(), "session.ron");

    let second = writer.write("session.ron", "(api_key: \"b\")").unwrap();
    assert_eq!(first, second);
    assert_eq!(fs::read_to_string(&second).unwrap(), "(api_key: \"b\")");
    // Only the target remains; the temp file was renamed over it.
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn missing_file_reads_as_none_and_removes_cleanly() {
    let temp = TempDir::new().unwrap();
    let writer = AtomicFileWriter::new(temp.path().to_path_buf());

    assert_eq!(writer.read("absent.ron").unwrap(), None);
    writer.remove("absent.ron").unwrap();

    writer.write("present.ron", "x").unwrap();
    assert_eq!(writer.read("present.ron").unwrap().as_deref(), Some("x"));
    writer.remove("present.ron").unwrap();
    assert!(!writer.path_of("present.ron").exists());
}

#[test]
fn state_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();

    let writer = AtomicFileWriter::new(file_path.clone());
    assert!(writer.write("session.ron", "data").is_err());
    assert!(!file_path.with_file_name("session.ron").exists());
}
