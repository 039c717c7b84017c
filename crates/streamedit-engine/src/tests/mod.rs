use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary workspace root
pub fn create_test_workspace() -> TempDir {
    tempfile::tempdir().unwrap()
}

/// Create a test document with content
pub fn create_test_file(root: &TempDir, filename: &str, content: &str) -> PathBuf {
    let file_path = root.path().join(filename);
    fs::write(&file_path, content).unwrap();
    file_path
}
