use relative_path::RelativePath;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid workspace root: {0}")]
    InvalidRoot(String),
}

/// Read a document and return its content
pub fn read_file(relative_path: &RelativePath, root: &Path) -> Result<String, IoError> {
    let absolute_path = relative_path.to_path(root);
    if !absolute_path.exists() {
        return Err(IoError::NotFound(absolute_path));
    }
    fs::read_to_string(&absolute_path).map_err(IoError::Io)
}

/// Write content to a document
pub fn write_file(relative_path: &RelativePath, root: &Path, content: &str) -> Result<(), IoError> {
    let absolute_path = relative_path.to_path(root);

    // Create parent directories if they don't exist
    if let Some(parent) = absolute_path.parent() {
        fs::create_dir_all(parent).map_err(IoError::Io)?;
    }

    fs::write(&absolute_path, content).map_err(IoError::Io)
}

pub fn validate_root_dir(path: &Path) -> Result<(), IoError> {
    if !path.exists() || !path.is_dir() {
        return Err(IoError::InvalidRoot(format!(
            "{} is not a directory",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_file, create_test_workspace};

    #[test]
    fn test_validate_root_dir_exists() {
        let root = create_test_workspace();
        assert!(validate_root_dir(root.path()).is_ok());
    }

    #[test]
    fn test_validate_root_dir_not_exists() {
        let result = validate_root_dir(Path::new("/nonexistent/path"));
        assert!(matches!(result, Err(IoError::InvalidRoot(_))));
    }

    #[test]
    fn test_validate_root_dir_rejects_file() {
        let root = create_test_workspace();
        let file = create_test_file(&root, "plain.txt", "not a dir");
        assert!(matches!(validate_root_dir(&file), Err(IoError::InvalidRoot(_))));
    }

    #[test]
    fn test_read_file_success() {
        let root = create_test_workspace();
        create_test_file(&root, "lib.rs", "pub fn answer() -> u8 {\n    42\n}\n");

        let content = read_file(RelativePath::new("lib.rs"), root.path()).unwrap();
        assert_eq!(content, "pub fn answer() -> u8 {\n    42\n}\n");
    }

    #[test]
    fn test_read_file_not_found() {
        let root = create_test_workspace();
        let result = read_file(RelativePath::new("missing.rs"), root.path());
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn test_write_file_creates_parent_directories() {
        let root = create_test_workspace();
        let relative_path = RelativePath::new("src/nested/mod.rs");

        write_file(relative_path, root.path(), "mod nested;").unwrap();

        let written = read_file(relative_path, root.path()).unwrap();
        assert_eq!(written, "mod nested;");
        assert!(root.path().join("src").join("nested").is_dir());
    }

    #[test]
    fn test_write_file_overwrites_existing() {
        let root = create_test_workspace();
        create_test_file(&root, "main.rs", "fn main() {}");

        let relative_path = RelativePath::new("main.rs");
        write_file(relative_path, root.path(), "fn main() { run() }").unwrap();

        let written = read_file(relative_path, root.path()).unwrap();
        assert_eq!(written, "fn main() { run() }");
    }
}
