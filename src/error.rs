use std::path::{Path, PathBuf};

use thiserror::Error;

/// Unified error type for mobile-bump operations
#[derive(Error, Debug)]
pub enum BumpError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Field '{field}' not found in {}", .path.display())]
    FieldNotFound { field: String, path: PathBuf },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Git command failed: {0}")]
    GitCommand(String),

    #[error("Tag '{0}' already exists")]
    TagExists(String),

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in mobile-bump
pub type Result<T> = std::result::Result<T, BumpError>;

impl BumpError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        BumpError::Config(msg.into())
    }

    /// Create a parse error for a file
    pub fn parse(path: impl AsRef<Path>, msg: impl Into<String>) -> Self {
        BumpError::Parse {
            path: path.as_ref().to_path_buf(),
            message: msg.into(),
        }
    }

    /// Create a missing-field error for a file
    pub fn field_not_found(field: impl Into<String>, path: impl AsRef<Path>) -> Self {
        BumpError::FieldNotFound {
            field: field.into(),
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a git command error with context
    pub fn git_command(msg: impl Into<String>) -> Self {
        BumpError::GitCommand(msg.into())
    }

    /// Whether this error means the file simply isn't there.
    pub fn is_not_found(&self) -> bool {
        match self {
            BumpError::NotFound(_) => true,
            BumpError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BumpError::config("test config issue");
        assert_eq!(err.to_string(), "Configuration error: test config issue");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BumpError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_field_not_found_names_field_and_path() {
        let err = BumpError::field_not_found("versionName", "android/app/build.gradle");
        let msg = err.to_string();
        assert!(msg.contains("versionName"));
        assert!(msg.contains("android/app/build.gradle"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_parse_error_display() {
        let err = BumpError::parse("package.json", "expected value at line 1");
        assert_eq!(
            err.to_string(),
            "Failed to parse package.json: expected value at line 1"
        );
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (BumpError::config("x"), "Configuration error"),
            (BumpError::git_command("x"), "Git command failed"),
            (BumpError::TagExists("v1.0.0".into()), "Tag 'v1.0.0'"),
            (BumpError::NotFound(PathBuf::from("a")), "File not found"),
            (BumpError::UserCancelled, "Operation cancelled"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
