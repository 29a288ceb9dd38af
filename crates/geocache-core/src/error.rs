use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode {what}: {source}")]
    Encode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not find cache directory")]
    NoCacheDir,
}

impl CacheError {
    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn encode(what: impl Into<String>, source: serde_json::Error) -> Self {
        CacheError::Encode {
            what: what.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_displays_path() {
        let err = CacheError::io(
            "/tmp/catalogue/contexts/us.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("us.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_no_cache_dir_message() {
        assert_eq!(CacheError::NoCacheDir.to_string(), "Could not find cache directory");
    }

    #[test]
    fn test_encode_error_displays_subject() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = CacheError::encode("context us", source);
        assert!(err.to_string().contains("context us"));
    }
}
