use std::path::{Path, PathBuf};

use plugcheck_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no plugin manifest found under {}", root.display())]
    ManifestNotFound { root: PathBuf },

    #[error("invalid plugin manifest at {}: {reason}", path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),

    /// Read failures with context, built through [`Context`].
    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn manifest_not_found(root: &Path) -> Self {
        Self::ManifestNotFound {
            root: root.to_path_buf(),
        }
    }

    #[must_use]
    pub fn invalid_manifest(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidManifest {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message { message }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

plugcheck_common::impl_context!();

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_failures_carry_context() {
        let failed: std::io::Result<String> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = failed
            .with_context(|| format!("failed to read {}", "plugin.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Message { .. }));
        assert_eq!(err.to_string(), "failed to read plugin.json: denied");
    }

    #[test]
    fn structural_errors_name_the_path() {
        let err = Error::invalid_manifest(Path::new("p/plugin.json"), "expected value");
        assert_eq!(
            err.to_string(),
            "invalid plugin manifest at p/plugin.json: expected value"
        );
        let err = Error::manifest_not_found(Path::new("p"));
        assert_eq!(err.to_string(), "no plugin manifest found under p");
    }
}
