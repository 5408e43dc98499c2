use thiserror::Error;

pub type CdnResult<T> = Result<T, CdnError>;

/// Failure kinds surfaced by every cdnpack operation.
///
/// Messages are meant for end users: short, no internal paths beyond what the
/// caller already supplied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CdnError {
    #[error("registry unavailable: {reason}")]
    RegistryUnavailable { reason: String },

    #[error("package not found: {name}")]
    NotFound { name: String },

    #[error("failed to install package: {name}@{version} (version not found)")]
    VersionNotFound { name: String, version: String },

    #[error("failed to install package: {name}@{version} ({reason})")]
    InstallFailed {
        name: String,
        version: String,
        reason: String,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("local package state unavailable: {reason}")]
    Storage { reason: String },
}

impl CdnError {
    pub fn registry_unavailable(reason: impl Into<String>) -> Self {
        Self::RegistryUnavailable {
            reason: reason.into(),
        }
    }

    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Stable tag used in serialized error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RegistryUnavailable { .. } => "registry_unavailable",
            Self::NotFound { .. } => "not_found",
            Self::VersionNotFound { .. } => "version_not_found",
            Self::InstallFailed { .. } => "install_failed",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Storage { .. } => "storage",
        }
    }
}

impl From<anyhow::Error> for CdnError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage {
            reason: format!("{err:#}"),
        }
    }
}
