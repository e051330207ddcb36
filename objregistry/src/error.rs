use std::path::PathBuf;

/// Errors returned by registry construction, lookups and endpoint resolution.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum RegistryError {
    /// The registry input was supplied but can not be used (eg: a directory path).
    #[error("invalid registry input: {0}")]
    InvalidInput(String),

    /// An explicitly empty input was supplied (eg: an empty file path).
    #[error("registry input must not be empty")]
    EmptyInput,

    /// A structured provider table was supplied, but contains no providers.
    #[error("provider table must contain at least one provider")]
    EmptyProviderTable,

    /// The provider document could not be parsed.
    #[error("malformed provider document '{source_name}': {message}")]
    MalformedSource {
        source_name: String,
        message: String,
    },

    /// The provider document does not exist.
    #[error("provider document not found: '{}'", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("could not read provider document '{}': {error}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("unknown provider: '{key}'")]
    UnknownProvider { key: String },

    #[error("unknown region '{region}' for provider '{provider}'")]
    UnknownRegion { provider: String, region: String },

    /// The provider endpoint template contains `{account_id}`, but no account id was given.
    #[error("provider '{provider}' requires an account id")]
    MissingAccountId { provider: String },

    /// The provider only works with a caller-supplied endpoint.
    #[error("provider '{provider}' requires a custom endpoint")]
    MissingCustomEndpoint { provider: String },

    #[error("invalid definition for provider '{provider}': {reason}")]
    InvalidProviderDefinition { provider: String, reason: String },
}

impl RegistryError {
    pub(crate) fn invalid_definition(provider: &str, reason: impl Into<String>) -> Self {
        Self::InvalidProviderDefinition {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns `true` if the error was caused by a lookup of an unknown provider or region.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::UnknownProvider { .. } | Self::UnknownRegion { .. }
        )
    }
}
