use std::{
    borrow::Cow,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use sha2::Digest as _;

use crate::{ProviderDocument, RegistryError};

/// The provider document shipped with this crate.
pub const BUNDLED_DOCUMENT: &str = include_str!("../data/providers.json");

const BUNDLED_SOURCE_NAME: &str = "<bundled>";

#[derive(Clone, Debug, PartialEq, Eq)]
enum LoaderSource {
    Bundled,
    File(PathBuf),
}

/// Reads and parses a provider document.
///
/// The SHA-256 checksum of the source is computed once per loader instance.
#[derive(Debug)]
pub struct ProviderLoader {
    source: LoaderSource,
    checksum: OnceLock<String>,
}

impl ProviderLoader {
    /// Loader for the document bundled with the crate.
    pub fn bundled() -> Self {
        Self {
            source: LoaderSource::Bundled,
            checksum: OnceLock::new(),
        }
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            source: LoaderSource::File(path.into()),
            checksum: OnceLock::new(),
        }
    }

    /// Loader for the given path, or for the bundled document if `None`.
    pub fn new(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::bundled(),
        }
    }

    /// The file path, or `None` for the bundled document.
    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            LoaderSource::Bundled => None,
            LoaderSource::File(path) => Some(path),
        }
    }

    fn source_name(&self) -> Cow<'_, str> {
        match &self.source {
            LoaderSource::Bundled => Cow::Borrowed(BUNDLED_SOURCE_NAME),
            LoaderSource::File(path) => path.to_string_lossy(),
        }
    }

    fn read(&self) -> Result<Cow<'static, str>, RegistryError> {
        let path = match &self.source {
            LoaderSource::Bundled => return Ok(Cow::Borrowed(BUNDLED_DOCUMENT)),
            LoaderSource::File(path) => path,
        };

        if path.as_os_str().is_empty() {
            return Err(RegistryError::EmptyInput);
        }
        if !path.exists() {
            return Err(RegistryError::SourceNotFound { path: path.clone() });
        }
        if !path.is_file() {
            return Err(RegistryError::InvalidInput(format!(
                "'{}' is not a file",
                path.display()
            )));
        }

        std::fs::read_to_string(path)
            .map(Cow::Owned)
            .map_err(|error| RegistryError::Io {
                path: path.clone(),
                error,
            })
    }

    /// Read and parse the document.
    pub fn load(&self) -> Result<ProviderDocument, RegistryError> {
        let contents = self.read()?;
        parse_document(&self.source_name(), &contents)
    }

    /// Hex-encoded SHA-256 checksum of the source document.
    pub fn checksum(&self) -> Result<&str, RegistryError> {
        if let Some(checksum) = self.checksum.get() {
            return Ok(checksum);
        }

        let contents = self.read()?;
        let checksum = format!("{:x}", sha2::Sha256::digest(contents.as_bytes()));
        Ok(self.checksum.get_or_init(|| checksum))
    }
}

/// Parse a provider document from JSON.
///
/// Errors contain the path to the offending value, eg: `providers.aws.usePathStyle`.
pub fn parse_document(source_name: &str, contents: &str) -> Result<ProviderDocument, RegistryError> {
    let malformed = |message: String| RegistryError::MalformedSource {
        source_name: source_name.to_string(),
        message,
    };

    let mut de = serde_json::Deserializer::from_str(contents);
    let document: ProviderDocument = serde_path_to_error::deserialize(&mut de).map_err(|err| {
        let path = err.path().to_string();
        malformed(format!("{} (at '{}')", err.into_inner(), path))
    })?;
    de.end().map_err(|err| malformed(err.to_string()))?;

    Ok(document)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_load_bundled() {
        let doc = ProviderLoader::bundled().load().unwrap();
        assert!(!doc.version.is_empty());
        assert!(doc.providers.contains_key("aws"));
        assert!(doc.providers.contains_key("custom"));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.json");
        std::fs::write(&path, BUNDLED_DOCUMENT).unwrap();

        let loader = ProviderLoader::from_path(&path);
        assert_eq!(loader.path(), Some(path.as_path()));
        assert_eq!(loader.load().unwrap(), ProviderLoader::bundled().load().unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");

        let loader = ProviderLoader::from_path(&path);
        assert!(matches!(
            loader.load().unwrap_err(),
            RegistryError::SourceNotFound { .. }
        ));
        assert!(matches!(
            loader.checksum().unwrap_err(),
            RegistryError::SourceNotFound { .. }
        ));
    }

    #[test]
    fn test_load_directory_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProviderLoader::from_path(dir.path()).load().unwrap_err();
        assert!(matches!(err, RegistryError::InvalidInput(_)));
    }

    #[test]
    fn test_load_empty_path() {
        let err = ProviderLoader::from_path("").load().unwrap_err();
        assert!(matches!(err, RegistryError::EmptyInput));
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_document("test", "{ not json").unwrap_err();
        assert!(matches!(err, RegistryError::MalformedSource { .. }));

        // Missing top-level "providers".
        let err = parse_document("test", r#"{"version": "1"}"#).unwrap_err();
        assert!(matches!(err, RegistryError::MalformedSource { .. }));

        let err = parse_document(
            "test",
            r#"{"version": "1", "providers": {"aws": {"usePathStyle": "yes"}}}"#,
        )
        .unwrap_err();
        match err {
            RegistryError::MalformedSource { message, .. } => {
                assert!(message.contains("providers.aws.usePathStyle"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = parse_document("test", r#"{"version": "1", "providers": {}} trailing"#)
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedSource { .. }));
    }

    #[test]
    fn test_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("providers.json");
        std::fs::write(&path, "hello").unwrap();

        let loader = ProviderLoader::from_path(&path);
        let expected = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
        assert_eq!(loader.checksum().unwrap(), expected);

        // Memoized per instance: changes to the file are not picked up.
        std::fs::write(&path, "changed").unwrap();
        assert_eq!(loader.checksum().unwrap(), expected);
        assert_ne!(
            ProviderLoader::from_path(&path).checksum().unwrap(),
            expected
        );
    }

    #[test]
    fn test_bundled_checksum() {
        let checksum = ProviderLoader::bundled().checksum().unwrap().to_string();
        assert_eq!(checksum.len(), 64);
        assert_eq!(ProviderLoader::new(None).checksum().unwrap(), checksum);
    }
}
