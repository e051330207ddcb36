use std::{path::PathBuf, sync::Arc};

use anyhow::{Context as _, bail};
use objregistry::{Registry, UrlStyle};
use url::Url;

mod fs;

pub use self::fs::FsConfigStore;

/// A named connection to a bucket at one of the registry providers.
///
/// Optional fields fall back to the provider definition when resolved.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub name: String,
    /// Provider key, eg: `aws`.
    pub provider: String,
    /// Region code. Defaults to the provider's default region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Required by providers whose endpoint contains the account id (eg: Cloudflare R2).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Required by the `custom` provider. Skips region validation for all providers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    /// Overrides the path-style flag of the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_style: Option<bool>,
    /// Use `http` instead of `https` for endpoints without a scheme.
    #[serde(default)]
    pub insecure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ConnectionConfig {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            region: None,
            account_id: None,
            custom_endpoint: None,
            bucket: None,
            path_style: None,
            insecure: false,
            description: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_custom_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.custom_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_path_style(mut self, path_style: bool) -> Self {
        self.path_style = Some(path_style);
        self
    }

    /// Check every field, reporting all problems at once.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        let mut problems = Vec::new();

        if self.name.trim().is_empty() {
            problems.push("name must not be empty".to_string());
        }
        if self.provider.trim().is_empty() {
            problems.push("provider must not be empty".to_string());
        }
        if let Some(region) = &self.region
            && region.trim() != region
        {
            problems.push(format!("region '{region}' must not contain surrounding whitespace"));
        }
        if let Some(endpoint) = &self.custom_endpoint
            && endpoint.trim().is_empty()
        {
            problems.push("custom_endpoint must not be empty if set".to_string());
        }
        if let Some(bucket) = &self.bucket
            && let Err(err) = validate_bucket_name(bucket)
        {
            problems.push(err.to_string());
        }

        if !problems.is_empty() {
            bail!(
                "invalid connection config '{}': {}",
                self.name,
                problems.join("; ")
            );
        }
        Ok(())
    }

    /// Resolve the connection against a provider registry.
    pub fn resolve(&self, registry: &Registry) -> Result<ResolvedConnection, anyhow::Error> {
        self.validate()?;

        let provider = registry.get_provider(&self.provider)?;
        let region = self.region.as_deref().unwrap_or_default();
        let endpoint = registry
            .get_endpoint(
                provider.key(),
                region,
                self.account_id.as_deref().unwrap_or_default(),
                self.custom_endpoint.as_deref(),
            )
            .with_context(|| format!("could not resolve endpoint for connection '{}'", self.name))?;

        let region = if region.is_empty() && !provider.requires_custom_endpoint() {
            provider.default_region().to_string()
        } else {
            region.to_string()
        };

        let base_url = if endpoint.contains("://") {
            Url::parse(&endpoint)
        } else {
            let scheme = if self.insecure { "http" } else { "https" };
            Url::parse(&format!("{scheme}://{endpoint}"))
        }
        .with_context(|| format!("endpoint '{endpoint}' is not a valid URL"))?;

        let url_style = self
            .path_style
            .map(UrlStyle::from_path_style)
            .unwrap_or_else(|| provider.url_style());

        Ok(ResolvedConnection {
            name: self.name.clone(),
            provider: provider.key().to_string(),
            region,
            endpoint,
            url_style,
            base_url,
            bucket: self.bucket.clone(),
        })
    }
}

/// Loose S3 bucket name check: 3-63 characters of `[a-z0-9.-]`,
/// starting and ending with a letter or digit.
fn validate_bucket_name(bucket: &str) -> Result<(), anyhow::Error> {
    if !(3..=63).contains(&bucket.len()) {
        bail!("bucket name '{bucket}' must be between 3 and 63 characters long");
    }
    if !bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-')
    {
        bail!("bucket name '{bucket}' may only contain lowercase letters, digits, '.' and '-'");
    }
    let alnum = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    if !alnum(bucket.chars().next()) || !alnum(bucket.chars().last()) {
        bail!("bucket name '{bucket}' must start and end with a letter or digit");
    }
    Ok(())
}

/// A connection with its endpoint resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedConnection {
    pub name: String,
    pub provider: String,
    /// Effective region (empty for custom endpoints without an explicit region).
    pub region: String,
    pub endpoint: String,
    pub url_style: UrlStyle,
    pub base_url: Url,
    pub bucket: Option<String>,
}

impl ResolvedConnection {
    /// Build the URL of a bucket according to the url style.
    ///
    /// * path style: `https://<endpoint>/<bucket>/`
    /// * virtual host: `https://<bucket>.<endpoint>/`
    pub fn bucket_url(&self, bucket: &str) -> Result<Url, anyhow::Error> {
        validate_bucket_name(bucket)?;

        if self.url_style.is_path() {
            let mut url = self.base_url.clone();
            url.path_segments_mut()
                .map_err(|_| anyhow::anyhow!("url '{}' cannot be a base", self.base_url))?
                .pop_if_empty()
                .push(bucket)
                .push("");
            return Ok(url);
        }

        let host = self
            .base_url
            .host_str()
            .with_context(|| format!("url '{}' has no host", self.base_url))?;
        let mut url = self.base_url.clone();
        url.set_host(Some(&format!("{bucket}.{host}")))
            .with_context(|| format!("invalid bucket host for bucket '{bucket}'"))?;
        Ok(url)
    }

    /// URL of the configured bucket, if any.
    pub fn default_bucket_url(&self) -> Option<Result<Url, anyhow::Error>> {
        self.bucket.as_deref().map(|bucket| self.bucket_url(bucket))
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
}

impl From<PathBuf> for ConfigSource {
    fn from(path: PathBuf) -> Self {
        ConfigSource::File(path)
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LoadedConnection {
    pub source: Option<ConfigSource>,
    pub config: ConnectionConfig,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedConnections {
    pub connections: Vec<LoadedConnection>,
    pub failed: Vec<ConnectionLoadError>,
}

impl LoadedConnections {
    pub fn get(&self, name: &str) -> Option<&LoadedConnection> {
        self.connections.iter().find(|c| c.config.name == name)
    }

    /// Resolve every loaded connection.
    ///
    /// Connections that fail to resolve are returned with their error.
    pub fn resolve_all(
        &self,
        registry: &Registry,
    ) -> (Vec<ResolvedConnection>, Vec<(String, anyhow::Error)>) {
        let mut resolved = Vec::new();
        let mut failed = Vec::new();
        for con in &self.connections {
            match con.config.resolve(registry) {
                Ok(r) => resolved.push(r),
                Err(err) => failed.push((con.config.name.clone(), err)),
            }
        }
        (resolved, failed)
    }

    pub fn new_one_loaded(source: impl Into<ConfigSource>, config: ConnectionConfig) -> Self {
        Self {
            connections: vec![LoadedConnection {
                source: Some(source.into()),
                config,
            }],
            failed: Vec::new(),
        }
    }

    pub fn new_one_failed(
        source: impl Into<ConfigSource>,
        error: String,
        index: Option<usize>,
    ) -> Self {
        Self {
            connections: Vec::new(),
            failed: vec![ConnectionLoadError {
                source: source.into(),
                error,
                index,
            }],
        }
    }

    fn extend(&mut self, other: Self) {
        self.connections.extend(other.connections);
        self.failed.extend(other.failed);
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionLoadError {
    pub source: ConfigSource,
    pub error: String,
    pub index: Option<usize>,
}

pub trait ConfigStore {
    fn load_connections(&self) -> Result<LoadedConnections, anyhow::Error>;

    fn save_connection(
        &self,
        connection: ConnectionConfig,
        source: Option<ConfigSource>,
    ) -> Result<LoadedConnection, anyhow::Error>;
}

pub type DynConfigStore = Arc<dyn ConfigStore + Send + Sync>;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn registry() -> Registry {
        Registry::new_default().unwrap()
    }

    #[test]
    fn test_resolve_defaults() {
        let con = ConnectionConfig::new("backups", "linode").with_bucket("my-backups");
        let resolved = con.resolve(&registry()).unwrap();

        assert_eq!(resolved.provider, "linode");
        assert_eq!(resolved.region, "us-east-1");
        assert_eq!(resolved.endpoint, "us-east-1.linodeobjects.com");
        assert_eq!(resolved.url_style, UrlStyle::VirtualHost);
        assert_eq!(resolved.base_url.as_str(), "https://us-east-1.linodeobjects.com/");
        assert_eq!(
            resolved.default_bucket_url().unwrap().unwrap().as_str(),
            "https://my-backups.us-east-1.linodeobjects.com/"
        );
    }

    #[test]
    fn test_resolve_path_style() {
        let con = ConnectionConfig::new("r2", "cloudflare")
            .with_region("auto")
            .with_account_id("abc123");
        let resolved = con.resolve(&registry()).unwrap();

        assert_eq!(resolved.endpoint, "abc123.r2.cloudflarestorage.com");
        assert_eq!(resolved.region, "auto");
        assert_eq!(resolved.url_style, UrlStyle::Path);
        assert_eq!(
            resolved.bucket_url("media").unwrap().as_str(),
            "https://abc123.r2.cloudflarestorage.com/media/"
        );
    }

    #[test]
    fn test_resolve_custom_endpoint() {
        let mut con = ConnectionConfig::new("minio", "custom")
            .with_custom_endpoint("http://localhost:9000")
            .with_path_style(true);
        con.insecure = true;
        let resolved = con.resolve(&registry()).unwrap();

        assert_eq!(resolved.region, "");
        assert_eq!(resolved.base_url.as_str(), "http://localhost:9000/");
        assert_eq!(
            resolved.bucket_url("data").unwrap().as_str(),
            "http://localhost:9000/data/"
        );
    }

    #[test]
    fn test_resolve_errors() {
        let err = ConnectionConfig::new("x", "nope")
            .resolve(&registry())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<objregistry::RegistryError>(),
            Some(objregistry::RegistryError::UnknownProvider { .. })
        ));

        let err = ConnectionConfig::new("x", "cloudflare")
            .resolve(&registry())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<objregistry::RegistryError>(),
            Some(objregistry::RegistryError::MissingAccountId { .. })
        ));
    }

    #[test]
    fn test_validate_reports_all_problems() {
        let con = ConnectionConfig::new(" ", "").with_bucket("A");
        let err = con.validate().unwrap_err().to_string();
        assert!(err.contains("name must not be empty"), "{err}");
        assert!(err.contains("provider must not be empty"), "{err}");
        assert!(err.contains("between 3 and 63"), "{err}");
    }

    #[test]
    fn test_bucket_names() {
        assert!(validate_bucket_name("my-bucket.1").is_ok());
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name("My-Bucket").is_err());
        assert!(validate_bucket_name("-bucket").is_err());
        assert!(validate_bucket_name("bucket-").is_err());
    }

    #[test]
    fn test_config_serde_defaults() {
        let con: ConnectionConfig =
            serde_json::from_str(r#"{"name": "a", "provider": "aws"}"#).unwrap();
        assert_eq!(con, ConnectionConfig::new("a", "aws"));
    }
}
