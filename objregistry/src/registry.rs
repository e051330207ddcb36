use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::{
    OptionEntry, Provider, ProviderLoader, RawProviderTable, Region, RegionOptions, RegistryBuilder,
    RegistryError, util::sanitize_key,
};

/// Where a [`Registry`] gets its provider records from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RegistrySource {
    /// The document bundled with the crate.
    #[default]
    Default,
    /// A JSON provider document on disk.
    File(PathBuf),
    /// An in-memory provider table.
    Table(RawProviderTable),
}

impl From<PathBuf> for RegistrySource {
    fn from(path: PathBuf) -> Self {
        Self::File(path)
    }
}

impl From<&Path> for RegistrySource {
    fn from(path: &Path) -> Self {
        Self::File(path.to_owned())
    }
}

impl From<RawProviderTable> for RegistrySource {
    fn from(table: RawProviderTable) -> Self {
        Self::Table(table)
    }
}

/// Transformation applied to the raw provider table before it is parsed.
///
/// Receives the table and the free-form context string of the registry.
pub type ProviderFilter = Box<dyn Fn(RawProviderTable, &str) -> RawProviderTable + Send + Sync>;

/// Immutable collection of providers, sorted by key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registry {
    providers: BTreeMap<String, Provider>,
    version: Option<String>,
}

impl Registry {
    /// Build a registry from the given source, without a filter.
    ///
    /// Use [`Registry::builder`] for filters and contexts.
    pub fn new(source: impl Into<RegistrySource>) -> Result<Self, RegistryError> {
        Self::builder().with_source(source).build()
    }

    /// Build a registry from the bundled provider document.
    pub fn new_default() -> Result<Self, RegistryError> {
        Self::new(RegistrySource::Default)
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        Self::new(RegistrySource::File(path.into()))
    }

    pub fn from_table(table: RawProviderTable) -> Result<Self, RegistryError> {
        Self::new(RegistrySource::Table(table))
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub(crate) fn build(
        source: RegistrySource,
        context: &str,
        filter: Option<&ProviderFilter>,
    ) -> Result<Self, RegistryError> {
        let (table, version) = match source {
            RegistrySource::Default => {
                let doc = ProviderLoader::bundled().load()?;
                (doc.providers, Some(doc.version))
            }
            RegistrySource::File(path) => {
                if path.as_os_str().is_empty() {
                    return Err(RegistryError::EmptyInput);
                }
                let doc = ProviderLoader::from_path(path).load()?;
                (doc.providers, Some(doc.version))
            }
            RegistrySource::Table(table) => {
                if table.is_empty() {
                    return Err(RegistryError::EmptyProviderTable);
                }
                (table, None)
            }
        };

        let table = match filter {
            Some(filter) => filter(table, context),
            None => table,
        };
        if table.is_empty() {
            return Err(RegistryError::EmptyProviderTable);
        }

        let mut providers = BTreeMap::new();
        for (key, raw) in table {
            let provider = Provider::new(&key, raw)?;
            providers.insert(provider.key().to_string(), provider);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            providers = providers.len(),
            version = version.as_deref(),
            context,
            "registry::loaded"
        );

        Ok(Self { providers, version })
    }

    /// Version of the provider document, or `None` if built from a table.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn get_providers(&self) -> &BTreeMap<String, Provider> {
        &self.providers
    }

    pub fn get_provider(&self, key: &str) -> Result<&Provider, RegistryError> {
        self.providers
            .get(&sanitize_key(key))
            .ok_or_else(|| RegistryError::UnknownProvider {
                key: key.to_string(),
            })
    }

    pub fn provider_exists(&self, key: &str) -> bool {
        self.providers.contains_key(&sanitize_key(key))
    }

    /// The lexicographically smallest provider key.
    pub fn first_provider_key(&self) -> Option<&str> {
        self.providers.keys().next().map(String::as_str)
    }

    /// `(key, label)` entries for all providers, sorted by key.
    ///
    /// If `empty_label` is given, an entry with an empty key is prepended.
    pub fn provider_options(&self, empty_label: Option<&str>) -> Vec<OptionEntry> {
        empty_label
            .map(|label| (String::new(), label.to_string()))
            .into_iter()
            .chain(
                self.providers
                    .values()
                    .map(|p| (p.key().to_string(), p.label().to_string())),
            )
            .collect()
    }

    pub fn get_regions(&self, provider_key: &str) -> Result<&[Region], RegistryError> {
        Ok(self.get_provider(provider_key)?.regions())
    }

    pub fn get_region(&self, provider_key: &str, code: &str) -> Result<&Region, RegistryError> {
        let provider = self.get_provider(provider_key)?;
        provider
            .region(code)
            .ok_or_else(|| RegistryError::UnknownRegion {
                provider: provider.key().to_string(),
                region: code.to_string(),
            })
    }

    /// Returns `false` for unknown providers.
    pub fn region_exists(&self, provider_key: &str, code: &str) -> bool {
        self.get_provider(provider_key)
            .is_ok_and(|provider| provider.region_exists(code))
    }

    pub fn region_options(
        &self,
        provider_key: &str,
        empty_label: Option<&str>,
        group_by_continent: bool,
    ) -> Result<RegionOptions, RegistryError> {
        Ok(self
            .get_provider(provider_key)?
            .region_options(empty_label, group_by_continent))
    }

    pub fn default_region(&self, provider_key: &str) -> Result<&str, RegistryError> {
        Ok(self.get_provider(provider_key)?.default_region())
    }

    /// Resolve the endpoint for a provider.
    ///
    /// See [`Provider::resolve_endpoint`].
    pub fn get_endpoint(
        &self,
        provider_key: &str,
        region: &str,
        account_id: &str,
        custom_endpoint: Option<&str>,
    ) -> Result<String, RegistryError> {
        self.get_provider(provider_key)?
            .resolve_endpoint(region, account_id, custom_endpoint)
    }

    /// Hex-encoded SHA-256 checksum of a provider document.
    ///
    /// Uses the bundled document if `path` is `None`.
    pub fn checksum(path: Option<&Path>) -> Result<String, RegistryError> {
        ProviderLoader::new(path).checksum().map(ToOwned::to_owned)
    }

    /// Export all providers as a raw table.
    ///
    /// Building a new registry from the table yields identical providers.
    pub fn to_table(&self) -> RawProviderTable {
        self.providers
            .iter()
            .map(|(key, provider)| (key.clone(), provider.to_raw()))
            .collect()
    }
}
