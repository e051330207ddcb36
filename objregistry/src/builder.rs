use crate::{ProviderFilter, RawProviderTable, Registry, RegistryError, RegistrySource};

/// Configures the construction of a [`Registry`].
///
/// ```
/// use objregistry::Registry;
///
/// let registry = Registry::builder()
///     .with_context("admin")
///     .with_filter(|mut table, _context| {
///         table.retain(|key, _| key != "custom");
///         table
///     })
///     .build()
///     .unwrap();
/// assert!(!registry.provider_exists("custom"));
/// ```
pub struct RegistryBuilder {
    source: RegistrySource,
    context: String,
    filter: Option<ProviderFilter>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("source", &self.source)
            .field("context", &self.context)
            .field("filter", &self.filter.is_some())
            .finish()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            source: RegistrySource::Default,
            context: String::new(),
            filter: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<RegistrySource>) -> Self {
        self.source = source.into();
        self
    }

    /// Free-form context passed to the filter, eg: the name of the calling component.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Rewrite the raw provider table before it is parsed.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(RawProviderTable, &str) -> RawProviderTable + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    pub fn build(self) -> Result<Registry, RegistryError> {
        Registry::build(self.source, &self.context, self.filter.as_ref())
    }
}
