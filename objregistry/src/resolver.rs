use crate::{Registry, RegistryError};

/// Resolves provider endpoints.
///
/// Implemented by [`Registry`]; see [`crate::wrapper::trace::TracedResolver`]
/// for a logging wrapper.
pub trait EndpointResolver {
    fn provider_exists(&self, provider_key: &str) -> bool;

    /// Resolve the endpoint for a provider.
    ///
    /// * `region`: empty selects the provider's default region
    /// * `account_id`: required if the endpoint template contains `{account_id}`
    /// * `custom_endpoint`: required by providers that have no endpoint of their own
    fn resolve(
        &self,
        provider_key: &str,
        region: &str,
        account_id: &str,
        custom_endpoint: Option<&str>,
    ) -> Result<String, RegistryError>;
}

impl EndpointResolver for Registry {
    fn provider_exists(&self, provider_key: &str) -> bool {
        Registry::provider_exists(self, provider_key)
    }

    fn resolve(
        &self,
        provider_key: &str,
        region: &str,
        account_id: &str,
        custom_endpoint: Option<&str>,
    ) -> Result<String, RegistryError> {
        self.get_endpoint(provider_key, region, account_id, custom_endpoint)
    }
}

impl<R: EndpointResolver + ?Sized> EndpointResolver for &R {
    fn provider_exists(&self, provider_key: &str) -> bool {
        (**self).provider_exists(provider_key)
    }

    fn resolve(
        &self,
        provider_key: &str,
        region: &str,
        account_id: &str,
        custom_endpoint: Option<&str>,
    ) -> Result<String, RegistryError> {
        (**self).resolve(provider_key, region, account_id, custom_endpoint)
    }
}

impl<R: EndpointResolver + ?Sized> EndpointResolver for std::sync::Arc<R> {
    fn provider_exists(&self, provider_key: &str) -> bool {
        (**self).provider_exists(provider_key)
    }

    fn resolve(
        &self,
        provider_key: &str,
        region: &str,
        account_id: &str,
        custom_endpoint: Option<&str>,
    ) -> Result<String, RegistryError> {
        (**self).resolve(provider_key, region, account_id, custom_endpoint)
    }
}
