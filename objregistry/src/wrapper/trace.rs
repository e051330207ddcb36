use crate::{EndpointResolver, RegistryError};

/// Wrapper for an endpoint resolver that logs resolutions with the `tracing` crate.
///
/// * Successful resolutions are logged at the `DEBUG` level
/// * Lookups of unknown providers or regions are logged at the `WARN` level
/// * Other failures (missing account id or custom endpoint) are logged at the `ERROR` level
#[derive(Debug)]
pub struct TracedResolver<R> {
    name: String,
    inner: R,
}

impl<R> TracedResolver<R> {
    /// Creates a new `TracedResolver` with the given name and inner resolver.
    ///
    /// All logs will contain the name.
    pub fn new(name: impl Into<String>, inner: R) -> Self {
        Self {
            name: name.into(),
            inner,
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> EndpointResolver for TracedResolver<R>
where
    R: EndpointResolver,
{
    fn provider_exists(&self, provider_key: &str) -> bool {
        let exists = self.inner.provider_exists(provider_key);
        tracing::trace!(resolver = &self.name, provider_key, exists, "provider_exists");
        exists
    }

    fn resolve(
        &self,
        provider_key: &str,
        region: &str,
        account_id: &str,
        custom_endpoint: Option<&str>,
    ) -> Result<String, RegistryError> {
        match self
            .inner
            .resolve(provider_key, region, account_id, custom_endpoint)
        {
            Ok(endpoint) => {
                tracing::debug!(
                    resolver = &self.name,
                    provider_key,
                    region,
                    custom = custom_endpoint.is_some(),
                    endpoint = %endpoint,
                    "resolve::ok"
                );
                Ok(endpoint)
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(resolver = &self.name, provider_key, region, error = %e, "resolve::not_found");
                Err(e)
            }
            Err(e) => {
                tracing::error!(resolver = &self.name, provider_key, region, error = %e, "resolve::failed");
                Err(e)
            }
        }
    }
}
