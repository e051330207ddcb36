//! Static registry of object storage providers.
//!
//! A [`Registry`] holds [`Provider`] definitions (label, regions, endpoint
//! template, path-style flag) and resolves endpoint hostnames:
//!
//! ```
//! let registry = objregistry::Registry::new_default().unwrap();
//! let endpoint = registry.get_endpoint("aws", "eu-west-1", "", None).unwrap();
//! assert_eq!(endpoint, "s3.eu-west-1.amazonaws.com");
//! ```

mod builder;
mod error;
mod loader;
mod provider;
mod region;
mod registry;
mod resolver;
mod types;
pub mod util;
pub mod wrapper;

pub use self::{
    builder::RegistryBuilder,
    error::RegistryError,
    loader::{BUNDLED_DOCUMENT, ProviderLoader, parse_document},
    provider::Provider,
    region::Region,
    registry::{ProviderFilter, Registry, RegistrySource},
    resolver::EndpointResolver,
    types::*,
};
