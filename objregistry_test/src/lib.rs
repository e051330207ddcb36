//! Test helpers for provider registries.
//!
//! Checks the endpoint resolution rules against every provider of a registry,
//! so that the bundled document, custom documents and in-memory tables all
//! conform to the same behavior.

use objregistry::{Provider, Registry, RegistryError};
use pretty_assertions::assert_eq;

const CUSTOM_ENDPOINT: &str = "https://x.example.com";
const ACCOUNT_ID: &str = "abc123";

/// Account id to use for a provider that may require one.
fn account_for(provider: &Provider) -> &'static str {
    if provider.requires_account_id() {
        ACCOUNT_ID
    } else {
        ""
    }
}

/// Empty region selects the default region.
pub fn test_default_region(registry: &Registry) {
    for provider in registry.get_providers().values() {
        if provider.requires_custom_endpoint() || provider.requires_account_id() {
            continue;
        }
        if !provider.default_region_exists() {
            tracing::warn!(provider = provider.key(), "skipping provider without valid default region");
            continue;
        }

        let implicit = registry.get_endpoint(provider.key(), "", "", None).unwrap();
        let explicit = registry
            .get_endpoint(provider.key(), provider.default_region(), "", None)
            .unwrap();
        assert_eq!(
            implicit,
            explicit,
            "default region endpoint mismatch for '{}'",
            provider.key()
        );
    }
}

/// Providers with `{account_id}` templates reject an empty account id for every region.
pub fn test_missing_account_id(registry: &Registry) {
    for provider in registry.get_providers().values() {
        if !provider.requires_account_id() || provider.requires_custom_endpoint() {
            continue;
        }
        for region in provider.regions() {
            let err = registry
                .get_endpoint(provider.key(), region.value(), "", None)
                .unwrap_err();
            assert!(
                matches!(err, RegistryError::MissingAccountId { .. }),
                "expected MissingAccountId for '{}' / '{}', got {err:?}",
                provider.key(),
                region.value()
            );
        }

        if !provider.default_region_exists() {
            continue;
        }
        let endpoint = registry
            .get_endpoint(provider.key(), "", ACCOUNT_ID, None)
            .unwrap();
        assert!(
            endpoint.contains(ACCOUNT_ID),
            "endpoint '{endpoint}' of '{}' must contain the account id",
            provider.key()
        );
    }
}

/// Providers requiring a custom endpoint only resolve with one, and derive the
/// result from it alone.
pub fn test_custom_endpoint(registry: &Registry) {
    for provider in registry.get_providers().values() {
        if !provider.requires_custom_endpoint() {
            continue;
        }
        let account_id = account_for(provider);

        for region in ["", "auto", "some-region"] {
            let err = registry
                .get_endpoint(provider.key(), region, account_id, None)
                .unwrap_err();
            assert!(
                matches!(err, RegistryError::MissingCustomEndpoint { .. }),
                "expected MissingCustomEndpoint for '{}', got {err:?}",
                provider.key()
            );

            let endpoint = registry
                .get_endpoint(provider.key(), region, account_id, Some(CUSTOM_ENDPOINT))
                .unwrap();
            assert_eq!(endpoint, CUSTOM_ENDPOINT);
        }

        let endpoint = registry
            .get_endpoint(
                provider.key(),
                "eu-1",
                ACCOUNT_ID,
                Some(" {account_id}.{region}.storage.example.com "),
            )
            .unwrap();
        assert_eq!(endpoint, format!("{ACCOUNT_ID}.eu-1.storage.example.com"));
    }
}

/// Resolved endpoints never contain placeholders or stray dots.
pub fn test_endpoint_shape(registry: &Registry) {
    for provider in registry.get_providers().values() {
        if provider.requires_custom_endpoint() {
            continue;
        }
        for region in provider.regions() {
            let endpoint = registry
                .get_endpoint(provider.key(), region.value(), account_for(provider), None)
                .unwrap();
            assert!(!endpoint.is_empty(), "empty endpoint for '{}'", provider.key());
            assert!(!endpoint.contains('{'), "unresolved placeholder: '{endpoint}'");
            assert!(!endpoint.contains(".."), "doubled dot: '{endpoint}'");
            assert!(
                !endpoint.starts_with('.') && !endpoint.ends_with('.'),
                "dangling dot: '{endpoint}'"
            );
            if region.value() == "auto" {
                assert!(!endpoint.contains("auto"), "automatic region leaked: '{endpoint}'");
            }
        }
    }
}

/// Unknown providers and regions are reported as such.
pub fn test_unknown_lookups(registry: &Registry) {
    let err = registry
        .get_endpoint("no-such-provider", "mars-1", "", None)
        .unwrap_err();
    assert!(matches!(err, RegistryError::UnknownProvider { .. }), "{err:?}");

    for provider in registry.get_providers().values() {
        if provider.requires_custom_endpoint() {
            continue;
        }
        let err = registry
            .get_endpoint(provider.key(), "mars-1", account_for(provider), None)
            .unwrap_err();
        assert!(
            matches!(err, RegistryError::UnknownRegion { .. }),
            "expected UnknownRegion for '{}', got {err:?}",
            provider.key()
        );
    }
}

/// Exporting and re-importing the providers yields the same endpoints, and
/// resolution has no hidden state.
pub fn test_roundtrip(registry: &Registry) {
    let rebuilt = Registry::from_table(registry.to_table()).unwrap();

    for provider in registry.get_providers().values() {
        let custom = provider.requires_custom_endpoint().then_some(CUSTOM_ENDPOINT);
        for region in provider.regions() {
            let args = (region.value(), account_for(provider), custom);
            let first = registry
                .get_endpoint(provider.key(), args.0, args.1, args.2)
                .unwrap();
            let second = registry
                .get_endpoint(provider.key(), args.0, args.1, args.2)
                .unwrap();
            let other = rebuilt
                .get_endpoint(provider.key(), args.0, args.1, args.2)
                .unwrap();

            assert_eq!(first, second, "resolution must be idempotent");
            assert_eq!(first, other, "round-trip mismatch for '{}'", provider.key());
        }
    }
}

/// Run all registry checks.
pub fn test_registry(registry: &Registry) {
    assert!(
        registry.first_provider_key().is_some(),
        "registry must not be empty"
    );

    test_default_region(registry);
    test_missing_account_id(registry);
    test_custom_endpoint(registry);
    test_endpoint_shape(registry);
    test_unknown_lookups(registry);
    test_roundtrip(registry);
}
