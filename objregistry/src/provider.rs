use crate::{
    OptionEntry, RawProvider, RawRegion, RawRegionGroups, Region, RegionOptions, RegistryError,
    UrlStyle,
    util::{clean_endpoint, sanitize_key, sanitize_url, unescape_html},
};

const PLACEHOLDER_REGION: &str = "{region}";
const PLACEHOLDER_ACCOUNT_ID: &str = "{account_id}";

/// Provider key that requires a caller-supplied endpoint unless the record says otherwise.
const CUSTOM_PROVIDER_KEY: &str = "custom";

/// Region code used by providers that route requests automatically.
const AUTOMATIC_REGION: &str = "auto";

/// A single object storage provider definition.
///
/// Constructed from a [`RawProvider`] record and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Provider {
    key: String,
    label: String,
    supplier: String,
    homepage: String,
    dashboard: String,
    default_region: String,
    use_path_style: bool,
    endpoint: String,
    requires_custom_endpoint: bool,
    /// Declaration order, grouped by continent.
    regions: Vec<Region>,
}

impl Provider {
    /// Validate a raw record and build a provider.
    ///
    /// Fails with [`RegistryError::InvalidProviderDefinition`] if the key is
    /// empty after normalization, the label is missing, there are no regions,
    /// a region is incomplete, or a region code is declared twice.
    pub fn new(key: &str, raw: RawProvider) -> Result<Self, RegistryError> {
        let normalized_key = sanitize_key(key);
        if normalized_key.is_empty() {
            return Err(RegistryError::invalid_definition(
                key,
                "provider key is empty after normalization",
            ));
        }
        let key = normalized_key;

        let label = non_blank(raw.label.as_deref())
            .ok_or_else(|| RegistryError::invalid_definition(&key, "missing label"))?
            .to_string();

        let groups = raw
            .regions
            .filter(|groups| !groups.is_empty())
            .ok_or_else(|| RegistryError::invalid_definition(&key, "no regions defined"))?;

        let mut regions: Vec<Region> = Vec::new();
        for (continent, records) in groups.iter() {
            for record in records {
                let region_label = non_blank(record.label.as_deref()).ok_or_else(|| {
                    RegistryError::invalid_definition(
                        &key,
                        format!("region in '{continent}' is missing a label"),
                    )
                })?;
                let code = non_blank(record.region.as_deref()).ok_or_else(|| {
                    RegistryError::invalid_definition(
                        &key,
                        format!("region '{region_label}' in '{continent}' is missing a region code"),
                    )
                })?;

                let region = Region::new(continent, region_label, code);
                if regions.iter().any(|r| r.value() == region.value()) {
                    return Err(RegistryError::invalid_definition(
                        &key,
                        format!("duplicate region code '{}'", region.value()),
                    ));
                }
                regions.push(region);
            }
        }

        let requires_custom_endpoint = raw
            .requires_custom_endpoint
            .unwrap_or_else(|| key.eq_ignore_ascii_case(CUSTOM_PROVIDER_KEY));

        Ok(Self {
            label,
            supplier: raw.supplier.unwrap_or_default().trim().to_string(),
            homepage: sanitize_url(raw.homepage.as_deref().unwrap_or_default()),
            dashboard: sanitize_url(raw.dashboard.as_deref().unwrap_or_default()),
            default_region: raw.default_region.unwrap_or_default().trim().to_string(),
            use_path_style: raw.use_path_style,
            endpoint: raw.endpoint.trim().to_string(),
            requires_custom_endpoint,
            regions,
            key,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn supplier(&self) -> &str {
        &self.supplier
    }

    /// Homepage URL, or an empty string if the record did not contain a valid URL.
    pub fn homepage(&self) -> &str {
        &self.homepage
    }

    /// Dashboard URL, or an empty string if the record did not contain a valid URL.
    pub fn dashboard(&self) -> &str {
        &self.dashboard
    }

    pub fn default_region(&self) -> &str {
        &self.default_region
    }

    pub fn use_path_style(&self) -> bool {
        self.use_path_style
    }

    pub fn url_style(&self) -> UrlStyle {
        UrlStyle::from_path_style(self.use_path_style)
    }

    /// The raw endpoint template.
    pub fn endpoint_template(&self) -> &str {
        &self.endpoint
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Look up a region by its declared (unescaped) code.
    pub fn region(&self, code: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.value() == code)
    }

    pub fn region_exists(&self, code: &str) -> bool {
        self.region(code).is_some()
    }

    /// Whether the configured default region is one of the provider's regions.
    ///
    /// Not enforced on construction.
    pub fn default_region_exists(&self) -> bool {
        self.region_exists(&self.default_region)
    }

    pub fn requires_account_id(&self) -> bool {
        self.endpoint.contains(PLACEHOLDER_ACCOUNT_ID)
    }

    pub fn requires_custom_endpoint(&self) -> bool {
        self.requires_custom_endpoint
    }

    /// Continents of all regions, de-duplicated, in first-seen order.
    pub fn continents(&self) -> Vec<&str> {
        let mut continents: Vec<&str> = Vec::new();
        for region in &self.regions {
            if !continents.contains(&region.continent()) {
                continents.push(region.continent());
            }
        }
        continents
    }

    /// Build a region option list for display.
    ///
    /// Each entry maps the declared region code to the escaped `"<label> (<code>)"`.
    /// If `empty_label` is given, an entry with an empty value is prepended.
    pub fn region_options(&self, empty_label: Option<&str>, group_by_continent: bool) -> RegionOptions {
        let empty = empty_label.map(|label| (String::new(), label.to_string()));
        let entry = |region: &Region| (region.value().to_string(), region.option_label());

        if !group_by_continent {
            let entries = empty
                .into_iter()
                .chain(self.regions.iter().map(entry))
                .collect();
            return RegionOptions::Flat(entries);
        }

        let groups = self
            .continents()
            .into_iter()
            .map(|continent| {
                let entries: Vec<OptionEntry> = self
                    .regions
                    .iter()
                    .filter(|r| r.continent() == continent)
                    .map(entry)
                    .collect();
                (continent.to_string(), entries)
            })
            .collect();

        RegionOptions::Grouped { empty, groups }
    }

    /// Resolve the endpoint hostname (or URL, for custom endpoints).
    ///
    /// * `region_key`: empty selects the default region
    ///   (except for providers requiring a custom endpoint)
    /// * `account_id`: substituted for `{account_id}`
    /// * `custom_endpoint`: used as template for providers requiring a custom
    ///   endpoint, and skips region validation for all providers
    ///
    /// The checks run in a fixed order: custom endpoint, account id, region.
    pub fn resolve_endpoint(
        &self,
        region_key: &str,
        account_id: &str,
        custom_endpoint: Option<&str>,
    ) -> Result<String, RegistryError> {
        let custom_endpoint = custom_endpoint.map(str::trim).filter(|c| !c.is_empty());

        if self.requires_custom_endpoint && custom_endpoint.is_none() {
            return Err(RegistryError::MissingCustomEndpoint {
                provider: self.key.clone(),
            });
        }

        if account_id.is_empty() && self.requires_account_id() {
            return Err(RegistryError::MissingAccountId {
                provider: self.key.clone(),
            });
        }

        let region_key = if region_key.is_empty() && !self.requires_custom_endpoint {
            self.default_region.as_str()
        } else {
            region_key
        };

        if custom_endpoint.is_none() && !self.region_exists(region_key) {
            return Err(RegistryError::UnknownRegion {
                provider: self.key.clone(),
                region: region_key.to_string(),
            });
        }

        let template = match custom_endpoint {
            Some(custom) if self.requires_custom_endpoint => custom,
            _ => self.endpoint.as_str(),
        };

        let region_value = if region_key == AUTOMATIC_REGION {
            ""
        } else {
            region_key
        };

        let substituted = template
            .replace(PLACEHOLDER_REGION, region_value)
            .replace(PLACEHOLDER_ACCOUNT_ID, account_id);

        Ok(clean_endpoint(&substituted))
    }

    /// Export back into a raw record.
    ///
    /// Continents keep their declared names, so continents that only differ
    /// after normalization stay separate groups.
    pub fn to_raw(&self) -> RawProvider {
        let mut groups = RawRegionGroups::new();
        for region in &self.regions {
            groups.push(
                region.group(),
                RawRegion::new(unescape_html(region.label()), region.value()),
            );
        }

        RawProvider {
            label: Some(self.label.clone()),
            supplier: non_blank(Some(&self.supplier)).map(ToOwned::to_owned),
            homepage: non_blank(Some(&self.homepage)).map(ToOwned::to_owned),
            dashboard: non_blank(Some(&self.dashboard)).map(ToOwned::to_owned),
            default_region: non_blank(Some(&self.default_region)).map(ToOwned::to_owned),
            use_path_style: self.use_path_style,
            endpoint: self.endpoint.clone(),
            requires_custom_endpoint: Some(self.requires_custom_endpoint),
            regions: Some(groups),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn aws() -> Provider {
        let raw = RawProvider::new("Amazon S3", "s3.{region}.amazonaws.com")
            .with_default_region("us-east-1")
            .with_region("North America", "N. Virginia", "us-east-1")
            .with_region("North America", "Oregon", "us-west-2")
            .with_region("Europe", "Ireland", "eu-west-1")
            .with_region("Asia Pacific", "Tokyo", "ap-northeast-1");
        Provider::new("aws", raw).unwrap()
    }

    fn cloudflare() -> Provider {
        let raw = RawProvider::new("Cloudflare R2", "{account_id}.r2.cloudflarestorage.com")
            .with_default_region("auto")
            .with_path_style(true)
            .with_region("Global", "Automatic", "auto");
        Provider::new("cloudflare", raw).unwrap()
    }

    fn custom() -> Provider {
        let raw = RawProvider::new("Custom", "")
            .with_path_style(true)
            .with_region("Global", "Automatic", "auto");
        Provider::new("custom", raw).unwrap()
    }

    #[test]
    fn test_resolve_aws() {
        let provider = aws();
        assert_eq!(
            provider.resolve_endpoint("eu-west-1", "", None).unwrap(),
            "s3.eu-west-1.amazonaws.com"
        );
        assert_eq!(
            provider.resolve_endpoint("", "", None).unwrap(),
            "s3.us-east-1.amazonaws.com"
        );
    }

    #[test]
    fn test_resolve_unknown_region() {
        let err = aws().resolve_endpoint("mars-1", "", None).unwrap_err();
        assert!(
            matches!(&err, RegistryError::UnknownRegion { provider, region } if provider == "aws" && region == "mars-1"),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn test_custom_endpoint_skips_region_validation() {
        // Providers with their own template ignore the custom endpoint,
        // but it still disables the region check.
        let endpoint = aws()
            .resolve_endpoint("mars-1", "", Some("https://minio.local"))
            .unwrap();
        assert_eq!(endpoint, "s3.mars-1.amazonaws.com");
    }

    #[test]
    fn test_resolve_automatic_region() {
        let provider = cloudflare();
        assert!(provider.requires_account_id());
        assert_eq!(
            provider.resolve_endpoint("auto", "abc123", None).unwrap(),
            "abc123.r2.cloudflarestorage.com"
        );
        assert_eq!(
            provider.resolve_endpoint("", "abc123", None).unwrap(),
            "abc123.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn test_automatic_region_is_case_sensitive_in_substitution() {
        let raw = RawProvider::new("Example", "{region}.example.com")
            .with_region("Global", "Automatic", "AUTO");
        let provider = Provider::new("example", raw).unwrap();
        assert_eq!(
            provider.resolve_endpoint("AUTO", "", None).unwrap(),
            "AUTO.example.com"
        );
    }

    #[test]
    fn test_resolve_missing_account_id() {
        let err = cloudflare().resolve_endpoint("auto", "", None).unwrap_err();
        assert!(matches!(err, RegistryError::MissingAccountId { .. }));
    }

    #[test]
    fn test_resolve_custom() {
        let provider = custom();
        assert!(provider.requires_custom_endpoint());

        let err = provider.resolve_endpoint("auto", "acc", None).unwrap_err();
        assert!(matches!(err, RegistryError::MissingCustomEndpoint { .. }));

        let err = provider.resolve_endpoint("auto", "acc", Some("   ")).unwrap_err();
        assert!(matches!(err, RegistryError::MissingCustomEndpoint { .. }));

        assert_eq!(
            provider
                .resolve_endpoint("", "", Some("  https://x.example.com  "))
                .unwrap(),
            "https://x.example.com"
        );
        assert_eq!(
            provider
                .resolve_endpoint("eu-1", "acc", Some("{account_id}.{region}.minio.local"))
                .unwrap(),
            "acc.eu-1.minio.local"
        );
    }

    #[test]
    fn test_custom_endpoint_checked_before_account_id() {
        let raw = RawProvider::new("Custom", "{account_id}.example.com")
            .with_region("Global", "Automatic", "auto");
        let provider = Provider::new("custom", raw).unwrap();
        let err = provider.resolve_endpoint("", "", None).unwrap_err();
        assert!(matches!(err, RegistryError::MissingCustomEndpoint { .. }));
    }

    #[test]
    fn test_explicit_custom_endpoint_flag() {
        let raw = RawProvider::new("Self hosted", "")
            .with_requires_custom_endpoint(true)
            .with_region("Global", "Default", "default");
        let provider = Provider::new("minio", raw).unwrap();
        assert!(provider.requires_custom_endpoint());

        let raw = RawProvider::new("Custom", "custom.example.com")
            .with_requires_custom_endpoint(false)
            .with_default_region("auto")
            .with_region("Global", "Automatic", "auto");
        let provider = Provider::new("custom", raw).unwrap();
        assert!(!provider.requires_custom_endpoint());
        assert_eq!(
            provider.resolve_endpoint("", "", None).unwrap(),
            "custom.example.com"
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let provider = aws();
        let a = provider.resolve_endpoint("us-west-2", "", None).unwrap();
        let b = provider.resolve_endpoint("us-west-2", "", None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_definitions() {
        let err = Provider::new("!!", RawProvider::new("X", "x")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidProviderDefinition { .. }));

        let raw = RawProvider {
            label: None,
            ..RawProvider::new("", "x").with_region("Global", "A", "a")
        };
        let err = Provider::new("x", raw).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidProviderDefinition { .. }));

        let err = Provider::new("x", RawProvider::new("X", "x")).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidProviderDefinition { .. }));

        let mut raw = RawProvider::new("X", "x");
        raw.regions = Some(RawRegionGroups::from_iter([(
            "Global".to_string(),
            vec![RawRegion {
                label: Some("A".to_string()),
                region: None,
            }],
        )]));
        let err = Provider::new("x", raw).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidProviderDefinition { .. }));

        let raw = RawProvider::new("X", "x")
            .with_region("Europe", "A", "a")
            .with_region("Asia", "A again", "a");
        let err = Provider::new("x", raw).unwrap_err();
        assert!(
            matches!(&err, RegistryError::InvalidProviderDefinition { reason, .. } if reason.contains("duplicate")),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn test_provider_fields() {
        let mut raw = RawProvider::new("Linode", "{region}.linodeobjects.com")
            .with_default_region("us-east-1")
            .with_region("North America", "Newark", "us-east-1");
        raw.supplier = Some(" Akamai ".to_string());
        raw.homepage = Some("https://www.linode.com/products/object-storage/".to_string());
        raw.dashboard = Some("ftp://cloud.linode.com".to_string());

        let provider = Provider::new("Linode", raw).unwrap();
        assert_eq!(provider.key(), "linode");
        assert_eq!(provider.supplier(), "Akamai");
        assert_eq!(
            provider.homepage(),
            "https://www.linode.com/products/object-storage/"
        );
        assert_eq!(provider.dashboard(), "");
        assert!(provider.default_region_exists());
        assert!(!provider.requires_account_id());
        assert_eq!(provider.url_style(), UrlStyle::VirtualHost);
    }

    #[test]
    fn test_default_region_not_enforced() {
        let raw = RawProvider::new("X", "{region}.x.com")
            .with_default_region("nowhere")
            .with_region("Europe", "A", "a");
        let provider = Provider::new("x", raw).unwrap();
        assert!(!provider.default_region_exists());
        let err = provider.resolve_endpoint("", "", None).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownRegion { .. }));
    }

    #[test]
    fn test_continents_and_options() {
        let provider = aws();
        assert_eq!(
            provider.continents(),
            vec!["northamerica", "europe", "asiapacific"]
        );

        let flat = provider.region_options(Some("Select a region"), false);
        match &flat {
            RegionOptions::Flat(entries) => {
                assert_eq!(entries[0], (String::new(), "Select a region".to_string()));
                assert_eq!(
                    entries[1],
                    ("us-east-1".to_string(), "N. Virginia (us-east-1)".to_string())
                );
            }
            other => panic!("expected flat options, got {other:?}"),
        }
        assert_eq!(flat.len(), 5);

        let grouped = provider.region_options(None, true);
        match &grouped {
            RegionOptions::Grouped { empty, groups } => {
                assert!(empty.is_none());
                assert_eq!(groups.len(), 3);
                assert_eq!(groups[0].0, "northamerica");
                assert_eq!(groups[0].1.len(), 2);
                assert_eq!(
                    groups[2].1,
                    vec![("ap-northeast-1".to_string(), "Tokyo (ap-northeast-1)".to_string())]
                );
            }
            other => panic!("expected grouped options, got {other:?}"),
        }
        assert_eq!(grouped.len(), 4);
    }

    #[test]
    fn test_to_raw_roundtrip() {
        let provider = aws();
        let rebuilt = Provider::new(provider.key(), provider.to_raw()).unwrap();
        assert_eq!(rebuilt, provider);
    }

    #[test]
    fn test_region_code_with_html_characters() {
        let raw = RawProvider::new("Odd Storage", "{region}.x.com")
            .with_default_region("a&b")
            .with_region("Europe", "Somewhere", "a&b")
            .with_region("Europe", "Elsewhere", "o'neil");
        let provider = Provider::new("odd", raw).unwrap();

        assert!(provider.region_exists("a&b"));
        assert!(!provider.region_exists("a&amp;b"));
        assert!(provider.default_region_exists());
        assert_eq!(provider.regions()[0].code(), "a&amp;b");

        assert_eq!(provider.resolve_endpoint("a&b", "", None).unwrap(), "a&b.x.com");
        assert_eq!(provider.resolve_endpoint("", "", None).unwrap(), "a&b.x.com");
        assert_eq!(
            provider.resolve_endpoint("o'neil", "", None).unwrap(),
            "o'neil.x.com"
        );

        match provider.region_options(None, false) {
            RegionOptions::Flat(entries) => assert_eq!(
                entries[0],
                ("a&b".to_string(), "Somewhere (a&amp;b)".to_string())
            ),
            other => panic!("expected flat options, got {other:?}"),
        }

        let rebuilt = Provider::new(provider.key(), provider.to_raw()).unwrap();
        assert_eq!(rebuilt, provider);
    }

    #[test]
    fn test_to_raw_keeps_continent_groups() {
        let raw = RawProvider::new("Scattered", "s3.{region}.example.com")
            .with_region("Europe", "A", "a")
            .with_region("Asia", "B", "b")
            .with_region("europe", "C", "c");
        let provider = Provider::new("scattered", raw).unwrap();
        assert_eq!(provider.continents(), vec!["europe", "asia"]);

        let rebuilt = Provider::new(provider.key(), provider.to_raw()).unwrap();
        let codes: Vec<&str> = rebuilt.regions().iter().map(Region::value).collect();
        assert_eq!(codes, vec!["a", "b", "c"]);
        assert_eq!(rebuilt, provider);
    }
}
