use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Raw provider records, keyed by provider key.
///
/// This is the shape consumed by [`crate::Registry`] before any validation.
pub type RawProviderTable = BTreeMap<String, RawProvider>;

/// A provider document, as stored in JSON.
///
/// ```json
/// {
///   "version": "1.0.0",
///   "providers": {
///     "linode": {
///       "label": "Linode",
///       "endpoint": "{region}.linodeobjects.com",
///       "defaultRegion": "us-east-1",
///       "regions": { "North America": [{ "label": "Newark", "region": "us-east-1" }] }
///     }
///   }
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProviderDocument {
    pub version: String,
    pub providers: RawProviderTable,
}

/// An unvalidated provider record.
///
/// Required fields (`label`, `regions`) are optional here so that their absence
/// is reported as an invalid provider definition instead of a parse failure.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RawProvider {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_region: Option<String>,
    #[serde(default)]
    pub use_path_style: bool,
    /// Endpoint template, containing `{region}` and/or `{account_id}` placeholders.
    #[serde(default)]
    pub endpoint: String,
    /// Whether callers must supply their own endpoint.
    ///
    /// Defaults to `true` for the `custom` provider key, `false` otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_custom_endpoint: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regions: Option<RawRegionGroups>,
}

impl RawProvider {
    pub fn new(label: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_default_region(mut self, region: impl Into<String>) -> Self {
        self.default_region = Some(region.into());
        self
    }

    pub fn with_path_style(mut self, use_path_style: bool) -> Self {
        self.use_path_style = use_path_style;
        self
    }

    pub fn with_requires_custom_endpoint(mut self, required: bool) -> Self {
        self.requires_custom_endpoint = Some(required);
        self
    }

    /// Append a region to the given continent group, creating the group if needed.
    pub fn with_region(
        mut self,
        continent: impl Into<String>,
        label: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        self.regions
            .get_or_insert_with(RawRegionGroups::default)
            .push(continent, RawRegion::new(label, code));
        self
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRegion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl RawRegion {
    pub fn new(label: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            region: Some(code.into()),
        }
    }
}

/// Regions grouped by continent, in document order.
///
/// Serialized as a JSON object. Continent order is significant (it determines
/// region ordering), so this is not a sorted map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRegionGroups(Vec<(String, Vec<RawRegion>)>);

impl RawRegionGroups {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|(_, regions)| regions.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[RawRegion])> {
        self.0
            .iter()
            .map(|(continent, regions)| (continent.as_str(), regions.as_slice()))
    }

    pub fn push(&mut self, continent: impl Into<String>, region: RawRegion) {
        let continent = continent.into();
        match self.0.iter_mut().find(|(name, _)| *name == continent) {
            Some((_, regions)) => regions.push(region),
            None => self.0.push((continent, vec![region])),
        }
    }

    /// Replace (or append) a whole continent group.
    fn insert(&mut self, continent: String, regions: Vec<RawRegion>) {
        match self.0.iter_mut().find(|(name, _)| *name == continent) {
            Some((_, existing)) => *existing = regions,
            None => self.0.push((continent, regions)),
        }
    }
}

impl FromIterator<(String, Vec<RawRegion>)> for RawRegionGroups {
    fn from_iter<T: IntoIterator<Item = (String, Vec<RawRegion>)>>(iter: T) -> Self {
        let mut groups = Self::new();
        for (continent, regions) in iter {
            groups.insert(continent, regions);
        }
        groups
    }
}

impl Serialize for RawRegionGroups {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap as _;

        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (continent, regions) in &self.0 {
            map.serialize_entry(continent, regions)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RawRegionGroups {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct GroupsVisitor;

        impl<'de> serde::de::Visitor<'de> for GroupsVisitor {
            type Value = RawRegionGroups;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of continent names to region lists")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut groups = RawRegionGroups::new();
                while let Some((continent, regions)) =
                    access.next_entry::<String, Vec<RawRegion>>()?
                {
                    groups.insert(continent, regions);
                }
                Ok(groups)
            }
        }

        deserializer.deserialize_map(GroupsVisitor)
    }
}

/// Addressing convention for bucket URLs.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UrlStyle {
    /// `https://<endpoint>/<bucket>/<key>`
    Path,
    /// `https://<bucket>.<endpoint>/<key>`
    VirtualHost,
}

impl UrlStyle {
    pub fn from_path_style(use_path_style: bool) -> Self {
        if use_path_style {
            Self::Path
        } else {
            Self::VirtualHost
        }
    }

    pub fn is_path(self) -> bool {
        matches!(self, Self::Path)
    }
}

/// An option list entry: `(value, display label)`.
pub type OptionEntry = (String, String);

/// Region options as produced by [`crate::Provider::region_options`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegionOptions {
    Flat(Vec<OptionEntry>),
    /// Options nested by continent, in continent declaration order.
    ///
    /// The empty-label entry, if requested, is kept as a top-level entry.
    Grouped {
        empty: Option<OptionEntry>,
        groups: Vec<(String, Vec<OptionEntry>)>,
    },
}

impl RegionOptions {
    /// Total number of selectable entries, including the empty entry.
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(entries) => entries.len(),
            Self::Grouped { empty, groups } => {
                usize::from(empty.is_some())
                    + groups.iter().map(|(_, entries)| entries.len()).sum::<usize>()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
