use crate::util::{escape_html, sanitize_key};

/// A deployment location offered by a [`crate::Provider`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    continent: String,
    /// Continent name as declared in the provider record.
    group: String,
    label: String,
    code: String,
    /// Unescaped region code, used for lookups and endpoint substitution.
    value: String,
}

impl Region {
    /// Create a new region.
    ///
    /// The continent is normalized to `[a-z0-9_-]`, label and code are HTML-escaped
    /// for display. The unescaped code stays available as [`Region::value`].
    pub fn new(continent: &str, label: &str, code: &str) -> Self {
        Self {
            continent: sanitize_key(continent),
            group: continent.to_string(),
            label: escape_html(label),
            code: escape_html(code),
            value: code.to_string(),
        }
    }

    pub fn continent(&self) -> &str {
        &self.continent
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// HTML-escaped region code for display.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The region code as declared, which is what callers pass to lookups.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this is the `auto` region used by providers without real regions.
    pub fn is_automatic(&self) -> bool {
        self.value.eq_ignore_ascii_case("auto")
    }

    /// Display label for option lists: `"<label> (<code>)"`.
    pub fn option_label(&self) -> String {
        format!("{} ({})", self.label, self.code)
    }
}
