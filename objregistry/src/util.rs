/// Normalize an identifier: lowercase, keeping only `[a-z0-9_-]`.
///
/// Used for provider keys and continent names.
pub fn sanitize_key(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-')
        .collect()
}

/// Escape the HTML special characters `& < > " '`.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}

/// Reverse of [`escape_html`].
pub fn unescape_html(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&")
}

/// Returns the normalized URL if `raw` is a valid http(s) URL, or an empty string.
pub fn sanitize_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    match url::Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => url.to_string(),
        _ => String::new(),
    }
}

/// Collapse runs of `.` into a single `.` and trim leading/trailing dots.
///
/// Empty placeholder substitutions in templates like `{region}.vendor.com`
/// would otherwise leave stray dots in the hostname.
pub(crate) fn clean_endpoint(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c == '.' && out.ends_with('.') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('.').to_string()
}
