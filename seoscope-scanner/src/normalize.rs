//! URL canonicalization and same-site scope decisions.
//!
//! A [`NormalizedUrl`] is `scheme://host[:port]/path[?query]` with every
//! trailing slash removed from the path and the fragment dropped. Equality
//! and hashing are defined over that string, so `https://a.com/x/` and
//! `https://a.com/x` are the same page.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::{Position, Url};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    /// Parse an absolute URL and canonicalize it.
    pub fn parse(input: &str) -> Result<Self, url::ParseError> {
        Url::parse(input.trim()).map(|url| Self::from_url(&url))
    }

    pub fn from_url(url: &Url) -> Self {
        let through_path = &url[..Position::AfterPath];
        let query = &url[Position::AfterPath..Position::AfterQuery];
        let mut canonical = through_path.trim_end_matches('/').to_string();
        canonical.push_str(query);
        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_url(&self) -> Option<Url> {
        Url::parse(&self.0).ok()
    }

    /// `host[:port]` of this URL, if it has a host.
    pub fn network_location(&self) -> Option<String> {
        self.to_url().as_ref().and_then(network_location)
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Whether a link stays on the crawled site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkScope {
    Internal,
    External,
}

/// Outcome of resolving an `href` found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedHref {
    /// Not a navigable resource (fragment-only, `mailto:`, empty, ...).
    Skip,
    Target(NormalizedUrl),
    /// The reference could not be resolved into a URL. Reported external and broken.
    Malformed(String),
}

const SKIPPED_SCHEMES: [&str; 4] = ["mailto:", "tel:", "javascript:", "data:"];

/// Network location used for scope comparison: the host, plus the port when
/// the URL spells one out.
pub fn network_location(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

pub fn is_fragment_only(href: &str) -> bool {
    href.trim_start().starts_with('#')
}

/// Resolve `href` against the page it was found on.
pub fn resolve_href(base: &Url, href: &str) -> ResolvedHref {
    let href = href.trim();
    if href.is_empty() || is_fragment_only(href) {
        return ResolvedHref::Skip;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        return ResolvedHref::Skip;
    }

    match base.join(href) {
        Ok(resolved) if resolved.host_str().is_some() => {
            ResolvedHref::Target(NormalizedUrl::from_url(&resolved))
        }
        Ok(_) | Err(_) => ResolvedHref::Malformed(href.to_string()),
    }
}

/// Internal when the candidate's network location equals the root's.
pub fn classify(candidate: &NormalizedUrl, root_location: &str) -> LinkScope {
    match candidate.network_location() {
        Some(location) if location == root_location => LinkScope::Internal,
        _ => LinkScope::External,
    }
}
