//! Location - 現在のナビゲーション位置

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// The host's current navigable location, always an absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        Url::parse(href).map(|url| Self { url })
    }

    /// Resolve `target` (absolute or relative) against this location.
    pub fn resolve(&self, target: &str) -> Result<Self, url::ParseError> {
        self.url.join(target).map(|url| Self { url })
    }

    pub fn href(&self) -> &str {
        self.url.as_str()
    }

    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// Query string without the leading `?`.
    pub fn search(&self) -> &str {
        self.url.query().unwrap_or_default()
    }

    /// Fragment without the leading `#`.
    pub fn hash(&self) -> &str {
        self.url.fragment().unwrap_or_default()
    }

    pub fn with_hash(&self, hash: &str) -> Self {
        let mut url = self.url.clone();
        let hash = hash.trim_start_matches('#');
        url.set_fragment((!hash.is_empty()).then_some(hash));
        Self { url }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.href())
    }
}
