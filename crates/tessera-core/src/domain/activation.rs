//! Activation - アプリが現在の Location でアクティブかどうかの判定

use serde::{Deserialize, Serialize};

use super::location::Location;

/// Pure function of the location deciding whether an app should be active.
pub trait ActivationRule: Send + Sync {
    fn is_active(&self, location: &Location) -> bool;
}

impl<F> ActivationRule for F
where
    F: Fn(&Location) -> bool + Send + Sync,
{
    fn is_active(&self, location: &Location) -> bool {
        self(location)
    }
}

/// Declarative activation rule, used by manifests.
///
/// ```ignore
/// { "pathPrefix": ["/widgets", "/gadgets"] }
/// { "exactPath": "/" }
/// { "hashPrefix": "/settings" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActiveWhen {
    PathPrefix(Vec<String>),
    ExactPath(String),
    HashPrefix(String),
    Always,
}

impl ActivationRule for ActiveWhen {
    fn is_active(&self, location: &Location) -> bool {
        match self {
            ActiveWhen::PathPrefix(prefixes) => prefixes
                .iter()
                .any(|prefix| path_has_prefix(location.pathname(), prefix)),
            ActiveWhen::ExactPath(path) => location.pathname() == path,
            ActiveWhen::HashPrefix(prefix) => location.hash().starts_with(prefix.as_str()),
            ActiveWhen::Always => true,
        }
    }
}

// "/widgets" matches "/widgets" and "/widgets/1" but not "/widgetsx"
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
