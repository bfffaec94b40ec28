//! Manifest - アプリの宣言的な登録
//!
//! ```json
//! {
//!   "initialUrl": "http://localhost/",
//!   "apps": [
//!     { "name": "nav", "entry": "/apps/nav.html", "activeWhen": "always" },
//!     { "name": "widget", "entry": "/apps/widget.html",
//!       "activeWhen": { "pathPrefix": ["/widgets"] }, "props": { "theme": "dark" } }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{ActiveWhen, Props};

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppManifest {
    #[serde(default)]
    pub initial_url: Option<String>,
    pub apps: Vec<AppDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppDeclaration {
    pub name: String,
    /// Markup entry reference handed to the module loader.
    pub entry: String,
    pub active_when: ActiveWhen,
    #[serde(default = "empty_props")]
    pub props: Props,
}

fn empty_props() -> Props {
    Props::Object(serde_json::Map::new())
}

impl AppManifest {
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = AppManifest::from_json(
            r#"{
                "apps": [
                    { "name": "nav", "entry": "nav.html", "activeWhen": "always" },
                    { "name": "widget", "entry": "widget.html",
                      "activeWhen": { "pathPrefix": ["/widgets"] },
                      "props": { "theme": "dark" } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.initial_url, None);
        assert_eq!(manifest.apps.len(), 2);
        assert_eq!(manifest.apps[0].props, serde_json::json!({}));
        assert_eq!(
            manifest.apps[1].active_when,
            ActiveWhen::PathPrefix(vec!["/widgets".into()])
        );
        assert_eq!(manifest.apps[1].props["theme"], "dark");
    }

    #[test]
    fn test_invalid_manifest() {
        let err = AppManifest::from_json(r#"{ "apps": [ { "name": "x" } ] }"#).unwrap_err();
        assert!(matches!(err, ManifestError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AppManifest::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ManifestError::Io { .. }));
    }
}
