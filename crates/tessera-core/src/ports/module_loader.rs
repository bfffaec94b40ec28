//! ModuleLoader port - markup エントリの解決

use async_trait::async_trait;

use crate::domain::{App, HostContainer, LifecycleBundle, LoadError};

/// Resolves a markup entry reference into a normalized lifecycle bundle.
///
/// Factory entries do not go through the loader; the executor invokes them directly.
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn load(
        &self,
        app: &App,
        entry: &str,
        host: &HostContainer,
    ) -> Result<LifecycleBundle, LoadError>;
}
