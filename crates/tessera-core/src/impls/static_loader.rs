//! StaticModuleLoader - 事前登録したバンドルを返す ModuleLoader

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::{App, HostContainer, LifecycleBundle, LifecycleExports, LoadError};
use crate::ports::ModuleLoader;

/// Maps entry references to bundles known up front.
///
/// Built during initialization, read-only afterwards.
#[derive(Default)]
pub struct StaticModuleLoader {
    bundles: HashMap<String, LifecycleBundle>,
    resolutions: AtomicUsize,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundle(mut self, entry: impl Into<String>, bundle: LifecycleBundle) -> Self {
        self.bundles.insert(entry.into(), bundle);
        self
    }

    pub fn with_exports(self, entry: impl Into<String>, exports: LifecycleExports) -> Self {
        self.with_bundle(entry, exports.into())
    }

    /// How many times `load` has been called.
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn load(
        &self,
        app: &App,
        entry: &str,
        host: &HostContainer,
    ) -> Result<LifecycleBundle, LoadError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(app = %app.name(), entry, host = %host.id(), "resolving markup entry");
        self.bundles
            .get(entry)
            .cloned()
            .ok_or_else(|| LoadError::UnknownEntry(entry.to_string()))
    }
}
