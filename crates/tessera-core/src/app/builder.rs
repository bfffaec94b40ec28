//! OrchestratorBuilder - オーケストレーターの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - HostWindow と ModuleLoader は必須。無ければ build() が BuildError を返す
//! - HostProvisioner と ErrorHook は省略時にインメモリ / tracing 実装を使う

use std::sync::Arc;

use super::executor::LifecycleExecutor;
use super::orchestrator::Orchestrator;
use crate::impls::{InMemoryHostProvisioner, TracingErrorHook};
use crate::ports::{ErrorHook, HostProvisioner, HostWindow, ModuleLoader};

/// ```ignore
/// let orchestrator = OrchestratorBuilder::new()
///     .host_window(Arc::new(MemoryHost::parse("http://localhost/")?))
///     .module_loader(Arc::new(loader))
///     .build()?;
/// ```
#[derive(Default)]
pub struct OrchestratorBuilder {
    host: Option<Arc<dyn HostWindow>>,
    loader: Option<Arc<dyn ModuleLoader>>,
    provisioner: Option<Arc<dyn HostProvisioner>>,
    error_hook: Option<Arc<dyn ErrorHook>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing {0}. It must be set before build().")]
    MissingPort(&'static str),
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host_window(mut self, host: Arc<dyn HostWindow>) -> Self {
        self.host = Some(host);
        self
    }

    pub fn module_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn host_provisioner(mut self, provisioner: Arc<dyn HostProvisioner>) -> Self {
        self.provisioner = Some(provisioner);
        self
    }

    pub fn error_hook(mut self, hook: Arc<dyn ErrorHook>) -> Self {
        self.error_hook = Some(hook);
        self
    }

    /// Wire the ports together. The orchestrator registers its own
    /// navigation listeners with the host here.
    pub fn build(self) -> Result<Orchestrator, BuildError> {
        let host = self.host.ok_or(BuildError::MissingPort("host window"))?;
        let loader = self.loader.ok_or(BuildError::MissingPort("module loader"))?;
        let provisioner = self
            .provisioner
            .unwrap_or_else(|| Arc::new(InMemoryHostProvisioner::new()));
        let error_hook = self
            .error_hook
            .unwrap_or_else(|| Arc::new(TracingErrorHook));

        let executor = LifecycleExecutor::new(loader, provisioner, error_hook);
        Ok(Orchestrator::new(host, executor))
    }
}
