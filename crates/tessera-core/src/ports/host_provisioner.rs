//! HostProvisioner port - ホストコンテナの用意

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{App, HostContainer, ProvisionError};

/// Produces the container an app renders into.
///
/// Must be idempotent per app name: a second request for the same name,
/// concurrent or not, returns the existing container.
#[async_trait]
pub trait HostProvisioner: Send + Sync {
    async fn provision(&self, app: &App) -> Result<Arc<HostContainer>, ProvisionError>;
}
