//! InMemoryHostProvisioner - 名前ごとに 1 つのホストコンテナ

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{App, AppName, HostContainer, ProvisionError};
use crate::ports::HostProvisioner;

/// Owns one container per app name for the lifetime of the provisioner.
#[derive(Default)]
pub struct InMemoryHostProvisioner {
    containers: Mutex<HashMap<AppName, Arc<HostContainer>>>,
}

impl InMemoryHostProvisioner {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn container(&self, name: &AppName) -> Option<Arc<HostContainer>> {
        self.containers.lock().await.get(name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.containers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.containers.lock().await.is_empty()
    }
}

#[async_trait]
impl HostProvisioner for InMemoryHostProvisioner {
    async fn provision(&self, app: &App) -> Result<Arc<HostContainer>, ProvisionError> {
        let mut containers = self.containers.lock().await;
        let container = containers
            .entry(app.name().clone())
            .or_insert_with(|| {
                tracing::debug!(app = %app.name(), "provisioning host container");
                Arc::new(HostContainer::new(app.name().clone()))
            });
        Ok(Arc::clone(container))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Entry, Location};

    fn app(name: &str) -> App {
        App::new(
            AppName::new(name),
            Entry::markup(format!("{name}.html")),
            Arc::new(|_: &Location| true),
            serde_json::Value::Null,
        )
    }

    #[tokio::test]
    async fn test_one_container_per_name() {
        let provisioner = InMemoryHostProvisioner::new();
        let widget = app("widget");

        let (a, b) = tokio::join!(provisioner.provision(&widget), provisioner.provision(&widget));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.app().as_str(), "widget");

        provisioner.provision(&app("nav")).await.unwrap();
        assert_eq!(provisioner.len().await, 2);
    }
}
