//! AppRegistry - 登録済みアプリの順序付きコレクション
//!
//! 登録順がそのまま reroute の走査順になる。
//! 構造の変更は append のみ（削除・挿入はサポートしない）。

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{App, AppName, OrchestratorError};

#[derive(Default)]
pub struct AppRegistry {
    apps: RwLock<Vec<Arc<App>>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an app. A name can only be registered once.
    pub async fn register(&self, app: App) -> Result<Arc<App>, OrchestratorError> {
        let mut apps = self.apps.write().await;
        if apps.iter().any(|existing| existing.name() == app.name()) {
            return Err(OrchestratorError::DuplicateApp(app.name().clone()));
        }
        let app = Arc::new(app);
        apps.push(Arc::clone(&app));
        Ok(app)
    }

    /// Every registered app in registration order. The apps themselves are live.
    pub async fn all(&self) -> Vec<Arc<App>> {
        self.apps.read().await.clone()
    }

    pub async fn get(&self, name: &AppName) -> Option<Arc<App>> {
        self.apps
            .read()
            .await
            .iter()
            .find(|app| app.name() == name)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.apps.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.apps.read().await.is_empty()
    }
}
