//! GlobalStore - アプリ間で共有するキー・バリューストア
//!
//! エビクションもトランザクションもない、ただの共有ミュータブル状態。
//! 競合の回避は呼び出し側の責任。

use std::collections::HashMap;

use tokio::sync::RwLock;

#[derive(Default)]
pub struct GlobalStore {
    values: RwLock<HashMap<String, serde_json::Value>>,
}

impl GlobalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.values.read().await.get(key).cloned()
    }

    /// Returns the previous value.
    pub async fn set(
        &self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.values.write().await.insert(key.into(), value)
    }

    pub async fn remove(&self, key: &str) -> Option<serde_json::Value> {
        self.values.write().await.remove(key)
    }

    pub async fn snapshot(&self) -> HashMap<String, serde_json::Value> {
        self.values.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = GlobalStore::new();
        assert_eq!(store.set("user", json!({ "id": 7 })).await, None);
        assert_eq!(store.get("user").await, Some(json!({ "id": 7 })));

        let previous = store.set("user", json!({ "id": 8 })).await;
        assert_eq!(previous, Some(json!({ "id": 7 })));

        assert_eq!(store.remove("user").await, Some(json!({ "id": 8 })));
        assert!(store.snapshot().await.is_empty());
    }
}
