//! HostWindow port - ホスト環境のナビゲーション原始操作
//!
//! グローバル関数を書き換える代わりに、ホスト側がこの trait を実装する。
//! オーケストレーターは history 操作とイベント登録をこのポート越しに行い、
//! ナビゲーション系リスナーの横取りは自前のバッファで行う。

use std::fmt;
use std::sync::Arc;

use crate::domain::{EventKind, HostEvent, Location, OrchestratorError};

/// Event listener. Identity is the underlying allocation, so the same
/// `Listener` (or a clone of it) can be removed later.
#[derive(Clone)]
pub struct Listener(Arc<dyn Fn(&HostEvent) + Send + Sync>);

impl Listener {
    pub fn new(f: impl Fn(&HostEvent) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, event: &HostEvent) {
        (self.0)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Arc::as_ptr(&self.0))
    }
}

pub trait HostWindow: Send + Sync {
    fn location(&self) -> Location;

    /// Push a history entry. Hosts do not emit a navigation event for this.
    fn push_state(&self, state: serde_json::Value, url: &str) -> Result<(), OrchestratorError>;

    /// Replace the current history entry. No navigation event either.
    fn replace_state(&self, state: serde_json::Value, url: &str)
    -> Result<(), OrchestratorError>;

    fn add_event_listener(&self, kind: &EventKind, listener: Listener);

    fn remove_event_listener(&self, kind: &EventKind, listener: &Listener);
}
