//! Navigation - ナビゲーションの横取りと reroute のトリガー
//!
//! - HashChange / PopState のリスナーはホストに登録せず、ここでバッファする
//! - オーケストレーター自身のリスナーはイベントをチャネルに積むだけ
//! - NavigationLoop がチャネルを読み、イベントごとのタスクで reroute してから
//!   バッファ済みリスナーを呼ぶ
//!
//! start 前に起きたナビゲーションもチャネルに残るので失われない。

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::orchestrator::WeakOrchestrator;
use crate::domain::{EventKind, HostEvent};
use crate::ports::Listener;

/// Listeners registered for navigation kinds, held back from the host.
#[derive(Default)]
pub(crate) struct CapturedListeners {
    listeners: Mutex<HashMap<EventKind, Vec<Listener>>>,
}

impl CapturedListeners {
    /// Returns false if the listener was already captured for `kind`.
    pub(crate) fn capture(&self, kind: &EventKind, listener: Listener) -> bool {
        let mut listeners = self.lock();
        let entry = listeners.entry(kind.clone()).or_default();
        if entry.contains(&listener) {
            return false;
        }
        entry.push(listener);
        true
    }

    pub(crate) fn release(&self, kind: &EventKind, listener: &Listener) -> bool {
        let mut listeners = self.lock();
        let Some(entry) = listeners.get_mut(kind) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|l| l != listener);
        entry.len() != before
    }

    /// Registration order.
    pub(crate) fn listeners(&self, kind: &EventKind) -> Vec<Listener> {
        self.lock().get(kind).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EventKind, Vec<Listener>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background task draining navigation events into reroutes.
///
/// - 各イベントの reroute は別タスクで実行するので、遅いロードがループを止めない
/// - `request_shutdown` か handle の drop でループが止まる
/// - 実行中の reroute が起動したライフサイクル処理はキャンセルされない
pub struct NavigationLoop {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl NavigationLoop {
    pub(crate) fn spawn(
        orchestrator: WeakOrchestrator,
        events: mpsc::UnboundedReceiver<HostEvent>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(navigation_loop(orchestrator, events, shutdown_rx));
        Self { shutdown_tx, join }
    }

    pub fn request_shutdown(&self) {
        // ignore send error: the loop may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        let _ = self.join.await;
    }
}

async fn navigation_loop(
    orchestrator: WeakOrchestrator,
    mut events: mpsc::UnboundedReceiver<HostEvent>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let event = tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            event = events.recv() => event,
        };

        let Some(event) = event else {
            break;
        };
        // orchestrator dropped while the event was queued
        let Some(current) = orchestrator.upgrade() else {
            break;
        };

        tokio::spawn(async move {
            match current.handle_navigation(event).await {
                Ok(handle) => {
                    // phase failures already went to the error hook
                    let failed = handle.settled().await.iter().filter(|r| r.is_err()).count();
                    if failed > 0 {
                        tracing::debug!(failed, "navigation settled with failures");
                    }
                }
                Err(err) => {
                    tracing::warn!(app = ?err.app(), %err, "reroute after navigation failed");
                }
            }
            current.mark_navigation_settled();
        });
    }
    tracing::debug!("navigation loop stopped");
}
