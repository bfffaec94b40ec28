//! Orchestrator - 登録 API・reroute エンジン・ナビゲーション横取りのまとめ役
//!
//! # reroute のモード
//! - **init**（start 前）: loads だけを並行に実行し、全部終わるまで待つ。mount はしない
//! - **perform**（start 後）: unmounts / loads / mounts を spawn して待たずに返す
//!
//! reroute 同士は排他しない。安全性は executor の status ゲートだけに依存する。
//!
//! # ナビゲーションループ
//! tokio ランタイム上で build されたときはその場で、そうでなければ start() で起動する。
//! ループはオーケストレーターを Weak で持つので、最後の handle の drop で止まる。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use futures::future::join_all;
use tokio::sync::{mpsc, watch};

use super::executor::LifecycleExecutor;
use super::manifest::AppManifest;
use super::navigation::{CapturedListeners, NavigationLoop};
use super::registry::AppRegistry;
use super::reroute::{AppChanges, RerouteHandle, RerouteMode, compute_changes};
use super::status::StatusCounts;
use super::store::GlobalStore;
use crate::domain::{
    ActivationRule, App, AppName, AppSnapshot, AppStatus, Entry, EventKind, HostEvent, Location,
    OrchestratorError, Props, Result,
};
use crate::ports::{HostWindow, Listener};

/// Handle to one orchestrator instance. Cheap to clone.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    registry: AppRegistry,
    store: GlobalStore,
    executor: LifecycleExecutor,
    host: Arc<dyn HostWindow>,
    captured: CapturedListeners,
    started: AtomicBool,
    navigation_tx: mpsc::UnboundedSender<HostEvent>,
    navigation: Mutex<Navigation>,
    settled_tx: watch::Sender<u64>,
    own_listeners: Vec<(EventKind, Listener)>,
}

enum Navigation {
    /// No runtime was available yet; events wait in the channel.
    Idle(mpsc::UnboundedReceiver<HostEvent>),
    Running(NavigationLoop),
    Stopped,
}

/// Handle held by the navigation loop; does not keep the orchestrator alive.
#[derive(Clone)]
pub(crate) struct WeakOrchestrator {
    inner: Weak<Inner>,
}

impl WeakOrchestrator {
    pub(crate) fn upgrade(&self) -> Option<Orchestrator> {
        self.inner.upgrade().map(|inner| Orchestrator { inner })
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        for (kind, listener) in &self.own_listeners {
            self.host.remove_event_listener(kind, listener);
        }
    }
}

impl Orchestrator {
    pub(crate) fn new(host: Arc<dyn HostWindow>, executor: LifecycleExecutor) -> Self {
        let (navigation_tx, navigation_rx) = mpsc::unbounded_channel();

        let own_listeners: Vec<(EventKind, Listener)> = EventKind::NAVIGATION
            .iter()
            .map(|kind| {
                let tx = navigation_tx.clone();
                let listener = Listener::new(move |event: &HostEvent| {
                    if tx.send(event.clone()).is_err() {
                        tracing::trace!(kind = %event.kind, "navigation loop is gone, event dropped");
                    }
                });
                host.add_event_listener(kind, listener.clone());
                (kind.clone(), listener)
            })
            .collect();

        let (settled_tx, _) = watch::channel(0);
        let orchestrator = Self {
            inner: Arc::new(Inner {
                registry: AppRegistry::new(),
                store: GlobalStore::new(),
                executor,
                host,
                captured: CapturedListeners::default(),
                started: AtomicBool::new(false),
                navigation_tx,
                navigation: Mutex::new(Navigation::Idle(navigation_rx)),
                settled_tx,
                own_listeners,
            }),
        };
        orchestrator.ensure_navigation_loop();
        orchestrator
    }

    pub(crate) fn downgrade(&self) -> WeakOrchestrator {
        WeakOrchestrator {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // ── registration ──────────────────────────────────────────────────────

    /// Register an app. It starts in `NotLoaded`; nothing is loaded until
    /// the next reroute.
    pub async fn register(
        &self,
        name: impl Into<String>,
        entry: impl Into<Entry>,
        activation: impl ActivationRule + 'static,
        props: Props,
    ) -> Result<Arc<App>> {
        let app = App::new(
            AppName::new(name),
            entry.into(),
            Arc::new(activation),
            props,
        );
        let app = self.inner.registry.register(app).await?;
        tracing::info!(app = %app.name(), entry = ?app.entry(), "registered app");
        Ok(app)
    }

    /// Register every declared app in order. Stops at the first duplicate.
    pub async fn register_manifest(&self, manifest: &AppManifest) -> Result<Vec<Arc<App>>> {
        let mut apps = Vec::with_capacity(manifest.apps.len());
        for declaration in &manifest.apps {
            let app = self
                .register(
                    declaration.name.clone(),
                    Entry::markup(declaration.entry.clone()),
                    declaration.active_when.clone(),
                    declaration.props.clone(),
                )
                .await?;
            apps.push(app);
        }
        Ok(apps)
    }

    pub async fn apps(&self) -> Vec<Arc<App>> {
        self.inner.registry.all().await
    }

    pub async fn app(&self, name: &str) -> Option<Arc<App>> {
        self.inner.registry.get(&AppName::new(name)).await
    }

    pub fn store(&self) -> &GlobalStore {
        &self.inner.store
    }

    pub fn location(&self) -> Location {
        self.inner.host.location()
    }

    // ── start / reroute ───────────────────────────────────────────────────

    /// Switch to perform mode and reroute. Calling it again just reroutes.
    ///
    /// Also starts the navigation loop if it is not running yet.
    pub async fn start(&self) -> Result<RerouteHandle> {
        self.ensure_navigation_loop();
        if !self.inner.started.swap(true, Ordering::SeqCst) {
            tracing::info!(href = %self.location(), "orchestrator started");
        }
        self.reroute().await
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::SeqCst)
    }

    /// Diff the registry against the current location and run the work.
    ///
    /// Before `start` this awaits every load and fails with the first error.
    /// After `start` it returns once the work is spawned.
    pub async fn reroute(&self) -> Result<RerouteHandle> {
        let location = self.inner.host.location();
        let apps = self.inner.registry.all().await;
        let changes = compute_changes(&apps, &location).await;
        let summary = changes.summary();
        tracing::debug!(
            href = %location,
            started = self.is_started(),
            loads = summary.loads.len(),
            mounts = summary.mounts.len(),
            unmounts = summary.unmounts.len(),
            "reroute"
        );

        if self.is_started() {
            Ok(self.perform(changes))
        } else {
            self.init(changes).await
        }
    }

    async fn init(&self, changes: AppChanges) -> Result<RerouteHandle> {
        let summary = changes.summary();
        let executor = &self.inner.executor;
        let results = join_all(changes.loads.iter().map(|app| executor.load(app))).await;
        if let Some(err) = results.into_iter().find_map(Result::err) {
            return Err(err);
        }
        Ok(RerouteHandle::new(RerouteMode::Init, summary))
    }

    fn perform(&self, changes: AppChanges) -> RerouteHandle {
        let mut handle = RerouteHandle::new(RerouteMode::Perform, changes.summary());

        for app in changes.unmounts {
            let executor = self.inner.executor.clone();
            let name = app.name().clone();
            handle.push(name, tokio::spawn(async move { executor.unmount(&app).await }));
        }
        for app in changes.loads {
            let executor = self.inner.executor.clone();
            let name = app.name().clone();
            handle.push(
                name,
                tokio::spawn(async move { executor.load_and_mount(&app).await }),
            );
        }
        for app in changes.mounts {
            let executor = self.inner.executor.clone();
            let name = app.name().clone();
            handle.push(
                name,
                tokio::spawn(async move { executor.bootstrap_and_mount(&app).await }),
            );
        }

        handle
    }

    // ── per-app operations ────────────────────────────────────────────────

    /// Run the app's update lifecycle with new props. No-op unless mounted.
    pub async fn update(&self, name: &str, props: Props) -> Result<Arc<App>> {
        let app = self.require(name).await?;
        self.inner.executor.update(&app, props).await
    }

    /// Explicitly unfreeze an app whose phase failed. Never done automatically.
    pub async fn recover(&self, name: &str) -> Result<AppStatus> {
        let app = self.require(name).await?;
        self.inner.executor.recover(&app).await
    }

    pub async fn snapshot(&self) -> Vec<AppSnapshot> {
        let mut snapshots = Vec::new();
        for app in self.inner.registry.all().await {
            snapshots.push(app.snapshot().await);
        }
        snapshots
    }

    pub async fn status_counts(&self) -> StatusCounts {
        StatusCounts::from_snapshots(&self.snapshot().await)
    }

    async fn require(&self, name: &str) -> Result<Arc<App>> {
        let name = AppName::new(name);
        self.inner
            .registry
            .get(&name)
            .await
            .ok_or(OrchestratorError::UnknownApp(name))
    }

    // ── navigation interception ───────────────────────────────────────────

    /// Navigation kinds are buffered here; every other kind goes to the host.
    pub fn add_event_listener(&self, kind: EventKind, listener: Listener) {
        if kind.is_navigation() {
            if self.inner.captured.capture(&kind, listener) {
                tracing::trace!(%kind, "captured navigation listener");
            }
        } else {
            self.inner.host.add_event_listener(&kind, listener);
        }
    }

    pub fn remove_event_listener(&self, kind: EventKind, listener: &Listener) {
        if kind.is_navigation() {
            self.inner.captured.release(&kind, listener);
        } else {
            self.inner.host.remove_event_listener(&kind, listener);
        }
    }

    /// `history.pushState` that reroutes when the location changed.
    /// Returns whether it did.
    pub fn push_state(&self, state: serde_json::Value, url: &str) -> Result<bool> {
        self.mutate_history(state, url, |host, state, url| host.push_state(state, url))
    }

    /// `history.replaceState` that reroutes when the location changed.
    pub fn replace_state(&self, state: serde_json::Value, url: &str) -> Result<bool> {
        self.mutate_history(state, url, |host, state, url| host.replace_state(state, url))
    }

    fn mutate_history(
        &self,
        state: serde_json::Value,
        url: &str,
        mutate: impl FnOnce(&dyn HostWindow, serde_json::Value, &str) -> Result<()>,
    ) -> Result<bool> {
        let host = self.inner.host.as_ref();
        let before = host.location();
        mutate(host, state.clone(), url)?;
        let after = host.location();
        let changed = before != after;
        if changed {
            self.notify(HostEvent::synthetic_pop_state(after, Some(state)));
        }
        Ok(changed)
    }

    fn notify(&self, event: HostEvent) {
        if self.inner.navigation_tx.send(event).is_err() {
            tracing::trace!("navigation loop is gone, event dropped");
        }
    }

    /// Reroute for one navigation, then hand the event to the captured
    /// listeners of its kind. The listeners run even if the reroute failed.
    pub async fn handle_navigation(&self, event: HostEvent) -> Result<RerouteHandle> {
        tracing::debug!(
            kind = %event.kind,
            href = %event.location,
            synthetic = event.synthetic,
            "navigation"
        );
        let result = self.reroute().await;
        for listener in self.inner.captured.listeners(&event.kind) {
            listener.call(&event);
        }
        result
    }

    /// Counts navigations whose reroute work has settled.
    pub fn settled_navigations(&self) -> watch::Receiver<u64> {
        self.inner.settled_tx.subscribe()
    }

    pub(crate) fn mark_navigation_settled(&self) {
        self.inner.settled_tx.send_modify(|settled| *settled += 1);
    }

    /// Stop the navigation loop. Later navigations are dropped; lifecycle
    /// work already started keeps running.
    pub async fn shutdown(&self) {
        let navigation = {
            let mut navigation = self
                .inner
                .navigation
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *navigation, Navigation::Stopped)
        };
        if let Navigation::Running(navigation) = navigation {
            navigation.shutdown_and_join().await;
            tracing::info!("navigation loop shut down");
        }
    }

    // events queued before the loop starts are processed first
    fn ensure_navigation_loop(&self) {
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        let mut navigation = self
            .inner
            .navigation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *navigation = match std::mem::replace(&mut *navigation, Navigation::Stopped) {
            Navigation::Idle(events) => {
                tracing::debug!("navigation loop started");
                Navigation::Running(NavigationLoop::spawn(self.downgrade(), events))
            }
            other => other,
        };
    }
}
