//! App - 登録されたマイクロフロントエンド
//!
//! status は「どのフェーズを次に実行できるか」を決める唯一の情報源。
//! status の更新はすべて per-app のロック内で test-and-set として行う。

use std::fmt;
use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::activation::ActivationRule;
use super::errors::{OrchestratorError, Result};
use super::host::HostContainer;
use super::lifecycle::{AppFactory, Lifecycles, Props};
use super::location::Location;
use super::status::{AppStatus, Phase};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppName(String);

impl AppName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for AppName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// How an app's code is found.
#[derive(Clone)]
pub enum Entry {
    /// Reference resolved by the markup-based module loader.
    Markup(String),
    /// Invoked with the app's props to obtain its lifecycle exports.
    Factory(Arc<dyn AppFactory>),
}

impl Entry {
    pub fn markup(reference: impl Into<String>) -> Self {
        Entry::Markup(reference.into())
    }

    pub fn factory(factory: impl AppFactory + 'static) -> Self {
        Entry::Factory(Arc::new(factory))
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Markup(reference) => f.debug_tuple("Markup").field(reference).finish(),
            Entry::Factory(_) => f.write_str("Factory"),
        }
    }
}

impl From<&str> for Entry {
    fn from(reference: &str) -> Self {
        Entry::markup(reference)
    }
}

/// In-flight load shared by every concurrent caller.
pub(crate) type PendingLoad = Shared<BoxFuture<'static, Result<()>>>;

struct AppState {
    status: AppStatus,
    props: Props,
    lifecycles: Option<Arc<Lifecycles>>,
    host: Option<Weak<HostContainer>>,
    failed: Option<Phase>,
    updated_at: DateTime<Utc>,
}

/// Point-in-time view of one app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSnapshot {
    pub name: AppName,
    pub status: AppStatus,
    pub failed_phase: Option<Phase>,
    pub updated_at: DateTime<Utc>,
}

pub struct App {
    name: AppName,
    entry: Entry,
    activation: Arc<dyn ActivationRule>,
    state: Mutex<AppState>,
    pending_load: Mutex<Option<PendingLoad>>,
}

impl App {
    pub fn new(
        name: AppName,
        entry: Entry,
        activation: Arc<dyn ActivationRule>,
        props: Props,
    ) -> Self {
        Self {
            name,
            entry,
            activation,
            state: Mutex::new(AppState {
                status: AppStatus::NotLoaded,
                props,
                lifecycles: None,
                host: None,
                failed: None,
                updated_at: Utc::now(),
            }),
            pending_load: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &AppName {
        &self.name
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn is_active(&self, location: &Location) -> bool {
        self.activation.is_active(location)
    }

    pub async fn status(&self) -> AppStatus {
        self.state.lock().await.status
    }

    pub async fn props(&self) -> Props {
        self.state.lock().await.props.clone()
    }

    /// Composed callables; `None` until the load phase completes.
    pub async fn lifecycles(&self) -> Option<Arc<Lifecycles>> {
        self.state.lock().await.lifecycles.clone()
    }

    /// The provisioned container, if it is still alive.
    pub async fn host(&self) -> Option<Arc<HostContainer>> {
        self.state.lock().await.host.as_ref().and_then(Weak::upgrade)
    }

    pub async fn failed_phase(&self) -> Option<Phase> {
        self.state.lock().await.failed
    }

    pub async fn snapshot(&self) -> AppSnapshot {
        let state = self.state.lock().await;
        AppSnapshot {
            name: self.name.clone(),
            status: state.status,
            failed_phase: state.failed,
            updated_at: state.updated_at,
        }
    }

    pub(crate) fn pending_load(&self) -> &Mutex<Option<PendingLoad>> {
        &self.pending_load
    }

    pub(crate) async fn is_loaded(&self) -> bool {
        self.state.lock().await.lifecycles.is_some()
    }

    pub(crate) async fn start_loading(&self) {
        let mut state = self.state.lock().await;
        self.transition(&mut state, AppStatus::Loading);
    }

    /// Store the composed callables and host. Lifecycles are set once per app.
    pub(crate) async fn complete_load(&self, lifecycles: Lifecycles, host: &Arc<HostContainer>) {
        let mut state = self.state.lock().await;
        if state.lifecycles.is_none() {
            state.lifecycles = Some(Arc::new(lifecycles));
        }
        state.host = Some(Arc::downgrade(host));
        self.transition(&mut state, Phase::Load.settled());
    }

    /// Test-and-set `precondition -> in_progress` for `phase`.
    ///
    /// Returns `None` (nothing changed) when the status does not match.
    /// `props` replaces the stored props before the phase runs.
    pub(crate) async fn begin(
        &self,
        phase: Phase,
        props: Option<Props>,
    ) -> Option<(Arc<Lifecycles>, Props)> {
        let mut state = self.state.lock().await;
        if state.status != phase.precondition() {
            return None;
        }
        let lifecycles = state.lifecycles.clone()?;
        if let Some(props) = props {
            state.props = props;
        }
        self.transition(&mut state, phase.in_progress());
        Some((lifecycles, state.props.clone()))
    }

    pub(crate) async fn settle(&self, phase: Phase) {
        let mut state = self.state.lock().await;
        if state.status == phase.in_progress() {
            self.transition(&mut state, phase.settled());
        }
    }

    /// The status stays at the phase's in-progress value.
    pub(crate) async fn mark_failed(&self, phase: Phase) {
        let mut state = self.state.lock().await;
        state.failed = Some(phase);
        state.updated_at = Utc::now();
    }

    /// Roll a failed phase back to its precondition.
    pub(crate) async fn rollback(&self) -> Result<AppStatus> {
        let mut pending = self.pending_load.lock().await;
        let mut state = self.state.lock().await;
        let Some(phase) = state.failed else {
            return Err(OrchestratorError::NotRecoverable {
                app: self.name.clone(),
                status: state.status,
            });
        };
        if phase == Phase::Load {
            pending.take();
        }
        state.failed = None;
        let target = phase.precondition();
        tracing::info!(app = %self.name, %phase, from = %state.status, to = %target, "rolled back failed phase");
        state.status = target;
        state.updated_at = Utc::now();
        Ok(target)
    }

    fn transition(&self, state: &mut AppState, next: AppStatus) {
        tracing::debug!(app = %self.name, from = %state.status, to = %next, "status transition");
        state.status = next;
        state.failed = None;
        state.updated_at = Utc::now();
    }

    #[cfg(test)]
    pub(crate) async fn force_status(&self, status: AppStatus) {
        self.state.lock().await.status = status;
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("entry", &self.entry)
            .finish_non_exhaustive()
    }
}
