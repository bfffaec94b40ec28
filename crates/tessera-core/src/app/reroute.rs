//! Reroute - 登録済みアプリと現在位置の差分計算
//!
//! | status                                          | active  | inactive |
//! |-------------------------------------------------|---------|----------|
//! | NotLoaded, Loading                              | loads   | -        |
//! | NotBootstrapped, Bootstrapping, NotMounted      | mounts  | -        |
//! | Mounted                                         | -       | unmounts |
//! | それ以外                                         | -       | -        |
//!
//! 実行側（init / perform モード）は orchestrator にある。

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;

use crate::domain::{App, AppName, AppStatus, Location, OrchestratorError, Result};

/// Which work set an app falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkSet {
    Load,
    Mount,
    Unmount,
}

/// Classify one app by its status and whether it is active at the location.
pub fn classify(status: AppStatus, active: bool) -> Option<WorkSet> {
    match (status, active) {
        (AppStatus::NotLoaded | AppStatus::Loading, true) => Some(WorkSet::Load),
        (
            AppStatus::NotBootstrapped | AppStatus::Bootstrapping | AppStatus::NotMounted,
            true,
        ) => Some(WorkSet::Mount),
        (AppStatus::Mounted, false) => Some(WorkSet::Unmount),
        _ => None,
    }
}

/// Three disjoint work sets, each in registration order.
#[derive(Debug, Default)]
pub struct AppChanges {
    pub loads: Vec<Arc<App>>,
    pub mounts: Vec<Arc<App>>,
    pub unmounts: Vec<Arc<App>>,
}

impl AppChanges {
    pub fn is_empty(&self) -> bool {
        self.loads.is_empty() && self.mounts.is_empty() && self.unmounts.is_empty()
    }

    pub fn summary(&self) -> ChangeSummary {
        let names = |apps: &[Arc<App>]| apps.iter().map(|app| app.name().clone()).collect();
        ChangeSummary {
            loads: names(&self.loads),
            mounts: names(&self.mounts),
            unmounts: names(&self.unmounts),
        }
    }
}

/// Names only; what gets logged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub loads: Vec<AppName>,
    pub mounts: Vec<AppName>,
    pub unmounts: Vec<AppName>,
}

pub async fn compute_changes(apps: &[Arc<App>], location: &Location) -> AppChanges {
    let mut changes = AppChanges::default();
    for app in apps {
        let active = app.is_active(location);
        let target = match classify(app.status().await, active) {
            Some(WorkSet::Load) => &mut changes.loads,
            Some(WorkSet::Mount) => &mut changes.mounts,
            Some(WorkSet::Unmount) => &mut changes.unmounts,
            None => continue,
        };
        target.push(Arc::clone(app));
    }
    changes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RerouteMode {
    /// Before start: only loads, awaited by the reroute itself.
    Init,
    /// After start: every work set spawned, nothing awaited.
    Perform,
}

/// Work launched by one reroute.
///
/// In perform mode the reroute returns as soon as the work is spawned.
/// Dropping the handle does not cancel anything; awaiting `settled` is only
/// for callers that want to observe completion.
#[derive(Debug)]
pub struct RerouteHandle {
    mode: RerouteMode,
    summary: ChangeSummary,
    tasks: Vec<(AppName, JoinHandle<Result<Arc<App>>>)>,
}

impl RerouteHandle {
    pub(crate) fn new(mode: RerouteMode, summary: ChangeSummary) -> Self {
        Self {
            mode,
            summary,
            tasks: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, app: AppName, task: JoinHandle<Result<Arc<App>>>) {
        self.tasks.push((app, task));
    }

    pub fn mode(&self) -> RerouteMode {
        self.mode
    }

    pub fn summary(&self) -> &ChangeSummary {
        &self.summary
    }

    /// Number of spawned per-app pipelines.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every pipeline, in launch order.
    pub async fn settled(self) -> Vec<Result<Arc<App>>> {
        let mut results = Vec::with_capacity(self.tasks.len());
        for (app, task) in self.tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(join_err) => Err(OrchestratorError::TaskPanicked {
                    app,
                    reason: join_err.to_string(),
                }),
            };
            results.push(result);
        }
        results
    }

    /// Wait for every pipeline and return the first failure.
    pub async fn wait(self) -> Result<()> {
        self.settled()
            .await
            .into_iter()
            .find_map(Result::err)
            .map_or(Ok(()), Err)
    }
}
