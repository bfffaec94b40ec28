//! Status - アプリ状態の集計ビュー

use serde::{Deserialize, Serialize};

use crate::domain::{AppSnapshot, AppStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub not_loaded: usize,
    pub loading: usize,
    pub not_bootstrapped: usize,
    pub bootstrapping: usize,
    pub not_mounted: usize,
    pub mounting: usize,
    pub mounted: usize,
    pub updating: usize,
    pub updated: usize,
    pub unmounting: usize,
    /// Apps frozen by a failed phase.
    pub failed: usize,
    /// Apps with a phase still running.
    pub busy: usize,
}

impl StatusCounts {
    pub fn from_snapshots(snapshots: &[AppSnapshot]) -> Self {
        let mut counts = Self::default();
        for snapshot in snapshots {
            match snapshot.status {
                AppStatus::NotLoaded => counts.not_loaded += 1,
                AppStatus::Loading => counts.loading += 1,
                AppStatus::NotBootstrapped => counts.not_bootstrapped += 1,
                AppStatus::Bootstrapping => counts.bootstrapping += 1,
                AppStatus::NotMounted => counts.not_mounted += 1,
                AppStatus::Mounting => counts.mounting += 1,
                AppStatus::Mounted => counts.mounted += 1,
                AppStatus::Updating => counts.updating += 1,
                AppStatus::Updated => counts.updated += 1,
                AppStatus::Unmounting => counts.unmounting += 1,
            }
            if snapshot.failed_phase.is_some() {
                counts.failed += 1;
            } else if snapshot.status.is_in_progress() {
                counts.busy += 1;
            }
        }
        counts
    }

    /// No phase is running anywhere (failed apps count as settled).
    pub fn is_settled(&self) -> bool {
        self.busy == 0
    }
}
