//! AppStatus - アプリのライフサイクル状態
//!
//! 状態遷移:
//! - NotLoaded -> Loading -> NotBootstrapped
//! - NotBootstrapped -> Bootstrapping -> NotMounted
//! - NotMounted -> Mounting -> Mounted
//! - Mounted -> Unmounting -> NotMounted
//! - Mounted -> Updating -> Mounted
//!
//! 終端状態はない（NotMounted と Mounted の間を行き来する）。

use std::fmt;

use serde::{Deserialize, Serialize};

/// App status. The single source of truth for which phase may run next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppStatus {
    NotLoaded,
    Loading,
    NotBootstrapped,
    Bootstrapping,
    NotMounted,
    Mounting,
    Mounted,
    Updating,
    /// Part of the status set, but no transition enters it.
    Updated,
    Unmounting,
}

impl AppStatus {
    pub const ALL: [AppStatus; 10] = [
        AppStatus::NotLoaded,
        AppStatus::Loading,
        AppStatus::NotBootstrapped,
        AppStatus::Bootstrapping,
        AppStatus::NotMounted,
        AppStatus::Mounting,
        AppStatus::Mounted,
        AppStatus::Updating,
        AppStatus::Updated,
        AppStatus::Unmounting,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppStatus::NotLoaded => "NOT_LOADED",
            AppStatus::Loading => "LOADING",
            AppStatus::NotBootstrapped => "NOT_BOOTSTRAPPED",
            AppStatus::Bootstrapping => "BOOTSTRAPPING",
            AppStatus::NotMounted => "NOT_MOUNTED",
            AppStatus::Mounting => "MOUNTING",
            AppStatus::Mounted => "MOUNTED",
            AppStatus::Updating => "UPDATING",
            AppStatus::Updated => "UPDATED",
            AppStatus::Unmounting => "UNMOUNTING",
        }
    }

    /// A phase is currently running (or failed while running).
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            AppStatus::Loading
                | AppStatus::Bootstrapping
                | AppStatus::Mounting
                | AppStatus::Updating
                | AppStatus::Unmounting
        )
    }

    /// Whether `self -> next` is an edge of the lifecycle graph.
    pub fn can_transition_to(self, next: AppStatus) -> bool {
        matches!(
            (self, next),
            (AppStatus::NotLoaded, AppStatus::Loading)
                | (AppStatus::Loading, AppStatus::NotBootstrapped)
                | (AppStatus::NotBootstrapped, AppStatus::Bootstrapping)
                | (AppStatus::Bootstrapping, AppStatus::NotMounted)
                | (AppStatus::NotMounted, AppStatus::Mounting)
                | (AppStatus::Mounting, AppStatus::Mounted)
                | (AppStatus::Mounted, AppStatus::Unmounting)
                | (AppStatus::Unmounting, AppStatus::NotMounted)
                | (AppStatus::Mounted, AppStatus::Updating)
                | (AppStatus::Updating, AppStatus::Mounted)
        )
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stage of an app's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Load,
    Bootstrap,
    Mount,
    Unmount,
    Update,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Load => "load",
            Phase::Bootstrap => "bootstrap",
            Phase::Mount => "mount",
            Phase::Unmount => "unmount",
            Phase::Update => "update",
        }
    }

    /// Status an app must be in for this phase to start.
    ///
    /// Load is gated by the pending-load memo rather than by status, but
    /// `NotLoaded` is where a recovered load starts over.
    pub fn precondition(self) -> AppStatus {
        match self {
            Phase::Load => AppStatus::NotLoaded,
            Phase::Bootstrap => AppStatus::NotBootstrapped,
            Phase::Mount => AppStatus::NotMounted,
            Phase::Unmount => AppStatus::Mounted,
            Phase::Update => AppStatus::Mounted,
        }
    }

    pub fn in_progress(self) -> AppStatus {
        match self {
            Phase::Load => AppStatus::Loading,
            Phase::Bootstrap => AppStatus::Bootstrapping,
            Phase::Mount => AppStatus::Mounting,
            Phase::Unmount => AppStatus::Unmounting,
            Phase::Update => AppStatus::Updating,
        }
    }

    pub fn settled(self) -> AppStatus {
        match self {
            Phase::Load => AppStatus::NotBootstrapped,
            Phase::Bootstrap => AppStatus::NotMounted,
            Phase::Mount => AppStatus::Mounted,
            Phase::Unmount => AppStatus::NotMounted,
            Phase::Update => AppStatus::Mounted,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
