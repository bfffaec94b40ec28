//! Errors - エラー型と分類
//!
//! 分類:
//! - Validation: ロードしたモジュールのライフサイクル形状が不正
//! - Provision: ホストコンテナの作成に失敗
//! - Lifecycle: bootstrap/mount/unmount/update の実行に失敗
//! - DuplicateApp: 同名アプリの二重登録
//!
//! memoize されたロード結果を複数の呼び出し元で共有するため、すべて `Clone`。

use thiserror::Error;

use super::app::AppName;
use super::status::{AppStatus, Phase};

/// Failure reported by an app's own lifecycle function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LifecycleError {
    message: String,
}

impl LifecycleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A lifecycle bundle is missing a required member.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("lifecycle `{0}` is required but was not exported")]
    MissingLifecycle(Phase),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host container for `{app}` could not be provisioned: {reason}")]
pub struct ProvisionError {
    pub app: AppName,
    pub reason: String,
}

/// Resolving an entry reference into lifecycle functions failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("entry `{0}` is not known to the module loader")]
    UnknownEntry(String),

    #[error("failed to resolve entry `{entry}`: {reason}")]
    Resolve { entry: String, reason: String },

    #[error("app factory failed: {0}")]
    Factory(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    #[error("app `{0}` is already registered")]
    DuplicateApp(AppName),

    #[error("app `{0}` is not registered")]
    UnknownApp(AppName),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("loading `{app}` failed: {source}")]
    Load {
        app: AppName,
        #[source]
        source: LoadError,
    },

    #[error("`{app}` exported an invalid lifecycle: {source}")]
    Validation {
        app: AppName,
        #[source]
        source: ValidationError,
    },

    #[error("{phase} of `{app}` failed: {source}")]
    Lifecycle {
        app: AppName,
        phase: Phase,
        #[source]
        source: LifecycleError,
    },

    #[error("`{app}` has no failed phase to recover from (status={status})")]
    NotRecoverable { app: AppName, status: AppStatus },

    #[error("invalid url `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("lifecycle task for `{app}` panicked: {reason}")]
    TaskPanicked { app: AppName, reason: String },
}

impl OrchestratorError {
    /// The app the failure belongs to, if any.
    pub fn app(&self) -> Option<&AppName> {
        match self {
            OrchestratorError::DuplicateApp(app) | OrchestratorError::UnknownApp(app) => Some(app),
            OrchestratorError::Provision(err) => Some(&err.app),
            OrchestratorError::Load { app, .. }
            | OrchestratorError::Validation { app, .. }
            | OrchestratorError::Lifecycle { app, .. }
            | OrchestratorError::NotRecoverable { app, .. }
            | OrchestratorError::TaskPanicked { app, .. } => Some(app),
            OrchestratorError::InvalidUrl { .. } => None,
        }
    }
}

pub type Result<T, E = OrchestratorError> = std::result::Result<T, E>;
