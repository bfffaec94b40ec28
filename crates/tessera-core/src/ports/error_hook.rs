//! ErrorHook port - フェーズ失敗の通知先

use crate::domain::{AppName, OrchestratorError, Phase};

/// Process-wide sink for phase failures.
///
/// Called once per failure, in addition to the error being returned to
/// whoever started the reroute.
pub trait ErrorHook: Send + Sync {
    fn on_error(&self, app: &AppName, phase: Phase, error: &OrchestratorError);
}
