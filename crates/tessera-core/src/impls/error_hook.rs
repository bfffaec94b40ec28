use crate::domain::{AppName, OrchestratorError, Phase};
use crate::ports::ErrorHook;

/// Default hook: logs every failure at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingErrorHook;

impl ErrorHook for TracingErrorHook {
    fn on_error(&self, app: &AppName, phase: Phase, error: &OrchestratorError) {
        tracing::error!(%app, %phase, %error, "lifecycle phase failed");
    }
}
