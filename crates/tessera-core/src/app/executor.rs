//! LifecycleExecutor - 1 アプリの 1 フェーズを実行する
//!
//! 各フェーズは status で門番されている:
//! - 前提の status でなければ何もせずにアプリをそのまま返す
//! - 前提に合えば「実行中」の status に test-and-set してから関数を呼ぶ
//!
//! このおかげで同じフェーズを重複・並行に呼んでも安全になる。
//! load だけは status ではなく memoize された future で重複を防ぐ。
//!
//! 失敗したフェーズは status を実行中のまま残し、エラーを呼び出し元と
//! ErrorHook の両方に返す。自動リトライはしない。

use std::sync::Arc;

use futures::FutureExt;

use crate::domain::{
    App, AppStatus, Entry, LifecycleBundle, Lifecycles, OrchestratorError, Phase, Props, Result,
    validate,
};
use crate::ports::{ErrorHook, HostProvisioner, ModuleLoader};

#[derive(Clone)]
pub struct LifecycleExecutor {
    loader: Arc<dyn ModuleLoader>,
    provisioner: Arc<dyn HostProvisioner>,
    error_hook: Arc<dyn ErrorHook>,
}

impl LifecycleExecutor {
    pub fn new(
        loader: Arc<dyn ModuleLoader>,
        provisioner: Arc<dyn HostProvisioner>,
        error_hook: Arc<dyn ErrorHook>,
    ) -> Self {
        Self {
            loader,
            provisioner,
            error_hook,
        }
    }

    /// Load an app at most once.
    ///
    /// Concurrent callers share one in-flight load and observe the same result.
    /// Once the load has completed, further calls return immediately.
    pub async fn load(&self, app: &Arc<App>) -> Result<Arc<App>> {
        let pending = {
            let mut slot = app.pending_load().lock().await;
            if let Some(pending) = slot.clone() {
                pending
            } else {
                if app.is_loaded().await {
                    return Ok(Arc::clone(app));
                }
                let pending = self.clone().run_load(Arc::clone(app)).boxed().shared();
                *slot = Some(pending.clone());
                pending
            }
        };
        pending.await?;
        Ok(Arc::clone(app))
    }

    pub async fn bootstrap(&self, app: &Arc<App>) -> Result<Arc<App>> {
        self.run_phase(app, Phase::Bootstrap, None).await
    }

    pub async fn mount(&self, app: &Arc<App>) -> Result<Arc<App>> {
        self.run_phase(app, Phase::Mount, None).await
    }

    pub async fn unmount(&self, app: &Arc<App>) -> Result<Arc<App>> {
        self.run_phase(app, Phase::Unmount, None).await
    }

    /// Run the composed update of a mounted app with new props.
    pub async fn update(&self, app: &Arc<App>, props: Props) -> Result<Arc<App>> {
        self.run_phase(app, Phase::Update, Some(props)).await
    }

    /// load -> bootstrap -> mount
    pub async fn load_and_mount(&self, app: &Arc<App>) -> Result<Arc<App>> {
        let app = self.load(app).await?;
        self.bootstrap_and_mount(&app).await
    }

    /// bootstrap -> mount
    pub async fn bootstrap_and_mount(&self, app: &Arc<App>) -> Result<Arc<App>> {
        let app = self.bootstrap(app).await?;
        self.mount(&app).await
    }

    /// Move an app frozen by a failed phase back to that phase's precondition.
    pub async fn recover(&self, app: &Arc<App>) -> Result<AppStatus> {
        app.rollback().await
    }

    async fn run_load(self, app: Arc<App>) -> Result<()> {
        app.start_loading().await;
        match self.resolve(&app).await {
            Ok(()) => {
                app.pending_load().lock().await.take();
                tracing::debug!(app = %app.name(), "loaded");
                Ok(())
            }
            Err(err) => {
                app.mark_failed(Phase::Load).await;
                self.error_hook.on_error(app.name(), Phase::Load, &err);
                Err(err)
            }
        }
    }

    async fn resolve(&self, app: &App) -> Result<()> {
        let host = self.provisioner.provision(app).await?;
        let bundle = match app.entry() {
            Entry::Markup(reference) => self.loader.load(app, reference, &host).await,
            Entry::Factory(factory) => {
                let props = app.props().await;
                factory.create(&props).await.map(LifecycleBundle::from)
            }
        }
        .map_err(|source| OrchestratorError::Load {
            app: app.name().clone(),
            source,
        })?;
        validate(&bundle).map_err(|source| OrchestratorError::Validation {
            app: app.name().clone(),
            source,
        })?;
        app.complete_load(Lifecycles::compose(bundle), &host).await;
        Ok(())
    }

    async fn run_phase(
        &self,
        app: &Arc<App>,
        phase: Phase,
        props: Option<Props>,
    ) -> Result<Arc<App>> {
        let Some((lifecycles, props)) = app.begin(phase, props).await else {
            tracing::trace!(app = %app.name(), %phase, "precondition not met, skipping");
            return Ok(Arc::clone(app));
        };
        let composed = lifecycles.for_phase(phase).cloned().unwrap_or_default();
        match composed.run(&props).await {
            Ok(()) => {
                app.settle(phase).await;
                Ok(Arc::clone(app))
            }
            Err(source) => {
                app.mark_failed(phase).await;
                let err = OrchestratorError::Lifecycle {
                    app: app.name().clone(),
                    phase,
                    source,
                };
                self.error_hook.on_error(app.name(), phase, &err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppName, LifecycleExports, ValidationError};
    use crate::impls::{InMemoryHostProvisioner, StaticModuleLoader};
    use crate::testing::{
        Calls, FailingProvisioner, RecordingHook, app, factory_entry, failing, full_exports,
        mount_only_exports, path_prefix,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixture {
        executor: LifecycleExecutor,
        loader: Arc<StaticModuleLoader>,
        provisioner: Arc<InMemoryHostProvisioner>,
        hook: Arc<RecordingHook>,
    }

    fn fixture(loader: StaticModuleLoader) -> Fixture {
        let loader = Arc::new(loader);
        let provisioner = Arc::new(InMemoryHostProvisioner::new());
        let hook = Arc::new(RecordingHook::default());
        let executor = LifecycleExecutor::new(loader.clone(), provisioner.clone(), hook.clone());
        Fixture {
            executor,
            loader,
            provisioner,
            hook,
        }
    }

    #[tokio::test]
    async fn test_full_cycle() {
        let calls = Calls::new();
        let fx = fixture(StaticModuleLoader::new().with_exports("w.html", full_exports(&calls)));
        let app = app("widget", Entry::markup("w.html"), path_prefix("/"));

        let app = fx.executor.load(&app).await.unwrap();
        assert_eq!(app.status().await, AppStatus::NotBootstrapped);
        assert!(app.host().await.is_some());
        assert!(fx.provisioner.container(&AppName::new("widget")).await.is_some());

        let app = fx.executor.bootstrap(&app).await.unwrap();
        assert_eq!(app.status().await, AppStatus::NotMounted);
        let app = fx.executor.mount(&app).await.unwrap();
        assert_eq!(app.status().await, AppStatus::Mounted);
        let app = fx.executor.unmount(&app).await.unwrap();
        assert_eq!(app.status().await, AppStatus::NotMounted);

        assert_eq!(
            (calls.bootstrap(), calls.mount(), calls.unmount()),
            (1, 1, 1)
        );
    }

    #[tokio::test]
    async fn test_concurrent_loads_resolve_once() {
        let calls = Calls::new();
        let fx = fixture(StaticModuleLoader::new().with_exports("w.html", full_exports(&calls)));
        let app = app("widget", Entry::markup("w.html"), path_prefix("/"));

        let (a, b) = tokio::join!(fx.executor.load(&app), fx.executor.load(&app));
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(fx.loader.resolutions(), 1);
        assert_eq!(app.status().await, AppStatus::NotBootstrapped);

        // completed load is not repeated either
        fx.executor.load(&app).await.unwrap();
        assert_eq!(fx.loader.resolutions(), 1);
        assert!(app.pending_load().lock().await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_factory_loads_create_once() {
        let calls = Calls::new();
        let created = Arc::new(AtomicUsize::new(0));
        let fx = fixture(StaticModuleLoader::new());
        let app = app(
            "widget",
            factory_entry(full_exports(&calls), &created),
            path_prefix("/"),
        );

        let results = futures::future::join_all((0..4).map(|_| fx.executor.load(&app))).await;
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_phases_are_noops_out_of_order() {
        let calls = Calls::new();
        let fx = fixture(StaticModuleLoader::new().with_exports("w.html", full_exports(&calls)));
        let app = app("widget", Entry::markup("w.html"), path_prefix("/"));

        // nothing loaded yet
        for result in [
            fx.executor.bootstrap(&app).await,
            fx.executor.mount(&app).await,
            fx.executor.unmount(&app).await,
        ] {
            assert!(Arc::ptr_eq(&result.unwrap(), &app));
        }
        assert_eq!(app.status().await, AppStatus::NotLoaded);

        fx.executor.load(&app).await.unwrap();
        fx.executor.mount(&app).await.unwrap();
        fx.executor.unmount(&app).await.unwrap();
        assert_eq!(app.status().await, AppStatus::NotBootstrapped);
        assert_eq!((calls.mount(), calls.unmount()), (0, 0));

        fx.executor.bootstrap_and_mount(&app).await.unwrap();
        fx.executor.bootstrap(&app).await.unwrap();
        fx.executor.mount(&app).await.unwrap();
        assert_eq!(app.status().await, AppStatus::Mounted);
        assert_eq!((calls.bootstrap(), calls.mount()), (1, 1));
    }

    #[tokio::test]
    async fn test_missing_bootstrap_is_empty_sequence() {
        let calls = Calls::new();
        let created = Arc::new(AtomicUsize::new(0));
        let fx = fixture(StaticModuleLoader::new());
        let app = app(
            "widget",
            factory_entry(mount_only_exports(&calls), &created),
            path_prefix("/"),
        );

        fx.executor.load_and_mount(&app).await.unwrap();
        assert_eq!(app.status().await, AppStatus::Mounted);
        let lifecycles = app.lifecycles().await.unwrap();
        assert!(lifecycles.bootstrap.is_empty());
        assert!(lifecycles.update.is_empty());
        assert_eq!(calls.mount(), 1);
    }

    #[tokio::test]
    async fn test_invalid_exports_stay_loading() {
        let calls = Calls::new();
        let exports = LifecycleExports {
            unmount: None,
            ..mount_only_exports(&calls)
        };
        let fx = fixture(StaticModuleLoader::new().with_exports("w.html", exports));
        let app = app("widget", Entry::markup("w.html"), path_prefix("/"));

        let err = fx.executor.load(&app).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Validation {
                source: ValidationError::MissingLifecycle(Phase::Unmount),
                ..
            }
        ));
        assert_eq!(app.status().await, AppStatus::Loading);
        assert!(app.lifecycles().await.is_none());

        // the failed load stays memoized; calling again yields the same error
        let again = fx.executor.load(&app).await.unwrap_err();
        assert_eq!(again, err);
        assert_eq!(fx.loader.resolutions(), 1);
        assert_eq!(fx.hook.reported(), vec![(AppName::new("widget"), Phase::Load)]);
    }

    #[tokio::test]
    async fn test_unknown_entry_is_a_load_error() {
        let fx = fixture(StaticModuleLoader::new());
        let app = app("widget", Entry::markup("missing.html"), path_prefix("/"));

        let err = fx.executor.load(&app).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Load { .. }));
        assert_eq!(app.failed_phase().await, Some(Phase::Load));
    }

    #[tokio::test]
    async fn test_provisioning_failure_stays_loading() {
        let calls = Calls::new();
        let loader = Arc::new(StaticModuleLoader::new().with_exports("w.html", full_exports(&calls)));
        let hook = Arc::new(RecordingHook::default());
        let executor = LifecycleExecutor::new(loader.clone(), Arc::new(FailingProvisioner), hook);
        let app = app("widget", Entry::markup("w.html"), path_prefix("/"));

        let err = executor.load(&app).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Provision(_)));
        assert_eq!(app.status().await, AppStatus::Loading);
        assert_eq!(loader.resolutions(), 0);
    }

    #[tokio::test]
    async fn test_failed_mount_freezes_and_can_be_recovered() {
        let calls = Calls::new();
        let exports = full_exports(&calls).with_mount(failing("render error"));
        let fx = fixture(StaticModuleLoader::new().with_exports("w.html", exports));
        let app = app("widget", Entry::markup("w.html"), path_prefix("/"));

        let err = fx.executor.load_and_mount(&app).await.unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::Lifecycle { phase: Phase::Mount, .. }
        ));
        assert_eq!(app.status().await, AppStatus::Mounting);
        assert_eq!(fx.hook.reported(), vec![(AppName::new("widget"), Phase::Mount)]);

        // frozen: mount's precondition no longer matches
        fx.executor.mount(&app).await.unwrap();
        assert_eq!(app.status().await, AppStatus::Mounting);

        assert_eq!(fx.executor.recover(&app).await.unwrap(), AppStatus::NotMounted);
        assert!(fx.executor.recover(&app).await.is_err());
    }

    #[tokio::test]
    async fn test_recovered_load_runs_again() {
        let fx = fixture(StaticModuleLoader::new());
        let app = app("widget", Entry::markup("w.html"), path_prefix("/"));
        fx.executor.load(&app).await.unwrap_err();

        assert_eq!(fx.executor.recover(&app).await.unwrap(), AppStatus::NotLoaded);
        fx.executor.load(&app).await.unwrap_err();
        assert_eq!(fx.loader.resolutions(), 2);
    }

    #[tokio::test]
    async fn test_update_replaces_props_and_returns_to_mounted() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let update = {
            let seen = Arc::clone(&seen);
            crate::domain::LifecycleFn::new(move |props: Props| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.lock().unwrap().push(props);
                    Ok(())
                }
            })
        };
        let calls = Calls::new();
        let fx = fixture(
            StaticModuleLoader::new()
                .with_exports("w.html", mount_only_exports(&calls).with_update(update)),
        );
        let app = app("widget", Entry::markup("w.html"), path_prefix("/"));

        // not mounted yet: no-op
        fx.executor
            .update(&app, serde_json::json!({ "v": 1 }))
            .await
            .unwrap();
        assert!(seen.lock().unwrap().is_empty());

        fx.executor.load_and_mount(&app).await.unwrap();
        fx.executor
            .update(&app, serde_json::json!({ "v": 2 }))
            .await
            .unwrap();
        assert_eq!(app.status().await, AppStatus::Mounted);
        assert_eq!(*seen.lock().unwrap(), vec![serde_json::json!({ "v": 2 })]);
        assert_eq!(app.props().await, serde_json::json!({ "v": 2 }));
    }
}
