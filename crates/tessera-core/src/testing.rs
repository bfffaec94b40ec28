//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::domain::{
    ActivationRule, App, AppName, Entry, FnFactory, HostContainer, LifecycleError,
    LifecycleExports, LifecycleFn, LoadError, Location, OrchestratorError, Phase, ProvisionError,
};
use crate::ports::{ErrorHook, HostProvisioner};

/// Counts how many times each lifecycle function ran.
#[derive(Default)]
pub struct Calls {
    pub bootstrap: AtomicUsize,
    pub mount: AtomicUsize,
    pub unmount: AtomicUsize,
    pub update: AtomicUsize,
}

impl Calls {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn bootstrap(&self) -> usize {
        self.bootstrap.load(Ordering::SeqCst)
    }

    pub fn mount(&self) -> usize {
        self.mount.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) -> usize {
        self.unmount.load(Ordering::SeqCst)
    }

    pub fn update(&self) -> usize {
        self.update.load(Ordering::SeqCst)
    }
}

fn counting(calls: &Arc<Calls>, pick: fn(&Calls) -> &AtomicUsize) -> LifecycleFn {
    let calls = Arc::clone(calls);
    LifecycleFn::new(move |_props| {
        let calls = Arc::clone(&calls);
        async move {
            tokio::task::yield_now().await;
            pick(&calls).fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

pub fn failing(message: &'static str) -> LifecycleFn {
    LifecycleFn::new(move |_props| async move { Err(LifecycleError::new(message)) })
}

/// Exports with all four members counting into `calls`.
pub fn full_exports(calls: &Arc<Calls>) -> LifecycleExports {
    LifecycleExports::new()
        .with_bootstrap(counting(calls, |c| &c.bootstrap))
        .with_mount(counting(calls, |c| &c.mount))
        .with_unmount(counting(calls, |c| &c.unmount))
        .with_update(counting(calls, |c| &c.update))
}

/// Exports with only mount and unmount.
pub fn mount_only_exports(calls: &Arc<Calls>) -> LifecycleExports {
    LifecycleExports::new()
        .with_mount(counting(calls, |c| &c.mount))
        .with_unmount(counting(calls, |c| &c.unmount))
}

/// Factory entry returning `exports`; counts invocations in `created`.
pub fn factory_entry(exports: LifecycleExports, created: &Arc<AtomicUsize>) -> Entry {
    let created = Arc::clone(created);
    Entry::factory(FnFactory::new(move |_props| {
        let exports = exports.clone();
        let created = Arc::clone(&created);
        async move {
            tokio::task::yield_now().await;
            created.fetch_add(1, Ordering::SeqCst);
            Ok(exports)
        }
    }))
}

/// Factory entry whose load never finishes.
pub fn hanging_entry() -> Entry {
    Entry::factory(FnFactory::new(|_props| {
        std::future::pending::<Result<LifecycleExports, LoadError>>()
    }))
}

/// Lifecycle that blocks until `open` is called.
#[derive(Default)]
pub struct Gate {
    open: Notify,
    entered: AtomicUsize,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn lifecycle(self: &Arc<Self>) -> LifecycleFn {
        let gate = Arc::clone(self);
        LifecycleFn::new(move |_props| {
            let gate = Arc::clone(&gate);
            async move {
                gate.entered.fetch_add(1, Ordering::SeqCst);
                gate.open.notified().await;
                Ok(())
            }
        })
    }

    /// How many calls reached the gate.
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn open(&self) {
        self.open.notify_one();
    }

    pub async fn wait_entered(&self, n: usize) {
        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while self.entered() < n {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("lifecycle never reached the gate");
    }
}

pub fn path_prefix(prefix: &'static str) -> Arc<dyn ActivationRule> {
    Arc::new(move |location: &Location| location.pathname().starts_with(prefix))
}

pub fn app(name: &str, entry: Entry, rule: Arc<dyn ActivationRule>) -> Arc<App> {
    Arc::new(App::new(
        AppName::new(name),
        entry,
        rule,
        serde_json::json!({ "name": name }),
    ))
}

pub fn location(href: &str) -> Location {
    Location::parse(href).unwrap()
}

/// Remembers every reported failure.
#[derive(Default)]
pub struct RecordingHook {
    pub errors: Mutex<Vec<(AppName, Phase)>>,
}

impl RecordingHook {
    pub fn reported(&self) -> Vec<(AppName, Phase)> {
        self.errors.lock().unwrap().clone()
    }
}

impl ErrorHook for RecordingHook {
    fn on_error(&self, app: &AppName, phase: Phase, _error: &OrchestratorError) {
        self.errors.lock().unwrap().push((app.clone(), phase));
    }
}

pub struct FailingProvisioner;

#[async_trait]
impl HostProvisioner for FailingProvisioner {
    async fn provision(&self, app: &App) -> Result<Arc<HostContainer>, ProvisionError> {
        Err(ProvisionError {
            app: app.name().clone(),
            reason: "no document".into(),
        })
    }
}
