//! Lifecycle - ライフサイクル関数の型
//!
//! - **LifecycleFn**: props を受け取る非同期関数 1 つ
//! - **LifecycleExports**: factory が返す、省略可能なフェーズ関数の集合
//! - **LifecycleBundle**: フェーズごとの関数列（正規化済み）
//! - **ComposedLifecycle**: 関数列を順番に実行する 1 つの呼び出し可能オブジェクト
//! - **Lifecycles**: ロード完了時に一度だけ組み立てられる 4 フェーズ分の ComposedLifecycle

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use super::errors::{LifecycleError, LoadError, ValidationError};
use super::status::Phase;

/// Configuration handed to every lifecycle call.
pub type Props = serde_json::Value;

pub type LifecycleFuture = BoxFuture<'static, Result<(), LifecycleError>>;

/// A single async lifecycle function taking `props`.
#[derive(Clone)]
pub struct LifecycleFn(Arc<dyn Fn(Props) -> LifecycleFuture + Send + Sync>);

impl LifecycleFn {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Props) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), LifecycleError>> + Send + 'static,
    {
        Self(Arc::new(move |props| f(props).boxed()))
    }

    pub async fn call(&self, props: Props) -> Result<(), LifecycleError> {
        (self.0)(props).await
    }
}

impl fmt::Debug for LifecycleFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LifecycleFn")
    }
}

/// What an app module exports. Every member is optional at the type level;
/// `validate` decides which ones are required.
#[derive(Debug, Clone, Default)]
pub struct LifecycleExports {
    pub bootstrap: Option<LifecycleFn>,
    pub mount: Option<LifecycleFn>,
    pub unmount: Option<LifecycleFn>,
    pub update: Option<LifecycleFn>,
}

impl LifecycleExports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bootstrap(mut self, f: LifecycleFn) -> Self {
        self.bootstrap = Some(f);
        self
    }

    pub fn with_mount(mut self, f: LifecycleFn) -> Self {
        self.mount = Some(f);
        self
    }

    pub fn with_unmount(mut self, f: LifecycleFn) -> Self {
        self.unmount = Some(f);
        self
    }

    pub fn with_update(mut self, f: LifecycleFn) -> Self {
        self.update = Some(f);
        self
    }
}

/// Normalized lifecycle: each slot is an ordered sequence of functions.
#[derive(Debug, Clone, Default)]
pub struct LifecycleBundle {
    pub bootstrap: Vec<LifecycleFn>,
    pub mount: Vec<LifecycleFn>,
    pub unmount: Vec<LifecycleFn>,
    pub update: Vec<LifecycleFn>,
}

impl From<LifecycleExports> for LifecycleBundle {
    fn from(exports: LifecycleExports) -> Self {
        Self {
            bootstrap: exports.bootstrap.into_iter().collect(),
            mount: exports.mount.into_iter().collect(),
            unmount: exports.unmount.into_iter().collect(),
            update: exports.update.into_iter().collect(),
        }
    }
}

/// Structural check done once, at the loader boundary.
///
/// `mount` and `unmount` are required; `bootstrap` and `update` may be empty.
pub fn validate(bundle: &LifecycleBundle) -> Result<(), ValidationError> {
    if bundle.mount.is_empty() {
        return Err(ValidationError::MissingLifecycle(Phase::Mount));
    }
    if bundle.unmount.is_empty() {
        return Err(ValidationError::MissingLifecycle(Phase::Unmount));
    }
    Ok(())
}

/// Runs its steps strictly in sequence; each starts after the previous settles.
/// Stops at the first failure.
#[derive(Debug, Clone, Default)]
pub struct ComposedLifecycle {
    steps: Vec<LifecycleFn>,
}

impl ComposedLifecycle {
    pub fn compose(steps: Vec<LifecycleFn>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub async fn run(&self, props: &Props) -> Result<(), LifecycleError> {
        for step in &self.steps {
            step.call(props.clone()).await?;
        }
        Ok(())
    }
}

/// The four composed callables of a loaded app.
#[derive(Debug, Clone)]
pub struct Lifecycles {
    pub bootstrap: ComposedLifecycle,
    pub mount: ComposedLifecycle,
    pub unmount: ComposedLifecycle,
    pub update: ComposedLifecycle,
}

impl Lifecycles {
    pub fn compose(bundle: LifecycleBundle) -> Self {
        Self {
            bootstrap: ComposedLifecycle::compose(bundle.bootstrap),
            mount: ComposedLifecycle::compose(bundle.mount),
            unmount: ComposedLifecycle::compose(bundle.unmount),
            update: ComposedLifecycle::compose(bundle.update),
        }
    }

    /// Load has no composed callable.
    pub fn for_phase(&self, phase: Phase) -> Option<&ComposedLifecycle> {
        match phase {
            Phase::Load => None,
            Phase::Bootstrap => Some(&self.bootstrap),
            Phase::Mount => Some(&self.mount),
            Phase::Unmount => Some(&self.unmount),
            Phase::Update => Some(&self.update),
        }
    }
}

/// Factory entry reference: invoked with the app's props to obtain its exports.
#[async_trait]
pub trait AppFactory: Send + Sync {
    async fn create(&self, props: &Props) -> Result<LifecycleExports, LoadError>;
}

/// Adapts an async closure into an [`AppFactory`].
pub struct FnFactory<F>(F);

impl<F> FnFactory<F> {
    pub fn new<Fut>(f: F) -> Self
    where
        F: Fn(Props) -> Fut + Send + Sync,
        Fut: Future<Output = Result<LifecycleExports, LoadError>> + Send,
    {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> AppFactory for FnFactory<F>
where
    F: Fn(Props) -> Fut + Send + Sync,
    Fut: Future<Output = Result<LifecycleExports, LoadError>> + Send,
{
    async fn create(&self, props: &Props) -> Result<LifecycleExports, LoadError> {
        (self.0)(props.clone()).await
    }
}
