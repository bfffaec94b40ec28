//! Domain model (app, status, location, lifecycle, events, errors).

pub mod activation;
pub mod app;
pub mod errors;
pub mod events;
pub mod host;
pub mod lifecycle;
pub mod location;
pub mod status;

pub use self::activation::{ActivationRule, ActiveWhen};
pub use self::app::{App, AppName, AppSnapshot, Entry};
pub use self::errors::{
    LifecycleError, LoadError, OrchestratorError, ProvisionError, Result, ValidationError,
};
pub use self::events::{EventKind, HostEvent};
pub use self::host::HostContainer;
pub use self::lifecycle::{
    AppFactory, ComposedLifecycle, FnFactory, LifecycleBundle, LifecycleExports, LifecycleFn,
    Lifecycles, Props, validate,
};
pub use self::location::Location;
pub use self::status::{AppStatus, Phase};
