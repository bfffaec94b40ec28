use ulid::Ulid;

use super::app::AppName;

/// Per-app rendering target produced by a host provisioner.
///
/// The provisioner owns the container; apps only keep a weak reference.
#[derive(Debug, PartialEq, Eq)]
pub struct HostContainer {
    id: Ulid,
    app: AppName,
}

impl HostContainer {
    pub fn new(app: AppName) -> Self {
        Self {
            id: Ulid::new(),
            app,
        }
    }

    pub fn id(&self) -> Ulid {
        self.id
    }

    /// Tag of the container; same as the owning app's name.
    pub fn app(&self) -> &AppName {
        &self.app
    }
}
