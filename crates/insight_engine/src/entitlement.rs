use std::sync::atomic::{AtomicBool, Ordering};

/// Capability gate deciding whether the caller may launch an analysis job.
pub trait EntitlementSource: Send + Sync {
    fn allows_analysis(&self) -> bool;
}

/// Runtime-updatable entitlement flag.
///
/// The development bypass is injected at construction rather than compiled
/// in, so release builds cannot ship with it enabled by accident.
#[derive(Debug)]
pub struct EntitlementFlag {
    entitled: AtomicBool,
    override_enabled: bool,
}

impl EntitlementFlag {
    pub fn new(entitled: bool) -> Self {
        Self::with_override(entitled, false)
    }

    pub fn with_override(entitled: bool, override_enabled: bool) -> Self {
        Self {
            entitled: AtomicBool::new(entitled),
            override_enabled,
        }
    }

    /// Updates the underlying subscription state, e.g. after a purchase.
    pub fn set_entitled(&self, entitled: bool) {
        self.entitled.store(entitled, Ordering::Relaxed);
    }
}

impl EntitlementSource for EntitlementFlag {
    fn allows_analysis(&self) -> bool {
        self.override_enabled || self.entitled.load(Ordering::Relaxed)
    }
}
