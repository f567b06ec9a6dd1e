//! The context every query and mutation runs against.

use std::iter;

use log::{debug, warn};

use crate::UnitId;
use crate::backend::{Backend, StaticBackend};
use crate::error::{CpufreqError, Result};
use crate::privilege::Principal;
use crate::registry::Registry;

/// Owns the unit registry, the backend collaborator, and the caller's principal.
///
/// There is no internal locking: mutations take `&mut self`, so sharing a
/// controller across threads needs a caller-chosen mutex.
pub struct Controller<B = StaticBackend> {
    pub(crate) registry: Registry,
    pub(crate) backend: B,
    principal: Principal,
}

impl<B: Backend> Controller<B> {
    pub fn new(registry: Registry, backend: B, principal: Principal) -> Self {
        Self {
            registry,
            backend,
            principal,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn principal(&self) -> Principal {
        self.principal
    }

    pub fn exists(&self, id: UnitId) -> bool {
        self.registry.exists(id)
    }

    /// Iterate over every managed unit id, in order.
    pub fn units(&self) -> Units<'_> {
        Units {
            registry: &self.registry,
            next_id: 0,
        }
    }

    pub(crate) fn check_bounds(&self, id: UnitId) -> Result<()> {
        if self.registry.exists(id) {
            Ok(())
        } else {
            debug!("unit {id} out of range (capacity {})", self.registry.capacity());
            Err(CpufreqError::NotFound { id })
        }
    }

    pub(crate) fn require_elevated(&self, op: &str, id: UnitId) -> Result<()> {
        if self.principal.is_elevated() {
            Ok(())
        } else {
            warn!("permission denied: {op} on unit {id} by {:?}", self.principal);
            Err(CpufreqError::PermissionDenied)
        }
    }
}

impl Controller<StaticBackend> {
    /// Reference registry and static backend, acting as the current process.
    pub fn reference() -> Self {
        let registry = Registry::reference();
        let backend = StaticBackend::reference(registry.capacity());
        Self::new(registry, backend, Principal::current())
    }
}

/// Iterator over the unit ids of a registry.
pub struct Units<'a> {
    registry: &'a Registry,
    next_id: UnitId,
}

impl iter::Iterator for Units<'_> {
    type Item = UnitId;

    fn next(&mut self) -> Option<Self::Item> {
        let current_id = self.next_id;
        if !self.registry.exists(current_id) {
            return None;
        }
        self.next_id += 1;
        Some(current_id)
    }
}
