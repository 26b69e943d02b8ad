use std::sync::{
    Arc, Mutex, PoisonError,
    atomic::{AtomicUsize, Ordering},
};

use frida_core::{DeviceType, Error};
use indexmap::IndexMap;

use crate::failure::{FailureInjector, Operation};

/// Call counters of a [`MockEngine`] and everything it created.
///
/// [`MockEngine`]: crate::MockEngine
#[derive(Debug, Default)]
pub struct Counters {
    managers_created: AtomicUsize,
    enumerations: AtomicUsize,
    attaches: AtomicUsize,
    selinux_patches: AtomicUsize,
    type_lookups: Mutex<IndexMap<DeviceType, usize>>,
    id_lookups: Mutex<IndexMap<String, usize>>,
}

impl Counters {
    /// Number of device managers created.
    pub fn managers_created(&self) -> usize {
        self.managers_created.load(Ordering::SeqCst)
    }

    /// Number of `enumerate_devices` calls, failed ones included.
    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    /// Number of `attach` calls, failed ones included.
    pub fn attaches(&self) -> usize {
        self.attaches.load(Ordering::SeqCst)
    }

    /// Number of `patch_android_selinux` calls.
    pub fn selinux_patches(&self) -> usize {
        self.selinux_patches.load(Ordering::SeqCst)
    }

    /// Number of `device_by_type` calls for `kind`.
    pub fn type_lookups(&self, kind: DeviceType) -> usize {
        let lookups = self.type_lookups.lock().unwrap_or_else(PoisonError::into_inner);
        lookups.get(&kind).copied().unwrap_or(0)
    }

    /// Number of `device_by_id` calls for `id`.
    pub fn id_lookups(&self, id: &str) -> usize {
        let lookups = self.id_lookups.lock().unwrap_or_else(PoisonError::into_inner);
        lookups.get(id).copied().unwrap_or(0)
    }

    /// Total number of `device_by_type` and `device_by_id` calls.
    pub fn total_lookups(&self) -> usize {
        let by_type = self.type_lookups.lock().unwrap_or_else(PoisonError::into_inner);
        let by_id = self.id_lookups.lock().unwrap_or_else(PoisonError::into_inner);
        by_type.values().sum::<usize>() + by_id.values().sum::<usize>()
    }

    pub(crate) fn manager_created(&self) {
        self.managers_created.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn enumerated(&self) {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn attached(&self) {
        self.attaches.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn selinux_patched(&self) {
        self.selinux_patches.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn looked_up_type(&self, kind: DeviceType) {
        let mut lookups = self.type_lookups.lock().unwrap_or_else(PoisonError::into_inner);
        *lookups.entry(kind).or_default() += 1;
    }

    pub(crate) fn looked_up_id(&self, id: &str) {
        let mut lookups = self.id_lookups.lock().unwrap_or_else(PoisonError::into_inner);
        *lookups.entry(id.to_owned()).or_default() += 1;
    }
}

/// State shared between an engine, its managers and their devices.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub counters: Arc<Counters>,
    failures: Mutex<FailureInjector>,
}

impl Shared {
    pub fn failures(&self) -> std::sync::MutexGuard<'_, FailureInjector> {
        self.failures.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the injected error for `op`, if the call should fail.
    pub fn check(&self, op: &Operation) -> Result<(), Error> {
        match self.failures().check(op) {
            Some(err) => {
                tracing::debug!(?op, %err, "injected failure");
                Err(err)
            }
            None => Ok(()),
        }
    }
}
