mod key;

pub use key::CapabilityKey;

use log::{debug, error, trace};
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{LocatorError, LocatorResult};

const TARGET: &str = "scopeloc::registry";

/// Erased service handle: always an `Arc<T>` boxed behind `dyn Any`.
type Erased = Arc<dyn Any + Send + Sync>;

struct Entry {
    key: CapabilityKey,
    value: Erased,
    seq: u64,
}

#[derive(Default)]
struct RegistryInner {
    map: HashMap<TypeId, Entry>,
    next_seq: u64,
}

impl RegistryInner {
    fn insert(&mut self, key: CapabilityKey, value: Erased) -> LocatorResult<()> {
        if self.map.contains_key(&key.type_id()) {
            error!(target: TARGET, "register rejected capability='{}' reason='duplicate'", key);
            return Err(LocatorError::DuplicateRegistration {
                capability: key.name(),
            });
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.map.insert(key.type_id(), Entry { key, value, seq });

        debug!(target: TARGET, "register capability='{}' seq={}", key, seq);
        Ok(())
    }
}

/// Type-keyed service storage owned by one scope.
///
/// At most one instance per capability. Lookups hand out clones of the
/// stored `Arc<T>`; nothing borrowed escapes the internal lock.
#[derive(Default)]
pub struct Registry {
    inner: Mutex<RegistryInner>,
}

impl Registry {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: ?Sized + Send + Sync + 'static>(&self, service: Arc<T>) -> LocatorResult<()> {
        let key = CapabilityKey::of::<T>();
        self.inner.lock().insert(key, Arc::new(service))
    }

    /// Registers an instance whose capability is only known at runtime.
    ///
    /// `service` must hold an `Arc<T>` matching `key`; anything else is
    /// rejected before the map is touched.
    pub fn register_erased(
        &self,
        key: CapabilityKey,
        service: Box<dyn Any + Send + Sync>,
    ) -> LocatorResult<()> {
        if !key.accepts(&*service) {
            error!(target: TARGET, "register rejected capability='{}' reason='type_mismatch'", key);
            return Err(LocatorError::TypeMismatch {
                capability: key.name(),
            });
        }

        self.inner.lock().insert(key, Arc::from(service))
    }

    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> LocatorResult<Arc<T>> {
        self.try_get::<T>().ok_or(LocatorError::NotRegistered {
            capability: std::any::type_name::<T>(),
        })
    }

    pub fn try_get<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let g = self.inner.lock();
        let found = g
            .map
            .get(&TypeId::of::<T>())
            .and_then(|e| e.value.downcast_ref::<Arc<T>>())
            .cloned();

        trace!(
            target: TARGET,
            "lookup capability='{}' hit={}",
            std::any::type_name::<T>(),
            found.is_some()
        );
        found
    }

    #[inline]
    pub fn contains<T: ?Sized + Send + Sync + 'static>(&self) -> bool {
        self.inner.lock().map.contains_key(&TypeId::of::<T>())
    }

    /// Removes a binding so the capability may be registered again.
    pub fn unregister<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let removed = self.inner.lock().map.remove(&TypeId::of::<T>())?;
        debug!(target: TARGET, "unregister capability='{}'", removed.key);
        removed.value.downcast_ref::<Arc<T>>().cloned()
    }

    /// Point-in-time copy of every binding, in registration order.
    pub fn all_registered(&self) -> Vec<RegisteredService> {
        let mut out: Vec<(u64, RegisteredService)> = {
            let g = self.inner.lock();
            g.map
                .values()
                .map(|e| {
                    (
                        e.seq,
                        RegisteredService {
                            key: e.key,
                            instance: e.value.clone(),
                        },
                    )
                })
                .collect()
        };

        out.sort_by_key(|(seq, _)| *seq);
        out.into_iter().map(|(_, s)| s).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.lock().map.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().map.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = self.inner.lock();
        f.debug_set().entries(g.map.values().map(|e| e.key)).finish()
    }
}

/// One entry of a registry snapshot.
#[derive(Clone)]
pub struct RegisteredService {
    key: CapabilityKey,
    instance: Erased,
}

impl RegisteredService {
    #[inline]
    pub fn key(&self) -> CapabilityKey {
        self.key
    }

    #[inline]
    pub fn downcast<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.instance.downcast_ref::<Arc<T>>().cloned()
    }
}

impl fmt::Debug for RegisteredService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredService").field("key", &self.key).finish()
    }
}
