use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Identity of a capability.
///
/// `T` may be unsized, so `dyn Trait` is the usual capability: instances are
/// always stored as `Arc<T>`. Generic and type-erased registration both derive
/// their map key from here.
#[derive(Clone, Copy)]
pub struct CapabilityKey {
    id: TypeId,
    name: &'static str,
    accepts: fn(&(dyn Any + Send + Sync)) -> bool,
}

fn accepts_arc<T: ?Sized + Send + Sync + 'static>(value: &(dyn Any + Send + Sync)) -> bool {
    value.is::<Arc<T>>()
}

impl CapabilityKey {
    #[inline]
    pub fn of<T: ?Sized + Send + Sync + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            accepts: accepts_arc::<T>,
        }
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// True when `value` holds an `Arc<T>` for this capability.
    #[inline]
    pub fn accepts(&self, value: &(dyn Any + Send + Sync)) -> bool {
        (self.accepts)(value)
    }
}

impl PartialEq for CapabilityKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CapabilityKey {}

impl Hash for CapabilityKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CapabilityKey").field(&self.name).finish()
    }
}

impl fmt::Display for CapabilityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
