#![forbid(unsafe_code)]

//! Hierarchical service registry.
//!
//! Services are registered per scope and resolved by capability type, walking
//! from a starting scope through enclosing scopes, the scene scope and finally
//! the global scope. Host environments plug in through [`HostTopology`].

pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod registry;
pub mod scope;
pub mod services;

pub use crate::config::LocatorConfig;
pub use crate::error::{LocatorError, LocatorResult};
pub use crate::events::{ScopeEvent, ScopeEvents};
pub use crate::host::{HostNodeId, HostTopology, MemoryHost, SceneId, ScopeLifecycle};
pub use crate::registry::{CapabilityKey, RegisteredService, Registry};
pub use crate::scope::{
    BootstrapOutcome, BootstrapRole, BootstrapState, Bootstrapper, GlobalRole, SceneRole, ScopeId,
    ScopeNode, ScopeTree,
};
pub use crate::services::{DefaultServices, Services};
