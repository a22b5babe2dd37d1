mod bootstrap;
mod node;
mod state;
mod tree;

pub use bootstrap::{BootstrapOutcome, BootstrapRole, BootstrapState, Bootstrapper, GlobalRole, SceneRole};
pub use node::{ScopeId, ScopeNode};
pub use tree::ScopeTree;
