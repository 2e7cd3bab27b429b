//! # Inheritance
//!
//! Two kinds of inheritance shape a configuration before placeholders are
//! resolved:
//!
//! - [`config`]: scoped configuration flows down the environment tree
//!   (environment, tenants, nodes, node roles, node role variants), each
//!   level merged over its parent's merged map.
//! - [`role`]: roles inherit configuration, variants and files from their
//!   super-roles, producing a [`RoleChain`].
//!
//! Both work on owned copies; the definitions passed in are never modified.

pub mod config;
pub mod role;

use crate::value::ConfigMap;

pub use config::{inherit_config, resolve_environment};
pub use role::{resolve_role, RoleChain, MAX_INHERITANCE_DEPTH};

/// A definition node that owns a configuration map.
///
/// Implementors enumerate their children so the inheritance walk can reach
/// every level of a heterogeneous tree.
pub trait Configurable {
    /// Human-readable node kind, used in log messages.
    fn kind(&self) -> &'static str;

    fn name(&self) -> &str;

    fn config(&self) -> &ConfigMap;

    fn config_mut(&mut self) -> &mut ConfigMap;

    /// Direct children that inherit this node's merged configuration.
    fn children_mut(&mut self) -> Vec<&mut dyn Configurable> {
        Vec::new()
    }
}
