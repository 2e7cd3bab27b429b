//! Role inheritance
//!
//! A role may inherit from one or more super-roles. Resolving a role
//! produces the chain of every role involved, most ancestral first, each
//! entry an owned copy carrying its own fully inherited state:
//!
//! - configuration: super-role configuration merged under the role's own
//!   (with several super-roles, the first listed wins)
//! - variants: the role's own variants, each merged over the same-named
//!   variant of its super-roles
//! - files: the role's own files (prefixed with its template directory)
//!   followed by the super-roles' files, without duplicate templates

use std::collections::{BTreeMap, HashSet};

use log::debug;

use crate::error::{Error, Result};
use crate::merge::merge;
use crate::model::{Role, RoleFile};
use crate::suggestions::{available, did_you_mean};
use crate::value::ConfigMap;

/// Maximum inheritance depth before a cycle is assumed.
pub const MAX_INHERITANCE_DEPTH: usize = 20;

/// Resolved roles, most ancestral first, the requested role last.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleChain {
    roles: Vec<Role>,
}

impl RoleChain {
    pub fn iter(&self) -> std::slice::Iter<'_, Role> {
        self.roles.iter()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }

    /// The fully resolved role the chain was requested for.
    pub fn target(&self) -> Option<&Role> {
        self.roles.last()
    }

    fn contains(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name == name)
    }

    fn push(&mut self, role: Role) {
        if !self.contains(&role.name) {
            self.roles.push(role);
        }
    }
}

impl IntoIterator for RoleChain {
    type Item = Role;
    type IntoIter = std::vec::IntoIter<Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.roles.into_iter()
    }
}

impl<'a> IntoIterator for &'a RoleChain {
    type Item = &'a Role;
    type IntoIter = std::slice::Iter<'a, Role>;

    fn into_iter(self) -> Self::IntoIter {
        self.roles.iter()
    }
}

/// Resolve the inheritance chain of role `name`.
///
/// `context` names where the role is referenced from (environment, node)
/// and is carried into every error.
pub fn resolve_role(name: &str, context: &str, roles: &BTreeMap<String, Role>) -> Result<RoleChain> {
    let mut chain = RoleChain::default();
    resolve_into(name, context, roles, 0, &mut chain)?;
    debug!("Resolved role '{}' to chain [{}]", name, chain.names().join(", "));
    Ok(chain)
}

fn resolve_into(
    name: &str,
    context: &str,
    roles: &BTreeMap<String, Role>,
    level: usize,
    chain: &mut RoleChain,
) -> Result<Role> {
    if level > MAX_INHERITANCE_DEPTH {
        return Err(Error::CyclicInheritance {
            role: name.to_string(),
            context: context.to_string(),
        });
    }

    let definition = roles.get(name).ok_or_else(|| Error::RoleNotFound {
        role: name.to_string(),
        context: context.to_string(),
        hint: did_you_mean(name, roles.keys().map(String::as_str))
            .or_else(|| available("roles", roles.keys().map(String::as_str))),
    })?;

    let mut role = definition.clone();
    if let Some(dir) = definition.template_dir.as_deref() {
        for file in &mut role.files {
            file.template = prefixed(dir, &file.template);
        }
    }

    if role.inherits.is_empty() {
        chain.push(role.clone());
        return Ok(role);
    }

    let super_context = format!("{}, inherited by role '{}'", context, name);
    let mut supers = Vec::with_capacity(role.inherits.len());
    for inherit in &definition.inherits {
        let resolved = resolve_into(&inherit.role, &super_context, roles, level + 1, chain)?;
        check_variants(&role, &resolved, context)?;
        supers.push(resolved);
    }

    // first-listed super-role wins, so fold from the last one
    let inherited = supers
        .iter()
        .rev()
        .fold(ConfigMap::new(), |acc, parent| merge(Some(&acc), Some(&parent.config)));
    role.config = merge(Some(&inherited), Some(&role.config));

    for variant in &mut role.variants {
        let inherited = supers
            .iter()
            .rev()
            .filter_map(|parent| parent.variant(&variant.name))
            .fold(ConfigMap::new(), |acc, parent| merge(Some(&acc), Some(&parent.config)));
        variant.config = merge(Some(&inherited), Some(&variant.config));
    }

    let mut seen: HashSet<String> = HashSet::new();
    let own_files = std::mem::take(&mut role.files);
    role.files = own_files
        .into_iter()
        .chain(supers.iter().flat_map(|parent| parent.files.iter().cloned()))
        .filter(|file| seen.insert(file.template.clone()))
        .collect::<Vec<RoleFile>>();

    chain.push(role.clone());
    Ok(role)
}

/// Every variant of `parent` must also be declared by `role`.
fn check_variants(role: &Role, parent: &Role, context: &str) -> Result<()> {
    let missing: Vec<String> = parent
        .variant_names()
        .filter(|name| role.variant(name).is_none())
        .map(|name| format!("'{}'", name))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::VariantMismatch {
            role: role.name.clone(),
            super_role: parent.name.clone(),
            missing: missing.join(", "),
            context: context.to_string(),
        })
    }
}

fn prefixed(dir: &str, template: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        template.to_string()
    } else {
        format!("{}/{}", dir, template.trim_start_matches('/'))
    }
}
