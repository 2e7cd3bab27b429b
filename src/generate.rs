//! # Generation Planning
//!
//! Turns an environment and a role catalog into one [`ResolvedUnit`] per
//! node, role and selected variant. Each unit carries the fully resolved
//! configuration that a template renderer would receive, the context
//! variables injected for it, and the files it generates.
//!
//! ## Steps per unit
//!
//! 1. Environment inheritance ([`resolve_environment`])
//! 2. Role inheritance ([`resolve_role`])
//! 3. Merge role, role variant, node role and node role variant
//!    configuration (later wins)
//! 4. Reject author keys that collide with reserved names, then inject the
//!    context variables
//! 5. Resolve placeholders, strip leftover merge tokens and split the
//!    context variables back out
//!
//! Nodes are planned in parallel; the output order always follows the
//! definition order of nodes, node roles and variants.

use std::collections::BTreeMap;

use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::inheritance::{resolve_environment, resolve_role};
use crate::interpolate::{Interpolator, ResolverOptions, INDEX_KEY, ITEM_KEY};
use crate::merge::{merge, split_map, strip_merge_tokens};
use crate::model::{Environment, Node, NodeRole, Role, RoleFile};
use crate::value::{ConfigMap, ConfigValue};
use crate::variables::ProviderRegistry;

pub const ENV_KEY: &str = "_env";
pub const NODE_KEY: &str = "_node";
pub const ROLE_KEY: &str = "_role";
pub const VARIANT_KEY: &str = "_variant";
pub const VARIANTS_KEY: &str = "_variants";
pub const VERSION_KEY: &str = "_version";
pub const TENANTS_KEY: &str = "_tenants";
pub const TENANTS_BY_ROLE_KEY: &str = "_tenantsByRole";

/// Names injected as context variables.
pub const CONTEXT_KEYS: &[&str] = &[
    ENV_KEY,
    NODE_KEY,
    ROLE_KEY,
    VARIANT_KEY,
    VARIANTS_KEY,
    VERSION_KEY,
    TENANTS_KEY,
    TENANTS_BY_ROLE_KEY,
];

/// Names authors may not define at the root of a configuration.
pub fn is_reserved(key: &str) -> bool {
    CONTEXT_KEYS.contains(&key) || key == ITEM_KEY || key == INDEX_KEY
}

/// The resolved output for one node, role and variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedUnit {
    pub node: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    pub files: Vec<RoleFile>,
    /// Resolved configuration without context variables
    pub config: ConfigMap,
    /// Resolved context variables
    pub context: ConfigMap,
}

/// Selects which part of an environment to plan.
#[derive(Debug, Clone, Default)]
pub struct PlanFilter {
    pub node: Option<String>,
    pub role: Option<String>,
}

impl PlanFilter {
    fn node(&self, node: &Node) -> bool {
        self.node.as_ref().is_none_or(|n| *n == node.name)
    }

    fn role(&self, node_role: &NodeRole) -> bool {
        self.role.as_ref().is_none_or(|r| *r == node_role.role)
    }
}

/// Plan every unit of `env`.
pub fn plan(
    env: &Environment,
    roles: &BTreeMap<String, Role>,
    providers: &ProviderRegistry,
    options: ResolverOptions,
) -> Result<Vec<ResolvedUnit>> {
    plan_filtered(env, roles, providers, options, &PlanFilter::default())
}

/// Plan the units of `env` selected by `filter`.
pub fn plan_filtered(
    env: &Environment,
    roles: &BTreeMap<String, Role>,
    providers: &ProviderRegistry,
    options: ResolverOptions,
    filter: &PlanFilter,
) -> Result<Vec<ResolvedUnit>> {
    if let Some(name) = &filter.node {
        if env.node(name).is_none() {
            return Err(Error::InvalidConfig {
                message: format!("Node '{}' not found in environment '{}'", name, env.name),
            });
        }
    }

    let engine = Interpolator::new(providers, options)?;
    let env = resolve_environment(env);
    let shared = shared_context(&env);

    let per_node = env
        .nodes
        .par_iter()
        .filter(|node| filter.node(node))
        .map(|node| plan_node(&env, node, roles, &engine, &shared, filter))
        .collect::<Result<Vec<_>>>()?;

    let units: Vec<ResolvedUnit> = per_node.into_iter().flatten().collect();
    info!("Planned {} unit(s) for environment '{}'", units.len(), env.name);
    Ok(units)
}

/// Context variables common to every unit of an environment.
fn shared_context(env: &Environment) -> ConfigMap {
    let mut context = ConfigMap::new();
    context.insert(ENV_KEY.to_string(), ConfigValue::from(env.name.as_str()));
    context.insert(
        VERSION_KEY.to_string(),
        env.version.as_deref().map(ConfigValue::from).unwrap_or_default(),
    );

    let tenants: ConfigMap = env
        .tenants
        .iter()
        .map(|t| (t.name.clone(), ConfigValue::Map(t.config.clone())))
        .collect();
    context.insert(TENANTS_KEY.to_string(), ConfigValue::Map(tenants));

    let mut by_role: BTreeMap<String, Vec<ConfigValue>> = BTreeMap::new();
    for tenant in &env.tenants {
        for role in &tenant.roles {
            by_role
                .entry(role.clone())
                .or_default()
                .push(ConfigValue::from(tenant.name.as_str()));
        }
    }
    let by_role: ConfigMap = by_role
        .into_iter()
        .map(|(role, tenants)| (role, ConfigValue::List(tenants)))
        .collect();
    context.insert(TENANTS_BY_ROLE_KEY.to_string(), ConfigValue::Map(by_role));

    context
}

fn plan_node(
    env: &Environment,
    node: &Node,
    roles: &BTreeMap<String, Role>,
    engine: &Interpolator<'_>,
    shared: &ConfigMap,
    filter: &PlanFilter,
) -> Result<Vec<ResolvedUnit>> {
    let mut units = Vec::new();

    for node_role in node.roles.iter().filter(|r| filter.role(r)) {
        let context = format!("environment '{}', node '{}'", env.name, node.name);
        let chain = resolve_role(&node_role.role, &context, roles)?;
        let Some(role) = chain.target() else {
            continue;
        };

        let selected: Vec<ConfigValue> = node_role
            .variants
            .iter()
            .map(|v| ConfigValue::from(v.name.as_str()))
            .collect();

        if node_role.variants.is_empty() {
            let config = merge(Some(&role.config), Some(&node_role.config));
            units.push(resolve_unit(
                engine,
                shared,
                UnitScope {
                    node: &node.name,
                    role,
                    variant: None,
                    selected: &selected,
                    context: &context,
                },
                config,
            )?);
            continue;
        }

        for node_variant in &node_role.variants {
            let role_variant = role.variant(&node_variant.name).ok_or_else(|| Error::UnknownVariant {
                role: role.name.clone(),
                variant: node_variant.name.clone(),
                context: context.clone(),
            })?;
            // node role variants already carry the node role configuration
            let config = merge(Some(&role.config), Some(&role_variant.config));
            let config = merge(Some(&config), Some(&node_variant.config));
            units.push(resolve_unit(
                engine,
                shared,
                UnitScope {
                    node: &node.name,
                    role,
                    variant: Some(&node_variant.name),
                    selected: &selected,
                    context: &context,
                },
                config,
            )?);
        }
    }

    Ok(units)
}

struct UnitScope<'s> {
    node: &'s str,
    role: &'s Role,
    variant: Option<&'s str>,
    selected: &'s [ConfigValue],
    context: &'s str,
}

fn resolve_unit(
    engine: &Interpolator<'_>,
    shared: &ConfigMap,
    scope: UnitScope<'_>,
    config: ConfigMap,
) -> Result<ResolvedUnit> {
    let location = match scope.variant {
        Some(variant) => format!("{}, role '{}', variant '{}'", scope.context, scope.role.name, variant),
        None => format!("{}, role '{}'", scope.context, scope.role.name),
    };

    if let Some(key) = config.keys().find(|key| is_reserved(key)) {
        return Err(Error::ReservedKey {
            key: key.clone(),
            context: location,
        });
    }

    let mut scoped = config;
    scoped.extend(shared.iter().map(|(k, v)| (k.clone(), v.clone())));
    scoped.insert(NODE_KEY.to_string(), ConfigValue::from(scope.node));
    scoped.insert(ROLE_KEY.to_string(), ConfigValue::from(scope.role.name.as_str()));
    scoped.insert(
        VARIANT_KEY.to_string(),
        scope.variant.map(ConfigValue::from).unwrap_or_default(),
    );
    scoped.insert(VARIANTS_KEY.to_string(), ConfigValue::List(scope.selected.to_vec()));

    debug!("Resolving {}", location);
    let resolved = engine.resolve_map(&scoped).map_err(|err| with_location(err, &location))?;
    let resolved = strip_merge_tokens(&resolved);
    let (context, config) = split_map(&resolved, |path, _| {
        CONTEXT_KEYS
            .iter()
            .any(|key| path == *key || path.strip_prefix(key).is_some_and(|rest| rest.starts_with('.')))
    });

    let files = scope
        .role
        .files
        .iter()
        .filter(|file| file.applies_to(scope.variant))
        .cloned()
        .collect();

    Ok(ResolvedUnit {
        node: scope.node.to_string(),
        role: scope.role.name.clone(),
        variant: scope.variant.map(str::to_string),
        files,
        config,
        context,
    })
}

/// Attach the unit location to a resolution error.
fn with_location(err: Error, location: &str) -> Error {
    Error::Generation {
        context: location.to_string(),
        source: Box::new(err),
    }
}
