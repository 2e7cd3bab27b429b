//! Top-down configuration inheritance through the environment tree

use log::trace;

use super::Configurable;
use crate::merge::merge;
use crate::model::Environment;
use crate::value::ConfigMap;

/// Merge `parent` under `node`'s configuration, then recurse into the
/// children with the merged map as their parent.
pub fn inherit_config(node: &mut dyn Configurable, parent: &ConfigMap) {
    let merged = merge(Some(parent), Some(node.config()));
    trace!("Inherited configuration into {} '{}'", node.kind(), node.name());
    *node.config_mut() = merged.clone();
    for child in node.children_mut() {
        inherit_config(child, &merged);
    }
}

/// Propagate scoped configuration through a copy of `env`.
///
/// Later merges win:
///
/// 1. global configuration into every tenant
/// 2. global configuration into every environment-wide role configuration
/// 3. global configuration into every node
/// 4. for each node role: role-wide configuration, then the node's own
///    configuration, then the node role's configuration
/// 5. the node role's merged configuration into its variants
///
/// Placeholders are copied, not resolved.
pub fn resolve_environment(env: &Environment) -> Environment {
    let mut env = env.clone();
    let global = env.config.clone();

    for tenant in &mut env.tenants {
        inherit_config(tenant, &global);
    }

    for role_config in env.roles.values_mut() {
        *role_config = merge(Some(&global), Some(role_config));
    }

    for node in &mut env.nodes {
        let node_own = node.config.clone();
        node.config = merge(Some(&global), Some(&node_own));

        for node_role in &mut node.roles {
            let role_scoped = env.roles.get(&node_role.role).unwrap_or(&global);
            let inherited = merge(Some(role_scoped), Some(&node_own));
            node_role.config = merge(Some(&inherited), Some(&node_role.config));
            let parent = node_role.config.clone();
            for variant in node_role.children_mut() {
                inherit_config(variant, &parent);
            }
        }
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeRole, NodeRoleVariant, Tenant};
    use crate::value::{map_from_yaml, ConfigValue};

    fn map(yaml: &str) -> ConfigMap {
        map_from_yaml(yaml).unwrap()
    }

    fn environment() -> Environment {
        Environment {
            name: "prod".into(),
            config: map("domain: example.com\nport: 1\nlevel: global"),
            tenants: vec![Tenant {
                name: "acme".into(),
                config: map("level: tenant"),
                ..Default::default()
            }],
            roles: [("web".to_string(), map("port: 2\nworkers: 8"))].into(),
            nodes: vec![Node {
                name: "web1".into(),
                config: map("ip: 10.0.0.1\nlevel: node"),
                roles: vec![NodeRole {
                    role: "web".into(),
                    config: map("workers: 16"),
                    variants: vec![NodeRoleVariant {
                        name: "ssl".into(),
                        config: map("port: 443"),
                    }],
                }],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_global_flows_into_tenants_and_nodes() {
        let resolved = resolve_environment(&environment());
        let tenant = &resolved.tenants[0].config;
        assert_eq!(tenant["domain"], ConfigValue::from("example.com"));
        assert_eq!(tenant["level"], ConfigValue::from("tenant"));

        let node = &resolved.nodes[0].config;
        assert_eq!(node["domain"], ConfigValue::from("example.com"));
        assert_eq!(node["level"], ConfigValue::from("node"));
    }

    #[test]
    fn test_node_role_layering() {
        let resolved = resolve_environment(&environment());
        let node_role = &resolved.nodes[0].roles[0].config;
        // role-wide config beats global, node beats role-wide, node role beats node
        assert_eq!(node_role["port"], ConfigValue::from(2));
        assert_eq!(node_role["level"], ConfigValue::from("node"));
        assert_eq!(node_role["workers"], ConfigValue::from(16));
        assert_eq!(node_role["ip"], ConfigValue::from("10.0.0.1"));
        assert_eq!(node_role["domain"], ConfigValue::from("example.com"));
    }

    #[test]
    fn test_variants_inherit_node_role() {
        let resolved = resolve_environment(&environment());
        let variant = &resolved.nodes[0].roles[0].variants[0].config;
        assert_eq!(variant["port"], ConfigValue::from(443));
        assert_eq!(variant["workers"], ConfigValue::from(16));
    }

    #[test]
    fn test_role_without_scoped_config_uses_global() {
        let mut env = environment();
        env.nodes[0].roles[0].role = "db".into();
        let resolved = resolve_environment(&env);
        assert_eq!(resolved.nodes[0].roles[0].config["port"], ConfigValue::from(1));
    }

    #[test]
    fn test_input_is_not_modified() {
        let env = environment();
        let before = env.clone();
        let _ = resolve_environment(&env);
        assert_eq!(env, before);
    }

    #[test]
    fn test_placeholders_are_not_resolved() {
        let mut env = environment();
        env.config = map("url: http://${domain}");
        let resolved = resolve_environment(&env);
        assert_eq!(resolved.nodes[0].config["url"], ConfigValue::from("http://${domain}"));
    }

    #[test]
    fn test_generic_walk() {
        let mut node = Node {
            name: "n".into(),
            config: map("a: node"),
            roles: vec![NodeRole {
                role: "r".into(),
                config: map("b: role"),
                variants: vec![NodeRoleVariant {
                    name: "v".into(),
                    config: map("c: variant"),
                }],
            }],
        };
        inherit_config(&mut node, &map("a: parent\nz: parent"));
        let variant = &node.roles[0].variants[0].config;
        assert_eq!(variant["a"], ConfigValue::from("node"));
        assert_eq!(variant["b"], ConfigValue::from("role"));
        assert_eq!(variant["z"], ConfigValue::from("parent"));
    }
}
