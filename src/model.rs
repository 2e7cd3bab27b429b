//! # Definition Model
//!
//! The object trees that role and environment definitions are parsed into.
//! Every node that owns a configuration map implements
//! [`Configurable`](crate::inheritance::Configurable), which is how the
//! inheritance walker reaches it.
//!
//! ## Roles
//!
//! ```yaml
//! name: webserver
//! templateDir: web
//! inherits: [base]
//! variants:
//!   - name: ssl
//!     config: { port: 443 }
//! files:
//!   - template: nginx.conf
//!     target: /etc/nginx/nginx.conf
//!   - template: ssl.conf
//!     variants: [ssl]
//! config:
//!   port: 80
//! ```
//!
//! ## Environments
//!
//! ```yaml
//! name: prod
//! version: "1.4"
//! config: { domain: example.com }
//! tenants:
//!   - name: acme
//!     roles: [webserver]
//! roles:
//!   webserver: { workers: 8 }
//! nodes:
//!   - name: web1
//!     config: { ip: 10.0.0.1 }
//!     roles:
//!       - role: webserver
//!         variants: [{ name: ssl }]
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::inheritance::Configurable;
use crate::value::ConfigMap;

/// A reference to a super-role. Written as the plain role name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleInherit {
    pub role: String,
}

impl From<&str> for RoleInherit {
    fn from(role: &str) -> Self {
        Self {
            role: role.to_string(),
        }
    }
}

/// A named flavour of a role with its own configuration overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleVariant {
    pub name: String,
    #[serde(default)]
    pub config: ConfigMap,
}

/// A template a role renders, optionally restricted to some variants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleFile {
    /// Template path, relative to the role's template directory
    pub template: String,
    /// Output path; defaults to the template path when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Variants this file is generated for; empty means "always"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<String>,
}

impl RoleFile {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            ..Default::default()
        }
    }

    /// Whether this file is generated when `variant` is selected.
    pub fn applies_to(&self, variant: Option<&str>) -> bool {
        match variant {
            _ if self.variants.is_empty() => true,
            Some(variant) => self.variants.iter().any(|v| v == variant),
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Role {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<String>,
    #[serde(default)]
    pub inherits: Vec<RoleInherit>,
    #[serde(default)]
    pub variants: Vec<RoleVariant>,
    #[serde(default)]
    pub files: Vec<RoleFile>,
    #[serde(default)]
    pub config: ConfigMap,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn variant(&self, name: &str) -> Option<&RoleVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.name.as_str())
    }
}

/// A customer or group sharing an environment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tenant {
    pub name: String,
    /// Roles this tenant is served by
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub config: ConfigMap,
}

/// A variant a node selects for one of its roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeRoleVariant {
    pub name: String,
    #[serde(default)]
    pub config: ConfigMap,
}

/// A role assigned to a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeRole {
    pub role: String,
    #[serde(default)]
    pub config: ConfigMap,
    #[serde(default)]
    pub variants: Vec<NodeRoleVariant>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub config: ConfigMap,
    #[serde(default)]
    pub roles: Vec<NodeRole>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Environment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub config: ConfigMap,
    #[serde(default)]
    pub tenants: Vec<Tenant>,
    /// Environment-wide configuration per role name
    #[serde(default)]
    pub roles: BTreeMap<String, ConfigMap>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Environment {
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

impl Configurable for RoleVariant {
    fn kind(&self) -> &'static str {
        "role variant"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigMap {
        &mut self.config
    }
}

impl Configurable for Role {
    fn kind(&self) -> &'static str {
        "role"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigMap {
        &mut self.config
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Configurable> {
        self.variants
            .iter_mut()
            .map(|v| v as &mut dyn Configurable)
            .collect()
    }
}

impl Configurable for Tenant {
    fn kind(&self) -> &'static str {
        "tenant"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigMap {
        &mut self.config
    }
}

impl Configurable for NodeRoleVariant {
    fn kind(&self) -> &'static str {
        "node role variant"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigMap {
        &mut self.config
    }
}

impl Configurable for NodeRole {
    fn kind(&self) -> &'static str {
        "node role"
    }

    fn name(&self) -> &str {
        &self.role
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigMap {
        &mut self.config
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Configurable> {
        self.variants
            .iter_mut()
            .map(|v| v as &mut dyn Configurable)
            .collect()
    }
}

impl Configurable for Node {
    fn kind(&self) -> &'static str {
        "node"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigMap {
        &mut self.config
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Configurable> {
        self.roles
            .iter_mut()
            .map(|r| r as &mut dyn Configurable)
            .collect()
    }
}

impl Configurable for Environment {
    fn kind(&self) -> &'static str {
        "environment"
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &ConfigMap {
        &self.config
    }

    fn config_mut(&mut self) -> &mut ConfigMap {
        &mut self.config
    }

    fn children_mut(&mut self) -> Vec<&mut dyn Configurable> {
        let tenants = self.tenants.iter_mut().map(|t| t as &mut dyn Configurable);
        let nodes = self.nodes.iter_mut().map(|n| n as &mut dyn Configurable);
        tenants.chain(nodes).collect()
    }
}
