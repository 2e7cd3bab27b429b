//! # Roles Command Implementation
//!
//! Displays role inheritance as a tree: each role with its variants, and
//! below it the super-roles it inherits from.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::{Context, Result};
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::PathBuf;

use confgen::definitions::load_roles_dir;
use confgen::inheritance::MAX_INHERITANCE_DEPTH;
use confgen::model::Role;
use confgen::output::{name, OutputConfig};
use confgen::suggestions::did_you_mean;

/// Display the role inheritance tree
#[derive(Args, Debug)]
pub struct RolesArgs {
    /// Directory containing role definition files
    #[arg(short, long, value_name = "DIR", env = "CONFGEN_ROLES")]
    pub roles: PathBuf,

    /// Only show this role; by default every role is shown
    #[arg(value_name = "ROLE")]
    pub role: Option<String>,
}

/// Execute the `roles` command.
pub fn execute(args: RolesArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let roles = load_roles_dir(&args.roles)
        .with_context(|| format!("Failed to load roles from {}", args.roles.display()))?;

    let selected: Vec<&str> = match &args.role {
        Some(role) if !roles.contains_key(role) => {
            let hint = did_you_mean(role, roles.keys().map(String::as_str))
                .map(|h| format!("\n  hint: {}", h))
                .unwrap_or_default();
            anyhow::bail!("Role '{}' not found{}", role, hint);
        }
        Some(role) => vec![role.as_str()],
        None => roles.keys().map(String::as_str).collect(),
    };

    for role in selected {
        let tree = build_tree_node(role, &roles, &out, &mut Vec::new());
        print_tree(&tree).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
    }

    Ok(())
}

/// Build the tree for `role`. `path` holds the roles above it so that cycles
/// end in a marked leaf.
fn build_tree_node(
    role: &str,
    roles: &BTreeMap<String, Role>,
    out: &OutputConfig,
    path: &mut Vec<String>,
) -> TreeNode {
    let Some(definition) = roles.get(role) else {
        return TreeNode::leaf(format!("{} (not found)", role));
    };
    if path.iter().any(|r| r == role) || path.len() >= MAX_INHERITANCE_DEPTH {
        return TreeNode::leaf(format!("{} (cycle)", role));
    }

    let mut label = name(out, role);
    let variants: Vec<&str> = definition.variant_names().collect();
    if !variants.is_empty() {
        label.push_str(&format!(" [{}]", variants.join(", ")));
    }

    path.push(role.to_string());
    let children = definition
        .inherits
        .iter()
        .map(|inherit| build_tree_node(&inherit.role, roles, out, path))
        .collect();
    path.pop();

    TreeNode { label, children }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(label: String) -> Self {
        Self {
            label,
            children: Vec::new(),
        }
    }
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(&self, f: &mut W, _style: &ptree::Style) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
