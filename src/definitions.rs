//! # Definition Loading
//!
//! Parses role and environment definitions from YAML. A roles directory
//! holds one role per `*.yaml`/`*.yml` file, in any subdirectory layout; an
//! environment is a single file.
//!
//! Parse failures are reported as [`Error::DefinitionParse`] with the file
//! they came from and, where possible, a hint for fixing the definition.

use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::model::{Environment, Role};

/// Parse a single role definition.
pub fn parse_role(yaml_content: &str) -> Result<Role> {
    let role: Role = serde_yaml::from_str(yaml_content).map_err(|err| Error::DefinitionParse {
        message: format!("Invalid role definition: {}", err),
        hint: hint_for(&err),
    })?;
    if role.name.trim().is_empty() {
        return Err(Error::DefinitionParse {
            message: "Role definition has an empty name".to_string(),
            hint: Some("Add 'name: <role>' to the role file".to_string()),
        });
    }
    Ok(role)
}

/// Parse an environment definition.
pub fn parse_environment(yaml_content: &str) -> Result<Environment> {
    serde_yaml::from_str(yaml_content).map_err(|err| Error::DefinitionParse {
        message: format!("Invalid environment definition: {}", err),
        hint: hint_for(&err),
    })
}

fn hint_for(err: &serde_yaml::Error) -> Option<String> {
    let message = err.to_string();
    if message.contains("missing field `name`") {
        Some("Every role, tenant, node and variant needs a 'name:' entry".to_string())
    } else if message.contains("missing field `role`") {
        Some("Node roles are written as '- role: <name>'".to_string())
    } else if message.contains("unknown field") {
        Some("Check the spelling of the key; role files use camelCase (e.g. 'templateDir')".to_string())
    } else {
        None
    }
}

/// Read a role definition from a file.
pub fn role_from_file<P: AsRef<Path>>(path: P) -> Result<Role> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse_role(&content).map_err(|err| in_file(err, path))
}

/// Read an environment definition from a file.
pub fn environment_from_file<P: AsRef<Path>>(path: P) -> Result<Environment> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse_environment(&content).map_err(|err| in_file(err, path))
}

fn in_file(err: Error, path: &Path) -> Error {
    match err {
        Error::DefinitionParse { message, hint } => Error::DefinitionParse {
            message: format!("{}: {}", path.display(), message),
            hint,
        },
        other => other,
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Load every role definition below `dir`, keyed by role name.
///
/// Files are visited in sorted order so that errors are reproducible. Two
/// files defining the same role name are rejected.
pub fn load_roles_dir<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, Role>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::DefinitionParse {
            message: format!("Roles directory not found: {}", dir.display()),
            hint: Some("Use --roles or set CONFGEN_ROLES to point at a directory of role files".to_string()),
        });
    }

    let mut roles = BTreeMap::new();
    let mut origins: BTreeMap<String, String> = BTreeMap::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| Error::Io(err.into()))?;
        if !entry.file_type().is_file() || !is_yaml(entry.path()) {
            continue;
        }

        let role = role_from_file(entry.path())?;
        let origin = entry.path().display().to_string();
        if let Some(previous) = origins.insert(role.name.clone(), origin.clone()) {
            return Err(Error::DefinitionParse {
                message: format!(
                    "Role '{}' is defined twice ({} and {})",
                    role.name, previous, origin
                ),
                hint: Some("Role names must be unique across the roles directory".to_string()),
            });
        }
        debug!("Loaded role '{}' from {}", role.name, origin);
        roles.insert(role.name.clone(), role);
    }

    Ok(roles)
}
