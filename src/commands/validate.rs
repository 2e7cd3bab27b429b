//! # Validate Command Implementation
//!
//! Checks role definitions without printing any configuration:
//!
//! - **Definition parsing**: every role file parses and role names are unique.
//! - **Role inheritance**: every role's chain resolves (no unknown super-roles,
//!   no cycles, consistent variants).
//! - **Environment** (optional): the whole environment plans and resolves.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use confgen::definitions::{environment_from_file, load_roles_dir};
use confgen::generate::plan;
use confgen::inheritance::resolve_role;
use confgen::interpolate::ResolverOptions;
use confgen::output::{name, status, OutputConfig, Status};
use confgen::variables::ProviderRegistry;

/// Validate role and environment definitions
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Directory containing role definition files
    #[arg(short, long, value_name = "DIR", env = "CONFGEN_ROLES")]
    pub roles: PathBuf,

    /// Environment definition file to resolve as well
    #[arg(short, long, value_name = "FILE", env = "CONFGEN_ENV")]
    pub env: Option<PathBuf>,
}

/// Execute the `validate` command.
///
/// # Arguments
/// * `args` - The command arguments
/// * `color_flag` - The value of the global --color flag ("always", "never", or "auto")
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let roles = load_roles_dir(&args.roles)
        .with_context(|| format!("Failed to load roles from {}", args.roles.display()))?;
    println!(
        "{} Loaded {} role(s) from {}",
        status(&out, Status::Ok),
        roles.len(),
        args.roles.display()
    );

    let mut failures = 0usize;
    for role in roles.keys() {
        match resolve_role(role, "validate", &roles) {
            Ok(chain) => println!(
                "{} {} ({})",
                status(&out, Status::Ok),
                name(&out, role),
                chain.names().join(" -> ")
            ),
            Err(err) => {
                failures += 1;
                println!("{} {}: {}", status(&out, Status::Failed), name(&out, role), err);
            }
        }
    }

    if let Some(env_path) = &args.env {
        let env = environment_from_file(env_path)
            .with_context(|| format!("Failed to load environment from {}", env_path.display()))?;
        let base_dir = env_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let providers = ProviderRegistry::with_builtins(base_dir);
        match plan(&env, &roles, &providers, ResolverOptions::default()) {
            Ok(units) => println!(
                "{} Environment {} resolved into {} unit(s)",
                status(&out, Status::Ok),
                name(&out, &env.name),
                units.len()
            ),
            Err(err) => {
                failures += 1;
                println!(
                    "{} Environment {}: {}",
                    status(&out, Status::Failed),
                    name(&out, &env.name),
                    err
                );
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("Validation failed with {} error(s)", failures);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(temp: &TempDir, file: &str, content: &str) {
        let path = temp.path().join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_validate_ok() {
        let temp = TempDir::new().unwrap();
        write(&temp, "roles/base.yaml", "name: base");
        write(&temp, "roles/web.yaml", "name: web\ninherits: [base]");
        let args = ValidateArgs {
            roles: temp.path().join("roles"),
            env: None,
        };
        assert!(execute(args, "never").is_ok());
    }

    #[test]
    fn test_validate_reports_broken_inheritance() {
        let temp = TempDir::new().unwrap();
        write(&temp, "roles/web.yaml", "name: web\ninherits: [missing]");
        let args = ValidateArgs {
            roles: temp.path().join("roles"),
            env: None,
        };
        let err = execute(args, "never").unwrap_err();
        assert!(err.to_string().contains("1 error(s)"));
    }

    #[test]
    fn test_validate_with_environment() {
        let temp = TempDir::new().unwrap();
        write(&temp, "roles/web.yaml", "name: web\nconfig: {a: '${missing}'}");
        write(
            &temp,
            "env.yaml",
            "name: dev\nnodes:\n  - name: n1\n    roles: [{role: web}]\n",
        );
        let args = ValidateArgs {
            roles: temp.path().join("roles"),
            env: Some(temp.path().join("env.yaml")),
        };
        assert!(execute(args, "never").is_err());
    }
}
