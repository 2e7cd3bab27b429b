//! # Resolve Command Implementation
//!
//! Loads a roles directory and an environment definition, plans every
//! node/role/variant unit and prints the resolved configuration as YAML or
//! JSON on stdout.
//!
//! Value providers available to placeholders:
//! - `${env::NAME}` reads the process environment
//! - `${file::path}` reads a file relative to `--base-dir` (defaults to the
//!   environment file's directory)

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

use confgen::definitions::{environment_from_file, load_roles_dir};
use confgen::generate::{plan_filtered, PlanFilter, ResolvedUnit};
use confgen::interpolate::{ResolverOptions, MAX_ITERATIONS};
use confgen::variables::ProviderRegistry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

/// Resolve the configuration of an environment
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Directory containing role definition files
    #[arg(short, long, value_name = "DIR", env = "CONFGEN_ROLES")]
    pub roles: PathBuf,

    /// Environment definition file
    #[arg(short, long, value_name = "FILE", env = "CONFGEN_ENV")]
    pub env: PathBuf,

    /// Only resolve this node
    #[arg(long, value_name = "NAME")]
    pub node: Option<String>,

    /// Only resolve this role
    #[arg(long, value_name = "NAME")]
    pub role: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Base directory for the `file` value provider
    #[arg(long, value_name = "DIR")]
    pub base_dir: Option<PathBuf>,

    /// Maximum nested resolution steps before reporting a cycle
    #[arg(long, value_name = "NUM", default_value_t = MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// Keep escaped placeholders (`\${...}`) escaped in the output
    #[arg(long)]
    pub keep_escapes: bool,
}

/// Execute the `resolve` command.
pub fn execute(args: ResolveArgs) -> Result<()> {
    let units = resolve_units(&args)?;
    print!("{}", render(&units, args.format)?);
    Ok(())
}

fn resolve_units(args: &ResolveArgs) -> Result<Vec<ResolvedUnit>> {
    let roles = load_roles_dir(&args.roles)
        .with_context(|| format!("Failed to load roles from {}", args.roles.display()))?;
    let env = environment_from_file(&args.env)
        .with_context(|| format!("Failed to load environment from {}", args.env.display()))?;

    let base_dir = args.base_dir.clone().unwrap_or_else(|| {
        args.env
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let providers = ProviderRegistry::with_builtins(base_dir);
    let options = ResolverOptions {
        max_iterations: args.max_iterations,
        deescape: !args.keep_escapes,
    };
    let filter = PlanFilter {
        node: args.node.clone(),
        role: args.role.clone(),
    };

    plan_filtered(&env, &roles, &providers, options, &filter)
        .with_context(|| format!("Failed to resolve environment '{}'", env.name))
}

fn render(units: &[ResolvedUnit], format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Yaml => serde_yaml::to_string(units)?,
        OutputFormat::Json => serde_json::to_string_pretty(units)? + "\n",
    })
}
