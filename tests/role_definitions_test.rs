//! Data-driven checks over the role definitions in `tests/testdata/roles`.
//!
//! Every YAML file must parse as a role named after the file, resolve its
//! inheritance chain against the rest of the directory and resolve its own
//! configuration without unresolved placeholders.

use confgen::definitions::{load_roles_dir, role_from_file};
use confgen::inheritance::resolve_role;
use confgen::interpolate::{has_placeholders, Interpolator, ResolverOptions};
use confgen::merge::strip_merge_tokens;
use confgen::value::ConfigValue;
use confgen::variables::ProviderRegistry;
use std::collections::HashSet;
use std::path::Path;

fn unresolved(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::String(s) => has_placeholders(s),
        ConfigValue::List(items) => items.iter().any(unresolved),
        ConfigValue::Map(map) => map.values().any(unresolved),
        _ => false,
    }
}

fn test_role_definition(path: &Path) -> datatest_stable::Result<()> {
    let role = role_from_file(path)?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or("file name is not UTF-8")?;
    assert_eq!(role.name, stem, "role name must match file name in {}", path.display());

    let mut seen = HashSet::new();
    for variant in &role.variants {
        assert!(
            seen.insert(variant.name.as_str()),
            "duplicate variant '{}' in {}",
            variant.name,
            path.display()
        );
    }

    let dir = path.parent().ok_or("role file has no parent directory")?;
    let catalog = load_roles_dir(dir)?;
    let chain = resolve_role(&role.name, "role definitions test", &catalog)?;
    let resolved = chain.target().ok_or("empty role chain")?;
    assert_eq!(resolved.name, role.name);

    for file in &resolved.files {
        assert!(!file.template.is_empty(), "empty template in {}", path.display());
        for variant in &file.variants {
            assert!(
                resolved.variant(variant).is_some(),
                "file {} names unknown variant '{}' in {}",
                file.template,
                variant,
                path.display()
            );
        }
    }

    let providers = ProviderRegistry::new();
    let engine = Interpolator::new(&providers, ResolverOptions::default())?;
    let config = strip_merge_tokens(&engine.resolve_map(&resolved.config)?);
    assert!(
        !config.values().any(unresolved),
        "unresolved placeholders left in {}",
        path.display()
    );

    println!(
        "✓ Resolved role '{}' from {} ({})",
        role.name,
        path.display(),
        chain.names().join(" -> ")
    );
    Ok(())
}

// Register datatest harness to discover and run tests on all YAML files in the roles directory
datatest_stable::harness!(test_role_definition, "tests/testdata/roles", r".*\.yaml$");
