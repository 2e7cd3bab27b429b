//! Shared test utilities for integration and E2E tests.
//!
//! This module provides a fixture that lays out a roles directory and an
//! environment file in a temporary directory, plus the YAML definitions most
//! tests start from.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_role("base", definitions::BASE_ROLE)
//!         .with_env(definitions::DEV_ENV);
//!     fixture.command().arg("resolve").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::definitions;
    pub use super::TestFixture;
}

/// Role and environment definitions shared between tests.
#[allow(dead_code)]
pub mod definitions {
    /// A role with two variants and a templated URL.
    pub const BASE_ROLE: &str = r#"
name: base
variants:
  - name: blue
    config:
      color: blue
  - name: green
    config:
      color: green
files:
  - template: app.conf
  - template: blue.conf
    variants: [blue]
config:
  port: 8080
  host: localhost
  url: "http://${host}:${port}"
"#;

    /// Inherits from `base`, overrides the port and declares both variants.
    pub const CHILD_ROLE: &str = r#"
name: child
inherits: [base]
variants:
  - name: blue
  - name: green
files:
  - template: child.conf
config:
  port: 9090
"#;

    /// A single-node environment selecting `child` with the `blue` variant.
    pub const DEV_ENV: &str = r#"
name: dev
version: "1.2.0"
config:
  host: dev.example.com
nodes:
  - name: node1
    roles:
      - role: child
        variants:
          - name: blue
"#;

    /// Not a valid definition document.
    pub const INVALID_YAML: &str = "name: [unclosed";
}

/// A temporary directory holding a `roles/` directory and an `env.yaml`.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new()
///     .with_role("base", definitions::BASE_ROLE)
///     .with_env(definitions::DEV_ENV);
///
/// fixture
///     .command()
///     .arg("validate")
///     .assert()
///     .success();
/// ```
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty `roles/` directory.
    pub fn new() -> Self {
        let temp_dir = assert_fs::TempDir::new().expect("Failed to create temp directory");
        temp_dir
            .child("roles")
            .create_dir_all()
            .expect("Failed to create roles directory");
        Self { temp_dir }
    }

    /// Add a role definition as `roles/<name>.yaml`.
    pub fn with_role(self, name: &str, content: &str) -> Self {
        self.temp_dir
            .child(format!("roles/{}.yaml", name))
            .write_str(content)
            .expect("Failed to write role file");
        self
    }

    /// Add the environment definition `env.yaml`.
    pub fn with_env(self, content: &str) -> Self {
        self.temp_dir
            .child("env.yaml")
            .write_str(content)
            .expect("Failed to write environment file");
        self
    }

    /// Add the `base` and `child` roles plus the `dev` environment.
    pub fn with_sample(self) -> Self {
        self.with_role("base", definitions::BASE_ROLE)
            .with_role("child", definitions::CHILD_ROLE)
            .with_env(definitions::DEV_ENV)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the roles directory.
    pub fn roles_path(&self) -> PathBuf {
        self.temp_dir.path().join("roles")
    }

    /// Get the path to the environment file.
    pub fn env_path(&self) -> PathBuf {
        self.temp_dir.path().join("env.yaml")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    /// Create a command running in this fixture's directory.
    ///
    /// `CONFGEN_ROLES` and `CONFGEN_ENV` point at the fixture so tests only
    /// pass the arguments they are about.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("confgen");
        cmd.current_dir(self.path())
            .env("CONFGEN_ROLES", self.roles_path())
            .env("CONFGEN_ENV", self.env_path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_roles_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.roles_path().is_dir());
    }

    #[test]
    fn test_fixture_with_sample() {
        let fixture = TestFixture::new().with_sample();
        assert!(fixture.roles_path().join("base.yaml").exists());
        assert!(fixture.roles_path().join("child.yaml").exists());
        assert!(fixture.env_path().exists());
    }

    #[test]
    fn test_definitions_are_valid_yaml() {
        let docs = [
            definitions::BASE_ROLE,
            definitions::CHILD_ROLE,
            definitions::DEV_ENV,
        ];

        for doc in docs {
            serde_yaml::from_str::<serde_yaml::Value>(doc).expect("Definition should be valid YAML");
        }
    }

    #[test]
    fn test_invalid_yaml_is_actually_invalid() {
        let result = serde_yaml::from_str::<serde_yaml::Value>(definitions::INVALID_YAML);
        assert!(result.is_err(), "INVALID_YAML should not parse");
    }
}
