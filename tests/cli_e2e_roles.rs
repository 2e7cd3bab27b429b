//! End-to-end tests for the `roles` command.

mod common;
use common::prelude::*;

#[test]
fn test_roles_tree() {
    let fixture = TestFixture::new().with_sample();

    fixture
        .command()
        .arg("roles")
        .assert()
        .success()
        .stdout(predicate::str::contains("child [blue, green]"))
        .stdout(predicate::str::contains("base [blue, green]"));
}

#[test]
fn test_roles_single_role() {
    let fixture = TestFixture::new()
        .with_sample()
        .with_role("other", "name: other");

    fixture
        .command()
        .args(["roles", "base"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base"))
        .stdout(predicate::str::contains("other").not());
}

#[test]
fn test_roles_marks_missing_super_role() {
    let fixture = TestFixture::new().with_role("web", "name: web\ninherits: [ghost]");

    fixture
        .command()
        .arg("roles")
        .assert()
        .success()
        .stdout(predicate::str::contains("ghost (not found)"));
}

#[test]
fn test_roles_unknown_role_suggests() {
    let fixture = TestFixture::new().with_sample();

    fixture
        .command()
        .args(["roles", "chlid"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Role 'chlid' not found"))
        .stderr(predicate::str::contains("Did you mean 'child'?"));
}
