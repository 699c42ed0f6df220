use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn blog_admin() -> Command {
    let mut cmd = Command::cargo_bin("blog-admin").unwrap();
    cmd.env_remove("BLOG_API_URL")
        .env_remove("BLOG_PAGE_SIZE")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_help_lists_commands() {
    blog_admin()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("save"))
        .stdout(predicate::str::contains("tag-create"));
}

#[test]
fn test_status_without_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    blog_admin()
        .arg("--session-file")
        .arg(&path)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No session found"));

    assert!(!path.exists());
}

#[test]
fn test_status_with_saved_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    fs::write(
        &path,
        r#"{"token":"token-123","user":{"email":"admin@example.com","role":"admin"}}"#,
    )
    .unwrap();

    blog_admin()
        .arg("--session-file")
        .arg(&path)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("admin@example.com"))
        .stdout(predicate::str::contains("Active"));
}

#[test]
fn test_invalid_status_is_rejected() {
    blog_admin()
        .args(["save", "--title", "T", "--slug", "t", "--status", "archived"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown post status"));
}

#[test]
fn test_invalid_page_size_fails_fast() {
    blog_admin()
        .env("BLOG_PAGE_SIZE", "zero")
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("BLOG_PAGE_SIZE"));
}
