//! CLI integration tests using assert_cmd.
//!
//! Help and argument validation only: none of these need a database.

use assert_cmd::Command;
use predicates::prelude::*;

#[allow(deprecated)]
fn coachhub() -> Command {
    let mut cmd = Command::cargo_bin("coachhub").unwrap();
    cmd.env_remove("DATABASE_URL")
        .env_remove("SUPABASE_JWT_SECRET")
        .env_remove("PORT")
        .env_remove("DB_MAX_CONNECTIONS")
        .env_remove("BACKGROUND_SIDE_EFFECTS");
    cmd
}

#[test]
fn help_shows_all_subcommands() {
    coachhub().arg("--help").assert().success().stdout(
        predicate::str::contains("serve")
            .and(predicate::str::contains("check"))
            .and(predicate::str::contains("--database-url"))
            .and(predicate::str::contains("--jwt-secret")),
    );
}

#[test]
fn help_serve_shows_args() {
    coachhub()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("--port")
                .and(predicate::str::contains("--background-side-effects"))
                .and(predicate::str::contains("7001")),
        );
}

#[test]
fn missing_subcommand_fails() {
    coachhub().assert().failure();
}

#[test]
fn unknown_subcommand_fails() {
    coachhub()
        .arg("nonexistent")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn serve_without_database_url_fails() {
    coachhub()
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DATABASE_URL is required"));
}

#[test]
fn invalid_port_fails() {
    coachhub()
        .args(["serve", "--port", "not-a-port"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--port"));
}
