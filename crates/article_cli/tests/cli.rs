use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

fn articles(db: &Path) -> Command {
    let mut cmd = Command::cargo_bin("articles").unwrap();
    cmd.env_remove("DATABASE_URL")
        .arg("--database-url")
        .arg(format!("sqlite://{}", db.display()));
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

fn setup() -> (TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("articles.db");
    (dir, db)
}

#[test]
fn create_then_get_round_trips_through_the_database_file() {
    let (_dir, db) = setup();

    let created = stdout_json(
        articles(&db)
            .args(["create", "--title", "Hello", "--body", "World"])
            .arg("--description")
            .arg("greeting"),
    );
    assert_eq!(created["title"], "Hello");
    assert_eq!(created["published"], false);
    assert_eq!(created["createdAt"], created["updatedAt"]);

    let id = created["id"].as_i64().unwrap().to_string();
    let loaded = stdout_json(articles(&db).args(["get", id.as_str()]));
    assert_eq!(loaded, created);
}

#[test]
fn duplicate_title_reports_conflict_envelope() {
    let (_dir, db) = setup();

    articles(&db)
        .args(["create", "--title", "Twice", "--body", "one"])
        .assert()
        .success();

    articles(&db)
        .args(["create", "--title", "Twice", "--body", "two"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(r#""status":409"#))
        .stderr(predicate::str::contains(r#""error":"conflict""#));
}

#[test]
fn missing_article_reports_not_found() {
    let (_dir, db) = setup();

    articles(&db)
        .args(["get", "42"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(r#""status":404"#));
}

#[test]
fn update_publishes_and_json_patch_clears_description() {
    let (_dir, db) = setup();

    let created = stdout_json(articles(&db).args([
        "create",
        "--title",
        "Patch me",
        "--body",
        "b",
        "--description",
        "d",
    ]));
    let id = created["id"].as_i64().unwrap().to_string();

    let published = stdout_json(articles(&db).args(["update", id.as_str(), "--published", "true"]));
    assert_eq!(published["published"], true);
    assert_eq!(published["description"], "d");

    let listed = stdout_json(articles(&db).arg("list"));
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let drafts = stdout_json(articles(&db).args(["list", "--drafts"]));
    assert!(drafts.as_array().unwrap().is_empty());

    let cleared = stdout_json(articles(&db).args([
        "update",
        id.as_str(),
        "--json",
        r#"{"description": null}"#,
    ]));
    assert!(cleared["description"].is_null());
    assert_eq!(cleared["published"], true);
}

#[test]
fn delete_echoes_removed_article() {
    let (_dir, db) = setup();

    let created = stdout_json(articles(&db).args(["create", "--title", "Gone", "--body", "x"]));
    let id = created["id"].as_i64().unwrap().to_string();

    let removed = stdout_json(articles(&db).args(["delete", id.as_str()]));
    assert_eq!(removed, created);

    articles(&db)
        .args(["delete", id.as_str()])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not_found"));
}

#[test]
fn blank_title_is_a_validation_error() {
    let (_dir, db) = setup();

    articles(&db)
        .args(["create", "--title", " ", "--body", "x"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(r#""status":400"#));
}

#[test]
fn seed_is_idempotent() {
    let (_dir, db) = setup();

    let first = stdout_json(articles(&db).arg("seed"));
    assert_eq!(first["inserted"], 2);

    let second = stdout_json(articles(&db).arg("seed"));
    assert_eq!(second["inserted"], 0);
    assert_eq!(second["unchanged"], 2);
}

#[test]
fn migrate_reports_latest_schema_version() {
    let (_dir, db) = setup();

    let report = stdout_json(articles(&db).arg("migrate"));
    assert_eq!(report["schemaVersion"], report["latestVersion"]);
}

#[test]
fn misspelled_patch_key_is_a_validation_error() {
    let (_dir, db) = setup();

    let created = stdout_json(articles(&db).args(["create", "--title", "Typo", "--body", "b"]));
    let id = created["id"].as_i64().unwrap().to_string();

    articles(&db)
        .args(["update", id.as_str(), "--json", r#"{"publishd": true}"#])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(r#""status":400"#));

    let unchanged = stdout_json(articles(&db).args(["get", id.as_str()]));
    assert_eq!(unchanged, created);
}

#[test]
fn unsupported_database_scheme_is_a_client_error() {
    Command::cargo_bin("articles")
        .unwrap()
        .env_remove("DATABASE_URL")
        .args(["--database-url", "postgres://localhost/articles", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(r#""status":400"#))
        .stderr(predicate::str::contains("postgres"));
}

#[test]
fn log_level_flag_enables_stderr_logging() {
    let (_dir, db) = setup();

    articles(&db)
        .args(["--log-level", "info", "create", "--title", "Logged", "--body", "b"])
        .assert()
        .success()
        .stderr(predicate::str::contains("event=db_open"));
}

#[test]
fn missing_database_url_fails_with_internal_exit_code() {
    Command::cargo_bin("articles")
        .unwrap()
        .env_remove("DATABASE_URL")
        .arg("migrate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("DATABASE_URL"));
}

#[test]
fn database_url_is_read_from_environment() {
    let (_dir, db) = setup();

    Command::cargo_bin("articles")
        .unwrap()
        .env("DATABASE_URL", format!("sqlite://{}", db.display()))
        .args(["list", "--drafts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}
