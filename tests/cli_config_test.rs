//! Integration tests for `tt config` and configuration precedence.

mod common;

use common::TestEnv;
use predicates::prelude::*;

fn value<'a>(show: &'a serde_json::Value, key: &str) -> &'a serde_json::Value {
    show["values"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["key"] == key)
        .unwrap()
}

#[test]
fn test_config_show_defaults() {
    let env = TestEnv::new();

    let show = env.json(&["config", "show"]);
    let db = value(&show, "database-path");
    assert_eq!(db["source"], "default");
    assert_eq!(
        db["value"],
        env.data_path().join("tasks.db").display().to_string()
    );
    assert_eq!(value(&show, "output-format")["value"], "json");
    assert_eq!(value(&show, "changelog-limit")["value"], serde_json::Value::Null);
}

#[test]
fn test_config_set_writes_kdl() {
    let env = TestEnv::new();

    let json = env.json(&["config", "set", "changelog-limit", "2"]);
    assert_eq!(json["key"], "changelog-limit");

    let content = std::fs::read_to_string(env.data_path().join("config.kdl")).unwrap();
    assert!(content.contains("changelog-limit"));

    let show = env.json(&["config", "show"]);
    let limit = value(&show, "changelog-limit");
    assert_eq!(limit["value"], "2");
    assert_eq!(limit["source"], "config");
}

#[test]
fn test_config_set_rejects_bad_values() {
    let env = TestEnv::new();

    env.tt()
        .args(["config", "set", "output-format", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(r#""kind":"config""#));

    env.tt()
        .args(["config", "set", "colour", "blue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown config key 'colour'"));

    assert!(!env.data_path().join("config.kdl").exists());
}

#[test]
fn test_configured_changelog_limit_is_default_for_log() {
    let env = TestEnv::new();
    env.json(&["config", "set", "changelog-limit", "1"]);
    env.create("project", "A", None);
    env.create("project", "B", None);

    assert_eq!(env.json(&["log"])["count"], 1);
    assert_eq!(env.json(&["log", "--limit", "0"])["count"], 2);
}

#[test]
fn test_configured_human_output() {
    let env = TestEnv::new();
    env.json(&["config", "set", "output-format", "human"]);

    env.tt()
        .args(["create", "project", "Website"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[ ] #1 project: Website"));

    env.tt()
        .args(["show", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::starts_with("Error: "));
}

#[test]
fn test_database_path_precedence() {
    let env = TestEnv::new();
    env.json(&["config", "set", "database-path", "from-config.db"]);

    let show = env.json(&["config", "show"]);
    let db = value(&show, "database-path");
    assert_eq!(db["source"], "config");
    assert_eq!(
        db["value"],
        env.data_path().join("from-config.db").display().to_string()
    );

    let env_db = env.data_path().join("from-env.db");
    let output = env
        .tt()
        .env("TT_DB", &env_db)
        .args(["config", "show"])
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value(&show, "database-path")["source"], "env:TT_DB");

    let flag_db = env.data_path().join("from-flag.db");
    let output = env
        .tt()
        .env("TT_DB", &env_db)
        .args(["--db", flag_db.to_str().unwrap(), "config", "show"])
        .output()
        .unwrap();
    let show: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value(&show, "database-path")["source"], "cli");
    assert_eq!(
        value(&show, "database-path")["value"],
        flag_db.display().to_string()
    );
}
