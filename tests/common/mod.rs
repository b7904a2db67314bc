//! Common test utilities for tasktree integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/tasktree/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// Project ID used by `TestEnv::tt` (base64 of "/work/demo").
pub const PROJECT: &str = "L3dvcmsvZGVtbw==";

/// A test environment with isolated data storage.
///
/// The `tt()` method returns a `Command` that sets `TT_DATA_DIR` and
/// `TT_PROJECT` per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// A `tt` command bound to this environment and `PROJECT`.
    pub fn tt(&self) -> Command {
        let mut cmd = self.tt_without_project();
        cmd.env("TT_PROJECT", PROJECT);
        cmd
    }

    /// A `tt` command bound to this environment with no project selected.
    pub fn tt_without_project(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tt"));
        cmd.env("TT_DATA_DIR", self.data_dir.path());
        cmd.env_remove("TT_PROJECT");
        cmd.env_remove("TT_PROJECT_INFO");
        cmd.env_remove("TT_DB");
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Run `tt` with `args`, assert success, and parse stdout as JSON.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.tt().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "tt {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    /// Create an item and return its ID.
    pub fn create(&self, item_type: &str, title: &str, parent: Option<i64>) -> i64 {
        let parent = parent.map(|p| p.to_string());
        let mut args = vec!["create", item_type, title];
        if let Some(parent) = parent.as_deref() {
            args.extend(["--parent", parent]);
        }
        self.json(&args)["id"].as_i64().unwrap()
    }

    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
