//! Integration tests for rbxsync

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn rbxsync() -> Command {
        cargo_bin_cmd!("rbxsync")
    }

    #[test]
    fn help_displays() {
        rbxsync()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Content-addressed asset sync"));
    }

    #[test]
    fn version_displays() {
        rbxsync()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("rbxsync"));
    }

    #[test]
    fn config_path_honors_override() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("rbxsync.toml");
        rbxsync()
            .args(["--config", config.to_str().unwrap(), "config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("rbxsync.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("rbxsync.toml");
        rbxsync()
            .args(["--config", config.to_str().unwrap(), "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[sync]"))
            .stdout(predicate::str::contains("search_path = \"assets\""));
    }

    #[test]
    fn config_init_then_refuses_overwrite() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("rbxsync.toml");

        rbxsync()
            .args(["--config", config.to_str().unwrap(), "config", "init"])
            .assert()
            .success();
        assert!(config.exists());

        rbxsync()
            .args(["--config", config.to_str().unwrap(), "config", "init"])
            .assert()
            .success()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn sync_empty_directory_writes_nothing() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("assets")).unwrap();
        let cache = temp.path().join("cache.json");
        let output = temp.path().join("assetMap.ts");

        rbxsync()
            .current_dir(temp.path())
            .args([
                "sync",
                "--path",
                "assets",
                "--cache",
                cache.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ])
            .assert()
            .success();

        assert!(!cache.exists());
        assert!(!output.exists());
    }

    #[test]
    fn sync_missing_directory_fails() {
        let temp = TempDir::new().unwrap();
        rbxsync()
            .current_dir(temp.path())
            .args(["sync", "--path", "no-such-dir"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn add_rejects_non_numeric_id() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("icon.png");
        std::fs::write(&file, b"x").unwrap();

        rbxsync()
            .current_dir(temp.path())
            .args(["add", file.to_str().unwrap(), "12ab"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn install_without_repo_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        rbxsync()
            .current_dir(temp.path())
            .args(["install", "ui-kit"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("shared map repository"));
    }
}
