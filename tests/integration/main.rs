//! Integration tests for reelgap

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn reelgap() -> Command {
        let mut cmd = cargo_bin_cmd!("reelgap");
        cmd.env_remove("REELGAP_CONFIG").env_remove("RUST_LOG");
        cmd
    }

    /// Temp dir holding a config whose cache lives next to it
    fn workspace(extra: &str) -> (TempDir, PathBuf) {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        let cache_dir = temp.path().join("cache");
        fs::write(
            &config_path,
            format!(
                "[cache]\ndir = \"{}\"\n{}",
                cache_dir.display().to_string().replace('\\', "\\\\"),
                extra
            ),
        )
        .unwrap();
        (temp, config_path)
    }

    fn seed_entry(cache_dir: &Path, ns: &str, cat: &str, key: &str, expired: bool) {
        let dir = cache_dir.join(ns).join(cat);
        fs::create_dir_all(&dir).unwrap();
        let (cached, expires) = if expired {
            ("2020-01-01T00:00:00Z", "2020-01-02T00:00:00Z")
        } else {
            ("2020-01-01T00:00:00Z", "2999-01-01T00:00:00Z")
        };
        fs::write(
            dir.join(format!("{}.json", key)),
            format!(
                r#"{{"_cache_meta":{{"cached_at":"{}","expires_at":"{}","ttl_hours":24,"description":"test"}},"data":{{}}}}"#,
                cached, expires
            ),
        )
        .unwrap();
    }

    #[test]
    fn help_displays() {
        reelgap()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Find missing movies"));
    }

    #[test]
    fn version_displays() {
        reelgap()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("reelgap"));
    }

    #[test]
    fn config_path_uses_flag_and_env() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");

        reelgap()
            .args(["config", "path", "-c"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));

        reelgap()
            .args(["config", "path"])
            .env("REELGAP_CONFIG", &path)
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show_defaults_and_masks_secrets() {
        let (_temp, config) = workspace("[plex]\ntoken = \"abcdef123456\"\n");

        reelgap()
            .args(["config", "show", "-c"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("http://localhost:32400"))
            .stdout(predicate::str::contains("****3456"))
            .stdout(predicate::str::contains("abcdef").not());
    }

    #[test]
    fn config_show_expands_environment() {
        let (_temp, config) = workspace("[tmdb]\napi_key = \"${REELGAP_IT_TMDB_KEY}\"\n");

        reelgap()
            .args(["config", "show", "-c"])
            .arg(&config)
            .env("REELGAP_IT_TMDB_KEY", "tmdb-key-7777")
            .assert()
            .success()
            .stdout(predicate::str::contains("****7777"));
    }

    #[test]
    fn config_validate_reports_missing_credentials() {
        let (_temp, config) = workspace("");

        reelgap()
            .args(["config", "validate", "-c"])
            .arg(&config)
            .assert()
            .failure()
            .stdout(predicate::str::contains("plex.token is not set"))
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn config_validate_accepts_complete_config() {
        let (_temp, config) = workspace(
            "[plex]\ntoken = \"t\"\n[tmdb]\napi_key = \"k\"\n[tvdb]\napi_key = \"k\"\n",
        );

        reelgap()
            .args(["config", "validate", "-c"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("is valid"));
    }

    #[test]
    fn invalid_toml_is_reported() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        fs::write(&config, "[options\nmin_owned = ").unwrap();

        reelgap()
            .args(["config", "show", "-c"])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn config_init_respects_force() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("nested").join("config.toml");

        reelgap()
            .args(["config", "init", "-c"])
            .arg(&config)
            .assert()
            .success();
        assert!(config.exists());

        reelgap()
            .args(["config", "init", "-c"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));

        reelgap()
            .args(["config", "init", "--force", "-c"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("initialized"));
    }

    #[test]
    fn config_set_then_show() {
        let (_temp, config) = workspace("");

        reelgap()
            .args(["config", "set", "options.min_owned", "1", "-c"])
            .arg(&config)
            .assert()
            .success();

        reelgap()
            .args(["config", "show", "-c"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("min_owned = 1"));
    }

    #[test]
    fn config_set_rejects_unknown_key() {
        let (_temp, config) = workspace("");

        reelgap()
            .args(["config", "set", "vm.name", "x", "-c"])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn cache_path_follows_config() {
        let (temp, config) = workspace("");

        reelgap()
            .args(["cache", "path", "-c"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains(
                temp.path().join("cache").display().to_string(),
            ));
    }

    #[test]
    fn cache_stats_empty_and_populated() {
        let (temp, config) = workspace("");

        reelgap()
            .args(["cache", "stats", "-c"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache is empty"));

        let cache_dir = temp.path().join("cache");
        seed_entry(&cache_dir, "tmdb", "movies", "348", false);
        seed_entry(&cache_dir, "tmdb", "collections", "8091", true);

        reelgap()
            .args(["cache", "stats", "-c"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("Entries: 2"))
            .stdout(predicate::str::contains("1 expired entry"));
    }

    #[test]
    fn cache_sweep_removes_expired() {
        let (temp, config) = workspace("");
        let cache_dir = temp.path().join("cache");
        seed_entry(&cache_dir, "tmdb", "movies", "348", false);
        seed_entry(&cache_dir, "tvdb", "episodes", "81189", true);

        reelgap()
            .args(["cache", "sweep", "-c"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("Swept 1 expired entry"));

        assert!(cache_dir.join("tmdb/movies/348.json").exists());
        assert!(!cache_dir.join("tvdb/episodes/81189.json").exists());
    }

    #[test]
    fn cache_clear_requires_confirmation() {
        let (temp, config) = workspace("");
        let cache_dir = temp.path().join("cache");
        seed_entry(&cache_dir, "tmdb", "movies", "348", false);

        reelgap()
            .args(["cache", "clear", "-c"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("Aborted"));
        assert!(cache_dir.join("tmdb/movies/348.json").exists());

        reelgap()
            .args(["cache", "clear", "--yes", "-c"])
            .arg(&config)
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed 1 cache entry"));
        assert!(!cache_dir.join("tmdb/movies/348.json").exists());
    }

    #[test]
    fn cache_clear_unknown_namespace_fails() {
        let (_temp, config) = workspace("");

        reelgap()
            .args(["cache", "clear", "--namespace", "imdb", "--yes", "-c"])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown cache namespace"));
    }

    #[test]
    fn movies_without_plex_token_fails() {
        let (_temp, config) = workspace("");

        reelgap()
            .args(["movies", "-c"])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Plex is not configured"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn episodes_dry_run_reports_config_problems() {
        let (_temp, config) = workspace("");

        reelgap()
            .args(["episodes", "--dry-run", "-c"])
            .arg(&config)
            .assert()
            .failure()
            .stdout(predicate::str::contains("tvdb.api_key is not set"))
            .stdout(predicate::str::contains("tmdb.api_key").not());
    }

    #[test]
    fn scan_runs_movies_first() {
        let (_temp, config) = workspace("");

        reelgap()
            .args(["scan", "-c"])
            .arg(&config)
            .assert()
            .failure()
            .stdout(predicate::str::contains("Movie Collections"))
            .stdout(predicate::str::contains("TV Episodes").not())
            .stderr(predicate::str::contains("Plex is not configured"));
    }

    #[test]
    fn scan_dry_run_checks_movie_config_first() {
        let (_temp, config) = workspace("[plex]\ntoken = \"t\"\n[tvdb]\napi_key = \"k\"\n");

        reelgap()
            .args(["scan", "--dry-run", "-c"])
            .arg(&config)
            .assert()
            .failure()
            .stdout(predicate::str::contains("tmdb.api_key is not set"))
            .stdout(predicate::str::contains("tvdb.api_key").not());
    }

    #[test]
    fn unreachable_plex_fails_cleanly() {
        let (_temp, config) = workspace(
            "[plex]\nurl = \"http://127.0.0.1:9\"\ntoken = \"t\"\n[retry]\nmax_retries = 0\n",
        );

        reelgap()
            .args(["movies", "--library", "Movies", "-c"])
            .arg(&config)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }
}
