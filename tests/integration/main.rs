//! Integration tests for composer-layer

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn composer_layer() -> Command {
        cargo_bin_cmd!("composer-layer")
    }

    #[test]
    fn help_displays() {
        composer_layer()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Composer").and(predicate::str::contains("detect")));
    }

    #[test]
    fn version_displays() {
        composer_layer()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("composer-layer"));
    }

    #[test]
    fn build_requires_layers_dir() {
        composer_layer()
            .arg("build")
            .env_remove("CNB_LAYERS_DIR")
            .assert()
            .failure()
            .stderr(predicate::str::contains("--layers"));
    }

    #[test]
    fn detect_writes_plan() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("composer.json"),
            r#"{"require": {"php": "^8.1"}}"#,
        )
        .unwrap();
        let plan = temp.path().join("plan.toml");

        composer_layer()
            .args(["detect", "--working-dir"])
            .arg(temp.path())
            .arg("--plan")
            .arg(&plan)
            .env_remove("COMPOSER")
            .env_remove("BP_PHP_VERSION")
            .env_remove("BP_COMPOSER_VERSION")
            .assert()
            .success();

        let written = std::fs::read_to_string(plan).unwrap();
        assert!(written.contains("name = \"composer\""));
        assert!(written.contains("name = \"php\""));
        assert!(written.contains("version = \"^8.1\""));
        assert!(written.contains("version-source = \"composer.json\""));
    }

    #[test]
    fn detect_without_manifest_exits_100() {
        let temp = TempDir::new().unwrap();

        composer_layer()
            .args(["detect", "--working-dir"])
            .arg(temp.path())
            .arg("--plan")
            .arg(temp.path().join("plan.toml"))
            .env_remove("COMPOSER")
            .assert()
            .code(100)
            .stderr(predicate::str::contains("no composer.json found"));
    }
}

#[cfg(unix)]
mod build_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const FAKE_COMPOSER: &str = r#"#!/bin/sh
echo "$*" >> "$FAKE_COMPOSER_CALLS"
case "$1" in
  install)
    mkdir -p vendor
    touch vendor/autoload.php
    ;;
  check-platform-reqs)
    echo "ext-foo   1.0   missing"
    echo "ext-json  8.1   success"
    echo "php       8.1   success"
    exit 2
    ;;
esac
if [ -n "$FAKE_COMPOSER_FAIL" ] && [ "$1" = "$FAKE_COMPOSER_FAIL" ]; then
  echo "Your requirements could not be resolved" >&2
  exit 1
fi
exit 0
"#;

    struct Workspace {
        temp: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            for dir in ["app", "layers", "bin"] {
                std::fs::create_dir_all(temp.path().join(dir)).unwrap();
            }
            std::fs::write(temp.path().join("app/composer.json"), "{}").unwrap();
            std::fs::write(temp.path().join("app/composer.lock"), r#"{"packages": []}"#)
                .unwrap();
            std::fs::write(
                temp.path().join("plan.toml"),
                "[[entries]]\nname = \"composer-packages\"\n[entries.metadata]\nlaunch = true\n",
            )
            .unwrap();

            let script = temp.path().join("bin/composer");
            std::fs::write(&script, FAKE_COMPOSER).unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

            Self { temp }
        }

        fn path(&self, relative: &str) -> PathBuf {
            self.temp.path().join(relative)
        }

        fn calls(&self) -> Vec<String> {
            std::fs::read_to_string(self.path("calls.log"))
                .unwrap_or_default()
                .lines()
                .map(String::from)
                .collect()
        }

        fn build(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("composer-layer");
            cmd.arg("build")
                .arg("--working-dir")
                .arg(self.path("app"))
                .arg("--layers")
                .arg(self.path("layers"))
                .arg("--plan")
                .arg(self.path("plan.toml"))
                .env("PATH", search_path(&self.path("bin")))
                .env("CNB_STACK_ID", "io.buildpacks.stacks.jammy")
                .env("PHP_EXTENSION_DIR", "/php/lib/ext")
                .env("FAKE_COMPOSER_CALLS", self.path("calls.log"))
                .env_remove("BP_LOG_LEVEL")
                .env_remove("BP_COMPOSER_INSTALL_GLOBAL")
                .env_remove("BP_COMPOSER_INSTALL_OPTIONS")
                .env_remove("COMPOSER")
                .env_remove("COMPOSER_VENDOR_DIR")
                .env_remove("FAKE_COMPOSER_FAIL");
            cmd
        }
    }

    fn search_path(bin: &Path) -> String {
        format!("{}:/usr/bin:/bin", bin.display())
    }

    #[test]
    fn build_installs_then_reuses() {
        let ws = Workspace::new();

        ws.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("Running 'composer install'"));

        assert_eq!(
            ws.calls(),
            vec![
                "install --no-progress --no-dev --no-autoloader",
                "dump-autoload --classmap-authoritative",
                "check-platform-reqs",
            ]
        );
        assert!(ws.path("app/vendor/autoload.php").is_file());
        assert_eq!(
            std::fs::read_link(ws.path("app/vendor")).unwrap(),
            ws.path("layers/composer-packages/vendor")
        );
        assert_eq!(
            std::fs::read_to_string(ws.path("app/.php.ini.d/composer-extensions.ini")).unwrap(),
            "extension = foo.so\n"
        );
        let record = std::fs::read_to_string(ws.path("layers/composer-packages.toml")).unwrap();
        assert!(record.contains("composer-lock-sha"));
        assert!(record.contains("io.buildpacks.stacks.jammy"));

        ws.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("Reusing cached layer"));

        let calls = ws.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[3], "check-platform-reqs");
    }

    #[test]
    fn changed_lock_file_rebuilds() {
        let ws = Workspace::new();
        ws.build().assert().success();

        std::fs::write(ws.path("app/composer.lock"), r#"{"packages": [{}]}"#).unwrap();
        ws.build()
            .assert()
            .success()
            .stdout(predicate::str::contains("Reusing cached layer").not());

        let installs = ws.calls().iter().filter(|c| c.starts_with("install")).count();
        assert_eq!(installs, 2);
    }

    #[test]
    fn failed_install_surfaces_output() {
        let ws = Workspace::new();

        ws.build()
            .env("FAKE_COMPOSER_FAIL", "install")
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains("Your requirements could not be resolved"))
            .stderr(predicate::str::contains("Error:"));

        assert!(!ws.path("app/vendor").exists());
    }
}
