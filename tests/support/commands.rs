//! Command helper methods for Test.

use std::process::Output;

use assert_cmd::Command;

use super::Test;

impl Test {
    /// A cellar command bound to this environment.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("cellar").expect("failed to find cellar binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("CELLAR_STORE", self.store_dir());
        cmd.env("CELLAR_KEYRING", self.keyring_dir());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("CELLAR_CONFIG");
        cmd.env_remove("CELLAR_LOG");
        cmd.current_dir(self.dir.path());
        cmd
    }

    /// Run with `args` and collect the output.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .unwrap_or_else(|e| panic!("failed to run cellar {:?}: {}", args, e))
    }

    /// Shortcut for `cellar keys generate`.
    pub fn generate(&self, name: &str, email: &str) -> Output {
        self.run(&["keys", "generate", "--name", name, "--email", email])
    }

    /// Shortcut for `cellar init`.
    pub fn init_cmd(&self, recipients: &[&str]) -> Output {
        let mut args = vec!["init"];
        args.extend_from_slice(recipients);
        self.run(&args)
    }

    /// Shortcut for `cellar insert`, piping the secret on stdin.
    pub fn insert(&self, path: &str, secret: &str) -> Output {
        self.insert_with(path, secret, &[])
    }

    /// `cellar insert` with extra arguments such as fields.
    pub fn insert_with(&self, path: &str, secret: &str, extra: &[&str]) -> Output {
        self.cmd()
            .arg("insert")
            .arg(path)
            .args(extra)
            .write_stdin(format!("{}\n", secret))
            .output()
            .expect("failed to run cellar insert")
    }

    /// Shortcut for `cellar show`.
    pub fn show(&self, path: &str) -> Output {
        self.run(&["show", path])
    }

    /// Shortcut for `cellar rm`.
    pub fn rm(&self, path: &str) -> Output {
        self.run(&["rm", path])
    }

    /// Shortcut for `cellar ls`.
    pub fn ls(&self) -> Output {
        self.run(&["ls"])
    }

    /// Fingerprint of the key matching `query`, via `keys list --json`.
    pub fn fingerprint(&self, query: &str) -> String {
        let output = self.run(&["keys", "list", "--json"]);
        super::assert_success(&output);
        let keys: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("keys list --json is not JSON");
        keys.as_array()
            .expect("keys list --json is not an array")
            .iter()
            .find(|k| k["email"] == query || k["key_id"] == query)
            .and_then(|k| k["fingerprint"].as_str())
            .unwrap_or_else(|| panic!("no key matching {}", query))
            .to_string()
    }
}
