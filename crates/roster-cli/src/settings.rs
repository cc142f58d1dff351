//! CLI configuration: a TOML file layered with `ROSTER_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use roster_core::{account::Account, store::PermissionOracle};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
  /// SQLite database file. A leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:  PathBuf,
  /// Accounts present on this device.
  #[serde(default)]
  pub accounts:    Vec<Account>,
  #[serde(default)]
  pub permissions: Permissions,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/roster/roster.db") }

/// Granted permissions; everything is granted unless turned off.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Permissions {
  #[serde(default = "granted")]
  pub query:         bool,
  #[serde(default = "granted")]
  pub insert:        bool,
  #[serde(default = "granted")]
  pub update_delete: bool,
}

fn granted() -> bool { true }

impl Default for Permissions {
  fn default() -> Self { Self { query: true, insert: true, update_delete: true } }
}

impl PermissionOracle for Permissions {
  fn can_query(&self) -> bool { self.query }

  fn can_insert(&self) -> bool { self.insert }

  fn can_update_delete(&self) -> bool { self.update_delete }
}

impl CliConfig {
  /// Read `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ROSTER"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: CliConfig = settings
      .try_deserialize()
      .context("failed to deserialise CliConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  /// The configured account called `name`.
  pub fn account(&self, name: &str) -> anyhow::Result<Account> {
    self
      .accounts
      .iter()
      .find(|a| a.name == name)
      .cloned()
      .with_context(|| format!("no account named {name:?} in the config"))
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn file_values_and_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
      file,
      r#"
store_path = "/tmp/roster-test.db"

[[accounts]]
name = "ada@example.com"
type = "com.example"

[permissions]
insert = false
"#
    )
    .unwrap();

    let cfg = CliConfig::load(file.path()).unwrap();
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/roster-test.db"));
    assert_eq!(cfg.accounts, vec![Account::new("ada@example.com", "com.example")]);
    assert!(cfg.permissions.can_query());
    assert!(!cfg.permissions.can_insert());
    assert!(cfg.permissions.can_update_delete());

    assert!(cfg.account("ada@example.com").is_ok());
    assert!(cfg.account("nobody").is_err());
  }

  #[test]
  fn missing_file_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = CliConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert!(cfg.accounts.is_empty());
    assert!(cfg.permissions.can_insert());
  }

  #[test]
  fn tilde_is_expanded() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }
}
