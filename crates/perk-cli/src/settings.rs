//! Runtime settings: an optional TOML file layered under `PERK_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use perk_core::model::Preferences;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite file holding the member data. `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf { Preferences::default().store_path }

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path: default_store_path(),
    }
  }
}

impl Settings {
  /// Read `path` if it exists, then apply `PERK_*` overrides.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("PERK"))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    settings
      .try_deserialize()
      .context("failed to deserialise settings")
  }

  pub fn preferences(&self) -> Preferences {
    Preferences {
      store_path: expand_tilde(&self.store_path),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
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
  use super::*;

  #[test]
  fn missing_file_falls_back_to_defaults() {
    let path = std::env::temp_dir().join("perk-settings-does-not-exist.toml");
    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.store_path, Settings::default().store_path);
  }

  #[test]
  fn file_values_are_read() {
    let path = std::env::temp_dir()
      .join(format!("perk-settings-{}.toml", std::process::id()));
    std::fs::write(&path, "store_path = \"/srv/perk/members.sqlite3\"\n")
      .unwrap();

    let settings = Settings::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(
      settings.store_path,
      PathBuf::from("/srv/perk/members.sqlite3")
    );
  }

  #[test]
  fn tilde_is_expanded_only_at_the_start() {
    let untouched = Path::new("data/~/x.sqlite3");
    assert_eq!(expand_tilde(untouched), untouched.to_path_buf());
    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/perk.sqlite3")),
        PathBuf::from(home).join("perk.sqlite3")
      );
    }
  }
}
