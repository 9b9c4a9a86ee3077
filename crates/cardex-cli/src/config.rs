//! Run configuration: where the store lives, where snapshots go, and which
//! transactions to run.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Shape of `cardex.toml`, layered with `CARDEX_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
  #[serde(default = "default_store_path")]
  pub store_path:   PathBuf,
  #[serde(default = "default_output_dir")]
  pub output_dir:   PathBuf,
  /// Transaction descriptor files, run in this order.
  #[serde(default)]
  pub transactions: Vec<PathBuf>,
}

fn default_store_path() -> PathBuf { PathBuf::from("cardex.sqlite") }

fn default_output_dir() -> PathBuf { PathBuf::from("result") }

impl AppConfig {
  /// Read `path` (optional) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("CARDEX"))
      .build()
      .context("failed to read config file")?;

    let mut app: Self = settings
      .try_deserialize()
      .context("failed to deserialise AppConfig")?;

    app.store_path = expand_tilde(&app.store_path);
    Ok(app)
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
  use std::fs;

  use tempfile::TempDir;

  use super::*;

  #[test]
  fn reads_transactions_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cardex.toml");
    fs::write(
      &path,
      r#"
store_path   = "/var/lib/cardex/cards.sqlite"
output_dir   = "out"
transactions = ["transactions/sides.toml", "transactions/factions.toml"]
"#,
    )
    .unwrap();

    let app = AppConfig::load(&path).unwrap();
    assert_eq!(app.store_path, PathBuf::from("/var/lib/cardex/cards.sqlite"));
    assert_eq!(app.output_dir, PathBuf::from("out"));
    assert_eq!(
      app.transactions,
      [PathBuf::from("transactions/sides.toml"), PathBuf::from("transactions/factions.toml")]
    );
  }

  #[test]
  fn missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let app = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(app.output_dir, PathBuf::from("result"));
    assert!(app.transactions.is_empty());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    assert_eq!(expand_tilde(Path::new("~/cards.sqlite")), PathBuf::from(home).join("cards.sqlite"));
    assert_eq!(expand_tilde(Path::new("cards.sqlite")), PathBuf::from("cards.sqlite"));
  }
}
