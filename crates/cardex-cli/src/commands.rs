//! Subcommand implementations.

use std::path::Path;

use anyhow::{Context as _, bail};
use cardex_core::{
  EntityKind, Mode, RecordStore, Transaction, extract, snapshot, with_entity,
};
use cardex_store_sqlite::SqliteStore;
use strum::IntoEnumIterator;
use tracing::info;

use crate::config::AppConfig;

/// Close `store` whatever `outcome` was; the command's own error takes
/// precedence over a failure to close.
pub async fn close_after(store: SqliteStore, outcome: anyhow::Result<()>) -> anyhow::Result<()> {
  let closed = store.close().await;
  outcome?;
  closed.context("failed to close store")?;
  Ok(())
}

// ─── migrate ─────────────────────────────────────────────────────────────────

/// Run the configured transactions in order, writing one snapshot each.
///
/// With a non-empty `only`, transactions whose name is not listed are skipped.
pub async fn migrate(store: &SqliteStore, app: &AppConfig, only: &[String]) -> anyhow::Result<()> {
  let transactions = app
    .transactions
    .iter()
    .map(|path| Transaction::load(path).with_context(|| format!("loading {path:?}")))
    .collect::<anyhow::Result<Vec<_>>>()?;

  if let Some(unknown) = only.iter().find(|name| !transactions.iter().any(|tx| &tx.name == *name)) {
    bail!("no configured transaction named {unknown:?}");
  }

  for tx in &transactions {
    if !only.is_empty() && !only.contains(&tx.name) {
      continue;
    }
    run_transaction(store, &app.output_dir, tx)
      .await
      .with_context(|| format!("transaction {:?} failed", tx.name))?;
  }
  Ok(())
}

async fn run_transaction(
  store:      &SqliteStore,
  output_dir: &Path,
  tx:         &Transaction,
) -> anyhow::Result<()> {
  let path = output_dir.join(tx.snapshot_file());

  with_entity!(tx.entity, E => {
    let records = extract::run::<E, _>(store, tx).await?;
    // An overlay touches a subset; its snapshot covers the whole kind.
    let records = match tx.mode {
      Mode::Merge => records,
      Mode::Overlay => store.list::<E>().await?,
    };
    snapshot::write(&path, &records)?;
  });
  Ok(())
}

// ─── archive ─────────────────────────────────────────────────────────────────

/// Export every stored kind, in dependency order.
pub async fn archive(store: &SqliteStore, output_dir: &Path) -> anyhow::Result<()> {
  for kind in EntityKind::iter() {
    let path = output_dir.join(kind.snapshot_file());
    with_entity!(kind, E => {
      let records = store.list::<E>().await?;
      snapshot::write(&path, &records)?;
    });
  }
  info!(output_dir = %output_dir.display(), "archive complete");
  Ok(())
}

// ─── inspect ─────────────────────────────────────────────────────────────────

/// Load one descriptor and its sources and report how they join.
pub fn inspect(descriptor: &Path) -> anyhow::Result<()> {
  let tx = Transaction::load(descriptor)?;
  let survey = extract::survey(&tx).with_context(|| format!("reading sources of {:?}", tx.name))?;

  info!(
    transaction = %tx.name,
    entity = %tx.entity,
    mode = ?tx.mode,
    oracle = survey.oracle,
    locale = survey.locale,
    matched = survey.matched,
    keyless = survey.keyless,
    "inspected"
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::{fs, path::PathBuf};

  use cardex_core::records::Side;
  use tempfile::TempDir;

  use super::*;

  async fn store() -> SqliteStore {
    SqliteStore::open_in_memory()
      .await
      .expect("in-memory store")
  }

  fn app(dir: &Path, transactions: Vec<PathBuf>) -> AppConfig {
    AppConfig {
      store_path:   dir.join("cardex.sqlite"),
      output_dir:   dir.join("result"),
      transactions,
    }
  }

  fn write_sides(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir.join("oracle")).unwrap();
    fs::write(dir.join("oracle/sides.json"), r#"[{ "id": "corp", "name": "Corp" }]"#).unwrap();

    let descriptor = dir.join("sides.toml");
    fs::write(
      &descriptor,
      format!(
        "name = \"sides\"\nentity = \"side\"\noracle_file = {:?}\n\n[[oracle_fields]]\nsource = \"name\"\nfield = \"oracle_name\"\n",
        dir.join("oracle/sides.json"),
      ),
    )
    .unwrap();
    descriptor
  }

  // ─── migrate ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn migrate_writes_one_snapshot_per_transaction() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path(), vec![write_sides(dir.path())]);
    let s = store().await;

    migrate(&s, &app, &[]).await.unwrap();

    let text = fs::read_to_string(dir.path().join("result/sides.json")).unwrap();
    assert!(text.contains("\"oracle_name\": \"Corp\""));
    assert_eq!(s.count(EntityKind::Side).await.unwrap(), 1);
  }

  #[tokio::test]
  async fn unknown_only_name_is_rejected_before_running() {
    let dir = TempDir::new().unwrap();
    let app = app(dir.path(), vec![write_sides(dir.path())]);
    let s = store().await;

    let err = migrate(&s, &app, &["sides".into(), "ghosts".into()]).await.unwrap_err();
    assert!(err.to_string().contains("ghosts"));
    assert_eq!(s.count(EntityKind::Side).await.unwrap(), 0);
    assert!(!dir.path().join("result").exists());
  }

  #[tokio::test]
  async fn overlay_snapshot_covers_the_whole_kind() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("sides.csv"), "id,name\ncorp,Corporación\n").unwrap();
    let tx = Transaction {
      name:          "sides-locale".into(),
      entity:        EntityKind::Side,
      mode:          Mode::Overlay,
      oracle_file:   PathBuf::new(),
      locale_file:   dir.path().join("sides.csv"),
      oracle_id:     "id".into(),
      locale_id:     "id".into(),
      link_id:       "id".into(),
      oracle_fields: vec![],
      locale_fields: vec![cardex_core::FieldMapping {
        source: "name".into(),
        field:  "locale_name".into(),
      }],
      nested:        None,
      faces:         None,
      references:    vec![],
      snapshot:      Some("sides.json".into()),
    };

    let s = store().await;
    for codename in ["corp", "runner"] {
      s.save(Side { codename: codename.into(), ..Side::default() }).await.unwrap();
    }

    let out = dir.path().join("result");
    run_transaction(&s, &out, &tx).await.unwrap();

    let text = fs::read_to_string(out.join("sides.json")).unwrap();
    let exported: Vec<serde_json::Value> = serde_json::from_str(&text).unwrap();
    assert_eq!(exported.len(), 2);
    assert_eq!(exported[0]["locale_name"], "Corporación");
    assert_eq!(exported[1]["codename"], "runner");
  }

  // ─── close_after ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn store_is_closed_when_the_command_fails() {
    let s = store().await;
    let handle = s.clone();

    let err = close_after(s, Err(anyhow::anyhow!("transaction failed"))).await.unwrap_err();
    assert_eq!(err.to_string(), "transaction failed");
    assert!(handle.count(EntityKind::Side).await.is_err());
  }

  #[tokio::test]
  async fn store_is_closed_on_success() {
    let s = store().await;
    let handle = s.clone();

    close_after(s, Ok(())).await.unwrap();
    assert!(handle.count(EntityKind::Side).await.is_err());
  }
}
