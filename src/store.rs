use std::{
  env, fs,
  path::PathBuf,
  sync::Mutex,
  time::{SystemTime, UNIX_EPOCH},
};

use crate::error::BracketError;
use crate::types::Bracket;

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn default_brackets_path() -> PathBuf {
  if let Some(value) = env_default("BRACKETS_PATH") {
    return PathBuf::from(value);
  }
  PathBuf::from("brackets.json")
}

pub fn now_ms() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as u64
}

// ── Bracket Repository ─────────────────────────────────────────────────

/// Durable store for whole-bracket snapshots. `save` upserts by bracket id;
/// `delete` is idempotent. Each call fully succeeds or fully fails.
pub trait BracketStore {
  fn list(&self) -> Result<Vec<Bracket>, BracketError>;
  fn save(&self, bracket: &Bracket) -> Result<(), BracketError>;
  fn delete(&self, bracket_id: &str) -> Result<(), BracketError>;
}

/// All brackets in one pretty-printed JSON document, read and written whole.
pub struct JsonBracketStore {
  path: PathBuf,
}

impl JsonBracketStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    JsonBracketStore { path: path.into() }
  }

  /// Store at `BRACKETS_PATH` if set, else `brackets.json` in the working
  /// directory.
  pub fn open_default() -> Self {
    JsonBracketStore::new(default_brackets_path())
  }

  fn read_all(&self) -> Result<Vec<Bracket>, BracketError> {
    if !self.path.is_file() {
      return Ok(Vec::new());
    }
    let data = fs::read_to_string(&self.path)
      .map_err(|e| BracketError::Store(format!("read brackets {}: {e}", self.path.display())))?;
    serde_json::from_str(&data)
      .map_err(|e| BracketError::Store(format!("parse brackets {}: {e}", self.path.display())))
  }

  fn write_all(&self, brackets: &[Bracket]) -> Result<(), BracketError> {
    let payload = serde_json::to_string_pretty(brackets)
      .map_err(|e| BracketError::Store(e.to_string()))?;
    if let Some(parent) = self.path.parent() {
      if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)
          .map_err(|e| BracketError::Store(format!("create {}: {e}", parent.display())))?;
      }
    }
    fs::write(&self.path, payload)
      .map_err(|e| BracketError::Store(format!("write brackets {}: {e}", self.path.display())))
  }
}

impl BracketStore for JsonBracketStore {
  fn list(&self) -> Result<Vec<Bracket>, BracketError> {
    self.read_all()
  }

  fn save(&self, bracket: &Bracket) -> Result<(), BracketError> {
    let mut brackets = self.read_all()?;
    match brackets.iter_mut().find(|b| b.id == bracket.id) {
      Some(existing) => *existing = bracket.clone(),
      None => brackets.push(bracket.clone()),
    }
    self.write_all(&brackets)
  }

  fn delete(&self, bracket_id: &str) -> Result<(), BracketError> {
    let mut brackets = self.read_all()?;
    brackets.retain(|b| b.id != bracket_id);
    self.write_all(&brackets)
  }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryBracketStore {
  brackets: Mutex<Vec<Bracket>>,
}

impl MemoryBracketStore {
  pub fn new() -> Self {
    MemoryBracketStore::default()
  }
}

impl BracketStore for MemoryBracketStore {
  fn list(&self) -> Result<Vec<Bracket>, BracketError> {
    let guard = self.brackets.lock().unwrap_or_else(|e| e.into_inner());
    Ok(guard.clone())
  }

  fn save(&self, bracket: &Bracket) -> Result<(), BracketError> {
    let mut guard = self.brackets.lock().unwrap_or_else(|e| e.into_inner());
    match guard.iter_mut().find(|b| b.id == bracket.id) {
      Some(existing) => *existing = bracket.clone(),
      None => guard.push(bracket.clone()),
    }
    Ok(())
  }

  fn delete(&self, bracket_id: &str) -> Result<(), BracketError> {
    let mut guard = self.brackets.lock().unwrap_or_else(|e| e.into_inner());
    guard.retain(|b| b.id != bracket_id);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::bracket::build_bracket;
  use crate::types::Entrant;

  fn sample_bracket(now_ms: u64) -> Bracket {
    let entrants: Vec<Entrant> = (0..4)
      .map(|i| Entrant {
        id: format!("team-{i}"),
        name: format!("Team {i}"),
        emblem: None,
      })
      .collect();
    build_bracket("Copa", &entrants, 9, now_ms).unwrap()
  }

  fn temp_store(label: &str) -> JsonBracketStore {
    let path = env::temp_dir().join(format!("bracket-engine-{label}-{}.json", now_ms()));
    let _ = fs::remove_file(&path);
    JsonBracketStore::new(path)
  }

  #[test]
  fn missing_file_lists_empty() {
    let store = temp_store("missing");
    assert!(store.list().unwrap().is_empty());
  }

  #[test]
  fn json_store_round_trips_a_snapshot() {
    let store = temp_store("roundtrip");
    let bracket = sample_bracket(1);
    store.save(&bracket).unwrap();

    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], bracket);

    // Upsert keeps one record per id.
    let mut updated = bracket.clone();
    updated.name = "Copa Final".to_string();
    store.save(&updated).unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "Copa Final");

    store.delete(&bracket.id).unwrap();
    assert!(store.list().unwrap().is_empty());
    let _ = fs::remove_file(&store.path);
  }

  #[test]
  fn delete_is_idempotent() {
    let store = temp_store("idempotent");
    let bracket = sample_bracket(2);
    store.save(&bracket).unwrap();
    store.delete(&bracket.id).unwrap();
    store.delete(&bracket.id).unwrap();
    assert!(store.list().unwrap().is_empty());
    let _ = fs::remove_file(&store.path);
  }

  #[test]
  fn memory_store_upserts_and_deletes() {
    let store = MemoryBracketStore::new();
    let one = sample_bracket(1);
    let two = sample_bracket(2);
    store.save(&one).unwrap();
    store.save(&two).unwrap();
    assert_eq!(store.list().unwrap().len(), 2);

    let mut renamed = one.clone();
    renamed.name = "Renamed".to_string();
    store.save(&renamed).unwrap();
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|b| b.name == "Renamed"));

    store.delete(&two.id).unwrap();
    assert_eq!(store.list().unwrap().len(), 1);
  }
}
