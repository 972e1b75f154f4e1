//! Persisted chart records: one row per chart key pointing at its last generated file.
//!
//! A record only says where a chart was written. Whether the chart is still valid is decided
//! by the cache service, which checks that the file exists.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use wardchart_core::ChartType;

const REGISTRY_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRecord {
    pub key: String,
    pub chart_type: ChartType,
    /// Relative to the cache's output root.
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The caller-controlled part of a [`ChartRecord`]; timestamps are set by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub chart_type: ChartType,
    pub file_path: String,
    pub title: Option<String>,
}

impl RecordFields {
    pub fn new(chart_type: ChartType, file_path: impl Into<String>, title: Option<&str>) -> Self {
        Self {
            chart_type,
            file_path: file_path.into(),
            title: title.map(str::to_string),
        }
    }
}

pub trait ChartRegistry: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<ChartRecord>>;

    /// All records in insertion order.
    fn list(&self) -> Result<Vec<ChartRecord>>;

    /// Atomic read-modify-write of one key.
    ///
    /// `decide` sees the current record (if any) while the registry lock is held. Returning
    /// `Some(fields)` creates the record or overwrites its fields and bumps `updated_at`;
    /// `None` leaves the registry untouched. Returns the record as stored afterwards.
    fn upsert_with(
        &self,
        key: &str,
        decide: &mut dyn FnMut(Option<&ChartRecord>) -> Option<RecordFields>,
    ) -> Result<Option<ChartRecord>>;

    /// Removes every record matching `predicate`, returning how many were removed.
    fn remove_where(&self, predicate: &mut dyn FnMut(&ChartRecord) -> bool) -> Result<usize>;

    /// Unconditional create-or-overwrite.
    fn upsert(&self, key: &str, fields: RecordFields) -> Result<ChartRecord> {
        let mut fields = Some(fields);
        self.upsert_with(key, &mut |_| fields.take())?
            .ok_or_else(|| Error::Registry {
                message: format!("upsert of `{key}` stored nothing"),
            })
    }

    fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.remove_where(&mut |r| r.key == key)? > 0)
    }
}

impl<R: ChartRegistry + ?Sized> ChartRegistry for Arc<R> {
    fn get(&self, key: &str) -> Result<Option<ChartRecord>> {
        (**self).get(key)
    }

    fn list(&self) -> Result<Vec<ChartRecord>> {
        (**self).list()
    }

    fn upsert_with(
        &self,
        key: &str,
        decide: &mut dyn FnMut(Option<&ChartRecord>) -> Option<RecordFields>,
    ) -> Result<Option<ChartRecord>> {
        (**self).upsert_with(key, decide)
    }

    fn remove_where(&self, predicate: &mut dyn FnMut(&ChartRecord) -> bool) -> Result<usize> {
        (**self).remove_where(predicate)
    }
}

#[derive(Debug, Clone, Default)]
struct RecordTable {
    records: IndexMap<String, ChartRecord>,
}

impl RecordTable {
    /// Returns the stored record and whether anything changed.
    fn upsert_with(
        &mut self,
        key: &str,
        decide: &mut dyn FnMut(Option<&ChartRecord>) -> Option<RecordFields>,
        now: DateTime<Utc>,
    ) -> (Option<ChartRecord>, bool) {
        let Some(fields) = decide(self.records.get(key)) else {
            return (self.records.get(key).cloned(), false);
        };
        let record = match self.records.get_mut(key) {
            Some(existing) => {
                existing.chart_type = fields.chart_type;
                existing.file_path = fields.file_path;
                existing.title = fields.title;
                existing.updated_at = now;
                existing.clone()
            }
            None => {
                let record = ChartRecord {
                    key: key.to_string(),
                    chart_type: fields.chart_type,
                    file_path: fields.file_path,
                    title: fields.title,
                    created_at: now,
                    updated_at: now,
                };
                self.records.insert(key.to_string(), record.clone());
                record
            }
        };
        (Some(record), true)
    }

    fn remove_where(&mut self, predicate: &mut dyn FnMut(&ChartRecord) -> bool) -> usize {
        let before = self.records.len();
        self.records.retain(|_, r| !predicate(r));
        before - self.records.len()
    }
}

fn lock_poisoned<T>(_: std::sync::PoisonError<T>) -> Error {
    Error::Registry {
        message: "registry lock poisoned".to_string(),
    }
}

/// In-process registry; contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    table: Mutex<RecordTable>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> Result<MutexGuard<'_, RecordTable>> {
        self.table.lock().map_err(lock_poisoned)
    }
}

impl ChartRegistry for MemoryRegistry {
    fn get(&self, key: &str) -> Result<Option<ChartRecord>> {
        Ok(self.table()?.records.get(key).cloned())
    }

    fn list(&self) -> Result<Vec<ChartRecord>> {
        Ok(self.table()?.records.values().cloned().collect())
    }

    fn upsert_with(
        &self,
        key: &str,
        decide: &mut dyn FnMut(Option<&ChartRecord>) -> Option<RecordFields>,
    ) -> Result<Option<ChartRecord>> {
        let (record, _) = self.table()?.upsert_with(key, decide, Utc::now());
        Ok(record)
    }

    fn remove_where(&self, predicate: &mut dyn FnMut(&ChartRecord) -> bool) -> Result<usize> {
        Ok(self.table()?.remove_where(predicate))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    version: u32,
    records: Vec<ChartRecord>,
}

/// Registry persisted as one JSON document.
///
/// Every operation reloads the file, so several handles (or processes run one after the other)
/// see each other's writes. Writes go to a temporary sibling file that is then renamed over
/// the target, so a crash never leaves a truncated registry behind. The in-process mutex
/// serializes read-modify-write cycles; other processes are not locked out.
#[derive(Debug)]
pub struct JsonFileRegistry {
    path: PathBuf,
    guard: Mutex<()>,
}

impl JsonFileRegistry {
    /// Nothing is read until the first operation; a missing file is an empty registry.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<RecordTable> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RecordTable::default());
            }
            Err(e) => return Err(Error::io(&self.path, e)),
        };
        let file: RegistryFile = serde_json::from_str(&text)?;
        if file.version != REGISTRY_FORMAT_VERSION {
            return Err(Error::Registry {
                message: format!(
                    "{}: unsupported registry version {} (expected {})",
                    self.path.display(),
                    file.version,
                    REGISTRY_FORMAT_VERSION
                ),
            });
        }
        let mut table = RecordTable::default();
        for record in file.records {
            table.records.insert(record.key.clone(), record);
        }
        Ok(table)
    }

    fn save(&self, table: &RecordTable) -> Result<()> {
        let file = RegistryFile {
            version: REGISTRY_FORMAT_VERSION,
            records: table.records.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        crate::write_atomic(&self.path, json.as_bytes())?;
        tracing::debug!(
            path = %self.path.display(),
            records = file.records.len(),
            "saved registry"
        );
        Ok(())
    }
}

impl ChartRegistry for JsonFileRegistry {
    fn get(&self, key: &str) -> Result<Option<ChartRecord>> {
        let _guard = self.guard.lock().map_err(lock_poisoned)?;
        Ok(self.load()?.records.get(key).cloned())
    }

    fn list(&self) -> Result<Vec<ChartRecord>> {
        let _guard = self.guard.lock().map_err(lock_poisoned)?;
        Ok(self.load()?.records.into_values().collect())
    }

    fn upsert_with(
        &self,
        key: &str,
        decide: &mut dyn FnMut(Option<&ChartRecord>) -> Option<RecordFields>,
    ) -> Result<Option<ChartRecord>> {
        let _guard = self.guard.lock().map_err(lock_poisoned)?;
        let mut table = self.load()?;
        let (record, changed) = table.upsert_with(key, decide, Utc::now());
        if changed {
            self.save(&table)?;
        }
        Ok(record)
    }

    fn remove_where(&self, predicate: &mut dyn FnMut(&ChartRecord) -> bool) -> Result<usize> {
        let _guard = self.guard.lock().map_err(lock_poisoned)?;
        let mut table = self.load()?;
        let removed = table.remove_where(predicate);
        if removed > 0 {
            self.save(&table)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_keeps_created_at_and_bumps_updated_at() {
        let registry = MemoryRegistry::new();
        let first = registry
            .upsert("a", RecordFields::new(ChartType::Pie, "a_pie.svg", None))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = registry
            .upsert("a", RecordFields::new(ChartType::Bar, "a_bar.svg", Some("Title")))
            .unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(second.chart_type, ChartType::Bar);
        assert_eq!(registry.list().unwrap().len(), 1);
    }

    #[test]
    fn declining_upsert_leaves_the_record_alone() {
        let registry = MemoryRegistry::new();
        let stored = registry.upsert_with("k", &mut |_| None).unwrap();
        assert!(stored.is_none());
        assert!(registry.get("k").unwrap().is_none());
    }

    #[test]
    fn remove_where_counts_removed_records() {
        let registry = MemoryRegistry::new();
        for key in ["a", "b", "c"] {
            registry
                .upsert(key, RecordFields::new(ChartType::Pie, format!("{key}.svg"), None))
                .unwrap();
        }
        assert_eq!(registry.remove_where(&mut |r| r.key != "b").unwrap(), 2);
        assert!(registry.remove("b").unwrap());
        assert!(!registry.remove("b").unwrap());
    }
}
