//! Durable per-user, per-month record collections.
//!
//! Every collection is a map `user → month → payload`. A missing file is an
//! empty collection, and so is a corrupt one once a `.corrupt` backup copy
//! exists. Saving rewrites the whole file. A file that cannot be read, or a
//! corrupt one that cannot be backed up, is never written over by `update`.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::{Exchange, Expense, Income, MonthKey, ResultEngine};

/// Records of a user grouped by month.
pub type MonthMap<T> = BTreeMap<MonthKey, T>;
/// Full collection, keyed by user id first.
pub type Collection<T> = BTreeMap<String, MonthMap<T>>;

pub type Expenses = Collection<Vec<Expense>>;
pub type Incomes = Collection<Income>;
pub type Exchanges = Collection<Vec<Exchange>>;
pub type Budgets = Collection<f64>;
/// Every record id ever handed out, per user. Deleting a record keeps its id here.
pub type IssuedIds = BTreeMap<String, BTreeSet<String>>;

/// The persisted collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Expenses,
    Incomes,
    Exchanges,
    Budgets,
    IssuedIds,
}

impl RecordKind {
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            RecordKind::Expenses => "gastos.json",
            RecordKind::Incomes => "ingresos.json",
            RecordKind::Exchanges => "intercambios.json",
            RecordKind::Budgets => "presupuestos.json",
            RecordKind::IssuedIds => "ids.json",
        }
    }

    const fn index(self) -> usize {
        match self {
            RecordKind::Expenses => 0,
            RecordKind::Incomes => 1,
            RecordKind::Exchanges => 2,
            RecordKind::Budgets => 3,
            RecordKind::IssuedIds => 4,
        }
    }
}

/// Load/save contract of the ledger's persistence.
pub trait RecordStore: Send + Sync {
    /// Loads a whole collection. Missing or unreadable data yields `T::default()`.
    fn load<T>(&self, kind: RecordKind) -> T
    where
        T: DeserializeOwned + Default;

    /// Rewrites a whole collection.
    fn save<T>(&self, kind: RecordKind, collection: &T) -> ResultEngine<()>
    where
        T: Serialize;

    /// Runs one load-modify-save cycle while holding the collection's lock.
    ///
    /// When `f` fails nothing is written and the error is returned. Data that
    /// exists but cannot be read safely is an error too, never an empty start.
    fn update<T, R, F>(&self, kind: RecordKind, f: F) -> ResultEngine<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> ResultEngine<R>;
}

/// Stores each collection as a pretty-printed JSON file inside `dir`.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    locks: [Mutex<()>; 5],
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Default::default(),
        }
    }

    #[must_use]
    pub fn path(&self, kind: RecordKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    /// Reads the collection of `kind`, backing up a file that does not decode.
    fn read_collection<T>(&self, kind: RecordKind) -> ResultEngine<T>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(kind);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(err) => return Err(err.into()),
        };

        match serde_json::from_slice(&raw) {
            Ok(collection) => Ok(collection),
            Err(err) => {
                let backup = backup_path(&path);
                fs::write(&backup, &raw)?;
                tracing::warn!(
                    "corrupt {} ({err}); kept a copy at {} and starting empty",
                    path.display(),
                    backup.display()
                );
                Ok(T::default())
            }
        }
    }
}

impl RecordStore for JsonFileStore {
    fn load<T>(&self, kind: RecordKind) -> T
    where
        T: DeserializeOwned + Default,
    {
        let _guard = self.locks[kind.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.read_collection(kind).unwrap_or_else(|err| {
            tracing::warn!("cannot read {}: {err}; using an empty collection", self.path(kind).display());
            T::default()
        })
    }

    fn save<T>(&self, kind: RecordKind, collection: &T) -> ResultEngine<()>
    where
        T: Serialize,
    {
        let _guard = self.locks[kind.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        write_json_file(&self.path(kind), collection)
    }

    fn update<T, R, F>(&self, kind: RecordKind, f: F) -> ResultEngine<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> ResultEngine<R>,
    {
        let _guard = self.locks[kind.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut collection: T = self.read_collection(kind)?;
        let out = f(&mut collection)?;
        write_json_file(&self.path(kind), &collection)?;
        Ok(out)
    }
}

/// Keeps every collection in memory as JSON values. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<RecordKind, serde_json::Value>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn load<T>(&self, kind: RecordKind) -> T
    where
        T: DeserializeOwned + Default,
    {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .get(&kind)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default()
    }

    fn save<T>(&self, kind: RecordKind, collection: &T) -> ResultEngine<()>
    where
        T: Serialize,
    {
        let value = serde_json::to_value(collection)?;
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        guard.insert(kind, value);
        Ok(())
    }

    fn update<T, R, F>(&self, kind: RecordKind, f: F) -> ResultEngine<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> ResultEngine<R>,
    {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut collection: T = guard
            .get(&kind)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or_default();
        let out = f(&mut collection)?;
        guard.insert(kind, serde_json::to_value(&collection)?);
        Ok(out)
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}

fn write_json_file<T: Serialize>(path: &Path, collection: &T) -> ResultEngine<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(collection)?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, json)?;
    match fs::rename(&tmp, path) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(&tmp, path)?;
            let _ = fs::remove_file(&tmp);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let budgets: Budgets = store.load(RecordKind::Budgets);
        assert!(budgets.is_empty());
    }

    #[test]
    fn save_then_load_keeps_months_ordered() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let mut budgets = Budgets::new();
        let months = budgets.entry("42".to_string()).or_default();
        months.insert(MonthKey::parse("2025-02").unwrap(), 300.0);
        months.insert(MonthKey::parse("2024-12").unwrap(), 500.0);
        store.save(RecordKind::Budgets, &budgets).unwrap();

        let loaded: Budgets = store.load(RecordKind::Budgets);
        let keys: Vec<&str> = loaded["42"].keys().map(MonthKey::as_str).collect();
        assert_eq!(keys, ["2024-12", "2025-02"]);
    }

    #[test]
    fn corrupt_file_loads_empty_and_is_backed_up() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        fs::write(store.path(RecordKind::Expenses), "{ not json").unwrap();

        let expenses: Expenses = store.load(RecordKind::Expenses);
        assert!(expenses.is_empty());
        let backup = dir.path().join("gastos.json.corrupt");
        assert_eq!(fs::read_to_string(backup).unwrap(), "{ not json");
    }

    #[test]
    fn invalid_utf8_file_is_backed_up_before_update_rewrites_it() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let mut original =
            br#"{"42":{"2025-11":[{"id":"aa","fecha":"2025-11-01 10:00:00","bolivares":10.0,"dolares":1.0,"tipo_cambio":10.0,"categoria":"otros","descripcion":"caf"#
                .to_vec();
        original.push(0xff);
        original.extend_from_slice(br#""}]}}"#);
        fs::write(store.path(RecordKind::Expenses), &original).unwrap();

        store
            .update(RecordKind::Expenses, |all: &mut Expenses| {
                assert!(all.is_empty());
                all.entry("42".to_string()).or_default();
                Ok(())
            })
            .unwrap();

        let backup = dir.path().join("gastos.json.corrupt");
        assert_eq!(fs::read(backup).unwrap(), original);
    }

    #[test]
    fn unreadable_file_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        // A directory where the file should be fails every read with something other than NotFound.
        fs::create_dir(store.path(RecordKind::Budgets)).unwrap();

        let budgets: Budgets = store.load(RecordKind::Budgets);
        assert!(budgets.is_empty());

        let result = store.update(RecordKind::Budgets, |budgets: &mut Budgets| {
            budgets.entry("1".to_string()).or_default();
            Ok(())
        });
        assert!(matches!(result, Err(EngineError::Storage(_))));
        assert!(store.path(RecordKind::Budgets).is_dir());
    }

    #[test]
    fn failed_update_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path());
        let result: ResultEngine<()> = store.update(RecordKind::Budgets, |budgets: &mut Budgets| {
            budgets.entry("1".to_string()).or_default();
            Err(EngineError::RecordNotFound("x".to_string()))
        });
        assert!(result.is_err());
        assert!(!store.path(RecordKind::Budgets).exists());
    }

    #[test]
    fn memory_store_round_trips_through_update() {
        let store = MemoryStore::new();
        store
            .update(RecordKind::Budgets, |budgets: &mut Budgets| {
                budgets
                    .entry("7".to_string())
                    .or_default()
                    .insert(MonthKey::parse("2025-05").unwrap(), 120.0);
                Ok(())
            })
            .unwrap();
        let budgets: Budgets = store.load(RecordKind::Budgets);
        assert_eq!(budgets["7"][&MonthKey::parse("2025-05").unwrap()], 120.0);
    }
}
