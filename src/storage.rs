// Key/value storage backends for persisted snapshots

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::now_ms;

const CURRENT_VERSION: u32 = 1;

/// SQLite database filename inside the data directory
pub const DB_FILE: &str = "choredice.db";

/// A minimal string blob store addressed by key
pub trait StorageBackend {
    /// Read the value stored under `key`, or `None` if nothing is stored
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn write(&mut self, key: &str, value: &str) -> Result<()>;

    /// Drop the value stored under `key`; absent keys are not an error
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Which backend to open for a data directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Sqlite,
    File,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::File => write!(f, "file"),
        }
    }
}

/// Open the configured backend rooted at `dir`
pub fn open_backend(kind: BackendKind, dir: &Path) -> Result<Box<dyn StorageBackend>> {
    match kind {
        BackendKind::Sqlite => Ok(Box::new(SqliteBackend::open(dir)?)),
        BackendKind::File => Ok(Box::new(FileBackend::open(dir)?)),
    }
}

/// Create the data directory with its .gitignore and .version files
fn prepare_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).context("Failed to create data directory")?;

    let gitignore_path = dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(
            gitignore_path,
            format!("{db}\n{db}-shm\n{db}-wal\n*.lock\n*.tmp\n", db = DB_FILE),
        )?;
    }

    let version_path = dir.join(".version");
    if !version_path.exists() {
        fs::write(version_path, CURRENT_VERSION.to_string())?;
    }

    Ok(())
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Storage key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid storage key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}

// ============================================================================
// SQLite
// ============================================================================

/// Backend storing each key as a row in a SQLite table
pub struct SqliteBackend {
    db: Connection,
}

impl SqliteBackend {
    /// Open or create `choredice.db` inside `dir`
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        prepare_dir(dir)?;

        let db = Connection::open(dir.join(DB_FILE)).context("Failed to open SQLite database")?;
        let backend = Self { db };
        backend.create_schema()?;
        Ok(backend)
    }

    /// Open a throwaway in-memory database
    pub fn in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let backend = Self { db };
        backend.create_schema()?;
        Ok(backend)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating storage schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl StorageBackend for SqliteBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let value = self
            .db
            .query_row("SELECT value FROM storage WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.db.execute(
            "INSERT INTO storage (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, now_ms()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.db.execute("DELETE FROM storage WHERE key = ?1", [key])?;
        Ok(())
    }
}

// ============================================================================
// JSON files
// ============================================================================

/// Backend storing each key as `<key>.json` in a directory
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        prepare_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn lock_file(&self, key: &str) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(format!("{}.lock", key)))
            .context("Failed to open lock file")
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let lock = self.lock_file(key)?;
        lock.lock_shared().context("Failed to acquire shared lock")?;
        let content = fs::read_to_string(&path).context("Failed to read snapshot file")?;

        // Lock is released when `lock` is dropped
        Ok(Some(content))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", key));

        let lock = self.lock_file(key)?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let mut tmp = File::create(&tmp_path).context("Failed to create temp snapshot file")?;
        tmp.write_all(value.as_bytes())?;
        tmp.sync_all()?; // Ensure data is flushed to disk before the rename
        fs::rename(&tmp_path, &path).context("Failed to move snapshot into place")?;

        debug!(file = ?path, bytes = value.len(), "Wrote snapshot file");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path_for(key);
        if path.exists() {
            let lock = self.lock_file(key)?;
            lock.lock_exclusive().context("Failed to acquire file lock")?;
            fs::remove_file(&path).context("Failed to remove snapshot file")?;
        }
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Backend that keeps values in a map; nothing survives the process
#[derive(Debug, Default, Clone)]
pub struct MemoryBackend {
    values: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(backend: &mut dyn StorageBackend) {
        assert_eq!(backend.read("choreManager").unwrap(), None);

        backend.write("choreManager", "{\"a\":1}").unwrap();
        assert_eq!(backend.read("choreManager").unwrap().as_deref(), Some("{\"a\":1}"));

        backend.write("choreManager", "{\"a\":2}").unwrap();
        assert_eq!(backend.read("choreManager").unwrap().as_deref(), Some("{\"a\":2}"));

        backend.remove("choreManager").unwrap();
        assert_eq!(backend.read("choreManager").unwrap(), None);

        // Removing again is fine
        backend.remove("choreManager").unwrap();
    }

    #[test]
    fn test_memory_backend() {
        exercise(&mut MemoryBackend::new());
    }

    #[test]
    fn test_sqlite_backend_in_memory() {
        exercise(&mut SqliteBackend::in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_backend_creates_files() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("data");

        let mut backend = SqliteBackend::open(&dir).unwrap();
        assert!(dir.join(DB_FILE).exists());
        assert!(dir.join(".gitignore").exists());
        assert!(dir.join(".version").exists());

        exercise(&mut backend);
    }

    #[test]
    fn test_sqlite_backend_survives_reopen() {
        let temp = TempDir::new().unwrap();

        {
            let mut backend = SqliteBackend::open(temp.path()).unwrap();
            backend.write("choreManager", "persisted").unwrap();
        }

        let backend = SqliteBackend::open(temp.path()).unwrap();
        assert_eq!(backend.read("choreManager").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_file_backend() {
        let temp = TempDir::new().unwrap();
        let mut backend = FileBackend::open(temp.path()).unwrap();
        exercise(&mut backend);
    }

    #[test]
    fn test_file_backend_writes_json_file() {
        let temp = TempDir::new().unwrap();
        let mut backend = FileBackend::open(temp.path()).unwrap();

        backend.write("choreManager", "{}").unwrap();

        let path = temp.path().join("choreManager.json");
        assert_eq!(fs::read_to_string(path).unwrap(), "{}");
        assert!(!temp.path().join("choreManager.json.tmp").exists());
    }

    #[test]
    fn test_invalid_keys_rejected() {
        let mut backend = MemoryBackend::new();
        assert!(backend.write("", "x").is_err());
        assert!(backend.write("../escape", "x").is_err());
        assert!(backend.write(&"k".repeat(65), "x").is_err());
        assert!(backend.write("valid_key-1", "x").is_ok());
    }

    #[test]
    fn test_invalid_keys_rejected_on_read_and_remove() {
        let temp = TempDir::new().unwrap();
        let mut backends: Vec<Box<dyn StorageBackend>> = vec![
            Box::new(MemoryBackend::new()),
            Box::new(SqliteBackend::in_memory().unwrap()),
            Box::new(FileBackend::open(temp.path()).unwrap()),
        ];

        for backend in backends.iter_mut() {
            assert!(backend.read("").is_err());
            assert!(backend.read("../escape").is_err());
            assert!(backend.remove("../escape").is_err());
            assert!(backend.read("choreManager-rejected").unwrap().is_none());
        }
    }

    #[test]
    fn test_open_backend_by_kind() {
        let temp = TempDir::new().unwrap();

        let mut sqlite = open_backend(BackendKind::Sqlite, temp.path()).unwrap();
        sqlite.write("k", "v").unwrap();
        assert!(temp.path().join(DB_FILE).exists());

        let mut file = open_backend(BackendKind::File, temp.path()).unwrap();
        file.write("k", "v").unwrap();
        assert!(temp.path().join("k.json").exists());
    }

    #[test]
    fn test_backend_kind_display() {
        assert_eq!(BackendKind::Sqlite.to_string(), "sqlite");
        assert_eq!(BackendKind::File.to_string(), "file");
        assert_eq!(BackendKind::default(), BackendKind::Sqlite);
    }
}
