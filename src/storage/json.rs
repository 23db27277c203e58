use super::{StorageResult, TableBackend, Transactional};
use crate::error::{CoreError, StorageError, StorageErrorKind};
use crate::model::Tables;
use anyhow::Context;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};
use tempfile::NamedTempFile;

/// Au-delà, un verrou est considéré abandonné quel que soit son détenteur.
const LOCK_STALE_AFTER: Duration = Duration::from_secs(10 * 60);

/// Store fichier : un document JSON contenant toutes les tables.
///
/// Toute écriture, dans une unité de travail ou non, prend un verrou exclusif
/// `<fichier>.lock`, relit le document, applique la mutation sur les tables
/// fraîches puis réécrit le fichier de manière atomique (temporaire + rename).
/// Les lectures hors unité de travail portent sur la dernière copie chargée.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    tables: Tables,
    in_unit: Arc<AtomicBool>,
}

impl JsonStore {
    /// Ouvre le document ; un fichier absent équivaut à des tables vides.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let tables = read_tables(&path)?;
        tracing::debug!(path = %path.display(), "store opened");
        Ok(Self {
            path,
            tables,
            in_unit: Arc::default(),
        })
    }

    fn lock_path(&self) -> PathBuf {
        let mut raw = self.path.as_os_str().to_owned();
        raw.push(".lock");
        PathBuf::from(raw)
    }

    /// Verrou, relecture, `f`, puis une seule écriture si les tables ont changé.
    /// Sur erreur de `f` ou de l'écriture, les tables reviennent à l'état relu.
    fn locked_unit<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        E: From<StorageError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let _lock = LockGuard::acquire(self.lock_path())?;
        self.tables = read_tables(&self.path)?;
        let snapshot = self.tables.clone();

        let out = {
            let _unit = UnitFlag::raise(&self.in_unit);
            f(self)
        };

        match out {
            Ok(value) => {
                if self.tables != snapshot {
                    if let Err(err) = write_tables(&self.path, &self.tables) {
                        self.tables = snapshot;
                        return Err(err.into());
                    }
                }
                Ok(value)
            }
            Err(err) => {
                self.tables = snapshot;
                Err(err)
            }
        }
    }

    fn in_unit(&self) -> bool {
        self.in_unit.load(Ordering::Acquire)
    }
}

impl TableBackend for JsonStore {
    fn tables(&self) -> &Tables {
        &self.tables
    }

    fn write<T, F>(&mut self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Tables) -> StorageResult<T>,
    {
        if self.in_unit() {
            return f(&mut self.tables);
        }
        self.locked_unit(|store| f(&mut store.tables))
    }
}

impl Transactional for JsonStore {
    fn atomically<T, F>(&mut self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Self) -> Result<T, CoreError>,
    {
        if self.in_unit() {
            return f(self);
        }
        self.locked_unit(f)
    }
}

/// Marque le store « dans une unité de travail » ; retombe au drop, panique comprise.
struct UnitFlag(Arc<AtomicBool>);

impl UnitFlag {
    fn raise(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(Arc::clone(flag))
    }
}

impl Drop for UnitFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn read_tables(path: &Path) -> StorageResult<Tables> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Tables::default()),
        Err(err) => {
            return Err(StorageError::new(
                StorageErrorKind::ConnectionFailure,
                anyhow::Error::new(err).context(format!("reading {}", path.display())),
            ))
        }
    };
    serde_json::from_slice(&data)
        .with_context(|| format!("parsing {}", path.display()))
        .map_err(|e| StorageError::new(StorageErrorKind::Unknown, e))
}

fn write_tables(path: &Path, tables: &Tables) -> StorageResult<()> {
    let write = || -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(tables)?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).with_context(|| "atomic rename")?;
        Ok(())
    };
    write()
        .with_context(|| format!("writing {}", path.display()))
        .map_err(|e| StorageError::new(StorageErrorKind::UpdateFailure, e))
}

/// Verrou exclusif inter-processus, libéré au drop.
///
/// Le fichier contient le pid du détenteur. Un verrou dont le détenteur n'existe
/// plus, ou plus vieux que [`LOCK_STALE_AFTER`], est cassé une fois.
struct LockGuard {
    path: PathBuf,
}

enum Holder {
    Gone,
    Live,
    Stale(String),
}

impl LockGuard {
    fn acquire(path: PathBuf) -> StorageResult<Self> {
        let mut broken = false;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(err) = writeln!(file, "{}", std::process::id()) {
                        tracing::warn!(path = %path.display(), %err, "could not record lock holder");
                    }
                    return Ok(Self { path });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists && !broken => {
                    match inspect_lock(&path) {
                        Holder::Live => return Err(locked(&path)),
                        Holder::Gone => {}
                        Holder::Stale(why) => {
                            tracing::warn!(path = %path.display(), %why, "breaking stale store lock");
                            match fs::remove_file(&path) {
                                Ok(()) => {}
                                Err(err) if err.kind() == ErrorKind::NotFound => {}
                                Err(err) => {
                                    return Err(StorageError::new(
                                        StorageErrorKind::ConnectionFailure,
                                        anyhow::Error::new(err)
                                            .context(format!("removing stale lock {}", path.display())),
                                    ))
                                }
                            }
                        }
                    }
                    broken = true;
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => return Err(locked(&path)),
                Err(err) => {
                    return Err(StorageError::new(
                        StorageErrorKind::ConnectionFailure,
                        anyhow::Error::new(err).context(format!("creating lock {}", path.display())),
                    ))
                }
            }
        }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), %err, "could not release store lock");
        }
    }
}

fn locked(path: &Path) -> StorageError {
    StorageError::msg(
        StorageErrorKind::ConnectionFailure,
        format!("store is locked by another process ({})", path.display()),
    )
}

fn inspect_lock(path: &Path) -> Holder {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == ErrorKind::NotFound => return Holder::Gone,
        Err(_) => return Holder::Live,
    };
    let age = meta
        .modified()
        .ok()
        .and_then(|at| at.elapsed().ok())
        .unwrap_or_default();
    if age > LOCK_STALE_AFTER {
        return Holder::Stale(format!("held for {}s", age.as_secs()));
    }
    // contenu vide ou illisible : détenteur en train d'écrire son pid
    let holder = fs::read_to_string(path)
        .ok()
        .and_then(|raw| raw.trim().parse::<u32>().ok());
    match holder {
        Some(pid) if !process_alive(pid) => Holder::Stale(format!("holder pid {pid} is gone")),
        _ => Holder::Live,
    }
}

fn process_alive(pid: u32) -> bool {
    if !sysinfo::IS_SUPPORTED_SYSTEM {
        return true;
    }
    let pid = Pid::from_u32(pid);
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        true,
        ProcessRefreshKind::nothing(),
    );
    sys.process(pid).is_some()
}
