use super::{StorageResult, TableBackend, Transactional};
use crate::error::CoreError;
use crate::model::Tables;

/// Store en mémoire, sans durabilité. Sert aux tests et aux traitements ponctuels.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Tables,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(tables: Tables) -> Self {
        Self { tables }
    }

    pub fn into_tables(self) -> Tables {
        self.tables
    }
}

impl TableBackend for MemoryStore {
    fn tables(&self) -> &Tables {
        &self.tables
    }

    fn write<T, F>(&mut self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Tables) -> StorageResult<T>,
    {
        f(&mut self.tables)
    }
}

impl Transactional for MemoryStore {
    fn atomically<T, F>(&mut self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Self) -> Result<T, CoreError>,
    {
        // l'emprunt exclusif sérialise déjà ; il ne reste qu'à annuler en cas d'échec
        let snapshot = self.tables.clone();
        let out = f(self);
        if out.is_err() {
            self.tables = snapshot;
        }
        out
    }
}
