use crate::error::{CoreError, Result};
use crate::model::{Shift, ShiftId};
use crate::storage::Store;
use chrono::NaiveTime;

/// Résultat d'une insertion dans le catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Un turno portant le même identifiant existe déjà ; rien n'a été écrit.
    AlreadyExists,
}

/// Catalogue des turnos.
pub struct ShiftCatalog<'s, S: Store> {
    store: &'s mut S,
}

impl<'s, S: Store> ShiftCatalog<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Crée un turno avec l'identifiant suivant (max + 1).
    pub fn create(&mut self, description: &str, start: NaiveTime, end: NaiveTime) -> Result<Shift> {
        let shift = self.store.atomically(|tx| {
            let next = tx
                .all_shifts()?
                .iter()
                .map(|s| s.id.get())
                .max()
                .unwrap_or(0)
                + 1;
            let shift =
                Shift::new(ShiftId::new(next), description, start, end).map_err(CoreError::Validation)?;
            tx.insert_shift(&shift)?;
            Ok(shift)
        })?;
        tracing::info!(id = %shift.id, description = %shift.description, "turno created");
        Ok(shift)
    }

    /// Insère un turno dont l'identifiant est fourni par l'appelant.
    ///
    /// Garde contre la collision d'identifiant uniquement : deux turnos de même
    /// description et mêmes horaires sont permis.
    pub fn insert(&mut self, shift: &Shift) -> Result<InsertOutcome> {
        if shift.description.trim().is_empty() {
            return Err(CoreError::Validation("shift description cannot be empty".into()));
        }
        let outcome = self.store.atomically(|tx| {
            if tx.find_shift(shift.id)?.is_some() {
                return Ok(InsertOutcome::AlreadyExists);
            }
            tx.insert_shift(shift)?;
            Ok(InsertOutcome::Inserted)
        })?;
        if outcome == InsertOutcome::AlreadyExists {
            tracing::warn!(id = %shift.id, "turno already exists, insert skipped");
        }
        Ok(outcome)
    }

    pub fn update(&mut self, shift: &Shift) -> Result<Shift> {
        if shift.description.trim().is_empty() {
            return Err(CoreError::Validation("shift description cannot be empty".into()));
        }
        let updated = self.store.atomically(|tx| Ok(tx.update_shift(shift)?))?;
        if !updated {
            return Err(CoreError::NotFound(format!("turno {}", shift.id)));
        }
        Ok(shift.clone())
    }

    /// Supprime sans vérifier les affectations qui le référencent.
    pub fn delete(&mut self, id: ShiftId) -> Result<bool> {
        let removed = self.store.atomically(|tx| Ok(tx.delete_shift(id)?))?;
        tracing::info!(%id, removed, "turno delete");
        Ok(removed)
    }

    pub fn find(&self, id: ShiftId) -> Result<Option<Shift>> {
        Ok(self.store.find_shift(id)?)
    }

    /// Tous les turnos, triés par identifiant.
    pub fn list(&self) -> Result<Vec<Shift>> {
        let mut shifts = self.store.all_shifts()?;
        shifts.sort_by_key(|s| s.id);
        Ok(shifts)
    }
}
