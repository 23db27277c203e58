mod conflicts;
mod mutate;
mod types;
mod util;

pub use types::{AssignOptions, Conflict, ConflictKind};

use crate::error::Result;
use crate::model::{EmployeeId, Shift, ShiftAssignment, ShiftId};
use crate::storage::Store;
use chrono::NaiveDate;

/// Scheduler : affectations (employé, date) → turno, sans chevauchement.
pub struct Scheduler<'s, S: Store> {
    store: &'s mut S,
    opts: AssignOptions,
}

impl<'s, S: Store> Scheduler<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self::with_options(store, AssignOptions::default())
    }

    pub fn with_options(store: &'s mut S, opts: AssignOptions) -> Self {
        Self { store, opts }
    }

    /// Affecte `shift` à `employee` pour `date`.
    ///
    /// `NotFound` si le turno n'existe pas, `Conflict` si l'affectation existe
    /// déjà ou chevauche une autre affectation du même employé.
    pub fn assign(
        &mut self,
        employee: EmployeeId,
        shift: ShiftId,
        date: NaiveDate,
    ) -> Result<ShiftAssignment> {
        mutate::assign(self.store, employee, shift, date, self.opts)
    }

    /// Remplace `old` par `new` (suppression + insertion, en une unité de travail).
    pub fn reassign(
        &mut self,
        old: &ShiftAssignment,
        new: &ShiftAssignment,
    ) -> Result<ShiftAssignment> {
        mutate::reassign(self.store, old, new, self.opts)
    }

    /// Vrai si une ligne a été supprimée ; jamais d'erreur pour une affectation absente.
    pub fn unassign(&mut self, assignment: &ShiftAssignment) -> Result<bool> {
        mutate::unassign(self.store, assignment)
    }

    /// Vrai si `assign(employee, candidate.id, date)` serait refusé pour conflit.
    pub fn find_conflicts(
        &self,
        employee: EmployeeId,
        date: NaiveDate,
        candidate: &Shift,
    ) -> Result<bool> {
        let store = &*self.store;
        let key = ShiftAssignment::new(employee, candidate.id, date).key();
        if store.find_assignment(&key)?.is_some() {
            return Ok(true);
        }
        let clash = util::first_clash(store, employee, date, candidate, self.opts)?;
        tracing::debug!(%employee, %date, shift = %candidate.id, conflict = clash.is_some(), "conflict check");
        Ok(clash.is_some())
    }

    pub fn detect_conflicts(&self) -> Result<Vec<Conflict>> {
        conflicts::detect_conflicts(&*self.store, self.opts)
    }

    /// Affectations d'un employé, par date.
    pub fn by_employee(&self, employee: EmployeeId) -> Result<Vec<ShiftAssignment>> {
        let mut rows = self.store.assignments_by_employee(employee)?;
        rows.sort_by_key(|a| (a.date, a.shift));
        Ok(rows)
    }

    pub fn by_date(&self, date: NaiveDate) -> Result<Vec<ShiftAssignment>> {
        let mut rows = self.store.assignments_by_date(date)?;
        rows.sort_by_key(|a| (a.employee, a.shift));
        Ok(rows)
    }

    pub fn all(&self) -> Result<Vec<ShiftAssignment>> {
        let mut rows = self.store.all_assignments()?;
        rows.sort_by_key(|a| (a.date, a.employee, a.shift));
        Ok(rows)
    }
}
