//! Collaborateur de persistance : un trait par entité, plus l'unité de travail.
//!
//! Les clés uniques (`pertenece`, `supervisa`, `solicita`, identifiants) sont
//! vérifiées par le store lui-même et remontées en `DuplicateKey`.

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

use crate::error::{CoreError, StorageError, StorageErrorKind};
use crate::model::{
    AbsenceId, AbsenceReason, AbsenceRequest, AbsenceStatus, AssignmentKey, EmployeeId,
    RequestKey, Shift, ShiftAssignment, ShiftId, SupervisionInterval, SupervisionKey, Tables,
};
use chrono::NaiveDate;

pub type StorageResult<T> = Result<T, StorageError>;

pub trait ShiftStore {
    fn insert_shift(&mut self, shift: &Shift) -> StorageResult<()>;
    /// Vrai si une ligne a été modifiée.
    fn update_shift(&mut self, shift: &Shift) -> StorageResult<bool>;
    fn delete_shift(&mut self, id: ShiftId) -> StorageResult<bool>;
    fn find_shift(&self, id: ShiftId) -> StorageResult<Option<Shift>>;
    fn all_shifts(&self) -> StorageResult<Vec<Shift>>;
}

pub trait AssignmentStore {
    fn insert_assignment(&mut self, assignment: &ShiftAssignment) -> StorageResult<()>;
    fn delete_assignment(&mut self, key: &AssignmentKey) -> StorageResult<bool>;
    fn find_assignment(&self, key: &AssignmentKey) -> StorageResult<Option<ShiftAssignment>>;
    fn assignments_by_employee(&self, employee: EmployeeId) -> StorageResult<Vec<ShiftAssignment>>;
    fn assignments_by_date(&self, date: NaiveDate) -> StorageResult<Vec<ShiftAssignment>>;
    fn all_assignments(&self) -> StorageResult<Vec<ShiftAssignment>>;
}

pub trait SupervisionStore {
    fn insert_supervision(&mut self, interval: &SupervisionInterval) -> StorageResult<()>;
    /// Remplace la ligne de même clé ; vrai si elle existait.
    fn update_supervision(&mut self, interval: &SupervisionInterval) -> StorageResult<bool>;
    fn find_supervision(&self, key: &SupervisionKey) -> StorageResult<Option<SupervisionInterval>>;
    fn supervisions_by_employee(&self, employee: EmployeeId) -> StorageResult<Vec<SupervisionInterval>>;
    fn supervisions_by_supervisor(
        &self,
        supervisor: EmployeeId,
    ) -> StorageResult<Vec<SupervisionInterval>>;
}

pub trait AbsenceStore {
    fn insert_reason(&mut self, reason: &AbsenceReason) -> StorageResult<()>;
    fn update_reason(&mut self, reason: &AbsenceReason) -> StorageResult<bool>;
    fn delete_reason(&mut self, id: AbsenceId) -> StorageResult<bool>;
    fn find_reason(&self, id: AbsenceId) -> StorageResult<Option<AbsenceReason>>;
    fn all_reasons(&self) -> StorageResult<Vec<AbsenceReason>>;

    fn insert_request(&mut self, request: &AbsenceRequest) -> StorageResult<()>;
    fn update_request_status(
        &mut self,
        key: &RequestKey,
        status: AbsenceStatus,
    ) -> StorageResult<bool>;
    fn find_request(&self, key: &RequestKey) -> StorageResult<Option<AbsenceRequest>>;
    fn requests_by_employee(&self, employee: EmployeeId) -> StorageResult<Vec<AbsenceRequest>>;
    fn requests_by_status(&self, status: AbsenceStatus) -> StorageResult<Vec<AbsenceRequest>>;
}

/// Exécute une séquence lecture-vérification-écriture comme un tout.
///
/// En cas d'erreur de la closure, aucune des écritures faites à l'intérieur ne subsiste.
pub trait Transactional {
    fn atomically<T, F>(&mut self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(&mut Self) -> Result<T, CoreError>;
}

/// Store complet consommé par les services.
pub trait Store: ShiftStore + AssignmentStore + SupervisionStore + AbsenceStore + Transactional {}

impl<S> Store for S where
    S: ShiftStore + AssignmentStore + SupervisionStore + AbsenceStore + Transactional
{
}

/// Accès brut aux tables, commun aux stores mémoire et fichier.
pub trait TableBackend {
    fn tables(&self) -> &Tables;

    /// Applique `f` aux tables à jour et rend le résultat durable.
    ///
    /// `f` vérifie avant de muter : une erreur laisse les tables intactes.
    fn write<T, F>(&mut self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&mut Tables) -> StorageResult<T>;
}

fn duplicate(what: String) -> StorageError {
    StorageError::msg(StorageErrorKind::DuplicateKey, what)
}

fn missing_parent(what: String) -> StorageError {
    StorageError::msg(StorageErrorKind::ForeignKeyViolation, what)
}

impl<B: TableBackend> ShiftStore for B {
    fn insert_shift(&mut self, shift: &Shift) -> StorageResult<()> {
        self.write(|t| {
            if t.find_shift(shift.id).is_some() {
                return Err(duplicate(format!("turno {} already exists", shift.id)));
            }
            t.shifts.push(shift.clone());
            Ok(())
        })
    }

    fn update_shift(&mut self, shift: &Shift) -> StorageResult<bool> {
        self.write(|t| {
            let Some(row) = t.shifts.iter_mut().find(|s| s.id == shift.id) else {
                return Ok(false);
            };
            *row = shift.clone();
            Ok(true)
        })
    }

    fn delete_shift(&mut self, id: ShiftId) -> StorageResult<bool> {
        self.write(|t| {
            let before = t.shifts.len();
            t.shifts.retain(|s| s.id != id);
            Ok(t.shifts.len() != before)
        })
    }

    fn find_shift(&self, id: ShiftId) -> StorageResult<Option<Shift>> {
        Ok(self.tables().find_shift(id).cloned())
    }

    fn all_shifts(&self) -> StorageResult<Vec<Shift>> {
        Ok(self.tables().shifts.clone())
    }
}

impl<B: TableBackend> AssignmentStore for B {
    fn insert_assignment(&mut self, assignment: &ShiftAssignment) -> StorageResult<()> {
        let key = assignment.key();
        self.write(|t| {
            if t.find_shift(assignment.shift).is_none() {
                return Err(missing_parent(format!(
                    "pertenece references unknown turno {}",
                    assignment.shift
                )));
            }
            if t.assignments.iter().any(|a| a.key() == key) {
                return Err(duplicate(format!(
                    "employee {} already holds turno {} on {}",
                    key.employee, key.shift, key.date
                )));
            }
            t.assignments.push(*assignment);
            Ok(())
        })
    }

    fn delete_assignment(&mut self, key: &AssignmentKey) -> StorageResult<bool> {
        self.write(|t| {
            let before = t.assignments.len();
            t.assignments.retain(|a| a.key() != *key);
            Ok(t.assignments.len() != before)
        })
    }

    fn find_assignment(&self, key: &AssignmentKey) -> StorageResult<Option<ShiftAssignment>> {
        Ok(self
            .tables()
            .assignments
            .iter()
            .find(|a| a.key() == *key)
            .copied())
    }

    fn assignments_by_employee(&self, employee: EmployeeId) -> StorageResult<Vec<ShiftAssignment>> {
        Ok(self
            .tables()
            .assignments
            .iter()
            .filter(|a| a.employee == employee)
            .copied()
            .collect())
    }

    fn assignments_by_date(&self, date: NaiveDate) -> StorageResult<Vec<ShiftAssignment>> {
        Ok(self
            .tables()
            .assignments
            .iter()
            .filter(|a| a.date == date)
            .copied()
            .collect())
    }

    fn all_assignments(&self) -> StorageResult<Vec<ShiftAssignment>> {
        Ok(self.tables().assignments.clone())
    }
}

impl<B: TableBackend> SupervisionStore for B {
    fn insert_supervision(&mut self, interval: &SupervisionInterval) -> StorageResult<()> {
        let key = interval.key();
        self.write(|t| {
            if t.supervisions.iter().any(|s| s.key() == key) {
                return Err(duplicate(format!(
                    "supervision {} -> {} from {} already exists",
                    key.supervisor, key.employee, key.start
                )));
            }
            t.supervisions.push(*interval);
            Ok(())
        })
    }

    fn update_supervision(&mut self, interval: &SupervisionInterval) -> StorageResult<bool> {
        let key = interval.key();
        self.write(|t| {
            let Some(row) = t.supervisions.iter_mut().find(|s| s.key() == key) else {
                return Ok(false);
            };
            *row = *interval;
            Ok(true)
        })
    }

    fn find_supervision(&self, key: &SupervisionKey) -> StorageResult<Option<SupervisionInterval>> {
        Ok(self
            .tables()
            .supervisions
            .iter()
            .find(|s| s.key() == *key)
            .copied())
    }

    fn supervisions_by_employee(&self, employee: EmployeeId) -> StorageResult<Vec<SupervisionInterval>> {
        Ok(self
            .tables()
            .supervisions
            .iter()
            .filter(|s| s.employee == employee)
            .copied()
            .collect())
    }

    fn supervisions_by_supervisor(
        &self,
        supervisor: EmployeeId,
    ) -> StorageResult<Vec<SupervisionInterval>> {
        Ok(self
            .tables()
            .supervisions
            .iter()
            .filter(|s| s.supervisor == supervisor)
            .copied()
            .collect())
    }
}

impl<B: TableBackend> AbsenceStore for B {
    fn insert_reason(&mut self, reason: &AbsenceReason) -> StorageResult<()> {
        self.write(|t| {
            if t.find_reason(reason.id).is_some() {
                return Err(duplicate(format!("ausencia {} already exists", reason.id)));
            }
            t.reasons.push(reason.clone());
            Ok(())
        })
    }

    fn update_reason(&mut self, reason: &AbsenceReason) -> StorageResult<bool> {
        self.write(|t| {
            let Some(row) = t.reasons.iter_mut().find(|r| r.id == reason.id) else {
                return Ok(false);
            };
            *row = reason.clone();
            Ok(true)
        })
    }

    fn delete_reason(&mut self, id: AbsenceId) -> StorageResult<bool> {
        self.write(|t| {
            if t.requests.iter().any(|r| r.reason == id) {
                return Err(missing_parent(format!(
                    "ausencia {id} is still referenced by solicita"
                )));
            }
            let before = t.reasons.len();
            t.reasons.retain(|r| r.id != id);
            Ok(t.reasons.len() != before)
        })
    }

    fn find_reason(&self, id: AbsenceId) -> StorageResult<Option<AbsenceReason>> {
        Ok(self.tables().find_reason(id).cloned())
    }

    fn all_reasons(&self) -> StorageResult<Vec<AbsenceReason>> {
        Ok(self.tables().reasons.clone())
    }

    fn insert_request(&mut self, request: &AbsenceRequest) -> StorageResult<()> {
        let key = request.key();
        self.write(|t| {
            if t.find_reason(request.reason).is_none() {
                return Err(missing_parent(format!(
                    "solicita references unknown ausencia {}",
                    request.reason
                )));
            }
            if t.requests.iter().any(|r| r.key() == key) {
                return Err(duplicate(format!(
                    "request of employee {} for ausencia {} on {} already exists",
                    key.employee, key.reason, key.requested_on
                )));
            }
            t.requests.push(*request);
            Ok(())
        })
    }

    fn update_request_status(
        &mut self,
        key: &RequestKey,
        status: AbsenceStatus,
    ) -> StorageResult<bool> {
        self.write(|t| {
            let Some(row) = t.requests.iter_mut().find(|r| r.key() == *key) else {
                return Ok(false);
            };
            row.status = status;
            Ok(true)
        })
    }

    fn find_request(&self, key: &RequestKey) -> StorageResult<Option<AbsenceRequest>> {
        Ok(self
            .tables()
            .requests
            .iter()
            .find(|r| r.key() == *key)
            .copied())
    }

    fn requests_by_employee(&self, employee: EmployeeId) -> StorageResult<Vec<AbsenceRequest>> {
        Ok(self
            .tables()
            .requests
            .iter()
            .filter(|r| r.employee == employee)
            .copied()
            .collect())
    }

    fn requests_by_status(&self, status: AbsenceStatus) -> StorageResult<Vec<AbsenceRequest>> {
        Ok(self
            .tables()
            .requests
            .iter()
            .filter(|r| r.status == status)
            .copied()
            .collect())
    }
}
