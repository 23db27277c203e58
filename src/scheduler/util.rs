use super::{AssignOptions, ConflictKind};
use crate::error::{CoreError, Result};
use crate::model::{EmployeeId, Shift, ShiftAssignment, ShiftId};
use crate::overlap;
use crate::storage::{AssignmentStore, ShiftStore};
use chrono::NaiveDate;

pub(super) fn require_shift<S>(store: &S, id: ShiftId) -> Result<Shift>
where
    S: ShiftStore + ?Sized,
{
    store
        .find_shift(id)?
        .ok_or_else(|| CoreError::NotFound(format!("turno {id}")))
}

/// Règle de conflit entre un turno déjà posé et un candidat.
pub(super) fn clash(
    existing_date: NaiveDate,
    existing: &Shift,
    date: NaiveDate,
    candidate: &Shift,
    opts: AssignOptions,
) -> Option<ConflictKind> {
    let gap = (date - existing_date).num_days();
    if gap == 0 {
        if opts.exclusive_day {
            return Some(ConflictKind::DoubleAssignment);
        }
        if overlap::overlaps(existing.start, existing.end, candidate.start, candidate.end) {
            return Some(ConflictKind::Overlap);
        }
        return None;
    }
    if gap.abs() == 1 && opts.check_adjacent_days {
        let a = overlap::effective_interval(existing_date, existing.start, existing.end);
        let b = overlap::effective_interval(date, candidate.start, candidate.end);
        if overlap::intervals_overlap(a, b) {
            return Some(ConflictKind::AdjacentDay);
        }
    }
    None
}

/// Premier conflit entre `candidate` posé sur `date` et les affectations de `employee`.
pub(super) fn first_clash<S>(
    store: &S,
    employee: EmployeeId,
    date: NaiveDate,
    candidate: &Shift,
    opts: AssignOptions,
) -> Result<Option<(ShiftAssignment, ConflictKind)>>
where
    S: AssignmentStore + ShiftStore + ?Sized,
{
    for row in store.assignments_by_employee(employee)? {
        if row.date == date && row.shift == candidate.id {
            continue;
        }
        if (row.date - date).num_days().abs() > 1 {
            continue;
        }
        let Some(existing) = store.find_shift(row.shift)? else {
            // référence orpheline (turno supprimé) : n'occupe plus de créneau
            tracing::debug!(shift = %row.shift, "skipping orphaned assignment");
            continue;
        };
        if let Some(kind) = clash(row.date, &existing, date, candidate, opts) {
            return Ok(Some((row, kind)));
        }
    }
    Ok(None)
}

pub(super) fn describe(kind: ConflictKind, existing: &ShiftAssignment, candidate: &Shift) -> String {
    match kind {
        ConflictKind::Overlap => format!(
            "turno {} overlaps turno {} already assigned to employee {} on {}",
            candidate.id, existing.shift, existing.employee, existing.date
        ),
        ConflictKind::DoubleAssignment => format!(
            "employee {} already has turno {} on {}",
            existing.employee, existing.shift, existing.date
        ),
        ConflictKind::AdjacentDay => format!(
            "turno {} runs into turno {} assigned to employee {} on {}",
            candidate.id, existing.shift, existing.employee, existing.date
        ),
    }
}
