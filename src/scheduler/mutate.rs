use super::{util, AssignOptions};
use crate::error::{CoreError, Result};
use crate::error::StorageErrorKind;
use crate::model::{EmployeeId, ShiftAssignment, ShiftId};
use crate::storage::Store;
use chrono::NaiveDate;

/// Vérifie puis insère, à l'intérieur d'une unité de travail déjà ouverte.
fn checked_insert<S: Store>(
    tx: &mut S,
    assignment: ShiftAssignment,
    opts: AssignOptions,
) -> Result<ShiftAssignment> {
    let shift = util::require_shift(&*tx, assignment.shift)?;

    if tx.find_assignment(&assignment.key())?.is_some() {
        return Err(CoreError::Conflict(format!(
            "employee {} already holds turno {} on {}",
            assignment.employee, assignment.shift, assignment.date
        )));
    }

    if let Some((existing, kind)) =
        util::first_clash(&*tx, assignment.employee, assignment.date, &shift, opts)?
    {
        return Err(CoreError::Conflict(util::describe(kind, &existing, &shift)));
    }

    match tx.insert_assignment(&assignment) {
        Ok(()) => Ok(assignment),
        // concurrent writer got there first
        Err(err) if err.kind() == StorageErrorKind::DuplicateKey => {
            Err(CoreError::Conflict(err.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

pub(super) fn assign<S: Store>(
    store: &mut S,
    employee: EmployeeId,
    shift: ShiftId,
    date: NaiveDate,
    opts: AssignOptions,
) -> Result<ShiftAssignment> {
    let candidate = ShiftAssignment::new(employee, shift, date);
    let out = store.atomically(|tx| checked_insert(tx, candidate, opts));
    match &out {
        Ok(_) => tracing::info!(%employee, %shift, %date, "turno assigned"),
        Err(err) => tracing::warn!(%employee, %shift, %date, %err, "assignment rejected"),
    }
    out
}

pub(super) fn reassign<S: Store>(
    store: &mut S,
    old: &ShiftAssignment,
    new: &ShiftAssignment,
    opts: AssignOptions,
) -> Result<ShiftAssignment> {
    let out = store.atomically(|tx| {
        if !tx.delete_assignment(&old.key())? {
            return Err(CoreError::NotFound(format!(
                "assignment of employee {} to turno {} on {}",
                old.employee, old.shift, old.date
            )));
        }
        checked_insert(tx, *new, opts)
    });
    match &out {
        Ok(_) => tracing::info!(
            employee = %new.employee,
            shift = %new.shift,
            date = %new.date,
            "assignment moved"
        ),
        Err(err) => tracing::warn!(%err, "reassignment rejected"),
    }
    out
}

pub(super) fn unassign<S: Store>(store: &mut S, assignment: &ShiftAssignment) -> Result<bool> {
    let removed = store.atomically(|tx| Ok(tx.delete_assignment(&assignment.key())?))?;
    tracing::info!(
        employee = %assignment.employee,
        shift = %assignment.shift,
        date = %assignment.date,
        removed,
        "unassign"
    );
    Ok(removed)
}
