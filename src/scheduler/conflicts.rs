use super::{util, AssignOptions, Conflict};
use crate::error::Result;
use crate::model::{EmployeeId, Shift, ShiftAssignment};
use crate::storage::Store;
use std::collections::BTreeMap;

/// Audit de toute la table d'affectations : chaque paire en conflit est rapportée.
pub(super) fn detect_conflicts<S: Store>(store: &S, opts: AssignOptions) -> Result<Vec<Conflict>> {
    let shifts: BTreeMap<_, Shift> = store
        .all_shifts()?
        .into_iter()
        .map(|s| (s.id, s))
        .collect();

    let mut per_employee: BTreeMap<EmployeeId, Vec<(ShiftAssignment, &Shift)>> = BTreeMap::new();
    for row in store.all_assignments()? {
        if let Some(shift) = shifts.get(&row.shift) {
            per_employee.entry(row.employee).or_default().push((row, shift));
        }
    }

    let mut out = Vec::new();
    for (employee, mut rows) in per_employee {
        rows.sort_by_key(|(a, s)| (a.date, s.start, s.id));

        for (idx, (a, shift_a)) in rows.iter().enumerate() {
            for (b, shift_b) in rows.iter().skip(idx + 1) {
                if (b.date - a.date).num_days() > 1 {
                    break;
                }
                if let Some(kind) = util::clash(a.date, shift_a, b.date, shift_b, opts) {
                    out.push(Conflict {
                        employee,
                        date_a: a.date,
                        shift_a: a.shift,
                        date_b: b.date,
                        shift_b: b.shift,
                        kind,
                    });
                }
            }
        }
    }

    if !out.is_empty() {
        tracing::warn!(count = out.len(), "conflicting assignments found");
    }
    Ok(out)
}
