use crate::model::{EmployeeId, ShiftId};
use chrono::NaiveDate;
use std::fmt;

/// Options d'affectation
#[derive(Debug, Clone, Copy, Default)]
pub struct AssignOptions {
    /// Au plus une affectation par employé et par date, quels que soient les horaires.
    pub exclusive_day: bool,
    /// Compare aussi les intervalles absolus avec la veille et le lendemain
    /// (un turno de nuit déborde sur le jour suivant).
    pub check_adjacent_days: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    /// chevauchement horaire le même jour
    Overlap,
    /// deux turnos le même jour alors que `exclusive_day` est actif
    DoubleAssignment,
    /// chevauchement avec un turno de la veille ou du lendemain
    AdjacentDay,
}

impl ConflictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictKind::Overlap => "overlap",
            ConflictKind::DoubleAssignment => "double",
            ConflictKind::AdjacentDay => "adjacent",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub employee: EmployeeId,
    pub date_a: NaiveDate,
    pub shift_a: ShiftId,
    pub date_b: NaiveDate,
    pub shift_b: ShiftId,
    pub kind: ConflictKind,
}
