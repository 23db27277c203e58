use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

int_id!(
    /// Identifiant d'un employé (géré hors de ce crate)
    EmployeeId
);
int_id!(
    /// Identifiant d'une entreprise
    CompanyId
);
int_id!(
    /// Identifiant fort pour Shift (attribué par la surface, entier)
    ShiftId
);
int_id!(
    /// Identifiant d'un motif d'absence
    AbsenceId
);

/// Turno : intervalle horaire nommé, sans date.
///
/// `end < start` signifie que le turno passe minuit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    #[serde(rename = "id_turno")]
    pub id: ShiftId,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "hora_inicio")]
    pub start: NaiveTime,
    #[serde(rename = "hora_fin")]
    pub end: NaiveTime,
}

impl Shift {
    pub fn new<D: Into<String>>(
        id: ShiftId,
        description: D,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Result<Self, String> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err("shift description cannot be empty".to_string());
        }
        Ok(Self {
            id,
            description,
            start,
            end,
        })
    }

    /// Vrai si le turno traverse minuit.
    pub fn wraps(&self) -> bool {
        crate::overlap::wraps(self.start, self.end)
    }

    /// Durée en minutes (un turno qui passe minuit déborde sur le jour suivant).
    pub fn duration_minutes(&self) -> i64 {
        let minutes = (self.end - self.start).num_minutes();
        if self.wraps() {
            minutes + 24 * 60
        } else {
            minutes
        }
    }
}

/// Clé d'une affectation : un employé, une date, un turno.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssignmentKey {
    pub employee: EmployeeId,
    pub date: NaiveDate,
    pub shift: ShiftId,
}

/// Affectation d'un employé à un turno pour une date (`pertenece`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    #[serde(rename = "id_empleado")]
    pub employee: EmployeeId,
    #[serde(rename = "id_turno")]
    pub shift: ShiftId,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
}

impl ShiftAssignment {
    pub fn new(employee: EmployeeId, shift: ShiftId, date: NaiveDate) -> Self {
        Self {
            employee,
            shift,
            date,
        }
    }

    pub fn key(&self) -> AssignmentKey {
        AssignmentKey {
            employee: self.employee,
            date: self.date,
            shift: self.shift,
        }
    }
}

/// Clé d'un intervalle de supervision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SupervisionKey {
    pub supervisor: EmployeeId,
    pub employee: EmployeeId,
    pub start: NaiveDate,
}

/// Période pendant laquelle `supervisor` supervise `employee` (`supervisa`).
///
/// `end == None` : la supervision est toujours en vigueur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisionInterval {
    #[serde(rename = "id_supervisor")]
    pub supervisor: EmployeeId,
    #[serde(rename = "id_empleado")]
    pub employee: EmployeeId,
    #[serde(rename = "fecha_inicio")]
    pub start: NaiveDate,
    #[serde(rename = "fecha_fin", default)]
    pub end: Option<NaiveDate>,
}

impl SupervisionInterval {
    pub fn open(supervisor: EmployeeId, employee: EmployeeId, start: NaiveDate) -> Self {
        Self {
            supervisor,
            employee,
            start,
            end: None,
        }
    }

    pub fn key(&self) -> SupervisionKey {
        SupervisionKey {
            supervisor: self.supervisor,
            employee: self.employee,
            start: self.start,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }
}

/// Motif d'absence (`ausencia`), éventuellement borné dans le temps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceReason {
    #[serde(rename = "id_ausencia")]
    pub id: AbsenceId,
    #[serde(rename = "motivo")]
    pub motive: String,
    #[serde(rename = "fecha_inicio")]
    pub start: NaiveDate,
    #[serde(rename = "fecha_fin", default)]
    pub end: Option<NaiveDate>,
    #[serde(rename = "id_empleado")]
    pub employee: EmployeeId,
}

/// État d'une demande d'absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AbsenceStatus {
    Pending,
    Approved,
    Rejected,
}

impl AbsenceStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, AbsenceStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AbsenceStatus::Pending => "pending",
            AbsenceStatus::Approved => "approved",
            AbsenceStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for AbsenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AbsenceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(AbsenceStatus::Pending),
            "approved" => Ok(AbsenceStatus::Approved),
            "rejected" => Ok(AbsenceStatus::Rejected),
            other => Err(format!("unknown absence status: {other}")),
        }
    }
}

/// Clé d'une demande d'absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub employee: EmployeeId,
    pub reason: AbsenceId,
    pub requested_on: NaiveDate,
}

/// Demande d'absence (`solicita`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsenceRequest {
    #[serde(rename = "id_empleado")]
    pub employee: EmployeeId,
    #[serde(rename = "id_ausencia")]
    pub reason: AbsenceId,
    #[serde(rename = "fecha_solicitud")]
    pub requested_on: NaiveDate,
    #[serde(rename = "fecha_inicio")]
    pub start: NaiveDate,
    #[serde(rename = "fecha_fin")]
    pub end: NaiveDate,
    #[serde(rename = "estado")]
    pub status: AbsenceStatus,
}

impl AbsenceRequest {
    pub fn key(&self) -> RequestKey {
        RequestKey {
            employee: self.employee,
            reason: self.reason,
            requested_on: self.requested_on,
        }
    }

    /// Approuvée et pas encore terminée à la date `today`.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.status == AbsenceStatus::Approved && self.end >= today
    }
}

/// Contenu complet du stockage : une table par entité.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tables {
    #[serde(rename = "turno", default)]
    pub shifts: Vec<Shift>,
    #[serde(rename = "pertenece", default)]
    pub assignments: Vec<ShiftAssignment>,
    #[serde(rename = "supervisa", default)]
    pub supervisions: Vec<SupervisionInterval>,
    #[serde(rename = "ausencia", default)]
    pub reasons: Vec<AbsenceReason>,
    #[serde(rename = "solicita", default)]
    pub requests: Vec<AbsenceRequest>,
}

impl Tables {
    pub fn find_shift(&self, id: ShiftId) -> Option<&Shift> {
        self.shifts.iter().find(|s| s.id == id)
    }
    pub fn find_reason(&self, id: AbsenceId) -> Option<&AbsenceReason> {
        self.reasons.iter().find(|r| r.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn night_shift_duration_crosses_midnight() {
        let night = Shift::new(ShiftId::new(1), "Night", t(22, 0), t(6, 0)).unwrap();
        assert!(night.wraps());
        assert_eq!(night.duration_minutes(), 8 * 60);
    }

    #[test]
    fn blank_description_rejected() {
        assert!(Shift::new(ShiftId::new(1), "  ", t(8, 0), t(16, 0)).is_err());
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("Approved".parse::<AbsenceStatus>(), Ok(AbsenceStatus::Approved));
        assert!("cancelled".parse::<AbsenceStatus>().is_err());
        assert!(AbsenceStatus::Rejected.is_terminal());
        assert!(!AbsenceStatus::Pending.is_terminal());
    }

    #[test]
    fn tables_use_persisted_column_names() {
        let mut tables = Tables::default();
        tables
            .shifts
            .push(Shift::new(ShiftId::new(3), "Morning", t(8, 0), t(16, 0)).unwrap());
        let json = serde_json::to_value(&tables).unwrap();
        assert_eq!(json["turno"][0]["id_turno"], 3);
        assert_eq!(json["turno"][0]["hora_inicio"], "08:00:00");
        assert!(json["pertenece"].as_array().unwrap().is_empty());
    }
}
