#![forbid(unsafe_code)]
//! Staffplan — turnos, affectations, supervisions et absences d'une entreprise.
//!
//! - Détection de chevauchement sur des heures du jour, y compris à cheval sur minuit.
//! - Historique daté des supervisions (intervalles ouverts / clos).
//! - Cycle de vie des demandes d'absence et absences actives.
//! - Stockage derrière des traits par entité ; store mémoire et store JSON fournis.

pub mod absence;
pub mod catalog;
pub mod error;
pub mod io;
pub mod model;
pub mod overlap;
pub mod scheduler;
pub mod session;
pub mod storage;
pub mod supervision;

pub use absence::{AbsenceOptions, AbsenceWorkflow};
pub use catalog::{InsertOutcome, ShiftCatalog};
pub use error::{CoreError, ErrorKind, StorageError, StorageErrorKind};
pub use model::{
    AbsenceId, AbsenceReason, AbsenceRequest, AbsenceStatus, CompanyId, EmployeeId, RequestKey,
    Shift, ShiftAssignment, ShiftId, SupervisionInterval, Tables,
};
pub use overlap::overlaps;
pub use scheduler::{AssignOptions, Conflict, ConflictKind, Scheduler};
pub use session::Session;
pub use storage::{JsonStore, MemoryStore, Store};
pub use supervision::SupervisionHistory;
