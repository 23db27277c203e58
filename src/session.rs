use crate::model::{CompanyId, EmployeeId};

/// Contexte d'identité fourni par l'appelant : employé et entreprise courants.
///
/// Valeur construite explicitement et passée aux commandes ; aucun état global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub employee: EmployeeId,
    pub company: CompanyId,
}

impl Session {
    pub fn new(employee: EmployeeId, company: CompanyId) -> Self {
        Self { employee, company }
    }
}
