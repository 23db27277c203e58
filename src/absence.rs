//! Motifs d'absence et cycle de vie des demandes.
//!
//! `pending → approved | rejected`. Par défaut toute transition est acceptée,
//! y compris la sortie d'un état terminal ; `AbsenceOptions::strict_transitions`
//! la refuse.

use crate::error::{CoreError, Result, StorageError, StorageErrorKind};
use crate::model::{
    AbsenceId, AbsenceReason, AbsenceRequest, AbsenceStatus, EmployeeId, RequestKey,
};
use crate::storage::Store;
use chrono::{Local, NaiveDate};

#[derive(Debug, Clone, Copy, Default)]
pub struct AbsenceOptions {
    /// Refuse (`Conflict`) toute décision sur une demande déjà approuvée ou rejetée.
    pub strict_transitions: bool,
}

pub struct AbsenceWorkflow<'s, S: Store> {
    store: &'s mut S,
    opts: AbsenceOptions,
}

impl<'s, S: Store> AbsenceWorkflow<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self::with_options(store, AbsenceOptions::default())
    }

    pub fn with_options(store: &'s mut S, opts: AbsenceOptions) -> Self {
        Self { store, opts }
    }

    // ---- motifs ----

    /// Enregistre un motif ; l'identifiant suivant (max + 1) lui est attribué.
    pub fn create_reason(
        &mut self,
        employee: EmployeeId,
        motive: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<AbsenceReason> {
        check_reason(motive, start, end)?;
        let reason = self.store.atomically(|tx| {
            let next = tx
                .all_reasons()?
                .iter()
                .map(|r| r.id.get())
                .max()
                .unwrap_or(0)
                + 1;
            let reason = AbsenceReason {
                id: AbsenceId::new(next),
                motive: motive.trim().to_string(),
                start,
                end,
                employee,
            };
            tx.insert_reason(&reason)?;
            Ok(reason)
        })?;
        tracing::info!(id = %reason.id, %employee, "absence reason recorded");
        Ok(reason)
    }

    pub fn update_reason(&mut self, reason: &AbsenceReason) -> Result<AbsenceReason> {
        check_reason(&reason.motive, reason.start, reason.end)?;
        if !self.store.atomically(|tx| Ok(tx.update_reason(reason)?))? {
            return Err(CoreError::NotFound(format!("ausencia {}", reason.id)));
        }
        Ok(reason.clone())
    }

    /// Échoue (`ForeignKeyViolation`) tant qu'une demande référence le motif.
    pub fn delete_reason(&mut self, id: AbsenceId) -> Result<bool> {
        Ok(self.store.atomically(|tx| Ok(tx.delete_reason(id)?))?)
    }

    pub fn find_reason(&self, id: AbsenceId) -> Result<Option<AbsenceReason>> {
        Ok(self.store.find_reason(id)?)
    }

    pub fn reasons_of(&self, employee: EmployeeId) -> Result<Vec<AbsenceReason>> {
        let mut rows: Vec<_> = self
            .store
            .all_reasons()?
            .into_iter()
            .filter(|r| r.employee == employee)
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    // ---- demandes ----

    /// Dépose une demande, à l'état `pending`.
    pub fn submit(
        &mut self,
        employee: EmployeeId,
        reason: AbsenceId,
        requested_on: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AbsenceRequest> {
        if end < start {
            return Err(CoreError::Validation(format!(
                "absence ends {end}, before it starts {start}"
            )));
        }
        let request = AbsenceRequest {
            employee,
            reason,
            requested_on,
            start,
            end,
            status: AbsenceStatus::Pending,
        };
        self.store.atomically(|tx| {
            if tx.find_reason(reason)?.is_none() {
                return Err(CoreError::NotFound(format!("ausencia {reason}")));
            }
            tx.insert_request(&request)?;
            Ok(())
        })?;
        tracing::info!(%employee, %reason, %start, %end, "absence requested");
        Ok(request)
    }

    /// Change l'état de la demande identifiée par `(employee, reason, requested_on)`.
    pub fn decide(&mut self, key: &RequestKey, status: AbsenceStatus) -> Result<AbsenceRequest> {
        let strict = self.opts.strict_transitions;
        let decided = self.store.atomically(|tx| {
            let Some(current) = tx.find_request(key)? else {
                return Err(missing_request(key).into());
            };
            if strict && current.status.is_terminal() && current.status != status {
                return Err(CoreError::Conflict(format!(
                    "request is already {}, cannot move to {status}",
                    current.status
                )));
            }
            if !tx.update_request_status(key, status)? {
                return Err(missing_request(key).into());
            }
            Ok(AbsenceRequest { status, ..current })
        });
        match &decided {
            Ok(r) => tracing::info!(employee = %r.employee, reason = %r.reason, %status, "absence decided"),
            Err(err) => tracing::warn!(%err, "absence decision rejected"),
        }
        decided
    }

    pub fn find(&self, key: &RequestKey) -> Result<Option<AbsenceRequest>> {
        Ok(self.store.find_request(key)?)
    }

    pub fn by_employee(&self, employee: EmployeeId) -> Result<Vec<AbsenceRequest>> {
        let mut rows = self.store.requests_by_employee(employee)?;
        rows.sort_by_key(|r| (r.requested_on, r.start, r.reason));
        Ok(rows)
    }

    pub fn by_status(&self, status: AbsenceStatus) -> Result<Vec<AbsenceRequest>> {
        let mut rows = self.store.requests_by_status(status)?;
        rows.sort_by_key(|r| (r.requested_on, r.employee, r.reason));
        Ok(rows)
    }

    /// Absences approuvées qui ne sont pas terminées à `today`.
    pub fn active_absences_on(&self, today: NaiveDate) -> Result<Vec<AbsenceRequest>> {
        let mut rows: Vec<_> = self
            .store
            .requests_by_status(AbsenceStatus::Approved)?
            .into_iter()
            .filter(|r| r.is_active_on(today))
            .collect();
        rows.sort_by_key(|r| (r.start, r.employee));
        Ok(rows)
    }

    /// Comme [`Self::active_absences_on`] avec la date locale courante.
    ///
    /// Le résultat change au passage de minuit ; ne pas le conserver au-delà.
    pub fn active_absences(&self) -> Result<Vec<AbsenceRequest>> {
        self.active_absences_on(Local::now().date_naive())
    }
}

fn check_reason(motive: &str, start: NaiveDate, end: Option<NaiveDate>) -> Result<()> {
    if motive.trim().is_empty() {
        return Err(CoreError::Validation("absence motive cannot be empty".into()));
    }
    if let Some(end) = end {
        if end < start {
            return Err(CoreError::Validation(format!(
                "absence reason ends {end}, before it starts {start}"
            )));
        }
    }
    Ok(())
}

fn missing_request(key: &RequestKey) -> StorageError {
    StorageError::msg(
        StorageErrorKind::NotFound,
        format!(
            "no request of employee {} for ausencia {} on {}",
            key.employee, key.reason, key.requested_on
        ),
    )
}
