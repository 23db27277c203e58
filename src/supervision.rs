//! Historique des supervisions : qui supervise qui, et sur quelle période.
//!
//! Un intervalle ouvert (`end == None`) est en vigueur. Les intervalles ne sont
//! jamais supprimés ; on les clôt avec [`SupervisionHistory::finalize`].

use crate::error::{CoreError, Result, StorageErrorKind};
use crate::model::{EmployeeId, SupervisionInterval};
use crate::storage::Store;
use chrono::NaiveDate;

pub struct SupervisionHistory<'s, S: Store> {
    store: &'s mut S,
}

impl<'s, S: Store> SupervisionHistory<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Ouvre un intervalle `supervisor → employee` à partir de `start`.
    ///
    /// Un éventuel intervalle ouvert du même employé n'est pas clos ; voir
    /// [`Self::replace_supervisor`] pour ce comportement.
    pub fn assign_supervisor(
        &mut self,
        supervisor: EmployeeId,
        employee: EmployeeId,
        start: NaiveDate,
    ) -> Result<SupervisionInterval> {
        if supervisor == employee {
            return Err(CoreError::Validation(format!(
                "employee {employee} cannot supervise themself"
            )));
        }
        let interval = SupervisionInterval::open(supervisor, employee, start);
        self.store.atomically(|tx| insert_open(tx, &interval))?;
        tracing::info!(%supervisor, %employee, %start, "supervision opened");
        Ok(interval)
    }

    /// Clôt l'intervalle ouvert identifié par `(supervisor, employee, start)`.
    pub fn finalize(
        &mut self,
        interval: &SupervisionInterval,
        end: NaiveDate,
    ) -> Result<SupervisionInterval> {
        if end < interval.start {
            return Err(CoreError::Validation(format!(
                "end {end} is before supervision start {}",
                interval.start
            )));
        }
        let closed = self.store.atomically(|tx| close_open(tx, interval, end))?;
        tracing::info!(
            supervisor = %closed.supervisor,
            employee = %closed.employee,
            %end,
            "supervision finalized"
        );
        Ok(closed)
    }

    /// Clôt toutes les supervisions ouvertes de `employee` à `start` et ouvre
    /// la nouvelle, en une seule unité de travail.
    pub fn replace_supervisor(
        &mut self,
        supervisor: EmployeeId,
        employee: EmployeeId,
        start: NaiveDate,
    ) -> Result<SupervisionInterval> {
        if supervisor == employee {
            return Err(CoreError::Validation(format!(
                "employee {employee} cannot supervise themself"
            )));
        }
        let interval = SupervisionInterval::open(supervisor, employee, start);
        let closed = self.store.atomically(|tx| {
            let open: Vec<_> = tx
                .supervisions_by_employee(employee)?
                .into_iter()
                .filter(SupervisionInterval::is_open)
                .collect();
            for current in &open {
                if start < current.start {
                    return Err(CoreError::Validation(format!(
                        "new supervision starts {start}, before current one ({})",
                        current.start
                    )));
                }
                close_open(tx, current, start)?;
            }
            insert_open(tx, &interval)?;
            Ok(open.len())
        })?;
        tracing::info!(%supervisor, %employee, %start, closed, "supervisor replaced");
        Ok(interval)
    }

    /// Supervision en vigueur pour `employee`.
    ///
    /// Plusieurs intervalles peuvent rester ouverts ; le plus récent l'emporte.
    pub fn current_supervisor(&self, employee: EmployeeId) -> Result<Option<SupervisionInterval>> {
        let current = self
            .store
            .supervisions_by_employee(employee)?
            .into_iter()
            .filter(SupervisionInterval::is_open)
            .max_by_key(|s| s.start);
        Ok(current)
    }

    /// Tous les intervalles de `employee`, ouverts et clos, par date de début.
    pub fn history(&self, employee: EmployeeId) -> Result<Vec<SupervisionInterval>> {
        let mut rows = self.store.supervisions_by_employee(employee)?;
        rows.sort_by_key(|s| s.start);
        Ok(rows)
    }

    /// Intervalles ouverts dont `supervisor` est le superviseur.
    pub fn supervised_employees(&self, supervisor: EmployeeId) -> Result<Vec<SupervisionInterval>> {
        let mut rows: Vec<_> = self
            .store
            .supervisions_by_supervisor(supervisor)?
            .into_iter()
            .filter(SupervisionInterval::is_open)
            .collect();
        rows.sort_by_key(|s| (s.employee, s.start));
        Ok(rows)
    }

    pub fn is_supervisor(&self, employee: EmployeeId) -> Result<bool> {
        Ok(self
            .store
            .supervisions_by_supervisor(employee)?
            .iter()
            .any(SupervisionInterval::is_open))
    }
}

fn insert_open<S: Store>(tx: &mut S, interval: &SupervisionInterval) -> Result<()> {
    match tx.insert_supervision(interval) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == StorageErrorKind::DuplicateKey => {
            Err(CoreError::Conflict(err.to_string()))
        }
        Err(err) => Err(err.into()),
    }
}

fn close_open<S: Store>(
    tx: &mut S,
    interval: &SupervisionInterval,
    end: NaiveDate,
) -> Result<SupervisionInterval> {
    let missing = || {
        CoreError::NotFound(format!(
            "open supervision {} -> {} from {}",
            interval.supervisor, interval.employee, interval.start
        ))
    };
    let current = tx
        .find_supervision(&interval.key())?
        .filter(SupervisionInterval::is_open)
        .ok_or_else(missing)?;
    let closed = SupervisionInterval {
        end: Some(end),
        ..current
    };
    if !tx.update_supervision(&closed)? {
        return Err(missing());
    }
    Ok(closed)
}
