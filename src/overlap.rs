//! Chevauchement d'intervalles horaires (heure du jour, sans date).
//!
//! Un intervalle dont la fin précède le début traverse minuit. Les bornes
//! sont inclusives : deux turnos qui se touchent se chevauchent.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Vrai si `[start, end]` traverse minuit. Un intervalle de longueur nulle ne traverse jamais.
pub fn wraps(start: NaiveTime, end: NaiveTime) -> bool {
    end < start
}

/// Teste si `[start_a, end_a]` et `[start_b, end_b]` se chevauchent.
pub fn overlaps(
    start_a: NaiveTime,
    end_a: NaiveTime,
    start_b: NaiveTime,
    end_b: NaiveTime,
) -> bool {
    match (wraps(start_a, end_a), wraps(start_b, end_b)) {
        // les deux contiennent minuit
        (true, true) => true,
        // B doit tenir entièrement dans le creux (end_a, start_a)
        (true, false) => !(end_b < start_a && start_b > end_a),
        (false, true) => !(end_a < start_b && start_a > end_b),
        (false, false) => !(end_a < start_b || end_b < start_a),
    }
}

/// Intervalle absolu `[date+start, date+end)` occupé par un turno posé sur `date`.
///
/// Un turno qui traverse minuit se termine le lendemain.
pub fn effective_interval(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> (NaiveDateTime, NaiveDateTime) {
    let start_dt = NaiveDateTime::new(date, start);
    let mut end_dt = NaiveDateTime::new(date, end);
    if wraps(start, end) {
        end_dt += Duration::days(1);
    }
    (start_dt, end_dt)
}

/// Chevauchement entre intervalles absolus, bornes inclusives comme `overlaps`.
pub fn intervals_overlap(a: (NaiveDateTime, NaiveDateTime), b: (NaiveDateTime, NaiveDateTime)) -> bool {
    a.0 <= b.1 && b.0 <= a.1
}
