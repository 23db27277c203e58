#![forbid(unsafe_code)]
use chrono::NaiveDate;
use staffplan::{CoreError, EmployeeId, MemoryStore, SupervisionHistory};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const BOSS: EmployeeId = EmployeeId::new(10);
const OTHER_BOSS: EmployeeId = EmployeeId::new(11);
const ANA: EmployeeId = EmployeeId::new(1);
const LUIS: EmployeeId = EmployeeId::new(2);

#[test]
fn current_supervisor_until_finalized() {
    let mut store = MemoryStore::new();
    let mut h = SupervisionHistory::new(&mut store);

    let interval = h.assign_supervisor(BOSS, ANA, date(2024, 1, 1)).unwrap();
    assert!(interval.is_open());
    let current = h.current_supervisor(ANA).unwrap().unwrap();
    assert_eq!(current.supervisor, BOSS);

    let closed = h.finalize(&interval, date(2024, 3, 31)).unwrap();
    assert_eq!(closed.end, Some(date(2024, 3, 31)));
    assert!(h.current_supervisor(ANA).unwrap().is_none());
    assert_eq!(h.history(ANA).unwrap(), vec![closed]);
}

#[test]
fn finalize_requires_an_open_interval() {
    let mut store = MemoryStore::new();
    let mut h = SupervisionHistory::new(&mut store);
    let interval = h.assign_supervisor(BOSS, ANA, date(2024, 1, 1)).unwrap();
    h.finalize(&interval, date(2024, 2, 1)).unwrap();

    let again = h.finalize(&interval, date(2024, 2, 2)).unwrap_err();
    assert!(matches!(again, CoreError::NotFound(_)));

    let unknown = staffplan::SupervisionInterval::open(OTHER_BOSS, LUIS, date(2024, 1, 1));
    assert!(matches!(
        h.finalize(&unknown, date(2024, 2, 1)),
        Err(CoreError::NotFound(_))
    ));
}

#[test]
fn finalize_before_start_is_invalid() {
    let mut store = MemoryStore::new();
    let mut h = SupervisionHistory::new(&mut store);
    let interval = h.assign_supervisor(BOSS, ANA, date(2024, 5, 1)).unwrap();
    let err = h.finalize(&interval, date(2024, 4, 30)).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(h.current_supervisor(ANA).unwrap().is_some());
}

#[test]
fn assigning_a_second_supervisor_keeps_the_first_open() {
    let mut store = MemoryStore::new();
    let mut h = SupervisionHistory::new(&mut store);
    h.assign_supervisor(BOSS, ANA, date(2024, 1, 1)).unwrap();
    h.assign_supervisor(OTHER_BOSS, ANA, date(2024, 6, 1)).unwrap();

    let open: Vec<_> = h.history(ANA).unwrap().into_iter().filter(|s| s.is_open()).collect();
    assert_eq!(open.len(), 2);
    // le plus récent l'emporte
    assert_eq!(h.current_supervisor(ANA).unwrap().unwrap().supervisor, OTHER_BOSS);
    assert!(h.is_supervisor(BOSS).unwrap());
}

#[test]
fn replace_supervisor_closes_previous_interval() {
    let mut store = MemoryStore::new();
    let mut h = SupervisionHistory::new(&mut store);
    h.assign_supervisor(BOSS, ANA, date(2024, 1, 1)).unwrap();
    h.replace_supervisor(OTHER_BOSS, ANA, date(2024, 6, 1)).unwrap();

    let history = h.history(ANA).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].supervisor, BOSS);
    assert_eq!(history[0].end, Some(date(2024, 6, 1)));
    assert!(history[1].is_open());
    assert!(!h.is_supervisor(BOSS).unwrap());

    // pas de retour dans le passé
    let err = h.replace_supervisor(BOSS, ANA, date(2024, 5, 1)).unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(h.history(ANA).unwrap().len(), 2);
}

#[test]
fn history_is_ordered_by_start() {
    let mut store = MemoryStore::new();
    let mut h = SupervisionHistory::new(&mut store);
    let late = h.assign_supervisor(OTHER_BOSS, ANA, date(2023, 9, 1)).unwrap();
    let early = h.assign_supervisor(BOSS, ANA, date(2022, 1, 1)).unwrap();
    h.finalize(&early, date(2023, 8, 31)).unwrap();

    let starts: Vec<_> = h.history(ANA).unwrap().iter().map(|s| s.start).collect();
    assert_eq!(starts, vec![early.start, late.start]);
}

#[test]
fn supervised_employees_lists_open_intervals_only() {
    let mut store = MemoryStore::new();
    let mut h = SupervisionHistory::new(&mut store);
    h.assign_supervisor(BOSS, ANA, date(2024, 1, 1)).unwrap();
    let luis = h.assign_supervisor(BOSS, LUIS, date(2024, 1, 1)).unwrap();
    h.finalize(&luis, date(2024, 2, 1)).unwrap();

    let team = h.supervised_employees(BOSS).unwrap();
    assert_eq!(team.len(), 1);
    assert_eq!(team[0].employee, ANA);
}

#[test]
fn self_supervision_and_duplicates_are_rejected() {
    let mut store = MemoryStore::new();
    let mut h = SupervisionHistory::new(&mut store);
    assert!(matches!(
        h.assign_supervisor(ANA, ANA, date(2024, 1, 1)),
        Err(CoreError::Validation(_))
    ));
    h.assign_supervisor(BOSS, ANA, date(2024, 1, 1)).unwrap();
    assert!(h.assign_supervisor(BOSS, ANA, date(2024, 1, 1)).unwrap_err().is_conflict());
}
