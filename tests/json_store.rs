#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveTime};
use staffplan::{
    storage::{ShiftStore, Transactional},
    CoreError, EmployeeId, ErrorKind, JsonStore, Scheduler, Shift, ShiftCatalog, ShiftId,
    StorageErrorKind, SupervisionHistory,
};
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

fn t(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

#[test]
fn data_survives_reopening() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.json");

    {
        let mut store = JsonStore::open(&path).unwrap();
        let morning = ShiftCatalog::new(&mut store).create("Morning", t(8), t(16)).unwrap();
        Scheduler::new(&mut store)
            .assign(EmployeeId::new(1), morning.id, day(1))
            .unwrap();
        SupervisionHistory::new(&mut store)
            .assign_supervisor(EmployeeId::new(9), EmployeeId::new(1), day(1))
            .unwrap();
    }

    let mut store = JsonStore::open(&path).unwrap();
    assert_eq!(Scheduler::new(&mut store).all().unwrap().len(), 1);
    let current = SupervisionHistory::new(&mut store)
        .current_supervisor(EmployeeId::new(1))
        .unwrap();
    assert_eq!(current.unwrap().supervisor, EmployeeId::new(9));

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["pertenece"][0]["fecha"], "2024-06-01");
    assert_eq!(raw["turno"][0]["hora_fin"], "16:00:00");
    assert!(raw["supervisa"][0]["fecha_fin"].is_null());
}

#[test]
fn missing_file_opens_empty() {
    let dir = tempdir().unwrap();
    let store = JsonStore::open(dir.path().join("absent.json")).unwrap();
    assert!(store.all_shifts().unwrap().is_empty());
}

#[test]
fn unit_of_work_sees_writes_from_another_handle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.json");
    let mut first = JsonStore::open(&path).unwrap();
    let mut second = JsonStore::open(&path).unwrap();

    let shift = ShiftCatalog::new(&mut first).create("Morning", t(8), t(16)).unwrap();
    Scheduler::new(&mut first)
        .assign(EmployeeId::new(1), shift.id, day(1))
        .unwrap();

    // `second` a été ouvert avant ces écritures ; l'unité de travail relit le disque
    let evening = ShiftCatalog::new(&mut second).create("Evening", t(15), t(23)).unwrap();
    assert_eq!(evening.id.get(), shift.id.get() + 1);
    let err = Scheduler::new(&mut second)
        .assign(EmployeeId::new(1), evening.id, day(1))
        .unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn failed_unit_of_work_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.json");
    let mut store = JsonStore::open(&path).unwrap();
    ShiftCatalog::new(&mut store).create("Morning", t(8), t(16)).unwrap();
    let before = std::fs::read(&path).unwrap();

    let res: Result<(), CoreError> = store.atomically(|tx| {
        ShiftCatalog::new(tx).create("Night", t(22), t(6))?;
        Err(CoreError::Conflict("abort".into()))
    });
    assert!(res.is_err());
    assert_eq!(std::fs::read(&path).unwrap(), before);
    assert_eq!(store.all_shifts().unwrap().len(), 1);
}

#[test]
fn held_lock_fails_fast() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.json");
    // pid vivant : le nôtre
    std::fs::write(
        dir.path().join("plan.json.lock"),
        format!("{}\n", std::process::id()),
    )
    .unwrap();

    let mut store = JsonStore::open(&path).unwrap();
    let err = ShiftCatalog::new(&mut store)
        .create("Morning", t(8), t(16))
        .unwrap_err();
    assert_eq!(
        err.kind(),
        ErrorKind::Storage(StorageErrorKind::ConnectionFailure)
    );

    std::fs::remove_file(dir.path().join("plan.json.lock")).unwrap();
    ShiftCatalog::new(&mut store).create("Morning", t(8), t(16)).unwrap();
    assert!(!dir.path().join("plan.json.lock").exists());
}

#[test]
fn lock_of_a_dead_process_is_broken() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.json");
    let lock = dir.path().join("plan.json.lock");
    std::fs::write(&lock, "999999999\n").unwrap();

    let mut store = JsonStore::open(&path).unwrap();
    let shift = ShiftCatalog::new(&mut store).create("Morning", t(8), t(16)).unwrap();
    assert_eq!(shift.id.get(), 1);
    assert!(!lock.exists());
    assert_eq!(JsonStore::open(&path).unwrap().all_shifts().unwrap().len(), 1);
}

#[test]
fn lock_older_than_the_bound_is_broken() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.json");
    let lock = dir.path().join("plan.json.lock");
    std::fs::write(&lock, format!("{}\n", std::process::id())).unwrap();
    std::fs::File::options()
        .write(true)
        .open(&lock)
        .unwrap()
        .set_modified(SystemTime::now() - Duration::from_secs(2 * 60 * 60))
        .unwrap();

    let mut store = JsonStore::open(&path).unwrap();
    ShiftCatalog::new(&mut store).create("Morning", t(8), t(16)).unwrap();
    assert!(!lock.exists());
}

#[test]
fn plain_writes_do_not_clobber_another_handle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.json");
    let mut first = JsonStore::open(&path).unwrap();
    let mut second = JsonStore::open(&path).unwrap();

    ShiftCatalog::new(&mut first).create("Morning", t(8), t(16)).unwrap();
    // hors unité de travail, `second` n'a jamais relu le disque
    let night = Shift::new(ShiftId::new(2), "Night", t(22), t(6)).unwrap();
    second.insert_shift(&night).unwrap();

    let mut ids: Vec<_> = JsonStore::open(&path)
        .unwrap()
        .all_shifts()
        .unwrap()
        .into_iter()
        .map(|s| s.id.get())
        .collect();
    ids.sort();
    assert_eq!(ids, [1, 2]);

    // la clé unique est vérifiée sur les tables relues
    let err = second
        .insert_shift(&Shift::new(ShiftId::new(1), "Copy", t(9), t(10)).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), StorageErrorKind::DuplicateKey);
}

#[test]
fn store_stays_usable_after_a_panicking_unit() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.json");
    let mut store = JsonStore::open(&path).unwrap();

    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _: Result<(), CoreError> = store.atomically(|tx| {
            ShiftCatalog::new(tx).create("Night", t(22), t(6))?;
            panic!("boom");
        });
    }));
    assert!(res.is_err());
    assert!(!dir.path().join("plan.json.lock").exists());

    ShiftCatalog::new(&mut store).create("Morning", t(8), t(16)).unwrap();
    let on_disk = JsonStore::open(&path).unwrap().all_shifts().unwrap();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk[0].description, "Morning");
}

#[test]
fn corrupt_file_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("plan.json");
    std::fs::write(&path, "{ not json").unwrap();
    let err = JsonStore::open(&path).unwrap_err();
    assert_eq!(err.kind(), StorageErrorKind::Unknown);
}
