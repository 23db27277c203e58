#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveTime};
use staffplan::{
    io, AssignOptions, ConflictKind, CoreError, EmployeeId, MemoryStore, Scheduler, Shift,
    ShiftAssignment, ShiftCatalog, ShiftId, Tables,
};

fn t(h: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, 0, 0).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

/// Morning (1) 08-16, Night (2) 22-06, Evening (3) 15-23
fn seeded() -> (MemoryStore, Shift, Shift, Shift) {
    let mut store = MemoryStore::new();
    let mut catalog = ShiftCatalog::new(&mut store);
    let a = catalog.create("Morning", t(8), t(16)).unwrap();
    let b = catalog.create("Night", t(22), t(6)).unwrap();
    let c = catalog.create("Evening", t(15), t(23)).unwrap();
    (store, a, b, c)
}

#[test]
fn end_to_end_morning_night_evening() {
    let (mut store, a, b, c) = seeded();
    let mut s = Scheduler::new(&mut store);
    let e1 = EmployeeId::new(1);

    s.assign(e1, a.id, day(1)).unwrap();
    s.assign(e1, b.id, day(1)).unwrap();
    let err = s.assign(e1, c.id, day(1)).unwrap_err();
    assert!(err.is_conflict(), "{err}");

    assert_eq!(s.by_employee(e1).unwrap().len(), 2);
}

#[test]
fn overlapping_shift_same_day_conflicts_next_day_succeeds() {
    let (mut store, a, _, c) = seeded();
    let mut s = Scheduler::new(&mut store);
    let e = EmployeeId::new(4);

    s.assign(e, a.id, day(1)).unwrap();
    assert!(matches!(s.assign(e, c.id, day(1)), Err(CoreError::Conflict(_))));
    s.assign(e, c.id, day(2)).unwrap();
}

#[test]
fn same_binding_twice_is_a_conflict() {
    let (mut store, a, _, _) = seeded();
    let mut s = Scheduler::new(&mut store);
    s.assign(EmployeeId::new(1), a.id, day(1)).unwrap();
    let err = s.assign(EmployeeId::new(1), a.id, day(1)).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn unknown_shift_is_not_found() {
    let (mut store, ..) = seeded();
    let mut s = Scheduler::new(&mut store);
    let err = s.assign(EmployeeId::new(1), ShiftId::new(99), day(1)).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[test]
fn unassign_is_idempotent() {
    let (mut store, a, _, _) = seeded();
    let mut s = Scheduler::new(&mut store);
    let assignment = s.assign(EmployeeId::new(1), a.id, day(1)).unwrap();
    assert!(s.unassign(&assignment).unwrap());
    assert!(!s.unassign(&assignment).unwrap());
}

#[test]
fn find_conflicts_predicts_assign() {
    let (mut store, a, b, c) = seeded();
    let mut s = Scheduler::new(&mut store);
    let e = EmployeeId::new(2);
    s.assign(e, a.id, day(1)).unwrap();

    assert!(s.find_conflicts(e, day(1), &c).unwrap());
    assert!(s.find_conflicts(e, day(1), &a).unwrap());
    assert!(!s.find_conflicts(e, day(1), &b).unwrap());
    assert!(!s.find_conflicts(EmployeeId::new(3), day(1), &c).unwrap());
}

#[test]
fn reassign_moves_the_assignment() {
    let (mut store, a, b, _) = seeded();
    let mut s = Scheduler::new(&mut store);
    let e = EmployeeId::new(1);
    let old = s.assign(e, a.id, day(1)).unwrap();
    let new = ShiftAssignment::new(e, b.id, day(3));

    s.reassign(&old, &new).unwrap();
    assert_eq!(s.by_employee(e).unwrap(), vec![new]);
}

#[test]
fn reassign_missing_is_not_found() {
    let (mut store, a, b, _) = seeded();
    let mut s = Scheduler::new(&mut store);
    let old = ShiftAssignment::new(EmployeeId::new(1), a.id, day(1));
    let new = ShiftAssignment::new(EmployeeId::new(1), b.id, day(1));
    assert!(matches!(s.reassign(&old, &new), Err(CoreError::NotFound(_))));
    assert!(s.all().unwrap().is_empty());
}

#[test]
fn rejected_reassign_keeps_the_old_assignment() {
    let (mut store, a, b, c) = seeded();
    let mut s = Scheduler::new(&mut store);
    let e = EmployeeId::new(1);
    s.assign(e, a.id, day(1)).unwrap();
    let night = s.assign(e, b.id, day(2)).unwrap();

    // Evening le 1er chevauche Morning
    let moved = ShiftAssignment::new(e, c.id, day(1));
    assert!(s.reassign(&night, &moved).unwrap_err().is_conflict());
    assert_eq!(s.by_employee(e).unwrap().len(), 2);
    assert!(s.by_date(day(2)).unwrap().contains(&night));
}

#[test]
fn exclusive_day_allows_one_shift_per_date() {
    let (mut store, a, b, _) = seeded();
    let opts = AssignOptions {
        exclusive_day: true,
        ..AssignOptions::default()
    };
    let mut s = Scheduler::with_options(&mut store, opts);
    let e = EmployeeId::new(1);
    s.assign(e, a.id, day(1)).unwrap();
    assert!(s.assign(e, b.id, day(1)).unwrap_err().is_conflict());
    s.assign(e, b.id, day(2)).unwrap();
}

#[test]
fn adjacent_days_catch_night_shift_spill() {
    let (mut store, _, b, _) = seeded();
    let early = ShiftCatalog::new(&mut store).create("Early", t(5), t(13)).unwrap();
    let e = EmployeeId::new(1);

    // comportement par défaut : seul le même jour compte
    {
        let mut s = Scheduler::new(&mut store);
        s.assign(e, b.id, day(1)).unwrap();
        s.assign(e, early.id, day(2)).unwrap();
        let all = s.all().unwrap();
        for a in &all {
            s.unassign(a).unwrap();
        }
    }

    let opts = AssignOptions {
        check_adjacent_days: true,
        ..AssignOptions::default()
    };
    let mut s = Scheduler::with_options(&mut store, opts);
    s.assign(e, b.id, day(1)).unwrap();
    assert!(s.assign(e, early.id, day(2)).unwrap_err().is_conflict());
    s.assign(e, early.id, day(3)).unwrap();
}

#[test]
fn detect_conflicts_reports_legacy_overlaps() {
    let (store, a, b, c) = seeded();
    let mut tables: Tables = store.into_tables();
    let e = EmployeeId::new(7);
    tables.assignments.push(ShiftAssignment::new(e, a.id, day(1)));
    tables.assignments.push(ShiftAssignment::new(e, c.id, day(1)));
    tables.assignments.push(ShiftAssignment::new(e, b.id, day(1)));
    tables.assignments.push(ShiftAssignment::new(EmployeeId::new(8), a.id, day(1)));
    let mut store = MemoryStore::with_tables(tables);

    let conflicts = Scheduler::new(&mut store).detect_conflicts().unwrap();
    // Morning/Evening et Evening/Night
    assert_eq!(conflicts.len(), 2);
    assert!(conflicts.iter().all(|c| c.employee == e && c.kind == ConflictKind::Overlap));
}

#[test]
fn schedule_csv_export() {
    let (mut store, a, b, _) = seeded();
    let mut s = Scheduler::new(&mut store);
    s.assign(EmployeeId::new(1), a.id, day(1)).unwrap();
    s.assign(EmployeeId::new(2), b.id, day(1)).unwrap();
    let rows = s.all().unwrap();
    let shifts = ShiftCatalog::new(&mut store).list().unwrap();

    let mut buf = Vec::new();
    io::write_assignments(csv::Writer::from_writer(&mut buf), &rows, &shifts).unwrap();
    let out = String::from_utf8(buf).unwrap();
    insta::assert_snapshot!(out, @r"
    employee_id,date,shift_id,description,start,end
    1,2024-06-01,1,Morning,08:00,16:00
    2,2024-06-01,2,Night,22:00,06:00
    ");
}
