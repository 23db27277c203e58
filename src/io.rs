use crate::model::{Shift, ShiftAssignment, ShiftId};
use crate::scheduler::Conflict;
use anyhow::{bail, Context};
use chrono::NaiveTime;
use csv::{ReaderBuilder, Writer, WriterBuilder};
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Turno lu depuis un CSV, sans identifiant (attribué par le catalogue).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftRow {
    pub description: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Import de turnos: header `description,start,end` (`HH:MM` ou `HH:MM:SS`)
pub fn import_shifts_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<ShiftRow>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let description = rec.get(0).context("missing description")?.trim();
        if description.is_empty() {
            bail!("invalid shift row (empty description)");
        }
        let start = parse_time(rec.get(1).context("missing start")?)
            .with_context(|| format!("start of {description}"))?;
        let end = parse_time(rec.get(2).context("missing end")?)
            .with_context(|| format!("end of {description}"))?;
        out.push(ShiftRow {
            description: description.to_string(),
            start,
            end,
        });
    }
    Ok(out)
}

/// Accepte `HH:MM` et `HH:MM:SS`.
pub fn parse_time(raw: &str) -> anyhow::Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .with_context(|| format!("invalid time of day: {raw}"))
}

/// Export CSV des affectations: header `employee_id,date,shift_id,description,start,end`
pub fn export_assignments_csv<P: AsRef<Path>>(
    path: P,
    assignments: &[ShiftAssignment],
    shifts: &[Shift],
) -> anyhow::Result<()> {
    let w = WriterBuilder::new().has_headers(true).from_path(path)?;
    write_assignments(w, assignments, shifts)
}

/// Même format que [`export_assignments_csv`], vers n'importe quel flux.
pub fn write_assignments<W: io::Write>(
    mut w: Writer<W>,
    assignments: &[ShiftAssignment],
    shifts: &[Shift],
) -> anyhow::Result<()> {
    let by_id: HashMap<ShiftId, &Shift> = shifts.iter().map(|s| (s.id, s)).collect();
    let mut employee = itoa::Buffer::new();
    let mut shift_id = itoa::Buffer::new();

    w.write_record(["employee_id", "date", "shift_id", "description", "start", "end"])?;
    for a in assignments {
        let shift = by_id.get(&a.shift);
        let date = a.date.to_string();
        let start = shift.map(|s| s.start.format("%H:%M").to_string()).unwrap_or_default();
        let end = shift.map(|s| s.end.format("%H:%M").to_string()).unwrap_or_default();
        w.write_record([
            employee.format(a.employee.get()),
            date.as_str(),
            shift_id.format(a.shift.get()),
            shift.map(|s| s.description.as_str()).unwrap_or(""),
            start.as_str(),
            end.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Rapport CSV des conflits: header `employee_id,date_a,shift_a,date_b,shift_b,kind`
pub fn write_conflicts_csv<P: AsRef<Path>>(path: P, conflicts: &[Conflict]) -> anyhow::Result<()> {
    let mut w = Writer::from_path(path)?;
    let mut num = itoa::Buffer::new();
    w.write_record(["employee_id", "date_a", "shift_a", "date_b", "shift_b", "kind"])?;
    for c in conflicts {
        let employee = num.format(c.employee.get()).to_string();
        let shift_a = num.format(c.shift_a.get()).to_string();
        let shift_b = num.format(c.shift_b.get()).to_string();
        w.write_record([
            employee.as_str(),
            c.date_a.to_string().as_str(),
            shift_a.as_str(),
            c.date_b.to_string().as_str(),
            shift_b.as_str(),
            c.kind.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
