#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use staffplan::{
    io,
    model::{AbsenceId, AbsenceStatus, CompanyId, EmployeeId, RequestKey, ShiftAssignment, ShiftId},
    AbsenceOptions, AbsenceWorkflow, AssignOptions, JsonStore, Scheduler, Session, ShiftCatalog,
    SupervisionHistory,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planification : turnos, affectations, supervisions, absences
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du store
    #[arg(long, global = true, default_value = "staffplan.json")]
    store: String,

    /// Employé courant (session)
    #[arg(long = "employee", global = true)]
    as_employee: Option<i64>,

    /// Entreprise courante (session)
    #[arg(long, global = true, default_value_t = 1)]
    company: i64,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args, Debug, Clone, Copy)]
struct AssignFlags {
    /// Au plus un turno par employé et par jour
    #[arg(long)]
    exclusive_day: bool,
    /// Compare aussi avec la veille et le lendemain
    #[arg(long)]
    adjacent_days: bool,
}

impl From<AssignFlags> for AssignOptions {
    fn from(flags: AssignFlags) -> Self {
        AssignOptions {
            exclusive_day: flags.exclusive_day,
            check_adjacent_days: flags.adjacent_days,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Créer un turno
    ShiftAdd {
        #[arg(long)]
        description: String,
        /// HH:MM
        #[arg(long, value_parser = parse_time_arg)]
        start: NaiveTime,
        /// HH:MM (avant `start` : le turno passe minuit)
        #[arg(long, value_parser = parse_time_arg)]
        end: NaiveTime,
    },

    /// Lister les turnos
    ShiftList,

    /// Supprimer un turno
    ShiftRm {
        #[arg(long)]
        id: i64,
    },

    /// Importer des turnos depuis un CSV
    ImportShifts {
        #[arg(long)]
        csv: String,
    },

    /// Affecter un turno à un employé pour une date
    Assign {
        #[arg(long = "to")]
        employee: i64,
        #[arg(long)]
        shift: i64,
        /// YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[command(flatten)]
        flags: AssignFlags,
    },

    /// Déplacer une affectation (employé, turno ou date)
    Reassign {
        #[arg(long = "of")]
        employee: i64,
        #[arg(long)]
        shift: i64,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        new_employee: Option<i64>,
        #[arg(long)]
        new_shift: Option<i64>,
        #[arg(long)]
        new_date: Option<NaiveDate>,
        #[command(flatten)]
        flags: AssignFlags,
    },

    /// Retirer une affectation
    Unassign {
        #[arg(long = "of")]
        employee: i64,
        #[arg(long)]
        shift: i64,
        #[arg(long)]
        date: NaiveDate,
    },

    /// Lister les affectations et optionnellement exporter
    Schedule {
        #[arg(long = "of")]
        employee: Option<i64>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Vérifier les conflits
    Check {
        #[command(flatten)]
        flags: AssignFlags,
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Ouvrir une supervision
    Supervise {
        #[arg(long)]
        supervisor: i64,
        #[arg(long = "of")]
        employee: i64,
        #[arg(long)]
        start: NaiveDate,
        /// Clôt d'abord les supervisions ouvertes de l'employé
        #[arg(long)]
        replace: bool,
    },

    /// Clore une supervision
    Finalize {
        #[arg(long)]
        supervisor: i64,
        #[arg(long = "of")]
        employee: i64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
    },

    /// Superviseur actuel d'un employé
    Supervisor {
        #[arg(long = "of")]
        employee: Option<i64>,
    },

    /// Historique des supervisions d'un employé
    History {
        #[arg(long = "of")]
        employee: Option<i64>,
    },

    /// Employés supervisés actuellement
    Team {
        #[arg(long)]
        supervisor: Option<i64>,
    },

    /// Enregistrer un motif d'absence
    ReasonAdd {
        #[arg(long)]
        motive: String,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Déposer une demande d'absence (employé courant)
    Request {
        #[arg(long)]
        reason: i64,
        #[arg(long)]
        start: NaiveDate,
        #[arg(long)]
        end: NaiveDate,
        /// Date de la demande (aujourd'hui par défaut)
        #[arg(long)]
        on: Option<NaiveDate>,
    },

    /// Approuver ou rejeter une demande
    Decide {
        #[arg(long = "of")]
        employee: i64,
        #[arg(long)]
        reason: i64,
        #[arg(long)]
        requested_on: NaiveDate,
        /// pending | approved | rejected
        #[arg(long)]
        status: AbsenceStatus,
        /// Refuse de rouvrir une demande déjà décidée
        #[arg(long)]
        strict: bool,
    },

    /// Lister les demandes
    Requests {
        #[arg(long = "of")]
        employee: Option<i64>,
        #[arg(long)]
        status: Option<AbsenceStatus>,
    },

    /// Absences approuvées en cours ou à venir
    Active {
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

fn parse_time_arg(raw: &str) -> Result<NaiveTime, String> {
    io::parse_time(raw).map_err(|e| format!("{e:#}"))
}

fn acting_employee(explicit: Option<i64>, session: Option<&Session>) -> Result<EmployeeId> {
    explicit
        .map(EmployeeId::new)
        .or(session.map(|s| s.employee))
        .context("no employee given and no current employee (--employee)")
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let session = cli
        .as_employee
        .map(|e| Session::new(EmployeeId::new(e), CompanyId::new(cli.company)));
    let _span = session.map(|s| {
        tracing::info_span!("session", employee = %s.employee, company = %s.company).entered()
    });
    let mut store =
        JsonStore::open(&cli.store).with_context(|| format!("opening store {}", cli.store))?;

    let code = match cli.cmd {
        Commands::ShiftAdd {
            description,
            start,
            end,
        } => {
            let shift = ShiftCatalog::new(&mut store).create(&description, start, end)?;
            println!("{}", shift.id);
            0
        }
        Commands::ShiftList => {
            for s in ShiftCatalog::new(&mut store).list()? {
                let minutes = s.duration_minutes();
                println!(
                    "{} | {} | {} → {} | {}h{:02}",
                    s.id,
                    s.description,
                    s.start.format("%H:%M"),
                    s.end.format("%H:%M"),
                    minutes / 60,
                    minutes % 60
                );
            }
            0
        }
        Commands::ShiftRm { id } => {
            if ShiftCatalog::new(&mut store).delete(ShiftId::new(id))? {
                0
            } else {
                eprintln!("no turno {id}");
                1
            }
        }
        Commands::ImportShifts { csv } => {
            let rows = io::import_shifts_csv(&csv)?;
            let mut catalog = ShiftCatalog::new(&mut store);
            for row in rows {
                let shift = catalog.create(&row.description, row.start, row.end)?;
                println!("{} | {}", shift.id, shift.description);
            }
            0
        }
        Commands::Assign {
            employee,
            shift,
            date,
            flags,
        } => {
            let mut scheduler = Scheduler::with_options(&mut store, flags.into());
            scheduler.assign(EmployeeId::new(employee), ShiftId::new(shift), date)?;
            0
        }
        Commands::Reassign {
            employee,
            shift,
            date,
            new_employee,
            new_shift,
            new_date,
            flags,
        } => {
            let old = ShiftAssignment::new(EmployeeId::new(employee), ShiftId::new(shift), date);
            let new = ShiftAssignment::new(
                EmployeeId::new(new_employee.unwrap_or(employee)),
                ShiftId::new(new_shift.unwrap_or(shift)),
                new_date.unwrap_or(date),
            );
            Scheduler::with_options(&mut store, flags.into()).reassign(&old, &new)?;
            0
        }
        Commands::Unassign {
            employee,
            shift,
            date,
        } => {
            let a = ShiftAssignment::new(EmployeeId::new(employee), ShiftId::new(shift), date);
            if Scheduler::new(&mut store).unassign(&a)? {
                0
            } else {
                eprintln!("nothing to unassign");
                1
            }
        }
        Commands::Schedule {
            employee,
            date,
            out_csv,
        } => {
            let shifts = ShiftCatalog::new(&mut store).list()?;
            let scheduler = Scheduler::new(&mut store);
            let mut rows = match employee {
                Some(e) => scheduler.by_employee(EmployeeId::new(e))?,
                None => scheduler.all()?,
            };
            if let Some(d) = date {
                rows.retain(|a| a.date == d);
            }
            if let Some(path) = out_csv {
                io::export_assignments_csv(path, &rows, &shifts)?;
            }
            for a in &rows {
                let label = shifts
                    .iter()
                    .find(|s| s.id == a.shift)
                    .map(|s| s.description.as_str())
                    .unwrap_or("-");
                println!("{} | employee {} | {} ({})", a.date, a.employee, label, a.shift);
            }
            0
        }
        Commands::Check { flags, report } => {
            let conflicts = Scheduler::with_options(&mut store, flags.into()).detect_conflicts()?;
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                for c in &conflicts {
                    eprintln!(
                        "employee {}: {} on {} / {} on {} ({})",
                        c.employee, c.shift_a, c.date_a, c.shift_b, c.date_b, c.kind
                    );
                }
                if let Some(path) = report {
                    io::write_conflicts_csv(path, &conflicts)?;
                }
                // Code 2 = WARNING
                2
            }
        }
        Commands::Supervise {
            supervisor,
            employee,
            start,
            replace,
        } => {
            let mut history = SupervisionHistory::new(&mut store);
            let (sup, emp) = (EmployeeId::new(supervisor), EmployeeId::new(employee));
            if replace {
                history.replace_supervisor(sup, emp, start)?;
            } else {
                history.assign_supervisor(sup, emp, start)?;
            }
            0
        }
        Commands::Finalize {
            supervisor,
            employee,
            start,
            end,
        } => {
            let interval = staffplan::SupervisionInterval::open(
                EmployeeId::new(supervisor),
                EmployeeId::new(employee),
                start,
            );
            SupervisionHistory::new(&mut store).finalize(&interval, end)?;
            0
        }
        Commands::Supervisor { employee } => {
            let employee = acting_employee(employee, session.as_ref())?;
            match SupervisionHistory::new(&mut store).current_supervisor(employee)? {
                Some(s) => {
                    println!("{} (since {})", s.supervisor, s.start);
                    0
                }
                None => {
                    println!("no current supervisor");
                    1
                }
            }
        }
        Commands::History { employee } => {
            let employee = acting_employee(employee, session.as_ref())?;
            for s in SupervisionHistory::new(&mut store).history(employee)? {
                let end = s.end.map(|d| d.to_string()).unwrap_or_else(|| "…".into());
                println!("{} | {} → {}", s.supervisor, s.start, end);
            }
            0
        }
        Commands::Team { supervisor } => {
            let supervisor = acting_employee(supervisor, session.as_ref())?;
            for s in SupervisionHistory::new(&mut store).supervised_employees(supervisor)? {
                println!("{} (since {})", s.employee, s.start);
            }
            0
        }
        Commands::ReasonAdd { motive, start, end } => {
            let employee = acting_employee(None, session.as_ref())?;
            let reason =
                AbsenceWorkflow::new(&mut store).create_reason(employee, &motive, start, end)?;
            println!("{}", reason.id);
            0
        }
        Commands::Request {
            reason,
            start,
            end,
            on,
        } => {
            let employee = acting_employee(None, session.as_ref())?;
            let on = on.unwrap_or_else(|| Local::now().date_naive());
            AbsenceWorkflow::new(&mut store).submit(
                employee,
                AbsenceId::new(reason),
                on,
                start,
                end,
            )?;
            0
        }
        Commands::Decide {
            employee,
            reason,
            requested_on,
            status,
            strict,
        } => {
            let key = RequestKey {
                employee: EmployeeId::new(employee),
                reason: AbsenceId::new(reason),
                requested_on,
            };
            let opts = AbsenceOptions {
                strict_transitions: strict,
            };
            AbsenceWorkflow::with_options(&mut store, opts).decide(&key, status)?;
            0
        }
        Commands::Requests { employee, status } => {
            let workflow = AbsenceWorkflow::new(&mut store);
            let mut rows = match employee.map(EmployeeId::new) {
                Some(e) => workflow.by_employee(e)?,
                None => match status {
                    Some(s) => workflow.by_status(s)?,
                    None => {
                        let mut all = workflow.by_status(AbsenceStatus::Pending)?;
                        all.extend(workflow.by_status(AbsenceStatus::Approved)?);
                        all.extend(workflow.by_status(AbsenceStatus::Rejected)?);
                        all
                    }
                },
            };
            if let Some(s) = status {
                rows.retain(|r| r.status == s);
            }
            for r in &rows {
                println!(
                    "employee {} | ausencia {} | {} | {} → {} | {}",
                    r.employee, r.reason, r.requested_on, r.start, r.end, r.status
                );
            }
            0
        }
        Commands::Active { today } => {
            let workflow = AbsenceWorkflow::new(&mut store);
            let rows = match today {
                Some(d) => workflow.active_absences_on(d)?,
                None => workflow.active_absences()?,
            };
            for r in &rows {
                println!("employee {} | {} → {}", r.employee, r.start, r.end);
            }
            0
        }
    };

    std::process::exit(code);
}
