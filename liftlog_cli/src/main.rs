use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use liftlog_core::service::{self, ManualPr, PrNotification};
use liftlog_core::*;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "liftlog")]
#[command(about = "Workout log with automatic personal records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Act as this user instead of the configured one
    #[arg(long, global = true)]
    user: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Record sets, e.g. `liftlog log "Bench Press" 3x10x50 1x8+2x60`
    Log {
        /// Exercise name
        exercise: String,

        /// Sets as AMOUNTxREPSxWEIGHT entries
        #[arg(required = true, num_args = 1..)]
        sets: Vec<String>,

        /// Workout date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Delete a recorded set by id
    DeleteSet { id: Uuid },

    /// Show current personal records
    Prs {
        /// Only this exercise
        #[arg(long)]
        exercise: Option<String>,

        /// Only this type (weight, reps, sets)
        #[arg(long = "type")]
        pr_type: Option<PrType>,
    },

    /// Show every record ever set for an exercise, oldest first
    PrHistory { exercise: String },

    /// Enter a personal record by hand
    PrAdd {
        #[arg(long)]
        exercise: String,

        #[arg(long = "type")]
        pr_type: PrType,

        #[arg(long)]
        reps: u32,

        #[arg(long)]
        weight: Decimal,

        #[arg(long, default_value_t = 1)]
        sets: u32,

        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Mark or unmark a set as a manual weight PR
    PrToggle { set_id: Uuid },

    /// Delete a manual personal record
    PrDelete { id: Uuid },

    /// List workouts, newest first
    History,

    /// Show one day's workout with set ids
    Workout {
        /// Defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Manage exercises
    Exercises {
        #[command(subcommand)]
        command: ExerciseCommands,
    },

    /// Rebuild all automatic personal records
    Recalc,

    /// Export personal records to CSV
    Export { path: PathBuf },
}

#[derive(Subcommand)]
enum ExerciseCommands {
    /// List exercises you can log
    List,

    /// Add a private exercise
    Add {
        name: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Rename or redescribe one of your exercises
    Edit {
        name: String,

        /// New name
        #[arg(long = "name")]
        new_name: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Show an exercise with its description and current records
    Show { name: String },

    /// Delete one of your exercises with all its sets and records
    Delete { name: String },

    /// Add the built-in exercises
    Seed,
}

/// Resolved runtime settings
struct Session {
    file: LedgerFile,
    user: String,
    unit: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        liftlog_core::logging::init_with_level("debug");
    } else {
        liftlog_core::logging::init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let session = Session {
        file: LedgerFile::in_dir(&data_dir),
        user: cli.user.unwrap_or_else(|| config.user.name.clone()),
        unit: config.display.weight_unit.clone(),
    };
    tracing::debug!("Using ledger {:?} as {}", session.file.path(), session.user);

    match cli.command {
        Commands::Log {
            exercise,
            sets,
            date,
        } => cmd_log(&session, &exercise, &sets.join(" "), date),
        Commands::DeleteSet { id } => cmd_delete_set(&session, id),
        Commands::Prs { exercise, pr_type } => cmd_prs(&session, exercise.as_deref(), pr_type),
        Commands::PrHistory { exercise } => cmd_pr_history(&session, &exercise),
        Commands::PrAdd {
            exercise,
            pr_type,
            reps,
            weight,
            sets,
            date,
        } => cmd_pr_add(&session, &exercise, pr_type, reps, weight, sets, date),
        Commands::PrToggle { set_id } => cmd_pr_toggle(&session, set_id),
        Commands::PrDelete { id } => cmd_pr_delete(&session, id),
        Commands::History => cmd_history(&session),
        Commands::Workout { date } => cmd_workout(&session, date.unwrap_or_else(today)),
        Commands::Exercises { command } => cmd_exercises(&session, command),
        Commands::Recalc => cmd_recalc(&session),
        Commands::Export { path } => cmd_export(&session, &path),
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Run a mutation; a brand-new ledger gets the built-in exercises first
fn mutate<T>(session: &Session, f: impl FnOnce(&mut Ledger) -> Result<T>) -> Result<T> {
    session.file.update(|ledger| {
        if ledger.exercises.is_empty() {
            seed_default_exercises(ledger);
        }
        f(ledger)
    })
}

fn exercise_id(ledger: &Ledger, user: &str, name: &str) -> Result<Uuid> {
    ledger
        .find_exercise(user, name)
        .map(|e| e.id)
        .ok_or_else(|| Error::NotFound(format!("exercise '{}'", name)))
}

fn cmd_log(session: &Session, exercise: &str, text: &str, date: Option<NaiveDate>) -> Result<()> {
    let date = date.unwrap_or_else(today);
    let (name, outcome) = mutate(session, |ledger| {
        let id = exercise_id(ledger, &session.user, exercise)?;
        let name = ledger.exercise(id).map(|e| e.name.clone()).unwrap_or_default();
        let outcome = service::add_sets(ledger, &session.user, id, date, text)?;
        Ok((name, outcome))
    })?;

    println!(
        "✓ Recorded {} sets of {} on {}",
        outcome.sets.len(),
        name,
        date
    );
    for set in &outcome.sets {
        println!(
            "  {}x{}x{}  {}",
            set.set_number,
            set.reps,
            format_weight(set.weight),
            set.id
        );
    }

    for notification in &outcome.notifications {
        println!("🏆 {}", describe_notification(notification, &session.unit));
    }
    Ok(())
}

fn describe_notification(n: &PrNotification, unit: &str) -> String {
    let achieved = match n.pr_type {
        PrType::Sets => format!("{} sets of {} reps @ {} {}", n.sets, n.reps, n.weight, unit),
        PrType::Weight | PrType::Reps => format!("{} reps @ {} {}", n.reps, n.weight, unit),
    };
    let mut line = format!("New {}: {} {}", n.label, n.exercise, achieved);
    if let (Some(value), Some(date)) = (&n.previous_value, &n.previous_date) {
        line.push_str(&format!(
            " (beat {} from {})",
            describe_value(n.pr_type, value, unit),
            date
        ));
    }
    line
}

fn describe_value(pr_type: PrType, value: &str, unit: &str) -> String {
    match pr_type {
        PrType::Weight => format!("{} {}", value, unit),
        PrType::Reps => format!("{} reps", value),
        PrType::Sets => format!("{} sets", value),
    }
}

fn describe_record(record: &PersonalRecord, unit: &str) -> String {
    let mut line = match record.pr_type {
        PrType::Sets => format!(
            "{:<10} {} x {} reps @ {} {}",
            record.pr_type.label(),
            record.sets,
            record.reps,
            format_weight(record.weight),
            unit
        ),
        PrType::Weight | PrType::Reps => format!(
            "{:<10} {} reps @ {} {}",
            record.pr_type.label(),
            record.reps,
            format_weight(record.weight),
            unit
        ),
    };
    line.push_str(&format!("  {}", record.date));
    if let (Some(value), Some(date)) = (record.previous_value, record.previous_date) {
        line.push_str(&format!(
            "  (was {} on {})",
            describe_value(record.pr_type, &format_weight(value), unit),
            date
        ));
    }
    if record.is_manual {
        line.push_str("  [manual]");
    }
    line
}

fn cmd_delete_set(session: &Session, id: Uuid) -> Result<()> {
    let deleted = mutate(session, |ledger| service::delete_set(ledger, &session.user, id))?;
    println!("✓ Deleted set {}", id);
    if deleted.workout_removed {
        println!("  Workout had no sets left and was removed");
    }
    Ok(())
}

fn cmd_prs(session: &Session, exercise: Option<&str>, pr_type: Option<PrType>) -> Result<()> {
    let ledger = session.file.load()?;
    let exercise = exercise
        .map(|name| exercise_id(&ledger, &session.user, name))
        .transpose()?;

    let records = service::current_records(&ledger, &session.user, exercise, pr_type);
    if records.is_empty() {
        println!("No personal records yet.");
        return Ok(());
    }

    let mut last_exercise = None;
    for (exercise, record) in records {
        if last_exercise != Some(exercise.id) {
            println!("{}", exercise.name);
            last_exercise = Some(exercise.id);
        }
        println!("  {}  {}", describe_record(record, &session.unit), record.id);
    }
    Ok(())
}

fn cmd_pr_history(session: &Session, exercise: &str) -> Result<()> {
    let ledger = session.file.load()?;
    let id = exercise_id(&ledger, &session.user, exercise)?;

    let records = service::record_history(&ledger, &session.user, id)?;
    if records.is_empty() {
        println!("No personal records for {} yet.", exercise);
        return Ok(());
    }
    for record in records {
        let marker = if record.is_current { "*" } else { " " };
        println!("{} {}", marker, describe_record(record, &session.unit));
    }
    Ok(())
}

fn cmd_pr_add(
    session: &Session,
    exercise: &str,
    pr_type: PrType,
    reps: u32,
    weight: Decimal,
    sets: u32,
    date: Option<NaiveDate>,
) -> Result<()> {
    let record = mutate(session, |ledger| {
        let exercise_id = exercise_id(ledger, &session.user, exercise)?;
        service::add_manual_pr(
            ledger,
            &session.user,
            ManualPr {
                exercise_id,
                pr_type,
                reps,
                weight,
                sets,
                date: date.unwrap_or_else(today),
            },
        )
    })?;
    println!("✓ Added {}", describe_record(&record, &session.unit));
    Ok(())
}

fn cmd_pr_toggle(session: &Session, set_id: Uuid) -> Result<()> {
    let active = mutate(session, |ledger| {
        service::toggle_manual_pr(ledger, &session.user, set_id)
    })?;
    if active {
        println!("✓ Set marked as a manual weight PR");
    } else {
        println!("✓ Manual weight PR removed");
    }
    Ok(())
}

fn cmd_pr_delete(session: &Session, id: Uuid) -> Result<()> {
    mutate(session, |ledger| {
        service::delete_manual_pr(ledger, &session.user, id)
    })?;
    println!("✓ Deleted record {}", id);
    Ok(())
}

fn cmd_history(session: &Session) -> Result<()> {
    let ledger = session.file.load()?;
    let history = workout_history(&ledger, &session.user);
    if history.is_empty() {
        println!("No workouts yet.");
        return Ok(());
    }

    for summary in history {
        println!("{}  ({} sets)", summary.workout.date, summary.set_count());
        for group in &summary.exercises {
            println!("  {}: {}", group.exercise, group.compact);
        }
    }
    Ok(())
}

fn cmd_workout(session: &Session, date: NaiveDate) -> Result<()> {
    let ledger = session.file.load()?;
    let Some(summary) = workout_on_date(&ledger, &session.user, date) else {
        println!("No workout on {}.", date);
        return Ok(());
    };

    println!("{}  ({} sets)", summary.workout.date, summary.set_count());
    for group in &summary.exercises {
        println!("{}: {}", group.exercise, group.compact);
        for set in &group.sets {
            println!(
                "  {}x{}x{}  {}",
                set.set_number,
                set.reps,
                format_weight(set.weight),
                set.id
            );
        }
    }
    Ok(())
}

fn cmd_exercises(session: &Session, command: ExerciseCommands) -> Result<()> {
    match command {
        ExerciseCommands::List => {
            let ledger = session.file.load()?;
            for exercise in ledger.visible_exercises(&session.user) {
                let scope = if exercise.is_global() { "" } else { "  (yours)" };
                println!("{}{}", exercise.name, scope);
            }
        }
        ExerciseCommands::Add { name, description } => {
            let exercise = mutate(session, |ledger| {
                service::create_exercise(ledger, &session.user, &name, &description)
            })?;
            println!("✓ Added exercise {}", exercise.name);
        }
        ExerciseCommands::Edit {
            name,
            new_name,
            description,
        } => {
            if new_name.is_none() && description.is_none() {
                return Err(Error::Invalid(
                    "nothing to change, pass --name or --description".into(),
                ));
            }
            let exercise = mutate(session, |ledger| {
                let id = exercise_id(ledger, &session.user, &name)?;
                service::update_exercise(
                    ledger,
                    &session.user,
                    id,
                    new_name.as_deref(),
                    description.as_deref(),
                )
            })?;
            println!("✓ Updated exercise {}", exercise.name);
        }
        ExerciseCommands::Show { name } => {
            let ledger = session.file.load()?;
            let id = exercise_id(&ledger, &session.user, &name)?;
            let Some(exercise) = ledger.exercise(id) else {
                return Err(Error::NotFound(format!("exercise '{}'", name)));
            };
            let scope = if exercise.is_global() { "built-in" } else { "yours" };
            println!("{}  ({})", exercise.name, scope);
            if exercise.description.is_empty() {
                println!("  No description.");
            } else {
                println!("  {}", exercise.description);
            }

            let records = service::current_records(&ledger, &session.user, Some(id), None);
            if records.is_empty() {
                println!("  No personal records yet.");
            }
            for (_, record) in records {
                println!("  {}", describe_record(record, &session.unit));
            }
        }
        ExerciseCommands::Delete { name } => {
            mutate(session, |ledger| {
                let id = exercise_id(ledger, &session.user, &name)?;
                service::delete_exercise(ledger, &session.user, id)
            })?;
            println!("✓ Deleted exercise {}", name);
        }
        ExerciseCommands::Seed => {
            let created = session
                .file
                .update(|ledger| Ok(seed_default_exercises(ledger)))?;
            println!("✓ {} new exercises created", created);
        }
    }
    Ok(())
}

fn cmd_recalc(session: &Session) -> Result<()> {
    let count = mutate(session, |ledger| {
        service::recalculate_all(ledger, &session.user)
    })?;
    println!("✓ Recalculated personal records for {} exercises", count);
    Ok(())
}

fn cmd_export(session: &Session, path: &std::path::Path) -> Result<()> {
    let ledger = session.file.load()?;
    let count = export_records_csv(&ledger, &session.user, path)?;
    println!("✓ Exported {} records", count);
    println!("  CSV: {}", path.display());
    Ok(())
}
