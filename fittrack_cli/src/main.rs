use chrono::{Datelike, Days};
use clap::{Parser, Subcommand};
use fittrack_core::config::NutritionConfig;
use fittrack_core::*;
use std::path::PathBuf;
use uuid::Uuid;

/// Longest range `schedule` will print
const MAX_SCHEDULE_DAYS: u32 = 366;

#[derive(Parser)]
#[command(name = "fittrack")]
#[command(about = "Workout schedule, progress and food tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// User whose data to read and write
    #[arg(long, global = true)]
    user: Option<String>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the day's workout and progress (default)
    Today {
        /// Day to show instead of today (YYYY-MM-DD)
        #[arg(long)]
        date: Option<DateKey>,
    },

    /// Show the resolved schedule for a range of days
    Schedule {
        /// First day (defaults to today)
        #[arg(long)]
        from: Option<DateKey>,

        /// Number of days to show (at most 366)
        #[arg(long, default_value_t = 14)]
        days: u32,
    },

    /// Pin a day to a workout (or "Rest")
    Override { date: DateKey, label: String },

    /// Remove a day's pin
    ClearOverride { date: DateKey },

    /// Toggle a set's completion (positions as shown by `today`)
    Toggle {
        exercise: usize,
        set: usize,

        #[arg(long)]
        date: Option<DateKey>,
    },

    /// Record weight, reps or notes for a set on one day only
    Log {
        exercise: usize,
        set: usize,

        #[arg(long)]
        weight: Option<String>,

        #[arg(long)]
        reps: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        date: Option<DateKey>,
    },

    /// Manage the workout catalog
    #[command(subcommand)]
    Workouts(WorkoutsCommand),

    /// Manage a day's food log
    Food {
        /// Day to edit (defaults to today)
        #[arg(long, global = true)]
        date: Option<DateKey>,

        #[command(subcommand)]
        action: Option<FoodCommand>,
    },

    /// Manage the food library
    #[command(subcommand)]
    Library(LibraryCommand),

    /// Month overview of workout and food progress
    Calendar {
        /// Month to show (YYYY-MM, defaults to the current month)
        #[arg(long)]
        month: Option<String>,

        /// Append the month's summaries to a CSV file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Details of a single day
    Day { date: DateKey },

    /// Push entries cached by older versions to the user's store
    Migrate,

    /// Purge all locally cached data
    Logout,
}

#[derive(Subcommand)]
enum WorkoutsCommand {
    /// List workouts, or one workout's exercises
    List { label: Option<String> },

    /// Add an empty workout
    Add { label: String },

    /// Remove a workout and its exercises
    Remove { label: String },

    /// Rename a workout
    Rename { from: String, to: String },

    /// Append an exercise to a workout
    AddExercise {
        label: String,
        name: String,

        #[arg(long, default_value_t = 3)]
        sets: usize,

        #[arg(long, default_value = "")]
        weight: String,

        #[arg(long, default_value = "10")]
        reps: String,
    },

    /// Remove an exercise by position
    RemoveExercise { label: String, exercise: usize },

    /// Move an exercise to a new position
    MoveExercise {
        label: String,
        exercise: usize,
        to: usize,
    },

    /// Change a set's planned weight or reps for every future day
    EditSet {
        label: String,
        exercise: usize,
        set: usize,

        #[arg(long)]
        weight: Option<String>,

        #[arg(long)]
        reps: Option<String>,
    },
}

#[derive(Subcommand)]
enum FoodCommand {
    /// Show the food log (default)
    Show,

    /// Add a food item; calories and protein come from the library when omitted
    Add {
        name: String,
        calories: Option<f64>,
        protein: Option<f64>,
    },

    /// Toggle an item's eaten flag
    Eat { item: usize },

    /// Remove an item
    Remove { item: usize },

    /// Set the day's goals
    Goals {
        #[arg(long)]
        calories: Option<f64>,

        #[arg(long)]
        protein: Option<f64>,
    },
}

#[derive(Subcommand)]
enum LibraryCommand {
    /// List saved foods
    List,

    /// Save a food for reuse
    Add {
        name: String,
        calories: f64,
        protein: f64,
    },

    /// Remove a saved food
    Remove { name: String },
}

/// Everything a command needs: config, rotation, sync cache and identity
struct Session {
    config: Config,
    rotation: Rotation,
    sync: SyncCache<FileStore, FileCache>,
    user: Option<UserId>,
}

impl Session {
    fn open(cli: &Cli) -> Result<Self> {
        let mut config = match cli.config {
            Some(ref path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(ref data_dir) = cli.data_dir {
            config.data.data_dir = data_dir.clone();
        }

        let user = cli
            .user
            .clone()
            .or_else(|| config.identity.user_id.clone())
            .map(UserId::new)
            .transpose()?;
        if user.is_none() {
            eprintln!("No user configured (use --user); changes will not be saved.");
        }

        let rotation = Rotation::from_config(&config.schedule)?;
        let sync = SyncCache::new(
            FileStore::new(config.data.remote_dir()),
            FileCache::open(config.data.cache_path()),
        )
        .with_nutrition(config.nutrition.clone());

        Ok(Self {
            config,
            rotation,
            sync,
            user,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    fittrack_core::logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    let mut session = Session::open(&cli)?;

    match cli.command {
        Some(Commands::Today { date }) => cmd_day(&mut session, date.unwrap_or_else(DateKey::today)),
        Some(Commands::Day { date }) => cmd_day(&mut session, date),
        Some(Commands::Schedule { from, days }) => cmd_schedule(&mut session, from, days),
        Some(Commands::Override { date, label }) => cmd_override(&mut session, date, &label),
        Some(Commands::ClearOverride { date }) => cmd_clear_override(&mut session, date),
        Some(Commands::Toggle {
            exercise,
            set,
            date,
        }) => cmd_toggle(&mut session, date.unwrap_or_else(DateKey::today), exercise, set),
        Some(Commands::Log {
            exercise,
            set,
            weight,
            reps,
            notes,
            date,
        }) => {
            let edit = SetEdit {
                weight,
                reps,
                notes,
            };
            cmd_log(&mut session, date.unwrap_or_else(DateKey::today), exercise, set, &edit)
        }
        Some(Commands::Workouts(command)) => cmd_workouts(&mut session, command),
        Some(Commands::Food { date, action }) => cmd_food(
            &mut session,
            date.unwrap_or_else(DateKey::today),
            action.unwrap_or(FoodCommand::Show),
        ),
        Some(Commands::Library(command)) => cmd_library(&mut session, command),
        Some(Commands::Calendar { month, export }) => cmd_calendar(&mut session, month, export),
        Some(Commands::Migrate) => {
            let count = session.sync.migrate_legacy_cache(session.user.as_ref())?;
            println!("✓ Migrated {} cached entries", count);
            Ok(())
        }
        Some(Commands::Logout) => {
            let count = session.sync.logout()?;
            println!("✓ Cleared {} cached entries", count);
            Ok(())
        }
        None => cmd_day(&mut session, DateKey::today()),
    }
}

// ----------------------------------------------------------------------------
// Schedule and progress
// ----------------------------------------------------------------------------

fn cmd_day(session: &mut Session, date: DateKey) -> Result<()> {
    let plan = DayPlan::load(&mut session.sync, session.user.as_ref(), &session.rotation, date);
    display_plan(&plan);

    let log = session.sync.load_food(session.user.as_ref(), &date);
    let totals = log.totals();
    println!(
        "  Food: {:.0} / {:.0} kcal, {:.0} / {:.0} g protein",
        totals.calories, log.calorie_goal, totals.protein, log.protein_goal
    );
    println!();
    Ok(())
}

fn display_plan(plan: &DayPlan) {
    let marker = if plan.is_manual_override { " (override)" } else { "" };
    println!();
    println!("  {} {}: {}{}", plan.date_key, plan.date_key.date().weekday(), plan.workout, marker);

    let exercises = plan.exercises();
    if exercises.is_empty() {
        println!("  Rest day");
        println!();
        return;
    }

    println!("  Progress: {}%", plan.completion_percent());
    println!();
    for (i, exercise) in exercises.iter().enumerate() {
        println!("  {}. {}", i + 1, exercise.name);
        for (j, set) in exercise.sets.iter().enumerate() {
            let check = if set.completed { "x" } else { " " };
            let weight = if set.weight.is_empty() { "-" } else { set.weight.as_str() };
            let notes = if set.notes.is_empty() {
                String::new()
            } else {
                format!("  ({})", set.notes)
            };
            println!("     {}) [{}] {} x {}{}", j + 1, check, weight, set.reps, notes);
        }
    }
    println!();
}

fn cmd_schedule(session: &mut Session, from: Option<DateKey>, days: u32) -> Result<()> {
    let today = DateKey::today().date();
    let start = from.map(|d| d.date()).unwrap_or(today);
    if days == 0 {
        return Ok(());
    }
    if days > MAX_SCHEDULE_DAYS {
        return Err(Error::Config(format!(
            "--days must be at most {}, got {}",
            MAX_SCHEDULE_DAYS, days
        )));
    }
    let end = start
        .checked_add_days(Days::new(u64::from(days - 1)))
        .ok_or_else(|| Error::Config(format!("Schedule range from {} is out of range", start)))?;

    let overrides = session.sync.load_overrides(session.user.as_ref());
    for day in session.rotation.generate_schedule(start, end, &overrides, today) {
        let mut notes = Vec::new();
        if day.is_today {
            notes.push("today");
        }
        if day.is_manual_override {
            notes.push("override");
        } else if day.is_fixed_rest {
            notes.push("fixed rest");
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!("  ({})", notes.join(", "))
        };
        println!("{} {}  {}{}", day.date_key, day.date.weekday(), day.workout, notes);
    }
    Ok(())
}

fn cmd_override(session: &mut Session, date: DateKey, label: &str) -> Result<()> {
    let catalog = session.sync.load_workouts(session.user.as_ref());
    if label != REST_LABEL && !catalog.contains(label) {
        let options: Vec<&str> = catalog.labels().collect();
        return Err(Error::Catalog(format!(
            "No workout named {:?} (choose from: {})",
            label,
            options.join(", ")
        )));
    }

    let mut overrides = session.sync.load_overrides(session.user.as_ref());
    overrides.pin(date, label);
    session.sync.save_overrides(session.user.as_ref(), &overrides)?;

    println!("✓ {} pinned to {}", date, label);
    Ok(())
}

fn cmd_clear_override(session: &mut Session, date: DateKey) -> Result<()> {
    let mut overrides = session.sync.load_overrides(session.user.as_ref());
    match overrides.unpin(&date) {
        Some(label) => {
            session.sync.save_overrides(session.user.as_ref(), &overrides)?;
            let workout = session.rotation.resolve(date.date(), &overrides);
            println!("✓ Removed {} pin from {}; now {}", label, date, workout);
        }
        None => println!("No override set for {}", date),
    }
    Ok(())
}

/// Map 1-based exercise/set positions to the ids shown for the day
fn set_ids(plan: &DayPlan, exercise: usize, set: usize) -> Result<(Uuid, Uuid, String)> {
    let chosen = position(plan.exercises(), exercise)
        .ok_or_else(|| Error::Progress(format!("No exercise {} in {}", exercise, plan.workout)))?;
    let set_id = position(&chosen.sets, set)
        .map(|s| s.id)
        .ok_or_else(|| Error::Progress(format!("No set {} in {}", set, chosen.name)))?;
    Ok((chosen.id, set_id, chosen.name.clone()))
}

fn position<T>(items: &[T], position: usize) -> Option<&T> {
    position.checked_sub(1).and_then(|i| items.get(i))
}

fn cmd_toggle(session: &mut Session, date: DateKey, exercise: usize, set: usize) -> Result<()> {
    let mut plan = DayPlan::load(&mut session.sync, session.user.as_ref(), &session.rotation, date);
    let (exercise_id, set_id, name) = set_ids(&plan, exercise, set)?;

    let completed = plan.toggle_set(&mut session.sync, session.user.as_ref(), exercise_id, set_id)?;
    let state = if completed { "done" } else { "not done" };
    println!("✓ {} set {} marked {} ({}%)", name, set, state, plan.completion_percent());
    Ok(())
}

fn cmd_log(session: &mut Session, date: DateKey, exercise: usize, set: usize, edit: &SetEdit) -> Result<()> {
    let mut plan = DayPlan::load(&mut session.sync, session.user.as_ref(), &session.rotation, date);
    let (exercise_id, set_id, name) = set_ids(&plan, exercise, set)?;

    plan.edit_set(&mut session.sync, session.user.as_ref(), exercise_id, set_id, edit)?;
    println!("✓ Recorded {} set {} for {}", name, set, date);
    Ok(())
}

// ----------------------------------------------------------------------------
// Workout catalog
// ----------------------------------------------------------------------------

fn cmd_workouts(session: &mut Session, command: WorkoutsCommand) -> Result<()> {
    let mut catalog = session.sync.load_workouts(session.user.as_ref());

    let message = match command {
        WorkoutsCommand::List { label: None } => {
            for label in catalog.labels() {
                println!("{} ({} exercises)", label, catalog.exercises(label).len());
            }
            return Ok(());
        }
        WorkoutsCommand::List { label: Some(label) } => {
            if !catalog.contains(&label) {
                return Err(Error::Catalog(format!("No workout named {:?}", label)));
            }
            for (i, exercise) in catalog.exercises(&label).iter().enumerate() {
                let sets: Vec<String> = exercise
                    .sets
                    .iter()
                    .map(|s| format!("{}x{}", if s.weight.is_empty() { "-" } else { s.weight.as_str() }, s.reps))
                    .collect();
                println!("{}. {}  {}", i + 1, exercise.name, sets.join(", "));
            }
            return Ok(());
        }
        WorkoutsCommand::Add { label } => {
            catalog.add_workout(&label)?;
            format!("Added workout {}", label.trim())
        }
        WorkoutsCommand::Remove { label } => {
            let removed = catalog.remove_workout(&label)?;
            format!("Removed workout {} ({} exercises)", label, removed.len())
        }
        WorkoutsCommand::Rename { from, to } => {
            catalog.rename_workout(&from, &to)?;
            format!("Renamed {} to {}", from, to.trim())
        }
        WorkoutsCommand::AddExercise {
            label,
            name,
            sets,
            weight,
            reps,
        } => {
            catalog.add_exercise(&label, &name, sets, &weight, &reps)?;
            format!("Added {} to {}", name.trim(), label)
        }
        WorkoutsCommand::RemoveExercise { label, exercise } => {
            let id = exercise_id(&catalog, &label, exercise)?;
            let removed = catalog.remove_exercise(&label, id)?;
            format!("Removed {} from {}", removed.name, label)
        }
        WorkoutsCommand::MoveExercise { label, exercise, to } => {
            let id = exercise_id(&catalog, &label, exercise)?;
            catalog.move_exercise(&label, id, to.saturating_sub(1))?;
            format!("Moved exercise {} of {} to position {}", exercise, label, to)
        }
        WorkoutsCommand::EditSet {
            label,
            exercise,
            set,
            weight,
            reps,
        } => {
            let chosen = position(catalog.exercises(&label), exercise)
                .ok_or_else(|| Error::Catalog(format!("No exercise {} in {}", exercise, label)))?;
            let set_id = position(&chosen.sets, set)
                .map(|s| s.id)
                .ok_or_else(|| Error::Catalog(format!("No set {} in {}", set, chosen.name)))?;
            let id = chosen.id;
            let edit = SetEdit {
                weight,
                reps,
                notes: None,
            };
            catalog.edit_set(&label, id, set_id, &edit)?;
            format!("Updated set {} of exercise {} in {}", set, exercise, label)
        }
    };

    session.sync.save_workouts(session.user.as_ref(), &catalog)?;
    println!("✓ {}", message);
    Ok(())
}

fn exercise_id(catalog: &WorkoutCatalog, label: &str, exercise: usize) -> Result<Uuid> {
    position(catalog.exercises(label), exercise)
        .map(|e| e.id)
        .ok_or_else(|| Error::Catalog(format!("No exercise {} in {}", exercise, label)))
}

// ----------------------------------------------------------------------------
// Food
// ----------------------------------------------------------------------------

fn cmd_food(session: &mut Session, date: DateKey, command: FoodCommand) -> Result<()> {
    let mut log = session.sync.load_food(session.user.as_ref(), &date);

    let message = match command {
        FoodCommand::Show => {
            display_food(&log, &date, &session.config.nutrition);
            return Ok(());
        }
        FoodCommand::Add {
            name,
            calories,
            protein,
        } => {
            match calories {
                Some(calories) => {
                    log.add_item(&name, calories, protein.unwrap_or(0.0))?;
                }
                None => {
                    let library = session.sync.load_food_library(session.user.as_ref());
                    let template = library.find(&name).ok_or_else(|| {
                        Error::Food(format!("{:?} is not in the library; give calories and protein", name))
                    })?;
                    log.add_from_template(template)?;
                }
            }
            format!("Added {} to {}", name.trim(), date)
        }
        FoodCommand::Eat { item } => {
            let index = item.saturating_sub(1);
            let eaten = log.toggle_eaten(index)?;
            let name = &log.items[index].name;
            if eaten {
                format!("Ate {}", name)
            } else {
                format!("Marked {} as not eaten", name)
            }
        }
        FoodCommand::Remove { item } => {
            let removed = log.remove_item(item.saturating_sub(1))?;
            format!("Removed {}", removed.name)
        }
        FoodCommand::Goals { calories, protein } => {
            log.set_goals(calories, protein)?;
            format!(
                "Goals for {}: {:.0} kcal, {:.0} g protein",
                date, log.calorie_goal, log.protein_goal
            )
        }
    };

    session.sync.save_food(session.user.as_ref(), &date, &log)?;
    println!("✓ {}", message);
    Ok(())
}

fn display_food(log: &FoodLog, date: &DateKey, nutrition: &NutritionConfig) {
    let totals = log.totals();
    println!();
    println!("  Food for {}", date);
    println!();
    if log.items.is_empty() {
        println!("  No food logged");
    }
    for (i, item) in log.items.iter().enumerate() {
        let check = if item.eaten { "x" } else { " " };
        println!(
            "  {}. [{}] {}  {:.0} kcal, {:.0} g",
            i + 1,
            check,
            item.name,
            item.calories,
            item.protein
        );
    }
    println!();
    println!(
        "  Calories: {:.0} / {:.0} ({}%)",
        totals.calories,
        log.calorie_goal,
        log.calorie_percent(nutrition)
    );
    println!("  Protein: {:.0} / {:.0} g", totals.protein, log.protein_goal);
    println!();
}

fn cmd_library(session: &mut Session, command: LibraryCommand) -> Result<()> {
    let mut library = session.sync.load_food_library(session.user.as_ref());

    let message = match command {
        LibraryCommand::List => {
            if library.items.is_empty() {
                println!("Library is empty");
            }
            for template in &library.items {
                println!("{}  {:.0} kcal, {:.0} g", template.name, template.calories, template.protein);
            }
            return Ok(());
        }
        LibraryCommand::Add {
            name,
            calories,
            protein,
        } => {
            library.add(FoodTemplate {
                name: name.clone(),
                calories,
                protein,
            })?;
            format!("Saved {} to the library", name.trim())
        }
        LibraryCommand::Remove { name } => {
            let removed = library.remove(&name)?;
            format!("Removed {} from the library", removed.name)
        }
    };

    session.sync.save_food_library(session.user.as_ref(), &library)?;
    println!("✓ {}", message);
    Ok(())
}

// ----------------------------------------------------------------------------
// Calendar
// ----------------------------------------------------------------------------

fn cmd_calendar(session: &mut Session, month: Option<String>, export: Option<PathBuf>) -> Result<()> {
    let (year, month) = match month {
        Some(ref s) => parse_month(s)?,
        None => {
            let today = DateKey::today().date();
            (today.year(), today.month())
        }
    };

    let progress = session.sync.load_all_progress(session.user.as_ref());
    let food = session.sync.load_all_food(session.user.as_ref());
    let days = summarize_month(year, month, &progress, &food, &session.config.nutrition)?;

    for day in &days {
        if !day.has_activity() {
            println!("{}  -", day.date_key);
            continue;
        }
        println!(
            "{}  {}  workout {}%  food {}%  {:.0} kcal  {:.0} g",
            day.date_key,
            day.workout.as_deref().unwrap_or("-"),
            day.workout_percent,
            day.food_percent,
            day.calories,
            day.protein
        );
    }

    if let Some(path) = export {
        let count = export_csv(&path, &days)?;
        println!("✓ Exported {} days to {}", count, path.display());
    }
    Ok(())
}

fn parse_month(s: &str) -> Result<(i32, u32)> {
    let invalid = || Error::Config(format!("Invalid month {:?}, expected YYYY-MM", s));
    let (year, month) = s.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}
