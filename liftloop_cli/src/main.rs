mod terminal;

use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use liftloop_core::backend::WorkoutInstancePatch;
use liftloop_core::history::{export_csv, split_past_instances};
use liftloop_core::related::apply_quantity_edit;
use liftloop_core::resume::next_cycle_entry;
use liftloop_core::*;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "liftloop")]
#[command(about = "Guided workout playthroughs from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the built-in exercises, workouts and cycles into the store
    Seed,

    /// List workout definitions
    Definitions,

    /// Show one workout definition block by block
    Definition {
        /// Definition id or exact name
        definition: String,
    },

    /// List workout cycles, marking the workout that is up next
    Cycles,

    /// List past workout instances
    Past {
        /// Only started workouts that were never finished
        #[arg(long)]
        incomplete: bool,
    },

    /// Create a new instance of a workout definition and play it
    Start {
        /// Definition id or exact name
        definition: String,

        /// Advance through every phase immediately (for scripted runs)
        #[arg(long)]
        auto: bool,
    },

    /// Play (or continue) an existing workout instance
    Play {
        instance_id: Uuid,

        /// Advance through every phase immediately (for scripted runs)
        #[arg(long)]
        auto: bool,
    },

    /// Show a workout instance with all of its exercise instances
    Show { instance_id: Uuid },

    /// Set the notes on a workout instance
    Notes { instance_id: Uuid, text: String },

    /// Set weight, reps/seconds or notes on an exercise instance
    ///
    /// An unfinished exercise carries the edit to its paired side and to
    /// the later sets that are not done yet.
    Set {
        exercise_instance_id: Uuid,

        #[arg(value_enum)]
        field: QuantityField,

        value: String,
    },

    /// Mark an in-progress workout instance finished
    Finish { instance_id: Uuid },

    /// Past performances of the same exercise and variants
    History {
        exercise_instance_id: Uuid,

        /// Also write the rows to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum QuantityField {
    /// Weight in lbs
    Weight,
    /// Reps or seconds, depending on the exercise
    Limit,
    Notes,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Top-level error boundary: report and stop
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
    liftloop_core::logging::init_with_level(&config.logging.level);

    // Determine data directory
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let mut store = FileStore::new(liftloop_core::config::DataConfig::store_path(&data_dir));
    tracing::debug!("Using store {:?}", store.path());

    match cli.command {
        Commands::Seed => cmd_seed(&store),
        Commands::Definitions => cmd_definitions(&store),
        Commands::Definition { definition } => cmd_definition(&store, &definition),
        Commands::Cycles => cmd_cycles(&store),
        Commands::Past { incomplete } => cmd_past(&store, incomplete),
        Commands::Start { definition, auto } => {
            let definition_id = resolve_definition(&store, &definition)?;
            let instance = store.instantiate_workout(definition_id)?;
            println!("✓ Created workout instance {}", instance.id);
            terminal::play(&mut store, &config.playthrough, instance.id, auto)
        }
        Commands::Play { instance_id, auto } => {
            terminal::play(&mut store, &config.playthrough, instance_id, auto)
        }
        Commands::Show { instance_id } => cmd_show(&store, instance_id),
        Commands::Notes { instance_id, text } => cmd_notes(&mut store, instance_id, text),
        Commands::Set {
            exercise_instance_id,
            field,
            value,
        } => cmd_set(&mut store, exercise_instance_id, field, &value),
        Commands::Finish { instance_id } => cmd_finish(&mut store, instance_id),
        Commands::History {
            exercise_instance_id,
            csv,
        } => cmd_history(&store, exercise_instance_id, csv),
    }
}

fn cmd_seed(store: &FileStore) -> Result<()> {
    let added = store.update(|data| data.import_catalog(get_default_catalog()?))?;
    if added == 0 {
        println!("Store already seeded - nothing to add.");
    } else {
        println!("✓ Added {} workout definitions", added);
    }
    println!("  Store: {}", store.path().display());
    Ok(())
}

/// Accept either a definition id or its exact name
fn find_definition(store: &FileStore, definition: &str) -> Result<WorkoutDefinition> {
    let id = Uuid::parse_str(definition).ok();
    store
        .list_workout_definitions()?
        .into_iter()
        .find(|d| Some(d.id) == id || d.name == definition)
        .ok_or_else(|| Error::NotFound(format!("workout definition '{}'", definition)))
}

fn resolve_definition(store: &FileStore, definition: &str) -> Result<Uuid> {
    find_definition(store, definition).map(|d| d.id)
}

fn cmd_definitions(store: &FileStore) -> Result<()> {
    let definitions = store.list_workout_definitions()?;
    if definitions.is_empty() {
        println!("No workout definitions. Run `liftloop seed` first.");
        return Ok(());
    }
    for definition in definitions {
        println!("{}  {}", definition.id, definition.name);
        println!("    {}", last_finished_text(definition.last_finished));
    }
    Ok(())
}

fn cmd_definition(store: &FileStore, definition: &str) -> Result<()> {
    let definition = find_definition(store, definition)?;
    println!("{}  {}", definition.id, definition.name);
    if let Some(description) = &definition.description {
        println!("  {}", description);
    }
    println!("  {}", last_finished_text(definition.last_finished));

    for (idx, block) in definition.blocks.iter().enumerate() {
        let name = block
            .name
            .clone()
            .unwrap_or_else(|| format!("block {}", idx + 1));
        println!();
        println!(
            "  {} ({})",
            name,
            playthrough::pluralize("Set", block.sets_count as f64)
        );
        if let Some(description) = &block.description {
            println!("    {}", description);
        }
        for slot in &block.exercises {
            println!(
                "    - {}: {}",
                slot.title(),
                limit_text(slot.limit_type, slot.limit_value)
            );
        }
    }
    Ok(())
}

fn cmd_cycles(store: &FileStore) -> Result<()> {
    let cycles = store.list_workout_cycles()?;
    if cycles.is_empty() {
        println!("No workout cycles. Run `liftloop seed` first.");
        return Ok(());
    }
    for cycle in cycles {
        println!("{}", cycle.name);
        let last_finished: Vec<_> = cycle.entries.iter().map(|d| d.last_finished).collect();
        let next = next_cycle_entry(&last_finished);
        for (idx, definition) in cycle.entries.iter().enumerate() {
            let marker = if next == Some(idx) { "→" } else { " " };
            println!(
                "  {} {}  {} ({})",
                marker,
                definition.id,
                definition.name,
                last_finished_text(definition.last_finished)
            );
        }
    }
    Ok(())
}

fn cmd_past(store: &FileStore, incomplete: bool) -> Result<()> {
    let split = split_past_instances(store.list_workout_instances()?);
    let instances = if incomplete { split.incomplete } else { split.all };
    if instances.is_empty() {
        println!("No workout instances.");
        return Ok(());
    }
    for instance in instances {
        println!("{}  {}", instance.id, instance.definition_name);
        println!(
            "    created {} | {} | {}",
            local_time(instance.created),
            started_text(instance.started),
            finished_text(instance.finished)
        );
        if let Some(notes) = instance.description {
            println!("    notes: {}", notes);
        }
    }
    Ok(())
}

fn cmd_show(store: &FileStore, instance_id: Uuid) -> Result<()> {
    let workout = store.get_workout_instance(instance_id)?;
    print_workout(&workout);
    Ok(())
}

fn cmd_notes(store: &mut FileStore, instance_id: Uuid, text: String) -> Result<()> {
    let workout = store.patch_workout_instance(
        instance_id,
        &WorkoutInstancePatch {
            description: Some(text),
            ..Default::default()
        },
    )?;
    println!("✓ Notes saved");
    print_workout(&workout);
    Ok(())
}

fn cmd_set(
    store: &mut FileStore,
    exercise_instance_id: Uuid,
    field: QuantityField,
    value: &str,
) -> Result<()> {
    let edit = match field {
        QuantityField::Weight => QuantityEdit::WeightLbs(parse_amount(value)?),
        QuantityField::Limit => QuantityEdit::LimitValue(parse_amount(value)?),
        QuantityField::Notes => QuantityEdit::Notes(value.to_string()),
    };

    let data = store.load()?;
    let (workout, target) = data.workout_with_exercise(exercise_instance_id)?;
    let workout = apply_quantity_edit(store, workout, target, &edit)?;
    println!("✓ {} updated", edit.name());
    print_workout(&workout);
    Ok(())
}

fn parse_amount(value: &str) -> Result<f64> {
    terminal::parse_quantity(value).map_err(Error::Validation)
}

fn cmd_finish(store: &mut FileStore, instance_id: Uuid) -> Result<()> {
    let workout = store.get_workout_instance(instance_id)?;
    if !workout.is_in_progress() {
        return Err(Error::Validation(format!(
            "Workout instance {} is not in progress",
            instance_id
        )));
    }
    let workout = store.patch_workout_instance(
        instance_id,
        &WorkoutInstancePatch {
            finished: Some(Utc::now()),
            ..Default::default()
        },
    )?;
    println!("✓ Marked finished");
    print_workout(&workout);
    Ok(())
}

fn cmd_history(store: &FileStore, exercise_instance_id: Uuid, csv: Option<PathBuf>) -> Result<()> {
    let entries = store.get_exercise_history(exercise_instance_id)?;
    if entries.is_empty() {
        println!("No finished performances yet.");
    }
    for entry in &entries {
        println!(
            "{}  {}  {}{}",
            entry
                .instance
                .finished
                .map(local_time)
                .unwrap_or_default(),
            entry.slot.title(),
            limit_text(entry.slot.limit_type, entry.instance.limit_value),
            weight_text(entry.instance.weight_lbs)
        );
        if let Some(notes) = &entry.instance.description {
            println!("    notes: {}", notes);
        }
    }

    if let Some(path) = csv {
        let count = export_csv(&entries, &path)?;
        println!("✓ Wrote {} rows to {}", count, path.display());
    }
    Ok(())
}

// ============================================================================
// Display helpers
// ============================================================================

fn print_workout(workout: &WorkoutInstance) {
    println!();
    println!("{}  (instance {})", workout.definition.name, workout.id);
    println!(
        "  {} | {}",
        started_text(workout.started),
        finished_text(workout.finished)
    );
    if let Some(notes) = &workout.description {
        println!("  notes: {}", notes);
    }

    let sorted = sequence(workout);
    let mut current_block = None;
    for entry in &sorted.entries {
        let (Some(block), Some(slot)) = (entry.block(workout), entry.slot(workout)) else {
            continue;
        };
        if current_block != Some(entry.block_index) {
            current_block = Some(entry.block_index);
            let name = block
                .name
                .clone()
                .unwrap_or_else(|| format!("block {}", entry.block_index + 1));
            println!();
            println!("  {}", name);
        }
        let instance = &entry.instance;
        let status = if instance.finished.is_some() { "✓" } else { " " };
        println!(
            "    {} Set {} - {}: {}{}  [{}]",
            status,
            instance.set_iteration,
            slot.title(),
            limit_text(slot.limit_type, instance.limit_value),
            weight_text(instance.weight_lbs),
            instance.id
        );
        if let Some(notes) = &instance.description {
            println!("        notes: {}", notes);
        }
    }
    println!();
}

fn limit_text(limit_type: LimitType, value: f64) -> String {
    match limit_type {
        LimitType::Reps => playthrough::pluralize("Rep", value),
        LimitType::TimeSeconds => playthrough::pluralize("Second", value),
    }
}

fn weight_text(weight_lbs: Option<f64>) -> String {
    weight_lbs
        .map(|w| format!(" @ {} lbs", w))
        .unwrap_or_default()
}

fn local_time(t: DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn last_finished_text(t: Option<DateTime<Utc>>) -> String {
    match t {
        Some(t) => format!("last finished {}", local_time(t)),
        None => "never finished".into(),
    }
}

fn started_text(t: Option<DateTime<Utc>>) -> String {
    match t {
        Some(t) => format!("started {}", local_time(t)),
        None => "not started".into(),
    }
}

fn finished_text(t: Option<DateTime<Utc>>) -> String {
    match t {
        Some(t) => format!("finished {}", local_time(t)),
        None => "not finished".into(),
    }
}
