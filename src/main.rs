use choredice::selection::{describe_roll, roll_label};
use choredice::{BackendKind, Chore, ChoreStore, Config, RollPhase, RollSession, Snapshot, open_backend};
use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "choredice")]
#[command(about = "Keep a chore list and let the dice pick what to do next")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file (default: platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the chore database (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Storage backend (overrides config)
    #[arg(short, long, value_enum)]
    backend: Option<BackendKind>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a chore to the pending list
    Add {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Show pending and completed chores
    List {
        /// Include ids and creation times
        #[arg(short, long)]
        verbose: bool,
    },

    /// Delete a chore by id from either list
    Remove { id: i64 },

    /// Roll the die and complete the chore it lands on
    Roll {
        /// Seed the roll for a reproducible result
        #[arg(long)]
        seed: Option<u64>,

        /// Skip the tumbling animation
        #[arg(long)]
        no_animate: bool,
    },

    /// Show which die the next roll will use
    Die,

    /// Delete every chore, pending and completed
    Clear {
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Print the stored snapshot as JSON
    Export,

    /// Replace all chores with a snapshot file
    Import { file: PathBuf },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    // Setup tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Commands::Config = cli.command {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    // Open store
    let backend = open_backend(config.backend, &config.data_dir)
        .with_context(|| format!("Failed to open {} storage in {:?}", config.backend, config.data_dir))?;
    let mut store = ChoreStore::open(backend);

    match cli.command {
        Commands::Add { text } => match store.add(&text.join(" ")) {
            Some(chore) => println!("Added {} {}", chore.text.bold(), format!("(id {})", chore.id).dimmed()),
            None => println!("{}", "Nothing to add".dimmed()),
        },
        Commands::List { verbose } => print_lists(&store, verbose),
        Commands::Remove { id } => {
            if store.remove(id) {
                println!("Removed chore {}", id);
            } else {
                println!("{}", format!("No chore with id {}", id).dimmed());
            }
        }
        Commands::Roll { seed, no_animate } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            roll(&mut store, &mut rng, config.animate && !no_animate, &config)?;
        }
        Commands::Die => {
            let pending = store.pending_count();
            if pending == 0 {
                println!("{}", roll_label(pending).dimmed());
            } else {
                println!("{}", describe_roll(pending));
                println!("{}", roll_label(pending).bold());
            }
        }
        Commands::Clear { yes } => {
            if yes || confirm("Are you sure you want to clear all chores?")? {
                store.clear_all();
                println!("All chores cleared");
            } else {
                println!("{}", "Cancelled".dimmed());
            }
        }
        Commands::Export => {
            println!("{}", serde_json::to_string_pretty(&store.snapshot())?);
        }
        Commands::Import { file } => {
            let contents = std::fs::read_to_string(&file).with_context(|| format!("Failed to read {:?}", file))?;
            let snapshot = Snapshot::from_json(&contents).with_context(|| format!("Invalid snapshot in {:?}", file))?;
            store.replace(snapshot)?;
            let stats = store.stats();
            println!("Imported {} pending and {} completed chores", stats.pending, stats.completed);
        }
        Commands::Config => unreachable!("handled before the store is opened"),
    }

    Ok(())
}

fn roll(store: &mut ChoreStore, rng: &mut StdRng, animate: bool, config: &Config) -> Result<()> {
    let mut session = RollSession::new(config.timing());
    let timing = session.timing();

    if store.pending_count() == 0 {
        println!("{}", roll_label(0).dimmed());
        return Ok(());
    }

    println!("{}", describe_roll(store.pending_count()));

    if let RollPhase::Rolling { frames, roll, .. } = session.start(store, rng)? {
        if animate {
            let mut stdout = io::stdout();
            for face in frames {
                print!("\r  🎲 {:>2}", face);
                stdout.flush()?;
                thread::sleep(Duration::from_millis(timing.interval_ms));
            }
            print!("\r");
        }
        println!("  🎲 Rolled: {}", roll.to_string().yellow().bold());
    }

    if animate {
        thread::sleep(Duration::from_millis(timing.reveal_delay_ms));
    }
    let chore = session.reveal(store)?;
    println!("  {}", chore.text.green().bold());

    session.resolve(store)?;
    let outcome = session.finish()?;

    let remaining = store.pending_count();
    println!(
        "{}",
        format!("Moved \"{}\" to completed, {} left", outcome.chore.text, remaining).dimmed()
    );
    Ok(())
}

fn print_lists(store: &ChoreStore, verbose: bool) {
    println!("{} ({})", "Pending".bold(), store.pending().len());
    if store.pending().is_empty() {
        println!("  {}", "No chores added yet. Add some chores to get started!".dimmed());
    }
    for (i, chore) in store.pending().iter().enumerate() {
        println!("  {:>2}. {}{}", i + 1, chore.text, details(chore, verbose));
    }

    println!();
    println!("{} ({})", "Completed".bold(), store.completed().len());
    if store.completed().is_empty() {
        println!("  {}", "No completed chores yet.".dimmed());
    }
    for chore in store.completed() {
        println!(
            "  {} {}{}",
            "✓".green(),
            chore.text.dimmed().strikethrough(),
            details(chore, verbose)
        );
    }
}

fn details(chore: &Chore, verbose: bool) -> String {
    if !verbose {
        return String::new();
    }
    let created = chore
        .created_at()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!("  {}", format!("[id {}, added {}]", chore.id, created).dimmed())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
