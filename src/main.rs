use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use eyre::Result;
use minitodo::{App, Config, FileStorage, Task, TaskId, Theme};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "minitodo")]
#[command(about = "Minimal to-do list with persistent tasks and a dark/light theme")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Directory holding the .minitodo store (default: config, then data dir)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        /// Task text; words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// List tasks, incomplete first
    List,

    /// Mark a task done, or not done
    Toggle { id: TaskId },

    /// Delete a task
    #[command(alias = "delete")]
    Remove { id: TaskId },

    /// Show or toggle the theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    /// Switch between dark and light
    Toggle,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    let store_path = config.resolve_store_path(cli.store_path.as_deref());

    // Open store
    let storage = FileStorage::open(&store_path)?;
    let mut app = App::open(storage, config.persist_policy());

    match cli.command.unwrap_or(Commands::List) {
        Commands::Add { text } => {
            if let Some(id) = app.tasks.add(&text.join(" "))? {
                println!("Added task {}", id);
            }
        }
        Commands::List => render(&app),
        Commands::Toggle { id } => match app.tasks.toggle(id)? {
            Some(true) => println!("Task {} done", id),
            Some(false) => println!("Task {} not done", id),
            None => println!("No task with id {}", id),
        },
        Commands::Remove { id } => {
            if app.tasks.remove(id)? {
                println!("Removed task {}", id);
            } else {
                println!("No task with id {}", id);
            }
        }
        Commands::Theme { action } => {
            if let Some(ThemeAction::Toggle) = action {
                app.theme.toggle()?;
            }
            println!("Theme: {}", app.theme.theme());
        }
    }

    Ok(())
}

fn render(app: &App<FileStorage>) {
    let theme = app.theme.theme();

    if app.tasks.is_empty() {
        println!("{}", paint("No tasks yet. Add one with `minitodo add <text>`.", theme).italic());
        return;
    }

    for task in app.tasks.ordered_for_display() {
        println!("{}", render_task(task, theme));
    }
}

fn render_task(task: &Task, theme: Theme) -> String {
    let mark = if task.completed { "[x]" } else { "[ ]" };
    let created = task
        .created_at()
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();

    let text = if task.completed {
        task.text.strikethrough().dimmed()
    } else {
        paint(&task.text, theme)
    };

    format!("{} {} {} {}", paint(mark, theme), task.id.to_string().dimmed(), text, created.dimmed())
}

fn paint(s: &str, theme: Theme) -> ColoredString {
    match theme {
        Theme::Dark => s.bright_white(),
        Theme::Light => s.black(),
    }
}
