//! # dayring
//!
//! Plan your day as colored time blocks on a 24-hour dial. dayring combines a
//! scriptable CLI with an interactive terminal dial (TUI).
//!
//! ## Features
//!
//! *   **24-hour dial**: Blocks are drawn as arcs on a ring; midnight is at the
//!     top and the day runs clockwise. Click the ring to select a block or to
//!     start a new one at that time.
//! *   **Checklists**: Every block carries its own todos.
//! *   **Templates**: Switch between whole-day layouts. "Student" and
//!     "Professional" ship built in; save your own from the current day.
//! *   **Day schedules**: Save a layout for a weekday and it loads
//!     automatically when you open the dial on that day.
//! *   **Pomodoro**: A focus timer with short and long breaks.
//!
//! ## Usage
//!
//! ### Interactive Mode (TUI)
//!
//! ```bash
//! dayring
//! # or explicitly
//! dayring ui
//! ```
//!
//! **Dial View**
//! *   `q`: Quit
//! *   `j`/`k`: Select next/previous block
//! *   `a`: Add block
//! *   `e`: Edit title, `s`: Edit start, `f`: Edit end, `c`: Next color
//! *   `d`: Delete block
//! *   `o`: Add todo to selected block, `Space`: Toggle first open todo
//! *   `w`: Save today's schedule for this weekday
//! *   `p`: Start/pause pomodoro, `n`: Skip phase, `r`: Reset phase
//! *   `v`: Switch to Templates view
//! *   Mouse: click the ring to select a block or add one at that time
//!
//! **Template View**
//! *   `Enter`: Switch to the selected template
//! *   `a`: Save today's blocks as a new template
//! *   `d`: Delete template
//! *   `v`: Back to the dial
//!
//! ### Command Line Interface (CLI)
//!
//! ```bash
//! dayring block add "Gym" --start 06:00 --end 07:30
//! dayring block list
//! dayring todo add <BLOCK_ID> "Stretch"
//! dayring template use professional
//! dayring schedule save --days weekdays
//! dayring now
//! ```
//!
//! ## Data Storage
//!
//! Data is saved as JSON files in your local data directory:
//! *   Linux: `~/.local/share/dayring/`
//! *   macOS: `~/Library/Application Support/dayring/`
//! *   Windows: `%LOCALAPPDATA%\dayring\`
//!
//! You can override this by setting the `DAYRING_DATA_DIR` environment variable.
//! Set `RUST_LOG=debug` (or pass `--verbose`) to see what the stores do.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use tracing_subscriber::EnvFilter;
use dayring::commands::*;
use dayring::tui::run_tui;

#[derive(Parser)]
#[command(name = "dayring")]
#[command(about = "24-hour time block planner", long_about = None)]
struct Cli {
    /// Log store activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage today's blocks
    Block {
        #[command(subcommand)]
        command: BlockCommands,
    },
    /// Manage a block's todos
    Todo {
        #[command(subcommand)]
        command: TodoCommands,
    },
    /// Show the current time and active block
    Now,
    /// List the unplanned parts of the day
    Free,
    /// Manage templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },
    /// Manage weekday schedules
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
    /// Print the SVG arc of every block on a 600x600 dial
    Dial,
    /// Hit-test a point on the 600x600 dial
    Hit {
        x: f64,
        y: f64,
    },
    /// Pomodoro settings
    Pomodoro {
        #[command(subcommand)]
        command: PomodoroCommands,
    },
    /// Delete all blocks, templates, schedules and settings
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open the interactive dial
    Ui,
}

#[derive(Subcommand)]
enum BlockCommands {
    /// List today's blocks
    List,
    /// Add a block
    Add {
        /// Block title (quoted if it has spaces)
        title: String,
        /// Start time, HH:MM
        #[arg(short, long)]
        start: String,
        /// End time, HH:MM (24:00 for end of day). Defaults to start + 2h
        #[arg(short, long)]
        end: Option<String>,
        /// Color as #RRGGBB
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Edit a block
    Edit {
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New start time, HH:MM
        #[arg(short, long)]
        start: Option<String>,
        /// New end time, HH:MM
        #[arg(short, long)]
        end: Option<String>,
        /// New color as #RRGGBB
        #[arg(short, long)]
        color: Option<String>,
    },
    /// Remove a block
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
enum TodoCommands {
    /// Add a todo to a block
    Add {
        block_id: String,
        text: String,
    },
    /// Toggle a todo done/open
    Toggle {
        block_id: String,
        todo_id: String,
    },
    /// Remove a todo
    Remove {
        block_id: String,
        todo_id: String,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// List templates
    List,
    /// Load a template's blocks as today's blocks
    Use {
        id: String,
    },
    /// Save today's blocks as a new template
    Save {
        name: String,
    },
    /// Remove a template (built-ins are hidden and can be restored)
    Remove {
        id: String,
    },
    /// Restore a removed built-in template
    Restore {
        id: String,
    },
}

#[derive(Subcommand)]
enum ScheduleCommands {
    /// List saved weekday schedules
    List,
    /// Save today's blocks for some days
    Save {
        /// Days, e.g. "mon,wed", "weekdays", "weekend", "0,6" (default: today)
        #[arg(short, long)]
        days: Option<String>,
    },
    /// Copy one day's schedule to other days
    Copy {
        from: String,
        to: String,
    },
    /// Load a day's schedule as today's blocks
    Load {
        day: String,
    },
    /// Remove schedules
    Remove {
        day: String,
    },
    /// Load today's schedule if one is saved
    Today,
}

#[derive(Subcommand)]
enum PomodoroCommands {
    /// Show settings
    Show,
    /// Change settings (minutes)
    Set {
        #[arg(short, long)]
        work: Option<u32>,
        #[arg(short, long)]
        short: Option<u32>,
        #[arg(short, long)]
        long: Option<u32>,
        /// Work sessions before a long break
        #[arg(short, long)]
        interval: Option<u32>,
    },
    /// Restore default settings
    Reset,
}

fn init_logging(verbose: bool, tui: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if tui && std::env::var_os("RUST_LOG").is_none() {
        // The TUI owns the terminal; stay quiet unless asked.
        return;
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let tui = matches!(cli.command, None | Some(Commands::Ui));
    init_logging(cli.verbose, tui);

    match cli.command {
        Some(Commands::Block { command }) => match command {
            BlockCommands::List => cmd_block_list(),
            BlockCommands::Add { title, start, end, color } => cmd_block_add(title, start, end, color, false),
            BlockCommands::Edit { id, title, start, end, color } => cmd_block_edit(id, title, start, end, color, false),
            BlockCommands::Remove { id } => cmd_block_remove(id, false),
        },
        Some(Commands::Todo { command }) => match command {
            TodoCommands::Add { block_id, text } => cmd_todo_add(block_id, text, false),
            TodoCommands::Toggle { block_id, todo_id } => cmd_todo_toggle(block_id, todo_id, false),
            TodoCommands::Remove { block_id, todo_id } => cmd_todo_remove(block_id, todo_id, false),
        },
        Some(Commands::Now) => cmd_now(),
        Some(Commands::Free) => cmd_free(),
        Some(Commands::Template { command }) => match command {
            TemplateCommands::List => cmd_template_list(),
            TemplateCommands::Use { id } => cmd_template_use(id, false),
            TemplateCommands::Save { name } => cmd_template_save(name, false),
            TemplateCommands::Remove { id } => cmd_template_remove(id, false),
            TemplateCommands::Restore { id } => cmd_template_restore(id, false),
        },
        Some(Commands::Schedule { command }) => match command {
            ScheduleCommands::List => cmd_schedule_list(),
            ScheduleCommands::Save { days } => cmd_schedule_save(days, false),
            ScheduleCommands::Copy { from, to } => cmd_schedule_copy(from, to, false),
            ScheduleCommands::Load { day } => cmd_schedule_load(day, false),
            ScheduleCommands::Remove { day } => cmd_schedule_remove(day, false),
            ScheduleCommands::Today => cmd_schedule_today(false),
        },
        Some(Commands::Dial) => cmd_dial(),
        Some(Commands::Hit { x, y }) => cmd_hit(x, y),
        Some(Commands::Pomodoro { command }) => match command {
            PomodoroCommands::Show => cmd_pomodoro_show(),
            PomodoroCommands::Set { work, short, long, interval } => cmd_pomodoro_set(work, short, long, interval, false),
            PomodoroCommands::Reset => cmd_pomodoro_reset(false),
        },
        Some(Commands::Reset { force }) => cmd_reset(force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "dayring", &mut io::stdout());
        }
        Some(Commands::Ui) | None => {
            if let Err(e) = run_tui() {
                eprintln!("Error running TUI: {}", e);
            }
        }
    }
}
