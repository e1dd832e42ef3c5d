use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "stint", about = concat!("stint v", env!("CARGO_PKG_VERSION"), " - clock your work from the command line"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Explain what is being done
    #[arg(short, long)]
    pub verbose: bool,

    /// Do not run hook scripts
    #[arg(long)]
    pub no_hooks: bool,

    /// Abort when a hook script exits with non-zero code
    #[arg(long)]
    pub check_hooks: bool,

    /// Run against a different base directory
    #[arg(short = 'd', long = "directory", value_name = "DIR")]
    pub directory: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new task
    #[command(visible_alias = "n")]
    New(NewArgs),
    /// Clock in on a task and make it current
    #[command(visible_alias = "w")]
    Workon(WorkonArgs),
    /// Clock out of a task
    #[command(visible_alias = "h")]
    Halt(HaltArgs),
    /// Reopen the last clock entry of a halted task
    #[command(visible_alias = "a")]
    Append(AppendArgs),
    /// Drop the open clock entry
    #[command(visible_alias = "x")]
    Cancel(CancelArgs),
    /// Clock in on the current task again
    #[command(visible_alias = "r")]
    Resume,
    /// Halt the current task and work on another
    #[command(visible_alias = "s")]
    Switchto(SwitchtoArgs),
    /// Halt the current task and pick up the previous one
    #[command(visible_alias = "b")]
    Switchback(SwitchbackArgs),
    /// Clock out and mark the task finished
    #[command(visible_alias = "c")]
    Conclude(ConcludeArgs),
    /// Show the current task and the previous stack
    #[command(visible_alias = "q")]
    Status(StatusArgs),
    /// List tasks
    #[command(visible_alias = "l")]
    List(ListArgs),
    /// Export tasks to a file or another format
    #[command(visible_alias = "o")]
    Export(ExportArgs),
    /// Add a note to a task
    #[command(visible_alias = "t")]
    Note(NoteArgs),
    /// Set a property on a task
    #[command(visible_alias = "p")]
    Set(SetArgs),
    /// Rename a task or move it into another group
    #[command(visible_alias = "m")]
    Move(MoveArgs),
    /// Edit a task record by hand
    #[command(visible_alias = "e")]
    Edit(EditArgs),
    /// Merge data from the fetcher script into a task
    #[command(visible_alias = "f")]
    Fetch(FetchArgs),
    /// Rebuild the index from the task files on disk
    RebuildIndex,
}

// ---------------------------------------------------------------------------
// Workflow command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct NewArgs {
    /// Name for the task, as `[group/[subgroup/]]name`
    pub name: String,
    /// Task title (prompted for interactively when missing)
    pub title: Option<String>,
    /// Seed the record with data from the fetcher script
    #[arg(short, long)]
    pub fetch: bool,
}

#[derive(Args)]
pub struct WorkonArgs {
    /// Task to work on: a name, a positional id, CURRENT or PREVIOUS
    pub selection: String,
    /// Title for a task created with --new
    pub title: Option<String>,
    /// Create the task first
    #[arg(short, long)]
    pub new: bool,
    /// Clock in at this time instead of now
    #[arg(short, long, value_name = "DATE")]
    pub at: Option<String>,
    /// Seed a task created with --new from the fetcher script
    #[arg(short, long)]
    pub fetch: bool,
}

#[derive(Args)]
pub struct HaltArgs {
    /// Task to halt (default: the current task)
    pub selection: Option<String>,
    /// Clock out at this time instead of now
    #[arg(short, long, value_name = "DATE")]
    pub at: Option<String>,
}

#[derive(Args)]
pub struct AppendArgs {
    /// Task to append to (default: the current task)
    pub selection: Option<String>,
}

#[derive(Args)]
pub struct CancelArgs {
    /// Task to cancel the clock entry of (default: the current task)
    pub selection: Option<String>,
}

#[derive(Args)]
pub struct SwitchtoArgs {
    /// Task to work on: a name, a positional id, CURRENT or PREVIOUS
    pub selection: String,
    /// Title for a task created with --new
    pub title: Option<String>,
    /// Create the task first
    #[arg(short, long)]
    pub new: bool,
    /// Clock times at this time instead of now
    #[arg(short, long, value_name = "DATE")]
    pub at: Option<String>,
    /// Seed a task created with --new from the fetcher script
    #[arg(short, long)]
    pub fetch: bool,
}

#[derive(Args)]
pub struct SwitchbackArgs {
    /// Clock times at this time instead of now
    #[arg(short, long, value_name = "DATE")]
    pub at: Option<String>,
}

#[derive(Args)]
pub struct ConcludeArgs {
    /// Task to conclude (default: the current task)
    pub selection: Option<String>,
    /// Clock out at this time instead of now
    #[arg(short, long, value_name = "DATE")]
    pub at: Option<String>,
}

// ---------------------------------------------------------------------------
// Listing command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct StatusArgs {
    /// Show everything recorded for each task
    #[arg(short, long)]
    pub verbose: bool,
    /// Print the total time spent across the listed tasks
    #[arg(short, long)]
    pub sum: bool,
    /// Keep only clock entries from this time on
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,
    /// Keep only clock entries up to this time
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,
    /// Keep only tasks whose property matches a regex
    #[arg(short = 'w', long, num_args = 2, value_names = ["NAME", "REGEX"])]
    pub r#where: Vec<String>,
    /// Show at most this many tasks
    #[arg(short, long, visible_short_alias = 'n', value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct ListArgs {
    /// What to list (default: the current subgroup)
    pub selection: Option<String>,
    /// Show everything recorded for each task
    #[arg(short, long)]
    pub verbose: bool,
    /// Print the total time spent across the listed tasks
    #[arg(short, long)]
    pub sum: bool,
    /// Keep only clock entries from this time on
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,
    /// Keep only clock entries up to this time
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,
    /// Keep only tasks whose property matches a regex
    #[arg(short = 'w', long, num_args = 2, value_names = ["NAME", "REGEX"])]
    pub r#where: Vec<String>,
    /// List every group
    #[arg(short, long)]
    pub all: bool,
    /// Include concluded tasks
    #[arg(short, long)]
    pub concluded: bool,
    /// One-line task headers
    #[arg(short = 'z', long)]
    pub compact: bool,
}

#[derive(Args)]
pub struct ExportArgs {
    /// What to export (default: the current subgroup)
    pub selection: Option<String>,
    /// Show everything recorded for each task
    #[arg(short, long)]
    pub verbose: bool,
    /// Print the total time spent across the listed tasks
    #[arg(short, long)]
    pub sum: bool,
    /// Keep only clock entries from this time on
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,
    /// Keep only clock entries up to this time
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,
    /// Keep only tasks whose property matches a regex
    #[arg(short = 'w', long, num_args = 2, value_names = ["NAME", "REGEX"])]
    pub r#where: Vec<String>,
    /// Export every group
    #[arg(short, long)]
    pub all: bool,
    /// Include concluded tasks
    #[arg(short, long)]
    pub concluded: bool,
    /// One-line task headers
    #[arg(short = 'z', long)]
    pub compact: bool,
    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<String>,
    /// Export format (default: from the file extension, then the config)
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,
}

// ---------------------------------------------------------------------------
// Task data command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct NoteArgs {
    /// Note text (prompted for interactively when missing)
    pub text: Option<String>,
    /// Task to annotate (default: the current task)
    #[arg(short, long, value_name = "SELECTION")]
    pub task: Option<String>,
}

#[derive(Args)]
pub struct SetArgs {
    /// Property name (prompted for interactively when missing)
    pub name: Option<String>,
    /// Property value (prompted for interactively when missing)
    pub value: Option<String>,
    /// Task to set the property on (default: the current task)
    #[arg(short, long, value_name = "SELECTION")]
    pub task: Option<String>,
}

#[derive(Args)]
pub struct MoveArgs {
    /// Task to move, as `[group/[subgroup/]]name`
    pub from: String,
    /// New name for the task
    pub to: String,
    /// Run the fetcher against the moved task
    #[arg(short, long)]
    pub fetch: bool,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task to edit (default: the current task)
    pub selection: Option<String>,
}

#[derive(Args)]
pub struct FetchArgs {
    /// Task to fetch data for (default: the current task)
    pub selection: Option<String>,
}
