use arborapp::attributes::AttrField;
use arborapp::filter::EstimateBucket;
use arborapp::model::{Color, RowKind};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "arbor",
    bin_name = "arbor",
    version,
    disable_help_subcommand = true,
    after_help = "Rows are addressed by path (1, 2.1) or by id prefix (see `arbor show --ids`)."
)]
#[command(about = "Hierarchical outliner for notes, todos and projects", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory holding the outline (overrides ARBOR_DATA)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Core(CoreCommands),

    #[command(flatten)]
    Structure(StructureCommands),

    #[command(flatten)]
    References(ReferenceCommands),

    #[command(flatten)]
    Data(DataCommands),

    #[command(flatten)]
    Misc(MiscCommands),
}

#[derive(Subcommand, Debug)]
pub enum CoreCommands {
    /// Show the outline, optionally filtered or focused on one row
    #[command(alias = "ls", display_order = 1)]
    Show(ShowArgs),

    /// Add a row
    #[command(alias = "a", display_order = 2)]
    Add(AddArgs),

    /// Change one attribute of a row (text, kind, color, estimate, start_date, tags, repeat, link, collapsed)
    #[command(display_order = 3)]
    Set {
        /// Row path or id
        row: String,

        /// Attribute name
        field: AttrField,

        /// New value; empty or `none` clears optional attributes
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Cycle a row through todo, done and note (repeating todos move their date)
    #[command(alias = "done", display_order = 4)]
    Toggle {
        /// Row path or id
        row: String,
    },

    /// Cycle a row through the project kinds
    #[command(display_order = 5)]
    Project {
        /// Row path or id
        row: String,
    },

    /// Show the plan, or put a row on a plan level (1-7, 0 removes it)
    #[command(display_order = 6)]
    Plan(PlanArgs),

    /// Delete rows and everything below them
    #[command(alias = "rm", display_order = 7)]
    Delete {
        /// Row paths or ids
        #[arg(required = true, num_args = 1..)]
        rows: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Show only this row's subtree
    pub row: Option<String>,

    /// Search-bar syntax, e.g. ":work c=r e<20 date<1w"
    #[arg(short, long)]
    pub query: Option<String>,

    /// Only rows carrying this tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Only rows of this color
    #[arg(long)]
    pub color: Option<Color>,

    /// Only rows of this kind
    #[arg(long)]
    pub kind: Option<RowKind>,

    /// Only rows starting on or before this date
    #[arg(long, value_name = "DATE")]
    pub until: Option<NaiveDate>,

    /// Only rows in this estimate bucket (short, medium, long)
    #[arg(long)]
    pub estimate: Option<EstimateBucket>,

    /// Only rows without tags
    #[arg(long)]
    pub hide_tagged: bool,

    /// Hide rows starting after today
    #[arg(long)]
    pub hide_future: bool,

    /// Only rows with a start date
    #[arg(long)]
    pub only_dated: bool,

    /// Expand collapsed rows
    #[arg(long)]
    pub all: bool,

    /// Print row ids
    #[arg(long)]
    pub ids: bool,
}

#[derive(Args, Debug, Default)]
pub struct PlanArgs {
    /// Row path or id (omit to list the plan)
    pub row: Option<String>,

    /// Plan level; 0 takes the row out of the plan
    #[arg(value_parser = clap::value_parser!(u8).range(0..=7))]
    pub level: Option<u8>,

    /// Move the row one place up in the plan
    #[arg(long, conflicts_with_all = ["level", "down"])]
    pub up: bool,

    /// Move the row one place down in the plan
    #[arg(long, conflicts_with = "level")]
    pub down: bool,

    /// Only planned rows matching this search-bar query
    #[arg(short, long)]
    pub query: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Parent row (defaults to the top level)
    #[arg(long, short = 'u', value_name = "ROW")]
    pub under: Option<String>,

    /// 1-based position among the parent's children (defaults to last)
    #[arg(long)]
    pub at: Option<usize>,

    /// Row kind (note, todo, done, sequential, parallel, paused)
    #[arg(long, short = 'k')]
    pub kind: Option<String>,

    #[arg(long, short = 'c')]
    pub color: Option<String>,

    /// Estimate in minutes
    #[arg(long, short = 'e')]
    pub estimate: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long, short = 'd')]
    pub date: Option<String>,

    /// Tags (repeatable)
    #[arg(long = "tag", short = 't')]
    pub tags: Vec<String>,

    /// Repeat rule for todos, e.g. 1w
    #[arg(long)]
    pub repeat: Option<String>,

    /// Row text
    #[arg(required = true, trailing_var_arg = true)]
    pub text: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum StructureCommands {
    /// Move a row (and its subtree) under another row
    #[command(alias = "mv", display_order = 10)]
    Move {
        /// Row path or id
        row: String,

        /// New parent (defaults to the top level)
        #[arg(long, short = 'u', value_name = "ROW")]
        under: Option<String>,

        /// 1-based position among the new siblings (defaults to last)
        #[arg(long)]
        at: Option<usize>,
    },

    /// Move a row up among its siblings
    #[command(display_order = 11)]
    Up {
        row: String,
        #[arg(default_value_t = 1)]
        steps: usize,
    },

    /// Move a row down among its siblings
    #[command(display_order = 12)]
    Down {
        row: String,
        #[arg(default_value_t = 1)]
        steps: usize,
    },

    /// Make a row the last child of its previous sibling
    #[command(display_order = 13)]
    Indent { row: String },

    /// Make a row the next sibling of its parent
    #[command(display_order = 14)]
    Outdent { row: String },
}

#[derive(Subcommand, Debug)]
pub enum ReferenceCommands {
    /// Manage bookmarks
    #[command(alias = "bm", display_order = 20)]
    Bookmark {
        #[command(subcommand)]
        action: Option<ReferenceAction>,
    },

    /// Manage quick links
    #[command(alias = "ql", display_order = 21)]
    Quicklink {
        #[command(subcommand)]
        action: Option<ReferenceAction>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReferenceAction {
    /// List entries (the default)
    #[command(alias = "ls")]
    List,

    /// Add an entry pointing at a row
    Add {
        /// Row path or id
        row: String,
        /// Label (defaults to the row text)
        label: Option<String>,
    },

    /// Rename an entry
    Rename { number: usize, label: String },

    /// Remove an entry
    #[command(alias = "rm")]
    Remove { number: usize },

    /// Move an entry to another place in the list
    #[command(alias = "mv")]
    Move { from: usize, to: usize },

    /// Show the row an entry points at
    Go { number: usize },
}

#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Write the outline as JSON
    #[command(display_order = 30)]
    Export {
        /// Output file (defaults to stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Replace the outline with a JSON document (any supported version)
    #[command(display_order = 31)]
    Import { path: PathBuf },

    /// Write a backup now
    #[command(display_order = 32)]
    Backup,

    /// List every tag in use
    #[command(display_order = 33)]
    Tags,
}

#[derive(Subcommand, Debug)]
pub enum MiscCommands {
    /// Get or set configuration
    #[command(display_order = 40)]
    Config {
        /// Configuration key (e.g., backup_interval_minutes)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}
