//! CLI definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Threads - persistence for conversational and agentic data
#[derive(Parser, Debug)]
#[command(name = "threads", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.threads/data/threads.db)
    #[arg(long, global = true, env = "THREADS_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and apply the schema
    Init {
        /// Recreate an existing database from scratch
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Thread management
    Thread {
        #[command(subcommand)]
        command: ThreadCommands,
    },

    /// Append, list and hide items
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },

    /// Dependency edges between items
    Edge {
        #[command(subcommand)]
        command: EdgeCommands,
    },

    /// Resumable stream lifecycle
    Stream {
        #[command(subcommand)]
        command: StreamCommands,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Thread Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ThreadCommands {
    /// Create a thread
    Create {
        /// Project id (default: THREADS_PROJECT)
        #[arg(short, long)]
        project: Option<String>,

        /// Owner record type, e.g. "ticket"
        #[arg(long, requires = "scope_id")]
        scope_type: Option<String>,

        /// Owner record id
        #[arg(long, requires = "scope_type")]
        scope_id: Option<String>,

        /// Thread title
        #[arg(short, long)]
        title: Option<String>,

        /// Metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Get the thread for a scope, creating it if missing
    Ensure {
        /// Project id (default: THREADS_PROJECT)
        #[arg(short, long)]
        project: Option<String>,

        /// Owner record type
        #[arg(long)]
        scope_type: String,

        /// Owner record id
        #[arg(long)]
        scope_id: String,

        /// Title for a newly created thread (ignored if it exists)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// List threads in a project
    List {
        /// Project id (default: THREADS_PROJECT)
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Show a thread
    Show {
        /// Thread id
        id: String,

        /// Include every item, oldest first
        #[arg(long)]
        items: bool,
    },

    /// Change a thread's title or metadata
    Update {
        /// Thread id
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },

    /// Delete a thread with all of its items, edges and streams
    Delete {
        /// Thread id
        id: String,
    },
}

// ============================================================================
// Item Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum ItemCommands {
    /// Append an item to a thread
    Append {
        /// Thread id
        thread_id: String,

        /// Plain text content
        #[arg(long, conflicts_with = "parts", required_unless_present = "parts")]
        text: Option<String>,

        /// Message parts as a JSON array
        #[arg(long)]
        parts: Option<String>,

        /// Author role (user, assistant, system, tool)
        #[arg(short, long, default_value = "user")]
        role: String,

        /// Agent run id
        #[arg(long)]
        run: Option<String>,

        /// Span id
        #[arg(long)]
        span: Option<String>,

        /// Item this one replies to
        #[arg(long)]
        parent: Option<String>,

        /// Initial visibility (visible, hidden, archived)
        #[arg(long, default_value = "visible")]
        visibility: String,

        /// Idempotency key (default: generated)
        #[arg(long)]
        request_id: Option<String>,

        /// Metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },

    /// List a thread's items in id order
    List {
        /// Thread id
        thread_id: String,

        /// Newest first
        #[arg(long)]
        desc: bool,

        /// Only visible items
        #[arg(long, conflicts_with = "context")]
        visible: bool,

        /// Only items that belong in model context (not archived)
        #[arg(long)]
        context: bool,
    },

    /// Hide an item from the UI (stays in context)
    Hide {
        /// Item id
        id: String,
    },

    /// Archive an item (removed from UI and context)
    Archive {
        /// Item id
        id: String,
    },

    /// Make an item visible again
    Unhide {
        /// Item id
        id: String,
    },

    /// Count a thread's items
    Count {
        /// Thread id
        thread_id: String,
    },
}

// ============================================================================
// Edge Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum EdgeCommands {
    /// Record that TO depends on FROM
    Add {
        /// Thread id
        thread_id: String,

        /// Upstream item id
        from: String,

        /// Downstream item id
        to: String,

        /// Edge type (depends_on, caused_by)
        #[arg(long = "type", default_value = "depends_on")]
        edge_type: String,

        /// Idempotency key (default: generated)
        #[arg(long)]
        request_id: Option<String>,
    },

    /// List a thread's edges
    List {
        /// Thread id
        thread_id: String,
    },

    /// Print a thread's dependency graph
    Dag {
        /// Thread id
        thread_id: String,
    },

    /// Check whether every dependency of an item is complete
    Ready {
        /// Item id
        item_id: String,

        /// Ids of completed items
        #[arg(long, num_args = 0.., value_delimiter = ',')]
        completed: Vec<String>,
    },
}

// ============================================================================
// Stream Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum StreamCommands {
    /// Start an active stream on a thread
    Start {
        /// Thread id
        thread_id: String,

        /// Agent run id
        #[arg(long)]
        run: Option<String>,

        /// Time to live in milliseconds (default: 300000)
        #[arg(long)]
        ttl_ms: Option<i64>,
    },

    /// Show a stream
    Show {
        /// Stream id
        id: String,
    },

    /// Mark a stream completed
    Complete {
        /// Stream id
        id: String,
    },

    /// Mark a stream aborted
    Abort {
        /// Stream id
        id: String,
    },

    /// Set a stream's resume token
    Token {
        /// Stream id
        id: String,

        /// Resume token
        token: String,
    },

    /// Look up a stream by resume token and report whether it can resume
    Resume {
        /// Resume token
        token: String,
    },

    /// Expire active streams past their deadline
    Expire,
}
