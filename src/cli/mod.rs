use clap::{ Parser, Subcommand };
use std::path::PathBuf;
use crate::models::admin::UnknownFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Backend Args ---
    /// Base URL of the FAQ backend API (e.g., http://localhost:5000/api)
    #[arg(long, env = "API_URL", default_value = "http://localhost:5000/api")]
    pub api_url: String,

    /// Timeout in seconds for every backend request.
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    // --- Local State Args ---
    /// Local state store type (file, memory)
    #[arg(long, env = "STORAGE_TYPE", default_value = "file")]
    pub storage_type: String,

    /// Directory holding the local state file. Defaults to the platform data directory.
    #[arg(long, env = "DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Maximum size in bytes of the local state. Unlimited when unset.
    #[arg(long, env = "STORAGE_QUOTA_BYTES")]
    pub storage_quota_bytes: Option<usize>,

    /// Number of most recent messages kept in the persisted history.
    #[arg(long, env = "HISTORY_CAP", default_value = "100")]
    pub history_cap: usize,

    // --- Presentation Args ---
    /// Distance from the bottom, in lines, that still counts as following the conversation.
    #[arg(long, env = "SCROLL_THRESHOLD", default_value = "50")]
    pub scroll_threshold: u32,

    /// Command that receives copied text on stdin (e.g., "xclip -selection clipboard").
    #[arg(long, env = "CLIPBOARD_CMD")]
    pub clipboard_cmd: Option<String>,

    /// Command that reads its final argument aloud (e.g., "espeak").
    #[arg(long, env = "SPEECH_CMD")]
    pub speech_cmd: Option<String>,

    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Args {
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("faqdesk"))
            .unwrap_or_else(|| PathBuf::from(".faqdesk"))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Interactive chat session (default).
    Chat,
    /// Ask a single question and print the answer.
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Show the suggested starter questions.
    Suggestions,
    /// Check that the backend is reachable.
    Health,
    /// Inspect or manage the persisted chat history.
    History {
        #[command(subcommand)]
        action: HistoryCommand,
    },
    /// Show the local session identity.
    Session,
    /// FAQ administration.
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum HistoryCommand {
    Show,
    Stats,
    /// Write the transcript as an HTML fragment.
    Export {
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Clear {
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum AdminCommand {
    Login {
        #[arg(short, long, env = "ADMIN_USERNAME")]
        username: String,
        #[arg(short, long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Check that the cached token is still accepted.
    Verify,
    /// Overview: counters, recent unanswered questions and charts.
    Stats,
    Analytics {
        #[arg(long, default_value = "7")]
        days: u32,
    },
    Settings,
    Unknown {
        #[command(subcommand)]
        action: UnknownCommand,
    },
    Faqs {
        #[command(subcommand)]
        action: FaqCommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum UnknownCommand {
    List {
        #[arg(long, value_enum, default_value_t = UnknownFilter::Unanswered)]
        filter: UnknownFilter,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    Show {
        id: i64,
    },
    /// Answer an unknown question, turning it into a FAQ.
    Answer {
        id: i64,
        #[arg(short, long)]
        answer: String,
        #[arg(short, long)]
        category: String,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum FaqCommand {
    List {
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "20")]
        limit: u32,
        #[arg(short, long)]
        search: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
    },
    Show {
        id: i64,
    },
    Add {
        #[arg(short, long)]
        question: String,
        #[arg(short, long)]
        answer: String,
        #[arg(short, long)]
        category: String,
    },
    Update {
        id: i64,
        #[arg(short, long)]
        question: String,
        #[arg(short, long)]
        answer: String,
        #[arg(short, long)]
        category: String,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}
