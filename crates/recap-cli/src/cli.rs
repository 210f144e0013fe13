//! CLI command definitions and argument parsing.

use clap::{ArgAction, Parser, Subcommand};
use recap_domain::{ItemCategory, ItemId, ItemStatus, JobId, TranscriptId};
use std::path::PathBuf;

/// Recap - extract decisions, action items and risks from meeting transcripts.
#[derive(Debug, Parser)]
#[command(name = "recap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "RECAP_DB")]
    pub db: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a transcript file as a new transcript version
    Ingest(IngestArgs),

    /// Run an extraction job over a stored transcript
    Extract(ExtractArgs),

    /// Show a job's state
    Status(StatusArgs),

    /// List a job's extracted items
    Items(ItemsArgs),

    /// Correct an extracted item
    Edit(EditArgs),

    /// Show an item's edit history
    History(HistoryArgs),

    /// List the extraction jobs of a transcript
    Jobs(JobsArgs),
}

/// Arguments for the ingest command.
#[derive(Debug, Parser)]
pub struct IngestArgs {
    /// Transcript text file
    pub file: PathBuf,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Transcript version to extract from
    #[arg(short, long)]
    pub transcript: TranscriptId,

    /// File holding the recorded model response
    #[arg(short, long)]
    pub response: PathBuf,

    /// Model identifier ("default" uses the configured default)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Review policy preset, replacing the configured threshold
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,
}

/// Arguments for the status command.
#[derive(Debug, Parser)]
pub struct StatusArgs {
    /// Job ID
    pub job: JobId,
}

/// Arguments for the items command.
#[derive(Debug, Parser)]
pub struct ItemsArgs {
    /// Job ID
    pub job: JobId,

    /// Only items of this category
    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,

    /// Only items flagged for review
    #[arg(long)]
    pub needs_review: bool,
}

/// Arguments for the edit command.
///
/// An empty value for a nullable field clears it.
#[derive(Debug, Parser)]
pub struct EditArgs {
    /// Item ID
    pub item: ItemId,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    /// New details (empty clears)
    #[arg(long)]
    pub details: Option<String>,

    /// New speaker (empty clears)
    #[arg(long)]
    pub speaker: Option<String>,

    /// New start timestamp (empty clears)
    #[arg(long)]
    pub timestamp_start: Option<String>,

    /// New end timestamp (empty clears)
    #[arg(long)]
    pub timestamp_end: Option<String>,

    /// New review state
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// New review flag
    #[arg(long)]
    pub needs_review: Option<bool>,

    /// Clear the review reasons
    #[arg(long)]
    pub clear_reasons: bool,

    /// Full change set as a JSON object (`null` clears a field)
    #[arg(
        long,
        conflicts_with_all = [
            "title", "details", "speaker", "timestamp_start", "timestamp_end",
            "status", "needs_review", "clear_reasons",
        ]
    )]
    pub changes: Option<String>,

    /// Why the edit was made
    #[arg(long)]
    pub reason: Option<String>,

    /// Who made the edit
    #[arg(long, env = "RECAP_EDITOR")]
    pub editor: Option<String>,
}

/// Arguments for the history command.
#[derive(Debug, Parser)]
pub struct HistoryArgs {
    /// Item ID
    pub item: ItemId,
}

/// Arguments for the jobs command.
#[derive(Debug, Parser)]
pub struct JobsArgs {
    /// Transcript ID
    pub transcript: TranscriptId,
}

/// Review policy presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyArg {
    /// Approve only well-attributed items (threshold 0.9)
    Strict,
    /// Approve most items (threshold 0.6)
    Permissive,
}

/// Item category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CategoryArg {
    /// Summary bullets
    Summary,
    /// Decisions
    Decision,
    /// Action items
    ActionItem,
    /// Open questions
    OpenQuestion,
    /// Estimates
    Estimate,
    /// Risks
    Risk,
}

/// Item review state argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatusArg {
    /// Awaiting review
    Pending,
    /// Accepted
    Approved,
    /// Rejected
    Rejected,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<CategoryArg> for ItemCategory {
    fn from(category: CategoryArg) -> Self {
        match category {
            CategoryArg::Summary => ItemCategory::Summary,
            CategoryArg::Decision => ItemCategory::Decision,
            CategoryArg::ActionItem => ItemCategory::ActionItem,
            CategoryArg::OpenQuestion => ItemCategory::OpenQuestion,
            CategoryArg::Estimate => ItemCategory::Estimate,
            CategoryArg::Risk => ItemCategory::Risk,
        }
    }
}

impl From<StatusArg> for ItemStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => ItemStatus::Pending,
            StatusArg::Approved => ItemStatus::Approved,
            StatusArg::Rejected => ItemStatus::Rejected,
        }
    }
}
