//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use recap_domain::{
    ExtractedItem, ExtractionJob, ItemEdit, ItemSnapshot, ItemStatus, JobStatus, Transcript,
};
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a stored transcript.
    pub fn format_transcript(&self, transcript: &Transcript) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "id": transcript.id.to_string(),
                "chars": transcript.raw_text.chars().count(),
                "created_at": transcript.created_at,
            }))?),
            OutputFormat::Table => Ok(self.success(&format!(
                "Transcript stored: {} ({} chars)",
                transcript.id,
                transcript.raw_text.chars().count()
            ))),
            OutputFormat::Quiet => Ok(transcript.id.to_string()),
        }
    }

    /// Format a job.
    pub fn format_job(&self, job: &ExtractionJob, item_count: usize) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut value = serde_json::to_value(job)?;
                value["item_count"] = json!(item_count);
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => Ok(self.format_job_table(job, item_count)),
            OutputFormat::Quiet => Ok(job.id.to_string()),
        }
    }

    fn format_job_table(&self, job: &ExtractionJob, item_count: usize) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        builder.push_record(["ID".to_string(), job.id.to_string()]);
        builder.push_record(["Transcript".to_string(), job.transcript_id.to_string()]);
        builder.push_record([
            "Model".to_string(),
            job.model.clone().unwrap_or_else(|| "default".to_string()),
        ]);
        builder.push_record(["Status".to_string(), self.job_status(job.status)]);
        builder.push_record(["Items".to_string(), item_count.to_string()]);
        if job.parse_degraded {
            builder.push_record(["Parse".to_string(), self.colorize("degraded", "yellow")]);
        }
        if let Some(error) = &job.error {
            builder.push_record(["Error".to_string(), self.colorize(error, "red")]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format the jobs of a transcript, newest first.
    pub fn format_jobs(&self, jobs: &[ExtractionJob]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(jobs)?),
            OutputFormat::Table => Ok(self.format_jobs_table(jobs)),
            OutputFormat::Quiet => {
                let ids: Vec<String> = jobs.iter().map(|j| j.id.to_string()).collect();
                Ok(ids.join("\n"))
            }
        }
    }

    fn format_jobs_table(&self, jobs: &[ExtractionJob]) -> String {
        if jobs.is_empty() {
            return self.colorize("No jobs found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Model", "Status", "Created", "Error"]);

        for job in jobs {
            builder.push_record([
                job.id.to_string(),
                job.model.clone().unwrap_or_else(|| "default".to_string()),
                self.job_status(job.status),
                job.created_at.to_string(),
                job.error.clone().unwrap_or_default(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a list of items.
    pub fn format_items(&self, items: &[ExtractedItem]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(items)?),
            OutputFormat::Table => Ok(self.format_items_table(items)),
            OutputFormat::Quiet => {
                let ids: Vec<String> = items.iter().map(|i| i.id.to_string()).collect();
                Ok(ids.join("\n"))
            }
        }
    }

    fn format_items_table(&self, items: &[ExtractedItem]) -> String {
        if items.is_empty() {
            return self.colorize("No items found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record([
            "ID", "Category", "Title", "Speaker", "Start", "Confidence", "Status", "Review",
        ]);

        for item in items {
            let review = match &item.review_reasons {
                Some(reasons) if item.needs_review => reasons.join(", "),
                _ if item.needs_review => "yes".to_string(),
                _ => String::new(),
            };
            builder.push_record([
                short_id(&item.id.to_string()),
                item.category.as_str().to_string(),
                item.title.clone(),
                item.speaker.clone().unwrap_or_default(),
                item.timestamp_start.clone().unwrap_or_default(),
                format!("{:.2}", item.confidence),
                self.item_status(item.status),
                review,
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format an item's edit history, oldest first.
    pub fn format_history(&self, edits: &[ItemEdit]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(edits)?),
            OutputFormat::Table => Ok(self.format_history_table(edits)),
            OutputFormat::Quiet => {
                let ids: Vec<String> = edits.iter().map(|e| e.id.to_string()).collect();
                Ok(ids.join("\n"))
            }
        }
    }

    fn format_history_table(&self, edits: &[ItemEdit]) -> String {
        if edits.is_empty() {
            return self.colorize("No edits recorded.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Editor", "Changed", "Reason", "At"]);

        for edit in edits {
            let changed = changed_fields(&edit.prev, &edit.next);
            builder.push_record([
                short_id(&edit.id.to_string()),
                edit.editor.clone().unwrap_or_default(),
                if changed.is_empty() { "-".to_string() } else { changed.join(", ") },
                edit.reason.clone().unwrap_or_default(),
                edit.created_at.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format an edited item.
    pub fn item_edited(&self, item: &ExtractedItem) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(item)?),
            OutputFormat::Table => Ok(self.success(&format!(
                "Item {} updated ({})",
                item.id,
                item.status.as_str()
            ))),
            OutputFormat::Quiet => Ok(item.id.to_string()),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn job_status(&self, status: JobStatus) -> String {
        let color = match status {
            JobStatus::Processing => "blue",
            JobStatus::Ready => "green",
            JobStatus::Failed => "red",
        };
        self.colorize(status.as_str(), color)
    }

    fn item_status(&self, status: ItemStatus) -> String {
        let color = match status {
            ItemStatus::Pending => "yellow",
            ItemStatus::Approved => "green",
            ItemStatus::Rejected => "red",
        };
        self.colorize(status.as_str(), color)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

/// Names of the fields that differ between two snapshots.
pub fn changed_fields(prev: &ItemSnapshot, next: &ItemSnapshot) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if prev.title != next.title {
        changed.push("title");
    }
    if prev.details != next.details {
        changed.push("details");
    }
    if prev.speaker != next.speaker {
        changed.push("speaker");
    }
    if prev.timestamp_start != next.timestamp_start {
        changed.push("timestamp_start");
    }
    if prev.timestamp_end != next.timestamp_end {
        changed.push("timestamp_end");
    }
    if prev.status != next.status {
        changed.push("status");
    }
    if prev.needs_review != next.needs_review {
        changed.push("needs_review");
    }
    if prev.review_reasons != next.review_reasons {
        changed.push("review_reasons");
    }
    changed
}
