//! The operational report for one run: a short summary plus the full
//! transcript.

use std::fmt::Write as _;

use chrono::{SecondsFormat, Utc};
use goslim_core::{PipelineRun, RunStatus};

/// File name of the transcript attachment.
pub const ATTACHMENT_NAME: &str = "goslim-report.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// Short human summary (first message part).
    pub summary: String,
    /// Every log entry in run order (the attachment).
    pub transcript: String,
}

impl Report {
    /// Build the report from the run as it stands.
    #[must_use]
    pub fn from_run(run: &PipelineRun) -> Self {
        Self {
            summary: summarize(run),
            transcript: run.transcript(),
        }
    }
}

fn summarize(run: &PipelineRun) -> String {
    let mut out = String::new();
    let status = run.status();
    let headline = match &status {
        RunStatus::Success => "succeeded".to_string(),
        RunStatus::PartialFailure { failed } => {
            let names: Vec<&str> = failed.iter().map(|a| a.as_str()).collect();
            format!("finished with failed slim categories: {}", names.join(", "))
        }
        RunStatus::Failed { stage, error } => {
            format!("aborted at {stage}: {error}")
        }
    };
    let _ = writeln!(out, "GO annotation refresh {headline}");
    let _ = writeln!(out);

    let end = run.finished_at().unwrap_or_else(Utc::now);
    let _ = writeln!(
        out,
        "Started:   {}",
        run.started_at().to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    let _ = writeln!(
        out,
        "Duration:  {}s",
        (end - run.started_at()).num_seconds().max(0)
    );
    let _ = writeln!(out, "Exit code: {}", status.exit_code());

    if !run.slims().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Slim derivations:");
        for slim in run.slims() {
            let detail = match (&slim.error, slim.records, slim.published) {
                (Some(err), _, _) => format!("failed ({err})"),
                (None, Some(n), true) => format!("published ({n} records)"),
                (None, Some(n), false) => format!("derived, not published ({n} records)"),
                (None, None, _) => "not run".to_string(),
            };
            let _ = writeln!(out, "  {:<10} {detail}", slim.aspect.as_str());
        }
    }

    if !run.publications().is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Published files:");
        for record in run.publications() {
            let detail = match (&record.error, record.backed_up) {
                (Some(err), _) => format!("failed ({err})"),
                (None, true) => "replaced, previous version backed up".to_string(),
                (None, false) => "created, no previous version".to_string(),
            };
            let _ = writeln!(out, "  {} {detail}", record.artifact);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "The full transcript is attached as {ATTACHMENT_NAME}.");
    out
}
