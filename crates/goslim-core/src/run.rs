//! A single refresh run: its stage, its ordered log, and its outcome.
//!
//! Stages record what happened through [`PipelineRun::record`] and friends
//! instead of an exit-status side channel. The transcript rendered from the
//! log is the single source of truth for the report.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::errors::{CoreError, ErrorKind, StageError};
use crate::slim::SlimAspect;
use crate::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Ok,
    Warn,
    Failed,
}

impl EntryStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Warn => "warn",
            Self::Failed => "failed",
        }
    }
}

/// One line of the run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub stage: Stage,
    pub status: EntryStatus,
    pub message: String,
}

impl LogEntry {
    /// `<time> [<stage>] <status>: <message>`, one physical line per message line.
    #[must_use]
    pub fn render(&self) -> String {
        let prefix = format!(
            "{} [{}] {}: ",
            self.at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.stage,
            self.status.as_str()
        );
        let mut out = String::new();
        for (i, line) in self.message.lines().enumerate() {
            if i == 0 {
                out.push_str(&prefix);
            } else {
                out.push_str("    ");
            }
            out.push_str(line);
            out.push('\n');
        }
        if out.is_empty() {
            out.push_str(prefix.trim_end());
            out.push('\n');
        }
        out
    }
}

/// Outcome of one slim category, from derivation through publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlimOutcome {
    pub aspect: SlimAspect,
    /// Data lines produced by the mapper, when derivation succeeded.
    pub records: Option<usize>,
    pub published: bool,
    pub error: Option<StageError>,
}

impl SlimOutcome {
    #[must_use]
    pub const fn derived(aspect: SlimAspect, records: usize) -> Self {
        Self {
            aspect,
            records: Some(records),
            published: false,
            error: None,
        }
    }

    #[must_use]
    pub const fn failed(aspect: SlimAspect, error: StageError) -> Self {
        Self {
            aspect,
            records: None,
            published: false,
            error: Some(error),
        }
    }

    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.error.is_none() && self.published
    }
}

/// Result of rotating and replacing one published file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishRecord {
    /// File name under the published directory.
    pub artifact: String,
    /// Whether a previous version was copied to the backup slot.
    pub backed_up: bool,
    pub published: bool,
    pub error: Option<StageError>,
}

/// Terminal status of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    /// Every fatal stage succeeded but at least one slim category failed.
    PartialFailure { failed: Vec<SlimAspect> },
    Failed { stage: Stage, error: StageError },
}

impl RunStatus {
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Success | Self::PartialFailure { .. } => 0,
            Self::Failed { error, .. } => error.kind.exit_code(),
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::PartialFailure { .. } => "partial_failure",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One execution of the refresh pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    stage: Stage,
    aborted: Option<(Stage, StageError)>,
    entries: Vec<LogEntry>,
    slims: Vec<SlimOutcome>,
    publications: Vec<PublishRecord>,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::start()
    }
}

impl PipelineRun {
    #[must_use]
    pub fn start() -> Self {
        let mut run = Self {
            started_at: Utc::now(),
            finished_at: None,
            stage: Stage::Started,
            aborted: None,
            entries: Vec::new(),
            slims: Vec::new(),
            publications: Vec::new(),
        };
        run.ok("refresh run started");
        run
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn slims(&self) -> &[SlimOutcome] {
        &self.slims
    }

    #[must_use]
    pub fn publications(&self) -> &[PublishRecord] {
        &self.publications
    }

    #[must_use]
    pub fn aborted(&self) -> Option<&(Stage, StageError)> {
        self.aborted.as_ref()
    }

    /// Move to `next`, logging the transition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] when the state machine forbids it.
    pub fn advance(&mut self, next: Stage) -> Result<(), CoreError> {
        if !self.stage.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.stage,
                to: next,
            });
        }
        self.stage = next;
        if next == Stage::Finished {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Append a log entry for the current stage.
    pub fn record(&mut self, status: EntryStatus, message: impl Into<String>) {
        self.entries.push(LogEntry {
            at: Utc::now(),
            stage: self.stage,
            status,
            message: message.into(),
        });
    }

    pub fn ok(&mut self, message: impl Into<String>) {
        self.record(EntryStatus::Ok, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(EntryStatus::Warn, message);
    }

    pub fn fail(&mut self, error: &StageError) {
        self.record(EntryStatus::Failed, error.to_string());
    }

    /// Abort the run at its current stage.
    ///
    /// Aborting twice, or after work has stopped, only logs the error.
    pub fn abort(&mut self, error: StageError) {
        self.fail(&error);
        if !self.stage.is_working() {
            return;
        }
        let at = self.stage;
        self.stage = Stage::Aborted;
        self.aborted = Some((at, error));
    }

    /// Store a slim outcome, keeping the list sorted by category name.
    pub fn set_slim_outcome(&mut self, outcome: SlimOutcome) {
        match self.slims.iter_mut().find(|s| s.aspect == outcome.aspect) {
            Some(existing) => *existing = outcome,
            None => {
                self.slims.push(outcome);
                self.slims.sort_by_key(|s| s.aspect);
            }
        }
    }

    pub fn record_publication(&mut self, record: PublishRecord) {
        self.publications.push(record);
    }

    pub fn slim_outcome_mut(&mut self, aspect: SlimAspect) -> Option<&mut SlimOutcome> {
        self.slims.iter_mut().find(|s| s.aspect == aspect)
    }

    #[must_use]
    pub fn status(&self) -> RunStatus {
        if let Some((stage, error)) = &self.aborted {
            return RunStatus::Failed {
                stage: *stage,
                error: error.clone(),
            };
        }
        let failed: Vec<SlimAspect> = self
            .slims
            .iter()
            .filter(|s| !s.succeeded())
            .map(|s| s.aspect)
            .collect();
        if failed.is_empty() {
            RunStatus::Success
        } else {
            RunStatus::PartialFailure { failed }
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.status().exit_code()
    }

    /// Whether the run was aborted with `kind`.
    #[must_use]
    pub fn aborted_with(&self, kind: ErrorKind) -> bool {
        self.aborted.as_ref().is_some_and(|(_, e)| e.kind == kind)
    }

    /// The plain-text transcript of every log entry in run order.
    #[must_use]
    pub fn transcript(&self) -> String {
        self.entries.iter().map(LogEntry::render).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn through(run: &mut PipelineRun, stages: &[Stage]) {
        for stage in stages {
            run.advance(*stage).expect("transition should be allowed");
        }
    }

    #[test]
    fn success_path_reaches_finished() {
        let mut run = PipelineRun::start();
        through(
            &mut run,
            &[
                Stage::Fetching,
                Stage::Filtering,
                Stage::Deriving,
                Stage::Publishing,
                Stage::Reporting,
                Stage::Finished,
            ],
        );
        assert_eq!(run.status(), RunStatus::Success);
        assert!(run.finished_at().is_some());
        assert_eq!(run.exit_code(), 0);
    }

    #[test]
    fn invalid_transition_is_rejected() {
        let mut run = PipelineRun::start();
        let err = run.advance(Stage::Publishing).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition {
                from: Stage::Started,
                to: Stage::Publishing
            }
        ));
        assert_eq!(run.stage(), Stage::Started);
    }

    #[test]
    fn abort_remembers_stage_and_leads_to_reporting() {
        let mut run = PipelineRun::start();
        through(&mut run, &[Stage::Fetching]);
        run.abort(StageError::new(ErrorKind::Fetch, "HTTP 404 for go.obo"));
        assert_eq!(run.stage(), Stage::Aborted);
        assert!(run.aborted_with(ErrorKind::Fetch));
        through(&mut run, &[Stage::Reporting, Stage::Finished]);

        match run.status() {
            RunStatus::Failed { stage, error } => {
                assert_eq!(stage, Stage::Fetching);
                assert_eq!(error.kind, ErrorKind::Fetch);
            }
            other => panic!("unexpected status {other:?}"),
        }
        assert_eq!(run.exit_code(), 10);
        assert!(run.transcript().contains("HTTP 404 for go.obo"));
    }

    #[test]
    fn second_abort_keeps_first_cause() {
        let mut run = PipelineRun::start();
        through(&mut run, &[Stage::Fetching]);
        run.abort(StageError::new(ErrorKind::Fetch, "first"));
        run.abort(StageError::cancelled());
        assert!(run.aborted_with(ErrorKind::Fetch));
    }

    #[test]
    fn failed_slim_is_partial_failure_with_zero_exit() {
        let mut run = PipelineRun::start();
        let mut component = SlimOutcome::derived(SlimAspect::Component, 4);
        component.published = true;
        let mut function = SlimOutcome::derived(SlimAspect::Function, 2);
        function.published = true;
        run.set_slim_outcome(SlimOutcome::failed(
            SlimAspect::Process,
            StageError::new(ErrorKind::ExternalTool, "exit 1"),
        ));
        run.set_slim_outcome(function);
        run.set_slim_outcome(component);

        let order: Vec<SlimAspect> = run.slims().iter().map(|s| s.aspect).collect();
        assert_eq!(
            order,
            vec![SlimAspect::Component, SlimAspect::Function, SlimAspect::Process]
        );
        assert_eq!(
            run.status(),
            RunStatus::PartialFailure {
                failed: vec![SlimAspect::Process]
            }
        );
        assert_eq!(run.exit_code(), 0);
    }

    #[test]
    fn transcript_indents_continuation_lines() {
        let mut run = PipelineRun::start();
        run.warn("mapper stderr:\nline one\nline two");
        let transcript = run.transcript();
        assert!(transcript.contains("[started] warn: mapper stderr:\n    line one\n    line two\n"));
        assert_eq!(transcript.lines().count(), 4);
    }
}
