//! Response types printed as JSON by `goslim-refresh`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::StageError;
use crate::run::{PipelineRun, PublishRecord, RunStatus, SlimOutcome};

/// Delivery outcome of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Skipped { reason: String },
    Failed { error: StageError },
}

/// Summary of a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    #[serde(flatten)]
    pub status: RunStatus,
    pub exit_code: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: i64,
    pub slims: Vec<SlimOutcome>,
    pub publications: Vec<PublishRecord>,
    pub notification: NotificationStatus,
}

impl RunSummary {
    #[must_use]
    pub fn from_run(run: &PipelineRun, notification: NotificationStatus) -> Self {
        let finished_at = run.finished_at();
        let end = finished_at.unwrap_or_else(Utc::now);
        Self {
            status: run.status(),
            exit_code: run.exit_code(),
            started_at: run.started_at(),
            finished_at,
            duration_ms: (end - run.started_at()).num_milliseconds(),
            slims: run.slims().to_vec(),
            publications: run.publications().to_vec(),
            notification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::stage::Stage;

    #[test]
    fn failed_summary_serializes_stage_and_error() {
        let mut run = PipelineRun::start();
        run.advance(Stage::Fetching).unwrap();
        run.abort(StageError::new(ErrorKind::Fetch, "HTTP 500"));
        let summary = RunSummary::from_run(
            &run,
            NotificationStatus::Skipped {
                reason: "--no-notify".to_string(),
            },
        );
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["stage"], "fetching");
        assert_eq!(value["error"]["kind"], "fetch");
        assert_eq!(value["exit_code"], 10);
        assert_eq!(value["notification"]["status"], "skipped");
    }
}
