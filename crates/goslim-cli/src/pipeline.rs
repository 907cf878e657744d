//! Refresh pipeline: lock → fetch → filter → derive → publish → report.
//!
//! Orchestrates one run of the mirror refresh:
//! 1. Take the lock on the published directory (`write_lock`)
//! 2. Fetch the ontology and the annotation set into staging (`goslim-fetch`)
//! 3. Write the published annotation set and the mapper input (`goslim_derive::EvidenceFilter`)
//! 4. Run the mapping tool once per slim aspect, concurrently (`goslim_derive::SlimDeriver`)
//! 5. Rotate backups and replace published files atomically (`goslim-store`)
//! 6. Compose the report and hand it to delivery (`goslim-notify`)
//!
//! Steps 1 to 3 and the ontology/annotation half of step 5 abort the run on
//! failure. A failed slim only marks its own category. SIGINT and SIGTERM
//! abort whatever stage is running; during publishing they take effect
//! between artifacts. The report is attempted for every run.

use std::time::Duration;

use anyhow::Context;
use goslim_config::GoslimConfig;
use goslim_core::{
    ArtifactPaths, EntryStatus, NotificationStatus, PipelineRun, PublishRecord, RunStatus,
    RunSummary, SlimOutcome, Stage, StageError,
};
use goslim_derive::{EvidenceFilter, MapperCommand, SlimDeriver};
use goslim_fetch::{Fetcher, RetryConfig};
use goslim_notify::{Notifier, NotifyError};
use goslim_store::artifact_name;

use crate::context::RunLayout;
use crate::progress::Progress;
use crate::shutdown::Shutdown;
use crate::write_lock::{self, WriteLockGuard};

#[derive(Debug, Clone, Copy, Default)]
pub struct RefreshOptions {
    /// Write the report envelope but skip delivery.
    pub no_notify: bool,
}

/// One configured refresh, ready to run.
pub struct RefreshPipeline {
    config: GoslimConfig,
    fetcher: Fetcher,
    filter: EvidenceFilter,
    deriver: SlimDeriver,
    notifier: Notifier,
    options: RefreshOptions,
}

impl RefreshPipeline {
    /// Build every collaborator from `config`.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built.
    pub fn new(config: GoslimConfig, options: RefreshOptions) -> anyhow::Result<Self> {
        let retry = RetryConfig {
            max_attempts: config.fetch.max_attempts,
            base_delay: Duration::from_millis(config.fetch.base_delay_ms),
            max_delay: Duration::from_millis(config.fetch.max_delay_ms),
        };
        let fetcher = Fetcher::new(
            &config.fetch.user_agent,
            Duration::from_secs(config.fetch.timeout_secs),
            retry,
        )
        .context("failed to build HTTP client")?;

        let filter = EvidenceFilter {
            excluded_id_prefixes: config.filter.excluded_id_prefixes.clone(),
            excluded_evidence_codes: config.filter.excluded_evidence_codes.clone(),
            id_field: config.filter.id_field,
            evidence_field: config.filter.evidence_field,
        };
        let deriver = SlimDeriver::new(MapperCommand {
            program: config.mapper.program.clone(),
            args: config.mapper.args.clone(),
            timeout: Duration::from_secs(config.mapper.timeout_secs),
        });
        let notifier = Notifier::new(config.notify.clone());

        Ok(Self {
            config,
            fetcher,
            filter,
            deriver,
            notifier,
            options,
        })
    }

    /// Execute one run end to end and summarize it.
    ///
    /// Never fails: every error becomes part of the run's log and status.
    pub async fn run(&self) -> RunSummary {
        let mut run = PipelineRun::start();
        let layout = RunLayout::new(&self.config, run.started_at());
        let progress = Progress::spinner("starting refresh");
        tracing::info!(staging = %layout.staging_dir.display(), "refresh started");
        run.ok(format!("staging directory {}", layout.staging_dir.display()));

        let shutdown = Shutdown::listen();
        let prepared = tokio::select! {
            result = self.prepare(&layout, &mut run, &progress) => result,
            () = shutdown.requested() => Err(StageError::cancelled()),
        };
        // Publishing is not raced: the lock is held until the last
        // replacement has returned.
        let outcome = match prepared {
            Ok(lock) => {
                enter(&mut run, Stage::Publishing);
                progress.set_message("publishing");
                let published = publish(&layout, &mut run, &shutdown).await;
                drop(lock);
                published
            }
            Err(error) => Err(error),
        };
        if let Err(error) = outcome {
            tracing::error!(stage = %run.stage(), %error, "refresh aborted");
            run.abort(error);
        }

        enter(&mut run, Stage::Reporting);
        progress.set_message("sending report");
        let notification = self.report(&layout, &mut run).await;
        enter(&mut run, Stage::Finished);

        self.clean_staging(&layout, &run).await;

        let status = run.status();
        match &status {
            RunStatus::Success => progress.finish_ok("refresh succeeded"),
            RunStatus::PartialFailure { .. } => progress.finish_err("refresh finished with failed slims"),
            RunStatus::Failed { stage, .. } => progress.finish_err(&format!("refresh aborted at {stage}")),
        }
        tracing::info!(status = status.as_str(), exit_code = status.exit_code(), "refresh finished");
        RunSummary::from_run(&run, notification)
    }

    /// Lock, fetch, filter and derive. Returns the held lock, or the error
    /// that aborts the run.
    async fn prepare(
        &self,
        layout: &RunLayout,
        run: &mut PipelineRun,
        progress: &Progress,
    ) -> Result<WriteLockGuard, StageError> {
        progress.set_message("waiting for lock");
        let lock_wait = Duration::from_secs(self.config.paths.lock_wait_secs);
        let lock = write_lock::acquire_for_dir(&layout.published_dir, lock_wait)
            .await
            .map_err(|e| StageError::filesystem(format!("{e:#}")))?;
        run.ok(format!("acquired lock {}", lock.path().display()));

        enter(run, Stage::Fetching);
        progress.set_message("fetching upstream files");
        self.fetch(layout, run).await?;

        enter(run, Stage::Filtering);
        progress.set_message("filtering annotations");
        self.filter(layout, run).await?;

        enter(run, Stage::Deriving);
        progress.set_message("deriving slim subsets");
        self.derive(layout, run).await;

        Ok(lock)
    }

    async fn fetch(&self, layout: &RunLayout, run: &mut PipelineRun) -> Result<(), StageError> {
        for (url, dest) in [
            (&layout.ontology.source_url, &layout.ontology.paths.staging),
            (&layout.annotation.source_url, &layout.annotation.fetched),
        ] {
            let fetched = self
                .fetcher
                .fetch(url, dest)
                .await
                .map_err(|e| StageError::from(&e))?;
            let status = if fetched.attempts > 1 {
                EntryStatus::Warn
            } else {
                EntryStatus::Ok
            };
            run.record(
                status,
                format!(
                    "fetched {} ({} bytes{}, {} attempt(s))",
                    fetched.url,
                    fetched.bytes,
                    if fetched.decompressed { ", decompressed" } else { "" },
                    fetched.attempts
                ),
            );
        }
        Ok(())
    }

    async fn filter(&self, layout: &RunLayout, run: &mut PipelineRun) -> Result<(), StageError> {
        let annotation = &layout.annotation;
        let stats = self
            .filter
            .filter(
                &annotation.fetched,
                &annotation.paths.staging,
                &annotation.mapper_input,
            )
            .await
            .map_err(|e| StageError::from(&e))?;
        run.ok(format!(
            "{} annotation records: {} published ({} complex-derived removed), {} kept for mapping ({} removed by evidence code)",
            stats.records_in,
            stats.published,
            stats.excluded_complex,
            stats.mapper_input,
            stats.excluded_evidence
        ));
        Ok(())
    }

    /// Failures here are per category and never abort the run.
    async fn derive(&self, layout: &RunLayout, run: &mut PipelineRun) {
        let results = self
            .deriver
            .derive_all(
                &layout.slims,
                &layout.ontology.paths.staging,
                &layout.annotation.mapper_input,
            )
            .await;

        for result in results {
            let aspect = result.aspect;
            if !result.stderr.is_empty() {
                let status = if result.result.is_ok() {
                    EntryStatus::Ok
                } else {
                    EntryStatus::Warn
                };
                run.record(status, format!("mapper stderr for {aspect}:\n{}", result.stderr));
            }
            match result.result {
                Ok(derivation) => {
                    run.ok(format!("derived {aspect} slim: {} records", derivation.records));
                    run.set_slim_outcome(SlimOutcome::derived(aspect, derivation.records));
                }
                Err(err) => {
                    let error = StageError::from(&err);
                    tracing::warn!(%aspect, %error, "slim derivation failed");
                    run.fail(&error);
                    run.set_slim_outcome(SlimOutcome::failed(aspect, error));
                }
            }
        }
    }

    async fn report(&self, layout: &RunLayout, run: &mut PipelineRun) -> NotificationStatus {
        let message = self.notifier.compose(run);
        let envelope = match self
            .notifier
            .write_envelope(&message, &layout.staging_dir)
            .await
        {
            Ok(path) => path,
            Err(err) => return undelivered(run, &err),
        };
        run.ok(format!("report envelope written to {}", envelope.display()));

        if self.options.no_notify {
            run.ok("report delivery skipped (--no-notify)");
            return NotificationStatus::Skipped {
                reason: "--no-notify".to_string(),
            };
        }

        match self.notifier.deliver(&envelope).await {
            Ok(()) => {
                run.ok(format!("report sent to {}", self.config.notify.recipient));
                NotificationStatus::Sent
            }
            Err(err) => undelivered(run, &err),
        }
    }

    /// Staging survives anything short of full success, for inspection.
    async fn clean_staging(&self, layout: &RunLayout, run: &PipelineRun) {
        if self.config.paths.keep_staging || run.status() != RunStatus::Success {
            tracing::info!(dir = %layout.staging_dir.display(), "staging directory kept");
            return;
        }
        if let Err(err) = tokio::fs::remove_dir_all(&layout.staging_dir).await {
            tracing::warn!(dir = %layout.staging_dir.display(), %err, "failed to remove staging directory");
        }
    }
}

/// Ontology and annotation first (fatal), then every derived slim.
///
/// A shutdown request stops the stage before the next artifact.
async fn publish(
    layout: &RunLayout,
    run: &mut PipelineRun,
    shutdown: &Shutdown,
) -> Result<(), StageError> {
    for paths in [&layout.ontology.paths, &layout.annotation.paths] {
        ensure_running(shutdown)?;
        replace(run, paths).await.inspect_err(|error| {
            tracing::error!(artifact = %artifact_name(&paths.published), %error, "publish failed");
        })?;
    }

    for slim in &layout.slims {
        let aspect = slim.aspect();
        let derived = run
            .slims()
            .iter()
            .any(|s| s.aspect == aspect && s.records.is_some() && s.error.is_none());
        if !derived {
            continue;
        }
        ensure_running(shutdown)?;
        let result = replace(run, &slim.paths).await;
        if let Err(error) = &result {
            run.fail(error);
        }
        if let Some(outcome) = run.slim_outcome_mut(aspect) {
            match result {
                Ok(()) => outcome.published = true,
                Err(error) => outcome.error = Some(error),
            }
        }
    }
    Ok(())
}

fn ensure_running(shutdown: &Shutdown) -> Result<(), StageError> {
    if shutdown.is_requested() {
        return Err(StageError::cancelled());
    }
    Ok(())
}

/// Rotate and replace one artifact, recording the publication.
async fn replace(run: &mut PipelineRun, paths: &ArtifactPaths) -> Result<(), StageError> {
    let artifact = artifact_name(&paths.published);
    match goslim_store::replace(paths).await {
        Ok(replacement) => {
            let backed_up = replacement.rotation.backed_up();
            if backed_up {
                run.ok(format!(
                    "published {artifact} ({} bytes), previous version kept as {}",
                    replacement.bytes,
                    artifact_name(&paths.backup)
                ));
            } else {
                run.ok(format!(
                    "published {artifact} ({} bytes), no previous version",
                    replacement.bytes
                ));
            }
            run.record_publication(PublishRecord {
                artifact,
                backed_up,
                published: true,
                error: None,
            });
            Ok(())
        }
        Err(err) => {
            let error = StageError::from(&err);
            run.record_publication(PublishRecord {
                artifact,
                backed_up: false,
                published: false,
                error: Some(error.clone()),
            });
            Err(error)
        }
    }
}

/// Delivery failed or is not configured: keep the transcript on stderr.
fn undelivered(run: &mut PipelineRun, err: &NotifyError) -> NotificationStatus {
    let error = StageError::from(err);
    if matches!(err, NotifyError::NotConfigured(_)) {
        tracing::warn!(%error, "report not delivered");
    } else {
        tracing::error!(%error, "report delivery failed");
    }
    run.fail(&error);
    eprint!("{}", run.transcript());
    NotificationStatus::Failed { error }
}

/// Stage order is fixed by the pipeline, so a rejected transition is a bug.
fn enter(run: &mut PipelineRun, stage: Stage) {
    if let Err(err) = run.advance(stage) {
        tracing::error!(%err, "pipeline stage order violated");
    }
}

#[cfg(test)]
mod tests {
    use goslim_core::ErrorKind;
    use pretty_assertions::assert_eq;

    use super::*;

    fn layout(root: &std::path::Path) -> RunLayout {
        let mut config = GoslimConfig::default();
        config.paths.published_dir = root.join("published");
        config.paths.staging_dir = root.join("staging");
        let layout = RunLayout::new(&config, chrono::Utc::now());
        std::fs::create_dir_all(&layout.published_dir).unwrap();
        std::fs::create_dir_all(&layout.staging_dir).unwrap();
        for paths in [&layout.ontology.paths, &layout.annotation.paths] {
            std::fs::write(&paths.staging, b"new\n").unwrap();
            std::fs::write(&paths.published, b"old\n").unwrap();
        }
        layout
    }

    #[tokio::test]
    async fn shutdown_stops_publishing_before_the_next_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        let mut run = PipelineRun::start();

        let err = publish(&layout, &mut run, &Shutdown::fixed(true))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Cancelled);
        assert!(run.publications().is_empty());
        for paths in [&layout.ontology.paths, &layout.annotation.paths] {
            assert_eq!(std::fs::read(&paths.published).unwrap(), b"old\n");
        }
    }

    #[tokio::test]
    async fn publishing_without_shutdown_replaces_core_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = layout(dir.path());
        let mut run = PipelineRun::start();

        publish(&layout, &mut run, &Shutdown::fixed(false))
            .await
            .unwrap();

        assert_eq!(run.publications().len(), 2);
        for paths in [&layout.ontology.paths, &layout.annotation.paths] {
            assert_eq!(std::fs::read(&paths.published).unwrap(), b"new\n");
            assert_eq!(std::fs::read(&paths.backup).unwrap(), b"old\n");
        }
    }
}
