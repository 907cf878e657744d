//! # goslim-notify
//!
//! Composes the operational report of a refresh run and hands it to the
//! delivery collaborator.
//!
//! The report is rendered as an RFC 2822 multipart message, wrapped in a
//! JSON envelope written next to the run's staging files, and delivered by
//! running the configured command (by default the AWS CLI's
//! `ses send-raw-email`). Delivery failures are returned to the caller,
//! which logs them; they never change the run's outcome.

mod error;
mod message;
mod report;

pub use error::NotifyError;
pub use message::{Headers, Message};
pub use report::{ATTACHMENT_NAME, Report};

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use chrono::Utc;
use goslim_config::NotifyConfig;
use goslim_core::PipelineRun;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

/// File name of the envelope in the staging directory.
pub const ENVELOPE_FILE: &str = "message.json";

/// Builds and sends run reports.
#[derive(Debug, Clone)]
pub struct Notifier {
    config: NotifyConfig,
}

impl Notifier {
    #[must_use]
    pub const fn new(config: NotifyConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Render the report message for `run`.
    #[must_use]
    pub fn compose(&self, run: &PipelineRun) -> Message {
        let headers = Headers {
            from: self.config.sender.clone(),
            to: self.config.recipient.clone(),
            subject: self.config.subject.clone(),
            date: Utc::now(),
        };
        Message::compose(&headers, &Report::from_run(run))
    }

    /// Write the JSON envelope for `message` into `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Io`] when the file cannot be written.
    pub async fn write_envelope(&self, message: &Message, dir: &Path) -> Result<PathBuf, NotifyError> {
        let path = dir.join(ENVELOPE_FILE);
        let envelope = message.to_envelope()?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| NotifyError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        tokio::fs::write(&path, envelope)
            .await
            .map_err(|source| NotifyError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Expand the delivery command template for `envelope`.
    #[must_use]
    pub fn delivery_command(&self, envelope: &Path) -> Vec<String> {
        let envelope = envelope.display().to_string();
        self.config
            .command
            .iter()
            .map(|arg| {
                arg.replace("{envelope}", &envelope)
                    .replace("{region}", &self.config.region)
                    .replace("{sender}", &self.config.sender)
                    .replace("{recipient}", &self.config.recipient)
            })
            .collect()
    }

    /// Run the delivery command for the envelope at `envelope`.
    ///
    /// # Errors
    ///
    /// [`NotifyError::NotConfigured`] when sender, recipient, or command is
    /// missing; otherwise spawn, timeout, or non-zero exit failures.
    pub async fn deliver(&self, envelope: &Path) -> Result<(), NotifyError> {
        if !self.is_configured() {
            return Err(NotifyError::NotConfigured(
                "set notify.sender, notify.recipient and notify.command".to_string(),
            ));
        }
        let command = self.delivery_command(envelope);
        let Some((program, args)) = command.split_first() else {
            return Err(NotifyError::NotConfigured("notify.command is empty".to_string()));
        };
        let secs = self.config.timeout_secs;
        tracing::debug!(%program, ?args, "delivering report");

        let output = timeout(
            Duration::from_secs(secs),
            TokioCommand::new(program)
                .args(args)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| NotifyError::Timeout { secs })?
        .map_err(|source| NotifyError::Spawn {
            program: program.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(NotifyError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        tracing::info!(recipient = %self.config.recipient, "report delivered");
        Ok(())
    }
}
