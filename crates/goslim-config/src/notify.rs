//! Report delivery settings.
//!
//! Sender, recipient, and region normally come from the environment
//! (`GOSLIM_NOTIFY__SENDER`, `GOSLIM_NOTIFY__RECIPIENT`, `GOSLIM_NOTIFY__REGION`).

use serde::{Deserialize, Serialize};

fn default_subject() -> String {
    String::from("GO annotation refresh report")
}

fn default_region() -> String {
    String::from("us-west-2")
}

fn default_command() -> Vec<String> {
    [
        "aws",
        "ses",
        "send-raw-email",
        "--region",
        "{region}",
        "--cli-binary-format",
        "raw-in-base64-out",
        "--raw-message",
        "file://{envelope}",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

const fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub sender: String,

    #[serde(default)]
    pub recipient: String,

    /// Region of the delivery service.
    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_subject")]
    pub subject: String,

    /// Delivery command. `{region}`, `{sender}`, `{recipient}` and
    /// `{envelope}` (the JSON envelope path) are substituted.
    #[serde(default = "default_command")]
    pub command: Vec<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            sender: String::new(),
            recipient: String::new(),
            region: default_region(),
            subject: default_subject(),
            command: default_command(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl NotifyConfig {
    /// Check if the notify config has the minimum required fields.
    pub fn is_configured(&self) -> bool {
        !self.sender.is_empty() && !self.recipient.is_empty() && !self.command.is_empty()
    }
}
