//! Pipeline run stages.
//!
//! ```text
//! started → fetching → filtering → deriving → publishing → reporting → finished
//!    │          │           │           │           │
//!    └──────────┴───────────┴───────────┴───────────┴──→ aborted → reporting
//! ```
//!
//! The report is always attempted, so `aborted` only ever leads to `reporting`.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Started,
    Fetching,
    Filtering,
    Deriving,
    Publishing,
    Aborted,
    Reporting,
    Finished,
}

impl Stage {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Started => &[Self::Fetching, Self::Aborted],
            Self::Fetching => &[Self::Filtering, Self::Aborted],
            Self::Filtering => &[Self::Deriving, Self::Aborted],
            Self::Deriving => &[Self::Publishing, Self::Aborted],
            Self::Publishing => &[Self::Reporting, Self::Aborted],
            Self::Aborted => &[Self::Reporting],
            Self::Reporting => &[Self::Finished],
            Self::Finished => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether the pipeline is still doing work in this stage.
    #[must_use]
    pub const fn is_working(self) -> bool {
        matches!(
            self,
            Self::Started | Self::Fetching | Self::Filtering | Self::Deriving | Self::Publishing
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Fetching => "fetching",
            Self::Filtering => "filtering",
            Self::Deriving => "deriving",
            Self::Publishing => "publishing",
            Self::Aborted => "aborted",
            Self::Reporting => "reporting",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
