//! Application records and the payloads exchanged with the tracker service.

mod application;
mod draft;
mod stats;
pub mod wire_date;

pub use application::{Application, ApplicationId, StatusChange};
pub use draft::{ApplicationDraft, ApplicationUpdate, DraftError};
pub use stats::StatsSummary;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Pipeline stage of an application.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Applied,
    Interview,
    Rejected,
    Offer,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Applied,
        Status::Interview,
        Status::Rejected,
        Status::Offer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "Applied",
            Self::Interview => "Interview",
            Self::Rejected => "Rejected",
            Self::Offer => "Offer",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown application status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == raw.trim())
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

/// Which slice of the application list the store holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    /// Every selectable filter, in menu order.
    pub const OPTIONS: [StatusFilter; 5] = [
        StatusFilter::All,
        StatusFilter::Only(Status::Applied),
        StatusFilter::Only(Status::Interview),
        StatusFilter::Only(Status::Rejected),
        StatusFilter::Only(Status::Offer),
    ];

    /// Parse a filter label; blank and `"All"` both mean no filter.
    pub fn parse(raw: &str) -> Result<Self, UnknownStatus> {
        match raw.trim() {
            "" | "All" => Ok(Self::All),
            other => other.parse().map(Self::Only),
        }
    }

    /// Value for the `status` query parameter, if any.
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Only(status) => Some(status.as_str()),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(status) => status.as_str(),
        }
    }
}

impl From<Status> for StatusFilter {
    fn from(status: Status) -> Self {
        Self::Only(status)
    }
}
