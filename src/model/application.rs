use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, OffsetDateTime};

use super::{Priority, Status, wire_date};

/// Server-assigned record identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(String);

impl ApplicationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ApplicationId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Canonical application record as returned by the service.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(rename = "_id", alias = "id")]
    pub id: ApplicationId,
    pub company_name: String,
    pub role: String,
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(with = "wire_date::required")]
    pub applied_date: Date,
    #[serde(
        default,
        with = "wire_date::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub interview_date: Option<Date>,
    #[serde(
        default,
        with = "wire_date::optional",
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_up_date: Option<Date>,
    #[serde(
        default,
        deserialize_with = "non_empty_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub job_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "non_empty_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
    /// Appended by the service on status transitions; never edited locally.
    #[serde(default)]
    pub status_history: Vec<StatusChange>,
}

/// One entry of the server-maintained status audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: Status,
    #[serde(alias = "date", with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(
        default,
        deserialize_with = "non_empty_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub note: Option<String>,
}

fn non_empty_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|text| !text.trim().is_empty()))
}
