use serde::{Serialize, Serializer};
use thiserror::Error;
use time::Date;
use url::Url;

use super::{Application, Priority, Status, wire_date};

/// Why a draft was refused before any request was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("Company name is required")]
    MissingCompany,
    #[error("Role is required")]
    MissingRole,
    #[error("Job URL must be an absolute http(s) link: {0}")]
    InvalidJobUrl(String),
}

/// Fields for creating an application.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDraft {
    pub company_name: String,
    pub role: String,
    pub status: Status,
    pub priority: Priority,
    #[serde(with = "wire_date::required")]
    pub applied_date: Date,
    #[serde(
        serialize_with = "wire_date::optional::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub interview_date: Option<Date>,
    #[serde(
        serialize_with = "wire_date::optional::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_up_date: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ApplicationDraft {
    /// A draft with status `Applied` and priority `Medium`.
    pub fn new(company_name: impl Into<String>, role: impl Into<String>, applied_date: Date) -> Self {
        Self {
            company_name: company_name.into(),
            role: role.into(),
            status: Status::default(),
            priority: Priority::default(),
            applied_date,
            interview_date: None,
            follow_up_date: None,
            job_url: None,
            notes: None,
        }
    }

    /// Prefill a draft from an existing record for editing.
    pub fn from_application(app: &Application) -> Self {
        Self {
            company_name: app.company_name.clone(),
            role: app.role.clone(),
            status: app.status,
            priority: app.priority,
            applied_date: app.applied_date,
            interview_date: app.interview_date,
            follow_up_date: app.follow_up_date,
            job_url: app.job_url.clone(),
            notes: app.notes.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        require_text(&self.company_name, DraftError::MissingCompany)?;
        require_text(&self.role, DraftError::MissingRole)?;
        validate_job_url(self.job_url.as_deref())
    }
}

/// Fields for updating an application; absent fields are left to the service.
///
/// For the optional record fields, `Some(None)` asks the service to clear the
/// value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(
        serialize_with = "wire_date::optional::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub applied_date: Option<Date>,
    #[serde(
        serialize_with = "wire_date::clearable::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub interview_date: Option<Option<Date>>,
    #[serde(
        serialize_with = "wire_date::clearable::serialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_up_date: Option<Option<Date>>,
    #[serde(
        serialize_with = "clearable_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub job_url: Option<Option<String>>,
    #[serde(
        serialize_with = "clearable_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<Option<String>>,
}

impl ApplicationUpdate {
    /// An update that only moves the application to `status`.
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), DraftError> {
        if let Some(company) = &self.company_name {
            require_text(company, DraftError::MissingCompany)?;
        }
        if let Some(role) = &self.role {
            require_text(role, DraftError::MissingRole)?;
        }
        if let Some(job_url) = &self.job_url {
            validate_job_url(job_url.as_deref())?;
        }
        Ok(())
    }
}

impl From<ApplicationDraft> for ApplicationUpdate {
    fn from(draft: ApplicationDraft) -> Self {
        Self {
            company_name: Some(draft.company_name),
            role: Some(draft.role),
            status: Some(draft.status),
            priority: Some(draft.priority),
            applied_date: Some(draft.applied_date),
            interview_date: Some(draft.interview_date),
            follow_up_date: Some(draft.follow_up_date),
            job_url: Some(draft.job_url),
            notes: Some(draft.notes),
        }
    }
}

fn require_text(value: &str, missing: DraftError) -> Result<(), DraftError> {
    if value.trim().is_empty() {
        return Err(missing);
    }
    Ok(())
}

fn validate_job_url(job_url: Option<&str>) -> Result<(), DraftError> {
    let Some(raw) = job_url.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(());
    };
    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(DraftError::InvalidJobUrl(raw.to_string())),
    }
}

fn clearable_text<S: Serializer>(
    value: &Option<Option<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(Some(text)) => serializer.serialize_str(text),
        Some(None) => serializer.serialize_str(""),
        None => serializer.serialize_none(),
    }
}
