use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::{
    model::{Application, ApplicationDraft, ApplicationId},
    store::{ApplicationStore, StoreError},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ApplicationId),
}

/// Add/edit form state. Submitting dispatches to the store and keeps the
/// error line for display when the save fails.
#[derive(Clone, Debug)]
pub struct ApplicationForm {
    mode: FormMode,
    pub draft: ApplicationDraft,
    error: Option<String>,
}

impl ApplicationForm {
    /// Empty form with today's (UTC) date as the applied date.
    pub fn new() -> Self {
        Self::starting_on(OffsetDateTime::now_utc().date())
    }

    pub fn starting_on(applied_date: Date) -> Self {
        Self {
            mode: FormMode::Create,
            draft: ApplicationDraft::new("", "", applied_date),
            error: None,
        }
    }

    /// Form prefilled from an existing record.
    pub fn edit(app: &Application) -> Self {
        Self {
            mode: FormMode::Edit(app.id.clone()),
            draft: ApplicationDraft::from_application(app),
            error: None,
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "Add New Application",
            FormMode::Edit(_) => "Edit Application",
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Create or update through the store.
    pub fn submit(&mut self, store: &mut ApplicationStore) -> Result<Application, StoreError> {
        self.error = None;
        let result = match &self.mode {
            FormMode::Create => store.add_application(&self.draft),
            FormMode::Edit(id) => store.update_application(id, &self.draft.clone().into()),
        };
        if let Err(err) = &result {
            debug!("Form submit failed: {err}");
            self.error = Some(err.user_message());
        }
        result
    }
}

impl Default for ApplicationForm {
    fn default() -> Self {
        Self::new()
    }
}
