//! Cached application list and stats, kept consistent with the service.
//!
//! The store is owned by one thread. Reads (`fetch_applications`,
//! `fetch_stats`) run in the background and land on the next [`poll`];
//! mutations block for their single request and update the cache only after
//! the service confirms. Every confirmed mutation schedules a stats refresh
//! without waiting for it.
//!
//! [`poll`]: ApplicationStore::poll

mod error;

pub use error::StoreError;

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::{
    gateway::{GatewayClient, GatewayError, paths},
    jobs::{BackgroundJobs, JobTag, LatestRequest},
    model::{
        Application, ApplicationDraft, ApplicationId, ApplicationUpdate, StatsSummary,
        StatusFilter,
    },
};

pub(crate) enum StoreMessage {
    ApplicationsLoaded {
        tag: JobTag,
        filter: StatusFilter,
        result: Result<Vec<Application>, GatewayError>,
    },
    StatsLoaded {
        tag: JobTag,
        result: Result<StatsSummary, GatewayError>,
    },
}

pub struct ApplicationStore {
    gateway: GatewayClient,
    jobs: BackgroundJobs<StoreMessage>,
    list_request: LatestRequest,
    stats_request: LatestRequest,
    applications: Vec<Application>,
    loaded_filter: StatusFilter,
    stats: Option<StatsSummary>,
    last_error: Option<GatewayError>,
    session_generation: u64,
}

impl ApplicationStore {
    /// Create an empty store; nothing is fetched until asked.
    pub fn new(gateway: GatewayClient) -> Self {
        let session_generation = gateway.session().generation();
        Self {
            gateway,
            jobs: BackgroundJobs::new(),
            list_request: LatestRequest::default(),
            stats_request: LatestRequest::default(),
            applications: Vec::new(),
            loaded_filter: StatusFilter::All,
            stats: None,
            last_error: None,
            session_generation,
        }
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn get(&self, id: &ApplicationId) -> Option<&Application> {
        self.applications.iter().find(|app| &app.id == id)
    }

    pub fn stats(&self) -> Option<&StatsSummary> {
        self.stats.as_ref()
    }

    /// Filter the cached list was fetched with.
    pub fn filter(&self) -> StatusFilter {
        self.loaded_filter
    }

    /// Whether the newest list fetch is still outstanding.
    pub fn is_loading(&self) -> bool {
        self.list_request.is_pending()
    }

    /// Most recent failure of a background read, cleared by the next success.
    pub fn last_error(&self) -> Option<&GatewayError> {
        self.last_error.as_ref()
    }

    pub fn has_pending_jobs(&self) -> bool {
        self.jobs.in_flight() > 0
    }

    /// Refetch the list for `filter`, replacing the cache when it answers.
    ///
    /// Returns `false` without a request when no credential is present. An
    /// answer to an older call is discarded once a newer one is issued.
    pub fn fetch_applications(&mut self, filter: StatusFilter) -> bool {
        self.sync_session();
        if !self.gateway.session().is_authenticated() {
            debug!("Skipping application fetch: not signed in");
            return false;
        }
        let request_id = self.list_request.issue();
        let tag = self.tag(request_id);
        let gateway = self.gateway.clone();
        self.jobs.spawn(move || {
            let query: Vec<(&str, &str)> = filter
                .query_value()
                .map(|status| ("status", status))
                .into_iter()
                .collect();
            let result = gateway.get(paths::APPLICATIONS, &query);
            StoreMessage::ApplicationsLoaded {
                tag,
                filter,
                result,
            }
        });
        true
    }

    /// Refetch the stats summary in the background.
    pub fn fetch_stats(&mut self) -> bool {
        self.sync_session();
        if !self.gateway.session().is_authenticated() {
            debug!("Skipping stats fetch: not signed in");
            return false;
        }
        let request_id = self.stats_request.issue();
        let tag = self.tag(request_id);
        let gateway = self.gateway.clone();
        self.jobs.spawn(move || StoreMessage::StatsLoaded {
            tag,
            result: gateway.get(paths::STATS_SUMMARY, &[]),
        });
        true
    }

    /// Create an application and prepend the service's record to the cache.
    pub fn add_application(&mut self, draft: &ApplicationDraft) -> Result<Application, StoreError> {
        self.require_session("create")?;
        draft.validate()?;
        let created: Application = self
            .gateway
            .post(paths::APPLICATIONS, draft)
            .inspect_err(|err| warn!("Create application failed: {err}"))?;

        info!("Created application {}", created.id);
        self.applications.retain(|app| app.id != created.id);
        self.applications.insert(0, created.clone());
        self.fetch_stats();
        Ok(created)
    }

    /// Update an application and replace its cached entry with the answer.
    ///
    /// If the id is not cached the answer is not inserted.
    pub fn update_application(
        &mut self,
        id: &ApplicationId,
        update: &ApplicationUpdate,
    ) -> Result<Application, StoreError> {
        self.require_session("update")?;
        update.validate()?;
        let updated: Application = self
            .gateway
            .put(&paths::application(id), update)
            .inspect_err(|err| warn!("Update of application {id} failed: {err}"))?;

        match self.applications.iter_mut().find(|app| &app.id == id) {
            Some(slot) => *slot = updated.clone(),
            None => debug!("Updated application {id} is not cached; leaving list unchanged"),
        }
        info!("Updated application {id}");
        self.fetch_stats();
        Ok(updated)
    }

    /// Delete an application and drop it from the cache.
    pub fn delete_application(&mut self, id: &ApplicationId) -> Result<(), StoreError> {
        self.require_session("delete")?;
        self.gateway
            .delete(&paths::application(id))
            .inspect_err(|err| warn!("Delete of application {id} failed: {err}"))?;

        self.applications.retain(|app| &app.id != id);
        info!("Deleted application {id}");
        self.fetch_stats();
        Ok(())
    }

    /// Apply every finished background read. Returns whether anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = self.sync_session();
        while let Some(message) = self.jobs.try_recv() {
            changed |= self.apply(message);
        }
        changed
    }

    /// Block until all background reads have landed or `timeout` elapses.
    ///
    /// Returns `true` when nothing is left in flight.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.poll();
        while self.has_pending_jobs() {
            match self.jobs.recv_until(deadline) {
                Some(message) => {
                    self.apply(message);
                }
                None => break,
            }
        }
        self.poll();
        !self.has_pending_jobs()
    }

    fn apply(&mut self, message: StoreMessage) -> bool {
        match message {
            StoreMessage::ApplicationsLoaded {
                tag,
                filter,
                result,
            } => {
                if !self.is_current(tag) || !self.list_request.settle(tag.request_id) {
                    debug!("Discarding stale application list ({})", filter.label());
                    return false;
                }
                match result {
                    Ok(applications) => {
                        debug!(
                            "Loaded {} applications ({})",
                            applications.len(),
                            filter.label()
                        );
                        self.applications = applications;
                        self.loaded_filter = filter;
                        self.last_error = None;
                    }
                    Err(err) => {
                        error!("Failed to load applications: {err}");
                        self.last_error = Some(err);
                    }
                }
                true
            }
            StoreMessage::StatsLoaded { tag, result } => {
                if !self.is_current(tag) || !self.stats_request.settle(tag.request_id) {
                    debug!("Discarding stale stats summary");
                    return false;
                }
                match result {
                    Ok(stats) => {
                        self.stats = Some(stats);
                        true
                    }
                    Err(err) => {
                        warn!("Failed to refresh stats: {err}");
                        false
                    }
                }
            }
        }
    }

    /// Drop the cache when the credential changed since it was filled.
    fn sync_session(&mut self) -> bool {
        let generation = self.gateway.session().generation();
        if generation == self.session_generation {
            return false;
        }
        info!("Session changed; clearing cached applications");
        self.session_generation = generation;
        self.applications.clear();
        self.loaded_filter = StatusFilter::All;
        self.stats = None;
        self.last_error = None;
        self.list_request.abandon();
        self.stats_request.abandon();
        true
    }

    fn require_session(&mut self, operation: &str) -> Result<(), StoreError> {
        self.sync_session();
        if self.gateway.session().is_authenticated() {
            return Ok(());
        }
        debug!("Refusing to {operation} without a credential");
        Err(GatewayError::Unauthorized.into())
    }

    fn tag(&self, request_id: u64) -> JobTag {
        JobTag {
            request_id,
            session_generation: self.session_generation,
        }
    }

    fn is_current(&self, tag: JobTag) -> bool {
        tag.session_generation == self.gateway.session().generation()
    }
}

impl std::fmt::Debug for ApplicationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationStore")
            .field("applications", &self.applications.len())
            .field("filter", &self.loaded_filter)
            .field("stats", &self.stats)
            .field("in_flight", &self.jobs.in_flight())
            .finish()
    }
}
