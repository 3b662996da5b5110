//! Upcoming interview and follow-up dates, fetched once per mount.
//!
//! The feed is independent of [`ApplicationStore`](crate::store::ApplicationStore):
//! it has its own request, its own states and never propagates a raw error.
//! A new fetch happens only on [`DeadlineFeed::mount`] or when the session
//! credential changes while mounted.

use std::time::{Duration, Instant};

use serde::Deserialize;
use time::Date;
use tracing::{debug, error, info};

use crate::{
    gateway::{GatewayClient, GatewayError, paths},
    jobs::{BackgroundJobs, JobTag, LatestRequest},
    model::{Application, ApplicationId, wire_date},
    view::format_day,
};

/// Shown instead of the underlying failure.
pub const LOAD_FAILED_MESSAGE: &str = "Could not load upcoming deadlines. Please try again later.";

/// Days ahead that count as "upcoming".
pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Record returned by the upcoming-deadlines endpoint. Only the fields the
/// alerts need are decoded.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingDeadline {
    #[serde(rename = "_id", alias = "id")]
    pub id: ApplicationId,
    pub company_name: String,
    pub role: String,
    #[serde(default, with = "wire_date::optional")]
    pub interview_date: Option<Date>,
    #[serde(default, with = "wire_date::optional")]
    pub follow_up_date: Option<Date>,
}

impl From<&Application> for UpcomingDeadline {
    fn from(app: &Application) -> Self {
        Self {
            id: app.id.clone(),
            company_name: app.company_name.clone(),
            role: app.role.clone(),
            interview_date: app.interview_date,
            follow_up_date: app.follow_up_date,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeadlineFeedState {
    Loading,
    Ready(Vec<UpcomingDeadline>),
    Error(String),
}

/// What the alert region should show. The variants are mutually exclusive;
/// `Hidden` means nothing is rendered at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeadlineAlertsView {
    Hidden,
    Loading,
    Error(String),
    Alerts {
        count: usize,
        items: Vec<DeadlineAlert>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeadlineAlert {
    pub id: ApplicationId,
    pub company: String,
    pub role: String,
    /// Interview date, formatted for display.
    pub interview: Option<String>,
    /// Follow-up date, formatted for display.
    pub follow_up: Option<String>,
    /// Days until the nearest date that is not in the past.
    pub days_left: Option<i64>,
}

impl DeadlineAlert {
    fn new(entry: &UpcomingDeadline, today: Date) -> Self {
        Self {
            id: entry.id.clone(),
            company: entry.company_name.clone(),
            role: entry.role.clone(),
            interview: entry.interview_date.map(format_day),
            follow_up: entry.follow_up_date.map(format_day),
            days_left: next_deadline(entry, today).map(|date| days_until(date, today)),
        }
    }
}

/// Whole days from `today` to `date`; negative when `date` has passed.
pub fn days_until(date: Date, today: Date) -> i64 {
    (date - today).whole_days()
}

/// Earliest interview or follow-up date on or after `today`.
pub fn next_deadline(entry: &UpcomingDeadline, today: Date) -> Option<Date> {
    [entry.interview_date, entry.follow_up_date]
        .into_iter()
        .flatten()
        .filter(|date| *date >= today)
        .min()
}

/// True when an interview or follow-up falls within `0..=window_days` of today.
pub fn is_upcoming(entry: &UpcomingDeadline, today: Date, window_days: i64) -> bool {
    next_deadline(entry, today).is_some_and(|date| days_until(date, today) <= window_days)
}

struct FeedMessage {
    tag: JobTag,
    result: Result<Vec<UpcomingDeadline>, GatewayError>,
}

pub struct DeadlineFeed {
    gateway: GatewayClient,
    jobs: BackgroundJobs<FeedMessage>,
    request: LatestRequest,
    state: DeadlineFeedState,
    mounted: bool,
    session_generation: u64,
}

impl DeadlineFeed {
    pub fn new(gateway: GatewayClient) -> Self {
        let session_generation = gateway.session().generation();
        Self {
            gateway,
            jobs: BackgroundJobs::new(),
            request: LatestRequest::default(),
            state: DeadlineFeedState::Loading,
            mounted: false,
            session_generation,
        }
    }

    /// Show the feed and fetch once. Returns whether a request was issued;
    /// without a credential the feed stays in `Loading`.
    pub fn mount(&mut self) -> bool {
        self.mounted = true;
        self.session_generation = self.gateway.session().generation();
        self.state = DeadlineFeedState::Loading;
        self.fetch()
    }

    /// Stop reacting to session changes; answers still in flight are dropped.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.request.abandon();
    }

    pub fn state(&self) -> &DeadlineFeedState {
        &self.state
    }

    pub fn view(&self, today: Date) -> DeadlineAlertsView {
        match &self.state {
            DeadlineFeedState::Loading => DeadlineAlertsView::Loading,
            DeadlineFeedState::Error(message) => DeadlineAlertsView::Error(message.clone()),
            DeadlineFeedState::Ready(entries) if entries.is_empty() => DeadlineAlertsView::Hidden,
            DeadlineFeedState::Ready(entries) => DeadlineAlertsView::Alerts {
                count: entries.len(),
                items: entries
                    .iter()
                    .map(|entry| DeadlineAlert::new(entry, today))
                    .collect(),
            },
        }
    }

    /// Apply a finished fetch, refetching first if the credential changed.
    /// Returns whether the state changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = self.sync_session();
        while let Some(message) = self.jobs.try_recv() {
            changed |= self.apply(message);
        }
        changed
    }

    /// Block until the fetch has landed or `timeout` elapses.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.poll();
        while self.jobs.in_flight() > 0 {
            match self.jobs.recv_until(deadline) {
                Some(message) => {
                    self.apply(message);
                }
                None => break,
            }
        }
        self.jobs.in_flight() == 0
    }

    fn fetch(&mut self) -> bool {
        if !self.gateway.session().is_authenticated() {
            debug!("Skipping deadline fetch: not signed in");
            return false;
        }
        let tag = JobTag {
            request_id: self.request.issue(),
            session_generation: self.session_generation,
        };
        let gateway = self.gateway.clone();
        self.jobs.spawn(move || FeedMessage {
            tag,
            result: gateway.get(paths::UPCOMING_DEADLINES, &[]),
        });
        true
    }

    fn sync_session(&mut self) -> bool {
        let generation = self.gateway.session().generation();
        if generation == self.session_generation {
            return false;
        }
        self.session_generation = generation;
        self.request.abandon();
        if !self.mounted {
            return false;
        }
        info!("Session changed; reloading upcoming deadlines");
        self.state = DeadlineFeedState::Loading;
        self.fetch();
        true
    }

    fn apply(&mut self, message: FeedMessage) -> bool {
        let FeedMessage { tag, result } = message;
        if tag.session_generation != self.session_generation
            || !self.request.settle(tag.request_id)
        {
            debug!("Discarding stale deadline response");
            return false;
        }
        self.state = match result {
            Ok(entries) => {
                debug!("Loaded {} upcoming deadlines", entries.len());
                DeadlineFeedState::Ready(entries)
            }
            Err(err) => {
                error!("Error fetching deadlines: {err}");
                DeadlineFeedState::Error(LOAD_FAILED_MESSAGE.to_string())
            }
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ClientConfig,
        session::{Credential, SessionContext},
    };
    use std::sync::Arc;
    use time::macros::date;

    fn offline_feed(signed_in: bool) -> (DeadlineFeed, Arc<SessionContext>) {
        let session = Arc::new(if signed_in {
            SessionContext::with_credential(Credential::new("tok").unwrap())
        } else {
            SessionContext::new()
        });
        let config = ClientConfig::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        (
            DeadlineFeed::new(GatewayClient::new(&config, session.clone())),
            session,
        )
    }

    fn entry(id: &str, interview: Option<Date>, follow_up: Option<Date>) -> UpcomingDeadline {
        UpcomingDeadline {
            id: ApplicationId::from(id),
            company_name: "Google".into(),
            role: "Software Engineer".into(),
            interview_date: interview,
            follow_up_date: follow_up,
        }
    }

    fn answer(feed: &mut DeadlineFeed, result: Result<Vec<UpcomingDeadline>, GatewayError>) -> bool {
        let tag = JobTag {
            request_id: feed.request.issue(),
            session_generation: feed.session_generation,
        };
        feed.apply(FeedMessage { tag, result })
    }

    #[test]
    fn starts_loading_and_skips_fetch_without_credential() {
        let (mut feed, _session) = offline_feed(false);
        assert!(!feed.mount());
        assert_eq!(feed.view(date!(2025 - 01 - 15)), DeadlineAlertsView::Loading);
        assert_eq!(feed.jobs.in_flight(), 0);
    }

    #[test]
    fn empty_answer_hides_the_region() {
        let (mut feed, _session) = offline_feed(true);
        assert!(answer(&mut feed, Ok(Vec::new())));
        assert_eq!(feed.view(date!(2025 - 01 - 15)), DeadlineAlertsView::Hidden);
    }

    #[test]
    fn failure_shows_generic_message() {
        let (mut feed, _session) = offline_feed(true);
        answer(&mut feed, Err(GatewayError::NetworkError("refused".into())));
        assert_eq!(
            feed.view(date!(2025 - 01 - 15)),
            DeadlineAlertsView::Error(LOAD_FAILED_MESSAGE.to_string())
        );
    }

    #[test]
    fn alerts_carry_formatted_dates() {
        let (mut feed, _session) = offline_feed(true);
        let today = date!(2025 - 01 - 15);
        answer(
            &mut feed,
            Ok(vec![
                entry("1", Some(date!(2025 - 01 - 20)), None),
                entry("2", None, Some(date!(2025 - 01 - 22))),
            ]),
        );
        let DeadlineAlertsView::Alerts { count, items } = feed.view(today) else {
            panic!("expected alerts");
        };
        assert_eq!(count, 2);
        assert_eq!(items[0].interview.as_deref(), Some("Jan 20, 2025"));
        assert_eq!(items[0].follow_up, None);
        assert_eq!(items[0].days_left, Some(5));
        assert_eq!(items[1].follow_up.as_deref(), Some("Jan 22, 2025"));
        assert_eq!(items[1].days_left, Some(7));
    }

    #[test]
    fn stale_answer_is_ignored() {
        let (mut feed, _session) = offline_feed(true);
        let stale = JobTag {
            request_id: feed.request.issue(),
            session_generation: feed.session_generation,
        };
        answer(&mut feed, Ok(Vec::new()));
        assert!(!feed.apply(FeedMessage {
            tag: stale,
            result: Ok(vec![entry("1", None, None)]),
        }));
        assert_eq!(feed.state(), &DeadlineFeedState::Ready(Vec::new()));
    }

    #[test]
    fn session_change_resets_to_loading() {
        let (mut feed, session) = offline_feed(true);
        feed.mounted = true;
        answer(&mut feed, Ok(Vec::new()));
        session.clear();
        assert!(feed.poll());
        assert_eq!(feed.state(), &DeadlineFeedState::Loading);
        assert_eq!(feed.jobs.in_flight(), 0);
    }

    #[test]
    fn upcoming_window_is_inclusive() {
        let today = date!(2025 - 01 - 15);
        assert!(is_upcoming(&entry("a", Some(today), None), today, DEFAULT_WINDOW_DAYS));
        assert!(is_upcoming(
            &entry("b", None, Some(date!(2025 - 01 - 22))),
            today,
            DEFAULT_WINDOW_DAYS
        ));
        assert!(!is_upcoming(
            &entry("c", Some(date!(2025 - 01 - 23)), None),
            today,
            DEFAULT_WINDOW_DAYS
        ));
        assert!(!is_upcoming(
            &entry("d", Some(date!(2025 - 01 - 14)), None),
            today,
            DEFAULT_WINDOW_DAYS
        ));
    }

    #[test]
    fn next_deadline_skips_past_dates() {
        let today = date!(2025 - 01 - 15);
        let mixed = entry("a", Some(date!(2025 - 01 - 10)), Some(date!(2025 - 01 - 18)));
        assert_eq!(next_deadline(&mixed, today), Some(date!(2025 - 01 - 18)));
        assert_eq!(days_until(date!(2025 - 01 - 10), today), -5);
    }

    #[test]
    fn decodes_endpoint_records_without_applied_date() {
        let json = r#"[
            { "_id": "1", "companyName": "Google", "role": "Software Engineer",
              "interviewDate": "2025-01-20T00:00:00.000Z" },
            { "_id": "2", "companyName": "Microsoft", "role": "Product Manager",
              "followUpDate": "2025-01-22" }
        ]"#;
        let entries: Vec<UpcomingDeadline> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].interview_date, Some(date!(2025 - 01 - 20)));
        assert_eq!(entries[1].follow_up_date, Some(date!(2025 - 01 - 22)));
    }
}
