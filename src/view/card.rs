use crate::model::{Application, ApplicationId, Status, StatusChange};

use super::{format_day, format_stamp};

const EMPTY_HISTORY: &str = "No status history available";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationCardView {
    pub id: ApplicationId,
    pub company: String,
    pub role: String,
    pub status: Status,
    /// CSS-style badge class, e.g. `status-interview`.
    pub badge_class: String,
    pub applied: String,
    pub job_url: Option<String>,
    pub notes: Option<String>,
    pub timeline: TimelineView,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimelineView {
    Empty { message: &'static str },
    Entries(Vec<TimelineEntryView>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelineEntryView {
    pub status: Status,
    pub icon: &'static str,
    pub class: &'static str,
    pub when: String,
    pub note: Option<String>,
}

pub fn application_card(app: &Application) -> ApplicationCardView {
    ApplicationCardView {
        id: app.id.clone(),
        company: app.company_name.clone(),
        role: app.role.clone(),
        status: app.status,
        badge_class: format!("status-{}", app.status.as_str().to_lowercase()),
        applied: format_day(app.applied_date),
        job_url: app.job_url.clone(),
        notes: app.notes.clone(),
        timeline: timeline(&app.status_history),
    }
}

/// Status history in server order.
pub fn timeline(history: &[StatusChange]) -> TimelineView {
    if history.is_empty() {
        return TimelineView::Empty {
            message: EMPTY_HISTORY,
        };
    }
    TimelineView::Entries(
        history
            .iter()
            .map(|change| TimelineEntryView {
                status: change.status,
                icon: status_icon(change.status),
                class: timeline_class(change.status),
                when: format_stamp(change.timestamp),
                note: change.note.clone(),
            })
            .collect(),
    )
}

fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Applied => "📝",
        Status::Interview => "💼",
        Status::Rejected => "❌",
        Status::Offer => "🎉",
    }
}

fn timeline_class(status: Status) -> &'static str {
    match status {
        Status::Applied => "timeline-applied",
        Status::Interview => "timeline-interview",
        Status::Rejected => "timeline-rejected",
        Status::Offer => "timeline-offer",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use time::macros::{date, datetime};

    fn sample() -> Application {
        Application {
            id: ApplicationId::from("abc123"),
            company_name: "Acme".into(),
            role: "SWE".into(),
            status: Status::Interview,
            priority: Priority::High,
            applied_date: date!(2025 - 01 - 15),
            interview_date: None,
            follow_up_date: None,
            job_url: Some("https://acme.example/jobs/1".into()),
            notes: None,
            status_history: vec![
                StatusChange {
                    status: Status::Applied,
                    timestamp: datetime!(2025-01-15 0:00 UTC),
                    note: None,
                },
                StatusChange {
                    status: Status::Interview,
                    timestamp: datetime!(2025-01-20 9:45 UTC),
                    note: Some("Phone screen".into()),
                },
            ],
        }
    }

    #[test]
    fn card_has_badge_and_formatted_date() {
        let card = application_card(&sample());
        assert_eq!(card.badge_class, "status-interview");
        assert_eq!(card.applied, "Jan 15, 2025");
        assert_eq!(card.job_url.as_deref(), Some("https://acme.example/jobs/1"));
    }

    #[test]
    fn timeline_maps_each_status_change() {
        let TimelineView::Entries(entries) = timeline(&sample().status_history) else {
            panic!("expected entries");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].icon, "📝");
        assert_eq!(entries[0].class, "timeline-applied");
        assert_eq!(entries[1].icon, "💼");
        assert_eq!(entries[1].when, "Jan 20, 2025 - 09:45");
        assert_eq!(entries[1].note.as_deref(), Some("Phone screen"));
    }

    #[test]
    fn empty_history_shows_placeholder() {
        assert_eq!(
            timeline(&[]),
            TimelineView::Empty {
                message: "No status history available"
            }
        );
    }

    #[test]
    fn rejected_and_offer_have_distinct_markers() {
        assert_eq!(status_icon(Status::Rejected), "❌");
        assert_eq!(timeline_class(Status::Offer), "timeline-offer");
    }
}
