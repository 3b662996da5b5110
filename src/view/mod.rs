//! Helpers to turn store and feed state into display-ready structs.
//!
//! Nothing here renders; callers decide how the rows are drawn.

mod card;
mod dashboard;
mod form;

pub use card::{ApplicationCardView, TimelineEntryView, TimelineView, application_card, timeline};
pub use dashboard::{DashboardView, FilterOptionView, StatCardView, dashboard};
pub use form::{ApplicationForm, FormMode};

use time::{Date, OffsetDateTime, format_description::FormatItem, macros::format_description};

const DAY_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:short] [day padding:zero], [year]");
const STAMP_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month repr:short] [day padding:zero], [year] - [hour repr:24 padding:zero]:[minute padding:zero]"
);

/// `Jan 05, 2025`
pub fn format_day(date: Date) -> String {
    date.format(DAY_FORMAT)
        .unwrap_or_else(|_| crate::model::wire_date::format_date(date))
}

/// `Jan 05, 2025 - 14:30`, in the offset the stamp carries.
pub fn format_stamp(stamp: OffsetDateTime) -> String {
    stamp
        .format(STAMP_FORMAT)
        .unwrap_or_else(|_| stamp.date().to_string())
}
