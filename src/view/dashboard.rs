use crate::{
    model::{StatsSummary, StatusFilter},
    store::ApplicationStore,
};

use super::card::{ApplicationCardView, application_card};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardView {
    pub stats: Vec<StatCardView>,
    pub filters: Vec<FilterOptionView>,
    /// `All Applications` or `<Status> Applications`.
    pub title: String,
    pub count: usize,
    pub loading: bool,
    /// Nothing cached and nothing loading.
    pub empty: bool,
    pub cards: Vec<ApplicationCardView>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatCardView {
    pub label: &'static str,
    pub value: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterOptionView {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Build the dashboard for the filter the user picked.
///
/// The heading follows `selected` even while the list for it is loading.
pub fn dashboard(store: &ApplicationStore, selected: StatusFilter) -> DashboardView {
    let applications = store.applications();
    let loading = store.is_loading();
    DashboardView {
        stats: stat_cards(store.stats()),
        filters: filter_options(selected),
        title: list_title(selected),
        count: applications.len(),
        loading,
        empty: !loading && applications.is_empty(),
        cards: applications.iter().map(application_card).collect(),
    }
}

/// Missing stats show as zero.
fn stat_cards(stats: Option<&StatsSummary>) -> Vec<StatCardView> {
    let stats = stats.copied().unwrap_or_default();
    vec![
        StatCardView {
            label: "Total Applications",
            value: stats.total,
        },
        StatCardView {
            label: "Applied",
            value: stats.applied,
        },
        StatCardView {
            label: "Interviews",
            value: stats.interview,
        },
        StatCardView {
            label: "Offers",
            value: stats.offer,
        },
    ]
}

fn filter_options(selected: StatusFilter) -> Vec<FilterOptionView> {
    StatusFilter::OPTIONS
        .into_iter()
        .map(|option| FilterOptionView {
            value: option.label(),
            label: match option {
                StatusFilter::All => "All Applications",
                StatusFilter::Only(status) => status.as_str(),
            },
            selected: option == selected,
        })
        .collect()
}

fn list_title(selected: StatusFilter) -> String {
    match selected {
        StatusFilter::All => "All Applications".to_string(),
        StatusFilter::Only(status) => format!("{status} Applications"),
    }
}
