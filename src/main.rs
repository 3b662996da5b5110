//! Headless dashboard: loads the applications, stats and deadline alerts for
//! the current credential and prints them.
use std::{sync::Arc, time::Duration};

use jobtrack::{
    config::ClientConfig,
    deadlines::{DeadlineAlertsView, DeadlineFeed},
    gateway::GatewayClient,
    logging::{self, LogTarget},
    model::StatusFilter,
    session::{Credential, SessionContext, SessionEvent},
    store::ApplicationStore,
    view::{self, DashboardView, TimelineView},
};
use time::OffsetDateTime;

const TOKEN_ENV: &str = "JOBTRACK_TOKEN";

struct Args {
    filter: StatusFilter,
    log_file: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args(std::env::args().skip(1))?;
    let target = if args.log_file {
        LogTarget::StdoutAndFile
    } else {
        LogTarget::Stdout
    };
    if let Err(err) = logging::init(target) {
        eprintln!("Logging disabled: {err}");
    }

    let config = ClientConfig::load()?;
    let session = Arc::new(match std::env::var(TOKEN_ENV).ok().and_then(Credential::new) {
        Some(credential) => SessionContext::with_credential(credential),
        None => {
            eprintln!("{TOKEN_ENV} is not set; nothing will be fetched");
            SessionContext::new()
        }
    });
    let session_events = session.subscribe();
    let gateway = GatewayClient::new(&config, session.clone());

    let mut store = ApplicationStore::new(gateway.clone());
    let mut feed = DeadlineFeed::new(gateway);
    store.fetch_applications(args.filter);
    store.fetch_stats();
    feed.mount();

    let wait = config.timeout() + Duration::from_secs(1);
    store.wait_idle(wait);
    feed.wait_idle(wait);

    if session_events.try_iter().any(|event| event == SessionEvent::Expired) {
        eprintln!("Session expired; sign in again and update {TOKEN_ENV}");
        std::process::exit(2);
    }

    print_dashboard(&view::dashboard(&store, args.filter));
    if let Some(err) = store.last_error() {
        println!("  (failed to load applications: {err})");
    }
    print_alerts(&feed.view(OffsetDateTime::now_utc().date()));
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args {
        filter: StatusFilter::All,
        log_file: true,
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--status" => {
                let raw = args.next().ok_or("--status needs a value")?;
                parsed.filter = StatusFilter::parse(&raw).map_err(|err| err.to_string())?;
            }
            "--no-log-file" => parsed.log_file = false,
            other => return Err(format!("Unknown argument '{other}'")),
        }
    }
    Ok(parsed)
}

fn print_dashboard(dashboard: &DashboardView) {
    for stat in &dashboard.stats {
        println!("{:<20} {}", stat.label, stat.value);
    }
    println!();
    println!("{} ({})", dashboard.title, dashboard.count);
    if dashboard.loading {
        println!("  Loading applications...");
    } else if dashboard.empty {
        println!("  No applications yet");
    }
    for card in &dashboard.cards {
        println!(
            "  [{}] {} - {} (applied {})",
            card.status, card.company, card.role, card.applied
        );
        if let Some(url) = &card.job_url {
            println!("      {url}");
        }
        if let Some(notes) = &card.notes {
            println!("      {notes}");
        }
        if let TimelineView::Entries(entries) = &card.timeline {
            for entry in entries {
                println!("      {} {} {}", entry.icon, entry.status, entry.when);
            }
        }
    }
}

fn print_alerts(alerts: &DeadlineAlertsView) {
    match alerts {
        DeadlineAlertsView::Hidden => {}
        DeadlineAlertsView::Loading => println!("\nLoading upcoming deadlines..."),
        DeadlineAlertsView::Error(message) => println!("\n{message}"),
        DeadlineAlertsView::Alerts { count, items } => {
            println!("\nUpcoming Deadlines ({count})");
            for item in items {
                println!("  {} - {}", item.company, item.role);
                if let Some(day) = &item.interview {
                    println!("      Interview: {day}");
                }
                if let Some(day) = &item.follow_up {
                    println!("      Follow-up: {day}");
                }
            }
        }
    }
}
