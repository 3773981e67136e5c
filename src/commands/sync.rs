use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use showcal_core::{
    CalendarStore, EventMapper, FeedSource, HttpFeed, InvalidRecordPolicy, LoadOutcome, sync,
};

use crate::config::Settings;
use crate::render::{ReportRender, render_totals};
use crate::utils::tui::create_spinner;

/// Per-run overrides from the command line
#[derive(Debug, Default, clap::Args)]
pub struct SyncArgs {
    /// Fetch from this URL instead of the configured feed
    #[arg(long)]
    pub feed_url: Option<String>,

    /// Calendar file to create/update
    #[arg(short, long)]
    pub output: Option<std::path::PathBuf>,

    /// Do everything except writing the calendar file
    #[arg(long)]
    pub dry_run: bool,

    /// Skip records that cannot be mapped instead of aborting
    #[arg(long)]
    pub skip_invalid: bool,

    /// Don't add door/show reminders
    #[arg(long)]
    pub no_reminders: bool,
}

impl SyncArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(ref url) = self.feed_url {
            settings.feed_url = url.clone();
        }
        if let Some(ref output) = self.output {
            settings.calendar_file = output.clone();
        }
        if self.skip_invalid {
            settings.on_invalid_record = InvalidRecordPolicy::Skip;
        }
        if self.no_reminders {
            settings.reminders = false;
        }
    }
}

pub fn run(settings: &Settings, dry_run: bool, verbose: bool) -> Result<()> {
    let feed_url = settings.feed_url()?;
    let mapper = EventMapper::new(settings.mapper_options()?);
    let source = HttpFeed::new(feed_url.as_str(), settings.request_timeout())?;
    let path = settings.calendar_path();

    let spinner = create_spinner(format!("Fetching {}", source.describe()));
    let fetched = source.fetch();
    spinner.finish_and_clear();

    let records = fetched.with_context(|| format!("Failed to fetch feed from {}", feed_url))?;
    println!("Fetched {} events from feed", records.len());

    let mut store = load_calendar(&path, &settings.product_id)?;

    let report = sync(&mut store, &records, &mapper, settings.on_invalid_record)?;
    println!("{}", report.render(verbose));

    if dry_run {
        println!(
            "\n{} {} ({})",
            "Dry run:".yellow(),
            format!("{} not written", path.display()).dimmed(),
            render_totals(&report)
        );
        return Ok(());
    }

    store
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!(
        "\nSaved updated {} ({}). Past events remain.",
        path.display(),
        render_totals(&report)
    );

    Ok(())
}

fn load_calendar(path: &Path, product_id: &str) -> Result<CalendarStore> {
    let (store, outcome) = CalendarStore::load_or_create(path, product_id)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    match outcome {
        LoadOutcome::Loaded => println!(
            "Loaded existing calendar {} ({} events)",
            path.display(),
            store.len()
        ),
        LoadOutcome::Created => println!("No existing calendar at {}, creating new", path.display()),
    }

    Ok(store)
}
