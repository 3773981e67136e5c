//! Terminal rendering for sync results.
//!
//! Extension traits that add colored output to showcal-core types using
//! owo_colors.

use owo_colors::OwoColorize;
use showcal_core::{Change, ChangeKind, SkippedRecord, SyncReport};

pub trait Render {
    fn render(&self) -> String;
}

impl Render for ChangeKind {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            ChangeKind::Added => symbol.green().to_string(),
            ChangeKind::Updated => symbol.yellow().to_string(),
            ChangeKind::Unchanged => symbol.dimmed().to_string(),
        }
    }
}

fn colorize_change(kind: ChangeKind, text: &str) -> String {
    match kind {
        ChangeKind::Added => text.green().to_string(),
        ChangeKind::Updated => text.yellow().to_string(),
        ChangeKind::Unchanged => text.dimmed().to_string(),
    }
}

impl Render for Change {
    fn render(&self) -> String {
        format!(
            "{} {} {}",
            self.kind.render(),
            colorize_change(self.kind, &self.summary),
            self.uid.dimmed()
        )
    }
}

impl Render for SkippedRecord {
    fn render(&self) -> String {
        format!(
            "{} {} {}",
            "!".red(),
            format!("record #{} ({})", self.index, self.event).red(),
            self.error.to_string().dimmed()
        )
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}

/// Rendering of a whole run; unchanged events are only listed when verbose
pub trait ReportRender {
    fn render(&self, verbose: bool) -> String;
}

impl ReportRender for SyncReport {
    fn render(&self, verbose: bool) -> String {
        let mut lines = Vec::new();

        for change in &self.changes {
            if change.kind != ChangeKind::Unchanged || verbose {
                lines.push(format!("   {}", change.render()));
            }
        }

        let unchanged = self.count(ChangeKind::Unchanged);
        if unchanged > 0 && !verbose {
            let label = format!("({} unchanged {})", unchanged, pluralize("event", unchanged));
            lines.push(format!("   {} {}", "=".dimmed(), label.dimmed()));
        }

        for skipped in &self.skipped {
            lines.push(format!("   {}", skipped.render()));
        }

        if lines.is_empty() {
            return "   No events in feed".dimmed().to_string();
        }

        lines.join("\n")
    }
}

/// One-line totals, e.g. "8 fetched: 2 added, 1 updated, 5 unchanged"
pub fn render_totals(report: &SyncReport) -> String {
    let mut parts = vec![
        format!("{} added", report.count(ChangeKind::Added)),
        format!("{} updated", report.count(ChangeKind::Updated)),
        format!("{} unchanged", report.count(ChangeKind::Unchanged)),
    ];
    if !report.skipped.is_empty() {
        parts.push(format!("{} skipped", report.skipped.len()));
    }
    format!("{} fetched: {}", report.fetched, parts.join(", "))
}
