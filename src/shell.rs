//! Plain-text presentation of the views. Display only, no logic of their own.

use std::fmt;

use crate::auth::User;
use crate::freshness::ReportState;
use crate::routes::NavItem;
use crate::scan::ScanTarget;

/// Landing page
pub struct LandingView;

impl fmt::Display for LandingView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Freshness Tracker")?;
        writeln!(f, "Know how long your meat has been on the shelf.")?;
        writeln!(f)?;
        writeln!(f, "How it works:")?;
        writeln!(f, "  1. Create Batch   - add a new meat batch with its dates")?;
        writeln!(f, "  2. Generate QR    - every batch gets its own code")?;
        writeln!(f, "  3. Share QR Code  - print or display it in the store")?;
        write!(f, "  4. Scan & Check   - customers scan to verify freshness")
    }
}

/// Navigation bar
pub struct NavView<'a>(pub &'a [NavItem]);

impl fmt::Display for NavView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<String> = self
            .0
            .iter()
            .map(|item| match item {
                NavItem::Link { label, route } => format!("{} ({})", label, route),
                NavItem::Logout => "Logout".to_string(),
            })
            .collect();
        write!(f, "{}", entries.join(" | "))
    }
}

/// Account page
pub struct ProfileView<'a>(pub &'a User);

impl fmt::Display for ProfileView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "My Account")?;
        writeln!(f, "Logged in as {}", self.0.email)?;
        write!(f, "Full name: {}", self.0.full_name.as_deref().unwrap_or("-"))
    }
}

/// Admin list of batches with their code payloads
pub struct BatchListView<'a>(pub &'a [ScanTarget]);

impl fmt::Display for BatchListView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Existing Batches")?;
        if self.0.is_empty() {
            return write!(f, "\n  (none)");
        }
        for target in self.0 {
            let batch = &target.batch;
            write!(f, "\n\n#{} {} - {}", batch.id, batch.product, batch.batch_identifier)?;
            write!(f, "\n  Butchered: {}", batch.butcher_date)?;
            write!(f, "\n  Arrived:   {}", batch.arrival_date)?;
            write!(f, "\n  QR:        {}", target.payload())?;
        }
        Ok(())
    }
}

/// Public freshness report
pub struct ReportView<'a>(pub &'a ReportState);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ReportState::Loading => write!(f, "Loading freshness report..."),
            ReportState::Failed(message) => write!(f, "☹️ {}", message),
            ReportState::Ready(report) => {
                writeln!(f, "{} {}", report.bucket.emoji(), report.batch.product)?;
                writeln!(f, "Freshness Report: {}", report.bucket)?;
                writeln!(f, "Days on Shelf:    {}", report.days_on_shelf)?;
                writeln!(f, "Butchered On:     {}", report.batch.butcher_date)?;
                writeln!(f, "Arrived in Store: {}", report.batch.arrival_date)?;
                write!(f, "Thank you for checking freshness with us!")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batches::{Batch, BatchId, Product};
    use crate::freshness::{classify, FreshnessReport};
    use crate::routes::Route;
    use chrono::NaiveDate;

    fn batch() -> Batch {
        Batch {
            id: BatchId(8),
            product: Product::Beef,
            batch_identifier: "B-100".to_string(),
            butcher_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            arrival_date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            created_at: None,
        }
    }

    #[test]
    fn report_shows_bucket_and_days() {
        let state = ReportState::Ready(FreshnessReport {
            batch: batch(),
            days_on_shelf: 5,
            bucket: classify(5),
        });
        let text = ReportView(&state).to_string();
        assert!(text.contains("Freshness Report: Expired"));
        assert!(text.contains("Days on Shelf:    5"));
        assert!(text.contains("2024-01-03"));
    }

    #[test]
    fn failed_report_shows_message() {
        let state = ReportState::Failed("Batch not found".to_string());
        assert!(ReportView(&state).to_string().contains("Batch not found"));
    }

    #[test]
    fn nav_lists_entries_in_order() {
        let items = vec![
            NavItem::Link { label: "Sign In", route: Route::Login },
            NavItem::Logout,
        ];
        assert_eq!(NavView(&items).to_string(), "Sign In (/login) | Logout");
    }
}
