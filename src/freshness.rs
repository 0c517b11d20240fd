//! Freshness classification and the public report view-model

use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::batches::{Batch, BatchWithFreshness};
use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::generation::Generation;

const NOT_FOUND: &str = "Batch not found";
const FETCH_FAILED: &str = "Failed to fetch batch details";

/// Freshness status derived from days on shelf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FreshnessBucket {
    Fresh,
    Caution,
    Expired,
}

/// Bucket for a shelf age; ties go to the less severe bucket.
///
/// Negative ages are not rejected and come out Fresh.
pub fn classify(days_on_shelf: i64) -> FreshnessBucket {
    if days_on_shelf <= 2 {
        FreshnessBucket::Fresh
    } else if days_on_shelf <= 4 {
        FreshnessBucket::Caution
    } else {
        FreshnessBucket::Expired
    }
}

impl FreshnessBucket {
    /// Status word shown on the report
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fresh => "Fresh",
            Self::Caution => "Caution",
            Self::Expired => "Expired",
        }
    }

    /// Icon shown at the top of the report
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Fresh => "🥩",
            Self::Caution => "⚠️",
            Self::Expired => "⛔",
        }
    }
}

impl fmt::Display for FreshnessBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a customer sees after scanning a batch's code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessReport {
    pub batch: Batch,
    pub days_on_shelf: i64,
    pub bucket: FreshnessBucket,
}

impl From<BatchWithFreshness> for FreshnessReport {
    fn from(value: BatchWithFreshness) -> Self {
        Self {
            bucket: classify(value.days_on_shelf),
            days_on_shelf: value.days_on_shelf,
            batch: value.batch,
        }
    }
}

/// State of the report view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportState {
    Loading,
    Ready(FreshnessReport),
    Failed(String),
}

/// View-model behind the public report page
pub struct FreshnessResolver {
    options: ClientOptions,
    client: Client,
    state: RwLock<ReportState>,
    generation: Generation,
}

impl FreshnessResolver {
    /// Create a resolver in the loading state
    pub fn new(options: ClientOptions, client: Client) -> Self {
        Self {
            options,
            client,
            state: RwLock::new(ReportState::Loading),
            generation: Generation::new(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ReportState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ReportState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state of the report view
    pub fn state(&self) -> ReportState {
        self.read().clone()
    }

    /// Load the report for batch `id`.
    ///
    /// The state stays [`ReportState::Loading`] until the request settles,
    /// then moves to `Ready` or `Failed` exactly once. A 404 fails with
    /// "Batch not found"; other failures show the server detail if any.
    pub async fn fetch_batch(&self, id: &str) -> Result<FreshnessReport> {
        let ticket = self.generation.issue();
        *self.write() = ReportState::Loading;

        let path = format!("/batches/{}", urlencoding::encode(id.trim()));
        let result = Fetch::get(&self.client, &self.options.endpoint(&path))
            .execute::<BatchWithFreshness>()
            .await;

        if !self.generation.is_current(ticket) {
            debug!("dropping stale report for batch {}", id);
            return Err(Error::Superseded);
        }

        match result {
            Ok(batch) => {
                let report = FreshnessReport::from(batch);
                *self.write() = ReportState::Ready(report.clone());
                Ok(report)
            }
            Err(err) => {
                warn!("fetching batch {} failed: {}", id, err);
                let message = if err.is_not_found() {
                    NOT_FOUND.to_string()
                } else {
                    err.user_message(FETCH_FAILED)
                };
                *self.write() = ReportState::Failed(message);
                Err(err)
            }
        }
    }

    /// Drop every response still in flight
    pub fn teardown(&self) {
        self.generation.close();
    }
}
