//! Batch registry: the admin list of batches and the batch entry form

mod types;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::generation::Generation;
use crate::scan::ScanTarget;

pub use types::*;

const FETCH_FAILED: &str = "Failed to fetch batches";
const CREATE_FAILED: &str = "Failed to create batch";

#[derive(Debug, Default)]
struct RegistryState {
    batches: Vec<Batch>,
    submitting: bool,
    error: Option<String>,
}

/// View-model behind the admin batch list
pub struct BatchRegistry {
    options: ClientOptions,
    client: Client,
    state: RwLock<RegistryState>,
    generation: Generation,
}

impl BatchRegistry {
    /// Create an empty registry
    pub fn new(options: ClientOptions, client: Client) -> Self {
        Self {
            options,
            client,
            state: RwLock::new(RegistryState::default()),
            generation: Generation::new(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Batches from the last successful fetch
    pub fn batches(&self) -> Vec<Batch> {
        self.read().batches.clone()
    }

    /// True while a creation request is in flight
    pub fn is_submitting(&self) -> bool {
        self.read().submitting
    }

    /// Message from the last failed request
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Listed batches paired with their scannable-code payloads
    pub fn scan_targets(&self) -> Result<Vec<ScanTarget>> {
        self.batches()
            .into_iter()
            .map(|batch| ScanTarget::new(&self.options.public_url, batch))
            .collect()
    }

    /// Replace the list with whatever the server returns for `GET /batches/`.
    ///
    /// A newer fetch supersedes this one; a failure keeps the previous list.
    /// Rows that do not decode as a [`Batch`] are skipped with a warning.
    pub async fn fetch_batches(&self) -> Result<()> {
        let ticket = self.generation.issue();

        let result = Fetch::get(&self.client, &self.options.endpoint("/batches/"))
            .execute::<Vec<Value>>()
            .await
            .map(decode_rows);

        if !self.generation.is_current(ticket) {
            debug!("dropping stale batch list response");
            return Err(Error::Superseded);
        }

        match result {
            Ok(batches) => {
                debug!("fetched {} batches", batches.len());
                let mut state = self.write();
                state.batches = batches;
                state.error = None;
                Ok(())
            }
            Err(err) => {
                warn!("fetching batches failed: {}", err);
                self.write().error = Some(err.user_message(FETCH_FAILED));
                Err(err)
            }
        }
    }

    /// Submit a new batch, then refetch the whole list.
    ///
    /// Nothing is inserted locally; the new entry shows up once the refetch
    /// settles. A failed refetch is recorded in [`error`](Self::error) but does
    /// not fail the creation.
    pub async fn create_batch(&self, batch: &NewBatch) -> Result<Batch> {
        {
            let mut state = self.write();
            state.submitting = true;
            state.error = None;
        }

        let result = self.post_batch(batch).await;

        if self.generation.is_closed() {
            debug!("dropping batch creation response after teardown");
            return Err(Error::Superseded);
        }
        self.write().submitting = false;

        match result {
            Ok(created) => {
                info!("created batch {} ({})", created.id, created.batch_identifier);
                if let Err(err) = self.fetch_batches().await {
                    debug!("refresh after create did not apply: {}", err);
                }
                Ok(created)
            }
            Err(err) => {
                warn!("creating batch failed: {}", err);
                self.write().error = Some(err.user_message(CREATE_FAILED));
                Err(err)
            }
        }
    }

    async fn post_batch(&self, batch: &NewBatch) -> Result<Batch> {
        Fetch::post(&self.client, &self.options.endpoint("/batches/"))
            .json(batch)?
            .execute::<Batch>()
            .await
    }

    /// Drop every response still in flight; the registry stops updating
    pub fn teardown(&self) {
        self.generation.close();
    }
}

fn decode_rows(rows: Vec<Value>) -> Vec<Batch> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<Batch>(row.clone()) {
            Ok(batch) => Some(batch),
            Err(err) => {
                warn!("skipping malformed batch row {}: {}", row, err);
                None
            }
        })
        .collect()
}
