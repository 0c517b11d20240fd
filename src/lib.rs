//! Freshness Tracker client library
//!
//! Client for the meat freshness tracker: staff register product batches,
//! every batch gets a scannable code pointing at its public report, and
//! customers resolve that code to a freshness status.

pub mod auth;
pub mod batches;
pub mod config;
pub mod error;
pub mod fetch;
pub mod freshness;
pub mod generation;
pub mod routes;
pub mod scan;
pub mod shell;

use std::sync::Arc;

use reqwest::Client;

use crate::auth::{SessionStore, TokenStorage};
use crate::batches::BatchRegistry;
use crate::config::{ClientOptions, PublicConfig};
use crate::error::Result;
use crate::fetch::Fetch;
use crate::freshness::FreshnessResolver;
use crate::routes::RouteGuard;

/// Application context: owns the configuration, the HTTP client and the session.
///
/// View-models are created from it and share its session by reference.
pub struct FreshnessTracker {
    /// Client options
    pub options: ClientOptions,
    /// HTTP client used for requests
    pub http_client: Client,
    session: Arc<SessionStore>,
}

impl FreshnessTracker {
    /// Create a new context. The session starts unresolved; call [`start`](Self::start).
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use freshness_tracker::{FreshnessTracker, auth::MemoryTokenStorage, config::ClientOptions};
    ///
    /// let tracker = FreshnessTracker::new(ClientOptions::default(), Arc::new(MemoryTokenStorage::new()));
    /// assert!(!tracker.session().is_authenticated());
    /// ```
    pub fn new(options: ClientOptions, storage: Arc<dyn TokenStorage>) -> Self {
        Self::new_with_client(options, storage, Client::new())
    }

    /// Create a new context around an existing HTTP client
    pub fn new_with_client(
        options: ClientOptions,
        storage: Arc<dyn TokenStorage>,
        http_client: Client,
    ) -> Self {
        let session = Arc::new(SessionStore::new(
            options.clone(),
            http_client.clone(),
            storage,
        ));

        Self {
            options,
            http_client,
            session,
        }
    }

    /// Run the startup session probe
    pub async fn start(&self) {
        self.session.check_session().await;
    }

    /// The shared session
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// A fresh view-model for the admin batch list
    pub fn batch_registry(&self) -> BatchRegistry {
        BatchRegistry::new(self.options.clone(), self.http_client.clone())
    }

    /// A fresh view-model for a public report page
    pub fn freshness_resolver(&self) -> FreshnessResolver {
        FreshnessResolver::new(self.options.clone(), self.http_client.clone())
    }

    /// Guard bound to this context's session
    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(Arc::clone(&self.session))
    }

    /// Ask the API server which public addresses it advertises
    pub async fn public_config(&self) -> Result<PublicConfig> {
        Fetch::get(&self.http_client, &self.options.endpoint("/config/public"))
            .execute::<PublicConfig>()
            .await
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{FileTokenStorage, MemoryTokenStorage, SessionStore, User, UserUpdate};
    pub use crate::batches::{Batch, BatchForm, BatchId, BatchRegistry, NewBatch, Product};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::freshness::{classify, FreshnessBucket, FreshnessResolver, ReportState};
    pub use crate::routes::{GuardDecision, Route, RouteGuard};
    pub use crate::FreshnessTracker;
}
