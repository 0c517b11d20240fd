//! Authentication and session management
//!
//! [`SessionStore`] owns the signed-in user and the persisted bearer token.
//! One store is created per application load and shared by reference with
//! everything that needs the session.

mod storage;
mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info, warn};
use reqwest::Client;
use serde::Serialize;

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::generation::{Generation, Ticket};

pub use storage::*;
pub use types::*;

const LOGIN_FAILED: &str = "Login failed";
const REGISTER_FAILED: &str = "Registration failed";
const UPDATE_FAILED: &str = "Update failed";

#[derive(Debug)]
struct SessionState {
    user: Option<User>,
    resolving: bool,
    error: Option<String>,
}

/// Client-side session: current user, persisted token, last error message
pub struct SessionStore {
    options: ClientOptions,
    client: Client,
    storage: Arc<dyn TokenStorage>,
    state: RwLock<SessionState>,
    generation: Generation,
    restore: Generation,
    probed: AtomicBool,
}

impl SessionStore {
    /// Create a store in the resolving state; call [`check_session`](Self::check_session) once at startup.
    pub fn new(options: ClientOptions, client: Client, storage: Arc<dyn TokenStorage>) -> Self {
        Self {
            options,
            client,
            storage,
            state: RwLock::new(SessionState {
                user: None,
                resolving: true,
                error: None,
            }),
            generation: Generation::new(),
            restore: Generation::new(),
            probed: AtomicBool::new(false),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The signed-in user
    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    /// True exactly when a user is set
    pub fn is_authenticated(&self) -> bool {
        self.read().user.is_some()
    }

    /// True until the startup probe has settled
    pub fn is_resolving(&self) -> bool {
        self.read().resolving
    }

    /// Message from the last failed login, register or profile update
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// The persisted bearer token
    pub fn token(&self) -> Result<Option<String>> {
        self.storage.get(TOKEN_KEY)
    }

    /// Resolve a persisted token into a user.
    ///
    /// Runs once per store; later calls return immediately. Without a stored
    /// token no request is made. A token the server rejects is removed, and
    /// the store is left signed out without reporting an error. Only a
    /// successful login, register or profile update, or a logout, overrides
    /// this check; a failed attempt leaves its result standing.
    pub async fn check_session(&self) {
        if self.probed.swap(true, Ordering::SeqCst) {
            return;
        }
        let ticket = self.restore.issue();

        let token = self.storage.get(TOKEN_KEY).unwrap_or_else(|err| {
            warn!("could not read stored token: {}", err);
            None
        });

        if let Some(token) = token {
            let result = Fetch::get(&self.client, &self.options.endpoint("/users/me"))
                .bearer_auth(&token)
                .execute::<User>()
                .await;

            if !self.restore.is_current(ticket) {
                debug!("dropping stale session probe response");
            } else {
                match result {
                    Ok(user) => {
                        info!("restored session for {}", user.email);
                        self.write().user = Some(user);
                    }
                    Err(err) => {
                        warn!("stored token rejected, signing out: {}", err);
                        if let Err(err) = self.storage.remove(TOKEN_KEY) {
                            warn!("could not remove stored token: {}", err);
                        }
                        self.write().user = None;
                    }
                }
            }
        }

        self.write().resolving = false;
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let body = LoginRequest { email, password };
        self.authenticate("/auth/login", &body, LOGIN_FAILED).await
    }

    /// Create an account and sign in to it
    pub async fn register(&self, email: &str, password: &str, full_name: &str) -> Result<User> {
        let body = RegisterRequest {
            email,
            password,
            full_name,
        };
        self.authenticate("/auth/register", &body, REGISTER_FAILED).await
    }

    /// Forget the session locally. No request is made.
    pub fn logout(&self) -> Result<()> {
        self.generation.invalidate();
        self.restore.invalidate();
        {
            let mut state = self.write();
            state.user = None;
            state.error = None;
            state.resolving = false;
        }
        self.storage.remove(TOKEN_KEY)?;
        info!("signed out");
        Ok(())
    }

    /// Update the signed-in user's profile and adopt the server's copy
    pub async fn update_profile(&self, update: &UserUpdate) -> Result<User> {
        self.write().error = None;
        let ticket = self.generation.issue();

        let token = match self.storage.get(TOKEN_KEY) {
            Ok(Some(token)) => token,
            Ok(None) => return Err(self.fail(ticket, Error::auth("Not logged in"), UPDATE_FAILED)),
            Err(err) => return Err(self.fail(ticket, err, UPDATE_FAILED)),
        };

        let result = self.put_user(&token, update).await;
        match result {
            Ok(_) if !self.generation.is_current(ticket) => {
                debug!("dropping stale profile update response");
                Err(Error::Superseded)
            }
            Ok(user) => {
                self.restore.invalidate();
                self.write().user = Some(user.clone());
                Ok(user)
            }
            Err(err) => Err(self.fail(ticket, err, UPDATE_FAILED)),
        }
    }

    async fn put_user(&self, token: &str, update: &UserUpdate) -> Result<User> {
        Fetch::put(&self.client, &self.options.endpoint("/users/me"))
            .bearer_auth(token)
            .json(update)?
            .execute::<User>()
            .await
    }

    async fn post_credentials<B: Serialize>(&self, path: &str, body: &B) -> Result<AuthResponse> {
        Fetch::post(&self.client, &self.options.endpoint(path))
            .json(body)?
            .execute::<AuthResponse>()
            .await
    }

    async fn authenticate<B: Serialize>(&self, path: &str, body: &B, fallback: &str) -> Result<User> {
        self.write().error = None;
        let ticket = self.generation.issue();

        let response = match self.post_credentials(path, body).await {
            Ok(response) => response,
            Err(err) => return Err(self.fail(ticket, err, fallback)),
        };

        if !self.generation.is_current(ticket) {
            debug!("dropping stale {} response", path);
            return Err(Error::Superseded);
        }

        // Persist first so the stored token never lags behind the user.
        if let Err(err) = self.storage.set(TOKEN_KEY, &response.access_token) {
            return Err(self.fail(ticket, err, fallback));
        }
        self.restore.invalidate();
        {
            let mut state = self.write();
            state.user = Some(response.user.clone());
            state.resolving = false;
        }
        info!("signed in as {}", response.user.email);
        Ok(response.user)
    }

    /// Record the user-facing message for a failed request, unless it is stale
    fn fail(&self, ticket: Ticket, err: Error, fallback: &str) -> Error {
        if !self.generation.is_current(ticket) {
            debug!("dropping stale failure: {}", err);
            return Error::Superseded;
        }
        self.write().error = Some(err.user_message(fallback));
        err
    }
}
