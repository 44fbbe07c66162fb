use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::Serialize;
use tokio::sync::watch;

use crate::services::api::ApiError;

use super::store::CredentialStore;
use super::token::{TokenClaims, inspect_token};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum AuthState {
    Anonymous,
    #[serde(rename_all = "camelCase")]
    Authenticated {
        subject: Option<String>,
        expires_at: Option<u64>,
    },
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Authentication context handed to every component that talks to the backend.
///
/// Cloning shares the same credential; changes are published through `subscribe()`.
#[derive(Clone)]
pub struct AuthContext {
    inner: Arc<AuthContextInner>,
}

struct AuthContextInner {
    store: Box<dyn CredentialStore>,
    token: ArcSwapOption<String>,
    state_tx: watch::Sender<AuthState>,
    verify_secret: Option<Vec<u8>>,
}

fn state_for(token: &str, secret: Option<&[u8]>) -> AuthState {
    match inspect_token(token, secret) {
        Ok(TokenClaims { exp, sub }) => AuthState::Authenticated {
            subject: sub,
            expires_at: Some(exp),
        },
        // Unverifiable tokens from the backend still count as signed in until guarded.
        Err(_) => AuthState::Authenticated {
            subject: None,
            expires_at: None,
        },
    }
}

impl AuthContext {
    pub fn new(
        store: Box<dyn CredentialStore>,
        verify_secret: Option<Vec<u8>>,
    ) -> Result<Self, ApiError> {
        let token = store.load()?;
        let state = match token.as_deref() {
            Some(token) => state_for(token, verify_secret.as_deref()),
            None => AuthState::Anonymous,
        };
        let (state_tx, _) = watch::channel(state);

        Ok(Self {
            inner: Arc::new(AuthContextInner {
                store,
                token: ArcSwapOption::from(token.map(Arc::new)),
                state_tx,
                verify_secret,
            }),
        })
    }

    /// Credential to attach as `Authorization: Bearer`, if any.
    pub fn bearer(&self) -> Option<Arc<String>> {
        self.inner.token.load_full()
    }

    pub fn state(&self) -> AuthState {
        self.inner.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.inner.state_tx.subscribe()
    }

    pub fn sign_in(&self, token: &str) -> Result<AuthState, ApiError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ApiError::invalid_input("Empty access token"));
        }
        self.inner.store.save(token)?;
        self.inner.token.store(Some(Arc::new(token.to_string())));

        let state = state_for(token, self.inner.verify_secret.as_deref());
        self.inner.state_tx.send_replace(state.clone());
        log::debug!("Credential stored");
        Ok(state)
    }

    pub fn sign_out(&self) -> Result<(), ApiError> {
        self.inner.token.store(None);
        self.inner.state_tx.send_replace(AuthState::Anonymous);
        self.inner.store.clear()
    }

    /// Validate the stored credential locally.
    ///
    /// A missing, malformed or expired credential is cleared and the context
    /// drops back to `Anonymous`; the backend is never asked.
    pub fn guard(&self) -> Result<TokenClaims, ApiError> {
        let Some(token) = self.bearer() else {
            return Err(ApiError::credential("Not signed in"));
        };

        match inspect_token(&token, self.inner.verify_secret.as_deref()) {
            Ok(claims) => Ok(claims),
            Err(err) => {
                log::warn!("{}. Clearing stored credential", err.message());
                if let Err(clear_err) = self.sign_out() {
                    log::warn!("Failed to clear credential: {}", clear_err);
                }
                Err(err)
            }
        }
    }
}
