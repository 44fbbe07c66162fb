//! Login, signup and logout flows on top of `ApiClient` and `AuthContext`.

use serde::Serialize;

use crate::plugins::auth::AuthState;
use crate::services::api::{ApiClient, ApiError, LoginRequest, SignupForm};
use crate::services::prompts;

/// Result of a login attempt, with the user-facing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum LoginOutcome {
    SignedIn { message: String, state: AuthState },
    MissingFields { message: String },
    Rejected { message: String },
    Failed { message: String },
}

impl LoginOutcome {
    pub fn message(&self) -> &str {
        match self {
            LoginOutcome::SignedIn { message, .. }
            | LoginOutcome::MissingFields { message }
            | LoginOutcome::Rejected { message }
            | LoginOutcome::Failed { message } => message,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, LoginOutcome::SignedIn { .. })
    }
}

pub async fn login(client: &ApiClient, username: &str, password: &str) -> LoginOutcome {
    if username.trim().is_empty() || password.is_empty() {
        return LoginOutcome::MissingFields {
            message: prompts::LOGIN_MISSING_FIELDS.to_string(),
        };
    }

    let request = LoginRequest {
        username: username.trim().to_string(),
        password: password.to_string(),
    };
    let response = match client.login(&request).await {
        Ok(response) => response,
        Err(err) => {
            log::error!("Login request failed: {}", err);
            return LoginOutcome::Failed {
                message: prompts::LOGIN_FAILED.to_string(),
            };
        }
    };

    let Some(token) = response.access_token.filter(|t| !t.trim().is_empty()) else {
        return LoginOutcome::Rejected {
            message: prompts::LOGIN_INVALID.to_string(),
        };
    };

    match client.auth().sign_in(&token) {
        Ok(state) => LoginOutcome::SignedIn {
            message: prompts::LOGIN_SUCCESS.to_string(),
            state,
        },
        Err(err) => {
            log::error!("Failed to store credential: {}", err);
            LoginOutcome::Failed {
                message: prompts::LOGIN_FAILED.to_string(),
            }
        }
    }
}

pub fn logout(client: &ApiClient) -> Result<(), ApiError> {
    client.auth().sign_out()
}

/// Submit a registration. The form is sent as-is and the backend reply is
/// passed through.
pub async fn signup(client: &ApiClient, form: &SignupForm) -> Result<serde_json::Value, ApiError> {
    let reply = client.register(form).await?;
    log::debug!("Signup accepted for {}", form.username);
    Ok(reply)
}
