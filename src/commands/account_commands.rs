use anyhow::bail;
use chrono::{Local, TimeZone};

use crate::plugins::auth::AuthState;
use crate::services::account::{self, LoginOutcome};
use crate::services::api::SignupForm;
use crate::services::config::PublicConfig;

use super::AppContext;

pub async fn run_login(ctx: &AppContext, username: &str, password: &str) -> anyhow::Result<()> {
    let outcome = account::login(&ctx.client, username, password).await;
    println!("{}", outcome.message());
    match outcome {
        LoginOutcome::SignedIn { state, .. } => {
            println!("{}", describe_state(&state));
            Ok(())
        }
        _ => bail!("Login did not succeed"),
    }
}

pub fn run_logout(ctx: &AppContext) -> anyhow::Result<()> {
    account::logout(&ctx.client)?;
    println!("Signed out.");
    Ok(())
}

pub(crate) fn describe_state(state: &AuthState) -> String {
    match state {
        AuthState::Anonymous => "Not signed in".to_string(),
        AuthState::Authenticated {
            subject,
            expires_at,
        } => {
            let who = subject.as_deref().unwrap_or("unknown user");
            let until = expires_at
                .and_then(|exp| Local.timestamp_opt(exp as i64, 0).single())
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            format!("Signed in as {who} (token valid until {until})")
        }
    }
}

pub fn run_status(ctx: &AppContext) -> anyhow::Result<()> {
    let public = PublicConfig::from(&ctx.config);
    println!("{}", serde_json::to_string_pretty(&public)?);

    if ctx.auth().bearer().is_some() {
        if let Err(err) = ctx.auth().guard() {
            println!("Stored credential rejected: {}", err);
        }
    }
    println!("{}", describe_state(&ctx.auth().state()));
    Ok(())
}

pub async fn run_signup(ctx: &AppContext, form: &SignupForm) -> anyhow::Result<()> {
    let reply = account::signup(&ctx.client, form).await?;
    log::debug!("Signup reply: {}", reply);
    println!("Signup successful. You can now log in as {}.", form.username);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_state() {
        assert_eq!(describe_state(&AuthState::Anonymous), "Not signed in");

        let state = AuthState::Authenticated {
            subject: Some("jdoe".to_string()),
            expires_at: None,
        };
        assert_eq!(
            describe_state(&state),
            "Signed in as jdoe (token valid until unknown)"
        );
    }
}
