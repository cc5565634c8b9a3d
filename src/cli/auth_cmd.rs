//! Login and logout

use std::process::ExitCode;

use crate::application::ports::NotesApi;

use super::app::{AppContext, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
use super::input::read_raw_line;
use super::presenter::Presenter;

/// `voicenote login -e EMAIL`
pub async fn run_login(ctx: &AppContext, email: &str, password: Option<String>) -> ExitCode {
    let mut presenter = Presenter::new();

    let password = match password {
        Some(password) => password,
        None => {
            presenter.prompt("Password:");
            match read_raw_line().await {
                Some(password) => password,
                None => {
                    presenter.error("No password given");
                    return ExitCode::from(EXIT_USAGE_ERROR);
                }
            }
        }
    };
    if password.is_empty() {
        presenter.error("No password given");
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    presenter.start_spinner("Signing in...");
    let token = match ctx.api().login(email, &password).await {
        Ok(token) => token,
        Err(e) => {
            presenter.spinner_fail(&e.to_string());
            return ExitCode::from(EXIT_ERROR);
        }
    };

    if let Err(e) = ctx.store_token(Some(token)).await {
        presenter.spinner_fail(&format!("Signed in but could not save the token: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }
    presenter.spinner_success(&format!("Signed in as {}", email));
    ExitCode::from(EXIT_SUCCESS)
}

/// `voicenote logout`
pub async fn run_logout(ctx: &AppContext) -> ExitCode {
    let presenter = Presenter::new();
    match ctx.store_token(None).await {
        Ok(()) => {
            presenter.success("Signed out");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            presenter.error(&e.to_string());
            ExitCode::from(EXIT_ERROR)
        }
    }
}
