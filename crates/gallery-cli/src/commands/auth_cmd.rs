use chrono::DateTime;
use gallery_core::auth::AuthProvider;
use gallery_core::backend::{ArtworkStore, ObjectStore};
use gallery_core::{ActionOutcome, AdminController};

use crate::cli::AuthCommands;
use crate::commands::common::{connect, open_connection};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { email, password } => {
            let connection = open_connection(global_profile)?;
            let label = sign_in(&connection.controller, &email, &password).await?;
            println!(
                "Signed in profile '{}' as {label}",
                connection.profile_name
            );
            Ok(())
        }
        AuthCommands::Status => {
            let connection = connect(global_profile).await?;
            println!(
                "{}",
                status_line(&connection.profile_name, &connection.controller)
            );
            Ok(())
        }
        AuthCommands::Logout => {
            let connection = connect(global_profile).await?;
            let controller = &connection.controller;
            let outcome = controller.sign_out().await;
            controller
                .guard()
                .provider()
                .forget_session()
                .map_err(|error| CliError::Auth(error.to_string()))?;
            if let ActionOutcome::Failed(error) = outcome {
                tracing::warn!("Remote sign-out failed: {}", error);
            }
            println!("Signed out profile '{}'", connection.profile_name);
            Ok(())
        }
    }
}

/// Sign in through the login form; returns the signed-in email label.
///
/// A failed collection load after a successful sign-in is only logged.
pub async fn sign_in<P, S, O>(
    controller: &AdminController<P, S, O>,
    email: &str,
    password: &str,
) -> Result<String, CliError>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    let outcome = controller.sign_in(email, password).await;
    let Some(session) = controller.guard().current_session() else {
        let message = controller.login_form().error.unwrap_or_else(|| match outcome {
            ActionOutcome::Failed(error) => error.to_string(),
            _ => "Sign-in did not complete".to_string(),
        });
        return Err(CliError::Auth(message));
    };

    if let ActionOutcome::Failed(error) = outcome {
        tracing::warn!("Signed in, but failed to load artworks: {}", error);
    }
    if let Some(notification) = controller.notifier().current() {
        println!("{}", notification.message);
    }
    Ok(session.email_label().to_string())
}

pub fn status_line<P, S, O>(profile_name: &str, controller: &AdminController<P, S, O>) -> String
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    match controller.guard().current_session() {
        Some(session) => {
            let expires = DateTime::from_timestamp(session.expires_at, 0).map_or_else(
                || session.expires_at.to_string(),
                |at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            );
            format!(
                "Profile '{profile_name}' is signed in as {} (expires {expires}, {} artworks)",
                session.email_label(),
                controller.artworks().len()
            )
        }
        None => format!("Profile '{profile_name}' is not signed in."),
    }
}
