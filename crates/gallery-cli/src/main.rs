//! gallery - browse and manage the artist portfolio gallery from the command line

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

use std::io;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::{connect, open_connection};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::export::run_export;
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::commands::toggle::run_toggle;
use crate::commands::url::run_url;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "gallery=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::List { all, json } => {
            let connection = connect(profile).await?;
            run_list(&connection.controller, all, json).await?;
        }
        Commands::Show { id } => {
            let connection = connect(profile).await?;
            run_show(&connection.controller, &id).await?;
        }
        Commands::Add { file, fields } => {
            let connection = connect(profile).await?;
            run_add(&connection.controller, &file, &fields).await?;
        }
        Commands::Edit {
            id,
            file,
            fields,
            sort_order,
        } => {
            let connection = connect(profile).await?;
            run_edit(
                &connection.controller,
                &id,
                file.as_deref(),
                &fields,
                sort_order,
            )
            .await?;
        }
        Commands::Toggle { id } => {
            let connection = connect(profile).await?;
            run_toggle(&connection.controller, &id).await?;
        }
        Commands::Delete { id, force } => {
            let connection = connect(profile).await?;
            run_delete(&connection.controller, &id, force, io::stdin().lock()).await?;
        }
        Commands::Url { path } => {
            let connection = open_connection(profile)?;
            run_url(&connection.controller, &path)?;
        }
        Commands::Export { format, output } => {
            let connection = connect(profile).await?;
            run_export(&connection.controller, format, output.as_deref()).await?;
        }
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
        Commands::Config { command } => run_config(command, profile)?,
        Commands::Auth { command } => run_auth(command, profile).await?,
    }

    Ok(())
}
