use std::io::{self, BufRead, Write};
use std::path::Path;

use chrono::Utc;
use gallery_core::admin::ArtworkForm;
use gallery_core::auth::{AuthProvider, SupabaseAuthClient};
use gallery_core::backend::{
    ArtworkStore, BearerSource, ObjectStore, SupabaseObjects, SupabaseRecords,
};
use gallery_core::{
    ActionOutcome, AdminController, Artwork, ArtworkRepository, GalleryConfig, Notifier,
    SessionGuard,
};

use crate::auth::SessionStore;
use crate::cli::ArtworkFields;
use crate::config_profiles::{resolve_gallery_config, CliProfilesConfig};
use crate::error::CliError;

/// Controller wired to the hosted backend with a keychain session store.
pub type LiveController =
    AdminController<SupabaseAuthClient<SessionStore>, SupabaseRecords, SupabaseObjects>;

pub const SHORT_ID_LEN: usize = 8;

/// Profile name plus a controller for it.
pub struct Connection {
    pub profile_name: String,
    pub controller: LiveController,
}

/// Resolve the profile and wire a controller. No network calls yet.
pub fn open_connection(global_profile: Option<&str>) -> Result<Connection, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let gallery = resolve_gallery_config(&config, &profile_name)?;
    let controller = build_controller(&profile_name, &gallery)?;
    Ok(Connection {
        profile_name,
        controller,
    })
}

/// Like [`open_connection`], then resume the stored session.
///
/// A session that cannot be restored leaves the CLI signed out.
pub async fn connect(global_profile: Option<&str>) -> Result<Connection, CliError> {
    let connection = open_connection(global_profile)?;
    if let ActionOutcome::Failed(error) = connection.controller.restore().await {
        tracing::warn!(
            profile = %connection.profile_name,
            "Continuing without a session: {}",
            error
        );
    }
    Ok(connection)
}

pub fn build_controller(
    profile_name: &str,
    config: &GalleryConfig,
) -> Result<LiveController, CliError> {
    let auth = SupabaseAuthClient::from_config(config, SessionStore::new(profile_name))
        .map_err(|error| CliError::Auth(error.to_string()))?;
    let guard = SessionGuard::new(auth);
    let bearer = BearerSource::from_session(guard.subscribe());
    let repo = ArtworkRepository::new(
        SupabaseRecords::new(config)?,
        SupabaseObjects::new(config)?,
        bearer,
    )
    .with_timeout(config.request_timeout);

    Ok(AdminController::new(
        guard,
        repo,
        Notifier::new(config.notification_duration),
    ))
}

pub fn require_signed_in<P, S, O>(controller: &AdminController<P, S, O>) -> Result<(), CliError>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    controller
        .guard()
        .require_session()
        .map(|_| ())
        .map_err(|error| CliError::Core(error.into()))
}

/// Map an intermediate outcome to a result without printing anything.
pub fn proceed(outcome: ActionOutcome) -> Result<(), CliError> {
    match outcome {
        ActionOutcome::Completed => Ok(()),
        ActionOutcome::Ignored => Err(CliError::Busy),
        ActionOutcome::Failed(error) => Err(error.into()),
    }
}

/// Map the final outcome of a command, printing the notification it raised.
pub fn finish<P, S, O>(
    controller: &AdminController<P, S, O>,
    outcome: ActionOutcome,
) -> Result<(), CliError>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    proceed(outcome)?;
    if let Some(notification) = controller.notifier().current() {
        println!("{}", notification.message);
    }
    Ok(())
}

/// Copy the flags that were passed onto the form draft.
pub fn apply_fields(form: &mut ArtworkForm, fields: &ArtworkFields) {
    let targets = [
        (&mut form.title, &fields.title),
        (&mut form.medium, &fields.medium),
        (&mut form.year, &fields.year),
        (&mut form.price, &fields.price),
        (&mut form.description, &fields.description),
    ];
    for (target, value) in targets {
        if let Some(value) = value {
            target.clone_from(value);
        }
    }
}

pub fn normalize_artwork_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyArtworkId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Find an artwork by exact id, else by unique id prefix.
pub fn resolve_artwork(query: &str, artworks: &[Artwork]) -> Result<Artwork, CliError> {
    let query = normalize_artwork_identifier(query)?;
    if let Some(exact) = artworks.iter().find(|art| art.id.as_str() == query) {
        return Ok(exact.clone());
    }

    let matches = artworks
        .iter()
        .filter(|art| art.id.as_str().starts_with(&query))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(CliError::ArtworkNotFound(query)),
        [single] => Ok((*single).clone()),
        many => {
            let options = many
                .iter()
                .take(3)
                .map(|art| short_id(art.id.as_str()))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousArtworkId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &str) -> String {
    id.chars().take(SHORT_ID_LEN).collect()
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let mut truncated = collapsed
            .chars()
            .take(max_chars.saturating_sub(3))
            .collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

/// Admin listing: every artwork with its slot and visibility.
pub fn format_artwork_lines(artworks: &[Artwork]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    artworks
        .iter()
        .map(|art| {
            let id = short_id(art.id.as_str());
            let title = truncate(&art.title, 32);
            let caption = truncate(&art.card_caption(), 28);
            let added = format_relative_time(art.created_at.timestamp_millis(), now_ms);
            let visibility = if art.is_visible { "" } else { "  [hidden]" };
            format!(
                "{id:<8}  {:>3}  {title:<32}  {caption:<28}  {added}{visibility}",
                art.sort_order
            )
        })
        .collect()
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Ask a yes/no question; anything but `y`/`yes` declines.
pub fn confirm(prompt: &str, mut input: impl BufRead) -> io::Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Write to `path` (echoing it) or to stdout.
pub fn write_output(rendered: &[u8], path: Option<&Path>) -> Result<(), CliError> {
    if let Some(path) = path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        io::stdout().write_all(rendered)?;
    }
    Ok(())
}
