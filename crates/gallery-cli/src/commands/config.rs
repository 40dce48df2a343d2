use std::env;

use crate::cli::ConfigCommands;
use crate::config_profiles::{normalize_text_option, CliProfile, CliProfilesConfig};
use crate::error::CliError;

/// Values passed to `config init`; unset ones fall back to env then to the stored profile.
#[derive(Debug, Default, Clone)]
pub struct ProfileInit {
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub storage_bucket: Option<String>,
    pub table: Option<String>,
}

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            supabase_url,
            supabase_anon_key,
            storage_bucket,
            table,
            no_activate,
        } => {
            let init = ProfileInit {
                supabase_url,
                supabase_anon_key,
                storage_bucket,
                table,
            };
            let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
            let profile_name = config.resolve_profile_name(global_profile);
            let profile = init_profile(&mut config, &profile_name, init, no_activate)?;
            let path = config.save().map_err(CliError::Config)?;
            println!(
                "Profile '{}' initialized at {}",
                profile_name,
                path.display()
            );

            let missing = profile.missing_fields();
            if missing.is_empty() {
                println!(
                    "Profile '{profile_name}' is ready. \
                     Run `gallery auth login --email <email>` to manage artworks."
                );
            } else {
                println!(
                    "Profile '{}' is missing: {}",
                    profile_name,
                    missing.join(", ")
                );
            }
            Ok(())
        }
    }
}

/// Merge `init` into the named profile and return the result.
pub fn init_profile(
    config: &mut CliProfilesConfig,
    profile_name: &str,
    init: ProfileInit,
    no_activate: bool,
) -> Result<CliProfile, CliError> {
    let existing = config.profile(profile_name).cloned().unwrap_or_default();

    let merged = CliProfile {
        supabase_url: normalize_text_option(init.supabase_url)
            .or_else(|| normalize_text_option(env::var("SUPABASE_URL").ok()))
            .or_else(|| existing.supabase_url()),
        supabase_anon_key: normalize_text_option(init.supabase_anon_key)
            .or_else(|| normalize_text_option(env::var("SUPABASE_ANON_KEY").ok()))
            .or_else(|| existing.supabase_anon_key()),
        storage_bucket: normalize_text_option(init.storage_bucket)
            .or_else(|| normalize_text_option(env::var("GALLERY_STORAGE_BUCKET").ok()))
            .or(existing.storage_bucket),
        table: normalize_text_option(init.table)
            .or_else(|| normalize_text_option(env::var("GALLERY_TABLE").ok()))
            .or(existing.table),
    };

    // Rejects malformed URLs before anything is written.
    merged.gallery_config()?;

    *config.profile_mut_or_default(profile_name) = merged.clone();
    if !no_activate {
        config.active_profile = Some(profile_name.to_string());
    }
    Ok(merged)
}
