use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "gallery")]
#[command(about = "Browse and manage the artist portfolio gallery")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// CLI profile name holding backend settings and the stored session
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List artworks in display order
    #[command(alias = "ls")]
    List {
        /// Include hidden artworks (requires sign in)
        #[arg(long)]
        all: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one artwork the way the lightbox does
    Show {
        /// Artwork ID or unique ID prefix
        id: String,
    },
    /// Upload an image and create an artwork
    #[command(alias = "new")]
    Add {
        /// Image file to upload
        file: PathBuf,
        #[command(flatten)]
        fields: ArtworkFields,
    },
    /// Edit an existing artwork
    Edit {
        /// Artwork ID or unique ID prefix
        id: String,
        /// Replacement image file
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
        #[command(flatten)]
        fields: ArtworkFields,
        /// Manual display position (lower comes first)
        #[arg(long, value_name = "N", allow_negative_numbers = true)]
        sort_order: Option<i32>,
    },
    /// Show or hide an artwork on the public gallery
    Toggle {
        /// Artwork ID or unique ID prefix
        id: String,
    },
    /// Delete an artwork and its stored image
    Delete {
        /// Artwork ID or unique ID prefix
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Print the public URL of a stored image path
    Url {
        /// Storage path, e.g. scans/1700000000000-abc.jpg
        path: String,
    },
    /// Export the catalog
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Sign the admin in or out
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
}

/// Text fields shared by `add` and `edit`. An empty value clears the field on edit.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ArtworkFields {
    /// Artwork title
    #[arg(long)]
    pub title: Option<String>,
    /// Medium, e.g. "Oil on canvas"
    #[arg(long)]
    pub medium: Option<String>,
    /// Year as free text
    #[arg(long)]
    pub year: Option<String>,
    /// Price as free text, e.g. "$450"
    #[arg(long)]
    pub price: Option<String>,
    /// Longer description shown in the lightbox
    #[arg(long)]
    pub description: Option<String>,
}

impl ArtworkFields {
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.medium.is_none()
            && self.year.is_none()
            && self.price.is_none()
            && self.description.is_none()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl From<ExportFormat> for gallery_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Supabase project URL
        #[arg(long, value_name = "URL")]
        supabase_url: Option<String>,
        /// Supabase anon/public key
        #[arg(long, value_name = "KEY")]
        supabase_anon_key: Option<String>,
        /// Storage bucket holding artwork scans
        #[arg(long, value_name = "NAME")]
        storage_bucket: Option<String>,
        /// Table holding artwork records
        #[arg(long, value_name = "NAME")]
        table: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email/password and store the session in the keychain
    Login {
        /// Admin account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Admin account password
        #[arg(long, value_name = "PASSWORD", env = "GALLERY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Show whether the profile is signed in
    Status,
    /// Sign out and clear the stored session
    Logout,
}
