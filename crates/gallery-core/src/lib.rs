//! gallery-core - Core library for the artist portfolio gallery
//!
//! This crate contains the artwork models, hosted-backend clients, and the
//! workflow logic shared by every gallery front end: the public carousel and
//! the authenticated admin.

pub mod admin;
pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod export;
pub mod gallery;
pub mod ingest;
pub mod models;
pub mod notify;
pub mod repository;
pub mod util;

pub use admin::{ActionOutcome, AdminController, AdminState, AdminView};
pub use auth::{AuthError, AuthSession, SessionGuard};
pub use config::GalleryConfig;
pub use error::{Error, Result};
pub use models::{Artwork, ArtworkId, ArtworkPatch, NewArtwork, Orientation};
pub use notify::{Notification, Notifier};
pub use repository::ArtworkRepository;
