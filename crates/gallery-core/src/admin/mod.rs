//! Admin workflow controller.
//!
//! Owns the admin form state machine (`Idle`, `Editing`, `Submitting`) and
//! turns every backend failure into a notification plus a state reversion.
//! Actions never return `Err`; they report an [`ActionOutcome`].

mod form;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::auth::{AuthProvider, SessionGuard};
use crate::backend::{ArtworkStore, ObjectStore};
use crate::ingest::LocalImage;
use crate::models::{Artwork, ArtworkId, ArtworkPatch};
use crate::notify::Notifier;
use crate::repository::ArtworkRepository;
use crate::Error;

pub use form::{ArtworkForm, FormPreview, LoginForm, MISSING_IMAGE_MESSAGE};

pub const WELCOME_MESSAGE: &str = "Welcome back ✦";
pub const CREATED_MESSAGE: &str = "✦ Artwork added to gallery";
pub const UPDATED_MESSAGE: &str = "✦ Artwork updated";
pub const REMOVED_MESSAGE: &str = "Artwork removed";
pub const HIDDEN_MESSAGE: &str = "Hidden from gallery";
pub const SHOWN_MESSAGE: &str = "Now visible in gallery";

/// Which screen the admin route renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminView {
    Login,
    Dashboard,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AdminState {
    #[default]
    Idle,
    Editing(ArtworkId),
    /// A form submission is in flight. `resume` is the editing target to
    /// return to on failure.
    Submitting { resume: Option<ArtworkId> },
}

impl AdminState {
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting { .. })
    }

    #[must_use]
    pub const fn editing_id(&self) -> Option<&ArtworkId> {
        match self {
            Self::Editing(id) => Some(id),
            Self::Idle | Self::Submitting { .. } => None,
        }
    }

    fn resume(resume: Option<ArtworkId>) -> Self {
        resume.map_or(Self::Idle, Self::Editing)
    }
}

/// Result of a controller action.
#[derive(Debug)]
pub enum ActionOutcome {
    Completed,
    /// The action was not allowed in the current state and did nothing.
    Ignored,
    /// The action failed; a notification has been published.
    Failed(Error),
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    #[must_use]
    pub const fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }

    #[must_use]
    pub const fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Completed | Self::Ignored => None,
        }
    }
}

#[derive(Default)]
struct AdminInner {
    state: AdminState,
    form: ArtworkForm,
    login: LoginForm,
    artworks: Vec<Artwork>,
}

enum Submission {
    Create,
    Update(ArtworkId),
}

pub struct AdminController<P, S, O> {
    guard: SessionGuard<P>,
    repo: ArtworkRepository<S, O>,
    notifier: Notifier,
    inner: Mutex<AdminInner>,
}

impl<P, S, O> AdminController<P, S, O>
where
    P: AuthProvider,
    S: ArtworkStore,
    O: ObjectStore,
{
    pub fn new(guard: SessionGuard<P>, repo: ArtworkRepository<S, O>, notifier: Notifier) -> Self {
        Self {
            guard,
            repo,
            notifier,
            inner: Mutex::new(AdminInner::default()),
        }
    }

    pub const fn guard(&self) -> &SessionGuard<P> {
        &self.guard
    }

    pub const fn repository(&self) -> &ArtworkRepository<S, O> {
        &self.repo
    }

    pub const fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn view(&self) -> AdminView {
        if self.guard.is_signed_in() {
            AdminView::Dashboard
        } else {
            AdminView::Login
        }
    }

    pub fn state(&self) -> AdminState {
        self.lock().state.clone()
    }

    pub fn form(&self) -> ArtworkForm {
        self.lock().form.clone()
    }

    pub fn login_form(&self) -> LoginForm {
        self.lock().login.clone()
    }

    /// The collection as of the last refresh.
    pub fn artworks(&self) -> Vec<Artwork> {
        self.lock().artworks.clone()
    }

    /// Edit the draft in place. Disabled while submitting.
    pub fn edit_form(&self, edit: impl FnOnce(&mut ArtworkForm)) -> ActionOutcome {
        let mut inner = self.lock();
        if inner.state.is_submitting() {
            return ActionOutcome::Ignored;
        }
        edit(&mut inner.form);
        ActionOutcome::Completed
    }

    pub fn stage_file(&self, image: LocalImage) -> ActionOutcome {
        self.edit_form(|form| form.stage_file(image))
    }

    /// Resume a persisted session and load the collection when signed in.
    pub async fn restore(&self) -> ActionOutcome {
        match self.guard.restore().await {
            Ok(Some(_)) => self.refresh().await,
            Ok(None) => ActionOutcome::Completed,
            Err(error) => {
                tracing::warn!("Failed to restore session: {}", error);
                ActionOutcome::Failed(error.into())
            }
        }
    }

    /// Submit the login form. Errors stay inline on the form.
    pub async fn sign_in(&self, email: &str, password: &str) -> ActionOutcome {
        {
            let mut inner = self.lock();
            inner.login.email = email.to_string();
            inner.login.error = None;
        }

        match self.guard.sign_in(email, password).await {
            Ok(_) => {
                self.notifier.success(WELCOME_MESSAGE);
                self.refresh().await
            }
            Err(error) => {
                self.lock().login.error = Some(error.to_string());
                ActionOutcome::Failed(error.into())
            }
        }
    }

    /// Sign out and drop everything tied to the session.
    pub async fn sign_out(&self) -> ActionOutcome {
        let remote = self.guard.sign_out().await;
        *self.lock() = AdminInner::default();
        match remote {
            Ok(()) => ActionOutcome::Completed,
            Err(error) => self.fail(error.into()),
        }
    }

    /// Replace the collection with the backend's current listing.
    pub async fn refresh(&self) -> ActionOutcome {
        self.revalidate_session().await;
        match self.repo.list_all().await {
            Ok(artworks) => {
                self.lock().artworks = artworks;
                ActionOutcome::Completed
            }
            Err(error) => {
                tracing::error!("Failed to load artworks: {}", error);
                ActionOutcome::Failed(error)
            }
        }
    }

    /// Load `artwork` into the form for editing.
    pub fn select_for_edit(&self, artwork: &Artwork) -> ActionOutcome {
        let preview_url = self.repo.resolve_image_url(&artwork.image_path);
        {
            let mut inner = self.lock();
            if inner.state.is_submitting() {
                return ActionOutcome::Ignored;
            }
            inner.state = AdminState::Editing(artwork.id.clone());
            inner.form = ArtworkForm::from_artwork(artwork, preview_url);
        }
        self.notifier.info(format!("Editing: {}", artwork.title));
        ActionOutcome::Completed
    }

    pub fn cancel_edit(&self) -> ActionOutcome {
        let mut inner = self.lock();
        if inner.state.is_submitting() {
            return ActionOutcome::Ignored;
        }
        inner.state = AdminState::Idle;
        inner.form.clear();
        ActionOutcome::Completed
    }

    /// Submit the form: create from `Idle`, update from `Editing`.
    pub async fn submit(&self) -> ActionOutcome {
        self.revalidate_session().await;
        let (submission, form) = {
            let mut inner = self.lock();
            let submission = match &inner.state {
                AdminState::Submitting { .. } => return ActionOutcome::Ignored,
                AdminState::Idle => Submission::Create,
                AdminState::Editing(id) => Submission::Update(id.clone()),
            };

            if let Err(error) = self.guard.require_session() {
                drop(inner);
                return self.fail(error.into());
            }

            let validation = match &submission {
                Submission::Create => inner.form.validate_for_create(),
                Submission::Update(_) => inner.form.require_title(),
            };
            if let Err(error) = validation {
                drop(inner);
                return self.fail(error);
            }

            let resume = match &submission {
                Submission::Create => None,
                Submission::Update(id) => Some(id.clone()),
            };
            inner.state = AdminState::Submitting { resume };
            (submission, inner.form.clone())
        };

        let result = match &submission {
            Submission::Create => self.run_create(&form).await,
            Submission::Update(id) => self.run_update(id, &form).await,
        };

        match result {
            Ok(message) => {
                {
                    let mut inner = self.lock();
                    inner.state = AdminState::Idle;
                    inner.form.clear();
                }
                self.refresh().await;
                self.notifier.success(message);
                if let Some(warning) = self.release_superseded(&submission, &form).await {
                    self.notifier.error(warning);
                }
                ActionOutcome::Completed
            }
            Err(error) => {
                let resume = match submission {
                    Submission::Create => None,
                    Submission::Update(id) => Some(id),
                };
                self.lock().state = AdminState::resume(resume);
                if error.is_not_found() {
                    self.refresh().await;
                }
                self.fail(error)
            }
        }
    }

    /// Remove an artwork and its image. Not available while submitting.
    pub async fn delete(&self, id: &ArtworkId) -> ActionOutcome {
        if let Some(outcome) = self.one_shot_gate().await {
            return outcome;
        }

        match self.repo.delete(id).await {
            Ok(_) => {
                {
                    let mut inner = self.lock();
                    if inner.state.editing_id() == Some(id) {
                        inner.state = AdminState::Idle;
                        inner.form.clear();
                    }
                }
                self.refresh().await;
                self.notifier.success(REMOVED_MESSAGE);
                ActionOutcome::Completed
            }
            Err(error) => self.fail_and_reconcile(error).await,
        }
    }

    /// Flip `is_visible`. Not available while submitting.
    pub async fn toggle_visibility(&self, id: &ArtworkId) -> ActionOutcome {
        if let Some(outcome) = self.one_shot_gate().await {
            return outcome;
        }

        let was_visible = match self.visibility_of(id).await {
            Ok(visible) => visible,
            Err(error) => return self.fail_and_reconcile(error).await,
        };

        match self
            .repo
            .update(id, ArtworkPatch::visibility(!was_visible))
            .await
        {
            Ok(_) => {
                self.refresh().await;
                self.notifier.success(if was_visible {
                    HIDDEN_MESSAGE
                } else {
                    SHOWN_MESSAGE
                });
                ActionOutcome::Completed
            }
            Err(error) => self.fail_and_reconcile(error).await,
        }
    }

    /// Move an artwork to a manual sort slot. Not available while submitting.
    pub async fn set_sort_order(&self, id: &ArtworkId, sort_order: i32) -> ActionOutcome {
        if let Some(outcome) = self.one_shot_gate().await {
            return outcome;
        }

        match self.repo.update(id, ArtworkPatch::sort_order(sort_order)).await {
            Ok(_) => {
                self.refresh().await;
                self.notifier.success(UPDATED_MESSAGE);
                ActionOutcome::Completed
            }
            Err(error) => self.fail_and_reconcile(error).await,
        }
    }

    async fn run_create(&self, form: &ArtworkForm) -> crate::Result<&'static str> {
        let Some(file) = &form.staged_file else {
            return Err(Error::Validation(MISSING_IMAGE_MESSAGE.to_string()));
        };
        let staged = self.repo.images().stage_upload(file).await?;
        let path = staged.path.clone();

        if let Err(error) = self.repo.create(form.to_new_artwork(staged)).await {
            self.discard_upload(&path).await;
            return Err(error);
        }
        Ok(CREATED_MESSAGE)
    }

    async fn run_update(&self, id: &ArtworkId, form: &ArtworkForm) -> crate::Result<&'static str> {
        let mut patch = form.to_patch();
        let mut fresh_upload = None;
        if let Some(file) = &form.staged_file {
            let staged = self.repo.images().stage_upload(file).await?;
            fresh_upload = Some(staged.path.clone());
            patch = patch.with_image(staged);
        }

        if let Err(error) = self.repo.update(id, patch).await {
            if let Some(path) = fresh_upload {
                self.discard_upload(&path).await;
            }
            return Err(error);
        }
        Ok(UPDATED_MESSAGE)
    }

    /// After an image replacement, release the image the record no longer
    /// references. Returns a warning for the user when that fails.
    async fn release_superseded(
        &self,
        submission: &Submission,
        form: &ArtworkForm,
    ) -> Option<String> {
        let Submission::Update(id) = submission else {
            return None;
        };
        form.staged_file.as_ref()?;
        let previous = form.current_image_path.as_deref()?;

        match self.repo.images().release(previous).await {
            Ok(()) => None,
            Err(error) => {
                tracing::warn!(%id, path = previous, "Failed to release replaced image: {}", error);
                Some(format!(
                    "Error: previous image could not be removed: {error}"
                ))
            }
        }
    }

    async fn discard_upload(&self, path: &str) {
        if let Err(error) = self.repo.images().release(path).await {
            tracing::warn!(path, "Failed to release orphaned upload: {}", error);
        }
    }

    async fn visibility_of(&self, id: &ArtworkId) -> crate::Result<bool> {
        let cached = self
            .lock()
            .artworks
            .iter()
            .find(|art| &art.id == id)
            .map(|art| art.is_visible);
        if let Some(visible) = cached {
            return Ok(visible);
        }
        self.repo
            .get(id)
            .await?
            .map(|art| art.is_visible)
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn one_shot_gate(&self) -> Option<ActionOutcome> {
        let submitting = self.lock().state.is_submitting();
        if submitting {
            return Some(ActionOutcome::Ignored);
        }
        self.revalidate_session().await;
        if let Err(error) = self.guard.require_session() {
            return Some(self.fail(error.into()));
        }
        None
    }

    /// Refresh a session that expired since the last action. When that is
    /// not possible the guard publishes the sign-out and the dashboard state
    /// is dropped, unless a submission still owns it.
    async fn revalidate_session(&self) {
        if !self.guard.holds_session() || self.guard.expire_if_stale().await.is_some() {
            return;
        }
        let mut inner = self.lock();
        if !inner.state.is_submitting() {
            *inner = AdminInner::default();
        }
    }

    async fn fail_and_reconcile(&self, error: Error) -> ActionOutcome {
        if error.is_not_found() {
            self.refresh().await;
        }
        self.fail(error)
    }

    fn fail(&self, error: Error) -> ActionOutcome {
        let message = match &error {
            Error::Validation(message) => message.clone(),
            other => format!("Error: {other}"),
        };
        self.notifier.error(message);
        ActionOutcome::Failed(error)
    }

    fn lock(&self) -> MutexGuard<'_, AdminInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
