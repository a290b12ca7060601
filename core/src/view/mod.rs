//! Headless view models for the two list screens.
//!
//! # Design
//! A view owns only UI state (page position, viewport, the row being
//! edited, the current notice). Server data is read from the
//! [`UsersStore`] at render time, and every user action that needs the
//! network returns the [`Fetch`] for the host to execute. Rendering
//! produces plain text so any terminal or test can display it.
//!
//! Both screens share the row affordances in [`ListActions`]: one row in
//! edit mode at a time, add, delete, and a success notice.

pub mod edit;
pub mod infinite;
pub mod notice;
pub mod paginated;
pub mod placeholder;

use std::time::Instant;

use rand::Rng;
use thiserror::Error;

use crate::error::ApiError;
use crate::store::{Completion, Fetch, UsersStore};
use crate::types::{User, UserId};

use edit::{EditField, EditSession};
use notice::{announcement, Notice};

pub use infinite::{InfiniteView, Viewport};
pub use paginated::PaginatedView;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("no row is being edited")]
    NotEditing,

    #[error("user {0} is not on screen")]
    UnknownRow(UserId),

    #[error("unsupported page size {0}")]
    UnsupportedPageSize(u32),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Default)]
pub struct ListActions {
    edit: Option<EditSession>,
    notice: Notice,
}

impl ListActions {
    /// Replaces any edit already in progress.
    pub fn begin_edit(&mut self, user: &User) {
        if let Some(previous) = &self.edit {
            tracing::debug!(previous = previous.id(), next = user.id, "switching edit target");
        }
        self.edit = Some(EditSession::begin(user));
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.edit.as_ref()
    }

    pub fn edit(&mut self, field: EditField, value: impl Into<String>) -> Result<(), ViewError> {
        let session = self.edit.as_mut().ok_or(ViewError::NotEditing)?;
        session.set(field, value);
        Ok(())
    }

    /// Drop local edits. Returns whether a row was being edited.
    pub fn cancel_edit(&mut self) -> bool {
        self.edit.take().is_some()
    }

    /// Issue an update with the edited record and leave edit mode.
    pub fn save(&mut self, store: &mut UsersStore) -> Result<Fetch, ViewError> {
        let session = self.edit.take().ok_or(ViewError::NotEditing)?;
        match store.update_user(&session.to_user(), None) {
            Ok(fetch) => Ok(fetch),
            Err(error) => {
                self.edit = Some(session);
                Err(error.into())
            }
        }
    }

    pub fn add_user<R: Rng + ?Sized>(
        &mut self,
        store: &mut UsersStore,
        rng: &mut R,
    ) -> Result<Fetch, ViewError> {
        let payload = placeholder::placeholder_user(rng);
        Ok(store.create_user(&payload, None)?)
    }

    pub fn delete_user(&mut self, store: &mut UsersStore, id: UserId) -> Fetch {
        store.delete_user(id, None)
    }

    pub fn on_completion(&mut self, completion: &Completion, now: Instant) {
        if let Some(message) = announcement(completion) {
            self.notice.show(message, now);
        }
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.notice.expire(now)
    }

    pub fn notice(&self) -> &Notice {
        &self.notice
    }

    fn render_notice(&self, out: &mut String, now: Instant) {
        if let Some(message) = self.notice.message(now) {
            out.push_str(&format!("\n  ✔ {message}\n"));
        }
    }
}

const HEADER: [&str; 5] = ["Id", "Name", "Email", "City", "Role"];

fn render_header(out: &mut String) {
    out.push_str(&format!(
        "{:>5}  {:<20} {:<28} {:<12} {:<8}\n",
        HEADER[0], HEADER[1], HEADER[2], HEADER[3], HEADER[4]
    ));
}

/// One table row; the row under edit shows its scratch values in brackets.
fn render_row(out: &mut String, user: &User, editing: Option<&EditSession>) {
    match editing.filter(|session| session.id() == user.id) {
        Some(session) => out.push_str(&format!(
            "{:>5}  [{:<18}] [{:<26}] [{:<10}] [{:<6}]  (save | cancel)\n",
            user.id,
            session.value(EditField::Name),
            session.value(EditField::Email),
            session.value(EditField::City),
            session.value(EditField::Role),
        )),
        None => out.push_str(&format!(
            "{:>5}  {:<20} {:<28} {:<12} {:<8}\n",
            user.id,
            user.name,
            user.email,
            user.city.name(),
            user.role
        )),
    }
}

fn render_error(error: &ApiError) -> String {
    format!("Error: {error}\n")
}
