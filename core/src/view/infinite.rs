//! Infinite-scroll screen: accumulated pages behind a scrolling viewport.
//!
//! The sentinel sits just after the last loaded row. Whenever it is inside
//! the viewport, `poll` asks the store for the next page; the store ignores
//! the request when nothing is left or a fetch is already running.

use std::time::Instant;

use rand::Rng;

use super::edit::{EditField, EditSession};
use super::{render_error, render_header, render_row, ListActions, ViewError};
use crate::store::{Completion, Fetch, QueryState, UsersStore};
use crate::types::{UserId, UserQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub offset: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            offset: 0,
            height: height.max(1),
        }
    }

    /// Whether the position just past `len` rows is on screen.
    pub fn shows_end_of(&self, len: usize) -> bool {
        self.offset + self.height >= len
    }

    /// The viewport pulled back inside a list of `len` rows. The list can
    /// shrink under it when a reload replaces the accumulated pages.
    pub fn clamped(self, len: usize) -> Self {
        Self {
            offset: self.offset.min(len.saturating_sub(self.height)),
            ..self
        }
    }

    fn scroll_by(&mut self, delta: isize, len: usize) {
        let max_offset = len.saturating_sub(self.height);
        let offset = self.clamped(len).offset.saturating_add_signed(delta);
        self.offset = offset.min(max_offset);
    }
}

#[derive(Debug)]
pub struct InfiniteView {
    query: UserQuery,
    viewport: Viewport,
    actions: ListActions,
}

impl InfiniteView {
    pub fn new(viewport_height: usize) -> Self {
        Self {
            query: UserQuery::default(),
            viewport: Viewport::new(viewport_height),
            actions: ListActions::default(),
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn query(&self) -> &UserQuery {
        &self.query
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Load page 1 when the accumulated list is missing or stale.
    pub fn refresh(&self, store: &mut UsersStore) -> Option<Fetch> {
        store.read_infinite(&self.query)
    }

    pub fn set_keyword(&mut self, keyword: Option<String>) {
        self.query.keyword = keyword.filter(|k| !k.is_empty());
        self.viewport.offset = 0;
    }

    pub fn scroll_by(&mut self, delta: isize, store: &UsersStore) {
        self.viewport.scroll_by(delta, store.infinite().len());
    }

    pub fn sentinel_in_view(&self, store: &UsersStore) -> bool {
        let len = store.infinite().len();
        self.viewport.clamped(len).shows_end_of(len)
    }

    /// Fetch the next page if the sentinel is visible.
    pub fn poll(&self, store: &mut UsersStore) -> Option<Fetch> {
        if !self.sentinel_in_view(store) {
            return None;
        }
        store.fetch_next_page()
    }

    pub fn begin_edit(&mut self, store: &UsersStore, id: UserId) -> Result<(), ViewError> {
        let user = store
            .infinite()
            .items()
            .find(|user| user.id == id)
            .ok_or(ViewError::UnknownRow(id))?;
        self.actions.begin_edit(user);
        Ok(())
    }

    pub fn editing(&self) -> Option<&EditSession> {
        self.actions.editing()
    }

    pub fn edit(&mut self, field: EditField, value: impl Into<String>) -> Result<(), ViewError> {
        self.actions.edit(field, value)
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.actions.cancel_edit()
    }

    pub fn save(&mut self, store: &mut UsersStore) -> Result<Fetch, ViewError> {
        self.actions.save(store)
    }

    pub fn add_user<R: Rng + ?Sized>(
        &mut self,
        store: &mut UsersStore,
        rng: &mut R,
    ) -> Result<Fetch, ViewError> {
        self.actions.add_user(store, rng)
    }

    pub fn delete_user(&mut self, store: &mut UsersStore, id: UserId) -> Fetch {
        self.actions.delete_user(store, id)
    }

    pub fn on_completion(&mut self, completion: &Completion, now: Instant) {
        self.actions.on_completion(completion, now);
    }

    /// Expire the notice; true when the screen needs a redraw.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.actions.tick(now)
    }

    pub fn actions(&self) -> &ListActions {
        &self.actions
    }

    pub fn render(&self, store: &UsersStore, now: Instant) -> String {
        let list = match store.infinite().state() {
            QueryState::Loading => return "  ... loading users\n".to_string(),
            QueryState::Failed(error) => return render_error(error),
            QueryState::Ready(list) => list,
        };

        let len = list.len();
        let viewport = self.viewport.clamped(len);
        let mut out = String::from("User List\n\n");
        render_header(&mut out);
        for user in list.items().skip(viewport.offset).take(viewport.height) {
            render_row(&mut out, user, self.actions.editing());
        }

        let last = (viewport.offset + viewport.height).min(len);
        out.push_str(&format!(
            "\n  rows {}-{last} of {len} loaded\n",
            if len == 0 { 0 } else { viewport.offset + 1 },
        ));
        if list.is_fetching_next_page() {
            out.push_str("  ... loading more\n");
        }
        if !list.has_next_page() {
            out.push_str("  No more users\n");
        }
        self.actions.render_notice(&mut out, now);
        out
    }
}
