//! Table screen with explicit page controls.

use std::time::Instant;

use rand::Rng;

use super::edit::{EditField, EditSession};
use super::{render_error, render_header, render_row, ListActions, ViewError};
use crate::pagination::{is_page_size_option, DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
use crate::store::{Completion, Fetch, QueryState, UsersStore};
use crate::types::{User, UserId, UserQuery};

#[derive(Debug)]
pub struct PaginatedView {
    /// 0-based; the request carries `page_index + 1`.
    page_index: u32,
    rows_per_page: u32,
    keyword: Option<String>,
    actions: ListActions,
}

impl Default for PaginatedView {
    fn default() -> Self {
        Self::new()
    }
}

impl PaginatedView {
    pub fn new() -> Self {
        Self {
            page_index: 0,
            rows_per_page: DEFAULT_PAGE_SIZE,
            keyword: None,
            actions: ListActions::default(),
        }
    }

    pub fn query(&self) -> UserQuery {
        UserQuery {
            page: Some(self.page_index + 1),
            limit: Some(self.rows_per_page),
            keyword: self.keyword.clone(),
        }
    }

    /// Read the current page, fetching it if the cache cannot serve it.
    pub fn refresh(&mut self, store: &mut UsersStore) -> Option<Fetch> {
        self.clamp_to_last_page(store);
        store.list_page(&self.query())
    }

    /// A page emptied by deletes falls back to the last page the server
    /// still reports.
    fn clamp_to_last_page(&mut self, store: &UsersStore) {
        if self.page_index == 0 || store.is_page_fetching(&self.query()) {
            return;
        }
        if let QueryState::Ready(list) = store.page(&self.query()) {
            if list.results.is_empty() {
                self.page_index = list.meta.total_pages.saturating_sub(1);
            }
        }
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn rows_per_page(&self) -> u32 {
        self.rows_per_page
    }

    pub fn set_page(&mut self, page_index: u32) {
        self.page_index = page_index;
    }

    /// Advance unless the current page is the last one the server reported.
    pub fn next_page(&mut self, store: &UsersStore) -> bool {
        let QueryState::Ready(list) = store.page(&self.query()) else {
            return false;
        };
        if self.page_index + 1 >= list.meta.total_pages {
            return false;
        }
        self.page_index += 1;
        true
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page_index == 0 {
            return false;
        }
        self.page_index -= 1;
        true
    }

    /// Changing the page size goes back to the first page.
    pub fn set_rows_per_page(&mut self, rows: u32) -> Result<(), ViewError> {
        if !is_page_size_option(rows) {
            return Err(ViewError::UnsupportedPageSize(rows));
        }
        self.rows_per_page = rows;
        self.page_index = 0;
        Ok(())
    }

    pub fn set_keyword(&mut self, keyword: Option<String>) {
        self.keyword = keyword.filter(|k| !k.is_empty());
        self.page_index = 0;
    }

    pub fn rows<'a>(&self, store: &'a UsersStore) -> &'a [User] {
        match store.page(&self.query()) {
            QueryState::Ready(list) => &list.results,
            _ => &[],
        }
    }

    pub fn begin_edit(&mut self, store: &UsersStore, id: UserId) -> Result<(), ViewError> {
        let user = self
            .rows(store)
            .iter()
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
        let list = match store.page(&self.query()) {
            QueryState::Loading => return "  ... loading users\n".to_string(),
            QueryState::Failed(error) => return render_error(error),
            QueryState::Ready(list) => list,
        };

        let mut out = String::from("User List\n\n");
        render_header(&mut out);
        for user in &list.results {
            render_row(&mut out, user, self.actions.editing());
        }
        if list.results.is_empty() {
            out.push_str("  (no users)\n");
        }

        let total = list.meta.total_count;
        let first = u64::from(self.page_index) * u64::from(self.rows_per_page);
        let shown = if list.results.is_empty() {
            format!("0 of {total}")
        } else {
            format!("{}-{} of {total}", first + 1, first + list.results.len() as u64)
        };
        out.push_str(&format!(
            "\nRows per page: {} {:?}   {shown}   page {}/{}\n",
            self.rows_per_page,
            PAGE_SIZE_OPTIONS,
            self.page_index + 1,
            list.meta.total_pages.max(1),
        ));
        self.actions.render_notice(&mut out, now);
        out
    }
}
