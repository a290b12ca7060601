//! Data-access layer: list, create, update and delete over a query cache.
//!
//! # Design
//! The store never performs I/O. Every operation that needs the network
//! hands back a [`Fetch`] (a ticket plus the `HttpRequest` to execute); the
//! host runs the round trip and reports the outcome through
//! [`UsersStore::complete`], which updates the cache and returns a
//! [`Completion`] describing what changed. Reading state never issues
//! requests by itself; hosts call `list_page` / `read_infinite` on every
//! render pass and execute whatever comes back.
//!
//! Two list modes share the `users` key namespace:
//! - page mode caches one `ListResponse` per `(page, limit, keyword)`;
//! - infinite mode accumulates pages 1..n for a base query and walks the
//!   pagination metadata to find the next page.
//!
//! A successful mutation invalidates everything under `users`.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::cache::{Lookup, QueryCache, QueryKey};
use crate::client::UserClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::pagination::{has_next_page, next_page_param};
use crate::types::{ListResponse, User, UserId, UserPayload, UserQuery};

const USERS: &str = "users";

/// Identifies one issued request until its outcome is reported back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request the host must execute, tagged with the ticket to complete it.
#[derive(Debug, Clone)]
pub struct Fetch {
    pub ticket: Ticket,
    pub request: HttpRequest,
}

/// What a reader sees for one query.
#[derive(Debug, PartialEq)]
pub enum QueryState<'a, T: ?Sized> {
    Loading,
    Failed(&'a ApiError),
    Ready(&'a T),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MutationState {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed(ApiError),
}

/// The server-confirmed result of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutated {
    Created(User),
    Updated(User),
    Deleted(UserId),
}

impl Mutated {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutated::Created(_) => MutationKind::Create,
            Mutated::Updated(_) => MutationKind::Update,
            Mutated::Deleted(_) => MutationKind::Delete,
        }
    }
}

/// Caller-supplied hook run once a mutation succeeds, after invalidation.
pub type OnSuccess = Box<dyn FnOnce(&Mutated)>;

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    PageLoaded(QueryKey),
    PageFailed { key: QueryKey, error: ApiError },
    InfiniteLoaded { page: u32 },
    InfiniteFailed(ApiError),
    Mutated(Mutated),
    MutationFailed { kind: MutationKind, error: ApiError },
    /// Unknown ticket, or a response for a superseded infinite list.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfiniteFetch {
    First,
    Next,
}

enum Pending {
    Page(QueryKey),
    Infinite {
        generation: u64,
        kind: InfiniteFetch,
        page: u32,
    },
    Create(Option<OnSuccess>),
    Update(Option<OnSuccess>),
    Delete(UserId, Option<OnSuccess>),
}

/// Pages 1..n of one base query, accumulated in order.
#[derive(Debug, Default)]
pub struct InfiniteList {
    query: Option<UserQuery>,
    pages: Vec<ListResponse<User>>,
    error: Option<ApiError>,
    stale: bool,
    in_flight: Option<InfiniteFetch>,
    generation: u64,
}

impl InfiniteList {
    pub fn pages(&self) -> &[ListResponse<User>] {
        &self.pages
    }

    pub fn items(&self) -> impl Iterator<Item = &User> {
        self.pages.iter().flat_map(|page| page.results.iter())
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(|page| page.results.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_next_page(&self) -> bool {
        self.pages.last().is_some_and(|page| has_next_page(&page.meta))
    }

    pub fn next_page_param(&self) -> Option<u32> {
        self.pages.last().and_then(|page| next_page_param(&page.meta))
    }

    pub fn is_fetching_next_page(&self) -> bool {
        self.in_flight == Some(InfiniteFetch::Next)
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn state(&self) -> QueryState<'_, Self> {
        if let Some(error) = &self.error {
            return QueryState::Failed(error);
        }
        if self.pages.is_empty() {
            return QueryState::Loading;
        }
        QueryState::Ready(self)
    }

    fn reset(&mut self, query: UserQuery) {
        self.query = Some(query);
        self.pages.clear();
        self.error = None;
        self.stale = false;
        self.in_flight = None;
        self.generation += 1;
    }
}

pub struct UsersStore {
    client: UserClient,
    next_ticket: u64,
    pending: HashMap<Ticket, Pending>,
    pages: QueryCache<ListResponse<User>>,
    page_errors: HashMap<QueryKey, ApiError>,
    pages_in_flight: HashSet<QueryKey>,
    infinite: InfiniteList,
    create: MutationState,
    update: MutationState,
    delete: MutationState,
}

impl UsersStore {
    pub fn new(client: UserClient) -> Self {
        Self {
            client,
            next_ticket: 0,
            pending: HashMap::new(),
            pages: QueryCache::new(),
            page_errors: HashMap::new(),
            pages_in_flight: HashSet::new(),
            infinite: InfiniteList::default(),
            create: MutationState::Idle,
            update: MutationState::Idle,
            delete: MutationState::Idle,
        }
    }

    pub fn page_key(query: &UserQuery) -> QueryKey {
        let mut key = QueryKey::new(USERS).segment("page");
        if let Some(page) = query.page {
            key = key.with("page", page);
        }
        if let Some(limit) = query.limit {
            key = key.with("limit", limit);
        }
        if let Some(keyword) = &query.keyword {
            key = key.with("keyword", keyword);
        }
        key
    }

    // ---------------------------------------------------------------------
    // Page mode
    // ---------------------------------------------------------------------

    /// Request `query` unless it is cached fresh, already in flight, or its
    /// last attempt failed and nothing has invalidated it since.
    pub fn list_page(&mut self, query: &UserQuery) -> Option<Fetch> {
        let key = Self::page_key(query);
        if self.pages_in_flight.contains(&key) || self.page_errors.contains_key(&key) {
            return None;
        }
        if let Lookup::Fresh(_) = self.pages.lookup(&key) {
            return None;
        }
        let request = self.client.build_list_users(query);
        self.pages_in_flight.insert(key.clone());
        Some(self.issue(Pending::Page(key), request))
    }

    pub fn page(&self, query: &UserQuery) -> QueryState<'_, ListResponse<User>> {
        let key = Self::page_key(query);
        if let Some(error) = self.page_errors.get(&key) {
            return QueryState::Failed(error);
        }
        match self.pages.lookup(&key).value() {
            Some(list) => QueryState::Ready(list),
            None => QueryState::Loading,
        }
    }

    pub fn is_page_fetching(&self, query: &UserQuery) -> bool {
        self.pages_in_flight.contains(&Self::page_key(query))
    }

    // ---------------------------------------------------------------------
    // Infinite mode
    // ---------------------------------------------------------------------

    /// Load page 1 of `query` when nothing is loaded yet, the accumulated
    /// list was invalidated, or the base query changed. `query.page` is
    /// ignored.
    pub fn read_infinite(&mut self, query: &UserQuery) -> Option<Fetch> {
        let base = UserQuery {
            page: None,
            ..query.clone()
        };
        if self.infinite.query.as_ref() != Some(&base) {
            self.infinite.reset(base.clone());
        }

        let list = &mut self.infinite;
        if list.in_flight == Some(InfiniteFetch::First) {
            return None;
        }
        let unloaded = list.pages.is_empty() && list.error.is_none();
        if !list.stale && !unloaded {
            return None;
        }
        if list.in_flight.is_some() {
            // A next-page response would land on the list being replaced.
            list.generation += 1;
        }
        list.in_flight = Some(InfiniteFetch::First);
        let pending = Pending::Infinite {
            generation: list.generation,
            kind: InfiniteFetch::First,
            page: 1,
        };
        let request = self.client.build_list_users(&base.with_page(1));
        Some(self.issue(pending, request))
    }

    /// No-op when no next page exists, any infinite fetch is in flight, or
    /// the last fetch failed. Only a page-1 reload clears a failure.
    pub fn fetch_next_page(&mut self) -> Option<Fetch> {
        let list = &mut self.infinite;
        if list.in_flight.is_some() {
            tracing::debug!("next page already in flight");
            return None;
        }
        if list.error.is_some() {
            return None;
        }
        let page = list.next_page_param()?;
        let query = list.query.as_ref()?.with_page(page);
        list.in_flight = Some(InfiniteFetch::Next);
        let pending = Pending::Infinite {
            generation: list.generation,
            kind: InfiniteFetch::Next,
            page,
        };
        let request = self.client.build_list_users(&query);
        Some(self.issue(pending, request))
    }

    pub fn infinite(&self) -> &InfiniteList {
        &self.infinite
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    pub fn create_user(
        &mut self,
        payload: &UserPayload,
        on_success: Option<OnSuccess>,
    ) -> Result<Fetch, ApiError> {
        let request = self.client.build_create_user(payload)?;
        self.create = MutationState::Pending;
        Ok(self.issue(Pending::Create(on_success), request))
    }

    pub fn update_user(
        &mut self,
        user: &User,
        on_success: Option<OnSuccess>,
    ) -> Result<Fetch, ApiError> {
        let request = self.client.build_update_user(user)?;
        self.update = MutationState::Pending;
        Ok(self.issue(Pending::Update(on_success), request))
    }

    pub fn delete_user(&mut self, id: UserId, on_success: Option<OnSuccess>) -> Fetch {
        let request = self.client.build_delete_user(id);
        self.delete = MutationState::Pending;
        self.issue(Pending::Delete(id, on_success), request)
    }

    pub fn mutation(&self, kind: MutationKind) -> &MutationState {
        match kind {
            MutationKind::Create => &self.create,
            MutationKind::Update => &self.update,
            MutationKind::Delete => &self.delete,
        }
    }

    /// Mark every `users` query stale so the next read refetches.
    pub fn invalidate_users(&mut self) {
        let root = QueryKey::new(USERS);
        self.pages.invalidate(&root);
        self.page_errors.retain(|key, _| !key.starts_with(&root));
        if self.infinite.query.is_some() {
            self.infinite.stale = true;
        }
    }

    // ---------------------------------------------------------------------
    // Completion
    // ---------------------------------------------------------------------

    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Apply the outcome of the request issued under `ticket`.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: Result<HttpResponse, ApiError>,
    ) -> Completion {
        let Some(pending) = self.pending.remove(&ticket) else {
            tracing::debug!(%ticket, "completion for unknown ticket");
            return Completion::Ignored;
        };
        match pending {
            Pending::Page(key) => {
                let parsed = outcome.and_then(|r| self.client.parse_list_users(r));
                self.settle_page(key, parsed)
            }
            Pending::Infinite {
                generation,
                kind,
                page,
            } => {
                if generation != self.infinite.generation {
                    tracing::debug!(%ticket, page, "dropping response for superseded list");
                    return Completion::Ignored;
                }
                let parsed = outcome.and_then(|r| self.client.parse_list_users(r));
                self.settle_infinite(kind, page, parsed)
            }
            Pending::Create(on_success) => {
                let parsed = outcome
                    .and_then(|r| self.client.parse_create_user(r))
                    .map(Mutated::Created);
                self.settle_mutation(MutationKind::Create, parsed, on_success)
            }
            Pending::Update(on_success) => {
                let parsed = outcome
                    .and_then(|r| self.client.parse_update_user(r))
                    .map(Mutated::Updated);
                self.settle_mutation(MutationKind::Update, parsed, on_success)
            }
            Pending::Delete(id, on_success) => {
                let parsed = outcome
                    .and_then(|r| self.client.parse_delete_user(r))
                    .map(|()| Mutated::Deleted(id));
                self.settle_mutation(MutationKind::Delete, parsed, on_success)
            }
        }
    }

    fn issue(&mut self, pending: Pending, request: HttpRequest) -> Fetch {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        tracing::debug!(%ticket, method = %request.method, path = %request.path, "issuing request");
        self.pending.insert(ticket, pending);
        Fetch { ticket, request }
    }

    fn settle_page(
        &mut self,
        key: QueryKey,
        parsed: Result<ListResponse<User>, ApiError>,
    ) -> Completion {
        self.pages_in_flight.remove(&key);
        match parsed {
            Ok(list) => {
                self.page_errors.remove(&key);
                self.pages.insert(key.clone(), list);
                Completion::PageLoaded(key)
            }
            Err(error) => {
                tracing::debug!(key = %key, %error, "page fetch failed");
                self.page_errors.insert(key.clone(), error.clone());
                Completion::PageFailed { key, error }
            }
        }
    }

    fn settle_infinite(
        &mut self,
        kind: InfiniteFetch,
        page: u32,
        parsed: Result<ListResponse<User>, ApiError>,
    ) -> Completion {
        let list = &mut self.infinite;
        list.in_flight = None;
        match parsed {
            Ok(response) => {
                if kind == InfiniteFetch::First {
                    list.pages.clear();
                    list.stale = false;
                }
                list.pages.push(response);
                list.error = None;
                Completion::InfiniteLoaded { page }
            }
            Err(error) => {
                tracing::debug!(page, %error, "infinite fetch failed");
                if kind == InfiniteFetch::First {
                    list.stale = false;
                }
                list.error = Some(error.clone());
                Completion::InfiniteFailed(error)
            }
        }
    }

    fn settle_mutation(
        &mut self,
        kind: MutationKind,
        parsed: Result<Mutated, ApiError>,
        on_success: Option<OnSuccess>,
    ) -> Completion {
        match parsed {
            Ok(mutated) => {
                *self.mutation_mut(kind) = MutationState::Succeeded;
                self.invalidate_users();
                if let Some(callback) = on_success {
                    callback(&mutated);
                }
                Completion::Mutated(mutated)
            }
            Err(error) => {
                tracing::warn!(%kind, %error, "mutation failed");
                *self.mutation_mut(kind) = MutationState::Failed(error.clone());
                Completion::MutationFailed { kind, error }
            }
        }
    }

    fn mutation_mut(&mut self, kind: MutationKind) -> &mut MutationState {
        match kind {
            MutationKind::Create => &mut self.create,
            MutationKind::Update => &mut self.update,
            MutationKind::Delete => &mut self.delete,
        }
    }
}
