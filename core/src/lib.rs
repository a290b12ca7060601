//! Client core for the user admin screen.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern), caches list responses by
//! query key, and models the two list screens as headless views.
//!
//! # Design
//! - `UserClient` is stateless: it holds only `base_url`.
//! - `UsersStore` is the data-access layer. It hands out `Fetch` tickets for
//!   the host to execute and applies outcomes through `complete`, so
//!   in-flight bookkeeping and cache invalidation stay deterministic.
//! - Views (`view::PaginatedView`, `view::InfiniteView`) hold UI state only
//!   and render to text.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod cache;
pub mod client;
pub mod error;
pub mod http;
pub mod pagination;
pub mod router;
pub mod store;
pub mod types;
pub mod view;

pub use client::UserClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use router::{Route, RouteError};
pub use store::{Completion, Fetch, Mutated, MutationKind, MutationState, QueryState, Ticket, UsersStore};
pub use types::{City, ListResponse, Pagination, User, UserId, UserPayload, UserQuery};
