use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum City {
    Name(String),
    Located { name: String, address: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub city: City,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of both `POST /users` and `PUT /users/{id}`. Extra fields such as
/// `id` or timestamps in an update body are ignored.
#[derive(Deserialize)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    pub city: City,
    pub role: String,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub keyword: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub page: u32,
    pub limit: u32,
    pub total_count: u64,
    pub total_pages: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListResponse {
    pub meta: Meta,
    pub results: Vec<User>,
}

#[derive(Debug, Default)]
pub struct Users {
    records: BTreeMap<u64, User>,
    next_id: u64,
}

impl Users {
    /// `count` users named `User 1..=count`, all in Hanoi.
    pub fn seeded(count: usize) -> Self {
        let mut users = Self::default();
        for n in 1..=count {
            users.insert(UserPayload {
                name: format!("User {n}"),
                email: format!("user{n}@gmail.com"),
                city: City::Name("Hanoi".to_string()),
                role: "user".to_string(),
            });
        }
        users
    }

    fn insert(&mut self, input: UserPayload) -> User {
        self.next_id += 1;
        let now = Utc::now();
        let user = User {
            id: self.next_id,
            name: input.name,
            email: input.email,
            city: input.city,
            role: input.role,
            created_at: now,
            updated_at: now,
        };
        self.records.insert(user.id, user.clone());
        user
    }

    /// Newest first, optionally filtered by a case-insensitive keyword on
    /// name or email.
    fn page(&self, page: u32, limit: u32, keyword: Option<&str>) -> ListResponse {
        let keyword = keyword.map(str::to_lowercase);
        let matching: Vec<&User> = self
            .records
            .values()
            .rev()
            .filter(|user| match &keyword {
                Some(k) => {
                    user.name.to_lowercase().contains(k) || user.email.to_lowercase().contains(k)
                }
                None => true,
            })
            .collect();
        let total_count = matching.len() as u64;
        let total_pages = total_count.div_ceil(u64::from(limit)) as u32;
        let skip = (page.saturating_sub(1) as usize).saturating_mul(limit as usize);
        let results = matching
            .into_iter()
            .skip(skip)
            .take(limit as usize)
            .cloned()
            .collect();
        ListResponse {
            meta: Meta {
                page,
                limit,
                total_count,
                total_pages,
            },
            results,
        }
    }
}

pub type Db = Arc<RwLock<Users>>;

pub fn app() -> Router {
    app_with(Users::default())
}

pub fn app_with(users: Users) -> Router {
    let db: Db = Arc::new(RwLock::new(users));
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", put(update_user).delete(delete_user))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    run_with(listener, Users::default()).await
}

pub async fn run_with(listener: TcpListener, users: Users) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(users)).await
}

async fn list_users(
    State(db): State<Db>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, (StatusCode, String)> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 {
        return Err((StatusCode::BAD_REQUEST, "limit must be positive".to_string()));
    }
    let users = db.read().await;
    Ok(Json(users.page(page, limit, params.keyword.as_deref())))
}

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<UserPayload>,
) -> (StatusCode, Json<User>) {
    let user = db.write().await.insert(input);
    tracing::debug!(id = user.id, "created user");
    (StatusCode::CREATED, Json(user))
}

async fn update_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Json(input): Json<UserPayload>,
) -> Result<Json<User>, StatusCode> {
    let mut users = db.write().await;
    let user = users.records.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    user.name = input.name;
    user.email = input.email;
    user.city = input.city;
    user.role = input.role;
    user.updated_at = Utc::now();
    Ok(Json(user.clone()))
}

async fn delete_user(
    State(db): State<Db>,
    Path(id): Path<u64>,
) -> Result<StatusCode, StatusCode> {
    let mut users = db.write().await;
    users
        .records
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}
