//! Stateless HTTP request builder and response parser for the user API.
//!
//! # Design
//! `UserClient` holds only a `base_url` and carries no mutable state between
//! calls. Each CRUD operation is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{ListResponse, User, UserId, UserPayload, UserQuery};

const USERS: &str = "users";

/// Synchronous, stateless client for the user API.
#[derive(Debug, Clone)]
pub struct UserClient {
    base_url: String,
}

impl UserClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn build_list_users(&self, query: &UserQuery) -> HttpRequest {
        let mut params = Vec::new();
        if let Some(page) = query.page {
            params.push(format!("page={page}"));
        }
        if let Some(limit) = query.limit {
            params.push(format!("limit={limit}"));
        }
        if let Some(keyword) = &query.keyword {
            params.push(format!("keyword={}", urlencoding::encode(keyword)));
        }
        let mut path = format!("{}/{USERS}", self.base_url);
        if !params.is_empty() {
            path.push('?');
            path.push_str(&params.join("&"));
        }
        self.request(HttpMethod::Get, path, None)
    }

    pub fn build_create_user(&self, input: &UserPayload) -> Result<HttpRequest, ApiError> {
        let body = encode(input)?;
        Ok(self.request(
            HttpMethod::Post,
            format!("{}/{USERS}", self.base_url),
            Some(body),
        ))
    }

    /// The whole record is sent; the server takes the id from the path.
    pub fn build_update_user(&self, user: &User) -> Result<HttpRequest, ApiError> {
        let body = encode(user)?;
        Ok(self.request(
            HttpMethod::Put,
            format!("{}/{USERS}/{}", self.base_url, user.id),
            Some(body),
        ))
    }

    pub fn build_delete_user(&self, id: UserId) -> HttpRequest {
        self.request(
            HttpMethod::Delete,
            format!("{}/{USERS}/{id}", self.base_url),
            None,
        )
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<ListResponse<User>, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_update_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        check_status(&response)?;
        decode(&response.body)
    }

    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn request(&self, method: HttpMethod, path: String, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            path,
            headers: json_headers(),
            body,
        }
    }
}

fn json_headers() -> Vec<(String, String)> {
    vec![("content-type".to_string(), "application/json".to_string())]
}

fn encode<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
