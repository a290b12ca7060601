//! Domain DTOs for the user API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently;
//! integration tests catch any drift. Wire names are camelCase.
//!
//! `City` decodes both shapes the API has served over time: a bare string
//! and a `{ name, address }` object.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = u64;

/// A user record returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub city: City,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum City {
    Name(String),
    Located { name: String, address: String },
}

impl City {
    pub fn name(&self) -> &str {
        match self {
            City::Name(name) => name,
            City::Located { name, .. } => name,
        }
    }
}

impl From<&str> for City {
    fn from(name: &str) -> Self {
        City::Name(name.to_string())
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request payload for creating a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPayload {
    pub name: String,
    pub email: String,
    pub city: City,
    pub role: String,
}

/// Parameters for `GET /users`. Absent fields are left out of the query
/// string and the server applies its defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct UserQuery {
    /// 1-indexed.
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub keyword: Option<String>,
}

impl UserQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            keyword: None,
        }
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: Some(page),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    #[serde(alias = "total")]
    pub total_count: u64,
    pub total_pages: u32,
}

/// One page of results plus its pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListResponse<T> {
    pub meta: Pagination,
    pub results: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_decodes_plain_string() {
        let city: City = serde_json::from_str(r#""Hanoi""#).unwrap();
        assert_eq!(city, City::Name("Hanoi".to_string()));
        assert_eq!(city.name(), "Hanoi");
    }

    #[test]
    fn city_decodes_structured_object() {
        let city: City =
            serde_json::from_str(r#"{"name":"Hanoi","address":"12 Trang Tien"}"#).unwrap();
        assert_eq!(city.name(), "Hanoi");
        assert!(matches!(city, City::Located { .. }));
    }

    #[test]
    fn user_uses_camel_case_timestamps() {
        let user: User = serde_json::from_str(
            r#"{"id":7,"name":"A","email":"a@x.io","city":"Hue","role":"user",
                "createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-02T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(user.id, 7);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("created_at").is_none());
    }

    #[test]
    fn pagination_accepts_legacy_total_field() {
        let meta: Pagination =
            serde_json::from_str(r#"{"page":1,"limit":10,"total":25,"totalPages":3}"#).unwrap();
        assert_eq!(meta.total_count, 25);
    }

    #[test]
    fn pagination_serializes_total_count() {
        let meta = Pagination {
            page: 2,
            limit: 5,
            total_count: 9,
            total_pages: 2,
        };
        let json = serde_json::to_value(meta).unwrap();
        assert_eq!(json["totalCount"], 9);
        assert_eq!(json["totalPages"], 2);
    }

    #[test]
    fn with_page_keeps_limit_and_keyword() {
        let query = UserQuery {
            page: None,
            limit: Some(5),
            keyword: Some("ann".to_string()),
        };
        let next = query.with_page(3);
        assert_eq!(next.page, Some(3));
        assert_eq!(next.limit, Some(5));
        assert_eq!(next.keyword.as_deref(), Some("ann"));
    }
}
