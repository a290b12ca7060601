//! The two static pages of the admin screen.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no page at {0:?}")]
pub struct RouteError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    /// `/`: table with page controls.
    #[default]
    Paginated,
    /// `/stack`: infinite scrolling list.
    Infinite,
}

impl Route {
    pub const ALL: [Route; 2] = [Route::Paginated, Route::Infinite];

    pub fn path(self) -> &'static str {
        match self {
            Route::Paginated => "/",
            Route::Infinite => "/stack",
        }
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        Route::ALL
            .into_iter()
            .find(|route| route.path().trim_end_matches('/') == trimmed)
            .ok_or_else(|| RouteError(path.to_string()))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
