//! Command-line and environment configuration.

use clap::Parser;
use user_admin_core::Route;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "user-admin",
    version,
    about = "Terminal admin screen for the users API"
)]
pub struct Settings {
    /// Base URL of the users API
    #[arg(long = "api-url", env = "API_URL", default_value = "http://127.0.0.1:3000")]
    pub api_url: String,

    /// Page to mount: `/` for the table, `/stack` for the infinite list
    #[arg(long, default_value = "/")]
    pub route: Route,

    /// Rows visible at once in the infinite list
    #[arg(long, default_value_t = 10)]
    pub viewport: usize,

    /// Page size requested by the infinite list (server default when unset)
    #[arg(long)]
    pub limit: Option<u32>,
}

impl Settings {
    /// Load `.env` if present, then parse arguments and environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::try_parse_from(["user-admin", "--api-url", "http://h:1"]).unwrap();
        assert_eq!(settings.api_url, "http://h:1");
        assert_eq!(settings.route, Route::Paginated);
        assert_eq!(settings.viewport, 10);
        assert_eq!(settings.limit, None);
    }

    #[test]
    fn parses_route() {
        let settings =
            Settings::try_parse_from(["user-admin", "--api-url", "http://h:1", "--route", "/stack"])
                .unwrap();
        assert_eq!(settings.route, Route::Infinite);
    }

    #[test]
    fn rejects_unknown_route() {
        assert!(
            Settings::try_parse_from(["user-admin", "--api-url", "http://h:1", "--route", "/blog"])
                .is_err()
        );
    }
}
