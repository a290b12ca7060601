//! The console host: mounts one screen, turns input lines into view
//! actions, and routes every `Fetch` through the transport.

use std::ops::ControlFlow;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use user_admin_core::view::{InfiniteView, PaginatedView, ViewError};
use user_admin_core::{Fetch, Route, UserClient, UsersStore};

use crate::command::{Command, HELP};
use crate::config::Settings;
use crate::transport::{Delivery, Transport};

const CLEAR: &str = "\x1b[2J\x1b[H";

#[derive(Debug)]
pub enum Screen {
    Paginated(PaginatedView),
    Infinite(InfiniteView),
}

impl Screen {
    pub fn mount(route: Route, viewport: usize, limit: Option<u32>) -> Self {
        match route {
            Route::Paginated => Screen::Paginated(PaginatedView::new()),
            Route::Infinite => {
                let view = InfiniteView::new(viewport);
                Screen::Infinite(match limit {
                    Some(limit) => view.with_limit(limit),
                    None => view,
                })
            }
        }
    }

    pub fn route(&self) -> Route {
        match self {
            Screen::Paginated(_) => Route::Paginated,
            Screen::Infinite(_) => Route::Infinite,
        }
    }
}

pub struct App {
    store: UsersStore,
    screen: Screen,
    rng: StdRng,
    outbox: Vec<Fetch>,
    status: Option<String>,
}

impl App {
    pub fn new(settings: &Settings) -> Self {
        Self::with_rng(settings, StdRng::from_entropy())
    }

    pub fn with_rng(settings: &Settings, rng: StdRng) -> Self {
        Self {
            store: UsersStore::new(UserClient::new(&settings.api_url)),
            screen: Screen::mount(settings.route, settings.viewport, settings.limit),
            rng,
            outbox: Vec::new(),
            status: None,
        }
    }

    pub fn store(&self) -> &UsersStore {
        &self.store
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Everything that has to go out: requests issued by commands plus
    /// whatever the mounted screen needs to display.
    pub fn pump(&mut self) -> Vec<Fetch> {
        let mut fetches = std::mem::take(&mut self.outbox);
        match &mut self.screen {
            Screen::Paginated(view) => fetches.extend(view.refresh(&mut self.store)),
            Screen::Infinite(view) => match view.refresh(&mut self.store) {
                Some(fetch) => fetches.push(fetch),
                None => fetches.extend(view.poll(&mut self.store)),
            },
        }
        fetches
    }

    pub fn deliver(&mut self, delivery: Delivery, now: Instant) {
        let completion = self.store.complete(delivery.ticket, delivery.outcome);
        tracing::debug!(ticket = %delivery.ticket, ?completion, "request settled");
        match &mut self.screen {
            Screen::Paginated(view) => view.on_completion(&completion, now),
            Screen::Infinite(view) => view.on_completion(&completion, now),
        }
    }

    /// Expire the notice; true when the frame changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match &mut self.screen {
            Screen::Paginated(view) => view.tick(now),
            Screen::Infinite(view) => view.tick(now),
        }
    }

    pub fn notice_deadline(&self) -> Option<Instant> {
        let actions = match &self.screen {
            Screen::Paginated(view) => view.actions(),
            Screen::Infinite(view) => view.actions(),
        };
        actions.notice().expires_at()
    }

    pub fn handle_line(&mut self, line: &str) -> ControlFlow<()> {
        self.status = None;
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(error) => {
                self.status = Some(error.to_string());
                return ControlFlow::Continue(());
            }
        };
        if command == Command::Quit {
            return ControlFlow::Break(());
        }
        if let Err(error) = self.apply(command) {
            self.status = Some(error.to_string());
        }
        ControlFlow::Continue(())
    }

    fn apply(&mut self, command: Command) -> Result<(), ConsoleError> {
        let store = &mut self.store;
        let fetch = match (&mut self.screen, command) {
            (_, Command::Help) => {
                self.status = Some(HELP.to_string());
                None
            }
            (Screen::Paginated(view), Command::Next) => {
                view.next_page(store);
                None
            }
            (Screen::Paginated(view), Command::Prev) => {
                view.previous_page();
                None
            }
            (Screen::Paginated(view), Command::Page(index)) => {
                view.set_page(index);
                None
            }
            (Screen::Paginated(view), Command::Size(rows)) => {
                view.set_rows_per_page(rows)?;
                None
            }
            (Screen::Infinite(view), Command::Down(rows)) => {
                view.scroll_by(rows.try_into().unwrap_or(isize::MAX), store);
                None
            }
            (Screen::Infinite(view), Command::Up(rows)) => {
                view.scroll_by(-rows.try_into().unwrap_or(isize::MAX), store);
                None
            }
            (Screen::Paginated(view), Command::Search(keyword)) => {
                view.set_keyword(keyword);
                None
            }
            (Screen::Infinite(view), Command::Search(keyword)) => {
                view.set_keyword(keyword);
                None
            }
            (Screen::Paginated(view), Command::Add) => Some(view.add_user(store, &mut self.rng)?),
            (Screen::Infinite(view), Command::Add) => Some(view.add_user(store, &mut self.rng)?),
            (Screen::Paginated(view), Command::Edit(id)) => {
                view.begin_edit(store, id)?;
                None
            }
            (Screen::Infinite(view), Command::Edit(id)) => {
                view.begin_edit(store, id)?;
                None
            }
            (Screen::Paginated(view), Command::Set(field, value)) => {
                view.edit(field, value)?;
                None
            }
            (Screen::Infinite(view), Command::Set(field, value)) => {
                view.edit(field, value)?;
                None
            }
            (Screen::Paginated(view), Command::Save) => Some(view.save(store)?),
            (Screen::Infinite(view), Command::Save) => Some(view.save(store)?),
            (Screen::Paginated(view), Command::Cancel) => {
                view.cancel_edit();
                None
            }
            (Screen::Infinite(view), Command::Cancel) => {
                view.cancel_edit();
                None
            }
            (Screen::Paginated(view), Command::Delete(id)) => Some(view.delete_user(store, id)),
            (Screen::Infinite(view), Command::Delete(id)) => Some(view.delete_user(store, id)),
            (screen, command) => {
                return Err(ConsoleError::NotOnThisPage {
                    command,
                    route: screen.route(),
                })
            }
        };
        self.outbox.extend(fetch);
        Ok(())
    }

    /// The frame without terminal control codes.
    pub fn frame(&self, now: Instant) -> String {
        let mut out = format!("[{}]  ", self.screen.route());
        out.push_str(match self.screen {
            Screen::Paginated(_) => "table  (`help` for commands)\n\n",
            Screen::Infinite(_) => "stack  (`help` for commands)\n\n",
        });
        out.push_str(&match &self.screen {
            Screen::Paginated(view) => view.render(&self.store, now),
            Screen::Infinite(view) => view.render(&self.store, now),
        });
        if let Some(status) = &self.status {
            out.push('\n');
            out.push_str(status);
            if !status.ends_with('\n') {
                out.push('\n');
            }
        }
        out
    }
}

#[derive(Debug, thiserror::Error)]
enum ConsoleError {
    #[error("`{command:?}` is not available on {route}")]
    NotOnThisPage { command: Command, route: Route },

    #[error(transparent)]
    View(#[from] ViewError),
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let transport = Transport::new(tx);
    let mut app = App::new(&settings);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    tracing::info!(api_url = %settings.api_url, route = %settings.route, "starting");

    loop {
        for fetch in app.pump() {
            tracing::debug!(ticket = %fetch.ticket, method = %fetch.request.method, path = %fetch.request.path, "dispatch");
            transport.dispatch(fetch);
        }
        let frame = format!("{CLEAR}{}> ", app.frame(Instant::now()));
        stdout.write_all(frame.as_bytes()).await?;
        stdout.flush().await?;

        let deadline = app.notice_deadline();
        let wake = tokio::time::Instant::from_std(deadline.unwrap_or_else(Instant::now));
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if app.handle_line(&line).is_break() {
                        break;
                    }
                }
                None => break,
            },
            Some(delivery) = rx.recv() => app.deliver(delivery, Instant::now()),
            _ = tokio::time::sleep_until(wake), if deadline.is_some() => {
                app.tick(Instant::now());
            }
        }
    }

    tracing::info!(in_flight = app.store().in_flight(), "shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;
    use user_admin_core::view::notice::NOTICE_DURATION;
    use user_admin_core::{ApiError, HttpMethod, HttpResponse};

    use super::*;

    fn settings(route: &str) -> Settings {
        Settings::try_parse_from([
            "user-admin",
            "--api-url",
            "http://api.test",
            "--route",
            route,
            "--viewport",
            "5",
            "--limit",
            "10",
        ])
        .unwrap()
    }

    fn app(route: &str) -> App {
        App::with_rng(&settings(route), StdRng::seed_from_u64(7))
    }

    fn page_body(page: u32, limit: u32, total: u64) -> String {
        let start = u64::from((page - 1) * limit);
        let end = (start + u64::from(limit)).min(total);
        let results: Vec<_> = (start..end)
            .map(|i| {
                serde_json::json!({
                    "id": i + 1,
                    "name": format!("User {}", i + 1),
                    "email": format!("user{}@gmail.com", i + 1),
                    "city": "Hanoi",
                    "role": "user",
                    "createdAt": "2024-01-01T00:00:00Z",
                    "updatedAt": "2024-01-01T00:00:00Z",
                })
            })
            .collect();
        serde_json::json!({
            "meta": {
                "page": page,
                "limit": limit,
                "totalCount": total,
                "totalPages": total.div_ceil(u64::from(limit)),
            },
            "results": results,
        })
        .to_string()
    }

    fn ok(fetch: &Fetch, status: u16, body: String) -> Delivery {
        Delivery {
            ticket: fetch.ticket,
            outcome: Ok(HttpResponse {
                status,
                headers: Vec::new(),
                body,
            }),
        }
    }

    #[test]
    fn mounts_screen_for_route() {
        assert_eq!(app("/").screen().route(), Route::Paginated);
        assert_eq!(app("/stack").screen().route(), Route::Infinite);
    }

    #[test]
    fn pump_requests_first_page_once() {
        let mut app = app("/");
        let fetches = app.pump();
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].request.path, "http://api.test/users?page=1&limit=10");
        assert!(app.pump().is_empty(), "already in flight");
        assert!(app.frame(Instant::now()).contains("loading users"));
    }

    #[test]
    fn quit_breaks_and_typos_set_status() {
        let mut app = app("/");
        assert!(app.handle_line("quit").is_break());
        assert!(app.handle_line("fly").is_continue());
        assert!(app.frame(Instant::now()).contains("unknown command"));
    }

    #[test]
    fn scroll_commands_only_apply_to_stack() {
        let mut app = app("/");
        app.handle_line("down 3");
        assert!(app.frame(Instant::now()).contains("not available on /"));
    }

    #[test]
    fn add_queues_create_and_announces() {
        let mut app = app("/");
        let first = app.pump().remove(0);
        app.deliver(ok(&first, 200, page_body(1, 10, 3)), Instant::now());

        app.handle_line("add");
        let fetches = app.pump();
        let create = fetches
            .iter()
            .find(|f| f.request.method == HttpMethod::Post)
            .unwrap();
        let body = serde_json::json!({
            "id": 4,
            "name": "User 1",
            "email": "user1@gmail.com",
            "city": "Hanoi",
            "role": "user",
            "createdAt": "2024-01-02T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z",
        });
        let now = Instant::now();
        app.deliver(ok(create, 201, body.to_string()), now);
        assert!(app.frame(now).contains("User added successfully"));
        assert_eq!(app.notice_deadline(), Some(now + NOTICE_DURATION));

        let later = now + NOTICE_DURATION + Duration::from_millis(1);
        assert!(app.tick(later));
        assert!(!app.frame(later).contains("User added successfully"));
        assert_eq!(app.notice_deadline(), None);

        let refetch = app.pump();
        assert_eq!(refetch.len(), 1, "list invalidated by create");
    }

    #[test]
    fn edit_flow_through_commands() {
        let mut app = app("/");
        let first = app.pump().remove(0);
        app.deliver(ok(&first, 200, page_body(1, 10, 3)), Instant::now());

        app.handle_line("edit 2");
        app.handle_line("name Renamed");
        assert!(app.frame(Instant::now()).contains("[Renamed"));
        app.handle_line("save");
        let fetches = app.pump();
        assert_eq!(fetches.len(), 1);
        assert_eq!(fetches[0].request.method, HttpMethod::Put);
        assert_eq!(fetches[0].request.path, "http://api.test/users/2");

        app.handle_line("save");
        assert!(app.frame(Instant::now()).contains("no row is being edited"));
    }

    #[test]
    fn stack_scrolls_into_next_page() {
        let mut app = app("/stack");
        let first = app.pump().remove(0);
        app.deliver(ok(&first, 200, page_body(1, 10, 25)), Instant::now());
        assert!(app.pump().is_empty(), "sentinel below the viewport");

        app.handle_line("down 10");
        let next = app.pump();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].request.path, "http://api.test/users?page=2&limit=10");
    }

    #[test]
    fn failed_next_page_stops_the_pump() {
        let mut app = app("/stack");
        let first = app.pump().remove(0);
        app.deliver(ok(&first, 200, page_body(1, 10, 25)), Instant::now());
        app.handle_line("down 10");
        let next = app.pump().remove(0);
        app.deliver(
            Delivery {
                ticket: next.ticket,
                outcome: Err(ApiError::Transport("refused".to_string())),
            },
            Instant::now(),
        );
        for _ in 0..5 {
            assert!(app.pump().is_empty());
        }
        assert!(app.frame(Instant::now()).contains("Error: transport failed: refused"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn transport_round_trip_against_mock_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(mock_server::run_with(listener, mock_server::Users::seeded(12)));

        let api_url = format!("http://{addr}");
        let settings =
            Settings::try_parse_from(["user-admin", "--api-url", api_url.as_str()]).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let transport = Transport::new(tx);
        let mut app = App::with_rng(&settings, StdRng::seed_from_u64(1));

        for fetch in app.pump() {
            transport.dispatch(fetch);
        }
        let delivery = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        app.deliver(delivery, Instant::now());
        let frame = app.frame(Instant::now());
        assert!(frame.contains("1-10 of 12"), "{frame}");
        assert!(frame.contains("page 1/2"), "{frame}");
    }
}
