//! Full CRUD lifecycle against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives the store and both
//! views over real HTTP using ureq, executing every `Fetch` they hand out
//! and feeding the responses back through `UsersStore::complete`.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use user_admin_core::view::edit::EditField;
use user_admin_core::view::placeholder::numbered_user;
use user_admin_core::view::{InfiniteView, PaginatedView};
use user_admin_core::{
    ApiError, Completion, Fetch, HttpMethod, HttpResponse, Mutated, QueryState, UserClient,
    UserQuery, UsersStore,
};

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
fn execute(req: user_admin_core::HttpRequest) -> Result<HttpResponse, ApiError> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let result = match (req.method, req.body) {
        (HttpMethod::Get, _) => agent.get(&req.path).call(),
        (HttpMethod::Delete, _) => agent.delete(&req.path).call(),
        (HttpMethod::Post, Some(body)) => {
            agent.post(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Post, None) => agent.post(&req.path).send_empty(),
        (HttpMethod::Put, Some(body)) => {
            agent.put(&req.path).content_type("application/json").send(body.as_bytes())
        }
        (HttpMethod::Put, None) => agent.put(&req.path).send_empty(),
    };
    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();

    Ok(HttpResponse {
        status,
        headers: Vec::new(),
        body,
    })
}

fn run(store: &mut UsersStore, fetch: Fetch) -> Completion {
    let outcome = execute(fetch.request);
    store.complete(fetch.ticket, outcome)
}

/// Start the mock server on a random port seeded with `seed` users.
fn start_server(seed: usize) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run_with(listener, mock_server::Users::seeded(seed)).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn crud_lifecycle() {
    let base = start_server(0);
    let mut store = UsersStore::new(UserClient::new(&base));
    let query = UserQuery::page(1, 10);

    // Step 1: list, empty.
    let fetch = store.list_page(&query).unwrap();
    assert!(matches!(run(&mut store, fetch), Completion::PageLoaded(_)));
    match store.page(&query) {
        QueryState::Ready(list) => {
            assert!(list.results.is_empty());
            assert_eq!(list.meta.total_pages, 0);
        }
        other => panic!("unexpected {other:?}"),
    }

    // Step 2: create; the server assigns id and timestamps.
    let fetch = store.create_user(&numbered_user(42), None).unwrap();
    let created = match run(&mut store, fetch) {
        Completion::Mutated(Mutated::Created(user)) => user,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(created.name, "User 42");
    assert_eq!(created.email, "user42@gmail.com");
    assert_eq!(created.city.name(), "Hanoi");
    assert_eq!(created.role, "user");
    assert_eq!(created.created_at, created.updated_at);

    // Step 3: the invalidated list refetches and includes the new record.
    let fetch = store.list_page(&query).expect("list invalidated by create");
    run(&mut store, fetch);
    let QueryState::Ready(list) = store.page(&query) else {
        panic!("list not ready");
    };
    assert_eq!(list.results, vec![created.clone()]);

    // Step 4: update the name.
    let mut edited = created.clone();
    edited.name = "Renamed".to_string();
    let fetch = store.update_user(&edited, None).unwrap();
    let updated = match run(&mut store, fetch) {
        Completion::Mutated(Mutated::Updated(user)) => user,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.created_at, created.created_at);

    // Step 5: delete, then delete again.
    let fetch = store.delete_user(created.id, None);
    assert_eq!(
        run(&mut store, fetch),
        Completion::Mutated(Mutated::Deleted(created.id))
    );
    let fetch = store.delete_user(created.id, None);
    assert!(matches!(
        run(&mut store, fetch),
        Completion::MutationFailed {
            error: ApiError::NotFound,
            ..
        }
    ));

    // Step 6: list, empty again.
    let fetch = store.list_page(&query).unwrap();
    run(&mut store, fetch);
    let QueryState::Ready(list) = store.page(&query) else {
        panic!("list not ready");
    };
    assert!(list.results.is_empty());
}

#[test]
fn paginated_view_walks_twenty_five_users() {
    let base = start_server(25);
    let mut store = UsersStore::new(UserClient::new(&base));
    let mut view = PaginatedView::new();

    let fetch = view.refresh(&mut store).unwrap();
    run(&mut store, fetch);
    assert_eq!(view.rows(&store).len(), 10);
    assert!(view.next_page(&store));
    let fetch = view.refresh(&mut store).unwrap();
    run(&mut store, fetch);
    assert!(view.next_page(&store));
    let fetch = view.refresh(&mut store).unwrap();
    run(&mut store, fetch);
    assert_eq!(view.rows(&store).len(), 5);
    assert!(!view.next_page(&store));

    view.set_rows_per_page(5).unwrap();
    assert_eq!(view.page_index(), 0);
    let fetch = view.refresh(&mut store).unwrap();
    assert!(fetch.request.path.ends_with("/users?page=1&limit=5"));
    run(&mut store, fetch);
    assert!(view.render(&store, Instant::now()).contains("1-5 of 25"));
}

#[test]
fn paginated_view_add_edit_cancel_delete() {
    let base = start_server(2);
    let mut store = UsersStore::new(UserClient::new(&base));
    let mut view = PaginatedView::new();
    let mut rng = StdRng::seed_from_u64(42);

    let fetch = view.refresh(&mut store).unwrap();
    run(&mut store, fetch);

    let fetch = view.add_user(&mut store, &mut rng).unwrap();
    let done = run(&mut store, fetch);
    let now = Instant::now();
    view.on_completion(&done, now);
    let fetch = view.refresh(&mut store).unwrap();
    run(&mut store, fetch);
    assert_eq!(view.rows(&store).len(), 3);
    assert!(view.render(&store, now).contains("User added successfully"));

    // Edit then cancel: no request, server value stays on screen.
    let first = view.rows(&store)[0].clone();
    view.begin_edit(&store, first.id).unwrap();
    view.edit(EditField::Name, "Scratch").unwrap();
    view.cancel_edit();
    assert_eq!(store.in_flight(), 0);
    assert!(view.refresh(&mut store).is_none());
    assert!(view.render(&store, now).contains(&first.name));

    let fetch = view.delete_user(&mut store, first.id);
    run(&mut store, fetch);
    let fetch = view.refresh(&mut store).unwrap();
    run(&mut store, fetch);
    assert!(view.rows(&store).iter().all(|u| u.id != first.id));
}

#[test]
fn infinite_view_loads_until_exhausted() {
    let base = start_server(25);
    let mut store = UsersStore::new(UserClient::new(&base));
    let mut view = InfiniteView::new(8).with_limit(10);

    let fetch = view.refresh(&mut store).unwrap();
    run(&mut store, fetch);
    loop {
        view.scroll_by(isize::MAX, &store);
        match view.poll(&mut store) {
            Some(fetch) => {
                assert!(view.poll(&mut store).is_none());
                run(&mut store, fetch);
            }
            None => break,
        }
    }
    let list = store.infinite();
    assert_eq!(list.len(), 25);
    assert!(!list.has_next_page());
    assert!(view.render(&store, Instant::now()).contains("No more users"));

    // A create invalidates the accumulated list; it restarts at page 1.
    let fetch = store.create_user(&numbered_user(7), None).unwrap();
    run(&mut store, fetch);
    let fetch = view.refresh(&mut store).expect("invalidated list refetches");
    assert!(fetch.request.path.ends_with("/users?page=1&limit=10"));
    run(&mut store, fetch);
    assert_eq!(store.infinite().pages()[0].meta.total_count, 26);
    assert_eq!(store.infinite().items().next().unwrap().name, "User 7");
}

#[test]
fn unreachable_server_is_a_list_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut store = UsersStore::new(UserClient::new(&format!("http://{addr}")));
    let mut view = PaginatedView::new();
    let fetch = view.refresh(&mut store).unwrap();
    assert!(matches!(
        run(&mut store, fetch),
        Completion::PageFailed {
            error: ApiError::Transport(_),
            ..
        }
    ));
    assert!(view.render(&store, Instant::now()).starts_with("Error: transport failed"));
}
