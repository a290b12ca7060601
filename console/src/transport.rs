//! Executes `Fetch` requests off the event loop and reports back over a
//! channel.
//!
//! ureq is blocking, so each request runs on tokio's blocking pool. The
//! outcome is delivered to the single-threaded loop, which owns the store.
//! Requests are fire-and-forget: nothing cancels them.

use tokio::sync::mpsc;
use user_admin_core::{ApiError, Fetch, HttpMethod, HttpRequest, HttpResponse, Ticket};

#[derive(Debug)]
pub struct Delivery {
    pub ticket: Ticket,
    pub outcome: Result<HttpResponse, ApiError>,
}

#[derive(Clone)]
pub struct Transport {
    agent: ureq::Agent,
    tx: mpsc::UnboundedSender<Delivery>,
}

impl Transport {
    pub fn new(tx: mpsc::UnboundedSender<Delivery>) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent, tx }
    }

    pub fn dispatch(&self, fetch: Fetch) {
        let agent = self.agent.clone();
        let tx = self.tx.clone();
        tokio::task::spawn_blocking(move || {
            let Fetch { ticket, request } = fetch;
            let outcome = execute(&agent, request);
            if tx.send(Delivery { ticket, outcome }).is_err() {
                tracing::debug!(%ticket, "event loop gone, dropping response");
            }
        });
    }
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Execute an `HttpRequest` with ureq, returning non-2xx responses as data
/// so the core client interprets the status.
pub fn execute(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, ApiError> {
    let result = match req.method {
        HttpMethod::Get => with_headers(agent.get(&req.path), &req.headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(&req.path), &req.headers).call(),
        HttpMethod::Post => {
            let builder = with_headers(agent.post(&req.path), &req.headers);
            match req.body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
        HttpMethod::Put => {
            let builder = with_headers(agent.put(&req.path), &req.headers);
            match req.body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
    };
    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}
