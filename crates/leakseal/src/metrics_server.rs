use std::error::Error;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::{LazyLock, OnceLock};
use std::thread;

use serde::Serialize;
use tiny_http::{Header, Method, Request, Response, Server};

use crate::json::{Route, StatusJson, TrackedTypeJson};
use crate::registry::Registry;

pub(crate) static METRICS_SERVER_PORT: LazyLock<u16> = LazyLock::new(|| {
    std::env::var("LEAKSEAL_METRICS_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(6790)
});

pub(crate) static METRICS_SERVER_DISABLED: LazyLock<bool> = LazyLock::new(|| {
    std::env::var("LEAKSEAL_METRICS_SERVER_OFF")
        .ok()
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
});

static HTTP_SERVER_STARTED: OnceLock<()> = OnceLock::new();

/// Starts the server for the process-wide registry, at most once per process.
pub(crate) fn start_metrics_server_once(registry: Registry, port: u16) {
    if *METRICS_SERVER_DISABLED {
        return;
    }
    HTTP_SERVER_STARTED.get_or_init(|| {
        let addr = format!("127.0.0.1:{}", port);
        if let Err(e) = start_metrics_server(registry, &addr) {
            eprintln!(
                "[leakseal] Failed to bind metrics server to {}: {}. Customize the port using the LEAKSEAL_METRICS_PORT environment variable.",
                addr, e
            );
        }
    });
}

/// Serves `registry` over HTTP from a background thread and returns the bound address.
///
/// Bind to port `0` to let the OS pick a free port.
pub fn start_metrics_server(
    registry: Registry,
    addr: &str,
) -> Result<SocketAddr, Box<dyn Error + Send + Sync>> {
    let server = Server::http(addr)?;
    let local_addr = server
        .server_addr()
        .to_ip()
        .ok_or("metrics server is not bound to an IP address")?;

    thread::Builder::new()
        .name("ls-server".into())
        .spawn(move || {
            for request in server.incoming_requests() {
                handle_request(&registry, request);
            }
        })?;

    eprintln!("[leakseal] Metrics server listening on http://{}", local_addr);

    Ok(local_addr)
}

fn handle_request(registry: &Registry, request: Request) {
    let method = request.method().clone();
    let route = request.url().parse::<Route>();
    tracing::debug!(method = %method, url = request.url(), "metrics server request");

    match route {
        Ok(Route::SetMaxAllowed { name, max_allowed }) => {
            if method != Method::Post {
                respond_error(request, 405, "Use POST to change the max allowed count");
                return;
            }
            if registry.get(&name).is_none() {
                respond_error(request, 404, &format!("Type '{}' not found", name));
                return;
            }
            registry.change_max_allowed(&name, max_allowed);
            match registry.get(&name) {
                Some(tracked) => respond_json(request, &TrackedTypeJson::from(&tracked)),
                None => respond_error(request, 404, &format!("Type '{}' not found", name)),
            }
        }
        Ok(_) if method != Method::Get => {
            respond_error(request, 405, "Method not allowed");
        }
        Ok(Route::Status) => {
            let status = StatusJson {
                status: registry.status(),
            };
            respond_json(request, &status);
        }
        Ok(Route::Types) => {
            let report = registry.report();
            respond_json(request, &report);
        }
        Ok(Route::Type { name }) => match registry.get(&name) {
            Some(tracked) => respond_json(request, &TrackedTypeJson::from(&tracked)),
            None => respond_error(request, 404, &format!("Type '{}' not found", name)),
        },
        Err(_) => respond_error(request, 404, "Not found"),
    }
}

fn respond_json<T: Serialize>(request: Request, value: &T) {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = Response::from_data(body);
            if let Ok(header) =
                Header::from_bytes(b"Content-Type".as_slice(), b"application/json".as_slice())
            {
                response.add_header(header);
            }
            let _ = request.respond(response);
        }
        Err(e) => respond_internal_error(request, e),
    }
}

fn respond_error(request: Request, code: u16, msg: &str) {
    let _ = request.respond(Response::from_string(msg).with_status_code(code));
}

fn respond_internal_error(request: Request, e: impl Display) {
    eprintln!("[leakseal] Internal server error: {}", e);
    let _ = request.respond(
        Response::from_string(format!("Internal server error: {}", e)).with_status_code(500),
    );
}
