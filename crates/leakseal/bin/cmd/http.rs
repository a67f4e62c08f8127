use std::time::Duration;

use eyre::Result;
use leakseal::{LeakSealJson, Route, StatusJson, TrackedTypeJson};
use serde::de::DeserializeOwned;

use super::ServerArgs;

const HTTP_TIMEOUT: Duration = Duration::from_millis(2000);

pub(crate) fn agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(HTTP_TIMEOUT))
        .build();
    config.into()
}

pub(crate) fn fetch_status(agent: &ureq::Agent, server: &ServerArgs) -> Result<StatusJson> {
    get_json(agent, server, &Route::Status)
}

pub(crate) fn fetch_types(agent: &ureq::Agent, server: &ServerArgs) -> Result<LeakSealJson> {
    get_json(agent, server, &Route::Types)
}

pub(crate) fn fetch_type(
    agent: &ureq::Agent,
    server: &ServerArgs,
    name: &str,
) -> Result<TrackedTypeJson> {
    let route = Route::Type {
        name: name.to_string(),
    };
    get_json(agent, server, &route)
}

pub(crate) fn set_max_allowed(
    agent: &ureq::Agent,
    server: &ServerArgs,
    name: &str,
    max_allowed: i64,
) -> Result<TrackedTypeJson> {
    let route = Route::SetMaxAllowed {
        name: name.to_string(),
        max_allowed,
    };
    let url = route.to_url(&server.metrics_host, server.metrics_port);
    tracing::debug!(url = %url, "POST");

    let tracked: TrackedTypeJson = agent
        .post(&url)
        .send_empty()
        .map_err(|e| request_error(e, &route, &url))?
        .body_mut()
        .read_json()
        .map_err(|e| eyre::eyre!("JSON deserialization failed: {}", e))?;
    Ok(tracked)
}

fn get_json<T: DeserializeOwned>(
    agent: &ureq::Agent,
    server: &ServerArgs,
    route: &Route,
) -> Result<T> {
    let url = route.to_url(&server.metrics_host, server.metrics_port);
    tracing::debug!(url = %url, "GET");

    let value: T = agent
        .get(&url)
        .call()
        .map_err(|e| request_error(e, route, &url))?
        .body_mut()
        .read_json()
        .map_err(|e| eyre::eyre!("JSON deserialization failed: {}", e))?;
    Ok(value)
}

fn request_error(e: ureq::Error, route: &Route, url: &str) -> eyre::Report {
    match (e, route) {
        (
            ureq::Error::StatusCode(404),
            Route::Type { name } | Route::SetMaxAllowed { name, .. },
        ) => eyre::eyre!("Type '{}' is not tracked by the inspected process", name),
        (ureq::Error::StatusCode(404), _) => eyre::eyre!("404 Not Found: {}", url),
        (ureq::Error::StatusCode(code), _) => eyre::eyre!("HTTP {} from {}", code, url),
        (e, _) => eyre::eyre!(
            "HTTP request to {} failed: {}. Is the process running with the leakseal metrics server enabled?",
            url,
            e
        ),
    }
}
