//! JSON serializable types shared by the reporters, the HTTP server and the CLI.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::instance::InstanceId;

/// Process-wide summary: leaking if any tracked type is over its limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeakStatus {
    Leaking,
    #[default]
    Sealed,
}

impl LeakStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeakStatus::Leaking => "leaking",
            LeakStatus::Sealed => "sealed",
        }
    }

    pub fn is_leaking(&self) -> bool {
        matches!(self, LeakStatus::Leaking)
    }
}

impl std::fmt::Display for LeakStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serializable view of one tracked type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedTypeJson {
    pub name: String,
    pub current_count: usize,
    pub max_allowed: i64,
    pub is_over_limit: bool,
    pub live_instance_ids: Vec<InstanceId>,
}

impl TrackedTypeJson {
    pub fn fraction_string(&self) -> String {
        format!("{} / {}", self.current_count, self.max_allowed)
    }
}

/// Full registry report, as served on `/types`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeakSealJson {
    /// Elapsed time since the registry was created, in nanoseconds
    pub current_elapsed_ns: u64,
    pub status: LeakStatus,
    /// Tracked types sorted by name
    pub types: Vec<TrackedTypeJson>,
}

/// Response of the `/status` endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusJson {
    pub status: LeakStatus,
}

/// HTTP routes for the leakseal metrics server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// GET /status - Returns the aggregate leak status
    Status,
    /// GET /types - Returns all tracked types
    Types,
    /// GET /types/{base64_name} - Returns a single tracked type
    Type { name: String },
    /// POST /types/{base64_name}/max/{value} - Changes the max allowed count of a type
    SetMaxAllowed { name: String, max_allowed: i64 },
}

impl Route {
    /// Returns the path portion of the URL for this route.
    pub fn to_path(&self) -> String {
        match self {
            Route::Status => "/status".to_string(),
            Route::Types => "/types".to_string(),
            Route::Type { name } => format!("/types/{}", base64_encode(name)),
            Route::SetMaxAllowed { name, max_allowed } => {
                format!("/types/{}/max/{}", base64_encode(name), max_allowed)
            }
        }
    }

    /// Returns the full URL for this route with the given host and port.
    pub fn to_url(&self, host: &str, port: u16) -> String {
        format!("{}:{}{}", host, port, self.to_path())
    }
}

static RE_TYPE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/types/([^/]+)$").unwrap());
static RE_SET_MAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/types/([^/]+)/max/(-?\d+)$").unwrap());

// Names may contain '/', so path segments use the URL-safe alphabet.
fn base64_encode(name: &str) -> String {
    use base64::Engine;
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(name.as_bytes())
}

fn base64_decode(encoded: &str) -> Result<String, String> {
    use base64::Engine;
    let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

impl FromStr for Route {
    type Err = ();

    /// Parses a URL path into a Route using regex patterns.
    /// Returns Err(()) if the path doesn't match any known route.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.split('?').next().unwrap_or(s);

        match path {
            "/status" => return Ok(Route::Status),
            "/types" => return Ok(Route::Types),
            _ => {}
        }

        if let Some(caps) = RE_SET_MAX.captures(path) {
            let name = base64_decode(&caps[1]).map_err(|_| ())?;
            let max_allowed = caps[2].parse().map_err(|_| ())?;
            return Ok(Route::SetMaxAllowed { name, max_allowed });
        }

        if let Some(caps) = RE_TYPE.captures(path) {
            let name = base64_decode(&caps[1]).map_err(|_| ())?;
            return Ok(Route::Type { name });
        }

        Err(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_parse_back_from_their_paths() {
        let routes = [
            Route::Status,
            Route::Types,
            Route::Type {
                name: "app/models/Widget".to_string(),
            },
            Route::SetMaxAllowed {
                name: "Widget".to_string(),
                max_allowed: -3,
            },
        ];

        for route in routes {
            assert_eq!(route.to_path().parse::<Route>(), Ok(route));
        }
    }

    #[test]
    fn query_strings_are_ignored() {
        assert_eq!("/types?pretty=1".parse::<Route>(), Ok(Route::Types));
    }

    #[test]
    fn unknown_paths_are_rejected() {
        assert!("/".parse::<Route>().is_err());
        assert!("/types/".parse::<Route>().is_err());
        assert!("/types/V2lkZ2V0/max/lots".parse::<Route>().is_err());
        assert!("/types/!!!".parse::<Route>().is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&StatusJson {
            status: LeakStatus::Leaking,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"leaking"}"#);
    }
}
