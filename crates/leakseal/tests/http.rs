#[cfg(test)]
pub mod tests {
    use leakseal::{
        start_metrics_server, InstanceId, LeakSealJson, LeakStatus, Registry, Route, StatusJson,
        TrackedTypeJson,
    };
    use std::process::{Child, Command, Stdio};
    use std::thread::sleep;
    use std::time::Duration;

    fn serve(registry: &Registry) -> String {
        let addr = start_metrics_server(registry.clone(), "127.0.0.1:0")
            .expect("Failed to start metrics server");
        format!("http://{}", addr)
    }

    fn get_json<T: serde::de::DeserializeOwned>(url: &str) -> T {
        ureq::get(url)
            .call()
            .expect("GET request failed")
            .body_mut()
            .read_json()
            .expect("Failed to parse JSON")
    }

    #[test]
    fn test_status_and_types_endpoints() {
        let registry = Registry::new();
        let base = serve(&registry);

        let _a = registry.register_instance(InstanceId::from_raw(1), "Widget", 1);
        let _b = registry.register_instance(InstanceId::from_raw(2), "Widget", 1);
        let _c = registry.register_instance(InstanceId::from_raw(3), "net::Socket", 5);

        let status: StatusJson = get_json(&format!("{}{}", base, Route::Status.to_path()));
        assert_eq!(status.status, LeakStatus::Leaking);

        let report: LeakSealJson = get_json(&format!("{}{}", base, Route::Types.to_path()));
        assert_eq!(report.status, LeakStatus::Leaking);
        let names: Vec<&str> = report.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Widget", "net::Socket"]);

        let route = Route::Type {
            name: "net::Socket".to_string(),
        };
        let socket: TrackedTypeJson = get_json(&format!("{}{}", base, route.to_path()));
        assert_eq!(socket.current_count, 1);
        assert_eq!(socket.max_allowed, 5);
        assert!(!socket.is_over_limit);
        assert_eq!(socket.live_instance_ids, [InstanceId::from_raw(3)]);
    }

    #[test]
    fn test_set_max_allowed_endpoint() {
        let registry = Registry::new();
        let base = serve(&registry);

        let _a = registry.register_instance(InstanceId::from_raw(1), "Widget", 0);
        assert_eq!(registry.status(), LeakStatus::Leaking);

        let route = Route::SetMaxAllowed {
            name: "Widget".to_string(),
            max_allowed: 3,
        };
        let widget: TrackedTypeJson = ureq::post(&format!("{}{}", base, route.to_path()))
            .send_empty()
            .expect("POST request failed")
            .body_mut()
            .read_json()
            .expect("Failed to parse JSON");

        assert_eq!(widget.max_allowed, 3);
        assert!(!widget.is_over_limit);
        assert_eq!(registry.status(), LeakStatus::Sealed);

        let negative = Route::SetMaxAllowed {
            name: "Widget".to_string(),
            max_allowed: -1,
        };
        let _ = ureq::post(&format!("{}{}", base, negative.to_path()))
            .send_empty()
            .expect("POST request failed");
        assert_eq!(registry.get("Widget").unwrap().max_allowed(), -1);
        assert_eq!(registry.status(), LeakStatus::Leaking);
    }

    #[test]
    fn test_error_responses() {
        let registry = Registry::new();
        let base = serve(&registry);
        let _a = registry.register_instance(InstanceId::from_raw(1), "Widget", 1);

        let unknown_type = Route::Type {
            name: "Gadget".to_string(),
        };
        match ureq::get(&format!("{}{}", base, unknown_type.to_path())).call() {
            Err(ureq::Error::StatusCode(404)) => {}
            other => panic!("Expected 404 for unknown type, got: {:?}", other.map(|r| r.status())),
        }

        let unknown_set = Route::SetMaxAllowed {
            name: "Gadget".to_string(),
            max_allowed: 1,
        };
        match ureq::post(&format!("{}{}", base, unknown_set.to_path())).send_empty() {
            Err(ureq::Error::StatusCode(404)) => {}
            other => panic!("Expected 404 for unknown type, got: {:?}", other.map(|r| r.status())),
        }
        assert!(registry.get("Gadget").is_none());

        match ureq::get(&format!("{}/nope", base)).call() {
            Err(ureq::Error::StatusCode(404)) => {}
            other => panic!("Expected 404 for unknown route, got: {:?}", other.map(|r| r.status())),
        }

        let set_max = Route::SetMaxAllowed {
            name: "Widget".to_string(),
            max_allowed: 0,
        };
        match ureq::get(&format!("{}{}", base, set_max.to_path())).call() {
            Err(ureq::Error::StatusCode(405)) => {}
            other => panic!("Expected 405 for GET, got: {:?}", other.map(|r| r.status())),
        }
        assert_eq!(registry.get("Widget").unwrap().max_allowed(), 1);

        match ureq::post(&format!("{}{}", base, Route::Status.to_path())).send_empty() {
            Err(ureq::Error::StatusCode(405)) => {}
            other => panic!("Expected 405 for POST, got: {:?}", other.map(|r| r.status())),
        }
    }

    struct KillOnDrop(Child);

    impl Drop for KillOnDrop {
        fn drop(&mut self) {
            let _ = self.0.kill();
            let _ = self.0.wait();
        }
    }

    // LEAKSEAL_METRICS_PORT=6791 TEST_SLEEP_SECONDS=10 cargo run -p test-leakseal --example long_running
    #[test]
    fn test_global_registry_server() {
        let child = Command::new("cargo")
            .args(["run", "-p", "test-leakseal", "--example", "long_running"])
            .env("LEAKSEAL_METRICS_PORT", "6791")
            .env("TEST_SLEEP_SECONDS", "30")
            .env_remove("LEAKSEAL_METRICS_SERVER_OFF")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn command");
        let _child = KillOnDrop(child);

        let mut report = None;
        let mut last_error = None;

        // Give the example some time to build and start the server
        for _attempt in 0..120 {
            sleep(Duration::from_millis(500));

            match ureq::get("http://127.0.0.1:6791/types").call() {
                Ok(mut response) => {
                    report = Some(
                        response
                            .body_mut()
                            .read_json::<LeakSealJson>()
                            .expect("Failed to parse JSON"),
                    );
                    break;
                }
                Err(e) => last_error = Some(e.to_string()),
            }
        }

        let report = report.unwrap_or_else(|| {
            panic!("Failed to connect to /types: {:?}", last_error);
        });

        assert_eq!(report.status, LeakStatus::Leaking);

        let request = report
            .types
            .iter()
            .find(|t| t.name == "Request")
            .expect("Request type missing");
        assert_eq!(request.current_count, 3);
        assert_eq!(request.max_allowed, 5);

        let marker = report
            .types
            .iter()
            .find(|t| t.name == "examples/long_running.rs:21")
            .expect("Source labelled type missing");
        assert!(marker.is_over_limit);

        let route = Route::SetMaxAllowed {
            name: marker.name.clone(),
            max_allowed: 1,
        };
        let _ = ureq::post(&route.to_url("http://127.0.0.1", 6791))
            .send_empty()
            .expect("POST request failed");

        let status: StatusJson = get_json(&Route::Status.to_url("http://127.0.0.1", 6791));
        assert_eq!(status.status, LeakStatus::Sealed);
    }
}
