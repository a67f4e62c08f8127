//! Background logging of leak status transitions.

use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::events::RegistryEvent;
use crate::json::LeakStatus;
use crate::registry::Registry;

/// Logs through `tracing` whenever a registry flips between sealed and leaking.
///
/// Created with [`Registry::watch`]. Dropping the watcher stops its thread.
#[derive(Debug)]
pub struct StatusWatcher {
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl StatusWatcher {
    pub(crate) fn spawn(registry: &Registry) -> Self {
        // Subscribe before reading the status so no transition falls in between.
        let events = registry.subscribe();
        let initial = registry.status();
        let (stop_tx, stop_rx) = bounded::<()>(1);

        if initial.is_leaking() {
            tracing::warn!("leakseal watcher started while already leaking");
        }

        let handle = thread::Builder::new()
            .name("ls-watch".into())
            .spawn(move || watch_loop(events, stop_rx, initial));

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!(error = %e, "failed to spawn leakseal watcher thread");
                None
            }
        };

        Self { stop_tx, handle }
    }
}

fn watch_loop(events: Receiver<RegistryEvent>, stop_rx: Receiver<()>, initial: LeakStatus) {
    let mut last = initial;

    loop {
        select! {
            recv(events) -> event => {
                match event {
                    Ok(event) => observe(&event, &mut last),
                    Err(_) => break,
                }
            }
            recv(stop_rx) -> _ => {
                // events sent before the stop signal are still logged
                for event in events.try_iter() {
                    observe(&event, &mut last);
                }
                break;
            }
        }
    }
}

fn observe(event: &RegistryEvent, last: &mut LeakStatus) {
    let status = event.status();
    if status != *last {
        log_transition(event, status);
        *last = status;
    }
}

fn log_transition(event: &RegistryEvent, status: LeakStatus) {
    match status {
        LeakStatus::Leaking => match event {
            RegistryEvent::Registered {
                type_name,
                current_count,
                ..
            } => tracing::warn!(
                type_name = %type_name,
                current_count,
                "possible leak: live instance count is over its limit"
            ),
            RegistryEvent::MaxAllowedChanged {
                type_name,
                max_allowed,
                ..
            } => tracing::warn!(
                type_name = %type_name,
                max_allowed,
                "possible leak: lowered limit is below the live instance count"
            ),
            RegistryEvent::Deregistered { type_name, .. } => tracing::warn!(
                type_name = %type_name,
                "possible leak reported after a deregistration"
            ),
        },
        LeakStatus::Sealed => tracing::info!(
            type_name = %event.type_name(),
            "sealed: every tracked type is within its limit"
        ),
    }
}

impl Drop for StatusWatcher {
    fn drop(&mut self) {
        let _ = self.stop_tx.try_send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
