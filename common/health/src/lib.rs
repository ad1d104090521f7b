use std::collections::HashMap;
use std::ops::Add;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tracing::warn;

/// Health reporting for components of a service.
///
/// A process contains several asynchronous loops (HTTP server, database
/// monitor, workers) and can only be trusted while all of them are running
/// and reporting. `HealthRegistry` lets each loop register itself and report
/// its health; the process status is the combination of the component
/// statuses:
///   - if any component is unhealthy, the process is unhealthy
///   - if all components recently reported healthy, the process is healthy
///   - a component that failed to report within its deadline is unhealthy
#[derive(Default, Debug)]
pub struct HealthStatus {
    /// The overall status: true if all components are healthy.
    pub healthy: bool,
    /// Current status of each registered component, for display.
    pub components: HashMap<String, ComponentStatus>,
}

impl IntoResponse for HealthStatus {
    /// Computes the status code based on the overall health, and prints each
    /// component status in the body for debugging.
    fn into_response(self) -> Response {
        let body = format!("{self:?}");
        match self.healthy {
            true => (StatusCode::OK, body),
            false => (StatusCode::INTERNAL_SERVER_ERROR, body),
        }
        .into_response()
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ComponentStatus {
    /// Automatically set when a component is newly registered.
    Starting,
    /// Recently reported healthy, will need to report again before the date.
    HealthyUntil(time::OffsetDateTime),
    /// Reported unhealthy.
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_healthy(&self) -> bool {
        match self {
            ComponentStatus::HealthyUntil(until) => until.gt(&time::OffsetDateTime::now_utc()),
            _ => false,
        }
    }
}

struct HealthMessage {
    component: String,
    status: ComponentStatus,
}

#[derive(Clone)]
pub struct HealthHandle {
    component: String,
    deadline: Duration,
    sender: mpsc::Sender<HealthMessage>,
}

impl HealthHandle {
    /// Asynchronously report healthy, returns when the message is queued.
    /// Must be called more frequently than the configured deadline.
    pub async fn report_healthy(&self) {
        self.report_status(ComponentStatus::HealthyUntil(
            time::OffsetDateTime::now_utc().add(self.deadline),
        ))
        .await
    }

    /// Asynchronously report component status, returns when the message is queued.
    pub async fn report_status(&self, status: ComponentStatus) {
        let message = HealthMessage {
            component: self.component.clone(),
            status,
        };
        if let Err(err) = self.sender.send(message).await {
            warn!("failed to report health status: {}", err)
        }
    }
}

#[derive(Clone)]
pub struct HealthRegistry {
    name: String,
    components: Arc<RwLock<HashMap<String, ComponentStatus>>>,
    sender: mpsc::Sender<HealthMessage>,
}

impl HealthRegistry {
    pub fn new(name: &str) -> Self {
        let (sender, mut receiver) = mpsc::channel::<HealthMessage>(16);
        let components: Arc<RwLock<HashMap<String, ComponentStatus>>> = Default::default();

        let listed = components.clone();
        tokio::spawn(async move {
            while let Some(message) = receiver.recv().await {
                if let Ok(mut map) = listed.write() {
                    map.insert(message.component, message.status);
                }
            }
        });

        Self {
            name: name.to_string(),
            components,
            sender,
        }
    }

    /// Registers a new component in the registry. The returned handle should
    /// be passed to the component, to report its health.
    pub async fn register(&self, component: String, deadline: Duration) -> HealthHandle {
        let handle = HealthHandle {
            component,
            deadline,
            sender: self.sender.clone(),
        };
        if let Ok(mut map) = self.components.write() {
            map.insert(handle.component.clone(), ComponentStatus::Starting);
        }
        handle
    }

    /// Returns the overall process status, computed from the deadlines of
    /// all registered components.
    pub fn get_status(&self) -> HealthStatus {
        let components = match self.components.read() {
            Ok(map) => map.clone(),
            Err(_) => {
                warn!(registry = %self.name, "health registry lock poisoned");
                return HealthStatus {
                    healthy: false,
                    components: HashMap::new(),
                };
            }
        };

        let healthy = !components.is_empty() && components.values().all(|c| c.is_healthy());

        HealthStatus {
            healthy,
            components,
        }
    }
}
