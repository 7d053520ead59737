//! Scriptable, recording [`MarketplaceApi`] implementation for tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::GatewayError;
use crate::gateway::MarketplaceApi;

/// Failure to script for one (resource, id) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    NotFound,
    Unavailable,
    Auth,
}

/// Mock marketplace: canned payloads per identifier, scripted failures,
/// and a call log for assertions. Unknown identifiers 404 like the real
/// API does.
#[derive(Default)]
pub struct MockGateway {
    resources: Mutex<HashMap<(&'static str, String), Value>>,
    failures: Mutex<HashMap<(&'static str, String), MockFailure>>,
    calls: Mutex<Vec<(&'static str, String)>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trip(self, id: &str, payload: Value) -> Self {
        self.insert("trip", id, payload);
        self
    }

    pub fn with_rfq(self, id: &str, payload: Value) -> Self {
        self.insert("rfq", id, payload);
        self
    }

    pub fn with_quote(self, id: &str, payload: Value) -> Self {
        self.insert("quote", id, payload);
        self
    }

    pub fn fail_trip(self, id: &str, failure: MockFailure) -> Self {
        self.fail("trip", id, failure);
        self
    }

    pub fn fail_quote(self, id: &str, failure: MockFailure) -> Self {
        self.fail("quote", id, failure);
        self
    }

    /// Identifiers requested for one resource type, in call order.
    pub fn calls_for(&self, resource: &'static str) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| *r == resource)
            .map(|(_, id)| id.clone())
            .collect()
    }

    pub fn fetches_of(&self, resource: &'static str) -> usize {
        self.calls_for(resource).len()
    }

    fn insert(&self, resource: &'static str, id: &str, payload: Value) {
        self.resources
            .lock()
            .unwrap()
            .insert((resource, id.to_string()), payload);
    }

    fn fail(&self, resource: &'static str, id: &str, failure: MockFailure) {
        self.failures
            .lock()
            .unwrap()
            .insert((resource, id.to_string()), failure);
    }

    fn lookup(&self, resource: &'static str, id: &str) -> Result<Value, GatewayError> {
        self.calls.lock().unwrap().push((resource, id.to_string()));

        let key = (resource, id.to_string());
        if let Some(failure) = self.failures.lock().unwrap().get(&key) {
            return Err(match failure {
                MockFailure::NotFound => GatewayError::NotFound {
                    resource,
                    id: id.to_string(),
                },
                MockFailure::Unavailable => GatewayError::Unavailable {
                    reason: format!("{} {} unreachable", resource, id),
                },
                MockFailure::Auth => GatewayError::Auth { status: 401 },
            });
        }

        self.resources
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .ok_or(GatewayError::NotFound {
                resource,
                id: id.to_string(),
            })
    }
}

#[async_trait]
impl MarketplaceApi for MockGateway {
    async fn get_trip(&self, id: &str) -> Result<Value, GatewayError> {
        self.lookup("trip", id)
    }

    async fn get_rfq(&self, id: &str) -> Result<Value, GatewayError> {
        self.lookup("rfq", id)
    }

    async fn get_quote(&self, id: &str) -> Result<Value, GatewayError> {
        self.lookup("quote", id)
    }
}
