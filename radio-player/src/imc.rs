//! Inter-Module Communication bus: a named registry plus broadcast and
//! point-to-point request/response between extensions, built around
//! `tokio::sync::Mutex` and opaque `serde_json::Value` payloads.

use crate::error::ImcError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// One registered endpoint: a name plus a handler.
#[async_trait]
pub trait ImcEndpoint: Send + Sync {
    async fn handle(&self, source: &str, payload: Value, broadcast: bool) -> Option<Value>;
}

/// Process-wide directory of named endpoints plus a broadcast fan-out.
/// Registration happens only during extension startup; the registry is
/// still behind a `Mutex` for that brief window and for the rare endpoints
/// that re-register later.
#[derive(Clone, Default)]
pub struct Imc {
    endpoints: Arc<Mutex<HashMap<String, Arc<dyn ImcEndpoint>>>>,
}

impl Imc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `name`. Returns `false` if the name is
    /// already taken (names are unique within one run).
    pub async fn register(&self, name: impl Into<String>, handler: Arc<dyn ImcEndpoint>) -> bool {
        let mut endpoints = self.endpoints.lock().await;
        let name = name.into();
        if endpoints.contains_key(&name) {
            return false;
        }
        endpoints.insert(name, handler);
        true
    }

    /// Point-to-point, synchronous from the caller's perspective.
    pub async fn send(
        &self,
        source: &str,
        name: &str,
        payload: Value,
    ) -> Result<Option<Value>, ImcError> {
        let handler = {
            let endpoints = self.endpoints.lock().await;
            endpoints
                .get(name)
                .cloned()
                .ok_or_else(|| ImcError::UnknownEndpoint(name.to_string()))?
        };
        Ok(handler.handle(source, payload, false).await)
    }

    /// Delivers to every registered endpoint except `source`, fire-and-forget
    /// (return values discarded).
    pub async fn broadcast(&self, source: &str, payload: Value) {
        let endpoints: Vec<(String, Arc<dyn ImcEndpoint>)> = {
            let endpoints = self.endpoints.lock().await;
            endpoints
                .iter()
                .filter(|(name, _)| name.as_str() != source)
                .map(|(name, handler)| (name.clone(), Arc::clone(handler)))
                .collect()
        };
        for (_, handler) in endpoints {
            handler.handle(source, payload.clone(), true).await;
        }
    }
}
