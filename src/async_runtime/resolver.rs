//! Concrete `Resolver` implementations: an in-memory one for tests and a
//! `reqwest`-backed one for real registry probes.

use std::time::Duration;

use crate::async_runtime::{BoxFuture, CheckRequest, ResolvedValue, Resolver};
use crate::error::ResolverError;

/// A resolver that never leaves the process — useful for tests and for
/// demonstrating the runtime without a network dependency.
pub struct InMemoryResolver {
    id: &'static str,
    value: ResolvedValue,
    delay: Duration,
}

impl InMemoryResolver {
    pub fn always_exists() -> Self {
        InMemoryResolver { id: "in-memory", value: ResolvedValue::TagExists(true), delay: Duration::ZERO }
    }

    pub fn always_missing() -> Self {
        InMemoryResolver { id: "in-memory", value: ResolvedValue::TagExists(false), delay: Duration::ZERO }
    }

    pub fn with_delay(delay: Duration) -> Self {
        InMemoryResolver { id: "in-memory", value: ResolvedValue::TagExists(true), delay }
    }

    pub fn with_digest(digest: impl Into<String>) -> Self {
        InMemoryResolver { id: "in-memory", value: ResolvedValue::Digest(digest.into()), delay: Duration::ZERO }
    }

    /// Overrides the resolver id this instance answers to, so a test can
    /// stand in for a specific registered resolver (e.g. `"http-registry"`)
    /// without making a real network call.
    pub fn as_resolver_id(mut self, id: &'static str) -> Self {
        self.id = id;
        self
    }
}

impl Resolver for InMemoryResolver {
    fn resolver_id(&self) -> &'static str {
        self.id
    }

    fn resolve<'a>(&'a self, _request: &'a CheckRequest) -> BoxFuture<'a, Result<ResolvedValue, ResolverError>> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.value.clone())
        })
    }
}

/// Probes a real container registry's v2 manifest endpoint for tag
/// existence. Kept behind the `Resolver` trait so no rule depends on it
/// directly.
pub struct HttpResolver {
    client: reqwest::Client,
    registry_base: String,
}

impl HttpResolver {
    pub fn new(registry_base: impl Into<String>) -> Self {
        HttpResolver {
            client: reqwest::Client::new(),
            registry_base: registry_base.into(),
        }
    }
}

impl Resolver for HttpResolver {
    fn resolver_id(&self) -> &'static str {
        "http-registry"
    }

    fn resolve<'a>(&'a self, request: &'a CheckRequest) -> BoxFuture<'a, Result<ResolvedValue, ResolverError>> {
        Box::pin(async move {
            let (image, tag) = request
                .opaque_data
                .rsplit_once(':')
                .unwrap_or((request.opaque_data.as_str(), "latest"));
            let url = format!("{}/v2/{image}/manifests/{tag}", self.registry_base);

            let response = self
                .client
                .head(&url)
                .send()
                .await
                .map_err(|e| ResolverError::Transport(e.to_string()))?;

            if request.category == "pin-digest" {
                return response
                    .headers()
                    .get("Docker-Content-Digest")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| ResolvedValue::Digest(v.to_string()))
                    .ok_or_else(|| ResolverError::Transport(format!("{url} response carried no Docker-Content-Digest header")));
            }

            Ok(ResolvedValue::TagExists(response.status().is_success()))
        })
    }
}
