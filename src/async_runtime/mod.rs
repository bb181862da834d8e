//! Async Check Runtime: decouples planning (pure, no I/O) from execution
//! (bounded-concurrency, timeout-bounded, cancellable).

pub mod resolver;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::ResolverError;
use crate::violation::Violation;

pub use resolver::{HttpResolver, InMemoryResolver};

/// The value a resolver produces. Kept intentionally small: rules that
/// need richer data can stuff it into `Raw` as JSON.
#[derive(Debug, Clone)]
pub enum ResolvedValue {
    TagExists(bool),
    Platform(String),
    /// A resolved content digest including its algorithm prefix, e.g.
    /// `sha256:abc123...`, as returned by the registry.
    Digest(String),
    Raw(serde_json::Value),
}

/// A pure, I/O-free description of one async check, produced by
/// `Rule::plan_async`.
pub struct CheckRequest {
    pub rule_code: String,
    pub category: String,
    /// Requests sharing `(resolver_id, dedup_key)` are probed exactly once.
    pub dedup_key: String,
    pub resolver_id: String,
    pub opaque_data: String,
    pub file: String,
    pub stage_index: Option<usize>,
    pub handler: Arc<dyn CheckHandler>,
}

/// Turns a resolved value (or error) into violations. Implemented per
/// rule so the runtime itself never needs to know what a resolver's
/// result means.
pub trait CheckHandler: Send + Sync {
    fn on_success(&self, request: &CheckRequest, value: &ResolvedValue) -> Vec<Violation>;

    /// Most resolver errors should be dropped silently; a handler
    /// overrides this only when a failure itself is diagnostic (e.g. "tag
    /// does not exist").
    fn on_error(&self, _request: &CheckRequest, _err: &ResolverError) -> Option<Violation> {
        None
    }
}

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A registered external collaborator that can satisfy one `resolver_id`.
pub trait Resolver: Send + Sync {
    fn resolver_id(&self) -> &'static str;

    fn resolve<'a>(&'a self, request: &'a CheckRequest) -> BoxFuture<'a, Result<ResolvedValue, ResolverError>>;
}

/// Knobs controlled by `Config`'s `slow_checks` section.
#[derive(Debug, Clone)]
pub struct AsyncConfig {
    pub enabled: bool,
    pub max_concurrency: usize,
    pub request_timeout: Duration,
    pub global_timeout: Duration,
}

impl Default for AsyncConfig {
    fn default() -> Self {
        AsyncConfig {
            enabled: true,
            max_concurrency: 8,
            request_timeout: Duration::from_secs(5),
            global_timeout: Duration::from_secs(20),
        }
    }
}

/// Runs every planned request to completion (or cancellation), grouped by
/// resolver and deduplicated by key, and returns the violations their
/// handlers produced. Never returns an error: a timed-out or failed
/// request simply contributes no violations, per the fail-fast contract
/// for async checks.
pub async fn run_async_checks(
    requests: Vec<CheckRequest>,
    resolvers: &[Arc<dyn Resolver>],
    config: &AsyncConfig,
) -> Vec<Violation> {
    if !config.enabled || requests.is_empty() {
        return Vec::new();
    }

    let mut by_key: HashMap<(String, String), Vec<usize>> = HashMap::new();
    for (i, req) in requests.iter().enumerate() {
        by_key
            .entry((req.resolver_id.clone(), req.dedup_key.clone()))
            .or_default()
            .push(i);
    }

    let semaphore = Arc::new(Semaphore::new(config.max_concurrency.max(1)));
    let request_timeout = config.request_timeout;

    let unique_keys: Vec<(String, String)> = by_key.keys().cloned().collect();
    let resolved: HashMap<(String, String), Result<ResolvedValue, ResolverError>> = {
        let tasks = unique_keys.into_iter().map(|key| {
            let semaphore = Arc::clone(&semaphore);
            let representative = requests[by_key[&key][0]]
                .opaque_data
                .clone();
            let resolver_id = key.0.clone();
            let resolver = resolvers.iter().find(|r| r.resolver_id() == resolver_id).cloned();
            let first_idx = by_key[&key][0];
            async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore never closed");
                let Some(resolver) = resolver else {
                    return (key, Err(ResolverError::Unregistered(resolver_id)));
                };
                let _ = representative;
                let result = tokio::time::timeout(request_timeout, resolver.resolve(&requests[first_idx]))
                    .await
                    .unwrap_or(Err(ResolverError::Timeout(request_timeout)));
                (key, result)
            }
        });

        let joined = futures::future::join_all(tasks);
        match tokio::time::timeout(config.global_timeout, joined).await {
            Ok(results) => results.into_iter().collect(),
            Err(_) => {
                tracing::warn!("async check budget of {:?} elapsed; outstanding checks cancelled", config.global_timeout);
                HashMap::new()
            }
        }
    };

    let mut violations = Vec::new();
    for request in &requests {
        let key = (request.resolver_id.clone(), request.dedup_key.clone());
        match resolved.get(&key) {
            Some(Ok(value)) => violations.extend(request.handler.on_success(request, value)),
            Some(Err(err)) => {
                if let Some(v) = request.handler.on_error(request, err) {
                    violations.push(v);
                }
            }
            // Global timeout elapsed before this key's future was polled to
            // completion: per the fail-fast contract, abandon it silently.
            None => {}
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::async_runtime::resolver::InMemoryResolver;
    use std::sync::Arc;

    struct TagExistsHandler;
    impl CheckHandler for TagExistsHandler {
        fn on_success(&self, request: &CheckRequest, value: &ResolvedValue) -> Vec<Violation> {
            if let ResolvedValue::TagExists(false) = value {
                vec![Violation::new(
                    crate::source_map::Location::file_level(&request.file),
                    &request.rule_code,
                    "tag does not exist",
                    crate::violation::Severity::Error,
                )]
            } else {
                Vec::new()
            }
        }
    }

    #[tokio::test]
    async fn dedups_identical_requests_to_one_resolve_call() {
        let resolver: Arc<dyn Resolver> = Arc::new(InMemoryResolver::always_exists());
        let handler = Arc::new(TagExistsHandler);
        let requests = vec![
            CheckRequest {
                rule_code: "tally/registry-tag-exists".into(),
                category: "registry".into(),
                dedup_key: "alpine:3.19".into(),
                resolver_id: "in-memory".into(),
                opaque_data: "alpine:3.19".into(),
                file: "Dockerfile".into(),
                stage_index: Some(0),
                handler: handler.clone(),
            },
            CheckRequest {
                rule_code: "tally/registry-tag-exists".into(),
                category: "registry".into(),
                dedup_key: "alpine:3.19".into(),
                resolver_id: "in-memory".into(),
                opaque_data: "alpine:3.19".into(),
                file: "Dockerfile".into(),
                stage_index: Some(1),
                handler,
            },
        ];
        let violations = run_async_checks(requests, &[resolver], &AsyncConfig::default()).await;
        assert!(violations.is_empty());
    }

    #[tokio::test]
    async fn global_timeout_abandons_pending_work_without_violations() {
        let resolver: Arc<dyn Resolver> = Arc::new(InMemoryResolver::with_delay(Duration::from_millis(200)));
        let handler = Arc::new(TagExistsHandler);
        let requests = vec![CheckRequest {
            rule_code: "tally/registry-tag-exists".into(),
            category: "registry".into(),
            dedup_key: "slow:latest".into(),
            resolver_id: "in-memory".into(),
            opaque_data: "slow:latest".into(),
            file: "Dockerfile".into(),
            stage_index: Some(0),
            handler,
        }];
        let config = AsyncConfig {
            global_timeout: Duration::from_millis(10),
            ..AsyncConfig::default()
        };
        let violations = run_async_checks(requests, &[resolver], &config).await;
        assert!(violations.is_empty());
    }
}
