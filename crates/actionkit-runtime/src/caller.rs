//! Batch action caller.
//!
//! Given a registry and a batch of `{ action_id, arguments }` requests,
//! produces one result per request. Items are validated, authenticated and
//! executed independently: a failure in one item never aborts its siblings,
//! and output order always matches input order regardless of execution mode.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

use actionkit_core::{
    sanitize_json_value, ActionDefinition, AuthConfig, CallContext, OutputSchema, ResolvedAuth,
};
use actionkit_registry::ActionRegistry;

use crate::resolver::{OAuthTokenResolver, TokenAuthResolver};
use crate::result::{CallMetadata, CallResult};

/// What to do with a request addressing an id the registry does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownActionPolicy {
    /// Drop the request silently; it produces no result item.
    Skip,
    /// Produce an error result item.
    #[default]
    Report,
}

/// Caller configuration.
///
/// The resolver callbacks mirror the action auth kinds: a `Token` action
/// requires `fetch_token_auth`, an `OAuth` action requires
/// `fetch_oauth_token`. A missing callback surfaces as a per-item error,
/// not a batch abort.
#[derive(Clone, Default)]
pub struct CallerConfig {
    pub fetch_token_auth: Option<Arc<dyn TokenAuthResolver>>,
    pub fetch_oauth_token: Option<Arc<dyn OAuthTokenResolver>>,
    /// Run batch items concurrently. Credentials resolved during a parallel
    /// batch are cached per action id; two concurrent first-uses of the same
    /// id may both invoke the resolver (benign for read-only fetches — run
    /// sequentially if your resolver has side effects).
    pub parallel: bool,
    pub unknown_action: UnknownActionPolicy,
    /// Handler-context extras, validated against each action's context
    /// schema when one is configured.
    pub extras: Option<JsonValue>,
    /// Per-item execution timeout.
    pub timeout: Option<Duration>,
}

impl CallerConfig {
    pub fn with_token_resolver(mut self, resolver: Arc<dyn TokenAuthResolver>) -> Self {
        self.fetch_token_auth = Some(resolver);
        self
    }

    pub fn with_oauth_resolver(mut self, resolver: Arc<dyn OAuthTokenResolver>) -> Self {
        self.fetch_oauth_token = Some(resolver);
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_unknown_action(mut self, policy: UnknownActionPolicy) -> Self {
        self.unknown_action = policy;
        self
    }

    pub fn with_extras(mut self, extras: JsonValue) -> Self {
        self.extras = Some(extras);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl std::fmt::Debug for CallerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallerConfig")
            .field("fetch_token_auth", &self.fetch_token_auth.as_ref().map(|_| "<resolver>"))
            .field("fetch_oauth_token", &self.fetch_oauth_token.as_ref().map(|_| "<resolver>"))
            .field("parallel", &self.parallel)
            .field("unknown_action", &self.unknown_action)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Which declared input shape a request's arguments target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestShape {
    /// The LLM-facing input schema.
    #[default]
    Input,
    /// The submission schema negotiated by the action's UI component;
    /// falls back to the input schema when none is declared.
    Submission,
}

/// One requested action invocation.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub action_id: String,
    pub arguments: JsonValue,
    /// Correlates the result item back to this request; generated when not
    /// supplied.
    pub correlation_id: Option<String>,
    pub shape: RequestShape,
}

impl ActionRequest {
    pub fn new(action_id: impl Into<String>, arguments: JsonValue) -> Self {
        Self {
            action_id: action_id.into(),
            arguments,
            correlation_id: None,
            shape: RequestShape::Input,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Mark the arguments as a component submission.
    pub fn as_submission(mut self) -> Self {
        self.shape = RequestShape::Submission;
        self
    }
}

/// Per-batch credential cache, keyed by action id. Local to one `call`
/// invocation; never shared across batches.
type CredentialCache = Arc<RwLock<HashMap<String, ResolvedAuth>>>;

/// Batch caller over a shared registry.
#[derive(Debug, Clone)]
pub struct ActionCaller {
    registry: Arc<ActionRegistry>,
    config: CallerConfig,
}

impl ActionCaller {
    pub fn new(registry: Arc<ActionRegistry>, config: CallerConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Execute a batch. Returns one result per non-skipped request, in
    /// request order.
    pub async fn call(&self, requests: Vec<ActionRequest>) -> Vec<CallResult> {
        let cache: CredentialCache = Arc::new(RwLock::new(HashMap::new()));

        tracing::debug!(
            requests = requests.len(),
            parallel = self.config.parallel,
            "starting action batch"
        );

        let indexed: Vec<(usize, ActionRequest)> = requests.into_iter().enumerate().collect();

        let mut results: Vec<(usize, Option<CallResult>)> = if self.config.parallel {
            let futures = indexed.into_iter().map(|(seq, request)| {
                let cache = cache.clone();
                async move { (seq, self.run_one(request, &cache).await) }
            });
            join_all(futures).await
        } else {
            let mut collected = Vec::with_capacity(indexed.len());
            for (seq, request) in indexed {
                collected.push((seq, self.run_one(request, &cache).await));
            }
            collected
        };

        // Restore request order regardless of completion order.
        results.sort_by_key(|(seq, _)| *seq);
        results.into_iter().filter_map(|(_, result)| result).collect()
    }

    /// Execute one request; `None` means the request was skipped per the
    /// unknown-action policy.
    async fn run_one(
        &self,
        request: ActionRequest,
        cache: &CredentialCache,
    ) -> Option<CallResult> {
        let start = std::time::Instant::now();
        let timestamp = chrono::Utc::now();
        let correlation_id = request
            .correlation_id
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let action_id = request.action_id.clone();

        let metadata = |start: std::time::Instant| CallMetadata {
            duration_ms: start.elapsed().as_millis() as u64,
            timestamp,
        };
        let fail = |message: String, cause: Option<String>| CallResult::Error {
            action_id: action_id.clone(),
            correlation_id: correlation_id.clone(),
            message,
            cause,
            metadata: metadata(start),
        };

        let Some(action) = self.registry.get(&request.action_id) else {
            return match self.config.unknown_action {
                UnknownActionPolicy::Skip => {
                    tracing::debug!(action_id = %request.action_id, "skipping unknown action");
                    None
                }
                UnknownActionPolicy::Report => {
                    Some(fail(format!("unknown action id: '{}'", request.action_id), None))
                }
            };
        };
        let action = action.clone();

        // Validate arguments against the addressed input shape.
        let schema = match request.shape {
            RequestShape::Submission => {
                action.submission_schema().unwrap_or_else(|| action.input_schema())
            }
            RequestShape::Input => action.input_schema(),
        };
        if let Err(e) = schema.validate(&request.arguments) {
            return Some(fail(format!("invalid arguments: {e}"), None));
        }

        // Resolve credentials, consulting the per-batch cache.
        let auth = match self.resolve_auth(&action, cache).await {
            Ok(auth) => auth,
            Err(message) => return Some(fail(message, None)),
        };

        // Validate caller extras when the action declares a context shape.
        if let (Some(schema), Some(extras)) = (action.context_schema(), &self.config.extras) {
            if let Err(e) = schema.validate(extras) {
                return Some(fail(format!("invalid context extras: {e}"), None));
            }
        }

        tracing::debug!(
            action_id = %action_id,
            arguments = %sanitize_json_value(&request.arguments),
            "executing action"
        );

        let context = CallContext::new(self.config.extras.clone());
        let execution = action.invoke(request.arguments, auth, context);
        let output = match self.config.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, execution).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(action_id = %action_id, ?timeout, "action timed out");
                    return Some(fail(format!("execution timed out after {timeout:?}"), None));
                }
            },
            None => execution.await,
        };

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(action_id = %action_id, error = %e, "action handler failed");
                return Some(fail("action handler failed".to_string(), Some(e.to_string())));
            }
        };

        // Validate the handler output against the declared output schema.
        let data = match action.output_schema() {
            OutputSchema::Void => None,
            OutputSchema::Data(schema) => {
                if let Err(e) = schema.validate(&output) {
                    return Some(fail(format!("invalid handler output: {e}"), None));
                }
                Some(output)
            }
        };

        tracing::info!(
            action_id = %action_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "action completed"
        );

        Some(CallResult::Success {
            action_id,
            correlation_id,
            data,
            metadata: metadata(start),
        })
    }

    /// Resolve credential material for one action, caching per action id
    /// within the batch.
    async fn resolve_auth(
        &self,
        action: &ActionDefinition,
        cache: &CredentialCache,
    ) -> Result<Option<ResolvedAuth>, String> {
        if matches!(action.auth(), AuthConfig::None) {
            return Ok(None);
        }

        let key = action.id().as_str().to_string();
        {
            let cache = cache.read().await;
            if let Some(resolved) = cache.get(&key) {
                return Ok(Some(resolved.clone()));
            }
        }

        let resolved = match action.auth() {
            AuthConfig::None => unreachable!("handled above"),
            AuthConfig::Token(_) => {
                let resolver = self.config.fetch_token_auth.as_ref().ok_or_else(|| {
                    format!(
                        "no fetch_token_auth callback configured for token action '{}'",
                        action.id()
                    )
                })?;
                let data = resolver
                    .fetch(action)
                    .await
                    .map_err(|e| format!("token auth resolution failed: {e}"))?;
                ResolvedAuth::Token(data)
            }
            AuthConfig::OAuth(_) => {
                let resolver = self.config.fetch_oauth_token.as_ref().ok_or_else(|| {
                    format!(
                        "no fetch_oauth_token callback configured for oauth action '{}'",
                        action.id()
                    )
                })?;
                let data = resolver
                    .fetch(action)
                    .await
                    .map_err(|e| format!("oauth token resolution failed: {e}"))?;
                ResolvedAuth::OAuth(data)
            }
        };

        let mut cache = cache.write().await;
        cache.insert(key, resolved.clone());
        Ok(Some(resolved))
    }
}
