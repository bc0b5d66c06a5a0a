//! End-to-end batch caller tests over real registries, handlers and stores.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};

use actionkit_core::{
    ActionDefinition, ActionFactory, ActionMetadata, AuthKind, CoreError, FieldSchema,
    LinkedAccount, LinkedAccountStore, OAuthAuthData, OAuthConfig, OAuthEndpoints, ObjectSchema,
    Schema, TokenAuthConfig, TokenAuthData,
};
use actionkit_registry::ActionRegistry;
use actionkit_runtime::{
    ActionCaller, ActionRequest, CallResult, CallerConfig, OAuthTokenResolver, RuntimeResult,
    StoreAuthResolver, TokenAuthResolver, TokenRefresher, UnknownActionPolicy,
};
use actionkit_store::MemoryLinkedAccountStore;

fn data_schema() -> Schema {
    ObjectSchema::new().field("data", FieldSchema::string()).build().unwrap()
}

fn metadata(title: &str) -> ActionMetadata {
    ActionMetadata::new(title, format!("{title} action"), "Test")
}

fn echo_action(id: &str) -> ActionDefinition {
    ActionFactory::new("test")
        .create_action(id, metadata(id))
        .unwrap()
        .input(data_schema())
        .query(data_schema())
        .no_auth()
        .handler(|input, _ctx| async move { Ok(input) })
}

fn failing_action(id: &str) -> ActionDefinition {
    ActionFactory::new("test")
        .create_action(id, metadata(id))
        .unwrap()
        .input(data_schema())
        .query(data_schema())
        .no_auth()
        .handler(|_input, _ctx| async move {
            Err(CoreError::Other("upstream returned 500".into()))
        })
}

fn sleepy_action(id: &str, delay: Duration) -> ActionDefinition {
    ActionFactory::new("test")
        .create_action(id, metadata(id))
        .unwrap()
        .input(data_schema())
        .query(data_schema())
        .no_auth()
        .handler(move |input, _ctx| async move {
            tokio::time::sleep(delay).await;
            Ok(input)
        })
}

fn token_action(id: &str) -> ActionDefinition {
    ActionFactory::new("test")
        .create_action(id, metadata(id))
        .unwrap()
        .input(data_schema())
        .query(data_schema())
        .token_auth(TokenAuthConfig::new("Link account"))
        .unwrap()
        .handler(|_input, auth, _ctx| async move { Ok(json!({ "data": auth.access_token })) })
}

fn oauth_action(id: &str) -> ActionDefinition {
    let endpoints = OAuthEndpoints::Discovery {
        discovery_url: "https://accounts.example.com/.well-known/openid-configuration".into(),
    };
    ActionFactory::new("test")
        .create_action(id, metadata(id))
        .unwrap()
        .input(data_schema())
        .query(data_schema())
        .oauth(OAuthConfig::new("Connect", vec!["email".into()], endpoints))
        .unwrap()
        .handler(|_input, auth, _ctx| async move { Ok(json!({ "data": auth.access_token })) })
}

fn caller(
    actions: Vec<ActionDefinition>,
    config: CallerConfig,
) -> ActionCaller {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let registry = ActionRegistry::from_actions(actions).unwrap();
    ActionCaller::new(Arc::new(registry), config)
}

struct CountingTokenResolver {
    calls: AtomicUsize,
}

impl CountingTokenResolver {
    fn new() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl TokenAuthResolver for CountingTokenResolver {
    async fn fetch(&self, _action: &ActionDefinition) -> RuntimeResult<TokenAuthData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TokenAuthData::new("tok_counted"))
    }
}

struct StaticOAuthResolver;

#[async_trait]
impl OAuthTokenResolver for StaticOAuthResolver {
    async fn fetch(&self, _action: &ActionDefinition) -> RuntimeResult<OAuthAuthData> {
        Ok(OAuthAuthData::new("ya29.static"))
    }
}

#[tokio::test]
async fn echo_round_trip() {
    let caller = caller(vec![echo_action("echo")], CallerConfig::default());
    let results = caller
        .call(vec![
            ActionRequest::new("echo", json!({ "data": "hello" })).with_correlation_id("c-1"),
        ])
        .await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_success());
    assert_eq!(results[0].correlation_id(), "c-1");
    assert_eq!(results[0].data(), Some(&json!({ "data": "hello" })));
}

#[tokio::test]
async fn failure_does_not_abort_siblings() {
    let caller = caller(
        vec![echo_action("echo"), failing_action("broken")],
        CallerConfig::default(),
    );
    let results = caller
        .call(vec![
            ActionRequest::new("broken", json!({ "data": "x" })),
            ActionRequest::new("echo", json!({ "data": "still here" })),
        ])
        .await;

    assert_eq!(results.len(), 2);
    assert!(!results[0].is_success());
    assert!(results[1].is_success());
    assert_eq!(results[1].data(), Some(&json!({ "data": "still here" })));

    let CallResult::Error { cause, .. } = &results[0] else {
        panic!("expected an error item");
    };
    assert!(cause.as_deref().unwrap().contains("upstream returned 500"));
}

#[tokio::test]
async fn parallel_results_keep_request_order() {
    let caller = caller(
        vec![
            sleepy_action("slow", Duration::from_millis(80)),
            sleepy_action("fast", Duration::from_millis(5)),
        ],
        CallerConfig::default().with_parallel(true),
    );
    let results = caller
        .call(vec![
            ActionRequest::new("slow", json!({ "data": "first" })),
            ActionRequest::new("fast", json!({ "data": "second" })),
            ActionRequest::new("slow", json!({ "data": "third" })),
        ])
        .await;

    let ids: Vec<&str> = results.iter().map(|r| r.action_id()).collect();
    assert_eq!(ids, vec!["slow", "fast", "slow"]);
    assert_eq!(results[0].data(), Some(&json!({ "data": "first" })));
    assert_eq!(results[2].data(), Some(&json!({ "data": "third" })));
}

#[tokio::test]
async fn invalid_arguments_fail_per_item() {
    let caller = caller(vec![echo_action("echo")], CallerConfig::default());
    let results = caller
        .call(vec![
            ActionRequest::new("echo", json!({ "data": 42 })),
            ActionRequest::new("echo", json!({ "data": "fine" })),
        ])
        .await;

    assert!(results[0].error_message().unwrap().contains("invalid arguments"));
    assert!(results[1].is_success());
}

#[tokio::test]
async fn unknown_action_reported_by_default() {
    let caller = caller(vec![echo_action("echo")], CallerConfig::default());
    let results = caller.call(vec![ActionRequest::new("nope", json!({}))]).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].action_id(), "nope");
    assert!(results[0].error_message().unwrap().contains("unknown action id: 'nope'"));
}

#[tokio::test]
async fn unknown_action_skipped_when_configured() {
    let caller = caller(
        vec![echo_action("echo")],
        CallerConfig::default().with_unknown_action(UnknownActionPolicy::Skip),
    );
    let results = caller
        .call(vec![
            ActionRequest::new("nope", json!({})),
            ActionRequest::new("echo", json!({ "data": "kept" })),
        ])
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].action_id(), "echo");
}

#[tokio::test]
async fn missing_resolvers_surface_per_item_errors() {
    let caller = caller(
        vec![token_action("pscale"), oauth_action("gmail")],
        CallerConfig::default(),
    );
    let results = caller
        .call(vec![
            ActionRequest::new("pscale", json!({ "data": "x" })),
            ActionRequest::new("gmail", json!({ "data": "x" })),
        ])
        .await;

    assert_eq!(
        results[0].error_message().unwrap(),
        "no fetch_token_auth callback configured for token action 'pscale'"
    );
    assert_eq!(
        results[1].error_message().unwrap(),
        "no fetch_oauth_token callback configured for oauth action 'gmail'"
    );
}

#[tokio::test]
async fn credentials_cached_per_batch() {
    let resolver = CountingTokenResolver::new();
    let caller = caller(
        vec![token_action("pscale")],
        CallerConfig::default().with_token_resolver(resolver.clone()),
    );

    let results = caller
        .call(vec![
            ActionRequest::new("pscale", json!({ "data": "one" })),
            ActionRequest::new("pscale", json!({ "data": "two" })),
            ActionRequest::new("pscale", json!({ "data": "three" })),
        ])
        .await;

    assert!(results.iter().all(CallResult::is_success));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);

    // The cache is per batch: a second batch resolves again.
    caller.call(vec![ActionRequest::new("pscale", json!({ "data": "x" }))]).await;
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn oauth_token_flows_to_handler() {
    let caller = caller(
        vec![oauth_action("gmail")],
        CallerConfig::default().with_oauth_resolver(Arc::new(StaticOAuthResolver)),
    );
    let results = caller.call(vec![ActionRequest::new("gmail", json!({ "data": "x" }))]).await;
    assert_eq!(results[0].data(), Some(&json!({ "data": "ya29.static" })));
}

#[tokio::test]
async fn extras_validated_against_context_schema() {
    let context_schema = ObjectSchema::new()
        .field("user_id", FieldSchema::string())
        .build()
        .unwrap();
    let action = ActionFactory::new("test")
        .with_context_schema(context_schema)
        .create_action("whoami", metadata("whoami"))
        .unwrap()
        .input(data_schema())
        .query(data_schema())
        .no_auth()
        .handler(|_input, ctx| async move {
            let user = ctx.extras.as_ref().and_then(|e| e["user_id"].as_str()).unwrap_or("?");
            Ok(json!({ "data": user }))
        });

    let ok = caller(
        vec![action.clone()],
        CallerConfig::default().with_extras(json!({ "user_id": "u-7" })),
    );
    let results = ok.call(vec![ActionRequest::new("whoami", json!({ "data": "x" }))]).await;
    assert_eq!(results[0].data(), Some(&json!({ "data": "u-7" })));

    let bad = caller(
        vec![action],
        CallerConfig::default().with_extras(json!({ "user_id": 7 })),
    );
    let results = bad.call(vec![ActionRequest::new("whoami", json!({ "data": "x" }))]).await;
    assert!(results[0].error_message().unwrap().contains("invalid context extras"));
}

#[tokio::test]
async fn submission_shape_targets_submission_schema() {
    let submission = ObjectSchema::new()
        .field("confirmed", FieldSchema::boolean())
        .build()
        .unwrap();
    let action = ActionFactory::new("test")
        .create_action("send-email", metadata("send-email"))
        .unwrap()
        .input(data_schema())
        .mutation()
        .component("email-form")
        .submission_schema(submission)
        .no_auth()
        .handler(|_input, _ctx| async move { Ok(JsonValue::Null) });

    let caller = caller(vec![action], CallerConfig::default());

    // Submission arguments fail the input schema but pass the submission one.
    let args = json!({ "confirmed": true });
    let results = caller
        .call(vec![ActionRequest::new("send-email", args.clone())])
        .await;
    assert!(!results[0].is_success());

    let results = caller
        .call(vec![ActionRequest::new("send-email", args).as_submission()])
        .await;
    assert!(results[0].is_success());
    // Void output: the success item carries no data.
    assert!(results[0].data().is_none());
}

#[tokio::test]
async fn handler_output_checked_against_output_schema() {
    let lying = ActionFactory::new("test")
        .create_action("lying", metadata("lying"))
        .unwrap()
        .input(data_schema())
        .query(data_schema())
        .no_auth()
        .handler(|_input, _ctx| async move { Ok(json!({ "data": 123 })) });

    let caller = caller(vec![lying], CallerConfig::default());
    let results = caller.call(vec![ActionRequest::new("lying", json!({ "data": "x" }))]).await;
    assert!(results[0].error_message().unwrap().contains("invalid handler output"));
}

#[tokio::test]
async fn slow_handler_times_out() {
    let caller = caller(
        vec![sleepy_action("slow", Duration::from_secs(5))],
        CallerConfig::default().with_timeout(Duration::from_millis(20)),
    );
    let results = caller.call(vec![ActionRequest::new("slow", json!({ "data": "x" }))]).await;
    assert!(results[0].error_message().unwrap().contains("timed out"));
}

#[tokio::test]
async fn store_resolver_feeds_token_actions() {
    let store = MemoryLinkedAccountStore::new();
    store
        .upsert(
            &LinkedAccount::new("pscale", AuthKind::Token, "pscale_tkn")
                .with_custom_data(json!({ "organization": "acme" })),
        )
        .await
        .unwrap();

    let resolver = Arc::new(StoreAuthResolver::new(Arc::new(store)));
    let caller = caller(
        vec![token_action("pscale"), token_action("unlinked")],
        CallerConfig::default().with_token_resolver(resolver),
    );

    let results = caller
        .call(vec![
            ActionRequest::new("pscale", json!({ "data": "x" })),
            ActionRequest::new("unlinked", json!({ "data": "x" })),
        ])
        .await;

    assert_eq!(results[0].data(), Some(&json!({ "data": "pscale_tkn" })));
    assert!(results[1]
        .error_message()
        .unwrap()
        .contains("no linked account for action 'unlinked'"));
}

struct FixedRefresher;

#[async_trait]
impl TokenRefresher for FixedRefresher {
    async fn refresh(
        &self,
        _action: &ActionDefinition,
        account: &LinkedAccount,
    ) -> RuntimeResult<LinkedAccount> {
        let mut renewed = account.clone();
        renewed.access_token = "ya29.renewed".into();
        renewed.expires_at = Some(chrono::Utc::now().timestamp() + 3600);
        Ok(renewed)
    }
}

#[tokio::test]
async fn expired_oauth_credential_refreshed_and_persisted() {
    let store = Arc::new(MemoryLinkedAccountStore::new());
    store
        .upsert(
            &LinkedAccount::new("gmail", AuthKind::OAuth, "ya29.stale")
                .with_refresh_token("rt")
                .with_expires_at(chrono::Utc::now().timestamp() - 60),
        )
        .await
        .unwrap();

    let resolver =
        Arc::new(StoreAuthResolver::new(store.clone()).with_refresher(Arc::new(FixedRefresher)));
    let caller = caller(
        vec![oauth_action("gmail")],
        CallerConfig::default().with_oauth_resolver(resolver),
    );

    let results = caller.call(vec![ActionRequest::new("gmail", json!({ "data": "x" }))]).await;
    assert_eq!(results[0].data(), Some(&json!({ "data": "ya29.renewed" })));

    // The renewed credential was written back.
    let stored = store.get(&"gmail".into()).await.unwrap().unwrap();
    assert_eq!(stored.access_token, "ya29.renewed");
}

#[tokio::test]
async fn expired_oauth_without_refresher_errors() {
    let store = Arc::new(MemoryLinkedAccountStore::new());
    store
        .upsert(
            &LinkedAccount::new("gmail", AuthKind::OAuth, "ya29.stale")
                .with_expires_at(chrono::Utc::now().timestamp() - 60),
        )
        .await
        .unwrap();

    let resolver = Arc::new(StoreAuthResolver::new(store));
    let caller = caller(
        vec![oauth_action("gmail")],
        CallerConfig::default().with_oauth_resolver(resolver),
    );

    let results = caller.call(vec![ActionRequest::new("gmail", json!({ "data": "x" }))]).await;
    assert!(results[0].error_message().unwrap().contains("expired"));
}
