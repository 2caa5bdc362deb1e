//! End-to-end gateway behavior against a scripted workflow engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use forma_core::config::dispatch::DispatchConfig;
use forma_core::error::ErrorKind;
use forma_core::result::AppResult;
use forma_core::types::id::{CorrelationId, SessionId, UserId};
use forma_dispatch::engine::WorkflowEngine;
use forma_dispatch::gateway::ActionDispatchGateway;
use forma_dispatch::registry::CorrelationRegistry;
use forma_dispatch::types::{ActionRequest, EntityRef, ResponseConfig};
use forma_entity::action::metadata::{ActionMetadata, RefuserMeta};
use forma_entity::action::types::ActionType;
use forma_service::context::RequestContext;

/// Scripted engine: counts submissions, optionally fails them all.
#[derive(Default)]
struct ScriptedEngine {
    submissions: AtomicUsize,
    fail: AtomicBool,
}

#[async_trait]
impl WorkflowEngine for ScriptedEngine {
    async fn submit(&self, _request: &ActionRequest) -> AppResult<()> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(forma_core::AppError::dispatch("engine unreachable"));
        }
        Ok(())
    }
}

fn context() -> RequestContext {
    RequestContext::new(
        UserId::new(),
        SessionId::new(),
        "Claire".to_string(),
        vec!["RECRUTEUR".to_string()],
    )
}

fn refuser_request(correlation_id: &str, entite_id: i64, timeout_seconds: u64) -> ActionRequest {
    ActionRequest {
        correlation_id: CorrelationId::from(correlation_id),
        action_type: ActionType::Refuser,
        action_source: Some("fiche_candidat".to_string()),
        action_button: None,
        entite: EntityRef {
            entite_type: "candidat".to_string(),
            entite_id,
        },
        entite_data: None,
        decision_type: Some("REFUS".to_string()),
        commentaire: None,
        metadonnees: ActionMetadata::Refuser(RefuserMeta {
            motif: "profil incomplet".to_string(),
            commentaire_interne: None,
        }),
        response: ResponseConfig {
            expected_response: "refus_traite".to_string(),
            timeout_seconds,
        },
        audience: None,
    }
}

fn gateway(engine: Arc<ScriptedEngine>) -> (ActionDispatchGateway, Arc<CorrelationRegistry>) {
    let registry = Arc::new(CorrelationRegistry::new());
    let gateway = ActionDispatchGateway::new(
        registry.clone(),
        engine,
        DispatchConfig::default(),
    );
    (gateway, registry)
}

#[tokio::test(start_paused = true)]
async fn accepted_action_is_registered_and_forwarded() {
    let engine = Arc::new(ScriptedEngine::default());
    let (gateway, registry) = gateway(engine.clone());

    let ack = gateway
        .trigger(&context(), refuser_request("c1", 42, 60))
        .await
        .unwrap();

    assert_eq!(ack.correlation_id, CorrelationId::from("c1"));
    assert_eq!(ack.timeout_seconds, 60);
    assert_eq!(engine.submissions.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn duplicate_in_flight_action_conflicts_with_remaining_ttl() {
    let engine = Arc::new(ScriptedEngine::default());
    let (gateway, _registry) = gateway(engine.clone());

    gateway
        .trigger(&context(), refuser_request("c1", 42, 60))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(5)).await;

    let err = gateway
        .trigger(&context(), refuser_request("c2", 42, 60))
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(err.message.contains("55"), "message was: {}", err.message);
    // The duplicate never reached the engine.
    assert_eq!(engine.submissions.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn same_entity_different_action_runs_concurrently() {
    let engine = Arc::new(ScriptedEngine::default());
    let (gateway, registry) = gateway(engine.clone());

    gateway
        .trigger(&context(), refuser_request("c1", 42, 60))
        .await
        .unwrap();

    let mut relance = refuser_request("c2", 42, 60);
    relance.action_type = ActionType::Relancer;
    relance.metadonnees = ActionMetadata::Relancer(forma_entity::action::metadata::RelancerMeta {
        canal: "email".to_string(),
        echeance: None,
    });

    gateway.trigger(&context(), relance).await.unwrap();
    assert_eq!(registry.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn forward_failure_is_synchronous_and_evicts() {
    let engine = Arc::new(ScriptedEngine::default());
    engine.fail.store(true, Ordering::SeqCst);
    let (gateway, registry) = gateway(engine.clone());

    let err = gateway
        .trigger(&context(), refuser_request("c1", 42, 60))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Dispatch);
    assert!(registry.is_empty());

    // The failed attempt does not leave a phantom conflict behind.
    engine.fail.store(false, Ordering::SeqCst);
    gateway
        .trigger(&context(), refuser_request("c2", 42, 60))
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn invalid_request_has_no_side_effects() {
    let engine = Arc::new(ScriptedEngine::default());
    let (gateway, registry) = gateway(engine.clone());

    let mut request = refuser_request("c1", 42, 60);
    request.entite.entite_type = String::new();

    let err = gateway.trigger(&context(), request).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(registry.is_empty());
    assert_eq!(engine.submissions.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn zero_timeout_falls_back_to_configured_default() {
    let engine = Arc::new(ScriptedEngine::default());
    let (gateway, _registry) = gateway(engine);

    let ack = gateway
        .trigger(&context(), refuser_request("c1", 42, 0))
        .await
        .unwrap();
    assert_eq!(ack.timeout_seconds, DispatchConfig::default().default_timeout_seconds);
}

#[tokio::test(start_paused = true)]
async fn key_frees_after_sweep_for_a_new_attempt() {
    let engine = Arc::new(ScriptedEngine::default());
    let (gateway, registry) = gateway(engine);

    gateway
        .trigger(&context(), refuser_request("c1", 42, 10))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(11)).await;
    registry.sweep();

    gateway
        .trigger(&context(), refuser_request("c2", 42, 60))
        .await
        .unwrap();
}
