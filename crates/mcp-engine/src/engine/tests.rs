//! Unit tests for the dispatch engine.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mcp_protocol::{MessageType, validate};
use mockall::mock;
use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::handler::{FailureKind, Handler, HandlerFailure};

mock! {
    pub GraphHandler {}

    impl Handler for GraphHandler {
        fn handle(&self, payload: &Payload) -> Result<Payload, HandlerFailure>;
    }
}

const REQUEST_ID: &str = "3d4b8a0e-7c91-4f26-b5d3-2a6e9c1f0b57";

fn success() -> Payload {
    let mut payload = Payload::new();
    payload.insert("status".to_owned(), Value::from("success"));
    payload
}

fn request(target: &str, action: &str) -> Value {
    json!({
        "id": REQUEST_ID,
        "timestamp": "2024-01-01T00:00:00Z",
        "type": "request",
        "action": action,
        "target": target,
        "payload": {"labels": ["Person"], "properties": {"name": "Jo"}},
    })
}

fn engine_with(handler: impl Handler + 'static) -> DispatchEngine {
    let mut registry = HandlerRegistry::new();
    registry
        .register("neo4j", "create_node", handler)
        .expect("register handler");
    DispatchEngine::new(registry)
}

#[fixture]
fn engine() -> DispatchEngine {
    engine_with(|_: &Payload| Ok::<_, HandlerFailure>(success()))
}

fn error_marker(response: &Envelope) -> Option<&str> {
    response.payload().get("error").and_then(Value::as_str)
}

#[test]
fn registered_handler_answers_with_correlated_response() {
    let mut handler = MockGraphHandler::new();
    handler
        .expect_handle()
        .withf(|payload| payload.get("labels") == Some(&json!(["Person"])))
        .times(1)
        .returning(|_| Ok(success()));
    let engine = engine_with(handler);

    let response = engine.process(&request("neo4j", "create_node"));

    assert_eq!(response.message_type(), MessageType::Response);
    assert_eq!(response.response_to(), Some(REQUEST_ID));
    assert_eq!(response.target(), "neo4j");
    assert_eq!(response.action(), "create_node");
    assert_eq!(response.payload(), &success());
    assert_ne!(response.id(), REQUEST_ID);
}

#[test]
fn non_uuid_ids_are_accepted_with_lenient_formats() {
    let mut registry = HandlerRegistry::new();
    registry
        .register("neo4j", "create_node", |_: &Payload| {
            Ok::<_, HandlerFailure>(success())
        })
        .expect("register handler");
    let options = EngineOptions::new().with_validation(ValidationOptions::lenient());
    let engine = DispatchEngine::with_options(registry, options);

    let mut raw = request("neo4j", "create_node");
    raw["id"] = json!("u1");
    let response = engine.process(&raw);

    assert_eq!(response.message_type(), MessageType::Response);
    assert_eq!(response.response_to(), Some("u1"));
    assert_eq!(response.target(), "neo4j");
    assert_eq!(response.payload().get("status"), Some(&json!("success")));
}

#[rstest]
fn missing_target_yields_error_naming_the_field(engine: DispatchEngine) {
    let mut raw = request("neo4j", "create_node");
    if let Some(object) = raw.as_object_mut() {
        object.remove("target");
    }

    let response = engine.process(&raw);

    assert_eq!(error_marker(&response), Some("invalid_message"));
    assert_eq!(response.payload().get("field"), Some(&json!("target")));
    assert_eq!(response.response_to(), Some(REQUEST_ID));
    assert_eq!(response.target(), FALLBACK_TARGET);
    assert_eq!(response.action(), "create_node");
}

#[rstest]
fn unregistered_key_yields_no_handler(engine: DispatchEngine) {
    let response = engine.process(&request("neo4j", "delete_everything"));

    assert_eq!(error_marker(&response), Some("no_handler"));
    assert_eq!(response.payload().get("target"), Some(&json!("neo4j")));
    assert_eq!(
        response.payload().get("action"),
        Some(&json!("delete_everything"))
    );
    assert_eq!(response.response_to(), Some(REQUEST_ID));
}

#[test]
fn handler_fault_yields_correlated_failure() {
    let mut handler = MockGraphHandler::new();
    handler
        .expect_handle()
        .times(1)
        .returning(|_| Err(HandlerFailure::internal("driver exploded")));
    let engine = engine_with(handler);

    let response = engine.process(&request("neo4j", "create_node"));

    assert_eq!(error_marker(&response), Some("handler_failure"));
    assert_eq!(response.payload().get("kind"), Some(&json!("internal")));
    assert_eq!(
        response.payload().get("message"),
        Some(&json!("driver exploded"))
    );
    assert_eq!(response.response_to(), Some(REQUEST_ID));
    assert_eq!(response.target(), "neo4j");
}

#[test]
fn slow_handler_yields_timeout_failure() {
    let mut registry = HandlerRegistry::new();
    registry
        .register("neo4j", "create_node", |_: &Payload| {
            thread::sleep(Duration::from_millis(500));
            Ok::<_, HandlerFailure>(success())
        })
        .expect("register handler");
    let options = EngineOptions::new().with_handler_timeout(Some(Duration::from_millis(20)));
    let engine = DispatchEngine::with_options(registry, options);

    let response = engine.process(&request("neo4j", "create_node"));

    assert_eq!(error_marker(&response), Some("handler_failure"));
    assert_eq!(
        response.payload().get("kind"),
        Some(&json!(FailureKind::Timeout.as_str()))
    );
    assert_eq!(response.response_to(), Some(REQUEST_ID));
}

#[test]
fn panicking_handler_yields_failure_not_panic() {
    let engine = engine_with(|_: &Payload| -> Result<Payload, HandlerFailure> {
        panic!("handler bug")
    });

    let response = engine.process(&request("neo4j", "create_node"));

    assert_eq!(error_marker(&response), Some("handler_failure"));
    assert_eq!(response.payload().get("kind"), Some(&json!("panicked")));
}

#[test]
fn inbound_response_is_rejected_without_invoking_handlers() {
    let mut handler = MockGraphHandler::new();
    handler.expect_handle().never();
    let engine = engine_with(handler);

    let mut raw = request("neo4j", "create_node");
    raw["type"] = json!("response");
    raw["response_to"] = json!("0b6f0f36-2a67-4d25-9b37-5a1c6c2d9e84");
    let response = engine.process(&raw);

    assert_eq!(error_marker(&response), Some("unsupported_message_type"));
    assert_eq!(response.response_to(), Some(REQUEST_ID));
}

#[test]
fn request_carrying_correlation_is_rejected() {
    let mut handler = MockGraphHandler::new();
    handler.expect_handle().never();
    let engine = engine_with(handler);

    let mut raw = request("neo4j", "create_node");
    raw["response_to"] = json!("0b6f0f36-2a67-4d25-9b37-5a1c6c2d9e84");
    let response = engine.process(&raw);

    assert_eq!(error_marker(&response), Some("invalid_message"));
    assert_eq!(response.payload().get("field"), Some(&json!("response_to")));
    assert_eq!(response.payload().get("rule"), Some(&json!("response_only")));
    assert_eq!(response.response_to(), Some(REQUEST_ID));
}

#[rstest]
#[case::array(json!([1, 2, 3]))]
#[case::null(Value::Null)]
#[case::empty_object(json!({}))]
#[case::numeric_id(json!({"id": 7, "target": ""}))]
fn garbage_gets_fresh_correlation(engine: DispatchEngine, #[case] raw: Value) {
    let response = engine.process(&raw);

    assert_eq!(error_marker(&response), Some("invalid_message"));
    assert_eq!(response.target(), FALLBACK_TARGET);
    assert_eq!(response.action(), FALLBACK_ACTION);
    let response_to = response.response_to().expect("responses are correlated");
    assert!(mcp_protocol::validator::is_uuid(response_to));
}

#[rstest]
#[case::not_json(b"{not json".as_slice())]
#[case::truncated(b"{\"id\": \"x\"".as_slice())]
fn undecodable_lines_are_rejected(engine: DispatchEngine, #[case] line: &[u8]) {
    let response = engine.process_line(line);

    assert_eq!(error_marker(&response), Some("invalid_message"));
    assert_eq!(response.payload().get("rule"), Some(&json!("json")));
}

#[rstest]
fn lines_are_trimmed_before_decoding(engine: DispatchEngine) {
    let mut line = b"  ".to_vec();
    line.extend_from_slice(request("neo4j", "create_node").to_string().as_bytes());
    line.extend_from_slice(b"\r\n");

    let response = engine.process_line(&line);

    assert_eq!(response.payload(), &success());
}

#[rstest]
fn responses_pass_schema_validation(engine: DispatchEngine) {
    let ok = engine.process(&request("neo4j", "create_node"));
    let failed = engine.process(&json!("nonsense"));

    for response in [ok, failed] {
        let revalidated = validate(&response.to_value().expect("response encodes"))
            .expect("responses are valid envelopes");
        assert_eq!(revalidated, response);
    }
}

#[test]
fn concurrent_requests_are_correlated() {
    let mut registry = HandlerRegistry::new();
    registry
        .register("neo4j", "run_cypher_query", |payload: &Payload| {
            thread::sleep(Duration::from_millis(5));
            let mut result = Payload::new();
            result.insert(
                "echo".to_owned(),
                payload.get("query").cloned().unwrap_or(Value::Null),
            );
            Ok::<_, HandlerFailure>(result)
        })
        .expect("register handler");
    let engine = Arc::new(DispatchEngine::new(registry));

    let workers: Vec<_> = (0..16)
        .map(|index| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let request = Envelope::request(
                    "run_cypher_query",
                    "neo4j",
                    json!({"query": format!("RETURN {index}")})
                        .as_object()
                        .cloned()
                        .unwrap_or_default(),
                    None,
                );
                let response = engine.process(&request.to_value().expect("request encodes"));
                (request, response)
            })
        })
        .collect();

    for worker in workers {
        let (request, response) = worker.join().expect("worker completes");
        assert_eq!(response.response_to(), Some(request.id()));
        assert_eq!(
            response.payload().get("echo"),
            request.payload().get("query")
        );
    }
}

#[rstest]
fn dispatch_reports_typed_errors(engine: DispatchEngine) {
    let unrouted = validate(&request("neo4j", "nope")).expect("valid request");
    let error = engine.dispatch(&unrouted).expect_err("unregistered");
    assert_eq!(error, DispatchError::no_handler("neo4j", "nope"));

    let routed = validate(&request("neo4j", "create_node")).expect("valid request");
    assert_eq!(engine.dispatch(&routed), Ok(success()));
}

#[test]
fn options_round_trip_through_engine() {
    let options = EngineOptions::new()
        .with_validation(ValidationOptions::lenient())
        .with_handler_timeout(None)
        .with_max_workers(4);
    let engine = DispatchEngine::with_options(HandlerRegistry::new(), options);
    assert_eq!(engine.options(), options);
    assert_eq!(engine.options().max_workers(), 4);
    assert_eq!(EngineOptions::new().with_max_workers(0).max_workers(), 1);
    assert!(engine.registry().is_empty());
}
