//! Unit tests for envelope construction and serialisation.

use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use super::*;

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object payload, got {other}"),
    }
}

#[test]
fn request_fills_identifier_and_timestamp() {
    let request = Envelope::request(
        "create_node",
        "neo4j",
        payload(json!({"labels": ["Person"]})),
        None,
    );

    assert!(Uuid::try_parse(request.id()).is_ok(), "id: {}", request.id());
    assert!(OffsetDateTime::parse(request.timestamp(), &Rfc3339).is_ok());
    assert_eq!(request.message_type(), MessageType::Request);
    assert!(request.is_request());
    assert_eq!(request.action(), "create_node");
    assert_eq!(request.target(), "neo4j");
    assert!(request.response_to().is_none());
}

#[test]
fn requests_receive_distinct_identifiers() {
    let first = Envelope::request("a", "t", Payload::new(), None);
    let second = Envelope::request("a", "t", Payload::new(), None);
    assert_ne!(first.id(), second.id());
}

#[test]
fn reply_correlates_with_request() {
    let request = Envelope::request("run_cypher_query", "neo4j", Payload::new(), None);
    let response = request.reply(payload(json!({"status": "success"})));

    assert_eq!(response.message_type(), MessageType::Response);
    assert_eq!(response.response_to(), Some(request.id()));
    assert_eq!(response.target(), request.target());
    assert_eq!(response.action(), request.action());
    assert_ne!(response.id(), request.id());
    assert_eq!(response.payload().get("status"), Some(&json!("success")));
}

#[test]
fn reply_leaves_request_untouched() {
    let request = Envelope::request("create_node", "neo4j", Payload::new(), None);
    let snapshot = request.clone();
    let _response = request.reply(payload(json!({"status": "success"})));
    assert_eq!(request, snapshot);
}

#[test]
fn serialises_type_field_and_omits_absent_options() {
    let request = Envelope::request("create_node", "neo4j", Payload::new(), None);
    let value = serde_json::to_value(&request).expect("serialise");

    assert_eq!(value.get("type"), Some(&json!("request")));
    assert!(value.get("message_type").is_none());
    assert!(value.get("response_to").is_none());
    assert!(value.get("metadata").is_none());
}

#[test]
fn decoding_runs_schema_validation() {
    let forged = json!({
        "id": "x",
        "timestamp": "nope",
        "type": "request",
        "action": "",
        "target": "",
        "payload": {},
        "response_to": "y",
    });

    let error = serde_json::from_value::<Envelope>(forged).expect_err("forged envelope");
    assert!(error.to_string().contains("UUID"), "{error}");
}

#[test]
fn decoding_accepts_encoded_envelopes() {
    let request = Envelope::request("create_node", "neo4j", Payload::new(), None);
    let response = request.reply(payload(json!({"status": "success"})));

    for envelope in [request, response] {
        let encoded = serde_json::to_string(&envelope).expect("encode");
        let decoded: Envelope = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded, envelope);
    }
}

#[test]
fn request_with_correlation_cannot_be_decoded() {
    let mut raw = Envelope::request("create_node", "neo4j", Payload::new(), None)
        .to_value()
        .expect("encode");
    raw["response_to"] = json!(fresh_id());

    assert!(serde_json::from_value::<Envelope>(raw).is_err());
}

#[test]
fn to_value_matches_serde_output() {
    let metadata = payload(json!({"trace": "abc"}));
    let request = Envelope::request(
        "create_node",
        "neo4j",
        payload(json!({"labels": []})),
        Some(metadata),
    );
    let response = request.reply(Payload::new());

    for envelope in [&request, &response] {
        let expected = serde_json::to_value(envelope).expect("serialise");
        assert_eq!(envelope.to_value().expect("encode"), expected);
    }
}

#[test]
fn message_type_round_trips_wire_names() {
    for kind in [MessageType::Request, MessageType::Response] {
        assert_eq!(MessageType::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(MessageType::parse("Request"), None);
    assert_eq!(MessageType::parse("event"), None);
}
