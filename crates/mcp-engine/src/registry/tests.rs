//! Unit tests for the handler registry.

use mcp_protocol::Payload;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::handler::HandlerFailure;

fn tagged(tag: &'static str) -> impl Handler + 'static {
    move |_: &Payload| {
        let mut result = Payload::new();
        result.insert("tag".to_owned(), Value::from(tag));
        Ok::<_, HandlerFailure>(result)
    }
}

fn tag_of(registry: &HandlerRegistry, target: &str, action: &str) -> Option<Value> {
    registry
        .lookup(target, action)
        .and_then(|handler| handler.handle(&Payload::new()).ok())
        .and_then(|mut result| result.remove("tag"))
}

#[fixture]
fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("neo4j", "create_node", tagged("create_node"))
        .expect("register create_node");
    registry
        .register("neo4j", "run_cypher_query", tagged("run_cypher_query"))
        .expect("register run_cypher_query");
    registry
}

#[rstest]
fn looks_up_registered_handler(registry: HandlerRegistry) {
    assert_eq!(
        tag_of(&registry, "neo4j", "create_node"),
        Some(json!("create_node"))
    );
    assert!(registry.contains("neo4j", "run_cypher_query"));
    assert_eq!(registry.len(), 2);
}

#[rstest]
#[case::unknown_action("neo4j", "delete_everything")]
#[case::unknown_target("postgres", "create_node")]
#[case::case_differs("Neo4j", "create_node")]
#[case::action_case_differs("neo4j", "CREATE_NODE")]
#[case::swapped("create_node", "neo4j")]
fn unknown_keys_are_absent(registry: HandlerRegistry, #[case] target: &str, #[case] action: &str) {
    assert!(registry.lookup(target, action).is_none());
    assert!(!registry.contains(target, action));
}

#[rstest]
fn duplicate_registration_is_rejected(mut registry: HandlerRegistry) {
    let error = registry
        .register("neo4j", "create_node", tagged("replacement"))
        .expect_err("duplicate key must fail");
    assert_eq!(
        error,
        RegistryError::Conflict {
            target: "neo4j".into(),
            action: "create_node".into(),
        }
    );
    assert_eq!(
        tag_of(&registry, "neo4j", "create_node"),
        Some(json!("create_node")),
        "original handler must survive"
    );
    assert_eq!(registry.len(), 2);
}

#[rstest]
#[case::empty_target("", "create_node")]
#[case::empty_action("neo4j", "")]
fn empty_key_is_rejected(#[case] target: &str, #[case] action: &str) {
    let mut registry = HandlerRegistry::new();
    let error = registry
        .register(target, action, tagged("x"))
        .expect_err("empty key must fail");
    assert!(matches!(error, RegistryError::EmptyKey { .. }));
    assert!(registry.is_empty());
}

#[test]
fn lookup_is_independent_of_registration_order() {
    let keys = [("a", "x"), ("a", "y"), ("b", "x")];
    let mut forward = HandlerRegistry::new();
    let mut backward = HandlerRegistry::new();
    for (target, action) in keys {
        forward
            .register(target, action, tagged("h"))
            .expect("register forward");
    }
    for (target, action) in keys.iter().rev() {
        backward
            .register(*target, *action, tagged("h"))
            .expect("register backward");
    }

    assert_eq!(forward.keys(), backward.keys());
    for (target, action) in keys {
        assert!(forward.contains(target, action));
        assert!(backward.contains(target, action));
    }
}

#[rstest]
fn keys_are_sorted(registry: HandlerRegistry) {
    let keys: Vec<String> = registry.keys().iter().map(ToString::to_string).collect();
    assert_eq!(keys, ["neo4j/create_node", "neo4j/run_cypher_query"]);
}

#[test]
fn shared_handlers_can_serve_several_keys() {
    let shared: Arc<dyn Handler> = Arc::new(tagged("shared"));
    let mut registry = HandlerRegistry::new();
    registry
        .register_arc("a", "one", Arc::clone(&shared))
        .expect("first key");
    registry
        .register_arc("b", "two", shared)
        .expect("second key");
    assert_eq!(tag_of(&registry, "b", "two"), Some(json!("shared")));
}
