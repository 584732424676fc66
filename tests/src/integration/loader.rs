//! # JSON Documents
//!
//! The same scenarios as the builder-based tests, written as plain JSON and
//! resolved through the fixture registry.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use hydrate_engine::{hydrate, ConfigNode, HydrationError, ModuleRegistry};
    use serde_json::{json, Value};

    use crate::fixtures::{registry, FakeNoStart, TestContext};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    const SCENARIO: &str = r#"{
        "testing": { "sub": { "module": "FakeHydro", "which": 1 } },
        "top": { "module": "FakeHydro", "which": 2 },
        "nostart": { "module": "FakeNoStart" },
        "nullstart": { "module": { "default": "FakeNullStart" } },
        "disabled": { "module": "totallyFake", "enabled": 0 },
        "object": { "module": "fake module" },
        "args": { "module": ["regularFunction", "hello", "world"] }
    }"#;

    fn load(source: &str) -> ConfigNode<TestContext> {
        let registry: ModuleRegistry<TestContext> = registry().unwrap();
        ConfigNode::from_json_str(source, &registry).unwrap()
    }

    async fn hydrate_err(source: &str) -> HydrationError {
        hydrate(Arc::new(TestContext::new()), &load(source), None)
            .await
            .expect_err("hydration should fail")
    }

    // =========================================================================
    // TESTS
    // =========================================================================

    #[tokio::test]
    async fn test_json_scenario_hydrates() {
        let ctx = Arc::new(TestContext::new());
        let hydration = hydrate(ctx.clone(), &load(SCENARIO), None).await.unwrap();
        let tree = &hydration.tree;

        let json_at = |path: &[&str]| -> Value {
            tree.ready(path)
                .and_then(|value| value.as_json().cloned())
                .unwrap_or_else(|| panic!("no JSON value at {path:?}"))
        };
        assert_eq!(json_at(&["testing", "sub"])["id"], 1);
        assert_eq!(json_at(&["top"])["id"], 2);
        assert_eq!(json_at(&["nullstart"]), Value::Null);
        assert_eq!(json_at(&["object"]), json!("fake module"));
        assert_eq!(json_at(&["args"]), json!("hello,world"));
        assert!(tree.get("disabled").unwrap().is_disabled());
        assert!(tree
            .ready(&["nostart"])
            .unwrap()
            .downcast_ref::<FakeNoStart>()
            .is_some());

        let names: Vec<_> = hydration.all_objects.iter().map(|o| o.name()).collect();
        assert_eq!(names, ["sub", "top", "nostart", "nullstart"]);

        hydration.dehydrate(&ctx).await.unwrap();
        assert_eq!(ctx.stopped(), ["hydro-1", "hydro-2"]);
    }

    #[tokio::test]
    async fn test_falsy_enabled_values_disable() {
        let source = r#"{
            "zero":  { "module": "FakeNoStart", "enabled": 0 },
            "empty": { "module": "FakeNoStart", "enabled": "" },
            "null":  { "module": "FakeNoStart", "enabled": null },
            "yes":   { "module": "FakeNoStart", "enabled": "yes" }
        }"#;
        let hydration = hydrate(Arc::new(TestContext::new()), &load(source), None)
            .await
            .unwrap();

        for key in ["zero", "empty", "null"] {
            assert!(hydration.tree.get(key).unwrap().is_disabled(), "{key}");
        }
        assert!(hydration.tree.ready(&["yes"]).is_some());
        assert_eq!(hydration.all_objects.len(), 1);
    }

    #[tokio::test]
    async fn test_falsy_module_is_a_nested_level() {
        // `module: 0` does not make a descriptor, so `0` is an invalid node.
        let err = hydrate_err(r#"{ "odd": { "module": 0 } }"#).await;
        assert_eq!(err.to_string(), "Invalid configuration encountered: 0");
    }

    #[tokio::test]
    async fn test_json_bad_array_head() {
        let err = hydrate_err(r#"{ "badArgs": { "module": [1, 2, 3] } }"#).await;
        assert_eq!(
            err.to_string(),
            "When using an array for the module parameter, the first element must be a function (badArgs)"
        );

        // A registered constructor is not a function either.
        let err = hydrate_err(r#"{ "badArgs": { "module": ["FakeNoStart"] } }"#).await;
        assert!(matches!(err, HydrationError::InvalidFactory { .. }));
    }

    #[tokio::test]
    async fn test_json_scalar_in_sequence() {
        let err = hydrate_err(r#"{ "badArgs": [1] }"#).await;
        assert_eq!(err.to_string(), "Invalid configuration encountered: 1");
    }

    #[tokio::test]
    async fn test_json_sequence_merges_levels() {
        let source = r#"[
            { "a": { "module": "Delayed", "value": 1 } },
            { "b": { "module": "Delayed", "value": 2 } }
        ]"#;
        let hydration = hydrate(Arc::new(TestContext::new()), &load(source), None)
            .await
            .unwrap();
        assert_eq!(hydration.tree.keys(), ["a", "b"]);
        assert_eq!(
            hydration.tree.ready(&["b"]).unwrap().as_json(),
            Some(&json!(2))
        );
    }

    #[tokio::test]
    async fn test_tree_keeps_document_order() {
        let source = r#"{
            "zeta": { "module": "Delayed", "value": 1 },
            "nested": { "b": { "module": "FakeNoStart" }, "a": { "module": "FakeNoStart" } },
            "alpha": { "module": "Delayed", "value": 2 }
        }"#;
        let target = hydrate_engine::ResultTree::new();
        let hydration = hydrate(Arc::new(TestContext::new()), &load(source), Some(&target))
            .await
            .unwrap();

        for tree in [&hydration.tree, &target] {
            assert_eq!(tree.keys(), ["zeta", "nested", "alpha"]);
            assert_eq!(tree.branch("nested").unwrap().keys(), ["b", "a"]);
        }
    }

    #[test]
    fn test_malformed_json_is_a_config_error() {
        let registry = registry().unwrap();
        let err = ConfigNode::<TestContext>::from_json_str("{ not json", &registry).unwrap_err();
        assert!(matches!(err, HydrationError::Config(_)));
        assert!(err.to_string().starts_with("Configuration error: Invalid configuration JSON"));
    }
}
