//! Registry of handlers for bot-issued function calls.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a handler receives for one call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCallParams {
    /// Name the bot asked for.
    pub function_name: String,
    /// Arguments exactly as the bot sent them.
    pub arguments: Value,
}

/// Type-erased handler. `None` (or JSON `null`) means "no result to send".
pub type FunctionCallCallback =
    Arc<dyn Fn(FunctionCallParams) -> BoxFuture<'static, Option<Value>> + Send + Sync>;

/// Box an async closure into a [`FunctionCallCallback`].
pub fn callback<F, Fut>(handler: F) -> FunctionCallCallback
where
    F: Fn(FunctionCallParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<Value>> + Send + 'static,
{
    Arc::new(move |params| handler(params).boxed())
}

/// Name-keyed handler table; one handler per function name.
#[derive(Default)]
pub struct FunctionCallRegistry {
    handlers: RwLock<HashMap<String, FunctionCallCallback>>,
}

impl FunctionCallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `name`, returning the handler it replaced.
    pub fn register(
        &self,
        name: impl Into<String>,
        handler: FunctionCallCallback,
    ) -> Option<FunctionCallCallback> {
        self.handlers.write().insert(name.into(), handler)
    }

    /// Remove the handler for `name`. Returns whether one was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.handlers.write().remove(name).is_some()
    }

    pub fn unregister_all(&self) {
        self.handlers.write().clear();
    }

    pub fn get(&self, name: &str) -> Option<FunctionCallCallback> {
        self.handlers.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.read().is_empty()
    }

    /// Sorted handler names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constant(value: Option<Value>) -> FunctionCallCallback {
        callback(move |_| {
            let value = value.clone();
            async move { value }
        })
    }

    #[tokio::test]
    async fn register_and_invoke() {
        let registry = FunctionCallRegistry::new();
        let _ = registry.register(
            "add",
            callback(|params: FunctionCallParams| async move {
                let a = params.arguments["a"].as_i64()?;
                let b = params.arguments["b"].as_i64()?;
                Some(json!(a + b))
            }),
        );

        let handler = registry.get("add").unwrap();
        let result = handler(FunctionCallParams {
            function_name: "add".into(),
            arguments: json!({"a": 2, "b": 3}),
        })
        .await;
        assert_eq!(result, Some(json!(5)));
    }

    #[tokio::test]
    async fn register_overwrites() {
        let registry = FunctionCallRegistry::new();
        assert!(registry.register("f", constant(Some(json!(1)))).is_none());
        assert!(registry.register("f", constant(Some(json!(2)))).is_some());
        assert_eq!(registry.len(), 1);

        let handler = registry.get("f").unwrap();
        let out = handler(FunctionCallParams {
            function_name: "f".into(),
            arguments: Value::Null,
        })
        .await;
        assert_eq!(out, Some(json!(2)));
    }

    #[test]
    fn unregister_and_clear() {
        let registry = FunctionCallRegistry::new();
        let _ = registry.register("a", constant(None));
        let _ = registry.register("b", constant(None));
        assert_eq!(registry.names(), vec!["a", "b"]);

        assert!(registry.unregister("a"));
        assert!(!registry.unregister("a"));
        assert!(!registry.contains("a"));

        registry.unregister_all();
        assert!(registry.is_empty());
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn params_serialize_camel_case() {
        let params = FunctionCallParams {
            function_name: "foo".into(),
            arguments: json!({"x": 1}),
        };
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({"functionName": "foo", "arguments": {"x": 1}})
        );
    }
}
