//! Scripted tool implementations for driving the engine without providers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use jobflow::tools::{Tool, ToolError};
use serde_json::Value;

/// Returns the same payload on every call.
pub struct StaticTool {
    value: Value,
}

impl StaticTool {
    pub fn new(value: Value) -> Arc<Self> {
        Arc::new(Self { value })
    }
}

#[async_trait]
impl Tool for StaticTool {
    async fn call(&self, _params: Value) -> Result<Value, ToolError> {
        Ok(self.value.clone())
    }
}

/// Fails every call with a scripted message.
pub struct FailingTool {
    message: String,
}

impl FailingTool {
    pub fn new(message: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            message: message.into(),
        })
    }
}

#[async_trait]
impl Tool for FailingTool {
    async fn call(&self, _params: Value) -> Result<Value, ToolError> {
        Err(ToolError::failed("scripted", self.message.clone()))
    }
}

/// Delegates to an inner tool while counting invocations.
pub struct CountingTool {
    inner: Arc<dyn Tool>,
    calls: Arc<AtomicUsize>,
}

impl CountingTool {
    pub fn wrap(inner: Arc<dyn Tool>) -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Self {
                inner,
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }
}

#[async_trait]
impl Tool for CountingTool {
    async fn call(&self, params: Value) -> Result<Value, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.call(params).await
    }
}
