//! Minimal test doubles for every trait boundary in this crate.
//!
//! Gated behind the `test-utils` feature so downstream crates can depend on
//! these in their own `[dev-dependencies]` without pulling `tokio` into a
//! normal build.

use crate::content::Message;
use crate::effect::Scope;
use crate::hook::{Hook, HookAction, HookContext, HookError, HookPoint};
use crate::operator::{Operator, OperatorError, OperatorInput, OperatorMetadata, OperatorOutput};
use crate::state::{SearchResult, StateError, StateReader, StateStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// An [`Operator`] that echoes its input message back as the output, with an
/// empty metadata record. Useful for exercising relay/supervisor plumbing
/// without a live model.
#[derive(Debug, Default)]
pub struct EchoOperator;

#[async_trait]
impl Operator for EchoOperator {
    async fn execute(&self, input: OperatorInput) -> Result<OperatorOutput, OperatorError> {
        Ok(OperatorOutput::new(
            input.message,
            crate::operator::ExitReason::Complete,
            OperatorMetadata::default(),
        ))
    }
}

/// An [`Operator`] that always fails, for exercising error paths.
pub struct FailingOperator {
    /// The message every call fails with.
    pub message: String,
}

#[async_trait]
impl Operator for FailingOperator {
    async fn execute(&self, _input: OperatorInput) -> Result<OperatorOutput, OperatorError> {
        Err(OperatorError::NonRetryable(self.message.clone()))
    }
}

fn composite_key(scope: &Scope, key: &str) -> String {
    let scope_json = serde_json::to_string(scope).unwrap_or_else(|_| "unknown".into());
    format!("{scope_json}\0{key}")
}

/// An in-memory [`StateStore`], backed by a `Mutex<HashMap<..>>`.
#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<HashMap<String, Value>>,
}

impl InMemoryStore {
    /// Build an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateReader for InMemoryStore {
    async fn read(&self, scope: &Scope, key: &str) -> Result<Option<Value>, StateError> {
        let data = self.data.lock().expect("lock poisoned");
        Ok(data.get(&composite_key(scope, key)).cloned())
    }

    async fn list(&self, scope: &Scope, prefix: &str) -> Result<Vec<String>, StateError> {
        let scope_prefix = serde_json::to_string(scope).unwrap_or_else(|_| "unknown".into());
        let data = self.data.lock().expect("lock poisoned");
        Ok(data
            .keys()
            .filter_map(|composite| {
                let rest = composite.strip_prefix(&scope_prefix)?.strip_prefix('\0')?;
                rest.starts_with(prefix).then(|| rest.to_string())
            })
            .collect())
    }

    async fn search(
        &self,
        _scope: &Scope,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<SearchResult>, StateError> {
        Ok(Vec::new())
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn write(&self, scope: &Scope, key: &str, value: Value) -> Result<(), StateError> {
        let mut data = self.data.lock().expect("lock poisoned");
        data.insert(composite_key(scope, key), value);
        Ok(())
    }

    async fn delete(&self, scope: &Scope, key: &str) -> Result<(), StateError> {
        let mut data = self.data.lock().expect("lock poisoned");
        data.remove(&composite_key(scope, key));
        Ok(())
    }
}

/// A [`Hook`] that records every context it was invoked with, for assertions.
#[derive(Default)]
pub struct LoggingHook {
    points: Vec<HookPoint>,
    /// Every context this hook observed, in order.
    pub seen: Mutex<Vec<HookPoint>>,
}

impl LoggingHook {
    /// Build a hook that fires at exactly the given points.
    pub fn new(points: Vec<HookPoint>) -> Self {
        Self {
            points,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Hook for LoggingHook {
    fn points(&self) -> &[HookPoint] {
        &self.points
    }

    async fn on_event(&self, ctx: &HookContext) -> Result<HookAction, HookError> {
        self.seen.lock().expect("lock poisoned").push(ctx.point);
        Ok(HookAction::Allow)
    }
}

/// Build a plain assistant message, for tests that don't care about content.
pub fn placeholder_message() -> Message {
    Message::assistant("ok")
}
