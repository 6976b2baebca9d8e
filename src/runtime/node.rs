// SPDX-License-Identifier: MIT

//! Node trait and execution context
//!
//! A node receives its widget/link inputs as a JSON object and returns a
//! tuple of outputs. Hidden inputs supplied by the host (the node's own id,
//! the prompt and the PNG workflow metadata) travel in `ExecutionContext`.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::error::ContinuumError;
use super::host::{Host, NullHost};

/// Result of executing a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutput {
    /// Output tuple, one entry per declared return slot
    Values(Vec<Value>),
    /// Execution of everything downstream of this node is halted
    Blocked,
}

impl NodeOutput {
    pub fn single(value: Value) -> Self {
        Self::Values(vec![value])
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, NodeOutput::Blocked)
    }

    /// First output slot, if any
    pub fn first(&self) -> Option<&Value> {
        match self {
            NodeOutput::Values(values) => values.first(),
            NodeOutput::Blocked => None,
        }
    }
}

/// Hidden inputs and host handle for one invocation
#[derive(Clone)]
pub struct ExecutionContext {
    pub unique_id: Option<String>,
    pub prompt: Option<Value>,
    pub extra_pnginfo: Option<Value>,
    pub host: Arc<dyn Host>,
}

impl ExecutionContext {
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self {
            unique_id: None,
            prompt: None,
            extra_pnginfo: None,
            host,
        }
    }

    pub fn with_unique_id(mut self, id: impl Into<String>) -> Self {
        self.unique_id = Some(id.into());
        self
    }

    pub fn with_prompt(mut self, prompt: Value) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn with_extra_pnginfo(mut self, extra_pnginfo: Value) -> Self {
        self.extra_pnginfo = Some(extra_pnginfo);
        self
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(Arc::new(NullHost))
    }
}

/// Trait for nodes the host can discover and execute.
///
/// `class_name()`, `display_name()` and `category()` return `&str` so
/// implementations can keep them in fields or return literals.
#[async_trait]
pub trait Node: Send + Sync {
    /// Registration key (must be unique within a registry)
    fn class_name(&self) -> &str;

    /// Name shown in the editor's node menu
    fn display_name(&self) -> &str;

    /// Menu category, e.g. `Flux-Continuum/Sliders`
    fn category(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// JSON schema of the node's inputs
    fn schema(&self) -> &Value;

    /// Execute the node with the given inputs
    async fn execute(
        &self,
        inputs: Value,
        ctx: &ExecutionContext,
    ) -> Result<NodeOutput, ContinuumError>;

    /// Value the host compares between runs to decide whether to re-execute.
    /// `None` lets the host fall back to comparing inputs.
    fn fingerprint(&self, _inputs: &Value, _ctx: &ExecutionContext) -> Option<Value> {
        None
    }
}

/// Typed accessors over a node's input object
pub struct Inputs<'a> {
    node: String,
    fields: Option<&'a Map<String, Value>>,
}

impl<'a> Inputs<'a> {
    pub fn new(node: &str, inputs: &'a Value) -> Self {
        Self {
            node: node.to_string(),
            fields: inputs.as_object(),
        }
    }

    /// Invalid-input error attributed to this node
    pub fn invalid(&self, message: impl Into<String>) -> ContinuumError {
        ContinuumError::invalid_input(&self.node, message)
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.fields
            .and_then(|f| f.get(key))
            .filter(|v| !v.is_null())
    }

    pub fn required(&self, key: &str) -> Result<&'a Value, ContinuumError> {
        self.get(key)
            .ok_or_else(|| self.invalid(format!("missing input '{}'", key)))
    }

    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, ContinuumError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v.as_f64().ok_or_else(|| self.invalid(format!("'{}' must be a number", key))),
        }
    }

    pub fn i64_or(&self, key: &str, default: i64) -> Result<i64, ContinuumError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v
                .as_i64()
                .or_else(|| v.as_f64().map(|f| f as i64))
                .ok_or_else(|| self.invalid(format!("'{}' must be an integer", key))),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, ContinuumError> {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v.as_bool().ok_or_else(|| self.invalid(format!("'{}' must be a boolean", key))),
        }
    }

    pub fn str_or<'b>(&'b self, key: &str, default: &'b str) -> Result<&'b str, ContinuumError>
    where
        'a: 'b,
    {
        match self.get(key) {
            None => Ok(default),
            Some(v) => v.as_str().ok_or_else(|| self.invalid(format!("'{}' must be a string", key))),
        }
    }

    pub fn required_str(&self, key: &str) -> Result<&'a str, ContinuumError> {
        self.required(key)?
            .as_str()
            .ok_or_else(|| self.invalid(format!("'{}' must be a string", key)))
    }
}
